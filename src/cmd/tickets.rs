use clap::Args;

use crate::context::AppContext;
use crate::domain::filter::Filter;
use crate::domain::stats::Stats;
use crate::domain::ticket::{Category, Priority, Status, Ticket, TicketId};
use crate::error::AppResult;
use crate::sync::SuggestionPhase;
use crate::workflow::desk::TicketDesk;

const DESCRIPTION_PREVIEW_CHARS: usize = 50;

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only tickets in this category (billing, technical, account, general).
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,
    /// Only tickets with this priority (low, medium, high, critical).
    #[arg(short, long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
    /// Only tickets in this status (open, in_progress, resolved, closed).
    #[arg(short, long, value_parser = parse_status)]
    pub status: Option<Status>,
    /// Case-insensitive match on title or description.
    #[arg(long, default_value = "")]
    pub search: String,
}

impl ListArgs {
    fn filter(&self) -> Filter {
        Filter::default()
            .with_category(self.category)
            .with_priority(self.priority)
            .with_status(self.status)
            .with_search(self.search.clone())
    }
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Ticket title (max 200 characters).
    #[arg(short, long)]
    pub title: String,
    /// Ticket description; used to suggest category and priority.
    #[arg(short, long)]
    pub description: String,
    /// Category; suggested from the description when omitted.
    #[arg(short, long, value_parser = parse_category)]
    pub category: Option<Category>,
    /// Priority; suggested from the description when omitted.
    #[arg(short, long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Ticket ID.
    pub id: u64,
    /// New status (open, in_progress, resolved, closed).
    #[arg(value_parser = parse_status)]
    pub status: Status,
}

pub async fn run_list(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    let desk = TicketDesk::with_filter(ctx, args.filter());
    desk.load().await?;
    print_tickets(&desk.list().tickets());
    if let Some(stats) = desk.stats().stats() {
        println!(
            "\n{} open of {} tickets overall.",
            stats.open_tickets, stats.total_tickets
        );
    }
    Ok(())
}

pub async fn run_create(ctx: &AppContext, args: CreateArgs) -> AppResult<()> {
    let desk = TicketDesk::new(ctx);
    let form = desk.form();
    form.set_title(args.title);
    form.set_category(args.category);
    form.set_priority(args.priority);
    form.set_description(args.description);

    if form.suggestions().settled().await == SuggestionPhase::Applied {
        let draft = form.draft();
        println!(
            "Suggested: category {}, priority {}",
            draft.category.map(|c| c.as_str()).unwrap_or("-"),
            draft.priority.map(|p| p.as_str()).unwrap_or("-")
        );
    }

    let outcome = desk.submit_ticket().await?;
    println!(
        "Ticket {} created: {} [{} / {}]",
        outcome.ticket.id,
        outcome.ticket.title,
        outcome.ticket.category.as_str(),
        outcome.ticket.priority.as_str()
    );

    match (outcome.stats, desk.stats().stats()) {
        (Ok(_), Some(stats)) => print_stats(&stats),
        (Err(err), _) => eprintln!("Warning: could not refresh stats: {err}"),
        _ => {}
    }
    if let Err(err) = outcome.list {
        eprintln!("Warning: could not refresh ticket list: {err}");
    }
    Ok(())
}

pub async fn run_status(ctx: &AppContext, args: StatusArgs) -> AppResult<()> {
    let desk = TicketDesk::new(ctx);
    desk.change_status(TicketId(args.id), args.status).await?;
    println!("Ticket {} marked {}.", args.id, args.status.as_str());
    print_tickets(&desk.list().tickets());
    Ok(())
}

pub async fn run_stats(ctx: &AppContext) -> AppResult<()> {
    let desk = TicketDesk::new(ctx);
    desk.stats().refresh().await?;
    if let Some(stats) = desk.stats().stats() {
        print_stats(&stats);
    }
    Ok(())
}

pub async fn run_classify(ctx: &AppContext, description: &str) -> AppResult<()> {
    let suggestion = ctx.classifier.classify(description).await?;
    println!(
        "Category: {}",
        suggestion.category.map(|c| c.as_str()).unwrap_or("<none>")
    );
    println!(
        "Priority: {}",
        suggestion.priority.map(|p| p.as_str()).unwrap_or("<none>")
    );
    Ok(())
}

fn print_tickets(tickets: &[Ticket]) {
    if tickets.is_empty() {
        println!("No tickets match.");
        return;
    }
    println!(
        "{:>5}  {:<30}  {:<53}  {:<9}  {:<8}  {:<11}  {}",
        "ID", "TITLE", "DESCRIPTION", "CATEGORY", "PRIORITY", "STATUS", "CREATED"
    );
    for ticket in tickets {
        println!("{}", ticket_row(ticket));
    }
}

fn ticket_row(ticket: &Ticket) -> String {
    format!(
        "{:>5}  {:<30}  {:<53}  {:<9}  {:<8}  {:<11}  {}",
        ticket.id,
        truncate(&ticket.title, 30),
        description_preview(&ticket.description),
        ticket.category.as_str(),
        ticket.priority.as_str(),
        ticket.status.as_str(),
        ticket.created_at.format("%Y-%m-%d %H:%M")
    )
}

fn description_preview(description: &str) -> String {
    let flat = description.replace(['\r', '\n'], " ");
    format!("{}...", truncate(&flat, DESCRIPTION_PREVIEW_CHARS))
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn print_stats(stats: &Stats) {
    println!("Total tickets: {}", stats.total_tickets);
    println!("Open tickets: {}", stats.open_tickets);
    println!("Avg tickets/day: {:.1}", stats.avg_tickets_per_day);
    println!("Priority breakdown:");
    for (priority, count) in &stats.priority_breakdown {
        println!("  {}: {count}", priority.as_str());
    }
    println!("Category breakdown:");
    for (category, count) in &stats.category_breakdown {
        println!("  {}: {count}", category.as_str());
    }
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::from_str(value).ok_or_else(|| format!("unknown category '{value}'"))
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::from_str(value).ok_or_else(|| format!("unknown priority '{value}'"))
}

fn parse_status(value: &str) -> Result<Status, String> {
    Status::from_str(value).ok_or_else(|| format!("unknown status '{value}'"))
}
