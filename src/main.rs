use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ticket_desk::cmd::config::{self as config_cmd, ConfigArgs};
use ticket_desk::cmd::tickets::{self, CreateArgs, ListArgs, StatusArgs};
use ticket_desk::config::AppConfig;
use ticket_desk::context::AppContext;
use ticket_desk::error::AppResult;
use ticket_desk::infra::http::HttpTicketApi;
use ticket_desk::sync::TokioScheduler;

#[derive(Parser)]
#[command(name = "ticket-desk", author, version, about = "Support ticket desk client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tickets, optionally filtered.
    List(ListArgs),
    /// Submit a ticket; category and priority are suggested when omitted.
    Create(CreateArgs),
    /// Change the status of a ticket.
    Status(StatusArgs),
    /// Show aggregate ticket statistics.
    Stats,
    /// Suggest a category and priority for a description.
    Classify {
        /// Description to classify.
        description: String,
    },
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::List(args) => tickets::run_list(&build_context()?, args).await,
        Commands::Create(args) => tickets::run_create(&build_context()?, args).await,
        Commands::Status(args) => tickets::run_status(&build_context()?, args).await,
        Commands::Stats => tickets::run_stats(&build_context()?).await,
        Commands::Classify { description } => {
            tickets::run_classify(&build_context()?, &description).await
        }
    }
}

fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;
    tracing::debug!(api = %config.api_base_url, "using ticket API");

    let api = Arc::new(HttpTicketApi::new(
        &config.api_base_url,
        config.request_timeout,
    )?);
    Ok(AppContext::new(
        config,
        api.clone(),
        api,
        Arc::new(TokioScheduler),
    ))
}
