use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

use crate::domain::draft::Suggestion;
use crate::domain::filter::Filter;
use crate::domain::stats::Stats;
use crate::domain::ticket::{
    Category, NewTicket, Priority, Status, Ticket, TicketId, TicketPatch,
};
use crate::error::{AppError, AppResult};
use crate::services::{ClassifierService, TicketApi};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    List(Filter),
    Create(NewTicket),
    Update(TicketId, TicketPatch),
    Stats,
    Classify(String),
}

struct Gate {
    label: String,
    release: oneshot::Sender<()>,
}

/// In-memory stand-in for the ticket API. List, update and classify calls can be
/// held open until the test releases them, to control completion order.
#[derive(Default)]
pub struct FakeTicketApi {
    calls: Mutex<Vec<ApiCall>>,
    tickets: Mutex<Vec<Ticket>>,
    suggestion: Mutex<Suggestion>,
    hold_lists: AtomicBool,
    hold_updates: AtomicBool,
    hold_classify: AtomicBool,
    fail_lists: AtomicBool,
    fail_creates: AtomicBool,
    fail_updates: AtomicBool,
    fail_classify: AtomicBool,
    gates: Mutex<Vec<Gate>>,
}

impl FakeTicketApi {
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let api = Self::default();
        *api.tickets.lock().unwrap() = tickets;
        api
    }

    pub fn set_suggestion(&self, suggestion: Suggestion) {
        *self.suggestion.lock().unwrap() = suggestion;
    }

    pub fn hold_lists(&self, hold: bool) {
        self.hold_lists.store(hold, Ordering::SeqCst);
    }

    /// Held updates are released under the label `update <id>`.
    pub fn hold_updates(&self, hold: bool) {
        self.hold_updates.store(hold, Ordering::SeqCst);
    }

    pub fn hold_classify(&self, hold: bool) {
        self.hold_classify.store(hold, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_classify(&self, fail: bool) {
        self.fail_classify.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<Filter> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::List(filter) => Some(filter),
                _ => None,
            })
            .collect()
    }

    pub fn classify_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Classify(description) => Some(description),
                _ => None,
            })
            .collect()
    }

    pub fn stats_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::Stats))
            .count()
    }

    pub fn held(&self) -> Vec<String> {
        self.gates
            .lock()
            .unwrap()
            .iter()
            .map(|gate| gate.label.clone())
            .collect()
    }

    /// Lets the held call registered under `label` complete.
    pub fn release(&self, label: &str) -> bool {
        let mut gates = self.gates.lock().unwrap();
        match gates.iter().position(|gate| gate.label == label) {
            Some(index) => gates.remove(index).release.send(()).is_ok(),
            None => false,
        }
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_if_held(&self, held: &AtomicBool, label: String) {
        if !held.load(Ordering::SeqCst) {
            return;
        }
        let (release, wait) = oneshot::channel();
        self.gates.lock().unwrap().push(Gate { label, release });
        let _ = wait.await;
    }

    fn matching(&self, filter: &Filter) -> Vec<Ticket> {
        let search = filter.search.trim().to_lowercase();
        self.tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|ticket| filter.category.is_none_or(|c| ticket.category == c))
            .filter(|ticket| filter.priority.is_none_or(|p| ticket.priority == p))
            .filter(|ticket| filter.status.is_none_or(|s| ticket.status == s))
            .filter(|ticket| {
                search.is_empty()
                    || ticket.title.to_lowercase().contains(&search)
                    || ticket.description.to_lowercase().contains(&search)
            })
            .cloned()
            .collect()
    }
}

fn unreachable_api() -> AppError {
    AppError::Transport("connection refused".to_string())
}

#[async_trait]
impl TicketApi for FakeTicketApi {
    async fn list_tickets(&self, filter: &Filter) -> AppResult<Vec<Ticket>> {
        self.record(ApiCall::List(filter.clone()));
        self.wait_if_held(&self.hold_lists, filter.search.clone())
            .await;
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(unreachable_api());
        }
        Ok(self.matching(filter))
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> AppResult<Ticket> {
        self.record(ApiCall::Create(ticket.clone()));
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(AppError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        let mut tickets = self.tickets.lock().unwrap();
        let created = Ticket {
            id: TicketId(tickets.len() as u64 + 1),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            category: ticket.category,
            priority: ticket.priority,
            status: Status::Open,
            created_at: fixed_time(),
        };
        tickets.push(created.clone());
        Ok(created)
    }

    async fn update_ticket(&self, id: TicketId, patch: &TicketPatch) -> AppResult<Ticket> {
        self.record(ApiCall::Update(id, patch.clone()));
        self.wait_if_held(&self.hold_updates, format!("update {id}"))
            .await;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(unreachable_api());
        }
        let mut tickets = self.tickets.lock().unwrap();
        let ticket = tickets
            .iter_mut()
            .find(|ticket| ticket.id == id)
            .ok_or_else(|| AppError::Status {
                status: 404,
                body: "not found".to_string(),
            })?;
        if let Some(status) = patch.status {
            ticket.status = status;
        }
        Ok(ticket.clone())
    }

    async fn fetch_stats(&self) -> AppResult<Stats> {
        self.record(ApiCall::Stats);
        let tickets = self.tickets.lock().unwrap();
        let mut priority_breakdown: BTreeMap<Priority, u64> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let mut category_breakdown: BTreeMap<Category, u64> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        for ticket in tickets.iter() {
            *priority_breakdown.entry(ticket.priority).or_default() += 1;
            *category_breakdown.entry(ticket.category).or_default() += 1;
        }
        Ok(Stats {
            total_tickets: tickets.len() as u64,
            open_tickets: tickets.iter().filter(|t| t.status == Status::Open).count() as u64,
            avg_tickets_per_day: tickets.len() as f64,
            priority_breakdown,
            category_breakdown,
        })
    }
}

#[async_trait]
impl ClassifierService for FakeTicketApi {
    async fn classify(&self, description: &str) -> AppResult<Suggestion> {
        self.record(ApiCall::Classify(description.to_string()));
        self.wait_if_held(&self.hold_classify, description.to_string())
            .await;
        if self.fail_classify.load(Ordering::SeqCst) {
            return Err(unreachable_api());
        }
        Ok(*self.suggestion.lock().unwrap())
    }
}

pub fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn ticket(id: u64, title: &str, category: Category, priority: Priority) -> Ticket {
    Ticket {
        id: TicketId(id),
        title: title.to_string(),
        description: format!("{title} (details)"),
        category,
        priority,
        status: Status::Open,
        created_at: fixed_time(),
    }
}

/// Lets spawned tasks run until they block again.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
