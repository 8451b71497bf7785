use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::filter::Filter;
use crate::domain::ticket::{Status, Ticket, TicketId, TicketPatch};
use crate::error::AppResult;
use crate::services::TicketApi;
use crate::sync::filter_store::FilterListener;
use crate::sync::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the displayed list.
    Applied { sequence: u64, count: usize },
    /// A newer fetch was issued before this one completed; the result was dropped.
    Stale { sequence: u64 },
}

#[derive(Default)]
struct ListState {
    issued: u64,
    applied: u64,
    active_filter: Filter,
    tickets: Vec<Ticket>,
    last_error: Option<String>,
}

struct ListInner {
    api: Arc<dyn TicketApi>,
    state: Mutex<ListState>,
}

impl ListInner {
    fn complete(&self, sequence: u64, result: AppResult<Vec<Ticket>>) -> AppResult<FetchOutcome> {
        let mut state = lock(&self.state);
        if sequence != state.issued {
            debug!(
                sequence,
                latest = state.issued,
                "dropping superseded ticket list response"
            );
            return Ok(FetchOutcome::Stale { sequence });
        }

        match result {
            Ok(tickets) => {
                let count = tickets.len();
                state.tickets = tickets;
                state.applied = sequence;
                state.last_error = None;
                debug!(sequence, count, "ticket list applied");
                Ok(FetchOutcome::Applied { sequence, count })
            }
            Err(err) => {
                warn!(sequence, error = %err, "ticket list refresh failed");
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

/// Keeps the displayed tickets in step with the latest issued filter.
#[derive(Clone)]
pub struct TicketListSync {
    inner: Arc<ListInner>,
}

impl TicketListSync {
    pub fn new(api: Arc<dyn TicketApi>) -> Self {
        Self::with_filter(api, Filter::default())
    }

    /// `filter` is treated as active before the first fetch is issued.
    pub fn with_filter(api: Arc<dyn TicketApi>, filter: Filter) -> Self {
        Self {
            inner: Arc::new(ListInner {
                api,
                state: Mutex::new(ListState {
                    active_filter: filter,
                    ..ListState::default()
                }),
            }),
        }
    }

    /// Issues a list query. The sequence number is taken here, at issue
    /// time, so ordering does not depend on when the future is first polled.
    pub fn refetch(
        &self,
        filter: Filter,
    ) -> impl Future<Output = AppResult<FetchOutcome>> + Send + use<> {
        let sequence = {
            let mut state = lock(&self.inner.state);
            state.issued += 1;
            state.active_filter = filter.clone();
            state.issued
        };
        debug!(sequence, ?filter, "ticket list fetch issued");

        let inner = Arc::clone(&self.inner);
        async move {
            let result = inner.api.list_tickets(&filter).await;
            inner.complete(sequence, result)
        }
    }

    /// Sends the status update and reloads the list with the filter active
    /// when the call was made. If another fetch was issued while the update
    /// was in flight, the reload uses that newer filter instead. The local
    /// list is never patched in place.
    pub async fn apply_status_change(
        &self,
        id: TicketId,
        status: Status,
    ) -> AppResult<FetchOutcome> {
        let (filter, issued) = {
            let state = lock(&self.inner.state);
            (state.active_filter.clone(), state.issued)
        };
        self.inner
            .api
            .update_ticket(id, &TicketPatch::status(status))
            .await
            .inspect_err(|err| {
                warn!(ticket_id = %id, status = status.as_str(), error = %err, "status update failed");
            })?;
        debug!(ticket_id = %id, status = status.as_str(), "status updated");

        let filter = {
            let state = lock(&self.inner.state);
            if state.issued == issued {
                filter
            } else {
                debug!(
                    issued,
                    latest = state.issued,
                    "filter changed during status update, reloading with the newer one"
                );
                state.active_filter.clone()
            }
        };
        self.refetch(filter).await
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        lock(&self.inner.state).tickets.clone()
    }

    pub fn active_filter(&self) -> Filter {
        lock(&self.inner.state).active_filter.clone()
    }

    pub fn applied_sequence(&self) -> u64 {
        lock(&self.inner.state).applied
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.inner.state).last_error.clone()
    }
}

impl FilterListener for TicketListSync {
    fn filter_changed(&self, filter: &Filter) {
        let fetch = self.refetch(filter.clone());
        tokio::spawn(async move {
            let _ = fetch.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ticket::{Category, Priority};
    use crate::error::AppError;
    use crate::test_support::{ApiCall, FakeTicketApi, settle, ticket};

    fn seeded_api() -> Arc<FakeTicketApi> {
        Arc::new(FakeTicketApi::with_tickets(vec![
            ticket(1, "Refund request", Category::Billing, Priority::Low),
            ticket(2, "Server down", Category::Technical, Priority::Critical),
            ticket(7, "Login loop", Category::Account, Priority::High),
        ]))
    }

    #[tokio::test]
    async fn refetch_applies_matching_tickets() {
        let api = seeded_api();
        let list = TicketListSync::new(api.clone());

        let outcome = list
            .refetch(Filter::default().with_category(Some(Category::Billing)))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Applied {
                sequence: 1,
                count: 1
            }
        );
        assert_eq!(list.tickets()[0].title, "Refund request");
    }

    #[tokio::test]
    async fn slow_older_fetch_never_overwrites_newer_one() {
        let api = seeded_api();
        api.hold_lists(true);
        let list = TicketListSync::new(api.clone());

        let first = Filter::default()
            .with_category(Some(Category::Billing))
            .with_search("refund");
        let second = Filter::default()
            .with_category(Some(Category::Technical))
            .with_search("server");

        let first_fetch = tokio::spawn(list.refetch(first));
        let second_fetch = tokio::spawn(list.refetch(second.clone()));
        settle().await;
        assert_eq!(api.held().len(), 2);

        assert!(api.release("server"));
        let second_outcome = second_fetch.await.unwrap().unwrap();
        assert_eq!(
            second_outcome,
            FetchOutcome::Applied {
                sequence: 2,
                count: 1
            }
        );

        assert!(api.release("refund"));
        let first_outcome = first_fetch.await.unwrap().unwrap();
        assert_eq!(first_outcome, FetchOutcome::Stale { sequence: 1 });

        let shown = list.tickets();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].category, Category::Technical);
        assert_eq!(list.active_filter(), second);
        assert_eq!(list.applied_sequence(), 2);
    }

    #[tokio::test]
    async fn older_fetch_finishing_first_is_also_dropped() {
        let api = seeded_api();
        api.hold_lists(true);
        let list = TicketListSync::new(api.clone());

        let first_fetch = tokio::spawn(list.refetch(Filter::default().with_search("refund")));
        let second_fetch = tokio::spawn(list.refetch(Filter::default().with_search("login")));
        settle().await;

        api.release("refund");
        assert_eq!(
            first_fetch.await.unwrap().unwrap(),
            FetchOutcome::Stale { sequence: 1 }
        );
        assert!(list.tickets().is_empty());

        api.release("login");
        second_fetch.await.unwrap().unwrap();
        assert_eq!(list.tickets()[0].id, TicketId(7));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_list() {
        let api = seeded_api();
        let list = TicketListSync::new(api.clone());
        list.refetch(Filter::default()).await.unwrap();
        assert_eq!(list.tickets().len(), 3);

        api.fail_lists(true);
        let err = list
            .refetch(Filter::default().with_search("server"))
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(list.tickets().len(), 3);
        assert!(list.last_error().is_some());
    }

    #[tokio::test]
    async fn status_change_reloads_with_filter_active_at_call_time() {
        let api = seeded_api();
        let list = TicketListSync::new(api.clone());
        let filter = Filter::default().with_category(Some(Category::Account));
        list.refetch(filter.clone()).await.unwrap();

        let outcome = list
            .apply_status_change(TicketId(7), Status::Resolved)
            .await
            .unwrap();

        assert!(matches!(outcome, FetchOutcome::Applied { sequence: 2, .. }));
        let calls = api.calls();
        assert_eq!(
            calls[1],
            ApiCall::Update(TicketId(7), TicketPatch::status(Status::Resolved))
        );
        assert_eq!(calls[2], ApiCall::List(filter));
        assert_eq!(list.tickets()[0].status, Status::Resolved);
    }

    #[tokio::test]
    async fn failed_status_change_leaves_list_untouched() {
        let api = seeded_api();
        let list = TicketListSync::new(api.clone());
        list.refetch(Filter::default()).await.unwrap();
        api.fail_updates(true);

        let err = list
            .apply_status_change(TicketId(2), Status::Closed)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(api.list_calls().len(), 1);
        assert!(list.tickets().iter().all(|t| t.status == Status::Open));
    }

    #[tokio::test]
    async fn filter_notification_spawns_refetch() {
        let api = seeded_api();
        let list = TicketListSync::new(api.clone());

        list.filter_changed(&Filter::default().with_category(Some(Category::Technical)));
        settle().await;

        assert_eq!(api.list_calls().len(), 1);
        assert_eq!(list.tickets()[0].id, TicketId(2));
    }
}
