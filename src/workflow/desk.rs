use std::sync::Arc;

use tracing::info;

use crate::context::AppContext;
use crate::domain::filter::Filter;
use crate::domain::ticket::{Status, Ticket, TicketId};
use crate::error::AppResult;
use crate::sync::{
    FetchOutcome, FilterStore, RefreshOutcome, StatsSync, TicketForm, TicketListSync,
};

pub struct SubmissionOutcome {
    pub ticket: Ticket,
    pub list: AppResult<FetchOutcome>,
    pub stats: AppResult<RefreshOutcome>,
}

/// Wires filter, list, stats and form together.
pub struct TicketDesk {
    filters: FilterStore,
    list: TicketListSync,
    stats: StatsSync,
    form: TicketForm,
}

impl TicketDesk {
    pub fn new(ctx: &AppContext) -> Self {
        Self::with_filter(ctx, Filter::default())
    }

    /// Starts from `filter` without notifying; call `load` to fetch.
    pub fn with_filter(ctx: &AppContext, filter: Filter) -> Self {
        let filters = FilterStore::with_filter(filter.clone());
        let list = TicketListSync::with_filter(Arc::clone(&ctx.ticket_api), filter);
        let stats = StatsSync::new(Arc::clone(&ctx.ticket_api));
        let form = TicketForm::new(
            Arc::clone(&ctx.ticket_api),
            Arc::clone(&ctx.classifier),
            Arc::clone(&ctx.scheduler),
            ctx.config.debounce,
        );
        filters.subscribe(Arc::new(list.clone()));

        Self {
            filters,
            list,
            stats,
            form,
        }
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub fn list(&self) -> &TicketListSync {
        &self.list
    }

    pub fn stats(&self) -> &StatsSync {
        &self.stats
    }

    pub fn form(&self) -> &TicketForm {
        &self.form
    }

    /// Initial load of the list for the current filter and the stats.
    pub async fn load(&self) -> AppResult<()> {
        let (list, stats) = tokio::join!(
            self.list.refetch(self.filters.filter()),
            self.stats.refresh()
        );
        list?;
        stats?;
        Ok(())
    }

    pub fn set_filter(&self, filter: Filter) {
        self.filters.set_filter(filter);
    }

    /// Submits the draft; on success reloads the list and the stats once each.
    /// Reload failures are reported in the outcome, the ticket exists regardless.
    pub async fn submit_ticket(&self) -> AppResult<SubmissionOutcome> {
        let ticket = self.form.submit().await?;
        let (list, stats) = tokio::join!(
            self.list.refetch(self.filters.filter()),
            self.stats.refresh()
        );
        info!(ticket_id = %ticket.id, "reloaded after ticket creation");
        Ok(SubmissionOutcome {
            ticket,
            list,
            stats,
        })
    }

    pub async fn change_status(&self, id: TicketId, status: Status) -> AppResult<FetchOutcome> {
        self.list.apply_status_change(id, status).await
    }

    pub fn close(&self) {
        self.form.close();
    }
}
