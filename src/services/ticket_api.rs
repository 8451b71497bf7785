use async_trait::async_trait;

use crate::domain::filter::Filter;
use crate::domain::stats::Stats;
use crate::domain::ticket::{NewTicket, Ticket, TicketId, TicketPatch};
use crate::error::AppResult;

#[async_trait]
pub trait TicketApi: Send + Sync {
    async fn list_tickets(&self, filter: &Filter) -> AppResult<Vec<Ticket>>;
    async fn create_ticket(&self, ticket: &NewTicket) -> AppResult<Ticket>;
    async fn update_ticket(&self, id: TicketId, patch: &TicketPatch) -> AppResult<Ticket>;
    async fn fetch_stats(&self) -> AppResult<Stats>;
}
