use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::draft::Suggestion;
use crate::domain::filter::Filter;
use crate::domain::stats::Stats;
use crate::domain::ticket::{NewTicket, Ticket, TicketId, TicketPatch};
use crate::error::{AppError, AppResult};
use crate::services::{ClassifierService, TicketApi};

pub struct HttpTicketApi {
    http: Client,
    base_url: String,
}

impl HttpTicketApi {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Configuration(
                "ticket API base URL not configured".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn tickets_endpoint(&self) -> String {
        self.endpoint("tickets/")
    }

    fn ticket_endpoint(&self, id: TicketId) -> String {
        self.endpoint(&format!("tickets/{id}/"))
    }

    fn stats_endpoint(&self) -> String {
        self.endpoint("tickets/stats/")
    }

    fn classify_endpoint(&self) -> String {
        self.endpoint("tickets/classify/")
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> AppResult<T> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to call ticket API: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Decode(err.to_string()))
    }
}

#[async_trait]
impl TicketApi for HttpTicketApi {
    async fn list_tickets(&self, filter: &Filter) -> AppResult<Vec<Ticket>> {
        let request = self
            .http
            .get(self.tickets_endpoint())
            .query(&filter.query_pairs());
        Self::send(request).await
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> AppResult<Ticket> {
        let request = self
            .http
            .post(self.tickets_endpoint())
            .header(CONTENT_TYPE, "application/json")
            .json(ticket);
        Self::send(request).await
    }

    async fn update_ticket(&self, id: TicketId, patch: &TicketPatch) -> AppResult<Ticket> {
        let request = self
            .http
            .patch(self.ticket_endpoint(id))
            .header(CONTENT_TYPE, "application/json")
            .json(patch);
        Self::send(request).await
    }

    async fn fetch_stats(&self) -> AppResult<Stats> {
        Self::send(self.http.get(self.stats_endpoint())).await
    }
}

#[async_trait]
impl ClassifierService for HttpTicketApi {
    async fn classify(&self, description: &str) -> AppResult<Suggestion> {
        let request = self
            .http
            .post(self.classify_endpoint())
            .header(CONTENT_TYPE, "application/json")
            .json(&ClassifyRequest { description });
        let payload: ClassifyResponse = Self::send(request).await?;
        Ok(Suggestion::from_labels(
            payload.suggested_category.as_deref(),
            payload.suggested_priority.as_deref(),
        ))
    }
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    description: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    suggested_category: Option<String>,
    suggested_priority: Option<String>,
}
