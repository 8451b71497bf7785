use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::draft::DraftTicket;
use crate::domain::ticket::{Category, Priority, Ticket};
use crate::error::{AppError, AppResult};
use crate::services::{ClassifierService, TicketApi};
use crate::sync::lock;
use crate::sync::scheduler::Scheduler;
use crate::sync::suggestion::{SharedDraft, SuggestionDebouncer, SuggestionPhase};

struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// New-ticket form: the draft plus its suggestion debouncer.
#[derive(Clone)]
pub struct TicketForm {
    api: Arc<dyn TicketApi>,
    draft: SharedDraft,
    suggestions: SuggestionDebouncer,
    submitting: Arc<AtomicBool>,
}

impl TicketForm {
    pub fn new(
        api: Arc<dyn TicketApi>,
        classifier: Arc<dyn ClassifierService>,
        scheduler: Arc<dyn Scheduler>,
        quiescence: Duration,
    ) -> Self {
        let draft = SharedDraft::default();
        let suggestions =
            SuggestionDebouncer::new(classifier, scheduler, quiescence, draft.clone());
        Self {
            api,
            draft,
            suggestions,
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn draft(&self) -> DraftTicket {
        lock(&self.draft).clone()
    }

    pub fn suggestions(&self) -> &SuggestionDebouncer {
        &self.suggestions
    }

    pub fn set_title(&self, title: impl Into<String>) {
        lock(&self.draft).title = title.into();
    }

    pub fn set_description(&self, description: impl Into<String>) {
        lock(&self.draft).description = description.into();
        self.suggestions.schedule();
    }

    pub fn set_category(&self, category: Option<Category>) {
        lock(&self.draft).category = category;
    }

    pub fn set_priority(&self, priority: Option<Priority>) {
        lock(&self.draft).priority = priority;
    }

    pub fn is_classifying(&self) -> bool {
        self.suggestions.phase() == SuggestionPhase::Pending
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Creates the ticket. The draft is cleared only once the server
    /// confirms; on failure it is kept so the user can retry.
    pub async fn submit(&self) -> AppResult<Ticket> {
        let ticket = self.draft().validate()?;
        if self.submitting.swap(true, Ordering::SeqCst) {
            return Err(AppError::SubmissionInProgress);
        }
        let _guard = SubmittingGuard(&self.submitting);

        match self.api.create_ticket(&ticket).await {
            Ok(created) => {
                self.suggestions.cancel();
                *lock(&self.draft) = DraftTicket::default();
                info!(ticket_id = %created.id, "ticket created");
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "ticket creation failed; draft kept for retry");
                Err(err)
            }
        }
    }

    /// Discards pending suggestions; the form no longer classifies afterwards.
    pub fn close(&self) {
        self.suggestions.close();
    }
}
