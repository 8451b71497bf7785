//! Classify-as-you-type.
//!
//! Each description edit restarts a quiescence timer. When the timer fires,
//! one classification request is issued for the description at that moment.
//! Every edit, clear or close bumps the generation, so a response is merged
//! only if nothing happened to the description since its request was issued.
//! Merging fills the draft's unset fields and never overwrites user choices.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::draft::{DraftTicket, Suggestion};
use crate::error::AppResult;
use crate::services::ClassifierService;
use crate::sync::lock;
use crate::sync::scheduler::{Scheduler, TimerHandle};

pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(500);

pub type SharedDraft = Arc<Mutex<DraftTicket>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionPhase {
    Idle,
    Scheduled,
    Pending,
    Applied,
    Discarded,
}

impl SuggestionPhase {
    pub fn is_settled(&self) -> bool {
        !matches!(self, SuggestionPhase::Scheduled | SuggestionPhase::Pending)
    }
}

#[derive(Default)]
struct DebounceState {
    generation: u64,
    timer: Option<TimerHandle>,
    closed: bool,
}

struct DebouncerInner {
    classifier: Arc<dyn ClassifierService>,
    scheduler: Arc<dyn Scheduler>,
    quiescence: Duration,
    draft: SharedDraft,
    state: Mutex<DebounceState>,
    phase: watch::Sender<SuggestionPhase>,
}

impl DebouncerInner {
    fn set_phase(&self, phase: SuggestionPhase) {
        self.phase.send_replace(phase);
    }

    /// Cancels outstanding work; must be called with `state` locked.
    fn invalidate(&self, state: &mut DebounceState) {
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        let settled = self.phase.borrow().is_settled();
        if !settled {
            self.set_phase(SuggestionPhase::Discarded);
        }
    }

    async fn fire(self: Arc<Self>, generation: u64) {
        let key = {
            let mut state = lock(&self.state);
            if state.closed || state.generation != generation {
                return;
            }
            state.timer = None;
            let key = lock(&self.draft).description.clone();
            if key.trim().is_empty() {
                self.set_phase(SuggestionPhase::Idle);
                return;
            }
            self.set_phase(SuggestionPhase::Pending);
            key
        };

        debug!(generation, "requesting classification");
        let result = self.classifier.classify(&key).await;
        self.finish(generation, &key, result);
    }

    fn finish(&self, generation: u64, key: &str, result: AppResult<Suggestion>) {
        let state = lock(&self.state);
        if state.closed || state.generation != generation {
            debug!(
                generation,
                live = state.generation,
                "discarding classification for outdated description"
            );
            return;
        }

        match result {
            Ok(suggestion) => {
                let mut draft = lock(&self.draft);
                if draft.description != key {
                    debug!(generation, "description changed outside the debouncer");
                    self.set_phase(SuggestionPhase::Discarded);
                    return;
                }
                let changed = draft.apply_suggestion(&suggestion);
                debug!(generation, changed, "classification applied");
                self.set_phase(SuggestionPhase::Applied);
            }
            Err(err) => {
                warn!(error = %err, "classification failed");
                self.set_phase(SuggestionPhase::Idle);
            }
        }
    }
}

#[derive(Clone)]
pub struct SuggestionDebouncer {
    inner: Arc<DebouncerInner>,
}

impl SuggestionDebouncer {
    pub fn new(
        classifier: Arc<dyn ClassifierService>,
        scheduler: Arc<dyn Scheduler>,
        quiescence: Duration,
        draft: SharedDraft,
    ) -> Self {
        let (phase, _) = watch::channel(SuggestionPhase::Idle);
        Self {
            inner: Arc::new(DebouncerInner {
                classifier,
                scheduler,
                quiescence,
                draft,
                state: Mutex::new(DebounceState::default()),
                phase,
            }),
        }
    }

    /// Reacts to an edit of the draft description. A blank description
    /// cancels outstanding work instead of scheduling.
    pub fn schedule(&self) {
        let mut state = lock(&self.inner.state);
        if state.closed {
            return;
        }
        self.inner.invalidate(&mut state);

        if !lock(&self.inner.draft).has_description() {
            return;
        }

        let generation = state.generation;
        let task = Arc::clone(&self.inner).fire(generation).boxed();
        state.timer = Some(self.inner.scheduler.schedule(self.inner.quiescence, task));
        self.inner.set_phase(SuggestionPhase::Scheduled);
    }

    /// Drops any scheduled or in-flight suggestion.
    pub fn cancel(&self) {
        let mut state = lock(&self.inner.state);
        self.inner.invalidate(&mut state);
    }

    /// Terminal: later edits no longer schedule suggestions.
    pub fn close(&self) {
        let mut state = lock(&self.inner.state);
        self.inner.invalidate(&mut state);
        state.closed = true;
    }

    pub fn phase(&self) -> SuggestionPhase {
        *self.inner.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionPhase> {
        self.inner.phase.subscribe()
    }

    /// Resolves once no suggestion is scheduled or in flight.
    pub async fn settled(&self) -> SuggestionPhase {
        let mut updates = self.subscribe();
        match updates.wait_for(SuggestionPhase::is_settled).await {
            Ok(phase) => *phase,
            Err(_) => self.phase(),
        }
    }
}
