use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::stats::Stats;
use crate::error::AppResult;
use crate::services::TicketApi;
use crate::sync::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { sequence: u64 },
    /// A newer refresh was issued first; the snapshot was dropped.
    Stale { sequence: u64 },
}

#[derive(Default)]
struct StatsState {
    issued: u64,
    current: Option<Stats>,
}

/// Aggregate stats, replaced wholesale on every refresh.
#[derive(Clone)]
pub struct StatsSync {
    api: Arc<dyn TicketApi>,
    state: Arc<Mutex<StatsState>>,
}

impl StatsSync {
    pub fn new(api: Arc<dyn TicketApi>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(StatsState::default())),
        }
    }

    pub fn refresh(&self) -> impl Future<Output = AppResult<RefreshOutcome>> + Send + use<> {
        let sequence = {
            let mut state = lock(&self.state);
            state.issued += 1;
            state.issued
        };
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        async move {
            let result = api.fetch_stats().await;
            let mut state = lock(&state);
            if sequence != state.issued {
                debug!(sequence, "dropping superseded stats response");
                return Ok(RefreshOutcome::Stale { sequence });
            }
            let stats = result.inspect_err(|err| warn!(error = %err, "stats refresh failed"))?;
            state.current = Some(stats);
            Ok(RefreshOutcome::Applied { sequence })
        }
    }

    pub fn stats(&self) -> Option<Stats> {
        lock(&self.state).current.clone()
    }
}
