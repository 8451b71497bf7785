pub mod filter_store;
pub mod form;
pub mod scheduler;
pub mod stats;
pub mod suggestion;
pub mod ticket_list;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use filter_store::{FilterListener, FilterStore};
pub use form::TicketForm;
pub use scheduler::{Scheduler, TimerHandle, TokioScheduler};
pub use stats::{RefreshOutcome, StatsSync};
pub use suggestion::{SuggestionDebouncer, SuggestionPhase};
pub use ticket_list::{FetchOutcome, TicketListSync};

// State behind these locks stays consistent even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
