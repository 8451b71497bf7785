use std::sync::{Arc, Mutex};

use crate::domain::filter::Filter;
use crate::sync::lock;

/// Notified synchronously on every `set_filter`.
pub trait FilterListener: Send + Sync {
    fn filter_changed(&self, filter: &Filter);
}

#[derive(Default)]
struct FilterState {
    current: Filter,
    listeners: Vec<Arc<dyn FilterListener>>,
}

/// Single source of truth for which ticket list should be shown.
#[derive(Clone, Default)]
pub struct FilterStore {
    state: Arc<Mutex<FilterState>>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: Filter) -> Self {
        Self {
            state: Arc::new(Mutex::new(FilterState {
                current: filter,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn filter(&self) -> Filter {
        lock(&self.state).current.clone()
    }

    pub fn subscribe(&self, listener: Arc<dyn FilterListener>) {
        lock(&self.state).listeners.push(listener);
    }

    /// Replaces the held filter and notifies every listener, even when the
    /// new value equals the old one.
    pub fn set_filter(&self, filter: Filter) {
        let listeners = {
            let mut state = lock(&self.state);
            state.current = filter.clone();
            state.listeners.clone()
        };
        tracing::debug!(?filter, listeners = listeners.len(), "filter changed");
        for listener in listeners {
            listener.filter_changed(&filter);
        }
    }
}
