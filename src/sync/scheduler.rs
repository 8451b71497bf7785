use std::time::Duration;

use futures::future::BoxFuture;

/// Delayed execution used by the debouncer. Injected so timing can be
/// driven by tests instead of the wall clock.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle;
}

/// Cancels a scheduled task that has not fired yet. Cancelling after the
/// timer fired is a no-op; the task itself keeps running.
pub struct TimerHandle {
    cancel: Box<dyn FnOnce() + Send>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    pub fn cancel(self) {
        (self.cancel)()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> TimerHandle {
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(task);
        });
        let abort = timer.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}
