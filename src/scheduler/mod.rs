pub mod midnight;
pub mod notifications;
pub mod reminder;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use midnight::{MidnightRefresh, until_next_midnight};
pub use notifications::{NotificationScheduler, PlannedNotice, plan_notifications};
pub use reminder::ReminderScheduler;

pub type TimerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Work a timer runs each time it fires.
pub type TimerAction = Arc<dyn Fn() -> TimerFuture + Send + Sync>;

pub fn action<F, Fut>(f: F) -> TimerAction
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// A spawned timer task. Dropping or cancelling the handle aborts the task,
/// so replacing a handle never leaves the old timer running.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(future),
        }
    }

    pub fn cancel(self) {
        self.task.abort();
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{counter, hits, settle};
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (count, act) = counter();
        let handle = TimerHandle::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            act().await;
        });
        handle.cancel();
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(hits(&count), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_never_fires() {
        let (count, act) = counter();
        {
            let _handle = TimerHandle::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                act().await;
            });
        }
        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(hits(&count), 0);
    }
}
