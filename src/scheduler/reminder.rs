use log::info;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::models::ReminderInterval;
use crate::scheduler::{TimerAction, TimerHandle};

/// Repeats the reminder action on the configured interval.
#[derive(Debug, Default)]
pub struct ReminderScheduler {
    current: Option<(ReminderInterval, TimerHandle)>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any running reminder timer with one firing every `interval`.
    /// The first reminder comes one full interval after arming.
    pub fn arm(&mut self, interval: ReminderInterval, action: TimerAction) {
        self.cancel();

        let period = interval.duration();
        let first = Instant::now() + period;
        let handle = TimerHandle::spawn(async move {
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                action().await;
            }
        });
        info!("Reminder timer armed every {}", interval.as_str());
        self.current = Some((interval, handle));
    }

    /// Stop the running timer. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        match self.current.take() {
            Some((_, handle)) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Option<ReminderInterval> {
        self.current.as_ref().map(|(interval, _)| *interval)
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{counter, hits, settle};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_interval() {
        let mut scheduler = ReminderScheduler::new();
        let (count, act) = counter();
        scheduler.arm(ReminderInterval::Seconds30, act);
        settle().await;
        assert_eq!(hits(&count), 0);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(hits(&count), 1);

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(30)).await;
            settle().await;
        }
        assert_eq!(hits(&count), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_the_previous_timer() {
        let mut scheduler = ReminderScheduler::new();
        let (old_count, old_act) = counter();
        scheduler.arm(ReminderInterval::Seconds30, old_act);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(hits(&old_count), 1);

        let (new_count, new_act) = counter();
        scheduler.arm(ReminderInterval::Minutes1, new_act);
        assert_eq!(scheduler.interval(), Some(ReminderInterval::Minutes1));

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(hits(&old_count), 1);
        assert_eq!(hits(&new_count), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(hits(&new_count), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let mut scheduler = ReminderScheduler::new();
        let (count, act) = counter();
        scheduler.arm(ReminderInterval::Seconds30, act);

        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        assert!(!scheduler.is_armed());

        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;
        assert_eq!(hits(&count), 0);
    }
}
