use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use log::info;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};

use crate::scheduler::{TimerAction, TimerHandle};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time left until the next local 00:00:00. Exactly at midnight this is a
/// full day, never zero.
pub fn until_next_midnight(now: NaiveDateTime) -> Duration {
    let tomorrow = now.date() + ChronoDuration::days(1);
    let midnight = tomorrow.and_time(NaiveTime::MIN);
    (midnight - now).to_std().unwrap_or(DAY)
}

/// Daily refresh: one shot at the next midnight, then a plain 24h repeat.
/// The repeat is not re-aligned to midnight, so it may drift over time.
#[derive(Debug)]
pub struct MidnightRefresh {
    handle: TimerHandle,
    #[cfg(test)]
    first_fire: NaiveDateTime,
}

impl MidnightRefresh {
    pub fn start(now: NaiveDateTime, action: TimerAction) -> Self {
        let wait = until_next_midnight(now);
        let deadline = Instant::now() + wait;
        let first_fire = now + ChronoDuration::from_std(wait).unwrap_or(ChronoDuration::days(1));

        let handle = TimerHandle::spawn(async move {
            sleep_until(deadline).await;
            action().await;

            let mut daily = interval_at(Instant::now() + DAY, DAY);
            daily.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                daily.tick().await;
                action().await;
            }
        });
        info!("Daily refresh armed for {}", first_fire);

        Self {
            handle,
            #[cfg(test)]
            first_fire,
        }
    }

    #[cfg(test)]
    pub fn first_fire(&self) -> NaiveDateTime {
        self.first_fire
    }

    pub fn cancel(self) {
        self.handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::{counter, hits, settle};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn wait_reaches_next_midnight() {
        assert_eq!(until_next_midnight(at(22, 0, 0)), Duration::from_secs(2 * 3600));
        assert_eq!(until_next_midnight(at(23, 59, 59)), Duration::from_secs(1));
        assert_eq!(until_next_midnight(at(0, 0, 0)), DAY);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_at_midnight_then_every_day() {
        let (count, act) = counter();
        let refresh = MidnightRefresh::start(at(22, 0, 0), act);
        assert_eq!(
            refresh.first_fire(),
            NaiveDate::from_ymd_opt(2026, 10, 20)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );

        tokio::time::advance(Duration::from_secs(2 * 3600) - Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(hits(&count), 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(hits(&count), 1);

        tokio::time::advance(DAY - Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(hits(&count), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(hits(&count), 2);

        tokio::time::advance(DAY).await;
        settle().await;
        assert_eq!(hits(&count), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_refresh_stays_silent() {
        let (count, act) = counter();
        let refresh = MidnightRefresh::start(at(23, 0, 0), act);
        refresh.cancel();

        tokio::time::advance(Duration::from_secs(2 * 3600)).await;
        settle().await;
        assert_eq!(hits(&count), 0);
    }
}
