use chrono::{Duration as ChronoDuration, NaiveDateTime};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

use crate::models::{PrayerTimes, PrayerType};
use crate::scheduler::{TimerFuture, TimerHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNotice {
    pub prayer: PrayerType,
    pub fire_at: NaiveDateTime,
    pub delay: Duration,
}

/// Which pre-prayer notices are still ahead of `now` today.
/// A lead of zero disables notices entirely.
pub fn plan_notifications(
    times: &PrayerTimes,
    lead_minutes: u32,
    now: NaiveDateTime,
) -> Vec<PlannedNotice> {
    if lead_minutes == 0 {
        return Vec::new();
    }
    let lead = ChronoDuration::minutes(i64::from(lead_minutes));

    times
        .entries()
        .iter()
        .filter_map(|(prayer, time)| {
            let fire_at = now.date().and_time(*time) - lead;
            let delay = (fire_at - now).to_std().ok()?;
            if delay.is_zero() {
                return None;
            }
            Some(PlannedNotice {
                prayer: *prayer,
                fire_at,
                delay,
            })
        })
        .collect()
}

pub type NoticeAction = Arc<dyn Fn(PrayerType) -> TimerFuture + Send + Sync>;

/// Owns the one-shot timers for today's pre-prayer notices.
#[derive(Debug, Default)]
pub struct NotificationScheduler {
    timers: Vec<(PrayerType, TimerHandle)>,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel whatever is pending, then arm one timer per planned notice.
    /// Returns how many timers were armed.
    pub fn schedule(
        &mut self,
        times: &PrayerTimes,
        lead_minutes: u32,
        now: NaiveDateTime,
        notify: NoticeAction,
    ) -> usize {
        self.cancel_all();

        for notice in plan_notifications(times, lead_minutes, now) {
            let notify = notify.clone();
            let deadline = Instant::now() + notice.delay;
            let prayer = notice.prayer;
            debug!("{} notice at {}", prayer, notice.fire_at);
            let handle = TimerHandle::spawn(async move {
                sleep_until(deadline).await;
                notify(prayer).await;
            });
            self.timers.push((prayer, handle));
        }

        if !self.timers.is_empty() {
            info!(
                "Armed {} prayer notice(s), {} min ahead",
                self.timers.len(),
                lead_minutes
            );
        }
        self.timers.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.timers.len();
        for (_, handle) in self.timers.drain(..) {
            handle.cancel();
        }
        cancelled
    }

    #[cfg(test)]
    pub fn pending(&self) -> Vec<PrayerType> {
        self.timers
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(prayer, _)| *prayer)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::settle;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn sample() -> PrayerTimes {
        PrayerTimes::from_pairs([
            ("Fajr", "05:00"),
            ("Dhuhr", "12:30"),
            ("Asr", "15:45"),
            ("Maghrib", "18:10"),
            ("Isha", "19:40"),
        ])
        .unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<PrayerType>>>, NoticeAction) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        let notify: NoticeAction = Arc::new(move |prayer| {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().unwrap().push(prayer);
            })
        });
        (fired, notify)
    }

    #[test]
    fn zero_lead_plans_nothing() {
        assert!(plan_notifications(&sample(), 0, at(1, 0)).is_empty());
    }

    #[test]
    fn passed_notices_are_skipped() {
        // Asr notice would be 15:30, Maghrib 17:55
        let plan = plan_notifications(&sample(), 15, at(15, 35));
        let prayers: Vec<_> = plan.iter().map(|n| n.prayer).collect();
        assert_eq!(prayers, vec![PrayerType::Maghrib, PrayerType::Isha]);
        assert_eq!(plan[0].fire_at, at(17, 55));
        assert_eq!(plan[0].delay, Duration::from_secs((2 * 60 + 20) * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn notices_fire_at_lead_time() {
        let mut scheduler = NotificationScheduler::new();
        let (fired, notify) = recorder();
        let armed = scheduler.schedule(&sample(), 10, at(18, 0), notify);
        assert_eq!(armed, 1);

        tokio::time::advance(Duration::from_secs(89 * 60)).await;
        settle().await;
        assert!(fired.lock().unwrap().is_empty());

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(*fired.lock().unwrap(), vec![PrayerType::Isha]);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_drops_stale_notices() {
        let mut scheduler = NotificationScheduler::new();
        let (first, notify) = recorder();
        scheduler.schedule(&sample(), 10, at(12, 0), notify);
        assert_eq!(scheduler.pending().len(), 4);

        let (second, notify) = recorder();
        scheduler.schedule(&sample(), 0, at(12, 0), notify);
        assert!(scheduler.pending().is_empty());

        tokio::time::advance(Duration::from_secs(8 * 3600)).await;
        settle().await;
        assert!(first.lock().unwrap().is_empty());
        assert!(second.lock().unwrap().is_empty());
    }
}
