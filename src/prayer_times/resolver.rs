use chrono::{Duration, NaiveDateTime};

use crate::models::{PrayerTimes, PrayerType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextPrayer {
    pub prayer: PrayerType,
    pub at: NaiveDateTime,
    pub remaining: Duration,
}

/// Find the first prayer strictly after `now`.
///
/// Times are placed on `now`'s date. When every prayer has already passed the
/// earliest one is returned for the following day. Returns `None` only for an
/// empty schedule.
pub fn next_prayer(times: &PrayerTimes, now: NaiveDateTime) -> Option<NextPrayer> {
    let today = now.date();

    for (prayer, time) in times.entries() {
        let at = today.and_time(*time);
        if at > now {
            return Some(NextPrayer {
                prayer: *prayer,
                at,
                remaining: at - now,
            });
        }
    }

    // All prayers passed, wrap to the earliest one tomorrow
    let (prayer, time) = times.entries().first()?;
    let at = today.and_time(*time) + Duration::hours(24);
    Some(NextPrayer {
        prayer: *prayer,
        at,
        remaining: at - now,
    })
}
