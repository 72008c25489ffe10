use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{CalculationMethod, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrayerType {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerType {
    pub fn all() -> [PrayerType; 5] {
        [
            PrayerType::Fajr,
            PrayerType::Dhuhr,
            PrayerType::Asr,
            PrayerType::Maghrib,
            PrayerType::Isha,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerType::Fajr => "fajr",
            PrayerType::Dhuhr => "dhuhr",
            PrayerType::Asr => "asr",
            PrayerType::Maghrib => "maghrib",
            PrayerType::Isha => "isha",
        }
    }

    /// Name as it appears in the prayer API's `timings` object.
    pub fn display_name(&self) -> &'static str {
        match self {
            PrayerType::Fajr => "Fajr",
            PrayerType::Dhuhr => "Dhuhr",
            PrayerType::Asr => "Asr",
            PrayerType::Maghrib => "Maghrib",
            PrayerType::Isha => "Isha",
        }
    }
}

impl std::fmt::Display for PrayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PrayerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fajr" => Ok(PrayerType::Fajr),
            "dhuhr" | "zuhr" | "dhuhur" => Ok(PrayerType::Dhuhr),
            "asr" => Ok(PrayerType::Asr),
            "maghrib" => Ok(PrayerType::Maghrib),
            "isha" => Ok(PrayerType::Isha),
            _ => Err(anyhow::anyhow!("Unknown prayer type: {}", s)),
        }
    }
}

/// One day's prayer times as an ordered list of `(prayer, time)` pairs.
///
/// Entries are sorted by time when built, so the first entry is always the
/// chronologically earliest. The list is never edited in place; a refresh
/// builds a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerTimes {
    entries: Vec<(PrayerType, NaiveTime)>,
}

impl PrayerTimes {
    pub fn new(mut entries: Vec<(PrayerType, NaiveTime)>) -> Self {
        // stable: equal times keep their input order
        entries.sort_by_key(|(_, time)| *time);
        Self { entries }
    }

    /// Parse `("Fajr", "05:00")` style pairs as delivered by the prayer API.
    pub fn from_pairs<'a, I>(pairs: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut entries = Vec::new();
        for (name, time) in pairs {
            let prayer = PrayerType::from_str(name)?;
            entries.push((prayer, parse_hhmm(time)?));
        }
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[(PrayerType, NaiveTime)] {
        &self.entries
    }

    pub fn get(&self, prayer: PrayerType) -> Option<NaiveTime> {
        self.entries
            .iter()
            .find(|(p, _)| *p == prayer)
            .map(|(_, t)| *t)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse an "HH:MM" prayer time. Anything after the first whitespace is
/// ignored, since some API deployments append a timezone tag like "(EET)".
pub fn parse_hhmm(s: &str) -> anyhow::Result<NaiveTime> {
    let trimmed = s.split_whitespace().next().unwrap_or("");
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|e| anyhow::anyhow!("Bad time '{}': {}", s, e))
}

/// A day of prayer times as returned by the prayer-time API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTimings {
    pub date: NaiveDate,
    pub location: Location,
    pub method: CalculationMethod,
    pub times: PrayerTimes,
    /// Hijri date string, kept exactly as the API sent it.
    pub hijri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn prayer_times_are_sorted_on_construction() {
        let times = PrayerTimes::new(vec![
            (PrayerType::Isha, t(19, 40)),
            (PrayerType::Fajr, t(5, 0)),
            (PrayerType::Asr, t(15, 45)),
        ]);
        let order: Vec<_> = times.entries().iter().map(|(p, _)| *p).collect();
        assert_eq!(order, vec![PrayerType::Fajr, PrayerType::Asr, PrayerType::Isha]);
    }

    #[test]
    fn from_pairs_accepts_timezone_suffix() {
        let times =
            PrayerTimes::from_pairs([("Fajr", "04:51 (EET)"), ("Dhuhr", "11:58")]).unwrap();
        assert_eq!(times.get(PrayerType::Fajr), Some(t(4, 51)));
        assert_eq!(times.get(PrayerType::Dhuhr), Some(t(11, 58)));
        assert_eq!(times.get(PrayerType::Isha), None);
    }

    #[test]
    fn from_pairs_rejects_garbage() {
        assert!(PrayerTimes::from_pairs([("Fajr", "late")]).is_err());
        assert!(PrayerTimes::from_pairs([("Sunrise", "06:00")]).is_err());
    }

    #[test]
    fn prayer_type_parses_aliases() {
        assert_eq!(PrayerType::from_str("Zuhr").unwrap(), PrayerType::Dhuhr);
        assert_eq!(PrayerType::from_str("ISHA").unwrap(), PrayerType::Isha);
    }
}
