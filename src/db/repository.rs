use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use log::warn;
use rusqlite::{Connection, OptionalExtension, params};
use std::str::FromStr;

use crate::models::prayer::parse_hhmm;
use crate::models::{
    CalculationMethod, DailyTimings, DisplayLanguage, Location, PrayerTimes, PrayerType,
    ReminderInterval,
};

// ─── Cached prayer times ────────────────────────────────────────────────────

pub struct CacheRepo;

impl CacheRepo {
    pub fn get_timings(
        conn: &Connection,
        date: NaiveDate,
        location: &Location,
        method: CalculationMethod,
    ) -> Result<Option<DailyTimings>> {
        let row = conn
            .query_row(
                "SELECT fajr, dhuhr, asr, maghrib, isha, hijri FROM prayer_times_cache
                 WHERE date = ?1 AND location_key = ?2 AND method = ?3",
                params![
                    date.format("%Y-%m-%d").to_string(),
                    location.cache_key(),
                    method.id()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((fajr, dhuhr, asr, maghrib, isha, hijri)) = row else {
            return Ok(None);
        };

        let times = PrayerTimes::new(vec![
            (PrayerType::Fajr, parse_hhmm(&fajr)?),
            (PrayerType::Dhuhr, parse_hhmm(&dhuhr)?),
            (PrayerType::Asr, parse_hhmm(&asr)?),
            (PrayerType::Maghrib, parse_hhmm(&maghrib)?),
            (PrayerType::Isha, parse_hhmm(&isha)?),
        ]);

        Ok(Some(DailyTimings {
            date,
            location: location.clone(),
            method,
            times,
            hijri,
        }))
    }

    /// Replace the row for this day, place and method.
    pub fn store_timings(conn: &Connection, timings: &DailyTimings) -> Result<()> {
        let fmt = |prayer: PrayerType| -> Result<String> {
            timings
                .times
                .get(prayer)
                .map(|t| t.format("%H:%M").to_string())
                .ok_or_else(|| anyhow!("{} missing from prayer times", prayer))
        };

        conn.execute(
            "INSERT OR REPLACE INTO prayer_times_cache
                (date, location_key, method, country, state, city,
                 fajr, dhuhr, asr, maghrib, isha, hijri)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                timings.date.format("%Y-%m-%d").to_string(),
                timings.location.cache_key(),
                timings.method.id(),
                timings.location.country,
                timings.location.state,
                timings.location.city,
                fmt(PrayerType::Fajr)?,
                fmt(PrayerType::Dhuhr)?,
                fmt(PrayerType::Asr)?,
                fmt(PrayerType::Maghrib)?,
                fmt(PrayerType::Isha)?,
                timings.hijri,
            ],
        )?;
        Ok(())
    }

    /// Drop rows for days before `keep_from`. Returns how many were removed.
    pub fn prune_before(conn: &Connection, keep_from: NaiveDate) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM prayer_times_cache WHERE date < ?1",
            params![keep_from.format("%Y-%m-%d").to_string()],
        )?;
        Ok(removed)
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

// ─── User preferences ────────────────────────────────────────────────────────

const KEY_COUNTRY: &str = "location.country";
const KEY_STATE: &str = "location.state";
const KEY_CITY: &str = "location.city";
const KEY_INTERVAL: &str = "reminder_interval";
const KEY_METHOD: &str = "calc_method";
const KEY_LEAD: &str = "notification_lead";
const KEY_LANGUAGE: &str = "display_language";

/// Typed access to the settings kept in `app_meta`. Missing or unreadable
/// values fall back to their defaults.
pub struct PreferenceRepo;

impl PreferenceRepo {
    pub fn location(conn: &Connection) -> Result<Location> {
        Ok(Location::new(
            MetaRepo::get(conn, KEY_COUNTRY)?.unwrap_or_default(),
            MetaRepo::get(conn, KEY_STATE)?.unwrap_or_default(),
            MetaRepo::get(conn, KEY_CITY)?.unwrap_or_default(),
        ))
    }

    pub fn set_location(conn: &Connection, location: &Location) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        MetaRepo::set(&tx, KEY_COUNTRY, &location.country)?;
        MetaRepo::set(&tx, KEY_STATE, &location.state)?;
        MetaRepo::set(&tx, KEY_CITY, &location.city)?;
        tx.commit().context("Saving location")?;
        Ok(())
    }

    pub fn reminder_interval(conn: &Connection) -> Result<ReminderInterval> {
        Self::parsed(conn, KEY_INTERVAL, |raw| {
            raw.parse::<u64>().ok().and_then(ReminderInterval::from_millis)
        })
    }

    pub fn set_reminder_interval(conn: &Connection, interval: ReminderInterval) -> Result<()> {
        MetaRepo::set(conn, KEY_INTERVAL, &interval.as_millis().to_string())
    }

    pub fn calc_method(conn: &Connection) -> Result<CalculationMethod> {
        Self::parsed(conn, KEY_METHOD, |raw| CalculationMethod::from_str(raw).ok())
    }

    pub fn set_calc_method(conn: &Connection, method: CalculationMethod) -> Result<()> {
        MetaRepo::set(conn, KEY_METHOD, &method.id().to_string())
    }

    pub fn notification_lead(conn: &Connection) -> Result<u32> {
        Self::parsed(conn, KEY_LEAD, |raw| raw.parse::<u32>().ok())
    }

    pub fn set_notification_lead(conn: &Connection, minutes: u32) -> Result<()> {
        MetaRepo::set(conn, KEY_LEAD, &minutes.to_string())
    }

    pub fn display_language(conn: &Connection) -> Result<DisplayLanguage> {
        Self::parsed(conn, KEY_LANGUAGE, |raw| DisplayLanguage::from_str(raw).ok())
    }

    pub fn set_display_language(conn: &Connection, language: DisplayLanguage) -> Result<()> {
        MetaRepo::set(conn, KEY_LANGUAGE, language.as_str())
    }

    fn parsed<T: Default>(
        conn: &Connection,
        key: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T> {
        match MetaRepo::get(conn, key)? {
            None => Ok(T::default()),
            Some(raw) => Ok(parse(&raw).unwrap_or_else(|| {
                warn!("Ignoring unreadable setting {} = '{}'", key, raw);
                T::default()
            })),
        }
    }
}
