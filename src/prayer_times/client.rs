use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{AdhkarError, Result};
use crate::models::{CalculationMethod, DailyTimings, Location, PrayerTimes, PrayerType};

pub const DEFAULT_PRAYER_API: &str = "https://api.aladhan.com/v1";

/// Anything that can produce a day of prayer times for a location.
#[async_trait]
pub trait PrayerSource: Send + Sync {
    async fn fetch_timings(
        &self,
        location: &Location,
        method: CalculationMethod,
        date: NaiveDate,
    ) -> Result<DailyTimings>;
}

#[derive(Debug, Deserialize)]
struct TimingsResponse {
    code: u16,
    data: Option<TimingsData>,
}

#[derive(Debug, Deserialize)]
struct TimingsData {
    timings: HashMap<String, String>,
    date: DateInfo,
}

#[derive(Debug, Deserialize)]
struct DateInfo {
    hijri: HijriInfo,
}

#[derive(Debug, Deserialize)]
struct HijriInfo {
    date: String,
}

#[derive(Clone)]
pub struct AladhanClient {
    client: Client,
    base_url: String,
}

impl AladhanClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("vsadhkar/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PrayerSource for AladhanClient {
    async fn fetch_timings(
        &self,
        location: &Location,
        method: CalculationMethod,
        date: NaiveDate,
    ) -> Result<DailyTimings> {
        location.require_complete()?;

        let url = format!(
            "{}/timingsByCity/{}",
            self.base_url,
            date.format("%d-%m-%Y")
        );
        let method_id = method.id().to_string();
        debug!("Fetching prayer times for {} (method {})", location, method_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("city", location.city.as_str()),
                ("state", location.state.as_str()),
                ("country", location.country.as_str()),
                ("method", method_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AdhkarError::network("prayer API", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdhkarError::UpstreamStatus {
                service: "prayer API",
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AdhkarError::network("prayer API", e))?;
        decode_timings(&body, location, method, date)
    }
}

/// Turn a `timingsByCity` response body into [`DailyTimings`].
pub fn decode_timings(
    body: &str,
    location: &Location,
    method: CalculationMethod,
    date: NaiveDate,
) -> Result<DailyTimings> {
    let parsed: TimingsResponse =
        serde_json::from_str(body).map_err(|e| AdhkarError::decode("prayer times", e))?;

    if parsed.code != 200 {
        return Err(AdhkarError::UpstreamStatus {
            service: "prayer API",
            status: parsed.code,
        });
    }
    let data = parsed
        .data
        .ok_or_else(|| AdhkarError::decode("prayer times", "response has no data"))?;

    let mut pairs = Vec::with_capacity(5);
    for prayer in PrayerType::all() {
        let time = data.timings.get(prayer.display_name()).ok_or_else(|| {
            AdhkarError::decode("prayer times", format!("missing {}", prayer.display_name()))
        })?;
        pairs.push((prayer.display_name(), time.as_str()));
    }
    let times =
        PrayerTimes::from_pairs(pairs).map_err(|e| AdhkarError::decode("prayer times", e))?;

    Ok(DailyTimings {
        date,
        location: location.clone(),
        method,
        times,
        hijri: data.date.hijri.date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    const BODY: &str = r#"{
        "code": 200,
        "status": "OK",
        "data": {
            "timings": {
                "Fajr": "04:51",
                "Sunrise": "06:14",
                "Dhuhr": "11:58",
                "Asr": "15:07",
                "Sunset": "17:42",
                "Maghrib": "17:42",
                "Isha": "18:59 (EET)",
                "Imsak": "04:41",
                "Midnight": "23:58"
            },
            "date": {
                "readable": "19 Oct 2026",
                "hijri": { "date": "08-05-1448", "day": "08" }
            }
        }
    }"#;

    fn cairo() -> Location {
        Location::new("Egypt", "Cairo Governorate", "Cairo")
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn decodes_five_prayers_and_hijri() {
        let timings =
            decode_timings(BODY, &cairo(), CalculationMethod::Egyptian, day()).unwrap();
        assert_eq!(timings.times.entries().len(), 5);
        assert_eq!(
            timings.times.get(PrayerType::Isha),
            NaiveTime::from_hms_opt(18, 59, 0)
        );
        assert_eq!(timings.hijri, "08-05-1448");
        assert_eq!(timings.method, CalculationMethod::Egyptian);
    }

    #[test]
    fn missing_prayer_is_a_decode_error() {
        let body = BODY.replace("\"Asr\": \"15:07\",", "");
        let err =
            decode_timings(&body, &cairo(), CalculationMethod::Egyptian, day()).unwrap_err();
        assert!(matches!(err, AdhkarError::Decode { .. }));
    }

    #[test]
    fn api_error_code_is_reported() {
        let body = r#"{"code": 400, "status": "BAD_REQUEST", "data": null}"#;
        let err = decode_timings(body, &cairo(), CalculationMethod::Egyptian, day()).unwrap_err();
        assert!(matches!(err, AdhkarError::UpstreamStatus { status: 400, .. }));
    }

    #[tokio::test]
    async fn incomplete_location_never_hits_the_network() {
        let client = AladhanClient::new("http://127.0.0.1:9");
        let err = client
            .fetch_timings(
                &Location::new("Egypt", "", "Cairo"),
                CalculationMethod::Egyptian,
                day(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AdhkarError::IncompleteLocation));
    }
}
