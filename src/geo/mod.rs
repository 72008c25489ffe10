pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AdhkarError, Result};

pub use client::{CscClient, ProxyGeoClient};

pub const DEFAULT_GEO_API: &str = "https://api.countrystatecity.in/v1";
pub const API_KEY_HEADER: &str = "X-CSCAPI-KEY";

/// A read-only source of geo JSON addressed by upstream path
/// (`/countries`, `/countries/EG/states`, ...).
#[async_trait]
pub trait GeoUpstream: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Value>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub iso2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub iso2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
}

/// Accept an ISO2-style code in any case and return it uppercased. Country
/// codes are two letters; some state codes are numeric or three characters.
pub fn normalize_iso(code: &str) -> Result<String> {
    let code = code.trim();
    if (1..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(AdhkarError::invalid("ISO2 code", code))
    }
}

pub fn countries_path() -> String {
    "/countries".to_string()
}

pub fn states_path(country_iso: &str) -> Result<String> {
    Ok(format!("/countries/{}/states", normalize_iso(country_iso)?))
}

pub fn cities_path(country_iso: &str, state_iso: &str) -> Result<String> {
    Ok(format!(
        "/countries/{}/states/{}/cities",
        normalize_iso(country_iso)?,
        normalize_iso(state_iso)?
    ))
}

pub fn decode_list<T: for<'de> Deserialize<'de>>(what: &'static str, value: Value) -> Result<Vec<T>> {
    serde_json::from_value(value).map_err(|e| AdhkarError::decode(what, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn iso_codes_are_uppercased() {
        assert_eq!(normalize_iso("eg").unwrap(), "EG");
        assert_eq!(
            cities_path("us", "ca").unwrap(),
            "/countries/US/states/CA/cities"
        );
    }

    #[test]
    fn iso_codes_must_be_short_and_alphanumeric() {
        assert_eq!(normalize_iso("nsw").unwrap(), "NSW");
        assert!(normalize_iso("EGYP").is_err());
        assert!(normalize_iso("").is_err());
        assert!(states_path("../").is_err());
    }

    #[test]
    fn extra_upstream_fields_are_ignored() {
        let raw = json!([
            { "id": 65, "name": "Egypt", "iso2": "EG", "iso3": "EGY", "emoji": "🇪🇬" }
        ]);
        let countries: Vec<Country> = decode_list("countries", raw).unwrap();
        assert_eq!(countries[0].name, "Egypt");
    }
}
