use serde::{Deserialize, Serialize};

use crate::error::AdhkarError;

/// A place named the way the geo lookup names it. These are display names,
/// not ISO codes, because the prayer-time API is queried by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub country: String,
    pub state: String,
    pub city: String,
}

impl Location {
    pub fn new(
        country: impl Into<String>,
        state: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into().trim().to_string(),
            state: state.into().trim().to_string(),
            city: city.into().trim().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.country.is_empty() && !self.state.is_empty() && !self.city.is_empty()
    }

    pub fn require_complete(&self) -> Result<&Self, AdhkarError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(AdhkarError::IncompleteLocation)
        }
    }

    /// Stable key used for the prayer-times cache table.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.country.to_lowercase(),
            self.state.to_lowercase(),
            self.city.to_lowercase()
        )
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.city, self.state, self.country)
    }
}
