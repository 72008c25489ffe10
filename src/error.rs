use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdhkarError {
    #[error("network error calling {service}: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} responded with status {status}")]
    UpstreamStatus { service: &'static str, status: u16 },

    #[error("could not decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("location is incomplete: country, state and city are all required")]
    IncompleteLocation,

    #[error("API_KEY is not set; the geo proxy cannot start without it")]
    MissingApiKey,

    #[error("invalid {setting}: '{value}'")]
    InvalidSetting { setting: &'static str, value: String },
}

impl AdhkarError {
    pub fn network(service: &'static str, source: reqwest::Error) -> Self {
        AdhkarError::Network { service, source }
    }

    pub fn decode(what: &'static str, reason: impl ToString) -> Self {
        AdhkarError::Decode {
            what,
            reason: reason.to_string(),
        }
    }

    pub fn invalid(setting: &'static str, value: impl Into<String>) -> Self {
        AdhkarError::InvalidSetting {
            setting,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdhkarError>;
