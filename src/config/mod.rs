pub mod settings;

pub use settings::{AppConfig, api_key_from_env};
