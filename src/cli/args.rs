use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "vsadhkar",
    version,
    author,
    about = "Dhikr reminders and prayer times for your terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reminder companion until Ctrl+C (default)
    Run,
    /// Start the caching geo lookup proxy (needs API_KEY)
    Serve {
        /// Port to listen on, overriding config.toml
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Show one random dhikr
    Dhikr,
    /// Show today's prayer times and the next prayer
    Times,
    /// Save your location and fetch today's prayer times
    Location {
        country: String,
        state: String,
        city: String,
    },
    /// Browse countries, states and cities through the geo proxy
    Geo {
        #[command(subcommand)]
        action: GeoCommands,
    },
    /// Show the saved settings
    Settings,
    /// Set how often a dhikr reminder appears (30s, 1m, 2m, 3m, 5m, 10m)
    Interval { interval: String },
    /// Set the prayer time calculation method (1-14, 6 is unused)
    Method { method: String },
    /// Minutes before each prayer to notify, 0 disables
    Notify { minutes: String },
    /// Reminder language: arabic, transliteration or translation
    Language { language: String },
}

#[derive(Subcommand, Debug)]
pub enum GeoCommands {
    /// List all countries
    Countries,
    /// List the states of a country
    States {
        /// Country ISO2 code, e.g. EG
        country: String,
    },
    /// List the cities of a state
    Cities {
        /// Country ISO2 code
        country: String,
        /// State ISO2 code
        state: String,
    },
}

impl Commands {
    /// Message name and arguments for commands that go through session
    /// dispatch; `None` for the ones handled directly.
    pub fn as_message(&self) -> Option<(&'static str, Vec<&str>)> {
        match self {
            Commands::Dhikr => Some(("getDhikr", vec![])),
            Commands::Times => Some(("showTimes", vec![])),
            Commands::Location {
                country,
                state,
                city,
            } => Some(("setLocation", vec![country.as_str(), state.as_str(), city.as_str()])),
            Commands::Interval { interval } => Some(("setInterval", vec![interval.as_str()])),
            Commands::Method { method } => Some(("setMethod", vec![method.as_str()])),
            Commands::Notify { minutes } => Some(("setNotificationLead", vec![minutes.as_str()])),
            Commands::Language { language } => Some(("setLanguage", vec![language.as_str()])),
            Commands::Run | Commands::Serve { .. } | Commands::Geo { .. } | Commands::Settings => {
                None
            }
        }
    }
}
