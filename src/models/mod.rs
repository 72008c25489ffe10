pub mod dhikr;
pub mod location;
pub mod preferences;
pub mod prayer;

pub use dhikr::Dua;
pub use location::Location;
pub use preferences::{CalculationMethod, DisplayLanguage, ReminderInterval};
pub use prayer::{DailyTimings, PrayerTimes, PrayerType};
