use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AdhkarError;

/// How often a reminder phrase is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReminderInterval {
    #[default]
    Seconds30,
    Minutes1,
    Minutes2,
    Minutes3,
    Minutes5,
    Minutes10,
}

impl ReminderInterval {
    pub fn all() -> [ReminderInterval; 6] {
        [
            ReminderInterval::Seconds30,
            ReminderInterval::Minutes1,
            ReminderInterval::Minutes2,
            ReminderInterval::Minutes3,
            ReminderInterval::Minutes5,
            ReminderInterval::Minutes10,
        ]
    }

    pub fn as_millis(&self) -> u64 {
        match self {
            ReminderInterval::Seconds30 => 30_000,
            ReminderInterval::Minutes1 => 60_000,
            ReminderInterval::Minutes2 => 120_000,
            ReminderInterval::Minutes3 => 180_000,
            ReminderInterval::Minutes5 => 300_000,
            ReminderInterval::Minutes10 => 600_000,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderInterval::Seconds30 => "30s",
            ReminderInterval::Minutes1 => "1m",
            ReminderInterval::Minutes2 => "2m",
            ReminderInterval::Minutes3 => "3m",
            ReminderInterval::Minutes5 => "5m",
            ReminderInterval::Minutes10 => "10m",
        }
    }

    pub fn from_millis(ms: u64) -> Option<Self> {
        Self::all().into_iter().find(|i| i.as_millis() == ms)
    }
}

impl FromStr for ReminderInterval {
    type Err = AdhkarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Some(found) = Self::all().into_iter().find(|i| i.as_str() == s) {
            return Ok(found);
        }
        s.parse::<u64>()
            .ok()
            .and_then(Self::from_millis)
            .ok_or_else(|| AdhkarError::invalid("reminder interval", s))
    }
}

/// Astronomical convention the prayer API uses, by its numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CalculationMethod {
    Karachi,
    #[default]
    NorthAmerica,
    MuslimWorldLeague,
    UmmAlQura,
    Egyptian,
    Tehran,
    Gulf,
    Kuwait,
    Qatar,
    Singapore,
    France,
    Turkey,
    Russia,
}

impl CalculationMethod {
    pub fn all() -> [CalculationMethod; 13] {
        [
            CalculationMethod::Karachi,
            CalculationMethod::NorthAmerica,
            CalculationMethod::MuslimWorldLeague,
            CalculationMethod::UmmAlQura,
            CalculationMethod::Egyptian,
            CalculationMethod::Tehran,
            CalculationMethod::Gulf,
            CalculationMethod::Kuwait,
            CalculationMethod::Qatar,
            CalculationMethod::Singapore,
            CalculationMethod::France,
            CalculationMethod::Turkey,
            CalculationMethod::Russia,
        ]
    }

    pub fn id(&self) -> u8 {
        match self {
            CalculationMethod::Karachi => 1,
            CalculationMethod::NorthAmerica => 2,
            CalculationMethod::MuslimWorldLeague => 3,
            CalculationMethod::UmmAlQura => 4,
            CalculationMethod::Egyptian => 5,
            CalculationMethod::Tehran => 7,
            CalculationMethod::Gulf => 8,
            CalculationMethod::Kuwait => 9,
            CalculationMethod::Qatar => 10,
            CalculationMethod::Singapore => 11,
            CalculationMethod::France => 12,
            CalculationMethod::Turkey => 13,
            CalculationMethod::Russia => 14,
        }
    }

    pub fn authority(&self) -> &'static str {
        match self {
            CalculationMethod::Karachi => "University of Islamic Sciences, Karachi",
            CalculationMethod::NorthAmerica => "Islamic Society of North America",
            CalculationMethod::MuslimWorldLeague => "Muslim World League",
            CalculationMethod::UmmAlQura => "Umm Al-Qura University, Makkah",
            CalculationMethod::Egyptian => "Egyptian General Authority of Survey",
            CalculationMethod::Tehran => "Institute of Geophysics, University of Tehran",
            CalculationMethod::Gulf => "Gulf Region",
            CalculationMethod::Kuwait => "Kuwait",
            CalculationMethod::Qatar => "Qatar",
            CalculationMethod::Singapore => "Majlis Ugama Islam Singapura, Singapore",
            CalculationMethod::France => "Union Organization Islamic de France",
            CalculationMethod::Turkey => "Diyanet İşleri Başkanlığı, Turkey",
            CalculationMethod::Russia => "Spiritual Administration of Muslims of Russia",
        }
    }
}

impl TryFrom<u8> for CalculationMethod {
    type Error = AdhkarError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::all()
            .into_iter()
            .find(|m| m.id() == id)
            .ok_or_else(|| AdhkarError::invalid("calculation method", id.to_string()))
    }
}

impl From<CalculationMethod> for u8 {
    fn from(method: CalculationMethod) -> Self {
        method.id()
    }
}

impl FromStr for CalculationMethod {
    type Err = AdhkarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u8 = s
            .trim()
            .parse()
            .map_err(|_| AdhkarError::invalid("calculation method", s))?;
        CalculationMethod::try_from(id)
    }
}

impl std::fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id(), self.authority())
    }
}

/// Which field of a dua is shown in reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLanguage {
    #[default]
    Arabic,
    Transliteration,
    Translation,
}

impl DisplayLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayLanguage::Arabic => "arabic",
            DisplayLanguage::Transliteration => "transliteration",
            DisplayLanguage::Translation => "translation",
        }
    }
}

impl FromStr for DisplayLanguage {
    type Err = AdhkarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arabic" | "ar" => Ok(DisplayLanguage::Arabic),
            "transliteration" | "latin" => Ok(DisplayLanguage::Transliteration),
            "translation" | "english" | "en" => Ok(DisplayLanguage::Translation),
            _ => Err(AdhkarError::invalid("display language", s)),
        }
    }
}
