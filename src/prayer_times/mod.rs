pub mod client;
pub mod resolver;

pub use client::{AladhanClient, PrayerSource};
pub use resolver::{NextPrayer, next_prayer};
