pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod models;
pub mod notify;
pub mod prayer_times;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod utils;
