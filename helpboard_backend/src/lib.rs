pub mod api;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod error;
pub mod listings;
pub mod stats;
pub mod telemetry;
pub mod utils;
