//! Provider configuration, error taxonomy, and the parameter support matrix

pub mod config;
pub mod error;
pub mod health;
pub mod params;
pub mod request;
pub mod usage;
