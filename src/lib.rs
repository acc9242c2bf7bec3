//! Fleet monitor: heartbeat and upload-time telemetry for registered devices.
//!
//! The [`state::DeviceRegistry`] holds per-device histories behind per-device
//! locks; [`state::stats`] turns a snapshot of those histories into uptime and
//! average upload time. [`api`] exposes both over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod manifest;
pub mod state;

pub use config::Config;
pub use error::RegistryError;
pub use state::{DeviceRegistry, DeviceSnapshot, DeviceStats};
