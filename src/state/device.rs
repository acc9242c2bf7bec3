use chrono::{DateTime, Utc};

use super::stats::{DeviceStats, UptimeFormula};

/// Telemetry history for a single registered device.
///
/// Both histories are append-only and kept in arrival order. Mutation is
/// crate-private so it can only happen through [`super::DeviceRegistry`].
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    device_id: String,
    heartbeats: Vec<DateTime<Utc>>,
    upload_samples: Vec<i64>,
}

impl DeviceRecord {
    pub fn new(device_id: String) -> Self {
        Self {
            device_id,
            heartbeats: Vec::new(),
            upload_samples: Vec::new(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn heartbeat_count(&self) -> usize {
        self.heartbeats.len()
    }

    pub fn upload_sample_count(&self) -> usize {
        self.upload_samples.len()
    }

    pub(crate) fn record_heartbeat(&mut self, sent_at: DateTime<Utc>) {
        self.heartbeats.push(sent_at);
    }

    pub(crate) fn record_upload_sample(&mut self, duration_ns: i64) {
        self.upload_samples.push(duration_ns);
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            device_id: self.device_id.clone(),
            heartbeats: self.heartbeats.clone(),
            upload_samples: self.upload_samples.clone(),
        }
    }
}

/// Point-in-time, read-only view of a device's histories
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub device_id: String,
    pub heartbeats: Vec<DateTime<Utc>>,
    pub upload_samples: Vec<i64>,
}

impl DeviceSnapshot {
    pub fn stats(&self, formula: UptimeFormula) -> DeviceStats {
        DeviceStats::compute(formula, &self.heartbeats, &self.upload_samples)
    }
}
