use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use super::device::{DeviceRecord, DeviceSnapshot};
use super::stats::{DeviceStats, UptimeFormula};
use crate::error::RegistryError;

type SharedRecord = Arc<RwLock<DeviceRecord>>;

/// Thread-safe store of device records, keyed by device id.
///
/// Locking is per device: the outer lock only guards the map itself and is
/// held just long enough to clone a record handle. Each record has its own
/// reader-writer lock, so ingestion for different devices never contends,
/// while writes to one device exclude all other access to that device.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, SharedRecord>>,
    uptime_formula: UptimeFormula,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uptime_formula(uptime_formula: UptimeFormula) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            uptime_formula,
        }
    }

    /// Build a registry populated with empty records for every id
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for id in ids {
            registry.register(id);
        }
        registry
    }

    pub fn uptime_formula(&self) -> UptimeFormula {
        self.uptime_formula
    }

    /// Insert a fresh record with empty histories.
    ///
    /// Last write wins: an existing record under the same id is replaced.
    /// Returns `true` when a previous record was replaced.
    pub fn register(&self, device_id: impl Into<String>) -> bool {
        let device_id = device_id.into();
        let record = Arc::new(RwLock::new(DeviceRecord::new(device_id.clone())));
        self.devices.write().insert(device_id, record).is_some()
    }

    /// Append a heartbeat timestamp to the device's history
    pub fn ingest_heartbeat(
        &self,
        device_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let record = self.record(device_id)?;
        let count = {
            let mut record = record.write();
            record.record_heartbeat(sent_at);
            record.heartbeat_count()
        };
        debug!(device_id, %sent_at, count, "Heartbeat recorded");
        Ok(())
    }

    /// Append an upload duration (nanoseconds) to the device's history
    pub fn ingest_upload_sample(
        &self,
        device_id: &str,
        duration_ns: i64,
    ) -> Result<(), RegistryError> {
        let record = self.record(device_id)?;
        let count = {
            let mut record = record.write();
            record.record_upload_sample(duration_ns);
            record.upload_sample_count()
        };
        debug!(device_id, duration_ns, count, "Upload sample recorded");
        Ok(())
    }

    /// Consistent copy of a device's histories, taken under its read lock
    pub fn get_snapshot(&self, device_id: &str) -> Result<DeviceSnapshot, RegistryError> {
        let record = self.record(device_id)?;
        let snapshot = record.read().snapshot();
        Ok(snapshot)
    }

    /// Uptime and average upload time computed from a fresh snapshot
    pub fn compute_stats(&self, device_id: &str) -> Result<DeviceStats, RegistryError> {
        let snapshot = self.get_snapshot(device_id)?;
        Ok(snapshot.stats(self.uptime_formula))
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.read().contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Registered device ids, sorted
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn record(&self, device_id: &str) -> Result<SharedRecord, RegistryError> {
        self.devices
            .read()
            .get(device_id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(device_id))
    }
}
