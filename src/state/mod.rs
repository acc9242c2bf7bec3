pub mod device;
pub mod registry;
pub mod stats;

pub use device::{DeviceRecord, DeviceSnapshot};
pub use registry::DeviceRegistry;
pub use stats::{
    compute_average_upload_time, compute_uptime, compute_uptime_with, DeviceStats, UptimeFormula,
};
