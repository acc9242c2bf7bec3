/// Errors raised by the device registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Device id '{device_id}' not found")]
    NotFound { device_id: String },
}

impl RegistryError {
    pub fn not_found(device_id: impl Into<String>) -> Self {
        Self::NotFound {
            device_id: device_id.into(),
        }
    }
}
