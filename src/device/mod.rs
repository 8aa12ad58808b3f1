pub mod locator;
pub mod manager;
pub mod models;

pub use locator::{DeviceLocator, DEVICE_CHECK_INTERVAL_MS};
pub use manager::ConnectionManager;
pub use models::*;


#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not connected")]
    NotConnected,

    #[error("Serial communication error: {0}")]
    SerialError(#[from] crate::serial::SerialError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
