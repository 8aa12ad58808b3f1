use std::sync::Arc;

use crate::serial::SerialBackend;

/// Minimum time between two device enumerations.
pub const DEVICE_CHECK_INTERVAL_MS: u64 = 1000;

/// Rate-limited presence check for the configured serial device.
pub struct DeviceLocator {
    backend: Arc<dyn SerialBackend>,
    last_check_ms: Option<u64>,
}

impl DeviceLocator {
    pub fn new(backend: Arc<dyn SerialBackend>) -> Self {
        Self {
            backend,
            last_check_ms: None,
        }
    }

    /// Whether `configured_name` is among the visible ports right now.
    pub fn device_is_present(&self, configured_name: &str) -> bool {
        match self.backend.available_ports() {
            Ok(ports) => ports.iter().any(|p| p.port_name == configured_name),
            Err(e) => {
                log::warn!("serial port enumeration failed: {}", e);
                false
            }
        }
    }

    /// Run a presence check if the interval has elapsed.
    ///
    /// Returns `None` when the check was skipped.
    pub fn poll(&mut self, now_ms: u64, configured_name: &str) -> Option<bool> {
        if let Some(last) = self.last_check_ms {
            if now_ms.saturating_sub(last) <= DEVICE_CHECK_INTERVAL_MS {
                return None;
            }
        }
        self.last_check_ms = Some(now_ms);
        Some(self.device_is_present(configured_name))
    }
}
