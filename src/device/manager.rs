use std::sync::Arc;

use crate::serial::{LineSettings, SerialBackend, SerialLink, CONFIGURE_COMMAND};
use super::{ConnectionState, DeviceError, PollAction, Result};

/// Owns the decoder connection and drives its state machine.
pub struct ConnectionManager {
    backend: Arc<dyn SerialBackend>,
    device_name: String,
    settings: LineSettings,
    link: Option<Box<dyn SerialLink>>,
    state: ConnectionState,
}

impl ConnectionManager {
    pub fn new(backend: Arc<dyn SerialBackend>, device_name: impl Into<String>) -> Self {
        Self {
            backend,
            device_name: device_name.into(),
            settings: LineSettings::default(),
            link: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_configured(&self) -> bool {
        self.state.is_configured()
    }

    /// Advance the state machine with the latest presence result.
    pub fn poll(&mut self, device_present: bool) -> PollAction {
        match (self.state, device_present) {
            (ConnectionState::Disconnected, true) => match self.open() {
                Ok(()) => PollAction::Opened,
                Err(e) => {
                    log::error!("device failed to open: {}", e);
                    PollAction::OpenFailed
                }
            },
            (ConnectionState::ConnectedUnconfigured, true) => {
                self.write(CONFIGURE_COMMAND);
                PollAction::ConfigureSent
            }
            (ConnectionState::ConnectedUnconfigured | ConnectionState::ConnectedConfigured, false) => {
                log::info!("device disconnected {}", self.device_name);
                self.close();
                PollAction::Closed
            }
            _ => PollAction::Idle,
        }
    }

    fn open(&mut self) -> Result<()> {
        log::debug!("opening device {}", self.device_name);
        self.set_state(ConnectionState::Opening);

        match self.backend.open(&self.device_name, &self.settings) {
            Ok(link) => {
                self.link = Some(link);
                self.set_state(ConnectionState::ConnectedUnconfigured);
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                Err(DeviceError::SerialError(e))
            }
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            log::debug!("{}: {:?} -> {:?}", self.device_name, self.state, next);
            self.state = next;
        }
    }

    /// Drop the port handle and forget the configured flag.
    pub fn close(&mut self) {
        self.link = None;
        self.set_state(ConnectionState::Disconnected);
    }

    /// One-shot transition on the decoder's configure acknowledgement.
    ///
    /// Returns true only when the state actually changed.
    pub fn mark_configured(&mut self) -> bool {
        if self.state == ConnectionState::ConnectedUnconfigured {
            log::debug!("serial device configured");
            self.set_state(ConnectionState::ConnectedConfigured);
            true
        } else {
            false
        }
    }

    /// Write raw bytes if the link can take them. Silently skipped otherwise.
    pub fn write(&mut self, data: &[u8]) -> bool {
        let Some(link) = self.link.as_mut() else {
            return false;
        };
        if !link.is_writable() {
            return false;
        }
        match link.write_all(data) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("write to {} failed: {}", self.device_name, e);
                false
            }
        }
    }

    /// Pull pending bytes from the open link.
    ///
    /// A hard read error is handled like the device disappearing.
    pub fn read_available(&mut self) -> Result<Vec<u8>> {
        let link = self.link.as_mut().ok_or(DeviceError::NotConnected)?;
        match link.read_available() {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                log::warn!("read from {} failed, closing: {}", self.device_name, e);
                self.close();
                Err(DeviceError::SerialError(e))
            }
        }
    }
}
