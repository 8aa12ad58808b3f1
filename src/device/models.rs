use serde::{Deserialize, Serialize};

/// Lifecycle of the decoder connection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Opening,
    ConnectedUnconfigured,
    ConnectedConfigured,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectionState::ConnectedUnconfigured | ConnectionState::ConnectedConfigured
        )
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, ConnectionState::ConnectedConfigured)
    }
}

/// Result of one connection manager step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    Idle,
    Opened,
    OpenFailed,
    ConfigureSent,
    Closed,
}

/// Running totals kept by the reader
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReaderStats {
    pub bytes_read: u64,
    pub frames_dispatched: u64,
    pub frames_ignored: u64,
    pub scans: u64,
    pub laps: u64,
    pub bounces: u64,
    pub buffer_trims: u64,
    pub open_failures: u64,
}
