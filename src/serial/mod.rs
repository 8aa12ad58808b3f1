pub mod framing;
pub mod interface;
pub mod protocol;

pub use framing::FrameAssembler;
pub use interface::{SerialInterface, SystemSerialBackend};
pub use protocol::{parse_frame, ReaderCommand, CONFIGURE_COMMAND};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialDeviceInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl SerialDeviceInfo {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            port_type: "unknown".to_string(),
            vid: None,
            pid: None,
            serial_number: None,
            manufacturer: None,
            product: None,
        }
    }
}

/// Line parameters used when opening the sensor port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub stop_bits: serialport::StopBits,
    pub parity: serialport::Parity,
    pub flow_control: serialport::FlowControl,
}

impl Default for LineSettings {
    /// 9600 8N1, no flow control: the only mode the IR decoder speaks.
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: serialport::DataBits::Eight,
            stop_bits: serialport::StopBits::One,
            parity: serialport::Parity::None,
            flow_control: serialport::FlowControl::None,
        }
    }
}

/// An open, byte-oriented connection to the sensor.
pub trait SerialLink: Send {
    /// Read whatever is currently buffered by the driver without blocking.
    /// Returns an empty vector when nothing is pending.
    fn read_available(&mut self) -> Result<Vec<u8>>;

    /// Write raw bytes to the device.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    fn is_writable(&self) -> bool;

    fn port_name(&self) -> &str;
}

/// Enumerates and opens serial devices.
pub trait SerialBackend: Send + Sync {
    fn available_ports(&self) -> Result<Vec<SerialDeviceInfo>>;

    fn open(&self, port_name: &str, settings: &LineSettings) -> Result<Box<dyn SerialLink>>;
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Not connected")]
    NotConnected,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;
