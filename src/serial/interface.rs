use std::io::{Read, Write};
use std::time::Duration;
use serialport::{SerialPort, SerialPortType};

use super::{LineSettings, Result, SerialBackend, SerialDeviceInfo, SerialError, SerialLink};

const READ_TIMEOUT_MS: u64 = 50;

/// Live connection to a hardware serial port.
pub struct SerialInterface {
    port: Box<dyn SerialPort>,
    port_name: String,
}

impl SerialInterface {
    /// Open `port_name` with the given line parameters
    pub fn open(port_name: &str, settings: &LineSettings) -> Result<Self> {
        let port = serialport::new(port_name, settings.baud_rate)
            .data_bits(settings.data_bits)
            .stop_bits(settings.stop_bits)
            .parity(settings.parity)
            .flow_control(settings.flow_control)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()
            .map_err(|e| SerialError::ConnectionFailed(e.to_string()))?;

        log::info!("listening for data on {}", port_name);
        Ok(Self {
            port,
            port_name: port_name.to_string(),
        })
    }
}

impl SerialLink for SerialInterface {
    fn read_available(&mut self) -> Result<Vec<u8>> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; pending];
        match self.port.read(&mut buffer) {
            Ok(n) => {
                buffer.truncate(n);
                Ok(buffer)
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Drop for SerialInterface {
    fn drop(&mut self) {
        log::debug!("closing {}", self.port_name);
    }
}

/// Backend that talks to the operating system through `serialport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerialBackend;

impl SystemSerialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl SerialBackend for SystemSerialBackend {
    fn available_ports(&self) -> Result<Vec<SerialDeviceInfo>> {
        let ports = serialport::available_ports()?;
        let mut devices = Vec::with_capacity(ports.len());

        for port in ports {
            let mut device = SerialDeviceInfo::new(port.port_name);
            match port.port_type {
                SerialPortType::UsbPort(usb_info) => {
                    device.port_type = "usb".to_string();
                    device.vid = Some(usb_info.vid);
                    device.pid = Some(usb_info.pid);
                    device.serial_number = usb_info.serial_number;
                    device.manufacturer = usb_info.manufacturer;
                    device.product = usb_info.product;
                }
                SerialPortType::PciPort => device.port_type = "pci".to_string(),
                SerialPortType::BluetoothPort => device.port_type = "bluetooth".to_string(),
                _ => {}
            }
            devices.push(device);
        }

        Ok(devices)
    }

    fn open(&self, port_name: &str, settings: &LineSettings) -> Result<Box<dyn SerialLink>> {
        let interface = SerialInterface::open(port_name, settings)?;
        Ok(Box::new(interface))
    }
}
