//! In-memory stand-ins for hardware and collaborators.
//!
//! Exposed unconditionally so integration tests can drive a `LapReader`
//! without a decoder attached.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::lap::{Buzzer, LapEvent, LapEventSink};
use crate::serial::{LineSettings, Result, SerialBackend, SerialDeviceInfo, SerialError, SerialLink};

#[derive(Debug, Default)]
struct BackendState {
    ports: Vec<String>,
    fail_open: bool,
    open_count: usize,
    last_settings: Option<LineSettings>,
    incoming: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    read_error: bool,
    live_links: usize,
}

/// Scripted serial backend. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<BackendState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut BackendState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Make `port_name` (in)visible to enumeration.
    pub fn set_present(&self, port_name: &str, present: bool) {
        self.with(|s| {
            s.ports.retain(|p| p != port_name);
            if present {
                s.ports.push(port_name.to_string());
            }
        });
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.with(|s| s.fail_open = fail);
    }

    /// Queue bytes for the next read on an open link.
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.with(|s| s.incoming.push_back(bytes.to_vec()));
    }

    /// Make the next read fail with an I/O error.
    pub fn fail_next_read(&self) {
        self.with(|s| s.read_error = true);
    }

    /// Everything written so far; clears the record.
    pub fn take_written(&self) -> Vec<u8> {
        self.with(|s| std::mem::take(&mut s.written))
    }

    pub fn open_count(&self) -> usize {
        self.with(|s| s.open_count)
    }

    pub fn last_settings(&self) -> Option<LineSettings> {
        self.with(|s| s.last_settings)
    }

    /// Links opened and not yet dropped.
    pub fn live_links(&self) -> usize {
        self.with(|s| s.live_links)
    }
}

impl SerialBackend for ScriptedBackend {
    fn available_ports(&self) -> Result<Vec<SerialDeviceInfo>> {
        Ok(self.with(|s| s.ports.iter().map(SerialDeviceInfo::new).collect()))
    }

    fn open(&self, port_name: &str, settings: &LineSettings) -> Result<Box<dyn SerialLink>> {
        self.with(|s| {
            s.last_settings = Some(*settings);
            if s.fail_open {
                return Err(SerialError::ConnectionFailed(format!("{} busy", port_name)));
            }
            if !s.ports.iter().any(|p| p == port_name) {
                return Err(SerialError::PortNotFound(port_name.to_string()));
            }
            s.open_count += 1;
            s.live_links += 1;
            Ok(())
        })?;

        Ok(Box::new(ScriptedLink {
            backend: self.clone(),
            port_name: port_name.to_string(),
        }))
    }
}

struct ScriptedLink {
    backend: ScriptedBackend,
    port_name: String,
}

impl SerialLink for ScriptedLink {
    fn read_available(&mut self) -> Result<Vec<u8>> {
        self.backend.with(|s| {
            if std::mem::take(&mut s.read_error) {
                return Err(SerialError::IoError(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "device gone",
                )));
            }
            Ok(s.incoming.pop_front().unwrap_or_default())
        })
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.backend.with(|s| s.written.extend_from_slice(data));
        Ok(())
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        self.backend.with(|s| s.live_links -= 1);
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self { now: Rc::new(Cell::new(start_ms)) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub scanned: Vec<String>,
    pub laps: Vec<LapEvent>,
    pub buzzes: Vec<u64>,
}

/// Sink and buzzer that remember every call. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub record: Rc<RefCell<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn laps(&self) -> Vec<LapEvent> {
        self.record.borrow().laps.clone()
    }

    pub fn scanned(&self) -> Vec<String> {
        self.record.borrow().scanned.clone()
    }

    pub fn buzzes(&self) -> Vec<u64> {
        self.record.borrow().buzzes.clone()
    }
}

impl LapEventSink for RecordingSink {
    fn on_token_scanned(&mut self, token: &str) {
        self.record.borrow_mut().scanned.push(token.to_string());
    }

    fn on_lap_event(&mut self, token: &str, delta_ms: u64) {
        self.record.borrow_mut().laps.push(LapEvent {
            token: token.to_string(),
            delta_ms,
        });
    }
}

impl Buzzer for RecordingSink {
    fn activate(&mut self, duration_ms: u64) {
        self.record.borrow_mut().buzzes.push(duration_ms);
    }
}
