//! The serial lap reader: ties device discovery, the connection state
//! machine, framing and token debounce together.
//!
//! Everything runs on the caller's thread. `tick()` is expected to be called
//! frequently by the scheduler; device enumeration inside it is rate limited
//! on its own.

use std::sync::Arc;

use crate::clock::Clock;
use crate::device::{ConnectionManager, ConnectionState, DeviceLocator, PollAction, ReaderStats};
use crate::lap::{Buzzer, LapDebouncer, LapEventSink, ScanOutcome};
use crate::serial::{parse_frame, FrameAssembler, ReaderCommand, SerialBackend, CONFIGURE_COMMAND};

pub struct LapReader {
    locator: DeviceLocator,
    connection: ConnectionManager,
    assembler: FrameAssembler,
    debouncer: LapDebouncer,
    clock: Box<dyn Clock>,
    stats: ReaderStats,
    debug: bool,
}

impl LapReader {
    pub fn new(
        backend: Arc<dyn SerialBackend>,
        device_name: impl Into<String>,
        clock: Box<dyn Clock>,
        sink: Box<dyn LapEventSink>,
        buzzer: Box<dyn Buzzer>,
    ) -> Self {
        let device_name = device_name.into();
        log::info!("using device {}", device_name);
        Self {
            locator: DeviceLocator::new(backend.clone()),
            connection: ConnectionManager::new(backend, device_name),
            assembler: FrameAssembler::new(),
            debouncer: LapDebouncer::new(sink, buzzer),
            clock,
            stats: ReaderStats::default(),
            debug: false,
        }
    }

    /// Enables hex dumps of every read. Behaviour is otherwise unchanged.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn stats(&self) -> ReaderStats {
        let mut stats = self.stats.clone();
        stats.buffer_trims = self.assembler.trims();
        stats
    }

    pub fn last_seen(&self, token: &str) -> Option<u64> {
        self.debouncer.last_seen(token)
    }

    /// One scheduler step: device check (rate limited), then drain input.
    pub fn tick(&mut self) {
        self.poll_device();
        self.service_reads();
    }

    /// Locator and connection manager step. Returns what the manager did,
    /// or `None` when the locator interval has not elapsed.
    pub fn poll_device(&mut self) -> Option<PollAction> {
        let now = self.clock.now_ms();
        let present = self.locator.poll(now, self.connection.device_name())?;

        let action = self.connection.poll(present);
        match action {
            PollAction::Opened => self.reset(),
            PollAction::OpenFailed => self.stats.open_failures += 1,
            PollAction::Closed => self.assembler.clear(),
            PollAction::ConfigureSent | PollAction::Idle => {}
        }
        Some(action)
    }

    /// Drain whatever the device has buffered and process complete frames.
    pub fn service_reads(&mut self) {
        if !self.connection.state().is_connected() {
            return;
        }

        let bytes = match self.connection.read_available() {
            Ok(bytes) => bytes,
            Err(_) => {
                self.assembler.clear();
                return;
            }
        };
        if !bytes.is_empty() {
            self.on_bytes_received(&bytes);
        }
    }

    /// Feed raw device bytes through framing and frame handling.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) {
        self.stats.bytes_read += bytes.len() as u64;
        log::debug!("bytes read: {}", bytes.len());
        if self.debug {
            log::debug!("bytes: {}", hex::encode(bytes));
        }

        let mut frames = Vec::new();
        self.assembler
            .on_bytes_received(bytes, |frame| frames.push(frame.to_string()));

        for frame in frames {
            self.stats.frames_dispatched += 1;
            self.process_frame(&frame);
        }
    }

    fn process_frame(&mut self, frame: &str) {
        match parse_frame(frame) {
            Some(ReaderCommand::ConfigAck) => {
                if self.connection.mark_configured() {
                    self.debouncer.clear();
                }
            }
            Some(ReaderCommand::Scan { token, timestamp_ms }) => {
                if !self.connection.is_configured() {
                    self.stats.frames_ignored += 1;
                    return;
                }
                self.stats.scans += 1;
                match self.debouncer.record_scan(&token, timestamp_ms) {
                    ScanOutcome::Lap { .. } => self.stats.laps += 1,
                    ScanOutcome::Bounce => self.stats.bounces += 1,
                    ScanOutcome::FirstScan => {}
                }
            }
            None => {
                self.stats.frames_ignored += 1;
                log::trace!("ignored frame {:?}", frame);
            }
        }
    }

    /// Write raw bytes to the device; skipped when not writable.
    pub fn write(&mut self, data: &[u8]) -> bool {
        self.connection.write(data)
    }

    /// Start a new race: forget every token and restart the decoder clock.
    pub fn reset(&mut self) {
        self.debouncer.clear();
        self.write(CONFIGURE_COMMAND);
        log::info!("lap reader reset");
    }

    /// Release the port immediately.
    pub fn close(&mut self) {
        self.connection.close();
        self.assembler.clear();
    }
}
