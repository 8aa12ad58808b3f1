use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Receives scan and lap notifications from the reader.
pub trait LapEventSink {
    /// A token crossed the gate, whether or not it counts as a lap.
    fn on_token_scanned(&mut self, token: &str);

    /// A completed lap for `token`.
    fn on_lap_event(&mut self, token: &str, delta_ms: u64);
}

/// Audible feedback for accepted laps.
pub trait Buzzer {
    fn activate(&mut self, duration_ms: u64);
}

/// A completed lap as reported to the race station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapEvent {
    pub token: String,
    pub delta_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkRecord {
    TokenScanned {
        token: String,
        at: DateTime<Utc>,
    },
    Lap {
        #[serde(flatten)]
        lap: LapEvent,
        at: DateTime<Utc>,
    },
}

/// Writes one JSON object per notification, newline terminated.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, record: &SinkRecord) {
        let result = serde_json::to_writer(&mut self.out, record)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            log::warn!("failed to publish {:?}: {}", record, e);
        }
    }
}

impl<W: Write> LapEventSink for JsonLinesSink<W> {
    fn on_token_scanned(&mut self, token: &str) {
        self.emit(&SinkRecord::TokenScanned {
            token: token.to_string(),
            at: Utc::now(),
        });
    }

    fn on_lap_event(&mut self, token: &str, delta_ms: u64) {
        self.emit(&SinkRecord::Lap {
            lap: LapEvent {
                token: token.to_string(),
                delta_ms,
            },
            at: Utc::now(),
        });
    }
}

/// Buzzer stand-in that only records the request in the log.
#[derive(Debug, Default)]
pub struct LogBuzzer;

impl Buzzer for LogBuzzer {
    fn activate(&mut self, duration_ms: u64) {
        log::debug!("buzzer on for {} ms", duration_ms);
    }
}
