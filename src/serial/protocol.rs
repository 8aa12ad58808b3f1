//! Decoder command protocol.
//!
//! Frames are TAB separated and always carry four fields. The first field
//! selects the frame kind:
//!
//! * `%` acknowledges the configure command.
//! * `@` reports a transponder crossing: `@ <ignored> <token> <seconds.millis>`.
//!
//! Everything else is line noise and is dropped.

/// Configures the decoder for 7-digit mode and restarts its race clock.
pub const CONFIGURE_COMMAND: &[u8] = b"\x01\x25\r\n";

pub const FIELD_SEPARATOR: char = '\t';
pub const ACK_MARKER: &str = "%";
pub const SCAN_MARKER: &str = "@";

const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderCommand {
    ConfigAck,
    Scan { token: String, timestamp_ms: u64 },
}

/// Parse one frame into a command, `None` when the frame is not understood.
pub fn parse_frame(frame: &str) -> Option<ReaderCommand> {
    let fields: Vec<&str> = frame.split(FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return None;
    }

    match fields[0] {
        ACK_MARKER => Some(ReaderCommand::ConfigAck),
        SCAN_MARKER => {
            let timestamp_ms = parse_timestamp(fields[3])?;
            Some(ReaderCommand::Scan {
                token: fields[2].to_string(),
                timestamp_ms,
            })
        }
        _ => None,
    }
}

/// Convert `<seconds>.<millis>` to milliseconds.
///
/// The fractional part is added as a plain integer, so `"1.5"` is 1005 ms
/// while `"1.500"` is 1500 ms. The decoder is expected to always send three
/// fractional digits.
pub fn parse_timestamp(value: &str) -> Option<u64> {
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() != 2 {
        return None;
    }

    let seconds: u64 = parts[0].parse().ok()?;
    let millis: u64 = parts[1].parse().ok()?;
    seconds.checked_mul(1000)?.checked_add(millis)
}
