//! Splits the raw sensor byte stream into command frames.
//!
//! The decoder separates frames with a single SOH byte (0x01). Line endings
//! carry no meaning on this link and are removed before framing, so a frame
//! may arrive spread over any number of reads.

/// Start-of-header byte that terminates every frame.
pub const FRAME_DELIMITER: u8 = 0x01;

const MAX_PENDING_BYTES: usize = 8192;
const TRIMMED_PENDING_BYTES: usize = 4096;

#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    trims: u64,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` (minus CR/LF) and dispatch every complete, non-empty
    /// frame in arrival order.
    ///
    /// Returns the number of frames dispatched.
    pub fn on_bytes_received<F>(&mut self, bytes: &[u8], mut dispatch: F) -> usize
    where
        F: FnMut(&str),
    {
        self.buffer
            .extend(bytes.iter().copied().filter(|b| *b != b'\r' && *b != b'\n'));

        let mut dispatched = 0;
        while let Some(pos) = self.buffer.iter().position(|b| *b == FRAME_DELIMITER) {
            if pos > 0 {
                let frame = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
                dispatch(&frame);
                dispatched += 1;
            }
            self.buffer.drain(..=pos);
        }

        if self.buffer.len() > MAX_PENDING_BYTES {
            let excess = self.buffer.len() - TRIMMED_PENDING_BYTES;
            self.buffer.drain(..excess);
            self.trims += 1;
            log::warn!("discarded {} undelimited bytes from serial buffer", excess);
        }

        dispatched
    }

    /// Convenience wrapper collecting the dispatched frames.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut frames = Vec::new();
        self.on_bytes_received(bytes, |frame| frames.push(frame.to_string()));
        frames
    }

    /// Bytes received but not yet terminated by a delimiter.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// How many times an oversized partial frame was trimmed.
    pub fn trims(&self) -> u64 {
        self.trims
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &[u8] = b"%\tA\tB\tC\x01@\t1\t42\t12.345\r\n\x01@\t1\t7\t3.1\x01tail";

    #[test]
    fn test_single_push_extracts_frames() {
        let mut assembler = FrameAssembler::new();
        let frames = assembler.push(STREAM);
        assert_eq!(frames, vec!["%\tA\tB\tC", "@\t1\t42\t12.345", "@\t1\t7\t3.1"]);
        assert_eq!(assembler.pending(), b"tail");
    }

    #[test]
    fn test_split_reads_yield_same_frames() {
        let expected = FrameAssembler::new().push(STREAM);

        for chunk_size in 1..STREAM.len() {
            let mut assembler = FrameAssembler::new();
            let mut frames = Vec::new();
            for chunk in STREAM.chunks(chunk_size) {
                frames.extend(assembler.push(chunk));
            }
            assert_eq!(frames, expected, "chunk size {}", chunk_size);
            assert_eq!(assembler.pending(), b"tail");
        }
    }

    #[test]
    fn test_empty_frames_are_dropped() {
        let mut assembler = FrameAssembler::new();
        let mut count = 0;
        let dispatched = assembler.on_bytes_received(b"\x01\x01a\x01\x01\x01b\x01", |_| count += 1);
        assert_eq!(dispatched, 2);
        assert_eq!(count, 2);
        assert!(assembler.pending().is_empty());
    }

    #[test]
    fn test_line_endings_are_stripped_inside_frames() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.push(b"a\r\nb\rc\n\x01"), vec!["abc"]);
    }

    #[test]
    fn test_crlf_only_frame_is_empty() {
        let mut assembler = FrameAssembler::new();
        assert!(assembler.push(b"\r\n\x01").is_empty());
    }

    #[test]
    fn test_oversized_partial_frame_is_trimmed() {
        let mut assembler = FrameAssembler::new();
        let noise = vec![b'x'; MAX_PENDING_BYTES + 1];
        assert!(assembler.push(&noise).is_empty());
        assert_eq!(assembler.pending().len(), TRIMMED_PENDING_BYTES);
        assert_eq!(assembler.trims(), 1);

        assert_eq!(assembler.push(b"\x01ok\x01"), vec!["x".repeat(TRIMMED_PENDING_BYTES), "ok".to_string()]);
    }
}
