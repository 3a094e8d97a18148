//! # Framed Chunked Writer
//!
//! Serial-over-Bluetooth receivers in label printers have small input
//! buffers; writes must stay below a hard ceiling or the firmware drops
//! bytes. This module splits an outbound buffer into delimiter-bounded
//! frames (so each directive stays atomic at the application level) and
//! writes each frame in chunks no larger than [`CHUNK_SIZE`].
//!
//! ## Framing
//!
//! A frame is a run of bytes ending with the line delimiter; the delimiter
//! is the last byte of its frame. A trailing run with no delimiter forms a
//! final frame of its own.
//!
//! ```text
//! "CLS\nPRINT 1,1\n"  ->  ["CLS\n", "PRINT 1,1\n"]
//! "CLS\nPRI"          ->  ["CLS\n", "PRI"]
//! ```
//!
//! ## Failure
//!
//! The first chunk error aborts the whole operation. Bytes already handed
//! to the channel are not retracted; the receiver may be left with a
//! partial directive. Callers treat this as a hard job failure.

use tracing::{debug, trace};

use crate::error::EtiquetaError;
use crate::protocol::commands::DELIMITER;
use crate::transport::Channel;

/// Hard ceiling on a single physical write, in bytes
pub const CHUNK_SIZE: usize = 200;

/// Write the entire buffer in one call and flush immediately.
///
/// Used when the buffer is already protocol-correct as a single unit and
/// latency matters more than bounded write sizes — notably for job types
/// that interleave binary payloads, which must not be frame-split.
pub fn write_whole(channel: &mut dyn Channel, data: &[u8]) -> Result<(), EtiquetaError> {
    debug!(size = data.len(), "writing whole buffer");
    trace!("\n{}", hex_ascii(data));

    channel.write_all(data)?;
    channel.flush()?;
    Ok(())
}

/// Write the buffer as delimiter-bounded frames in bounded chunks.
///
/// Frames are written strictly in order with no interleaving; within a
/// frame, chunks never exceed [`CHUNK_SIZE`] bytes.
pub fn write_framed(channel: &mut dyn Channel, data: &[u8]) -> Result<(), EtiquetaError> {
    debug!(size = data.len(), "writing framed buffer");

    for frame in split_frames(data) {
        for chunk in frame.chunks(CHUNK_SIZE) {
            trace!(chunk_size = chunk.len(), "\n{}", hex_ascii(chunk));
            channel.write_all(chunk)?;
        }
        debug!(frame_size = frame.len(), "frame written");
    }

    Ok(())
}

/// Split a buffer at every delimiter byte, keeping the delimiter as the
/// last byte of its frame.
fn split_frames(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split_inclusive(|&b| b == DELIMITER)
}

/// Format bytes as a hex + ASCII dump, 16 bytes per line.
///
/// Mirrors the classic hexdump layout so transmitted directives can be
/// read straight out of trace logs.
pub fn hex_ascii(data: &[u8]) -> String {
    let mut out = String::new();
    for (i, row) in data.chunks(16).enumerate() {
        let hex: Vec<String> = row.iter().map(|b| format!("{:02X}", b)).collect();
        let ascii: String = row
            .iter()
            .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:04X}  {:<48}  {}\n", i * 16, hex.join(" "), ascii));
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// In-memory channel recording write boundaries.
    struct RecordingChannel {
        writes: Vec<Vec<u8>>,
        flushes: usize,
        fail_after: Option<usize>,
    }

    impl RecordingChannel {
        fn new() -> Self {
            Self {
                writes: Vec::new(),
                flushes: 0,
                fail_after: None,
            }
        }

        fn failing_after(writes: usize) -> Self {
            Self {
                fail_after: Some(writes),
                ..Self::new()
            }
        }

        fn transmitted(&self) -> Vec<u8> {
            self.writes.concat()
        }
    }

    impl Channel for RecordingChannel {
        fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            if let Some(limit) = self.fail_after {
                if self.writes.len() >= limit {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
                }
            }
            self.writes.push(data.to_vec());
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_split_frames_keeps_delimiters() {
        let data = b"CLS\nPRINT 1,1\n";
        let frames: Vec<&[u8]> = split_frames(data).collect();
        assert_eq!(frames, vec![&b"CLS\n"[..], &b"PRINT 1,1\n"[..]]);
    }

    #[test]
    fn test_split_frames_trailing_remainder() {
        let data = b"CLS\nPRI";
        let frames: Vec<&[u8]> = split_frames(data).collect();
        assert_eq!(frames, vec![&b"CLS\n"[..], &b"PRI"[..]]);
    }

    #[test]
    fn test_split_frames_no_delimiter() {
        let data = b"no newline here";
        let frames: Vec<&[u8]> = split_frames(data).collect();
        assert_eq!(frames, vec![&data[..]]);
    }

    #[test]
    fn test_write_whole_single_write_and_flush() {
        let mut channel = RecordingChannel::new();
        write_whole(&mut channel, b"SIZE 72 mm,10 mm\nCLS\n").unwrap();
        assert_eq!(channel.writes.len(), 1);
        assert_eq!(channel.flushes, 1);
    }

    #[test]
    fn test_framed_chunk_count_without_delimiters() {
        // ceil(len / 200) chunks for a delimiter-free buffer
        for len in [1, 199, 200, 201, 399, 400, 401, 1000] {
            let data = vec![0x41u8; len];
            let mut channel = RecordingChannel::new();
            write_framed(&mut channel, &data).unwrap();
            assert_eq!(channel.writes.len(), len.div_ceil(200), "len={}", len);
            assert_eq!(channel.transmitted(), data);
        }
    }

    #[test]
    fn test_framed_chunks_never_exceed_ceiling() {
        let mut data = vec![0x42u8; 450];
        data.push(b'\n');
        data.extend(vec![0x43u8; 250]);

        let mut channel = RecordingChannel::new();
        write_framed(&mut channel, &data).unwrap();

        for write in &channel.writes {
            assert!(write.len() <= CHUNK_SIZE);
        }
        assert_eq!(channel.transmitted(), data);
    }

    #[test]
    fn test_framed_boundaries_fall_on_delimiters() {
        let data = b"SPEED 4\nDENSITY 12\nCLS\n";
        let mut channel = RecordingChannel::new();
        write_framed(&mut channel, data).unwrap();

        // Each directive is short, so each frame is exactly one write
        assert_eq!(
            channel.writes,
            vec![
                b"SPEED 4\n".to_vec(),
                b"DENSITY 12\n".to_vec(),
                b"CLS\n".to_vec()
            ]
        );
    }

    #[test]
    fn test_framed_aborts_on_chunk_failure() {
        let data = vec![0x44u8; 500]; // 3 chunks
        let mut channel = RecordingChannel::failing_after(2);

        let err = write_framed(&mut channel, &data).unwrap_err();
        assert!(matches!(err, EtiquetaError::IoFailure(_)));
        // The two chunks already sent stay sent
        assert_eq!(channel.transmitted().len(), 400);
    }

    #[test]
    fn test_framed_does_not_flush() {
        // Flushing is the disconnect path's job; the chunked writer only
        // hands frames to the channel
        let mut channel = RecordingChannel::new();
        write_framed(&mut channel, b"CLS\nPRINT 1,1\n").unwrap();
        assert_eq!(channel.flushes, 0);
    }

    #[test]
    fn test_framed_empty_buffer_is_noop() {
        let mut channel = RecordingChannel::new();
        write_framed(&mut channel, b"").unwrap();
        assert!(channel.writes.is_empty());
    }

    #[test]
    fn test_hex_ascii_layout() {
        let dump = hex_ascii(b"CLS\n");
        assert!(dump.starts_with("0000  43 4C 53 0A"));
        assert!(dump.trim_end().ends_with("CLS."));
    }
}
