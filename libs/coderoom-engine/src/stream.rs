//! Codec for the Docker multiplexed log stream.
//!
//! With `Tty` off, the daemon interleaves stdout and stderr as self-describing
//! frames rather than plain text. Each frame is an 8-byte header followed by a
//! payload:
//!
//! ```text
//! byte 0      stream selector (1 = stdout, 2 = stderr)
//! bytes 1-3   reserved
//! bytes 4-7   payload length, big-endian u32
//! bytes 8..   payload (UTF-8 text)
//! ```
//!
//! [`demux`] splits a complete buffer back into the two streams; [`frame`]
//! produces the same wire format, which is how runtime implementations and
//! test doubles hand output across the [`SandboxRuntime`] boundary.
//!
//! [`SandboxRuntime`]: crate::runtime::SandboxRuntime

use thiserror::Error;

use crate::types::ExecutionResult;

/// Stream selector for standard output.
pub const STDOUT_FRAME: u8 = 1;
/// Stream selector for standard error.
pub const STDERR_FRAME: u8 = 2;

const HEADER_LEN: usize = 8;

/// The buffer ended mid-frame. Capture is synchronous and post-completion, so
/// a well-behaved runtime never produces this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated frame header at offset {offset}")]
    TruncatedHeader { offset: usize },

    #[error("frame at offset {offset} declares {declared} payload bytes but only {remaining} remain")]
    TruncatedPayload {
        offset: usize,
        declared: usize,
        remaining: usize,
    },
}

/// Decode a complete multiplexed buffer into separate stdout and stderr text.
///
/// Frames are consumed sequentially from offset 0 until the buffer is
/// exhausted. Payloads are appended to the stream named by the selector byte,
/// in frame order; frames with an unknown selector are dropped without error.
/// Payload bytes are decoded as UTF-8, lossily.
pub fn demux(raw: &[u8]) -> Result<ExecutionResult, DecodeError> {
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut offset = 0;

    while offset < raw.len() {
        if raw.len() - offset < HEADER_LEN {
            return Err(DecodeError::TruncatedHeader { offset });
        }

        let selector = raw[offset];
        let declared = u32::from_be_bytes([
            raw[offset + 4],
            raw[offset + 5],
            raw[offset + 6],
            raw[offset + 7],
        ]) as usize;
        offset += HEADER_LEN;

        let remaining = raw.len() - offset;
        if declared > remaining {
            return Err(DecodeError::TruncatedPayload {
                offset: offset - HEADER_LEN,
                declared,
                remaining,
            });
        }

        let payload = &raw[offset..offset + declared];
        match selector {
            STDOUT_FRAME => stdout.push_str(&String::from_utf8_lossy(payload)),
            STDERR_FRAME => stderr.push_str(&String::from_utf8_lossy(payload)),
            _ => {}
        }
        offset += declared;
    }

    Ok(ExecutionResult { stdout, stderr })
}

/// Encode one payload as a multiplexed frame for the given stream selector.
pub fn frame(selector: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(selector);
    buf.extend_from_slice(&[0, 0, 0]);
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let buf = frame(STDOUT_FRAME, b"hi");
        assert_eq!(buf, vec![1, 0, 0, 0, 0, 0, 0, 2, b'h', b'i']);
    }

    #[test]
    fn empty_buffer_decodes_to_empty_streams() {
        let result = demux(&[]).unwrap();
        assert_eq!(result, ExecutionResult::default());
    }

    #[test]
    fn single_stdout_frame() {
        let buf = frame(STDOUT_FRAME, b"15\n");
        let result = demux(&buf).unwrap();
        assert_eq!(result.stdout, "15\n");
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn interleaved_frames_keep_order_per_stream() {
        let mut buf = frame(STDOUT_FRAME, b"out-1 ");
        buf.extend(frame(STDERR_FRAME, b"err-1 "));
        buf.extend(frame(STDOUT_FRAME, b"out-2"));
        buf.extend(frame(STDERR_FRAME, b"err-2"));

        let result = demux(&buf).unwrap();
        assert_eq!(result.stdout, "out-1 out-2");
        assert_eq!(result.stderr, "err-1 err-2");
    }

    #[test]
    fn unknown_selector_is_dropped_not_fatal() {
        let mut buf = frame(0, b"ignored");
        buf.extend(frame(STDOUT_FRAME, b"kept"));
        buf.extend(frame(7, b"also ignored"));

        let result = demux(&buf).unwrap();
        assert_eq!(result.stdout, "kept");
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn zero_length_payload_is_valid() {
        let mut buf = frame(STDERR_FRAME, b"");
        buf.extend(frame(STDOUT_FRAME, b"x"));

        let result = demux(&buf).unwrap();
        assert_eq!(result.stdout, "x");
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn multibyte_utf8_survives_decoding() {
        let buf = frame(STDOUT_FRAME, "héllo ✓\n".as_bytes());
        let result = demux(&buf).unwrap();
        assert_eq!(result.stdout, "héllo ✓\n");
    }

    #[test]
    fn truncated_header_is_an_error() {
        let mut buf = frame(STDOUT_FRAME, b"ok");
        buf.extend_from_slice(&[1, 0, 0]);

        let err = demux(&buf).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedHeader { offset: 10 });
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let mut buf = frame(STDOUT_FRAME, b"full payload");
        buf.truncate(buf.len() - 4);

        let err = demux(&buf).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedPayload { offset: 0, .. }));
    }

    #[test]
    fn reconstructs_exact_concatenation_across_many_frames() {
        let chunks = ["a", "bc", "", "def\n", "g"];
        let mut buf = Vec::new();
        for chunk in chunks {
            buf.extend(frame(STDOUT_FRAME, chunk.as_bytes()));
        }
        let result = demux(&buf).unwrap();
        assert_eq!(result.stdout, chunks.concat());
    }
}
