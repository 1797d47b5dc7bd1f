//! Length-prefixed frame codec for the chat relay wire protocol.
//!
//! Wire format:
//! ```text
//! [payload_len:4][payload:N]
//! ```
//! `payload_len` is an unsigned big-endian integer; the payload is UTF-8 text.
//! A declared length above [`MAX_FRAME_LEN`] is rejected as soon as the
//! header is visible, before any payload buffer is allocated.
//!
//! This module works on byte slices only.  The async stream reader built on
//! top of it lives in [`crate::protocol::transport`].

use thiserror::Error;

/// Size of the length prefix in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload length (in bytes) a receiver accepts.
pub const MAX_FRAME_LEN: u32 = 10_000;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The byte slice does not yet hold a complete frame.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The peer closed the stream before a complete frame arrived.
    #[error("end of stream")]
    EndOfStream,

    /// The length prefix exceeds [`MAX_FRAME_LEN`].
    #[error("frame too large: {declared} bytes (max {MAX_FRAME_LEN})")]
    TooLarge { declared: u32 },

    /// The payload is not valid UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8,

    /// The underlying stream failed with something other than a clean close.
    #[error("stream I/O error: {0}")]
    Io(String),
}

impl FrameError {
    /// Returns `true` when the error means the peer simply went away.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, FrameError::EndOfStream)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `text` into a frame: 4-byte big-endian length followed by the
/// UTF-8 bytes.
///
/// No upper bound is enforced on the sending side; callers cap chat text
/// before it reaches this layer.
///
/// # Examples
///
/// ```rust
/// use chat_core::protocol::codec::{decode_frame, encode_frame};
///
/// let bytes = encode_frame("hi");
/// assert_eq!(bytes, vec![0, 0, 0, 2, b'h', b'i']);
/// let (text, consumed) = decode_frame(&bytes).unwrap();
/// assert_eq!(text, "hi");
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_frame(text: &str) -> Vec<u8> {
    let payload = text.as_bytes();
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Parses a length prefix and validates it against [`MAX_FRAME_LEN`].
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] when the declared length is over the limit.
pub fn parse_header(header: [u8; HEADER_SIZE]) -> Result<usize, FrameError> {
    let declared = u32::from_be_bytes(header);
    if declared > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge { declared });
    }
    Ok(declared as usize)
}

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the text and the total number of bytes consumed (header +
/// payload), so a buffered caller can advance its cursor.
///
/// # Errors
///
/// - [`FrameError::InsufficientData`] if `bytes` holds less than one frame.
/// - [`FrameError::TooLarge`] if the header declares more than
///   [`MAX_FRAME_LEN`] bytes, reported before waiting for the payload.
/// - [`FrameError::InvalidUtf8`] if the payload is not UTF-8.
pub fn decode_frame(bytes: &[u8]) -> Result<(String, usize), FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let payload_len = parse_header([bytes[0], bytes[1], bytes[2], bytes[3]])?;

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(FrameError::InsufficientData {
            needed: total_needed,
            available: bytes.len(),
        });
    }

    let text = decode_payload(bytes[HEADER_SIZE..total_needed].to_vec())?;
    Ok((text, total_needed))
}

/// Converts a raw payload into text.
pub(crate) fn decode_payload(payload: Vec<u8>) -> Result<String, FrameError> {
    String::from_utf8(payload).map_err(|_| FrameError::InvalidUtf8)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
