//! Frame I/O over any async byte stream.
//!
//! TCP is a *stream* protocol: one `read()` may return part of a frame.
//! [`read_frame`] therefore uses `read_exact` for both the header and the
//! payload, which keeps reading until the exact byte count has arrived.  Only
//! a read that returns zero bytes (peer closed) ends the stream early, and
//! that is reported as [`FrameError::EndOfStream`].
//!
//! The functions are generic over `AsyncRead`/`AsyncWrite` so the server,
//! the client, and the tests (in-memory mock streams) share one
//! implementation.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::codec::{decode_payload, encode_frame, parse_header, FrameError, HEADER_SIZE};

/// Reads one complete frame from `reader` and returns its text.
///
/// The length prefix is validated before the payload buffer is allocated, so
/// an oversized declaration never causes a large allocation or read.
///
/// # Errors
///
/// - [`FrameError::EndOfStream`] if the peer closes before or during a frame.
/// - [`FrameError::TooLarge`] if the declared length is over the limit.
/// - [`FrameError::InvalidUtf8`] if the payload is not UTF-8.
/// - [`FrameError::Io`] for any other read failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).await.map_err(map_read_error)?;

    let payload_len = parse_header(header)?;

    let mut payload = vec![0u8; payload_len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(map_read_error)?;

    decode_payload(payload)
}

/// Encodes `text` and writes the whole frame to `writer`, then flushes.
///
/// # Errors
///
/// Returns the underlying I/O error if the write or flush fails.
pub async fn write_frame<W>(writer: &mut W, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_frame(text);
    writer.write_all(&bytes).await?;
    writer.flush().await
}

fn map_read_error(e: io::Error) -> FrameError {
    match e.kind() {
        // `read_exact` reports a zero-byte read as UnexpectedEof; a reset
        // peer is just as gone.
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => FrameError::EndOfStream,
        _ => FrameError::Io(e.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::MAX_FRAME_LEN;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_frame_reassembles_partial_reads() {
        // Arrange: the frame arrives in four separate chunks, splitting both
        // the header and the payload.
        let mut stream = Builder::new()
            .read(&[0, 0])
            .read(&[0, 5, b'h', b'e'])
            .read(b"l")
            .read(b"lo")
            .build();

        // Act
        let text = read_frame(&mut stream).await.unwrap();

        // Assert
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_read_frame_reads_consecutive_frames() {
        let mut wire = encode_frame("one");
        wire.extend_from_slice(&encode_frame("two"));
        let mut stream = Builder::new().read(&wire).build();

        assert_eq!(read_frame(&mut stream).await.unwrap(), "one");
        assert_eq!(read_frame(&mut stream).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_read_frame_empty_stream_is_end_of_stream() {
        let mut stream = Builder::new().build();
        assert_eq!(read_frame(&mut stream).await, Err(FrameError::EndOfStream));
    }

    #[tokio::test]
    async fn test_read_frame_close_inside_header_is_end_of_stream() {
        let mut stream = Builder::new().read(&[0, 0, 1]).build();
        assert_eq!(read_frame(&mut stream).await, Err(FrameError::EndOfStream));
    }

    #[tokio::test]
    async fn test_read_frame_close_mid_payload_is_end_of_stream() {
        let mut stream = Builder::new().read(&[0, 0, 0, 10]).read(b"abc").build();
        assert_eq!(read_frame(&mut stream).await, Err(FrameError::EndOfStream));
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized_length_without_reading_payload() {
        // Only the header is scripted: if the reader tried to consume payload
        // bytes it would hit EndOfStream instead of TooLarge.
        let header = (MAX_FRAME_LEN + 1).to_be_bytes();
        let mut stream = Builder::new().read(&header).build();

        let result = read_frame(&mut stream).await;

        assert_eq!(result, Err(FrameError::TooLarge { declared: 10_001 }));
    }

    #[tokio::test]
    async fn test_read_frame_rejects_invalid_utf8() {
        let mut stream = Builder::new().read(&[0, 0, 0, 1, 0xFF]).build();
        assert_eq!(read_frame(&mut stream).await, Err(FrameError::InvalidUtf8));
    }

    #[tokio::test]
    async fn test_read_frame_maps_connection_reset_to_end_of_stream() {
        let mut stream = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        assert_eq!(read_frame(&mut stream).await, Err(FrameError::EndOfStream));
    }

    #[tokio::test]
    async fn test_write_frame_writes_header_then_payload() {
        let mut stream = Builder::new().write(&[0, 0, 0, 3, b'a', b'b', b'c']).build();
        write_frame(&mut stream, "abc").await.unwrap();
    }
}
