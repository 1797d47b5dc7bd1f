//! Integration tests for the chat-core frame codec and transport.
//!
//! These exercise the public API the way the server and client use it:
//! server messages are rendered, framed, pushed through an in-memory duplex
//! stream, and read back.

use chat_core::{
    decode_frame, encode_frame, read_frame, write_frame, FrameError, ServerMessage, MAX_FRAME_LEN,
};

/// Frames `text`, decodes it from the slice, and asserts every byte was used.
fn roundtrip(text: &str) -> String {
    let bytes = encode_frame(text);
    let (decoded, consumed) = decode_frame(&bytes).expect("decode must succeed");
    assert_eq!(consumed, bytes.len(), "all bytes must be consumed");
    decoded
}

#[test]
fn test_roundtrip_ascii_chat_line() {
    assert_eq!(roundtrip("[alice]: hello there"), "[alice]: hello there");
}

#[test]
fn test_roundtrip_multibyte_text() {
    let text = "こんにちは — emoji 🦀 and accents éàü";
    assert_eq!(roundtrip(text), text);
}

#[test]
fn test_roundtrip_text_filling_the_frame_limit() {
    // 2500 four-byte characters = exactly 10 000 bytes.
    let text = "🦀".repeat(2500);
    assert_eq!(text.len(), MAX_FRAME_LEN as usize);
    assert_eq!(roundtrip(&text), text);
}

#[test]
fn test_roundtrip_empty_text() {
    assert_eq!(roundtrip(""), "");
}

#[test]
fn test_oversized_declaration_is_rejected() {
    let mut bytes = (MAX_FRAME_LEN + 1).to_be_bytes().to_vec();
    bytes.extend_from_slice(&[b'x'; 16]);
    assert_eq!(
        decode_frame(&bytes),
        Err(FrameError::TooLarge {
            declared: MAX_FRAME_LEN + 1
        })
    );
}

#[tokio::test]
async fn test_server_messages_survive_a_duplex_stream() {
    // Arrange: an in-memory pipe with a small buffer forces partial writes
    // and reads on both sides.
    let (mut client, mut server) = tokio::io::duplex(16);
    let messages = vec![
        ServerMessage::Chat {
            from: "A".into(),
            text: "hi".into(),
        },
        ServerMessage::PrivateFrom {
            from: "A".into(),
            text: "secret".into(),
        },
        ServerMessage::error("Unknown command '/dance'. Type /help for available commands."),
        ServerMessage::Goodbye,
    ];
    let expected: Vec<String> = messages.iter().map(ToString::to_string).collect();

    // Act
    let writer = tokio::spawn(async move {
        for msg in &messages {
            write_frame(&mut server, &msg.to_string()).await.unwrap();
        }
    });
    let mut received = Vec::new();
    for _ in 0..expected.len() {
        received.push(read_frame(&mut client).await.unwrap());
    }
    writer.await.unwrap();

    // Assert
    assert_eq!(received, expected);
}

#[tokio::test]
async fn test_reader_sees_end_of_stream_after_writer_drops() {
    let (mut client, mut server) = tokio::io::duplex(64);
    write_frame(&mut server, "last words").await.unwrap();
    drop(server);

    assert_eq!(read_frame(&mut client).await.unwrap(), "last words");
    assert_eq!(read_frame(&mut client).await, Err(FrameError::EndOfStream));
}
