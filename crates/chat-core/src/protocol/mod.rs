//! Protocol module containing the frame codec, the async stream transport,
//! and the outbound message types.

pub mod codec;
pub mod messages;
pub mod transport;

pub use codec::{decode_frame, encode_frame, FrameError, MAX_FRAME_LEN};
pub use messages::ServerMessage;
pub use transport::{read_frame, write_frame};
