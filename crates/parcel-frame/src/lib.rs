//! Payload framing over ordered byte streams.
//!
//! A stream socket delivers bytes, not messages. Every payload is therefore
//! sent as:
//! - A 16-byte header: total size and packet count (two big-endian u64)
//! - `part_count` fixed 1040-byte packets: meaningful size, part index,
//!   and a 1024-byte data block padded with zeros
//!
//! Short reads are absorbed by [`read_exact`]; callers always get whole
//! payloads or an error.

pub mod chunker;
pub mod codec;
pub mod error;
pub mod reader;
pub mod transceiver;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_io;
#[cfg(feature = "async")]
pub mod tokio_codec;

pub use chunker::{header_for, join, part_count_for, split, Split};
pub use codec::{
    decode_header, decode_packet, encode_header, encode_packet, FrameConfig, Header, Packet,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE, PACKET_DATA_SIZE, PACKET_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::{read_exact, PayloadReader};
pub use transceiver::{receive_payload, send_payload};
pub use writer::PayloadWriter;

#[cfg(feature = "async")]
pub use async_io::{
    read_exact_async, receive_payload_async, receive_payload_async_with_config,
    send_payload_async, send_payload_async_with_config,
};
#[cfg(feature = "async")]
pub use tokio_codec::PayloadCodec;
