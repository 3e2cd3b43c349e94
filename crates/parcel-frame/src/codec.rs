use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Meaningful bytes a single packet can carry.
pub const PACKET_DATA_SIZE: usize = 1024;

/// Header: total_size (8) + part_count (8) = 16 bytes.
pub const HEADER_SIZE: usize = 16;

/// Packet: size (8) + part (8) + data block (`PACKET_DATA_SIZE`).
pub const PACKET_SIZE: usize = 16 + PACKET_DATA_SIZE;

/// Receive limit suggested for listeners facing untrusted peers: 16 MiB.
///
/// Nothing applies it by default; see [`FrameConfig::max_payload_size`].
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Record preceding every payload on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Byte length of the whole payload.
    pub total_size: u64,
    /// Number of packets that follow.
    pub part_count: u64,
}

/// One slice of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Meaningful bytes in `data`.
    pub size: u64,
    /// Zero-based index within the payload.
    pub part: u64,
    /// The meaningful bytes, padding already stripped.
    pub data: Bytes,
}

/// Encode a header into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────┐
/// │ total_size       │ part_count       │
/// │ (8B BE)          │ (8B BE)          │
/// └──────────────────┴──────────────────┘
/// ```
pub fn encode_header(total_size: u64, part_count: u64, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_u64(total_size);
    dst.put_u64(part_count);
}

/// Decode a header. `src` must be exactly [`HEADER_SIZE`] bytes.
pub fn decode_header(src: &[u8]) -> Result<Header> {
    if src.len() != HEADER_SIZE {
        return Err(FrameError::MalformedHeader { len: src.len() });
    }

    let mut src = src;
    Ok(Header {
        total_size: src.get_u64(),
        part_count: src.get_u64(),
    })
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────────────────┐
/// │ size (8B BE) │ part (8B BE) │ data (1024B, zero-padded)    │
/// └──────────────┴──────────────┴──────────────────────────────┘
/// ```
///
/// `data` longer than [`PACKET_DATA_SIZE`] is truncated.
pub fn encode_packet(size: u64, part: u64, data: &[u8], dst: &mut BytesMut) {
    let data = &data[..data.len().min(PACKET_DATA_SIZE)];
    dst.reserve(PACKET_SIZE);
    dst.put_u64(size);
    dst.put_u64(part);
    dst.put_slice(data);
    dst.put_bytes(0, PACKET_DATA_SIZE - data.len());
}

/// Decode a packet. `src` must be exactly [`PACKET_SIZE`] bytes.
///
/// The returned data is truncated to the packet's `size` field.
pub fn decode_packet(src: &[u8]) -> Result<Packet> {
    if src.len() != PACKET_SIZE {
        return Err(FrameError::MalformedPacket(format!(
            "record is {} bytes, expected {PACKET_SIZE}",
            src.len()
        )));
    }

    let mut fields = &src[..16];
    let size = fields.get_u64();
    let part = fields.get_u64();

    if size > PACKET_DATA_SIZE as u64 {
        return Err(FrameError::MalformedPacket(format!(
            "size field {size} exceeds {PACKET_DATA_SIZE}"
        )));
    }

    let data = Bytes::copy_from_slice(&src[16..16 + size as usize]);
    Ok(Packet { size, part, data })
}

/// Configuration for payload readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload accepted, in bytes. `None` (the default) accepts any
    /// size.
    pub max_payload_size: Option<usize>,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
