/// Errors that can occur while framing or unframing payloads.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A header record was not exactly `HEADER_SIZE` bytes.
    #[error("malformed header ({len} bytes, expected 16)")]
    MalformedHeader { len: usize },

    /// A packet record had the wrong length or an out-of-range size field.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The stream ended before a complete header was received.
    #[error("connection closed mid-header ({received} of 16 bytes)")]
    TruncatedHeader { received: usize },

    /// The stream ended before packet `part` was complete.
    #[error("connection closed mid-packet (part {part}, {received} bytes received)")]
    TruncatedPacket { part: u64, received: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream accepted zero bytes on write.
    #[error("connection closed (write returned zero bytes)")]
    ConnectionClosed,
}

impl FrameError {
    /// True when the peer went away mid-payload.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. } | Self::TruncatedPacket { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
