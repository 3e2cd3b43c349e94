use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use parcel_transport::NetStream;
use tracing::{debug, trace, warn};

use crate::chunker::{join, part_count_for};
use crate::codec::{
    decode_header, decode_packet, FrameConfig, Header, Packet, HEADER_SIZE, PACKET_DATA_SIZE,
    PACKET_SIZE,
};
use crate::error::{FrameError, Result};

/// Read up to `n` bytes, looping over short reads.
///
/// Stops early only when the stream reports end-of-stream (a zero-length
/// read); the returned buffer is then shorter than `n`. Callers decide what
/// a short result means.
pub fn read_exact<R: Read + ?Sized>(source: &mut R, n: usize) -> Result<Bytes> {
    let mut buf = BytesMut::zeroed(n);
    let mut filled = 0usize;

    while filled < n {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    buf.truncate(filled);
    Ok(buf.freeze())
}

/// Reads complete payloads from any `Read` stream.
///
/// Handles partial reads internally; callers always get whole payloads.
pub struct PayloadReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> PayloadReader<T> {
    /// Create a new payload reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new payload reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete payload (blocking).
    ///
    /// Fails with [`FrameError::TruncatedHeader`] or
    /// [`FrameError::TruncatedPacket`] if the stream ends mid-payload.
    pub fn read_payload(&mut self) -> Result<Bytes> {
        let raw = read_exact(&mut self.inner, HEADER_SIZE)?;
        if raw.len() < HEADER_SIZE {
            return Err(FrameError::TruncatedHeader {
                received: raw.len(),
            });
        }
        let header = decode_header(&raw)?;
        check_header(&header, self.config.max_payload_size)?;

        let mut packets = Vec::with_capacity(header.part_count.min(1024) as usize);
        for part in 0..header.part_count {
            let raw = read_exact(&mut self.inner, PACKET_SIZE)?;
            if raw.len() < PACKET_SIZE {
                return Err(FrameError::TruncatedPacket {
                    part,
                    received: raw.len(),
                });
            }
            let packet = decode_packet(&raw)?;
            trace!(part = packet.part, size = packet.size, "packet received");
            packets.push(packet);
        }

        Ok(assemble(&header, packets))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Limit payload size for subsequent reads; `None` removes the limit.
    pub fn set_max_payload_size(&mut self, max_payload_size: Option<usize>) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current payload reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl PayloadReader<NetStream> {
    /// Create a payload reader for `NetStream` and apply read timeout from config.
    pub fn with_config_net(inner: NetStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

/// Reject headers announcing more than `max_payload_size` bytes, or more
/// packets than such a payload could need. No-op without a limit.
pub(crate) fn check_header(header: &Header, max_payload_size: Option<usize>) -> Result<()> {
    let Some(max) = max_payload_size.map(|max| max as u64) else {
        return Ok(());
    };
    if header.total_size > max {
        return Err(FrameError::PayloadTooLarge {
            size: header.total_size,
            max,
        });
    }
    if header.part_count > part_count_for(max) {
        return Err(FrameError::PayloadTooLarge {
            size: header
                .part_count
                .saturating_mul(PACKET_DATA_SIZE as u64),
            max,
        });
    }
    Ok(())
}

/// Sending-side counterpart of [`check_header`].
pub(crate) fn check_outgoing(len: usize, max_payload_size: Option<usize>) -> Result<()> {
    match max_payload_size {
        Some(max) if len > max => Err(FrameError::PayloadTooLarge {
            size: len as u64,
            max: max as u64,
        }),
        _ => Ok(()),
    }
}

/// Join received packets and log the result.
pub(crate) fn assemble(header: &Header, packets: Vec<Packet>) -> Bytes {
    let payload = join(packets, header.part_count);
    if payload.len() as u64 != header.total_size {
        warn!(
            declared = header.total_size,
            received = payload.len(),
            "payload size differs from header"
        );
    }
    debug!(
        total_size = header.total_size,
        part_count = header.part_count,
        "payload received"
    );
    payload
}

pub(crate) fn transport_to_frame_error(err: parcel_transport::TransportError) -> FrameError {
    match err {
        parcel_transport::TransportError::Io(io)
        | parcel_transport::TransportError::Accept(io) => FrameError::Io(io),
        parcel_transport::TransportError::Bind { source, .. }
        | parcel_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
