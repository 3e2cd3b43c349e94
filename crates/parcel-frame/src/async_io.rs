//! Async counterparts of the blocking transceiver.
//!
//! Same wire format and error contract; each suspension point is either one
//! read inside [`read_exact_async`] or one record write.

use std::io::ErrorKind;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::chunker::{header_for, split};
use crate::codec::{
    decode_header, decode_packet, encode_header, encode_packet, FrameConfig, HEADER_SIZE,
    PACKET_SIZE,
};
use crate::error::{FrameError, Result};
use crate::reader::{assemble, check_header, check_outgoing};

/// Read up to `n` bytes, looping over short reads until end-of-stream.
pub async fn read_exact_async<R>(source: &mut R, n: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    read_exact_timed(source, n, None).await
}

/// Like [`read_exact_async`], failing with `TimedOut` when a single read
/// waits longer than `timeout`.
async fn read_exact_timed<R>(source: &mut R, n: usize, timeout: Option<Duration>) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::zeroed(n);
    let mut filled = 0usize;

    while filled < n {
        let read = source.read(&mut buf[filled..]);
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .unwrap_or_else(|_| Err(ErrorKind::TimedOut.into())),
            None => read.await,
        };
        match outcome {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    buf.truncate(filled);
    Ok(buf.freeze())
}

async fn write_record<W>(conn: &mut W, record: &[u8], timeout: Option<Duration>) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let write = conn.write_all(record);
    match timeout {
        Some(limit) => tokio::time::timeout(limit, write)
            .await
            .unwrap_or_else(|_| Err(ErrorKind::TimedOut.into()))?,
        None => write.await?,
    }
    Ok(())
}

/// Send `buffer` as one payload, with no size limit or timeouts.
pub async fn send_payload_async<W>(conn: &mut W, buffer: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    send_payload_async_with_config(conn, buffer, &FrameConfig::default()).await
}

/// Send `buffer` as one payload under `config`.
///
/// `write_timeout` bounds each record write.
pub async fn send_payload_async_with_config<W>(
    conn: &mut W,
    buffer: &[u8],
    config: &FrameConfig,
) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    check_outgoing(buffer.len(), config.max_payload_size)?;

    let header = header_for(buffer);
    let mut record = BytesMut::with_capacity(PACKET_SIZE);
    encode_header(header.total_size, header.part_count, &mut record);
    write_record(&mut *conn, &record, config.write_timeout).await?;

    for packet in split(buffer) {
        record.clear();
        encode_packet(packet.size, packet.part, &packet.data, &mut record);
        write_record(&mut *conn, &record, config.write_timeout).await?;
        trace!(part = packet.part, size = packet.size, "packet sent");
    }

    conn.flush().await?;
    debug!(
        total_size = header.total_size,
        part_count = header.part_count,
        "payload sent"
    );
    Ok(())
}

/// Receive one payload, with no size limit or timeouts.
pub async fn receive_payload_async<R>(conn: &mut R) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    receive_payload_async_with_config(conn, &FrameConfig::default()).await
}

/// Receive one payload under `config`.
///
/// `read_timeout` bounds each individual read, as a socket timeout would on
/// the blocking path.
pub async fn receive_payload_async_with_config<R>(
    conn: &mut R,
    config: &FrameConfig,
) -> Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let raw = read_exact_timed(&mut *conn, HEADER_SIZE, config.read_timeout).await?;
    if raw.len() < HEADER_SIZE {
        return Err(FrameError::TruncatedHeader {
            received: raw.len(),
        });
    }
    let header = decode_header(&raw)?;
    check_header(&header, config.max_payload_size)?;

    let mut packets = Vec::with_capacity(header.part_count.min(1024) as usize);
    for part in 0..header.part_count {
        let raw = read_exact_timed(&mut *conn, PACKET_SIZE, config.read_timeout).await?;
        if raw.len() < PACKET_SIZE {
            return Err(FrameError::TruncatedPacket {
                part,
                received: raw.len(),
            });
        }
        packets.push(decode_packet(&raw)?);
    }

    Ok(assemble(&header, packets))
}
