use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use parcel_transport::NetStream;
use tracing::{debug, trace};

use crate::chunker::{header_for, split};
use crate::codec::{encode_header, encode_packet, FrameConfig, PACKET_SIZE};
use crate::error::{FrameError, Result};
use crate::reader::{check_outgoing, transport_to_frame_error};

/// Writes complete payloads to any `Write` stream.
pub struct PayloadWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> PayloadWriter<T> {
    /// Create a new payload writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new payload writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(PACKET_SIZE),
            config,
        }
    }

    /// Send a header followed by every packet of `payload` (blocking).
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        check_outgoing(payload.len(), self.config.max_payload_size)?;

        let header = header_for(payload);
        self.buf.clear();
        encode_header(header.total_size, header.part_count, &mut self.buf);
        self.write_buffered()?;

        for packet in split(payload) {
            self.buf.clear();
            encode_packet(packet.size, packet.part, &packet.data, &mut self.buf);
            self.write_buffered()?;
            trace!(part = packet.part, size = packet.size, "packet sent");
        }

        self.flush()?;
        debug!(
            total_size = header.total_size,
            part_count = header.part_count,
            "payload sent"
        );
        Ok(())
    }

    /// Push the encoded record in `buf` out completely.
    fn write_buffered(&mut self) -> Result<()> {
        let mut record = &self.buf[..];
        while !record.is_empty() {
            match self.inner.write(record) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(written) => record = &record[written..],
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the stream, retrying on `Interrupted`.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                other => return other.map_err(FrameError::Io),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Limit payload size for subsequent writes; `None` removes the limit.
    pub fn set_max_payload_size(&mut self, max_payload_size: Option<usize>) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current payload writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl PayloadWriter<NetStream> {
    /// Create a payload writer for `NetStream` and apply write timeout from config.
    pub fn with_config_net(inner: NetStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{decode_header, decode_packet, HEADER_SIZE, PACKET_DATA_SIZE};

    #[test]
    fn write_single_packet_payload() {
        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_payload(b"hello").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), HEADER_SIZE + PACKET_SIZE);

        let header = decode_header(&wire[..HEADER_SIZE]).unwrap();
        assert_eq!((header.total_size, header.part_count), (5, 1));

        let packet = decode_packet(&wire[HEADER_SIZE..]).unwrap();
        assert_eq!((packet.size, packet.part), (5, 0));
        assert_eq!(packet.data.as_ref(), b"hello");
    }

    #[test]
    fn write_multi_packet_payload() {
        let payload = vec![0x11; PACKET_DATA_SIZE * 2 + 1];
        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_payload(&payload).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), HEADER_SIZE + 3 * PACKET_SIZE);

        let last = decode_packet(&wire[HEADER_SIZE + 2 * PACKET_SIZE..]).unwrap();
        assert_eq!((last.size, last.part), (1, 2));
    }

    #[test]
    fn write_empty_payload_emits_one_packet() {
        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_payload(b"").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), HEADER_SIZE + PACKET_SIZE);
        let header = decode_header(&wire[..HEADER_SIZE]).unwrap();
        assert_eq!((header.total_size, header.part_count), (0, 1));
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = FrameConfig {
            max_payload_size: Some(4),
            ..FrameConfig::default()
        };
        let mut writer = PayloadWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.write_payload(b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn each_payload_is_flushed_once() {
        let mut writer = PayloadWriter::new(RecordingWriter::default());
        writer.write_payload(b"x").unwrap();
        writer.write_payload(&[0u8; 3000]).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.flushes, 2);
        assert_eq!(inner.data.len(), 2 * HEADER_SIZE + 4 * PACKET_SIZE);
    }

    #[test]
    fn interrupted_write_and_flush_are_retried() {
        let sink = RecordingWriter {
            interrupt_write: true,
            interrupt_flush: true,
            ..RecordingWriter::default()
        };
        let mut writer = PayloadWriter::new(sink);
        writer.write_payload(b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), HEADER_SIZE + PACKET_SIZE);
        assert_eq!(inner.flushes, 1);
        assert!(!inner.interrupt_write && !inner.interrupt_flush);
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = PayloadWriter::new(TrickleWriter { data: Vec::new() });
        writer.write_payload(&[0x42; 1500]).unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), HEADER_SIZE + 2 * PACKET_SIZE);
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = PayloadWriter::new(ZeroWriter);
        let err = writer.write_payload(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = PayloadWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.set_max_payload_size(Some(8));
        assert_eq!(writer.config().max_payload_size, Some(8));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[test]
    #[cfg(unix)]
    fn applies_write_timeout_for_net_stream() {
        let (left, _right) = NetStream::pair().unwrap();
        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let writer = PayloadWriter::with_config_net(left, cfg);
        assert!(writer.is_ok());
    }

    /// In-memory sink that counts flushes and can fail the next write or
    /// flush once with `Interrupted`.
    #[derive(Default)]
    struct RecordingWriter {
        data: Vec<u8>,
        flushes: usize,
        interrupt_write: bool,
        interrupt_flush: bool,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if std::mem::take(&mut self.interrupt_write) {
                return Err(ErrorKind::Interrupted.into());
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if std::mem::take(&mut self.interrupt_flush) {
                return Err(ErrorKind::Interrupted.into());
            }
            self.flushes += 1;
            Ok(())
        }
    }

    /// Accepts at most 7 bytes per call.
    struct TrickleWriter {
        data: Vec<u8>,
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(7);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
