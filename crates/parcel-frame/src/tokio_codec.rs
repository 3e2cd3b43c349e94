use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::chunker::{header_for, split};
use crate::codec::{
    decode_header, decode_packet, encode_header, encode_packet, HEADER_SIZE, PACKET_DATA_SIZE,
    PACKET_SIZE,
};
use crate::error::{FrameError, Result};
use crate::reader::{assemble, check_header, check_outgoing};

/// Upper bound on a single `reserve` while a payload is still arriving.
const RESERVE_STEP: usize = 64 * PACKET_SIZE;

/// Payload codec for `tokio_util::codec::Framed`.
///
/// Yields one item per complete payload (header plus all packets).
#[derive(Debug, Clone, Default)]
pub struct PayloadCodec {
    max_payload_size: Option<usize>,
}

impl PayloadCodec {
    /// Create a codec that accepts payloads of any size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec that rejects payloads larger than `max_payload_size`
    /// in both directions.
    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self {
            max_payload_size: Some(max_payload_size),
        }
    }
}

impl Decoder for PayloadCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let header = decode_header(&src[..HEADER_SIZE])?;
        check_header(&header, self.max_payload_size)?;

        let Some((parts, needed)) = frame_len(header.part_count) else {
            return Err(FrameError::PayloadTooLarge {
                size: header
                    .part_count
                    .saturating_mul(PACKET_DATA_SIZE as u64),
                max: usize::MAX as u64,
            });
        };
        if src.len() < needed {
            src.reserve((needed - src.len()).min(RESERVE_STEP));
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let mut packets = Vec::with_capacity(parts);
        for _ in 0..parts {
            let record = src.split_to(PACKET_SIZE);
            packets.push(decode_packet(&record)?);
        }

        Ok(Some(assemble(&header, packets)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(payload) = self.decode(src)? {
            return Ok(Some(payload));
        }
        if src.is_empty() {
            return Ok(None);
        }
        if src.len() < HEADER_SIZE {
            return Err(FrameError::TruncatedHeader {
                received: src.len(),
            });
        }

        let body = src.len() - HEADER_SIZE;
        Err(FrameError::TruncatedPacket {
            part: (body / PACKET_SIZE) as u64,
            received: body % PACKET_SIZE,
        })
    }
}

/// Packet count and total wire length of a payload, if addressable.
fn frame_len(part_count: u64) -> Option<(usize, usize)> {
    let parts = usize::try_from(part_count).ok()?;
    let needed = parts.checked_mul(PACKET_SIZE)?.checked_add(HEADER_SIZE)?;
    Some((parts, needed))
}

impl Encoder<&[u8]> for PayloadCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        check_outgoing(item.len(), self.max_payload_size)?;

        let header = header_for(item);
        dst.reserve(HEADER_SIZE + header.part_count as usize * PACKET_SIZE);
        encode_header(header.total_size, header.part_count, dst);
        for packet in split(item) {
            encode_packet(packet.size, packet.part, &packet.data, dst);
        }
        Ok(())
    }
}

impl Encoder<Bytes> for PayloadCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&[u8]>::encode(self, item.as_ref(), dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{Framed, FramedRead};

    use super::*;

    #[test]
    fn decode_waits_for_whole_payload() {
        let mut codec = PayloadCodec::new();
        let mut wire = BytesMut::new();
        Encoder::<&[u8]>::encode(&mut codec, &[9u8; 1500][..], &mut wire).unwrap();
        let full = wire.clone();

        let mut partial = BytesMut::from(&full[..HEADER_SIZE + PACKET_SIZE]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        let mut complete = full;
        let payload = codec.decode(&mut complete).unwrap().unwrap();
        assert_eq!(payload.as_ref(), &[9u8; 1500][..]);
        assert!(complete.is_empty());
    }

    #[test]
    fn decode_eof_mid_packet() {
        let mut codec = PayloadCodec::new();
        let mut wire = BytesMut::new();
        Encoder::<&[u8]>::encode(&mut codec, &[1u8; 2 * PACKET_DATA_SIZE][..], &mut wire).unwrap();
        wire.truncate(HEADER_SIZE + PACKET_SIZE + 40);

        let err = codec.decode_eof(&mut wire).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedPacket {
                part: 1,
                received: 40
            }
        ));
    }

    #[test]
    fn decode_eof_mid_header() {
        let mut codec = PayloadCodec::new();
        let mut wire = BytesMut::from(&[0u8; 5][..]);
        let err = codec.decode_eof(&mut wire).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedHeader { received: 5 }));
    }

    #[test]
    fn unlimited_codec_rejects_unaddressable_part_count() {
        let mut codec = PayloadCodec::new();
        let mut wire = BytesMut::new();
        encode_header(0, u64::MAX, &mut wire);
        let err = codec.decode(&mut wire).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn encoder_limit_is_opt_in() {
        let big = vec![1u8; 2 * PACKET_DATA_SIZE];
        let mut wire = BytesMut::new();
        Encoder::<&[u8]>::encode(&mut PayloadCodec::new(), &big[..], &mut wire).unwrap();
        assert_eq!(wire.len(), HEADER_SIZE + 2 * PACKET_SIZE);

        let mut limited = PayloadCodec::with_max_payload(16);
        let err = Encoder::<&[u8]>::encode(&mut limited, &big[..], &mut wire).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { max: 16, .. }));
    }

    #[test]
    fn decode_rejects_oversized_header() {
        let mut codec = PayloadCodec::with_max_payload(8);
        let mut wire = BytesMut::new();
        encode_header(9, 1, &mut wire);
        let err = codec.decode(&mut wire).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (left, right) = tokio::io::duplex(4096);
        let mut writer = Framed::new(left, PayloadCodec::new());
        let mut reader = FramedRead::new(right, PayloadCodec::new());

        let large = Bytes::from(vec![0x33; 10 * PACKET_DATA_SIZE + 1]);
        let expected = large.clone();
        let sender = tokio::spawn(async move {
            writer.send(Bytes::from_static(b"first")).await.unwrap();
            writer.send(large).await.unwrap();
        });

        let first = reader.next().await.unwrap().unwrap();
        let second = reader.next().await.unwrap().unwrap();
        assert_eq!(first.as_ref(), b"first");
        assert_eq!(second, expected);

        sender.await.unwrap();
        assert!(reader.next().await.is_none());
    }
}
