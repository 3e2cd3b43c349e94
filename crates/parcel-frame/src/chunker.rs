//! Splitting payloads into packets and joining them back.
//!
//! An empty payload is sent as a single packet of size 0, so the header of
//! every payload declares at least one part.

use std::iter::FusedIterator;

use bytes::{Bytes, BytesMut};

use crate::codec::{Header, Packet, PACKET_DATA_SIZE};

/// Number of packets a payload of `total_size` bytes is split into.
pub fn part_count_for(total_size: u64) -> u64 {
    total_size.div_ceil(PACKET_DATA_SIZE as u64).max(1)
}

/// Compute the header announcing `buffer`.
pub fn header_for(buffer: &[u8]) -> Header {
    let total_size = buffer.len() as u64;
    Header {
        total_size,
        part_count: part_count_for(total_size),
    }
}

/// Split `buffer` into packets of at most [`PACKET_DATA_SIZE`] bytes.
///
/// Yields exactly `header_for(buffer).part_count` packets.
pub fn split(buffer: &[u8]) -> Split<'_> {
    Split {
        buffer,
        offset: 0,
        part: 0,
        done: false,
    }
}

/// Lazy packet sequence returned by [`split`].
#[derive(Debug)]
pub struct Split<'a> {
    buffer: &'a [u8],
    offset: usize,
    part: u64,
    done: bool,
}

impl Iterator for Split<'_> {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        if self.done {
            return None;
        }

        let end = (self.offset + PACKET_DATA_SIZE).min(self.buffer.len());
        let window = &self.buffer[self.offset..end];
        let packet = Packet {
            size: window.len() as u64,
            part: self.part,
            data: Bytes::copy_from_slice(window),
        };

        self.offset = end;
        self.part += 1;
        self.done = self.offset >= self.buffer.len();
        Some(packet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.done {
            0
        } else {
            (self.buffer.len() - self.offset)
                .div_ceil(PACKET_DATA_SIZE)
                .max(1)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Split<'_> {}

impl FusedIterator for Split<'_> {}

/// Concatenate the data of the first `expected_part_count` packets.
///
/// Packets are joined in the order they are supplied; the `part` field is
/// not consulted.
pub fn join<I>(packets: I, expected_part_count: u64) -> Bytes
where
    I: IntoIterator<Item = Packet>,
{
    let mut out = BytesMut::new();
    let take = usize::try_from(expected_part_count).unwrap_or(usize::MAX);
    for packet in packets.into_iter().take(take) {
        out.extend_from_slice(&packet.data);
    }
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn header_part_count_is_ceiling() {
        for len in [1, 100, 1023, 1024, 1025, 2047, 2048, 2049, 3000, 10 * 1024] {
            let header = header_for(&sample(len));
            assert_eq!(header.total_size, len as u64);
            assert_eq!(
                header.part_count,
                len.div_ceil(PACKET_DATA_SIZE) as u64,
                "len {len}"
            );
        }
    }

    #[test]
    fn header_matches_split_count() {
        for len in [0, 1, 1023, 1024, 1025, 2048, 2049, 4097] {
            let data = sample(len);
            assert_eq!(
                header_for(&data).part_count,
                split(&data).count() as u64,
                "len {len}"
            );
        }
    }

    #[test]
    fn empty_buffer_is_one_empty_packet() {
        let header = header_for(&[]);
        assert_eq!(header.total_size, 0);
        assert_eq!(header.part_count, 1);

        let packets: Vec<Packet> = split(&[]).collect();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].size, 0);
        assert_eq!(packets[0].part, 0);
        assert!(packets[0].data.is_empty());
    }

    #[test]
    fn split_windows_and_indices() {
        let data = sample(2 * PACKET_DATA_SIZE + 10);
        let packets: Vec<Packet> = split(&data).collect();

        assert_eq!(packets.len(), 3);
        assert_eq!(
            packets.iter().map(|p| p.part).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            packets.iter().map(|p| p.size).collect::<Vec<_>>(),
            vec![1024, 1024, 10]
        );
        assert_eq!(packets[2].data.as_ref(), &data[2048..]);
    }

    #[test]
    fn split_is_exact_size_and_fused() {
        let data = sample(3000);
        let mut packets = split(&data);
        assert_eq!(packets.len(), 3);

        packets.next();
        assert_eq!(packets.len(), 2);
        packets.next();
        packets.next();
        assert_eq!(packets.len(), 0);
        assert!(packets.next().is_none());
        assert!(packets.next().is_none());
    }

    #[test]
    fn join_restores_buffer() {
        let data = sample(5000);
        let header = header_for(&data);
        let joined = join(split(&data), header.part_count);
        assert_eq!(joined.as_ref(), data.as_slice());
    }

    #[test]
    fn join_stops_at_expected_count() {
        let data = sample(3 * PACKET_DATA_SIZE);
        let joined = join(split(&data), 2);
        assert_eq!(joined.as_ref(), &data[..2 * PACKET_DATA_SIZE]);
    }

    #[test]
    fn join_uses_supplied_order_not_part_index() {
        let first = Packet {
            size: 3,
            part: 1,
            data: Bytes::from_static(b"def"),
        };
        let second = Packet {
            size: 3,
            part: 0,
            data: Bytes::from_static(b"abc"),
        };

        let joined = join(vec![first, second], 2);
        assert_eq!(joined.as_ref(), b"defabc");
    }
}
