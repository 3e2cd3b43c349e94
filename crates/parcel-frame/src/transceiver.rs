//! One-call send/receive of a whole payload.
//!
//! A payload exchange is `header, packet 0, .., packet n-1` with no
//! acknowledgement in either direction. Any error leaves the stream at an
//! unknown offset; the connection should be dropped.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::error::Result;
use crate::reader::PayloadReader;
use crate::writer::PayloadWriter;

/// Send `buffer` as one payload with default configuration.
pub fn send_payload<W: Write + ?Sized>(conn: &mut W, buffer: &[u8]) -> Result<()> {
    PayloadWriter::new(conn).write_payload(buffer)
}

/// Receive one payload with default configuration.
pub fn receive_payload<R: Read + ?Sized>(conn: &mut R) -> Result<Bytes> {
    PayloadReader::new(conn).read_payload()
}
