//! Blocking stream transport for parcel.
//!
//! Everything above this layer assumes an ordered, reliable, full-duplex
//! byte stream where end-of-stream is a zero-length read. This crate makes
//! that concrete:
//! - TCP listeners and connectors ([`TcpEndpoint`])
//! - Connected Unix socket pairs for local loopback (Unix only)
//!
//! All of it is surfaced through the single [`NetStream`] type.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::NetStream;
pub use tcp::TcpEndpoint;
