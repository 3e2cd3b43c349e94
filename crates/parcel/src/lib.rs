//! Framed payload exchange and one-shot file transfer over byte streams.
//!
//! parcel turns a reliable, ordered byte stream (TCP) into a channel of
//! whole payloads, and layers a small file-transfer exchange on top.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP endpoints and the `NetStream` handle
//! - [`frame`]: Header + fixed-size packet framing, blocking and async
//! - [`transfer`]: `SAVE_TO` / content / `EOF` sessions (behind `transfer` feature)

/// Re-export transport types.
pub mod transport {
    pub use parcel_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use parcel_frame::*;
}

/// Re-export transfer types (requires `transfer` feature).
#[cfg(feature = "transfer")]
pub mod transfer {
    pub use parcel_transfer::*;
}
