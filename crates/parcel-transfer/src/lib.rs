//! One-shot file transfer over parcel payloads.
//!
//! A transfer is three kinds of payload on one connection:
//! 1. `SAVE_TO <path>` naming the destination
//! 2. The file content, one payload per 1024-byte chunk
//! 3. The literal `EOF` sentinel
//!
//! Control payloads are recognized by content alone; they share the wire
//! encoding of data payloads.

pub mod client;
pub mod directive;
pub mod error;
pub mod server;
pub mod session;

pub use client::send_file_to;
pub use directive::{is_sentinel, Directive, EOF_SENTINEL, SAVE_TO_KEYWORD};
pub use error::{Result, TransferError};
pub use server::{IncomingTransfer, TransferListener};
pub use session::{
    receive_file, receive_file_with, send_file, ReceiveOptions, ReceiveSummary, SendSummary,
};
