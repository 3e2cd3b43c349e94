use std::fmt;
use std::io;

use parcel_frame::FrameError;
use parcel_transfer::TransferError;
use parcel_transport::TransportError;

// Exit codes follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const NOT_FOUND: i32 = 66;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

fn with_context(code: i32, context: &str, err: impl fmt::Display) -> CliError {
    CliError::new(code, format!("{context}: {err}"))
}

/// Exit code for an I/O failure, by kind.
fn io_exit_code(kind: io::ErrorKind) -> i32 {
    use io::ErrorKind::*;

    match kind {
        NotFound => NOT_FOUND,
        PermissionDenied => PERMISSION_DENIED,
        TimedOut | WouldBlock => TIMEOUT,
        ConnectionRefused | ConnectionReset | ConnectionAborted | BrokenPipe
        | AddrInUse | AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    with_context(io_exit_code(err.kind()), context, err)
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::Unresolved(_) => with_context(TRANSPORT_ERROR, context, err),
    }
}

/// Streams cut short exit with [`FAILURE`]; bytes that break the format
/// exit with [`DATA_INVALID`].
pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => with_context(FAILURE, context, err),
        err if err.is_truncation() => with_context(FAILURE, context, err),
        err => with_context(DATA_INVALID, context, err),
    }
}

pub fn transfer_error(context: &str, err: TransferError) -> CliError {
    match err {
        TransferError::Transport(err) => transport_error(context, err),
        TransferError::Frame(err) => frame_error(context, err),
        TransferError::ProtocolViolation(_) => with_context(DATA_INVALID, context, err),
        TransferError::Io { path, source } => {
            io_error(&format!("{context} ({})", path.display()), source)
        }
    }
}
