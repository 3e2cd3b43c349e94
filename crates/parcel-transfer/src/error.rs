use std::path::PathBuf;

/// Errors that can occur during a file transfer.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] parcel_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] parcel_frame::FrameError),

    /// A control payload did not match the directive grammar.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Reading the source or writing the destination failed.
    #[error("file I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TransferError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
