use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use parcel_frame::{
    read_exact, send_payload, FrameConfig, FrameError, PayloadReader, PACKET_DATA_SIZE,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::directive::{is_sentinel, Directive, EOF_SENTINEL};
use crate::error::{Result, TransferError};

/// Outcome of a completed [`send_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendSummary {
    /// Destination path requested from the receiver.
    pub remote_path: String,
    /// File bytes sent.
    pub bytes: u64,
    /// Content payloads sent (excluding directive and sentinel).
    pub chunks: u64,
}

/// Outcome of a completed [`receive_file_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiveSummary {
    /// Where the file was written.
    pub path: PathBuf,
    /// File bytes written.
    pub bytes: u64,
    /// Content payloads received (excluding directive and sentinel).
    pub chunks: u64,
}

/// Receiver-side policy.
#[derive(Debug, Clone, Default)]
pub struct ReceiveOptions {
    /// Confine destinations to this directory.
    ///
    /// When set, directive paths must be relative and free of `..`; missing
    /// parent directories under the root are created.
    pub root: Option<PathBuf>,
    /// Reject payloads announcing more than this many bytes before reading
    /// them. `None` accepts any size.
    pub max_payload_size: Option<usize>,
}

impl ReceiveOptions {
    /// Confine destinations to `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Refuse payloads larger than `max_payload_size`.
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = Some(max_payload_size);
        self
    }

    /// Map a directive path to the local destination.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf> {
        let Some(root) = &self.root else {
            return Ok(PathBuf::from(requested));
        };

        let relative = Path::new(requested);
        let confined = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !confined {
            return Err(TransferError::ProtocolViolation(format!(
                "destination {requested:?} escapes the receive root"
            )));
        }

        Ok(root.join(relative))
    }
}

/// Send the file at `local_path` to be saved as `remote_path` by the peer.
///
/// Emits the directive, one payload per [`PACKET_DATA_SIZE`] chunk of the
/// file, then the sentinel.
pub fn send_file<W: Write + ?Sized>(
    conn: &mut W,
    local_path: &Path,
    remote_path: &str,
) -> Result<SendSummary> {
    if remote_path.trim().is_empty() {
        return Err(TransferError::ProtocolViolation(
            "remote path must not be empty".to_string(),
        ));
    }
    // The receiver trims the directive, so padding would name another file.
    if remote_path.trim() != remote_path {
        return Err(TransferError::ProtocolViolation(format!(
            "remote path {remote_path:?} has leading or trailing whitespace"
        )));
    }

    let mut file = File::open(local_path).map_err(|e| TransferError::io(local_path, e))?;
    send_payload(conn, &Directive::save_to(remote_path).to_bytes())?;
    info!(local = %local_path.display(), remote = remote_path, "sending file");

    let mut bytes = 0u64;
    let mut chunks = 0u64;
    loop {
        let chunk = read_exact(&mut file, PACKET_DATA_SIZE).map_err(|err| match err {
            FrameError::Io(source) => TransferError::io(local_path, source),
            other => other.into(),
        })?;
        if chunk.is_empty() {
            break;
        }

        send_payload(conn, &chunk)?;
        bytes += chunk.len() as u64;
        chunks += 1;

        if chunk.len() < PACKET_DATA_SIZE {
            break;
        }
    }

    send_payload(conn, EOF_SENTINEL)?;
    info!(remote = remote_path, bytes, chunks, "file sent");

    Ok(SendSummary {
        remote_path: remote_path.to_string(),
        bytes,
        chunks,
    })
}

/// Receive one file and return the path it was saved to.
///
/// Destination paths are used as given; see [`receive_file_with`] to
/// confine them.
pub fn receive_file<R: Read + ?Sized>(conn: &mut R) -> Result<PathBuf> {
    receive_file_with(conn, &ReceiveOptions::default()).map(|summary| summary.path)
}

/// Receive one file under the given options.
///
/// Nothing is written unless the first payload is a valid directive. The
/// destination is created or truncated and closed on every exit path; a
/// transfer aborted mid-stream leaves the partial file in place.
pub fn receive_file_with<R: Read + ?Sized>(
    conn: &mut R,
    options: &ReceiveOptions,
) -> Result<ReceiveSummary> {
    let mut conn = PayloadReader::with_config(
        conn,
        FrameConfig {
            max_payload_size: options.max_payload_size,
            ..FrameConfig::default()
        },
    );
    let directive = Directive::parse(&conn.read_payload()?)?;
    let path = options.resolve(directive.path())?;

    if options.root.is_some() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TransferError::io(parent, e))?;
        }
    }

    let mut file = File::create(&path).map_err(|e| TransferError::io(&path, e))?;
    info!(path = %path.display(), "receiving file");

    let mut bytes = 0u64;
    let mut chunks = 0u64;
    loop {
        let payload = match conn.read_payload() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(path = %path.display(), bytes, error = %err, "transfer aborted");
                return Err(err.into());
            }
        };
        if is_sentinel(&payload) {
            break;
        }

        file.write_all(&payload)
            .map_err(|e| TransferError::io(&path, e))?;
        bytes += payload.len() as u64;
        chunks += 1;
        debug!(chunk = chunks, size = payload.len(), "chunk written");
    }

    file.flush().map_err(|e| TransferError::io(&path, e))?;
    info!(path = %path.display(), bytes, chunks, "file received");

    Ok(ReceiveSummary {
        path,
        bytes,
        chunks,
    })
}
