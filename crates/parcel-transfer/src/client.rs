use std::fmt::Display;
use std::net::ToSocketAddrs;
use std::path::Path;
use std::time::Duration;

use parcel_transport::TcpEndpoint;
use tracing::debug;

use crate::error::Result;
use crate::session::{send_file, SendSummary};

/// Connect to a receiver over TCP and send one file.
///
/// `timeout` bounds the connect and every individual socket read or write.
/// The write half is closed once the EOF sentinel is out, so the receiver
/// sees end-of-stream rather than waiting on an idle connection.
pub fn send_file_to(
    addr: impl ToSocketAddrs + Display,
    local_path: &Path,
    remote_path: &str,
    timeout: Option<Duration>,
) -> Result<SendSummary> {
    let mut stream = match timeout {
        Some(timeout) => TcpEndpoint::connect_timeout(&addr, timeout)?,
        None => TcpEndpoint::connect(&addr)?,
    };
    stream.set_read_timeout(timeout)?;
    stream.set_write_timeout(timeout)?;

    let summary = send_file(&mut stream, local_path, remote_path)?;
    if let Err(err) = stream.shutdown_write() {
        debug!(error = %err, "write shutdown after transfer failed");
    }
    Ok(summary)
}
