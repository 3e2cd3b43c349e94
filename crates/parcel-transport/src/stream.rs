use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{describe, Result};

/// A connected byte stream implementing `Read` and `Write`.
///
/// This is the handle every upper layer reads and writes through. It is
/// either a TCP connection or, on Unix, one end of a connected socket pair.
pub struct NetStream {
    inner: NetStreamInner,
}

enum NetStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for NetStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for NetStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl NetStream {
    /// Wrap a connected TCP stream.
    pub fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: NetStreamInner::Tcp(stream),
        }
    }

    /// Wrap one end of a connected Unix stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: NetStreamInner::Unix(stream),
        }
    }

    /// Create a connected pair of local streams.
    ///
    /// Bytes written to one end are read from the other, in order.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Set read timeout on the underlying stream.
    ///
    /// An expired timeout surfaces as an I/O error of kind `WouldBlock` or
    /// `TimedOut` from the next read.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Close the write half. The peer observes end-of-stream on its next read.
    pub fn shutdown_write(&self) -> Result<()> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Write).map_err(Into::into),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.shutdown(Shutdown::Write).map_err(Into::into),
        }
    }

    /// Remote address of a TCP connection. `None` for local pairs.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.peer_addr().ok(),
            #[cfg(unix)]
            NetStreamInner::Unix(_) => None,
        }
    }

    fn transport_name(&self) -> &'static str {
        match &self.inner {
            NetStreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            NetStreamInner::Unix(_) => "unix-pair",
        }
    }
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetStream")
            .field("type", &self.transport_name())
            .field("peer", &describe(self.peer_addr()))
            .finish()
    }
}
