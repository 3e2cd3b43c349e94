use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::NetStream;

/// TCP listening endpoint.
///
/// Provides blocking bind/accept/connect. Accepted connections have Nagle's
/// algorithm disabled since packets are written one record at a time.
pub struct TcpEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on `addr` (e.g. `127.0.0.1:7070`, or port `0` for an
    /// ephemeral port).
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::bind(&addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(%local_addr, "listening on tcp");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<NetStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok(NetStream::from_tcp(stream))
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<NetStream> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::connect(&addr, e))?;
        stream.set_nodelay(true)?;
        debug!(%addr, "connected over tcp");
        Ok(NetStream::from_tcp(stream))
    }

    /// Connect, giving up after `timeout`.
    ///
    /// Tries every address `addr` resolves to, in order.
    pub fn connect_timeout(
        addr: impl ToSocketAddrs + std::fmt::Display,
        timeout: Duration,
    ) -> Result<NetStream> {
        let candidates = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::connect(&addr, e))?;

        let mut last_err = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(%candidate, "connected over tcp");
                    return Ok(NetStream::from_tcp(stream));
                }
                Err(err) => last_err = Some(err),
            }
        }

        match last_err {
            Some(err) => Err(TransportError::connect(&addr, err)),
            None => Err(TransportError::Unresolved(addr.to_string())),
        }
    }

    /// The address this endpoint is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
