use std::fmt::Display;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parcel_transport::{NetStream, TcpEndpoint};
use tracing::debug;

use crate::error::Result;
use crate::session::{receive_file_with, ReceiveOptions, ReceiveSummary};

/// Listens for and accepts incoming file transfers.
pub struct TransferListener {
    endpoint: TcpEndpoint,
    options: ReceiveOptions,
    read_timeout: Option<Duration>,
    next_transfer_id: AtomicU64,
}

impl TransferListener {
    /// Bind to a TCP address.
    pub fn bind(addr: impl ToSocketAddrs + Display) -> Result<Self> {
        let endpoint = TcpEndpoint::bind(addr)?;
        Ok(Self {
            endpoint,
            options: ReceiveOptions::default(),
            read_timeout: None,
            next_transfer_id: AtomicU64::new(1),
        })
    }

    /// Override receiver options for accepted transfers.
    pub fn with_options(mut self, options: ReceiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Fail a transfer whose peer stays silent for longer than `timeout`.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    /// Accept the next connection.
    ///
    /// Nothing is read until [`IncomingTransfer::receive`] is called, so the
    /// transfer can be moved to its own thread first.
    pub fn accept(&self) -> Result<IncomingTransfer> {
        let stream = self.endpoint.accept()?;
        stream.set_read_timeout(self.read_timeout)?;
        let id = self.next_transfer_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, peer = ?stream.peer_addr(), "transfer connection accepted");
        Ok(IncomingTransfer {
            id,
            stream,
            options: self.options.clone(),
        })
    }
}

/// An accepted connection that has not been read yet.
#[derive(Debug)]
pub struct IncomingTransfer {
    id: u64,
    stream: NetStream,
    options: ReceiveOptions,
}

impl IncomingTransfer {
    /// Listener-assigned sequence number, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remote address of the sender.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Run the receive side of the session to completion.
    pub fn receive(mut self) -> Result<ReceiveSummary> {
        receive_file_with(&mut self.stream, &self.options)
    }
}
