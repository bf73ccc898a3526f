use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};

use crate::error::TransportError;
use crate::{Transport, TransportKind};

/// Fire-and-forget Unix datagram binding.
///
/// The socket is unbound; every message is addressed to `peer` at send time,
/// so the peer may appear, vanish, or restart between steps.
#[derive(Debug)]
pub struct DatagramTransport {
    socket: UnixDatagram,
    peer: PathBuf,
}

impl DatagramTransport {
    /// Create the socket and remember the peer path. Only socket creation can
    /// fail; the peer is not checked.
    pub fn open(peer: &Path) -> Result<Self, TransportError> {
        let socket = UnixDatagram::unbound().map_err(TransportError::SocketCreate)?;
        Ok(Self {
            socket,
            peer: peer.to_path_buf(),
        })
    }

    pub fn peer(&self) -> &Path {
        &self.peer
    }
}

/// Message bytes plus the NUL terminator consumers expect on each datagram.
fn frame(message: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(message.len() + 1);
    buf.extend_from_slice(message.as_bytes());
    buf.push(0);
    buf
}

impl Transport for DatagramTransport {
    fn send(&mut self, message: &str) {
        if let Err(err) = self.socket.send_to(&frame(message), &self.peer) {
            tracing::trace!(peer = %self.peer.display(), error = %err, "datagram dropped");
        }
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Datagram
    }
}
