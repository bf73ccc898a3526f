//! Local-socket transports for watcher messages.
//!
//! Two bindings implement [`Transport`]:
//! - [`DatagramTransport`]: one unacknowledged Unix datagram per step
//! - [`ReqRepTransport`]: one request per step over `ipc://`, blocking until
//!   the peer replies
//!
//! Pick one with [`TransportKind`] and [`open`].

mod datagram;
mod error;
mod reqrep;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use datagram::DatagramTransport;
pub use error::TransportError;
pub use reqrep::{ReqRepTransport, CONNECT_TIMEOUT};

/// A session that delivers one message per step to a local peer.
///
/// `send` has no error channel: each binding decides what a failure means
/// (dropped, or a blocked caller).
pub trait Transport {
    fn send(&mut self, message: &str);

    fn kind(&self) -> TransportKind;
}

/// Which binding a watcher talks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Datagram,
    #[serde(rename = "reqrep")]
    RequestReply,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Datagram => write!(f, "datagram"),
            TransportKind::RequestReply => write!(f, "reqrep"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "datagram" | "dgram" => Ok(TransportKind::Datagram),
            "reqrep" | "req" | "zmq" => Ok(TransportKind::RequestReply),
            other => Err(format!(
                "unknown binding '{other}'; expected: datagram, reqrep"
            )),
        }
    }
}

/// Open the binding selected by `kind` against the endpoint at `path`.
pub fn open(kind: TransportKind, path: &Path) -> Result<Box<dyn Transport>, TransportError> {
    match kind {
        TransportKind::Datagram => Ok(Box::new(DatagramTransport::open(path)?)),
        TransportKind::RequestReply => Ok(Box::new(ReqRepTransport::connect(path)?)),
    }
}
