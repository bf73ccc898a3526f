use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while opening a transport. Per-step failures are never surfaced.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to create datagram socket: {0}")]
    SocketCreate(#[source] std::io::Error),

    #[error("socket does not exist: {path}")]
    EndpointMissing { path: PathBuf },

    #[error("failed to allocate request/reply runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("error connecting socket to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: zeromq::ZmqError,
    },

    #[error("no peer accepted {endpoint} within {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },
}
