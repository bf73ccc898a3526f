use std::path::Path;
use std::time::Duration;

use tokio::runtime::Runtime;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::error::TransportError;
use crate::{Transport, TransportKind};

/// How long `connect` waits for a peer to accept before giving up.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Request/reply binding over an `ipc://` endpoint.
///
/// Every `send` is a full round trip: one request, then a blocking wait for
/// one reply. The watcher can therefore never run more than one message ahead
/// of its peer. There is no receive timeout; a silent peer stalls the caller.
///
/// The session drives its socket on a private current-thread runtime, so it
/// must be used from a plain thread, not from inside another runtime.
pub struct ReqRepTransport {
    socket: Option<ReqSocket>,
    endpoint: String,
    runtime: Runtime,
}

impl ReqRepTransport {
    /// Connect a REQ socket to `ipc://<path>`.
    ///
    /// The endpoint must already exist on disk; a missing endpoint, a runtime
    /// that cannot be built, and a failed connect are reported separately.
    ///
    /// Unlike a lazy ZeroMQ connect, this waits for a peer to accept: a peer
    /// that starts listening more than [`CONNECT_TIMEOUT`] later is never
    /// reached, and the caller gets [`TransportError::ConnectTimeout`].
    pub fn connect(path: &Path) -> Result<Self, TransportError> {
        tracing::info!(path = %path.display(), "connecting request/reply socket");

        if !path.exists() {
            return Err(TransportError::EndpointMissing {
                path: path.to_path_buf(),
            });
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;

        let endpoint = format!("ipc://{}", path.display());
        let mut socket = ReqSocket::new();
        runtime.block_on(async {
            match tokio::time::timeout(CONNECT_TIMEOUT, socket.connect(&endpoint)).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(source)) => Err(TransportError::Connect {
                    endpoint: endpoint.clone(),
                    source,
                }),
                Err(_) => Err(TransportError::ConnectTimeout {
                    endpoint: endpoint.clone(),
                    timeout: CONNECT_TIMEOUT,
                }),
            }
        })?;

        tracing::info!(endpoint = %endpoint, "connected request/reply socket");
        Ok(Self {
            socket: Some(socket),
            endpoint,
            runtime,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for ReqRepTransport {
    fn send(&mut self, message: &str) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        let request = ZmqMessage::from(message.to_owned());
        let endpoint = &self.endpoint;
        self.runtime.block_on(async {
            if let Err(err) = socket.send(request).await {
                tracing::warn!(endpoint = %endpoint, error = %err, "request send failed");
                return;
            }
            // The reply only paces the next step; its content is unused.
            if let Err(err) = socket.recv().await {
                tracing::warn!(endpoint = %endpoint, error = %err, "reply receive failed");
            }
        });
    }

    fn kind(&self) -> TransportKind {
        TransportKind::RequestReply
    }
}

impl Drop for ReqRepTransport {
    fn drop(&mut self) {
        // Peer tasks live on our runtime; tear the socket down inside it.
        let _guard = self.runtime.enter();
        self.socket.take();
    }
}

impl std::fmt::Debug for ReqRepTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqRepTransport")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.socket.is_some())
            .finish()
    }
}
