use std::path::Path;

use memwatch_core::{ChangeDetector, ReadU32, WatchList};
use memwatch_transport::{Transport, TransportError, TransportKind};

/// Reports changes in watched guest memory to a local consumer.
///
/// Construction loads the watch list and then opens the transport. If either
/// fails the watcher is disabled for its whole lifetime: [`step`] does
/// nothing, and nothing is retried. The reason is logged, not returned.
///
/// Stepping takes `&mut self`; callers sharing a watcher across threads must
/// serialize access themselves.
///
/// [`step`]: MemoryWatcher::step
pub struct MemoryWatcher<M> {
    memory: M,
    session: Option<Session>,
}

struct Session {
    list: WatchList,
    detector: ChangeDetector,
    transport: Box<dyn Transport>,
}

impl<M: ReadU32> MemoryWatcher<M> {
    /// Load `locations` and connect the `kind` binding to `socket`.
    pub fn new(memory: M, locations: &Path, socket: &Path, kind: TransportKind) -> Self {
        Self::with_transport(memory, locations, || memwatch_transport::open(kind, socket))
    }

    /// Like [`MemoryWatcher::new`] with a caller-supplied transport opener.
    ///
    /// `open` runs only if the watch list loaded.
    pub fn with_transport<F>(memory: M, locations: &Path, open: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn Transport>, TransportError>,
    {
        let list = match WatchList::load(locations) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load watch locations, not watching memory");
                return Self::disabled(memory);
            }
        };

        let transport = match open() {
            Ok(transport) => transport,
            Err(err) => {
                tracing::warn!(error = %err, "failed to open watcher socket, not watching memory");
                return Self::disabled(memory);
            }
        };

        tracing::info!(
            entries = list.len(),
            binding = %transport.kind(),
            "memory watcher enabled"
        );
        let detector = ChangeDetector::seeded(&list);
        Self {
            memory,
            session: Some(Session {
                list,
                detector,
                transport,
            }),
        }
    }

    fn disabled(memory: M) -> Self {
        Self {
            memory,
            session: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    /// The loaded watch list, if the watcher is enabled.
    pub fn watch_list(&self) -> Option<&WatchList> {
        self.session.as_ref().map(|session| &session.list)
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Chase every entry, compose the changes and send them.
    ///
    /// A message goes out on every step, empty when nothing changed. With the
    /// request/reply binding this blocks until the peer answers.
    pub fn step(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let message = session.detector.compose(&session.list, &self.memory);
        session.transport.send(&message);
    }
}

impl<M> Drop for MemoryWatcher<M> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(binding = %session.transport.kind(), "releasing watcher transport");
        }
    }
}
