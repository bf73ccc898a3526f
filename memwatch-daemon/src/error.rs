use std::path::PathBuf;

use thiserror::Error;

/// Error surface for settings, memory attachment and the tick runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings at {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("memory error: {0}")]
    Memory(#[from] memwatch_core::MemoryError),

    #[error("tick thread panicked")]
    TickThreadPanicked,

    #[error("signal handling failed: {0}")]
    Signal(#[source] std::io::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
