//! Error types for memwatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a watch list.
#[derive(Debug, Error)]
pub enum WatchListError {
    /// The locations file could not be opened or read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source was readable but produced no watch entries.
    #[error("no watch entries in {path}")]
    Empty { path: PathBuf },
}

/// Errors raised while opening a memory source.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image is larger than the 32-bit guest address space above its base.
    #[error("memory image {path} ({len} bytes) does not fit above base {base:#x}")]
    ImageTooLarge { path: PathBuf, len: usize, base: u32 },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WatchListError {
    WatchListError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn memory_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> MemoryError {
    MemoryError::Io {
        path: path.into(),
        source,
    }
}
