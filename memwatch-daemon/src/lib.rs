//! Watcher lifecycle and host harness: the `MemoryWatcher` component, its
//! on-disk layout and settings, and a ticking runtime around it.

mod error;
pub mod paths;
mod runtime;
pub mod settings;
mod watcher;

pub use error::DaemonError;
pub use runtime::{
    init_tracing, open_memory, run_ticks, start_blocking, MemoryTarget, RunOptions, RunSummary,
};
pub use settings::{MemorySettings, Settings};
pub use watcher::MemoryWatcher;
