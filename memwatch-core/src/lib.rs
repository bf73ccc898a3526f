//! memwatch core library — watch list, memory capability, pointer chasing,
//! change detection and the wire message format.
//!
//! Public API surface:
//! - [`types`]: [`Label`] and [`WatchEntry`]
//! - [`watch_list`]: [`WatchList`] loading and line parsing
//! - [`memory`]: the [`ReadU32`] capability and its implementations
//! - [`chaser`]: [`chase`]
//! - [`composer`]: [`ChangeDetector`], [`ValueStore`], [`decode_records`]
//! - [`error`]: [`WatchListError`], [`MemoryError`]

pub mod chaser;
pub mod composer;
pub mod error;
pub mod memory;
pub mod types;
pub mod watch_list;

pub use chaser::chase;
pub use composer::{decode_records, ChangeDetector, Record, ValueStore};
pub use error::{MemoryError, WatchListError};
pub use memory::{Endian, MemoryImage, MemorySource, ProcessMemory, ReadU32, DEFAULT_GUEST_BASE};
pub use types::{Label, WatchEntry};
pub use watch_list::WatchList;
