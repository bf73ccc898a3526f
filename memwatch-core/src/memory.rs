//! Host memory access.
//!
//! Everything above this module sees memory only through [`ReadU32`]. Reads
//! are infallible by contract: an address that cannot be read yields 0, and
//! the caller never learns why.

use std::fmt;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{memory_io_err, MemoryError};

/// Guest address of the start of emulated main RAM.
pub const DEFAULT_GUEST_BASE: u32 = 0x8000_0000;

/// The single memory capability the watcher needs.
pub trait ReadU32 {
    fn read_u32(&self, address: u32) -> u32;
}

impl<T: ReadU32 + ?Sized> ReadU32 for &T {
    fn read_u32(&self, address: u32) -> u32 {
        (**self).read_u32(address)
    }
}

impl<T: ReadU32 + ?Sized> ReadU32 for Box<T> {
    fn read_u32(&self, address: u32) -> u32 {
        (**self).read_u32(address)
    }
}

// ---------------------------------------------------------------------------
// Endian
// ---------------------------------------------------------------------------

/// Byte order of the guest machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl Endian {
    fn decode(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Big => u32::from_be_bytes(bytes),
            Endian::Little => u32::from_le_bytes(bytes),
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Big => write!(f, "big"),
            Endian::Little => write!(f, "little"),
        }
    }
}

impl FromStr for Endian {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "big" | "be" => Ok(Endian::Big),
            "little" | "le" => Ok(Endian::Little),
            other => Err(format!("unknown byte order '{other}'; expected: big, little")),
        }
    }
}

// ---------------------------------------------------------------------------
// Memory image
// ---------------------------------------------------------------------------

/// A RAM snapshot held in memory and mapped at a guest base address.
#[derive(Debug, Clone)]
pub struct MemoryImage {
    base: u32,
    bytes: Vec<u8>,
    endian: Endian,
}

impl MemoryImage {
    pub fn new(base: u32, bytes: Vec<u8>, endian: Endian) -> Self {
        Self {
            base,
            bytes,
            endian,
        }
    }

    /// Read a dump file into memory.
    pub fn load(path: &Path, base: u32, endian: Endian) -> Result<Self, MemoryError> {
        let bytes = std::fs::read(path).map_err(|e| memory_io_err(path, e))?;
        let span = u64::from(u32::MAX) - u64::from(base) + 1;
        if bytes.len() as u64 > span {
            return Err(MemoryError::ImageTooLarge {
                path: path.to_path_buf(),
                len: bytes.len(),
                base,
            });
        }
        Ok(Self::new(base, bytes, endian))
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ReadU32 for MemoryImage {
    fn read_u32(&self, address: u32) -> u32 {
        let Some(offset) = address.checked_sub(self.base) else {
            return 0;
        };
        let start = offset as usize;
        match self.bytes.get(start..start.saturating_add(4)) {
            Some(&[a, b, c, d]) => self.endian.decode([a, b, c, d]),
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Live process
// ---------------------------------------------------------------------------

/// Reads guest memory out of a running process via `/proc/<pid>/mem`.
///
/// Guest address `a` is read from host address `host_base + (a - guest_base)`.
#[derive(Debug)]
pub struct ProcessMemory {
    mem: File,
    path: PathBuf,
    host_base: u64,
    guest_base: u32,
    endian: Endian,
}

impl ProcessMemory {
    pub fn attach(
        pid: u32,
        host_base: u64,
        guest_base: u32,
        endian: Endian,
    ) -> Result<Self, MemoryError> {
        let path = PathBuf::from(format!("/proc/{pid}/mem"));
        Self::open(path, host_base, guest_base, endian)
    }

    /// Open any file that is addressed like a process memory file.
    pub fn open(
        path: impl Into<PathBuf>,
        host_base: u64,
        guest_base: u32,
        endian: Endian,
    ) -> Result<Self, MemoryError> {
        let path = path.into();
        let mem = File::open(&path).map_err(|e| memory_io_err(&path, e))?;
        Ok(Self {
            mem,
            path,
            host_base,
            guest_base,
            endian,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReadU32 for ProcessMemory {
    fn read_u32(&self, address: u32) -> u32 {
        let Some(offset) = address.checked_sub(self.guest_base) else {
            return 0;
        };
        let Some(host) = self.host_base.checked_add(u64::from(offset)) else {
            return 0;
        };
        let mut buf = [0u8; 4];
        match self.mem.read_exact_at(&mut buf, host) {
            Ok(()) => self.endian.decode(buf),
            Err(_) => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Source selection
// ---------------------------------------------------------------------------

/// The memory backends a host can pick between at startup.
#[derive(Debug)]
pub enum MemorySource {
    Image(MemoryImage),
    Process(ProcessMemory),
}

impl ReadU32 for MemorySource {
    fn read_u32(&self, address: u32) -> u32 {
        match self {
            MemorySource::Image(image) => image.read_u32(address),
            MemorySource::Process(process) => process.read_u32(address),
        }
    }
}
