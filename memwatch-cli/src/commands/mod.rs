pub mod inspect;
pub mod listen;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use memwatch_core::Endian;
use memwatch_daemon::{settings::parse_address, MemoryTarget, Settings};
use memwatch_transport::TransportKind;

/// Where to read guest memory from. Exactly one of `--image` / `--pid`.
#[derive(Args, Debug, Clone)]
pub struct MemoryArgs {
    /// RAM dump to watch.
    #[arg(long, conflicts_with = "pid")]
    pub image: Option<PathBuf>,

    /// Process whose memory to watch (via /proc/<pid>/mem).
    #[arg(long)]
    pub pid: Option<u32>,

    /// Host address of guest RAM inside the process (hex).
    #[arg(long, value_parser = parse_host_address, default_value = "0")]
    pub host_base: u64,

    /// Guest address the image or RAM region starts at (hex).
    #[arg(long, value_parser = parse_address)]
    pub base: Option<u32>,

    /// Guest byte order.
    #[arg(long)]
    pub endian: Option<Endian>,
}

impl MemoryArgs {
    pub fn target(&self, settings: &Settings) -> Result<MemoryTarget> {
        let base = self.base.unwrap_or(settings.memory.base);
        let endian = self.endian.unwrap_or(settings.memory.endian);
        match (&self.image, self.pid) {
            (Some(path), _) => Ok(MemoryTarget::Image {
                path: path.clone(),
                base,
                endian,
            }),
            (None, Some(pid)) => Ok(MemoryTarget::Process {
                pid,
                host_base: self.host_base,
                guest_base: base,
                endian,
            }),
            (None, None) => bail!("no memory source; pass --image <FILE> or --pid <PID>"),
        }
    }
}

/// Watch list selection.
#[derive(Args, Debug, Clone)]
pub struct LocationsArgs {
    /// Watch list file [default: ~/.memwatch/Locations.txt].
    #[arg(long)]
    pub locations: Option<PathBuf>,
}

impl LocationsArgs {
    pub fn path(&self, home: &Path, settings: &Settings) -> PathBuf {
        self.locations
            .clone()
            .unwrap_or_else(|| settings.locations_path(home))
    }
}

/// Watch list and socket endpoint selection.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    #[command(flatten)]
    pub watch_list: LocationsArgs,

    /// Socket endpoint path [default: ~/.memwatch/MemoryWatcher].
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Transport binding: datagram or reqrep.
    #[arg(long)]
    pub binding: Option<TransportKind>,
}

impl EndpointArgs {
    pub fn locations(&self, home: &Path, settings: &Settings) -> PathBuf {
        self.watch_list.path(home, settings)
    }

    pub fn socket(&self, home: &Path, settings: &Settings) -> PathBuf {
        self.socket
            .clone()
            .unwrap_or_else(|| settings.socket_path(home))
    }

    pub fn binding(&self, settings: &Settings) -> TransportKind {
        self.binding.unwrap_or(settings.binding)
    }
}

/// Home directory plus the settings stored under it.
pub fn load_settings() -> Result<(PathBuf, Settings)> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let settings = Settings::load_at(&home).context("failed to load ~/.memwatch/config.yaml")?;
    Ok((home, settings))
}

fn parse_host_address(text: &str) -> Result<u64, String> {
    let digits = text
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u64::from_str_radix(digits, 16).map_err(|err| format!("invalid address '{text}': {err}"))
}
