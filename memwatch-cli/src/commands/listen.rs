//! `memwatch listen` — the consumer end of the socket, for debugging watch
//! lists and as a reference peer.

use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::{UnixDatagram, UnixStream};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use memwatch_core::decode_records;
use memwatch_transport::TransportKind;

use super::load_settings;

/// Largest datagram we accept in one receive.
const MAX_DATAGRAM: usize = 64 * 1024;

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket endpoint path to bind [default: ~/.memwatch/MemoryWatcher].
    #[arg(long)]
    pub socket: Option<std::path::PathBuf>,

    /// Transport binding: datagram or reqrep.
    #[arg(long)]
    pub binding: Option<TransportKind>,

    /// Emit one JSON object per record.
    #[arg(long)]
    pub json: bool,

    /// Exit after this many non-empty messages.
    #[arg(long)]
    pub count: Option<usize>,
}

impl ListenArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_settings()?;
        let socket = self
            .socket
            .clone()
            .unwrap_or_else(|| settings.socket_path(&home));
        let binding = self.binding.unwrap_or(settings.binding);

        if let Some(dir) = socket.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        prepare_socket_for_bind(&socket, binding)?;

        let printer = Printer { json: self.json };
        let result = match binding {
            TransportKind::Datagram => listen_datagram(&socket, &printer, self.count),
            TransportKind::RequestReply => listen_reqrep(&socket, &printer, self.count),
        };
        let _ = fs::remove_file(&socket);
        result
    }
}

fn listen_datagram(socket: &Path, printer: &Printer, count: Option<usize>) -> Result<()> {
    let listener = UnixDatagram::bind(socket)
        .with_context(|| format!("failed to bind {}", socket.display()))?;
    eprintln!("listening for datagrams on {}", socket.display());

    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut seen = 0usize;
    while count.map_or(true, |max| seen < max) {
        let n = listener
            .recv(&mut buf)
            .with_context(|| format!("failed to receive on {}", socket.display()))?;
        let message = String::from_utf8_lossy(&buf[..n]);
        if printer.print(&message)? > 0 {
            seen += 1;
        }
    }
    Ok(())
}

fn listen_reqrep(socket: &Path, printer: &Printer, count: Option<usize>) -> Result<()> {
    let endpoint = format!("ipc://{}", socket.display());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let mut rep = RepSocket::new();
        rep.bind(&endpoint)
            .await
            .map_err(|err| anyhow!("failed to bind {endpoint}: {err}"))?;
        eprintln!("listening for requests on {endpoint}");

        let mut seen = 0usize;
        while count.map_or(true, |max| seen < max) {
            let request = rep
                .recv()
                .await
                .map_err(|err| anyhow!("failed to receive on {endpoint}: {err}"))?;
            let message = String::try_from(request)
                .map_err(|err| anyhow!("request on {endpoint} is not text: {err}"))?;
            if printer.print(&message)? > 0 {
                seen += 1;
            }
            rep.send(ZmqMessage::from("ok".to_string()))
                .await
                .map_err(|err| anyhow!("failed to reply on {endpoint}: {err}"))?;
        }
        Ok::<(), anyhow::Error>(())
    })
}

/// Refuse to steal a live endpoint; clear a stale one.
fn prepare_socket_for_bind(socket: &Path, binding: TransportKind) -> Result<()> {
    if !socket.exists() {
        return Ok(());
    }

    let probe = match binding {
        TransportKind::Datagram => UnixDatagram::unbound().and_then(|s| s.connect(socket)),
        TransportKind::RequestReply => UnixStream::connect(socket).map(|_| ()),
    };
    if probe.is_ok() {
        bail!("socket already in use: {}", socket.display());
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", socket.display())),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

struct Printer {
    json: bool,
}

#[derive(Serialize)]
struct RecordJson<'a> {
    received_at: DateTime<Local>,
    label: &'a str,
    value: u32,
    hex: String,
}

impl Printer {
    /// Print every record in `message`; returns how many there were.
    fn print(&self, message: &str) -> Result<usize> {
        let records = decode_records(message);
        let now = Local::now();
        for record in &records {
            if self.json {
                let line = serde_json::to_string(&RecordJson {
                    received_at: now,
                    label: &record.label,
                    value: record.value,
                    hex: format!("{:x}", record.value),
                })?;
                println!("{line}");
            } else {
                println!(
                    "{} {} = {}",
                    now.format("[%H:%M:%S%.3f]").to_string().bright_black(),
                    record.label.bold(),
                    format!("{:#x}", record.value).green(),
                );
            }
        }
        Ok(records.len())
    }
}
