use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use memwatch_core::{Endian, MemoryImage, MemorySource, ProcessMemory, ReadU32};
use memwatch_transport::TransportKind;

use crate::error::{io_err, DaemonError};
use crate::watcher::MemoryWatcher;

/// Where guest memory comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryTarget {
    /// A RAM dump mapped at `base`.
    Image {
        path: PathBuf,
        base: u32,
        endian: Endian,
    },
    /// A live process whose guest RAM starts at `host_base`.
    Process {
        pid: u32,
        host_base: u64,
        guest_base: u32,
        endian: Endian,
    },
}

/// Everything the tick runtime needs to build and drive a watcher.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub memory: MemoryTarget,
    pub locations: PathBuf,
    pub socket: PathBuf,
    pub binding: TransportKind,
    pub interval: Duration,
    /// Stop after this many steps; run until interrupted when `None`.
    pub max_steps: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub enabled: bool,
    pub steps: u64,
    pub duration_ms: u128,
}

pub fn open_memory(target: &MemoryTarget) -> Result<MemorySource, DaemonError> {
    let source = match target {
        MemoryTarget::Image { path, base, endian } => {
            let image = MemoryImage::load(path, *base, *endian)?;
            tracing::info!(
                path = %path.display(),
                base = format_args!("{base:#x}"),
                bytes = image.len(),
                "loaded memory image"
            );
            MemorySource::Image(image)
        }
        MemoryTarget::Process {
            pid,
            host_base,
            guest_base,
            endian,
        } => {
            let process = ProcessMemory::attach(*pid, *host_base, *guest_base, *endian)?;
            tracing::info!(
                pid,
                host_base = format_args!("{host_base:#x}"),
                "attached to process memory"
            );
            MemorySource::Process(process)
        }
    };
    Ok(source)
}

/// Step `watcher` every `interval` on the calling thread.
///
/// Returns when `stop` is set, after `max_steps` steps, or at once if the
/// watcher is disabled. A step that overruns its slot starts the next one
/// immediately rather than bursting to catch up.
pub fn run_ticks<M: ReadU32>(
    watcher: &mut MemoryWatcher<M>,
    interval: Duration,
    max_steps: Option<u64>,
    stop: &AtomicBool,
) -> RunSummary {
    let started = Instant::now();
    if !watcher.is_enabled() {
        return RunSummary {
            enabled: false,
            steps: 0,
            duration_ms: 0,
        };
    }

    let mut steps = 0u64;
    let mut deadline = Instant::now();
    while !stop.load(Ordering::Relaxed) {
        if max_steps.is_some_and(|max| steps >= max) {
            break;
        }
        watcher.step();
        steps += 1;

        deadline += interval;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            deadline = now;
        }
    }

    RunSummary {
        enabled: true,
        steps,
        duration_ms: started.elapsed().as_millis(),
    }
}

/// Build the watcher on a dedicated tick thread and run until ctrl-c or
/// until `max_steps` is reached.
///
/// The watcher never leaves the tick thread. A request/reply peer that stops
/// answering stalls that thread, and then this call as well.
pub fn start_blocking(options: RunOptions) -> Result<RunSummary, DaemonError> {
    init_tracing();
    let memory = open_memory(&options.memory)?;
    let stop = Arc::new(AtomicBool::new(false));

    let tick = {
        let stop = stop.clone();
        thread::Builder::new()
            .name("memwatch-tick".to_string())
            .spawn(move || {
                let mut watcher = MemoryWatcher::new(
                    memory,
                    &options.locations,
                    &options.socket,
                    options.binding,
                );
                let summary = run_ticks(&mut watcher, options.interval, options.max_steps, &stop);
                stop.store(true, Ordering::Relaxed);
                summary
            })
            .map_err(|e| io_err("memwatch-tick thread", e))?
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(wait_for_stop(stop.clone()))?;

    let summary = tick.join().map_err(|_| DaemonError::TickThreadPanicked)?;
    tracing::info!(
        steps = summary.steps,
        duration_ms = summary.duration_ms as u64,
        "memory watcher stopped"
    );
    Ok(summary)
}

async fn wait_for_stop(stop: Arc<AtomicBool>) -> Result<(), DaemonError> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(Duration::from_millis(50));

    loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal.map_err(DaemonError::Signal)?;
                tracing::info!("received ctrl-c, stopping memory watcher");
                stop.store(true, Ordering::Relaxed);
                return Ok(());
            }
            _ = poll.tick() => {
                if stop.load(Ordering::Relaxed) {
                    return Ok(());
                }
            }
        }
    }
}

/// Install the `RUST_LOG`-driven fmt subscriber (default `info`) on stderr.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use memwatch_transport::Transport;
    use tempfile::TempDir;

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Transport for Recorder {
        fn send(&mut self, message: &str) {
            self.0.borrow_mut().push(message.to_owned());
        }

        fn kind(&self) -> TransportKind {
            TransportKind::Datagram
        }
    }

    fn locations(dir: &TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("Locations.txt");
        std::fs::write(&path, text).expect("write locations");
        path
    }

    #[test]
    fn run_ticks_stops_after_max_steps() {
        let dir = TempDir::new().unwrap();
        let path = locations(&dir, "0\n");
        let sent = Rc::new(RefCell::new(Vec::new()));
        let recorder = Recorder(sent.clone());
        let memory = MemoryImage::new(0, vec![0, 0, 0, 9], Endian::Big);
        let mut watcher = MemoryWatcher::with_transport(memory, &path, move || {
            Ok(Box::new(recorder) as Box<dyn Transport>)
        });

        let summary = run_ticks(&mut watcher, Duration::ZERO, Some(3), &AtomicBool::new(false));

        assert!(summary.enabled);
        assert_eq!(summary.steps, 3);
        assert_eq!(*sent.borrow(), vec!["0\n9\n".to_string(), String::new(), String::new()]);
    }

    #[test]
    fn run_ticks_returns_at_once_when_disabled() {
        let dir = TempDir::new().unwrap();
        let memory = MemoryImage::new(0, vec![], Endian::Big);
        let mut watcher = MemoryWatcher::with_transport(
            memory,
            &dir.path().join("missing.txt"),
            || unreachable!("transport must not be opened without locations"),
        );

        let summary = run_ticks(&mut watcher, Duration::ZERO, None, &AtomicBool::new(false));
        assert!(!summary.enabled);
        assert_eq!(summary.steps, 0);
    }

    #[test]
    fn run_ticks_honours_preset_stop_flag() {
        let dir = TempDir::new().unwrap();
        let path = locations(&dir, "0\n");
        let sent = Rc::new(RefCell::new(Vec::new()));
        let recorder = Recorder(sent.clone());
        let memory = MemoryImage::new(0, vec![0; 4], Endian::Big);
        let mut watcher = MemoryWatcher::with_transport(memory, &path, move || {
            Ok(Box::new(recorder) as Box<dyn Transport>)
        });

        let summary = run_ticks(&mut watcher, Duration::ZERO, None, &AtomicBool::new(true));
        assert_eq!(summary.steps, 0);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn open_memory_reports_missing_image() {
        let target = MemoryTarget::Image {
            path: PathBuf::from("/nonexistent/ram.raw"),
            base: 0x8000_0000,
            endian: Endian::Big,
        };
        let err = open_memory(&target).unwrap_err();
        assert!(matches!(err, DaemonError::Memory(_)), "got: {err}");
    }
}
