//! `memwatch run` — the watcher host loop.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use memwatch_daemon::{start_blocking, RunOptions};

use super::{load_settings, EndpointArgs, MemoryArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub memory: MemoryArgs,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Milliseconds between steps.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Stop after this many steps instead of running until ctrl-c.
    #[arg(long)]
    pub steps: Option<u64>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_settings()?;
        let options = RunOptions {
            memory: self.memory.target(&settings)?,
            locations: self.endpoint.locations(&home, &settings),
            socket: self.endpoint.socket(&home, &settings),
            binding: self.endpoint.binding(&settings),
            interval: self
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| settings.interval()),
            max_steps: self.steps,
        };

        let summary = start_blocking(options).context("memory watcher exited with error")?;
        if summary.enabled {
            println!(
                "memory watcher ran {} steps in {} ms",
                summary.steps, summary.duration_ms
            );
        } else {
            println!("memory watcher disabled; see log for the reason");
        }
        Ok(())
    }
}
