//! memwatch — report changes in watched guest memory to a local consumer.
//!
//! # Usage
//!
//! ```text
//! memwatch run (--image <FILE> | --pid <PID>) [--binding datagram|reqrep] [--steps N]
//! memwatch listen [--binding datagram|reqrep] [--json] [--count N]
//! memwatch inspect (--image <FILE> | --pid <PID>)
//! ```
//!
//! Paths default to `~/.memwatch/Locations.txt` and `~/.memwatch/MemoryWatcher`,
//! overridable in `~/.memwatch/config.yaml` and then by flags.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{inspect::InspectArgs, listen::ListenArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "memwatch",
    version,
    about = "Report changes in watched guest memory over a local socket",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch memory and send change messages every tick.
    Run(RunArgs),

    /// Bind the socket endpoint and print the messages a watcher sends.
    Listen(ListenArgs),

    /// Print every watch entry with its current value.
    Inspect(InspectArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Listen(args) => args.run(),
        Commands::Inspect(args) => args.run(),
    }
}
