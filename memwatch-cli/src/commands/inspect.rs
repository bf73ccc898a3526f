//! `memwatch inspect` — one-shot view of every watch entry.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use memwatch_core::{chase, ReadU32, WatchList};
use memwatch_daemon::open_memory;

use super::{load_settings, LocationsArgs, MemoryArgs};

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub memory: MemoryArgs,

    #[command(flatten)]
    pub locations: LocationsArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    #[tabled(rename = "label")]
    label: String,
    #[tabled(rename = "offsets")]
    offsets: String,
    #[tabled(rename = "value")]
    value: String,
}

impl InspectArgs {
    pub fn run(self) -> Result<()> {
        let (home, settings) = load_settings()?;
        let locations = self.locations.path(&home, &settings);
        let list = WatchList::load(&locations).context("failed to load watch list")?;
        let memory = open_memory(&self.memory.target(&settings)?)
            .context("failed to open memory source")?;

        let rows = build_rows(&list, &memory);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        println!(
            "memwatch v{} | {} entries | {}",
            env!("CARGO_PKG_VERSION"),
            rows.len(),
            locations.display()
        );
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn build_rows<M: ReadU32>(list: &WatchList, memory: &M) -> Vec<EntryRow> {
    list.iter()
        .map(|entry| EntryRow {
            label: entry.label.to_string(),
            offsets: entry
                .offsets
                .iter()
                .map(|offset| format!("{offset:#x}"))
                .collect::<Vec<_>>()
                .join(" → "),
            value: format!("{:#x}", chase(entry, memory)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use memwatch_core::{Endian, MemoryImage};

    #[test]
    fn rows_show_chain_and_current_value() {
        let list = WatchList::parse("0 4\n");
        let memory = MemoryImage::new(0, vec![0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0x2a], Endian::Big);

        let rows = build_rows(&list, &memory);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "0 4");
        assert_eq!(rows[0].offsets, "0x0 → 0x4");
        assert_eq!(rows[0].value, "0x2a");
    }
}
