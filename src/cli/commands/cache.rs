//! `bct cache` command - entity cache management

use console::style;
use miette::Result;

use crate::cli::helpers::resolve_project;
use crate::cli::GlobalOpts;
use crate::core::EntityCache;

#[derive(clap::Subcommand, Debug)]
pub enum CacheCommands {
    /// Sync the cache against entity files
    Sync,

    /// Show cache contents summary
    Status,
}

pub fn run(cmd: CacheCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CacheCommands::Sync => run_sync(global),
        CacheCommands::Status => run_status(global),
    }
}

fn run_sync(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut cache = EntityCache::open(&project)?;
    let stats = cache.sync(&project)?;

    println!(
        "{} Synced: {} scanned, {} updated, {} removed",
        style("✓").green().bold(),
        stats.scanned,
        style(stats.updated).cyan(),
        stats.removed
    );
    Ok(())
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut cache = EntityCache::open(&project)?;
    cache.sync(&project)?;

    let (items, active_changes) = cache.counts()?;
    println!("{}", style("Cache contents").bold());
    println!("  BOM items:       {}", items);
    println!("  Active changes:  {}", active_changes);
    Ok(())
}
