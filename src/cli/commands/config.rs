//! `bct config` command - show effective configuration

use console::style;
use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::Config;

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective (merged) configuration
    Show,
}

pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show => run_show(),
    }
}

fn run_show() -> Result<()> {
    let config = Config::load();

    println!("{}", style("Effective configuration").bold());
    println!("  author:          {}", config.author());
    println!("  editor:          {}", config.editor());
    println!(
        "  default_format:  {}",
        config.default_format.as_deref().unwrap_or("auto")
    );
    println!("  mapping:");
    println!("    low_confidence:  {}", config.mapping.low_confidence);
    println!("    high_confidence: {}", config.mapping.high_confidence);
    if let Some(dir) = Config::global_mapping_dir() {
        println!("  global mappings: {}", dir.display());
    }
    Ok(())
}
