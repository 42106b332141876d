//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    asm::AsmCommands,
    cache::CacheCommands,
    change::ChangeCommands,
    completions::CompletionsArgs,
    config::ConfigCommands,
    contract::ContractCommands,
    import::ImportArgs,
    init::InitArgs,
    item::ItemCommands,
    map::MapCommands,
    report::ReportCommands,
    snapshot::SnapshotCommands,
    spec::SpecCommands,
    status::StatusArgs,
    task::TaskCommands,
    validate::ValidateArgs,
    vendor::VendorCommands,
};

#[derive(Parser)]
#[command(name = "bct")]
#[command(author, version, about = "BOM & Change Toolkit")]
#[command(
    long_about = "A CLI for managing bills of materials, engineering changes, and product specs as plain text files under git version control."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .bct/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new BCT project
    Init(InitArgs),

    /// BOM item management
    #[command(subcommand)]
    Item(ItemCommands),

    /// Assembly / template group management
    #[command(subcommand)]
    Asm(AsmCommands),

    /// Vendor management
    #[command(subcommand)]
    Vendor(VendorCommands),

    /// Vendor contract price management
    #[command(subcommand)]
    Contract(ContractCommands),

    /// Running change management
    #[command(subcommand)]
    Change(ChangeCommands),

    /// Product spec management (versions, submit/accept, compare, apply)
    #[command(subcommand)]
    Spec(SpecCommands),

    /// Spec group mapping management (suggest, confirm, review queue)
    #[command(subcommand)]
    Map(MapCommands),

    /// Kanban task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Import entities from CSV files
    Import(ImportArgs),

    /// BOM snapshot management
    #[command(subcommand)]
    Snapshot(SnapshotCommands),

    /// Project dashboard
    Status(StatusArgs),

    /// Validate entity files against their schemas
    Validate(ValidateArgs),

    /// Render markdown reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Entity cache management
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Show effective configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Auto,
    /// YAML documents
    Yaml,
    /// JSON array
    Json,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// Markdown table
    Md,
    /// IDs only, one per line
    Id,
}
