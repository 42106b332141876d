//! `bct snapshot` command - BOM snapshot management

use console::style;
use miette::Result;

use crate::cli::helpers::resolve_project;
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::snapshot::{diff_snapshots, BomSnapshot, SnapshotChangeKind, SnapshotStore};
use crate::core::Config;

#[derive(clap::Subcommand, Debug)]
pub enum SnapshotCommands {
    /// Freeze the current BOM under a label
    Create(CreateArgs),

    /// List snapshots
    List,

    /// Compare two snapshots
    Compare(CompareArgs),

    /// Show a snapshot summary
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Snapshot label (e.g. pre-dtx)
    pub label: String,

    /// Message describing the snapshot
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Older snapshot label
    pub from: String,

    /// Newer snapshot label
    pub to: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Snapshot label
    pub label: String,
}

pub fn run(cmd: SnapshotCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SnapshotCommands::Create(args) => run_create(args, global),
        SnapshotCommands::List => run_list(global),
        SnapshotCommands::Compare(args) => run_compare(args, global),
        SnapshotCommands::Show(args) => run_show(args, global),
    }
}

fn run_create(args: CreateArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    let items = super::item::load_items(&project)?;
    let mut snapshot = BomSnapshot::new(&args.label, items, config.author());
    snapshot.message = args.message;

    let store = SnapshotStore::new(project.snapshot_dir());
    store.write(&snapshot).map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Snapshot {} frozen ({} item(s), total {:.2})",
            style("✓").green().bold(),
            style(&snapshot.label).cyan(),
            snapshot.items.len(),
            snapshot.total_cost()
        );
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let store = SnapshotStore::new(project.snapshot_dir());

    let snapshots = store.list().map_err(|e| miette::miette!("{}", e))?;
    if snapshots.is_empty() {
        println!(
            "{}",
            style("No snapshots yet. Create one with: bct snapshot create <label>").yellow()
        );
        return Ok(());
    }

    let mut table = Table::new(&["Label", "Created"], "snapshot");
    for (label, created) in &snapshots {
        table.add_row(vec![
            label.clone(),
            created.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_compare(args: CompareArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let store = SnapshotStore::new(project.snapshot_dir());

    let from = store.load(&args.from).map_err(|e| miette::miette!("{}", e))?;
    let to = store.load(&args.to).map_err(|e| miette::miette!("{}", e))?;

    let changes = diff_snapshots(&from, &to);
    if changes.is_empty() {
        println!(
            "{}",
            style(format!("No BOM changes between {} and {}.", args.from, args.to)).green()
        );
        return Ok(());
    }

    println!(
        "{} {} .. {}\n",
        style("Comparing:").bold(),
        style(&args.from).cyan(),
        style(&args.to).cyan()
    );

    let mut added = 0;
    let mut removed = 0;
    let mut modified = 0;

    let mut table = Table::new(&["Item", "Change", "Detail"], "change");
    for change in &changes {
        let (kind, detail) = match &change.kind {
            SnapshotChangeKind::Added => {
                added += 1;
                ("added".to_string(), String::new())
            }
            SnapshotChangeKind::Removed => {
                removed += 1;
                ("removed".to_string(), String::new())
            }
            SnapshotChangeKind::QuantityChanged { from, to } => {
                modified += 1;
                ("qty".to_string(), format!("{} -> {}", from, to))
            }
            SnapshotChangeKind::CostChanged { from, to } => {
                modified += 1;
                ("cost".to_string(), format!("{:.2} -> {:.2}", from, to))
            }
        };
        table.add_row(vec![change.item_code.clone(), kind, detail]);
    }
    table.print(global.format, true);

    println!();
    println!(
        "{} {} added, {} removed, {} modified | total cost {:.2} -> {:.2}",
        style("Summary:").bold(),
        style(added).green(),
        style(removed).red(),
        style(modified).yellow(),
        from.total_cost(),
        to.total_cost()
    );
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let store = SnapshotStore::new(project.snapshot_dir());

    let snapshot = store.load(&args.label).map_err(|e| miette::miette!("{}", e))?;

    println!("{} {}", style("Snapshot:").bold(), style(&snapshot.label).cyan());
    println!("Created:  {}", snapshot.created.format("%Y-%m-%d %H:%M"));
    println!("Author:   {}", snapshot.author);
    if let Some(message) = &snapshot.message {
        println!("Message:  {}", message);
    }
    println!("Items:    {}", snapshot.items.len());
    println!("Total:    {:.2}", snapshot.total_cost());

    if global.verbose {
        println!();
        let mut table = Table::new(&["Code", "Description", "Qty", "Ext"], "item");
        for item in &snapshot.items {
            table.add_row(vec![
                item.item_code.clone(),
                crate::cli::helpers::truncate_str(&item.description, 32),
                format!("{}", item.quantity),
                format!("{:.2}", item.extended_cost()),
            ]);
        }
        table.print(global.format, global.quiet);
    }
    Ok(())
}
