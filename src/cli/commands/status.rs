//! `bct status` command - project dashboard
//!
//! One screen summarizing the workspace: BOM size and cost, active running
//! changes and the affected-item badge, spec workflow state, and open
//! tasks. `--watch` re-renders whenever entity files change.

use chrono::Utc;
use console::style;
use miette::Result;
use std::time::Duration;

use crate::cli::helpers::resolve_project;
use crate::cli::GlobalOpts;
use crate::core::entity::Status;
use crate::core::watch::{BomWatcher, WatchControl};
use crate::core::{EntityCache, Project};
use crate::engine::{count_affected_items, find_affected_items};
use crate::entities::{BomItem, RunningChange};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Re-render whenever item or change files change
    #[arg(long)]
    pub watch: bool,

    /// Poll interval in seconds for --watch
    #[arg(long, default_value = "2")]
    pub interval: u64,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    // Keep the query cache in sync as a side effect of the dashboard
    let mut cache = EntityCache::open(&project)?;
    cache.sync(&project)?;

    if args.watch {
        let mut watcher = BomWatcher::new(&project, Duration::from_secs(args.interval.max(1)));
        watcher.watch(|snapshot| {
            println!();
            println!(
                "{}",
                style(format!("-- {} --", Utc::now().format("%H:%M:%S"))).dim()
            );
            if let Err(e) = render(&project, &snapshot.items, &snapshot.changes, global) {
                eprintln!("{}", e);
                return WatchControl::Stop;
            }
            WatchControl::Continue
        })?;
        return Ok(());
    }

    let items = super::item::load_items(&project)?;
    let changes = super::change::load_changes(&project)?;
    render(&project, &items, &changes, global)
}

fn render(
    project: &Project,
    items: &[BomItem],
    changes: &[RunningChange],
    global: &GlobalOpts,
) -> Result<()> {
    let meta = project.meta().map_err(|e| miette::miette!("{}", e))?;

    let title = if meta.name.is_empty() {
        project.root().display().to_string()
    } else {
        meta.name.clone()
    };
    println!("{}", style(&title).bold());
    if !meta.bike_type.is_empty() {
        println!("Bike type: {}", meta.bike_type);
    }
    for gate in &meta.gates {
        println!("Gate {}: {}", gate.name, gate.date);
    }
    println!();

    // BOM
    let active_items: Vec<&BomItem> =
        items.iter().filter(|i| i.status != Status::Obsolete).collect();
    let total_cost: f64 = active_items.iter().map(|i| i.extended_cost()).sum();
    println!(
        "{} {} item(s), total extended cost {}",
        style("BOM:").bold(),
        active_items.len(),
        style(format!("{:.2}", total_cost)).cyan()
    );

    // Running changes + affected badge
    let active_changes: Vec<RunningChange> =
        changes.iter().filter(|c| c.active).cloned().collect();
    let affected_count = count_affected_items(items, &active_changes);
    println!(
        "{} {} active, {} BOM item(s) affected",
        style("Changes:").bold(),
        active_changes.len(),
        if affected_count > 0 {
            style(affected_count).yellow().bold().to_string()
        } else {
            affected_count.to_string()
        }
    );

    if affected_count > 0 {
        let affected =
            find_affected_items(items, &active_changes, Utc::now(), meta.dtx_date());
        let late = affected.iter().filter(|a| a.is_after_gate).count();
        let live = affected.iter().filter(|a| a.is_live).count();
        if live > 0 {
            println!("  {} pairing(s) already live", live);
        }
        if late > 0 {
            println!(
                "  {}",
                style(format!("{} pairing(s) go live after DTx", late)).yellow()
            );
        }
    }

    // Spec
    match super::spec::load_working_spec(project)? {
        Some((_, spec)) => {
            println!(
                "{} {} v{} ({}), {} selection(s)",
                style("Spec:").bold(),
                spec.title,
                spec.version,
                spec.status,
                spec.selections.len()
            );
        }
        None => println!("{} none", style("Spec:").bold()),
    }

    // Tasks
    let tasks = super::task::load_tasks(project)?;
    let open = tasks.iter().filter(|t| t.is_open()).count();
    let today = Utc::now().date_naive();
    let overdue = tasks.iter().filter(|t| t.is_overdue(today)).count();
    print!("{} {} open", style("Tasks:").bold(), open);
    if overdue > 0 {
        print!(", {}", style(format!("{} overdue", overdue)).red());
    }
    println!();

    if global.verbose {
        println!();
        println!(
            "{}",
            style("run 'bct change affected' for the full impact table").dim()
        );
    }

    Ok(())
}
