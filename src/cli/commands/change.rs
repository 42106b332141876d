//! `bct change` command - running change management

use chrono::{NaiveDate, Utc};
use console::style;
use miette::Result;

use crate::cli::helpers::{parse_code_list, parse_date, resolve_project, truncate_str};
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::entity::Entity;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::Config;
use crate::engine::{count_affected_items, find_affected_items};
use crate::entities::RunningChange;

#[derive(clap::Subcommand, Debug)]
pub enum ChangeCommands {
    /// Record a new running change
    New(NewArgs),

    /// List running changes
    List(ListArgs),

    /// Show a single change by CN number or ID
    Show(ShowArgs),

    /// Deactivate a change (superseded changes stay on record)
    Deactivate(DeactivateArgs),

    /// Update the free-text status note
    Note(NoteArgs),

    /// Show BOM items affected by active changes
    Affected(AffectedArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Change notice number (e.g. CN-0099)
    #[arg(long)]
    pub cn: String,

    /// Short title
    #[arg(long)]
    pub title: String,

    /// Estimated go-live date (YYYY-MM-DD)
    #[arg(long)]
    pub go_live: String,

    /// Old B-codes being replaced (comma-separated)
    #[arg(long, default_value = "")]
    pub old: String,

    /// Replacement B-codes (comma-separated)
    #[arg(long, default_value = "")]
    pub new: String,

    /// Owner / assignee
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include deactivated changes
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// CN number or entity ID
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct DeactivateArgs {
    /// CN number or entity ID
    pub reference: String,

    /// Status note explaining the deactivation
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NoteArgs {
    /// CN number or entity ID
    pub reference: String,

    /// New status note
    pub note: String,
}

#[derive(clap::Args, Debug)]
pub struct AffectedArgs {
    /// Reference date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub as_of: Option<String>,

    /// Gate name for lateness flagging (default: DTx from project metadata)
    #[arg(long, default_value = "DTx")]
    pub gate: String,

    /// Ignore gate dates entirely
    #[arg(long)]
    pub no_gate: bool,

    /// Print only the count of affected items (badge variant)
    #[arg(long)]
    pub count: bool,
}

pub fn run(cmd: ChangeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ChangeCommands::New(args) => run_new(args, global),
        ChangeCommands::List(args) => run_list(args, global),
        ChangeCommands::Show(args) => run_show(args, global),
        ChangeCommands::Deactivate(args) => run_deactivate(args, global),
        ChangeCommands::Note(args) => run_note(args, global),
        ChangeCommands::Affected(args) => run_affected(args, global),
    }
}

pub fn load_changes(project: &crate::core::Project) -> Result<Vec<RunningChange>> {
    loader::load_all(&project.entity_dir(EntityPrefix::Chg))
}

pub fn find_change(
    project: &crate::core::Project,
    reference: &str,
) -> Result<Option<(std::path::PathBuf, RunningChange)>> {
    let dir = project.entity_dir(EntityPrefix::Chg);

    if let Some(found) = loader::load_entity::<RunningChange>(&dir, reference)? {
        return Ok(Some(found));
    }

    for path in project.iter_entity_files(EntityPrefix::Chg) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        if let Ok(change) = serde_yml::from_str::<RunningChange>(&content) {
            if change.cn_number == reference {
                return Ok(Some((path, change)));
            }
        }
    }

    Ok(None)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    if find_change(&project, &args.cn)?.is_some() {
        return Err(miette::miette!("change {} already exists", args.cn));
    }

    let go_live = parse_date(&args.go_live)?;
    let mut change = RunningChange::new(&args.cn, &args.title, go_live, config.author());
    change.old_b_codes = parse_code_list(&args.old);
    change.new_b_codes = parse_code_list(&args.new);
    change.owner = args.owner;

    let path = project.entity_path(EntityPrefix::Chg, change.id());
    loader::save_entity(&path, &change)?;

    if !global.quiet {
        println!(
            "{} Created change {} ({})",
            style("✓").green().bold(),
            style(&change.cn_number).cyan(),
            change.id()
        );
        if change.old_b_codes.is_empty() {
            println!(
                "{}",
                style("  note: no old B-codes recorded - this change will match no BOM items")
                    .yellow()
            );
        }
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut changes = load_changes(&project)?;

    if !args.all {
        changes.retain(|c| c.active);
    }
    changes.sort_by(|a, b| a.cn_number.cmp(&b.cn_number));

    let mut table = Table::new(
        &["CN", "Title", "Owner", "Go-Live", "Old Codes", "New Codes", "Active"],
        "change",
    );
    for change in &changes {
        table.add_row(vec![
            change.cn_number.clone(),
            truncate_str(&change.title, 28),
            change.owner.clone().unwrap_or_else(|| "-".to_string()),
            change.estimated_go_live.to_string(),
            change.old_b_codes.join(" "),
            change.new_b_codes.join(" "),
            if change.active { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, change)) = find_change(&project, &args.reference)? else {
        return Err(miette::miette!("no change matching '{}'", args.reference));
    };

    let yaml = serde_yml::to_string(&change)
        .map_err(|e| miette::miette!("failed to serialize change: {}", e))?;
    print!("{}", yaml);
    if global.verbose {
        println!("# file: {}", path.display());
    }
    Ok(())
}

fn run_deactivate(args: DeactivateArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, mut change)) = find_change(&project, &args.reference)? else {
        return Err(miette::miette!("no change matching '{}'", args.reference));
    };

    if !change.active {
        println!(
            "{}",
            style(format!("{} is already inactive", change.cn_number)).yellow()
        );
        return Ok(());
    }

    change.deactivate(args.note);
    loader::save_entity(&path, &change)?;

    if !global.quiet {
        println!(
            "{} Deactivated {}",
            style("✓").green().bold(),
            style(&change.cn_number).cyan()
        );
    }
    Ok(())
}

fn run_note(args: NoteArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, mut change)) = find_change(&project, &args.reference)? else {
        return Err(miette::miette!("no change matching '{}'", args.reference));
    };

    change.status_note = Some(args.note);
    change.entity_revision += 1;
    loader::save_entity(&path, &change)?;

    if !global.quiet {
        println!(
            "{} Updated note on {}",
            style("✓").green().bold(),
            style(&change.cn_number).cyan()
        );
    }
    Ok(())
}

fn run_affected(args: AffectedArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let items = super::item::load_items(&project)?;
    let mut changes = load_changes(&project)?;
    changes.retain(|c| c.active);

    if args.count {
        println!("{}", count_affected_items(&items, &changes));
        return Ok(());
    }

    let now = match &args.as_of {
        Some(s) => parse_date(s)?
            .and_time(chrono::NaiveTime::MIN)
            .and_utc(),
        None => Utc::now(),
    };

    let gate_date: Option<NaiveDate> = if args.no_gate {
        None
    } else {
        project.meta().map_err(|e| miette::miette!("{}", e))?.gate_date(&args.gate)
    };

    let affected = find_affected_items(&items, &changes, now, gate_date);

    if affected.is_empty() {
        if !global.quiet {
            println!(
                "{}",
                style("No BOM items affected by active running changes.").green()
            );
        }
        return Ok(());
    }

    let mut table = Table::new(
        &["Item", "Description", "Qty", "CN", "Go-Live", "Days", "Live", "After Gate"],
        "affected item",
    );
    for hit in &affected {
        table.add_row(vec![
            hit.item_code.clone(),
            truncate_str(&hit.description, 28),
            format!("{}", hit.quantity),
            hit.cn_number.clone(),
            hit.estimated_go_live.to_string(),
            hit.days_until_go_live.to_string(),
            if hit.is_live { "yes" } else { "no" }.to_string(),
            if hit.is_after_gate { "YES" } else { "-" }.to_string(),
        ]);
    }
    table.print(global.format, global.quiet);

    if !global.quiet {
        let late = affected.iter().filter(|a| a.is_after_gate).count();
        if late > 0 {
            println!(
                "{}",
                style(format!(
                    "{} change pairing(s) go live after the {} gate",
                    late, args.gate
                ))
                .yellow()
            );
        }
    }
    Ok(())
}
