//! `bct spec` command - product spec management
//!
//! The working spec is the single YAML document in `specs/`; submitted
//! versions are frozen into `specs/history/` and drive comparisons.

use console::style;
use miette::Result;

use crate::cli::helpers::resolve_project;
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::entity::Entity;
use crate::core::history::{FsSpecHistory, SpecHistory};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::workflow::{self, SpecStatus};
use crate::core::{Config, Project};
use crate::engine::{
    apply_spec_changes, compare_specs, ApplyOptions, CategoryTaxonomy, GroupStore, MappingStore,
    SpecComparison,
};
use crate::entities::{Assembly, Spec};

#[derive(clap::Subcommand, Debug)]
pub enum SpecCommands {
    /// Create the working spec for this project
    Init(InitArgs),

    /// Show the working spec
    Show,

    /// Set a category selection on the working spec
    Set(SetArgs),

    /// Remove a category selection from the working spec
    Unset(UnsetArgs),

    /// Set a colour sub-selection on the working spec
    Colour(ColourArgs),

    /// Submit the working spec for review (freezes a version)
    Submit,

    /// Accept the submitted spec
    Accept(DecisionArgs),

    /// Reject the submitted spec (returns it to draft)
    Reject(DecisionArgs),

    /// Open the next draft version after acceptance
    Revise,

    /// List frozen spec versions
    Versions,

    /// Compare two frozen versions
    Compare(CompareArgs),

    /// Apply a comparison's BOM impacts to the template groups
    Apply(ApplyArgs),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Spec title (e.g. "MY26 Gravel Pro")
    #[arg(long)]
    pub title: String,

    /// Bike type (default: from project metadata)
    #[arg(long)]
    pub bike_type: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Category (e.g. Frame)
    pub category: String,

    /// Selected option (e.g. Carbon)
    pub option_value: String,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Category to clear
    pub category: String,
}

#[derive(clap::Args, Debug)]
pub struct ColourArgs {
    /// Part name (e.g. Fork)
    pub part_name: String,

    /// Colour value (e.g. "RAL 9005")
    pub colour: String,

    /// Finish (e.g. matte)
    #[arg(long)]
    pub finish: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DecisionArgs {
    /// Decision comment
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Older version number
    pub from: u32,

    /// Newer version number
    pub to: u32,
}

#[derive(clap::Args, Debug)]
pub struct ApplyArgs {
    /// Older version number
    pub from: u32,

    /// Newer version number
    pub to: u32,

    /// Create template groups the new selections map to
    #[arg(long)]
    pub add_groups: bool,

    /// Retire template groups the old selections mapped to
    #[arg(long)]
    pub remove_groups: bool,

    /// Create placeholder groups for unmapped options
    #[arg(long)]
    pub create_new_parts: bool,
}

pub fn run(cmd: SpecCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SpecCommands::Init(args) => run_init(args, global),
        SpecCommands::Show => run_show(global),
        SpecCommands::Set(args) => run_set(args, global),
        SpecCommands::Unset(args) => run_unset(args, global),
        SpecCommands::Colour(args) => run_colour(args, global),
        SpecCommands::Submit => run_submit(global),
        SpecCommands::Accept(args) => run_decision(args, SpecStatus::Accepted, global),
        SpecCommands::Reject(args) => run_decision(args, SpecStatus::Rejected, global),
        SpecCommands::Revise => run_revise(global),
        SpecCommands::Versions => run_versions(global),
        SpecCommands::Compare(args) => run_compare(args, global),
        SpecCommands::Apply(args) => run_apply(args, global),
    }
}

/// Load the working spec (there is at most one per project)
pub fn load_working_spec(project: &Project) -> Result<Option<(std::path::PathBuf, Spec)>> {
    for path in project.iter_entity_files(EntityPrefix::Spec) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        let spec: Spec = serde_yml::from_str(&content)
            .map_err(|e| miette::miette!("failed to parse {}: {}", path.display(), e))?;
        return Ok(Some((path, spec)));
    }
    Ok(None)
}

fn require_working_spec(project: &Project) -> Result<(std::path::PathBuf, Spec)> {
    load_working_spec(project)?
        .ok_or_else(|| miette::miette!("no working spec. Create one with 'bct spec init'."))
}

fn mapping_store(project: &Project) -> MappingStore {
    MappingStore::new(project.entity_dir(EntityPrefix::Map))
        .with_global(Config::global_mapping_dir())
}

fn run_init(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    if load_working_spec(&project)?.is_some() {
        return Err(miette::miette!(
            "a working spec already exists. Edit it with 'bct spec set'."
        ));
    }

    let bike_type = match args.bike_type {
        Some(bt) => bt,
        None => {
            let meta = project.meta().map_err(|e| miette::miette!("{}", e))?;
            if meta.bike_type.is_empty() {
                return Err(miette::miette!(
                    "no bike type configured. Pass --bike-type or set it in .bct/project.yaml."
                ));
            }
            meta.bike_type
        }
    };

    let spec = Spec::new(&args.title, &bike_type, config.author());
    let path = project.entity_path(EntityPrefix::Spec, spec.id());
    loader::save_entity(&path, &spec)?;

    if !global.quiet {
        println!(
            "{} Created working spec {} v{} ({})",
            style("✓").green().bold(),
            style(&spec.title).cyan(),
            spec.version,
            spec.bike_type
        );
    }
    Ok(())
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let (path, spec) = require_working_spec(&project)?;

    let yaml = serde_yml::to_string(&spec)
        .map_err(|e| miette::miette!("failed to serialize spec: {}", e))?;
    print!("{}", yaml);
    if global.verbose {
        println!("# file: {}", path.display());
    }
    Ok(())
}

/// Draft/rejected specs are edited in place; a rejected spec returns to
/// draft on its first edit. Submitted and accepted specs are frozen.
fn ensure_editable(spec: &mut Spec) -> Result<()> {
    match spec.status {
        SpecStatus::Draft => Ok(()),
        SpecStatus::Rejected => {
            workflow::check_transition(SpecStatus::Rejected, SpecStatus::Draft)
                .map_err(|e| miette::miette!("{}", e))?;
            spec.status = SpecStatus::Draft;
            Ok(())
        }
        SpecStatus::Submitted => Err(miette::miette!(
            "spec is submitted. Accept or reject it before editing."
        )),
        SpecStatus::Accepted => Err(miette::miette!(
            "spec v{} is accepted. Open the next version with 'bct spec revise'.",
            spec.version
        )),
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let (path, mut spec) = require_working_spec(&project)?;

    ensure_editable(&mut spec)?;
    spec.set_selection(&args.category, &args.option_value);
    loader::save_entity(&path, &spec)?;

    if !global.quiet {
        println!(
            "{} {} = {}",
            style("✓").green().bold(),
            style(&args.category).cyan(),
            args.option_value
        );
    }
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let (path, mut spec) = require_working_spec(&project)?;

    ensure_editable(&mut spec)?;
    if !spec.remove_selection(&args.category) {
        return Err(miette::miette!("no selection for category '{}'", args.category));
    }
    loader::save_entity(&path, &spec)?;

    if !global.quiet {
        println!(
            "{} Cleared {}",
            style("✓").green().bold(),
            style(&args.category).cyan()
        );
    }
    Ok(())
}

fn run_colour(args: ColourArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let (path, mut spec) = require_working_spec(&project)?;

    ensure_editable(&mut spec)?;
    spec.set_colour(&args.part_name, &args.colour, args.finish);
    loader::save_entity(&path, &spec)?;

    if !global.quiet {
        println!(
            "{} {} colour = {}",
            style("✓").green().bold(),
            style(&args.part_name).cyan(),
            args.colour
        );
    }
    Ok(())
}

fn run_submit(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();
    let (path, mut spec) = require_working_spec(&project)?;

    workflow::check_transition(spec.status, SpecStatus::Submitted)
        .map_err(|e| miette::miette!("{}", e))?;

    let history = FsSpecHistory::new(project.spec_history_dir());

    // A resubmission after rejection gets the next version number; the
    // rejected snapshot stays in history
    if let Some(latest) = history
        .latest_version()
        .map_err(|e| miette::miette!("{}", e))?
    {
        if latest >= spec.version {
            spec.version = latest + 1;
        }
    }

    // Freeze the submitted content into history first; the submission
    // record only lands once the version is safely on disk
    spec.status = SpecStatus::Submitted;
    history
        .write_version(&spec)
        .map_err(|e| miette::miette!("{}", e))?;

    loader::save_entity(&path, &spec)?;
    workflow::record_submission(&path, &config.author(), spec.version)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Submitted spec v{} (frozen into specs/history/)",
            style("✓").green().bold(),
            style(spec.version).cyan()
        );
    }
    Ok(())
}

fn run_decision(args: DecisionArgs, decision: SpecStatus, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();
    let (path, spec) = require_working_spec(&project)?;

    workflow::check_transition(spec.status, decision).map_err(|e| miette::miette!("{}", e))?;
    workflow::record_decision(&path, decision, &config.author(), args.comment.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let verb = match decision {
            SpecStatus::Accepted => "Accepted",
            SpecStatus::Rejected => "Rejected",
            _ => "Updated",
        };
        println!(
            "{} {} spec v{}",
            style("✓").green().bold(),
            verb,
            style(spec.version).cyan()
        );
        if decision == SpecStatus::Rejected {
            println!("  next edit returns the working spec to draft");
        }
    }
    Ok(())
}

fn run_revise(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let (path, mut spec) = require_working_spec(&project)?;

    if spec.status != SpecStatus::Accepted {
        return Err(miette::miette!(
            "only an accepted spec can be revised (current status: {})",
            spec.status
        ));
    }

    let history = FsSpecHistory::new(project.spec_history_dir());
    let latest = history
        .latest_version()
        .map_err(|e| miette::miette!("{}", e))?
        .unwrap_or(spec.version);

    spec.version = latest.max(spec.version) + 1;
    spec.status = SpecStatus::Draft;
    spec.entity_revision += 1;
    loader::save_entity(&path, &spec)?;

    if !global.quiet {
        println!(
            "{} Opened draft v{}",
            style("✓").green().bold(),
            style(spec.version).cyan()
        );
    }
    Ok(())
}

fn run_versions(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let history = FsSpecHistory::new(project.spec_history_dir());

    let versions = history.versions().map_err(|e| miette::miette!("{}", e))?;
    if versions.is_empty() {
        println!(
            "{}",
            style("No frozen versions yet. Submit the working spec first.").yellow()
        );
        return Ok(());
    }

    let mut table = Table::new(&["Version", "Status", "Selections", "Submitted"], "version");
    for version in versions {
        if let Some(spec) = history
            .load_version(version)
            .map_err(|e| miette::miette!("{}", e))?
        {
            table.add_row(vec![
                format!("v{}", spec.version),
                spec.status.to_string(),
                spec.selections.len().to_string(),
                spec.submissions
                    .last()
                    .map(|s| s.timestamp.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn load_comparison(project: &Project, from: u32, to: u32) -> Result<SpecComparison> {
    let history = FsSpecHistory::new(project.spec_history_dir());
    let index = mapping_store(project)
        .load_index()
        .map_err(|e| miette::miette!("{}", e))?;

    compare_specs(&history, from, to, &index, &CategoryTaxonomy::default())
        .map_err(|e| miette::miette!("{}", e))
}

fn run_compare(args: CompareArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let comparison = load_comparison(&project, args.from, args.to)?;

    if comparison.is_empty() {
        println!(
            "{}",
            style(format!(
                "No differences between v{} and v{}.",
                args.from, args.to
            ))
            .green()
        );
        return Ok(());
    }

    println!(
        "{} v{} .. v{}\n",
        style("Comparing:").bold(),
        style(args.from).cyan(),
        style(args.to).cyan()
    );

    let mut table = Table::new(&["Category", "Change", "Old", "New"], "selection change");
    for change in &comparison.selection_changes {
        table.add_row(vec![
            change.category.clone(),
            format!("{:?}", change.kind).to_lowercase(),
            change.old.clone().unwrap_or_else(|| "-".to_string()),
            change.new.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.print(global.format, true);

    if !comparison.colour_changes.is_empty() {
        println!();
        let mut colours = Table::new(&["Part", "Change", "Old", "New"], "colour change");
        for change in &comparison.colour_changes {
            colours.add_row(vec![
                change.part_name.clone(),
                format!("{:?}", change.kind).to_lowercase(),
                change.old.clone().unwrap_or_else(|| "-".to_string()),
                change.new.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
        colours.print(global.format, true);
    }

    println!();
    let mut impacts = Table::new(
        &["Category", "Option", "Add", "Remove", "New Part", "Confidence"],
        "impact",
    );
    for impact in &comparison.impacts {
        impacts.add_row(vec![
            impact.category.clone(),
            impact.option_value.clone(),
            impact.groups_to_add.join(" "),
            impact.groups_to_remove.join(" "),
            if impact.needs_new_part { "YES" } else { "-" }.to_string(),
            format!("{:.2}", impact.confidence),
        ]);
    }
    impacts.print(global.format, true);

    if !global.quiet {
        let unmapped = comparison.impacts.iter().filter(|i| i.needs_new_part).count();
        println!();
        println!(
            "{} selection change(s), {} colour change(s), {} unmapped option(s)",
            comparison.selection_changes.len(),
            comparison.colour_changes.len(),
            unmapped
        );
    }
    Ok(())
}

/// Template-group store over assembly YAML files
///
/// Removing a group retires it (marks it obsolete); groups are never
/// deleted from disk.
struct FsGroupStore<'a> {
    project: &'a Project,
    author: String,
}

impl GroupStore for FsGroupStore<'_> {
    fn has_group(&self, code: &str) -> bool {
        matches!(
            super::asm::find_group(self.project, code),
            Ok(Some((_, group))) if group.status != crate::core::Status::Obsolete
        )
    }

    fn add_group(&mut self, code: &str, source_option: &str) -> Result<(), String> {
        let group = Assembly::template(
            code,
            format!("{} (from spec option {})", code, source_option),
            &self.author,
        );
        let path = self.project.entity_path(EntityPrefix::Asm, group.id());
        loader::save_entity(&path, &group).map_err(|e| e.to_string())
    }

    fn remove_group(&mut self, code: &str) -> Result<(), String> {
        let Some((path, mut group)) =
            super::asm::find_group(self.project, code).map_err(|e| e.to_string())?
        else {
            return Err(format!("group {} not found", code));
        };
        group.retire();
        loader::save_entity(&path, &group).map_err(|e| e.to_string())
    }

    fn create_part(&mut self, category: &str, option_value: &str) -> Result<String, String> {
        let code = format!(
            "NEW-{}",
            option_value
                .to_uppercase()
                .replace(|c: char| !c.is_ascii_alphanumeric(), "-")
        );
        let group = Assembly::template(
            &code,
            format!("{}: {} (placeholder, needs mapping)", category, option_value),
            &self.author,
        );
        let path = self.project.entity_path(EntityPrefix::Asm, group.id());
        loader::save_entity(&path, &group).map_err(|e| e.to_string())?;
        Ok(code)
    }
}

fn run_apply(args: ApplyArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    let comparison = load_comparison(&project, args.from, args.to)?;
    let options = ApplyOptions {
        add_groups: args.add_groups,
        remove_groups: args.remove_groups,
        create_new_parts: args.create_new_parts,
    };

    let mut store = FsGroupStore {
        project: &project,
        author: config.author(),
    };

    let report =
        apply_spec_changes(&comparison, options, &mut store).map_err(|e| miette::miette!("{}", e))?;

    for code in &report.groups_added {
        println!("  {} added group {}", style("+").green(), code);
    }
    for code in &report.groups_removed {
        println!("  {} retired group {}", style("-").red(), code);
    }
    for code in &report.groups_skipped {
        println!("  {} skipped {} (already applied)", style("=").dim(), code);
    }
    for error in &report.errors {
        println!("  {} {}", style("✗").red().bold(), error);
    }

    println!();
    if report.success {
        println!(
            "{} Applied: {} added, {} retired, {} new part(s) created",
            style("✓").green().bold(),
            report.groups_added.len(),
            report.groups_removed.len(),
            report.new_parts_created
        );
        Ok(())
    } else {
        println!(
            "{} Partial: {} added, {} retired, {} new part(s), {} error(s)",
            style("!").yellow().bold(),
            report.groups_added.len(),
            report.groups_removed.len(),
            report.new_parts_created,
            report.errors.len()
        );
        Err(miette::miette!(
            "apply finished with {} error(s); re-run to retry the failed operations",
            report.errors.len()
        ))
    }
}
