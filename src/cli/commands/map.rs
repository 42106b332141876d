//! `bct map` command - spec group mapping management

use console::style;
use dialoguer::MultiSelect;
use miette::Result;

use crate::cli::helpers::{parse_code_list, resolve_project};
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::core::{Config, Project};
use crate::engine::{suggest_groups, MappingStore, SuggestionSource};
use crate::entities::Selection;

#[derive(clap::Subcommand, Debug)]
pub enum MapCommands {
    /// Suggest template groups for a spec option
    Suggest(SuggestArgs),

    /// Confirm a mapping (sets confidence to 1.0)
    Confirm(ConfirmArgs),

    /// List known mappings
    List(ListArgs),

    /// Show the low-confidence review queue
    Queue,
}

#[derive(clap::Args, Debug)]
pub struct SuggestArgs {
    /// Category (e.g. Frame)
    pub category: String,

    /// Option value (e.g. Carbon)
    pub option_value: String,

    /// Bike type (default: from project metadata)
    #[arg(long)]
    pub bike_type: Option<String>,

    /// Seed an unconfirmed mapping record from the suggestion
    #[arg(long)]
    pub save: bool,
}

#[derive(clap::Args, Debug)]
pub struct ConfirmArgs {
    /// Category (e.g. Frame)
    pub category: String,

    /// Option value (e.g. Carbon)
    pub option_value: String,

    /// Template group codes (comma-separated); omit to pick interactively
    #[arg(long)]
    pub groups: Option<String>,

    /// Bike type (default: from project metadata)
    #[arg(long)]
    pub bike_type: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by bike type
    #[arg(long)]
    pub bike_type: Option<String>,
}

pub fn run(cmd: MapCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MapCommands::Suggest(args) => run_suggest(args, global),
        MapCommands::Confirm(args) => run_confirm(args, global),
        MapCommands::List(args) => run_list(args, global),
        MapCommands::Queue => run_queue(global),
    }
}

fn store_for(project: &Project) -> MappingStore {
    MappingStore::new(project.entity_dir(EntityPrefix::Map))
        .with_global(Config::global_mapping_dir())
}

fn resolve_bike_type(project: &Project, explicit: Option<String>) -> Result<String> {
    if let Some(bt) = explicit {
        return Ok(bt);
    }
    let meta = project.meta().map_err(|e| miette::miette!("{}", e))?;
    if meta.bike_type.is_empty() {
        return Err(miette::miette!(
            "no bike type configured. Pass --bike-type or set it in .bct/project.yaml."
        ));
    }
    Ok(meta.bike_type)
}

/// The working spec's selections, used as heuristic context
fn spec_context(project: &Project) -> Vec<Selection> {
    super::spec::load_working_spec(project)
        .ok()
        .flatten()
        .map(|(_, spec)| spec.selections)
        .unwrap_or_default()
}

fn run_suggest(args: SuggestArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();
    let bike_type = resolve_bike_type(&project, args.bike_type)?;

    let store = store_for(&project);
    let index = store.load_index().map_err(|e| miette::miette!("{}", e))?;
    let context = spec_context(&project);

    let suggestion = suggest_groups(&index, &bike_type, &args.category, &args.option_value, &context);

    match suggestion.source {
        SuggestionSource::Learned => {
            println!(
                "{} learned mapping ({} confidence, {} band):",
                style("✓").green().bold(),
                suggestion.confidence,
                suggestion.band(&config.mapping)
            );
        }
        SuggestionSource::Heuristic => {
            println!(
                "{} heuristic proposal from sibling selections ({} confidence, {} band):",
                style("?").yellow().bold(),
                suggestion.confidence,
                suggestion.band(&config.mapping)
            );
        }
        SuggestionSource::Unmapped => {
            println!(
                "{} no mapping for {}/{}/{} - needs manual mapping",
                style("✗").red().bold(),
                bike_type,
                args.category,
                args.option_value
            );
            println!(
                "  confirm one with: bct map confirm \"{}\" \"{}\" --groups CODE1,CODE2",
                args.category, args.option_value
            );
            return Ok(());
        }
    }

    for code in &suggestion.group_codes {
        println!("  {}", style(code).cyan());
    }

    if args.save && suggestion.source == SuggestionSource::Heuristic {
        let seeded = store
            .record_suggestion(
                &bike_type,
                &args.category,
                &args.option_value,
                suggestion.group_codes.clone(),
                &config.author(),
            )
            .map_err(|e| miette::miette!("{}", e))?;
        if seeded.is_some() && !global.quiet {
            println!(
                "{} Seeded unconfirmed mapping (confirm it to raise confidence)",
                style("✓").green()
            );
        }
    }

    Ok(())
}

fn pick_groups_interactively(project: &Project) -> Result<Vec<String>> {
    let mut groups = super::asm::load_groups(project)?;
    groups.retain(|g| g.template && g.status != crate::core::Status::Obsolete);
    groups.sort_by(|a, b| a.group_code.cmp(&b.group_code));

    if groups.is_empty() {
        return Err(miette::miette!(
            "no template groups exist. Create some with 'bct asm new --template'."
        ));
    }

    let labels: Vec<String> = groups
        .iter()
        .map(|g| format!("{} - {}", g.group_code, g.title))
        .collect();

    let picked = MultiSelect::new()
        .with_prompt("Select template groups for this option")
        .items(&labels)
        .interact()
        .map_err(|e| miette::miette!("prompt failed: {}", e))?;

    Ok(picked
        .into_iter()
        .map(|i| groups[i].group_code.clone())
        .collect())
}

fn run_confirm(args: ConfirmArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();
    let bike_type = resolve_bike_type(&project, args.bike_type)?;

    let group_codes = match &args.groups {
        Some(list) => parse_code_list(list),
        None => pick_groups_interactively(&project)?,
    };

    // Empty selections are a caller error, rejected before storage
    if group_codes.is_empty() {
        return Err(miette::miette!(
            "cannot confirm a mapping with no group codes"
        ));
    }

    let store = store_for(&project);
    let mapping = store
        .save_mapping(
            &bike_type,
            &args.category,
            &args.option_value,
            group_codes,
            &config.author(),
        )
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Confirmed {} -> [{}] (confidence 1.0, used {}x)",
            style("✓").green().bold(),
            style(mapping.key().to_string()).cyan(),
            mapping.group_codes.join(", "),
            mapping.usage_count
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    let store = store_for(&project);
    let mut mappings = store.load_all().map_err(|e| miette::miette!("{}", e))?;

    if let Some(bike_type) = &args.bike_type {
        mappings.retain(|m| &m.bike_type == bike_type);
    }
    mappings.sort_by(|a, b| a.key().to_string().cmp(&b.key().to_string()));

    let mut table = Table::new(
        &["Bike", "Category", "Option", "Groups", "Confidence", "Band", "Used"],
        "mapping",
    );
    for mapping in &mappings {
        table.add_row(vec![
            mapping.bike_type.clone(),
            mapping.category.clone(),
            mapping.option_value.clone(),
            mapping.group_codes.join(" "),
            format!("{:.2}", mapping.confidence),
            crate::engine::ConfidenceBand::classify(mapping.confidence, &config.mapping)
                .to_string(),
            mapping.usage_count.to_string(),
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_queue(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    let store = store_for(&project);
    let index = store.load_index().map_err(|e| miette::miette!("{}", e))?;
    let queue = index.low_confidence(&config.mapping);

    if queue.is_empty() {
        println!("{}", style("No low-confidence mappings to review.").green());
        return Ok(());
    }

    let mut table = Table::new(
        &["Bike", "Category", "Option", "Groups", "Confidence"],
        "mapping to review",
    );
    for mapping in &queue {
        table.add_row(vec![
            mapping.bike_type.clone(),
            mapping.category.clone(),
            mapping.option_value.clone(),
            mapping.group_codes.join(" "),
            format!("{:.2}", mapping.confidence),
        ]);
    }
    table.print(global.format, global.quiet);

    if !global.quiet {
        println!();
        println!(
            "confirm one with: bct map confirm <category> <option> --groups CODE1,CODE2"
        );
    }
    Ok(())
}
