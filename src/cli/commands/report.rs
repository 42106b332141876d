//! `bct report` command - markdown reports rendered from embedded templates

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_embed::RustEmbed;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};
use tera::Tera;

use crate::cli::helpers::resolve_project;
use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::core::{Config, FsSpecHistory};
use crate::engine::{compare_specs, find_affected_items, CategoryTaxonomy, MappingStore};

/// Report templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.tera"]
struct EmbeddedTemplates;

#[derive(clap::Subcommand, Debug)]
pub enum ReportCommands {
    /// Running change impact report
    Affected(AffectedArgs),

    /// Spec comparison report
    Comparison(ComparisonArgs),
}

#[derive(clap::Args, Debug)]
pub struct AffectedArgs {
    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ComparisonArgs {
    /// Older version number
    pub from: u32,

    /// Newer version number
    pub to: u32,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Affected(args) => run_affected(args, global),
        ReportCommands::Comparison(args) => run_comparison(args, global),
    }
}

fn tera() -> Result<Tera> {
    let mut tera = Tera::default();
    for name in EmbeddedTemplates::iter() {
        let file = EmbeddedTemplates::get(&name)
            .ok_or_else(|| miette::miette!("missing embedded template {}", name))?;
        let source = String::from_utf8(file.data.into_owned()).into_diagnostic()?;
        tera.add_raw_template(&name, &source)
            .map_err(|e| miette::miette!("template {}: {}", name, e))?;
    }
    Ok(tera)
}

fn write_output(content: &str, output: &Option<PathBuf>, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).into_diagnostic()?;
            if !quiet {
                println!(
                    "{} Report written to {}",
                    style("✓").green().bold(),
                    style(path.display()).cyan()
                );
            }
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn run_affected(args: AffectedArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let meta = project.meta().map_err(|e| miette::miette!("{}", e))?;

    let items = super::item::load_items(&project)?;
    let mut changes = super::change::load_changes(&project)?;
    changes.retain(|c| c.active);

    let gate_date = meta.dtx_date();
    let affected = find_affected_items(&items, &changes, Utc::now(), gate_date);

    let mut context = tera::Context::new();
    context.insert(
        "project",
        &if meta.name.is_empty() {
            project.root().display().to_string()
        } else {
            meta.name.clone()
        },
    );
    context.insert("generated", &Utc::now().format("%Y-%m-%d %H:%M").to_string());
    context.insert("gate_date", &gate_date);
    context.insert("change_count", &changes.len());
    context.insert(
        "affected_count",
        &crate::engine::count_affected_items(&items, &changes),
    );
    context.insert("affected", &affected);

    let rendered = tera()?
        .render("affected.md.tera", &context)
        .map_err(|e| miette::miette!("render failed: {}", e))?;
    write_output(&rendered, &args.output, global.quiet)
}

fn run_comparison(args: ComparisonArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let meta = project.meta().map_err(|e| miette::miette!("{}", e))?;

    let history = FsSpecHistory::new(project.spec_history_dir());
    let index = MappingStore::new(project.entity_dir(EntityPrefix::Map))
        .with_global(Config::global_mapping_dir())
        .load_index()
        .map_err(|e| miette::miette!("{}", e))?;

    let comparison = compare_specs(
        &history,
        args.from,
        args.to,
        &index,
        &CategoryTaxonomy::default(),
    )
    .map_err(|e| miette::miette!("{}", e))?;

    let mut context = tera::Context::new();
    context.insert(
        "project",
        &if meta.name.is_empty() {
            project.root().display().to_string()
        } else {
            meta.name.clone()
        },
    );
    context.insert("generated", &Utc::now().format("%Y-%m-%d %H:%M").to_string());
    context.insert("comparison", &comparison);

    let rendered = tera()?
        .render("comparison.md.tera", &context)
        .map_err(|e| miette::miette!("render failed: {}", e))?;
    write_output(&rendered, &args.output, global.quiet)?;

    // Quick terminal summary table alongside a file export
    if args.output.is_some() && !global.quiet && !comparison.selection_changes.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Category", "Change", "Old", "New"]);
        for change in &comparison.selection_changes {
            let kind = format!("{:?}", change.kind).to_lowercase();
            builder.push_record([
                change.category.as_str(),
                kind.as_str(),
                change.old.as_deref().unwrap_or("-"),
                change.new.as_deref().unwrap_or("-"),
            ]);
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        println!("{}", table);
    }

    Ok(())
}
