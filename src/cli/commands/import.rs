//! `bct import` command - import entities from CSV files
//!
//! The ingestion boundary: rows are validated here so the matcher and
//! comparison engines only ever see well-formed records.

use console::style;
use csv::ReaderBuilder;
use miette::{IntoDiagnostic, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::cli::helpers::{parse_date, resolve_project};
use crate::cli::GlobalOpts;
use crate::core::entity::Entity;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::{Config, Project};
use crate::entities::item::is_valid_b_code;
use crate::entities::{BomItem, ContractPrice, CostSource, RunningChange};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Entity type to import (item, change, contract)
    #[arg(value_parser = parse_entity_type)]
    pub entity_type: Option<EntityPrefix>,

    /// CSV file to import
    pub file: Option<PathBuf>,

    /// Generate a CSV template for the entity type
    #[arg(long)]
    pub template: bool,

    /// Validate CSV without creating files
    #[arg(long)]
    pub dry_run: bool,

    /// Continue importing after errors (default: stop on first error)
    #[arg(long)]
    pub skip_errors: bool,
}

fn parse_entity_type(s: &str) -> Result<EntityPrefix, String> {
    match s.to_lowercase().as_str() {
        "item" => Ok(EntityPrefix::Item),
        "change" | "chg" | "cn" => Ok(EntityPrefix::Chg),
        "contract" | "ctr" => Ok(EntityPrefix::Ctr),
        _ => Err(format!(
            "Unsupported entity type: '{}'. Supported: item, change, contract",
            s
        )),
    }
}

/// Import statistics
#[derive(Default)]
struct ImportStats {
    rows_processed: usize,
    entities_created: usize,
    errors: usize,
    warnings: usize,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        let entity_type = args.entity_type.ok_or_else(|| {
            miette::miette!(
                "Entity type required for template generation. Usage: bct import --template item"
            )
        })?;
        return generate_template(entity_type);
    }

    let entity_type = args
        .entity_type
        .ok_or_else(|| miette::miette!("Entity type required. Usage: bct import item bom.csv"))?;

    let file_path = args
        .file
        .clone()
        .ok_or_else(|| miette::miette!("CSV file required. Usage: bct import item bom.csv"))?;

    if !file_path.exists() {
        return Err(miette::miette!("File not found: {}", file_path.display()));
    }

    let project = resolve_project(&global.project)?;

    println!(
        "{} Importing {} records from {}{}",
        style("→").blue(),
        style(entity_type.as_str()).cyan(),
        style(file_path.display()).yellow(),
        if args.dry_run {
            style(" (dry run)").dim().to_string()
        } else {
            String::new()
        }
    );
    println!();

    let stats = match entity_type {
        EntityPrefix::Item => import_items(&project, &file_path, &args)?,
        EntityPrefix::Chg => import_changes(&project, &file_path, &args)?,
        EntityPrefix::Ctr => import_contracts(&project, &file_path, &args)?,
        _ => {
            return Err(miette::miette!(
                "Import not implemented for {}",
                entity_type.as_str()
            ));
        }
    };

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows processed:   {}", style(stats.rows_processed).cyan());
    println!("  Records created:  {}", style(stats.entities_created).green());
    if stats.warnings > 0 {
        println!("  Warnings:         {}", style(stats.warnings).yellow());
    }
    if stats.errors > 0 {
        println!("  Errors:           {}", style(stats.errors).red());
    }

    if args.dry_run {
        println!();
        println!("{}", style("Dry run complete. No files were created.").yellow());
    }

    if stats.errors > 0 && !args.skip_errors {
        return Err(miette::miette!(
            "Import completed with {} error(s)",
            stats.errors
        ));
    }

    Ok(())
}

fn generate_template(entity_type: EntityPrefix) -> Result<()> {
    let (headers, example) = match entity_type {
        EntityPrefix::Item => (
            "item_code,description,group_code,quantity,level,material_cost,landing_cost,labour_cost,cost_source",
            "B100234,Chainring 42T,DRIVETRAIN,2,1,4.50,0.30,1.20,import",
        ),
        EntityPrefix::Chg => (
            "cn_number,title,owner,estimated_go_live,old_b_codes,new_b_codes,active,status_note",
            "CN-0099,Chainring vendor swap,M. Kranz,2025-06-01,B100234,B100999,true,awaiting first article",
        ),
        EntityPrefix::Ctr => (
            "vendor,item_code,currency,unit_price,moq,lead_time_days,valid_from,valid_to",
            "acme,B100234,USD,4.50,500,60,2025-01-01,2025-12-31",
        ),
        _ => return Err(miette::miette!("no template for {}", entity_type.as_str())),
    };

    println!("{}", headers);
    println!("{}", example);

    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: bct import --template {} > {}.csv",
        style("→").blue(),
        entity_type.as_str().to_lowercase(),
        entity_type.as_str().to_lowercase()
    );

    Ok(())
}

fn open_reader(file_path: &PathBuf) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(file_path).into_diagnostic()?;
    Ok(ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(BufReader::new(file)))
}

fn get<'a>(record: &'a csv::StringRecord, headers: &csv::StringRecord, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .and_then(|i| record.get(i))
        .filter(|v| !v.is_empty())
}

fn row_error(stats: &mut ImportStats, args: &ImportArgs, row: usize, message: String) -> Result<()> {
    stats.errors += 1;
    println!("  {} row {}: {}", style("✗").red().bold(), row, message);
    if args.skip_errors {
        Ok(())
    } else {
        Err(miette::miette!("row {}: {}", row, message))
    }
}

/// Split a code list cell ("B100234;B100235" or "B100234 B100235")
fn split_codes(cell: &str) -> Vec<String> {
    cell.split([';', ' ', '|'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn import_items(project: &Project, file_path: &PathBuf, args: &ImportArgs) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let mut reader = open_reader(file_path)?;
    let headers = reader.headers().into_diagnostic()?.clone();
    let config = Config::load();

    let mut known_codes: HashSet<String> = super::item::load_items(project)?
        .into_iter()
        .map(|item| item.item_code)
        .collect();

    for (i, record) in reader.records().enumerate() {
        let row = i + 2; // 1-based plus header
        let record = record.into_diagnostic()?;
        stats.rows_processed += 1;

        let Some(code) = get(&record, &headers, "item_code") else {
            row_error(&mut stats, args, row, "missing item_code".to_string())?;
            continue;
        };
        let Some(description) = get(&record, &headers, "description") else {
            row_error(&mut stats, args, row, "missing description".to_string())?;
            continue;
        };
        let quantity: f64 = match get(&record, &headers, "quantity").map(str::parse) {
            Some(Ok(q)) => q,
            _ => {
                row_error(&mut stats, args, row, "missing or invalid quantity".to_string())?;
                continue;
            }
        };

        if !known_codes.insert(code.to_string()) {
            row_error(&mut stats, args, row, format!("item {} already exists", code))?;
            continue;
        }

        if !is_valid_b_code(code) {
            stats.warnings += 1;
            println!(
                "  {} row {}: '{}' does not look like a B-code",
                style("!").yellow(),
                row,
                code
            );
        }

        let mut item = BomItem::new(code, description, quantity, config.author());
        item.cost_source = CostSource::Import;
        if let Some(group) = get(&record, &headers, "group_code") {
            item.group_code = group.to_string();
        }
        if let Some(Ok(level)) = get(&record, &headers, "level").map(str::parse) {
            item.level = level;
        }
        if let Some(Ok(cost)) = get(&record, &headers, "material_cost").map(str::parse) {
            item.material_cost = cost;
        }
        if let Some(Ok(cost)) = get(&record, &headers, "landing_cost").map(str::parse) {
            item.landing_cost = cost;
        }
        if let Some(Ok(cost)) = get(&record, &headers, "labour_cost").map(str::parse) {
            item.labour_cost = cost;
        }
        if let Some(Ok(source)) = get(&record, &headers, "cost_source").map(str::parse) {
            item.cost_source = source;
        }

        if !args.dry_run {
            let path = project.entity_path(EntityPrefix::Item, item.id());
            loader::save_entity(&path, &item)?;
        }
        stats.entities_created += 1;
    }

    Ok(stats)
}

fn import_changes(project: &Project, file_path: &PathBuf, args: &ImportArgs) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let mut reader = open_reader(file_path)?;
    let headers = reader.headers().into_diagnostic()?.clone();
    let config = Config::load();

    let mut known_cns: HashSet<String> = super::change::load_changes(project)?
        .into_iter()
        .map(|change| change.cn_number)
        .collect();

    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.into_diagnostic()?;
        stats.rows_processed += 1;

        let Some(cn) = get(&record, &headers, "cn_number") else {
            row_error(&mut stats, args, row, "missing cn_number".to_string())?;
            continue;
        };
        let Some(title) = get(&record, &headers, "title") else {
            row_error(&mut stats, args, row, "missing title".to_string())?;
            continue;
        };
        let go_live = match get(&record, &headers, "estimated_go_live").map(parse_date) {
            Some(Ok(d)) => d,
            _ => {
                row_error(
                    &mut stats,
                    args,
                    row,
                    "missing or invalid estimated_go_live".to_string(),
                )?;
                continue;
            }
        };

        if !known_cns.insert(cn.to_string()) {
            row_error(&mut stats, args, row, format!("change {} already exists", cn))?;
            continue;
        }

        let mut change = RunningChange::new(cn, title, go_live, config.author());
        if let Some(owner) = get(&record, &headers, "owner") {
            change.owner = Some(owner.to_string());
        }
        if let Some(cell) = get(&record, &headers, "old_b_codes") {
            change.old_b_codes = split_codes(cell);
        }
        if let Some(cell) = get(&record, &headers, "new_b_codes") {
            change.new_b_codes = split_codes(cell);
        }
        if let Some(active) = get(&record, &headers, "active") {
            change.active = matches!(active.to_lowercase().as_str(), "true" | "yes" | "1");
        }
        if let Some(note) = get(&record, &headers, "status_note") {
            change.status_note = Some(note.to_string());
        }

        if change.old_b_codes.is_empty() {
            stats.warnings += 1;
            println!(
                "  {} row {}: {} has no old B-codes and will match no BOM items",
                style("!").yellow(),
                row,
                change.cn_number
            );
        }
        for code in change.old_b_codes.iter().chain(&change.new_b_codes) {
            if !is_valid_b_code(code) {
                stats.warnings += 1;
                println!(
                    "  {} row {}: '{}' does not look like a B-code",
                    style("!").yellow(),
                    row,
                    code
                );
            }
        }

        if !args.dry_run {
            let path = project.entity_path(EntityPrefix::Chg, change.id());
            loader::save_entity(&path, &change)?;
        }
        stats.entities_created += 1;
    }

    Ok(stats)
}

fn import_contracts(
    project: &Project,
    file_path: &PathBuf,
    args: &ImportArgs,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let mut reader = open_reader(file_path)?;
    let headers = reader.headers().into_diagnostic()?.clone();
    let config = Config::load();

    for (i, record) in reader.records().enumerate() {
        let row = i + 2;
        let record = record.into_diagnostic()?;
        stats.rows_processed += 1;

        let Some(vendor) = get(&record, &headers, "vendor") else {
            row_error(&mut stats, args, row, "missing vendor".to_string())?;
            continue;
        };
        let Some(item_code) = get(&record, &headers, "item_code") else {
            row_error(&mut stats, args, row, "missing item_code".to_string())?;
            continue;
        };
        let currency = get(&record, &headers, "currency").unwrap_or("USD");
        let unit_price: f64 = match get(&record, &headers, "unit_price").map(str::parse) {
            Some(Ok(p)) => p,
            _ => {
                row_error(&mut stats, args, row, "missing or invalid unit_price".to_string())?;
                continue;
            }
        };

        let mut contract =
            ContractPrice::new(vendor, item_code, currency, unit_price, config.author());
        if let Some(Ok(moq)) = get(&record, &headers, "moq").map(str::parse) {
            contract.moq = Some(moq);
        }
        if let Some(Ok(days)) = get(&record, &headers, "lead_time_days").map(str::parse) {
            contract.lead_time_days = Some(days);
        }
        if let Some(Ok(date)) = get(&record, &headers, "valid_from").map(parse_date) {
            contract.valid_from = Some(date);
        }
        if let Some(Ok(date)) = get(&record, &headers, "valid_to").map(parse_date) {
            contract.valid_to = Some(date);
        }

        if !args.dry_run {
            let path = project.entity_path(EntityPrefix::Ctr, contract.id());
            loader::save_entity(&path, &contract)?;
        }
        stats.entities_created += 1;
    }

    Ok(stats)
}
