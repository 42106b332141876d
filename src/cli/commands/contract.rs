//! `bct contract` command - vendor contract price management

use chrono::NaiveDate;
use console::style;
use miette::Result;

use crate::cli::helpers::{parse_date, resolve_project};
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::entity::Entity;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::Config;
use crate::entities::ContractPrice;

#[derive(clap::Subcommand, Debug)]
pub enum ContractCommands {
    /// Record a new contract price
    New(NewArgs),

    /// List contract prices
    List(ListArgs),

    /// Apply current contract prices to matching BOM items
    Refresh(RefreshArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Vendor short name
    #[arg(long)]
    pub vendor: String,

    /// Item code (B-code) the price applies to
    #[arg(long)]
    pub item: String,

    /// Currency code
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Contracted unit price
    #[arg(long)]
    pub price: f64,

    /// Minimum order quantity
    #[arg(long)]
    pub moq: Option<u32>,

    /// Validity start (YYYY-MM-DD)
    #[arg(long, value_parser = clap_parse_date)]
    pub from: Option<NaiveDate>,

    /// Validity end (YYYY-MM-DD)
    #[arg(long, value_parser = clap_parse_date)]
    pub to: Option<NaiveDate>,
}

fn clap_parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by vendor short name
    #[arg(long)]
    pub vendor: Option<String>,

    /// Filter by item code
    #[arg(long)]
    pub item: Option<String>,

    /// Only contracts current on this date (YYYY-MM-DD)
    #[arg(long)]
    pub current_on: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RefreshArgs {
    /// Reference date for contract validity (default: today)
    #[arg(long)]
    pub as_of: Option<String>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(cmd: ContractCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ContractCommands::New(args) => run_new(args, global),
        ContractCommands::List(args) => run_list(args, global),
        ContractCommands::Refresh(args) => run_refresh(args, global),
    }
}

pub fn load_contracts(project: &crate::core::Project) -> Result<Vec<ContractPrice>> {
    loader::load_all(&project.entity_dir(EntityPrefix::Ctr))
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    let mut contract =
        ContractPrice::new(&args.vendor, &args.item, &args.currency, args.price, config.author());
    contract.moq = args.moq;
    contract.valid_from = args.from;
    contract.valid_to = args.to;

    let path = project.entity_path(EntityPrefix::Ctr, contract.id());
    loader::save_entity(&path, &contract)?;

    if !global.quiet {
        println!(
            "{} Recorded contract {} {} {:.2}",
            style("✓").green().bold(),
            style(&contract.title).cyan(),
            contract.currency,
            contract.unit_price
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut contracts = load_contracts(&project)?;

    if let Some(vendor) = &args.vendor {
        contracts.retain(|c| &c.vendor == vendor);
    }
    if let Some(item) = &args.item {
        contracts.retain(|c| &c.item_code == item);
    }
    if let Some(date_str) = &args.current_on {
        let date = parse_date(date_str)?;
        contracts.retain(|c| c.is_current(date));
    }
    contracts.sort_by(|a, b| {
        a.item_code
            .cmp(&b.item_code)
            .then_with(|| a.vendor.cmp(&b.vendor))
    });

    let mut table = Table::new(
        &["Item", "Vendor", "Price", "Ccy", "MOQ", "From", "To", "Status"],
        "contract",
    );
    for contract in &contracts {
        table.add_row(vec![
            contract.item_code.clone(),
            contract.vendor.clone(),
            format!("{:.2}", contract.unit_price),
            contract.currency.clone(),
            contract.moq.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
            contract
                .valid_from
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            contract
                .valid_to
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            contract.status.to_string(),
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_refresh(args: RefreshArgs, global: &GlobalOpts) -> Result<()> {
    use crate::entities::CostSource;

    let project = resolve_project(&global.project)?;
    let as_of = match &args.as_of {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().date_naive(),
    };

    let contracts = load_contracts(&project)?;
    let mut updated = 0;

    for path in project.iter_entity_files(EntityPrefix::Item) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        let Ok(mut item) = serde_yml::from_str::<crate::entities::BomItem>(&content) else {
            continue;
        };

        let Some(current) = contracts
            .iter()
            .find(|c| c.item_code == item.item_code && c.is_current(as_of))
        else {
            continue;
        };

        if item.material_cost == current.unit_price && item.cost_source == CostSource::Contract {
            continue;
        }

        if !global.quiet {
            println!(
                "  {} {}: {:.2} -> {:.2} ({})",
                style("→").blue(),
                item.item_code,
                item.material_cost,
                current.unit_price,
                current.vendor
            );
        }

        if !args.dry_run {
            item.material_cost = current.unit_price;
            item.cost_source = CostSource::Contract;
            item.entity_revision += 1;
            loader::save_entity(&path, &item)?;
        }
        updated += 1;
    }

    println!(
        "{} {} item(s) {} from current contracts",
        style("✓").green().bold(),
        updated,
        if args.dry_run { "would be repriced" } else { "repriced" }
    );
    Ok(())
}
