//! `bct item` command - BOM item management

use console::style;
use miette::Result;

use crate::cli::helpers::{resolve_project, truncate_str};
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::entity::{Entity, Status};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::Config;
use crate::entities::{BomItem, CostSource};

#[derive(clap::Subcommand, Debug)]
pub enum ItemCommands {
    /// Create a new BOM item
    New(NewArgs),

    /// List BOM items
    List(ListArgs),

    /// Show a single item by code or ID
    Show(ShowArgs),

    /// Mark an item obsolete
    Obsolete(ObsoleteArgs),

    /// Show the BOM cost rollup
    Cost(CostArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item code (B-code)
    #[arg(long)]
    pub code: String,

    /// Item description
    #[arg(long)]
    pub description: String,

    /// Quantity per product unit
    #[arg(long)]
    pub qty: f64,

    /// Assembly/group code
    #[arg(long, default_value = "")]
    pub group: String,

    /// BOM tree depth
    #[arg(long, default_value = "0")]
    pub level: u32,

    /// Material cost per unit
    #[arg(long, default_value = "0")]
    pub material: f64,

    /// Landing cost per unit
    #[arg(long, default_value = "0")]
    pub landing: f64,

    /// Labour cost per unit
    #[arg(long, default_value = "0")]
    pub labour: f64,

    /// Cost source (contract, estimate, manual, import)
    #[arg(long, default_value = "manual")]
    pub source: CostSource,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by group code
    #[arg(long)]
    pub group: Option<String>,

    /// Filter by status (draft, active, obsolete)
    #[arg(long)]
    pub status: Option<Status>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Item code or entity ID
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct ObsoleteArgs {
    /// Item code or entity ID
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct CostArgs {
    /// Roll costs up per group instead of per item
    #[arg(long)]
    pub by_group: bool,
}

pub fn run(cmd: ItemCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ItemCommands::New(args) => run_new(args, global),
        ItemCommands::List(args) => run_list(args, global),
        ItemCommands::Show(args) => run_show(args, global),
        ItemCommands::Obsolete(args) => run_obsolete(args, global),
        ItemCommands::Cost(args) => run_cost(args, global),
    }
}

/// Load all items, preferring an exact item-code match for lookups
pub fn load_items(project: &crate::core::Project) -> Result<Vec<BomItem>> {
    loader::load_all(&project.entity_dir(EntityPrefix::Item))
}

fn find_item(
    project: &crate::core::Project,
    reference: &str,
) -> Result<Option<(std::path::PathBuf, BomItem)>> {
    let dir = project.entity_dir(EntityPrefix::Item);

    // Try by entity ID / filename first
    if let Some(found) = loader::load_entity::<BomItem>(&dir, reference)? {
        return Ok(Some(found));
    }

    // Fall back to exact item-code search
    for path in project.iter_entity_files(EntityPrefix::Item) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        if let Ok(item) = serde_yml::from_str::<BomItem>(&content) {
            if item.item_code == reference {
                return Ok(Some((path, item)));
            }
        }
    }

    Ok(None)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    let items = load_items(&project)?;
    if items.iter().any(|i| i.item_code == args.code) {
        return Err(miette::miette!(
            "item {} already exists. Edit it instead, or use a running change to replace it.",
            args.code
        ));
    }

    let mut item = BomItem::new(&args.code, &args.description, args.qty, config.author());
    item.group_code = args.group;
    item.level = args.level;
    item.material_cost = args.material;
    item.landing_cost = args.landing;
    item.labour_cost = args.labour;
    item.cost_source = args.source;

    let path = project.entity_path(EntityPrefix::Item, item.id());
    loader::save_entity(&path, &item)?;

    if !global.quiet {
        println!(
            "{} Created item {} ({})",
            style("✓").green().bold(),
            style(&item.item_code).cyan(),
            item.id()
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut items = load_items(&project)?;

    if let Some(group) = &args.group {
        items.retain(|i| &i.group_code == group);
    }
    if let Some(status) = args.status {
        items.retain(|i| i.status == status);
    }
    items.sort_by(|a, b| a.item_code.cmp(&b.item_code));

    let mut table = Table::new(
        &["Code", "Description", "Group", "Qty", "Unit", "Ext", "Src", "Status"],
        "item",
    );
    for item in &items {
        table.add_row(vec![
            item.item_code.clone(),
            truncate_str(&item.description, 32),
            item.group_code.clone(),
            format!("{}", item.quantity),
            format!("{:.2}", item.unit_cost()),
            format!("{:.2}", item.extended_cost()),
            item.cost_source.to_string(),
            item.status.to_string(),
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, item)) = find_item(&project, &args.reference)? else {
        return Err(miette::miette!("no item matching '{}'", args.reference));
    };

    let yaml = serde_yml::to_string(&item)
        .map_err(|e| miette::miette!("failed to serialize item: {}", e))?;
    print!("{}", yaml);
    println!("# extended_cost: {:.2}", item.extended_cost());
    if global.verbose {
        println!("# file: {}", path.display());
    }
    Ok(())
}

fn run_obsolete(args: ObsoleteArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, mut item)) = find_item(&project, &args.reference)? else {
        return Err(miette::miette!("no item matching '{}'", args.reference));
    };

    item.status = Status::Obsolete;
    item.entity_revision += 1;
    loader::save_entity(&path, &item)?;

    if !global.quiet {
        println!(
            "{} Marked {} obsolete",
            style("✓").green().bold(),
            style(&item.item_code).cyan()
        );
    }
    Ok(())
}

fn run_cost(args: CostArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut items = load_items(&project)?;
    items.retain(|i| i.status != Status::Obsolete);

    if args.by_group {
        let mut by_group: std::collections::BTreeMap<String, (usize, f64)> =
            std::collections::BTreeMap::new();
        for item in &items {
            let entry = by_group.entry(item.group_code.clone()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += item.extended_cost();
        }

        let mut table = Table::new(&["Group", "Items", "Extended Cost"], "group");
        for (group, (count, cost)) in &by_group {
            table.add_row(vec![
                if group.is_empty() { "(none)".to_string() } else { group.clone() },
                count.to_string(),
                format!("{:.2}", cost),
            ]);
        }
        table.print(global.format, global.quiet);
    }

    let total: f64 = items.iter().map(|i| i.extended_cost()).sum();
    println!(
        "{} {} item(s), total extended cost {}",
        style("Σ").bold(),
        items.len(),
        style(format!("{:.2}", total)).cyan()
    );
    Ok(())
}
