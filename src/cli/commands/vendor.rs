//! `bct vendor` command - vendor management

use console::style;
use miette::Result;

use crate::cli::helpers::{resolve_project, truncate_str};
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::entity::Entity;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::Config;
use crate::entities::Vendor;

#[derive(clap::Subcommand, Debug)]
pub enum VendorCommands {
    /// Register a new vendor
    New(NewArgs),

    /// List vendors
    List,

    /// Show a single vendor by short name or ID
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Short name used by contract prices (e.g. acme)
    #[arg(long)]
    pub short_name: String,

    /// Full vendor name
    #[arg(long)]
    pub title: String,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Typical lead time in days
    #[arg(long)]
    pub lead_time: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Vendor short name or entity ID
    pub reference: String,
}

pub fn run(cmd: VendorCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VendorCommands::New(args) => run_new(args, global),
        VendorCommands::List => run_list(global),
        VendorCommands::Show(args) => run_show(args, global),
    }
}

pub fn load_vendors(project: &crate::core::Project) -> Result<Vec<Vendor>> {
    loader::load_all(&project.entity_dir(EntityPrefix::Vnd))
}

fn find_vendor(
    project: &crate::core::Project,
    reference: &str,
) -> Result<Option<(std::path::PathBuf, Vendor)>> {
    let dir = project.entity_dir(EntityPrefix::Vnd);

    if let Some(found) = loader::load_entity::<Vendor>(&dir, reference)? {
        return Ok(Some(found));
    }

    for path in project.iter_entity_files(EntityPrefix::Vnd) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        if let Ok(vendor) = serde_yml::from_str::<Vendor>(&content) {
            if vendor.short_name == reference {
                return Ok(Some((path, vendor)));
            }
        }
    }

    Ok(None)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    if find_vendor(&project, &args.short_name)?.is_some() {
        return Err(miette::miette!("vendor {} already exists", args.short_name));
    }

    let mut vendor = Vendor::new(&args.short_name, &args.title, config.author());
    vendor.contact_email = args.email;
    vendor.lead_time_days = args.lead_time;

    let path = project.entity_path(EntityPrefix::Vnd, vendor.id());
    loader::save_entity(&path, &vendor)?;

    if !global.quiet {
        println!(
            "{} Registered vendor {} ({})",
            style("✓").green().bold(),
            style(&vendor.short_name).cyan(),
            vendor.id()
        );
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut vendors = load_vendors(&project)?;
    vendors.sort_by(|a, b| a.short_name.cmp(&b.short_name));

    let mut table = Table::new(
        &["Short Name", "Name", "Email", "Lead Days", "Status"],
        "vendor",
    );
    for vendor in &vendors {
        table.add_row(vec![
            vendor.short_name.clone(),
            truncate_str(&vendor.title, 32),
            vendor
                .contact_email
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            vendor
                .lead_time_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            vendor.status.to_string(),
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, vendor)) = find_vendor(&project, &args.reference)? else {
        return Err(miette::miette!("no vendor matching '{}'", args.reference));
    };

    let yaml = serde_yml::to_string(&vendor)
        .map_err(|e| miette::miette!("failed to serialize vendor: {}", e))?;
    print!("{}", yaml);
    if global.verbose {
        println!("# file: {}", path.display());
    }
    Ok(())
}
