//! `bct asm` command - assembly / template group management

use console::style;
use miette::Result;

use crate::cli::helpers::{resolve_project, truncate_str};
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::entity::{Entity, Status};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::Config;
use crate::entities::Assembly;

#[derive(clap::Subcommand, Debug)]
pub enum AsmCommands {
    /// Create a new group
    New(NewArgs),

    /// List groups
    List(ListArgs),

    /// Show a single group by code or ID
    Show(ShowArgs),

    /// Retire a group (mark obsolete)
    Retire(RetireArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Group code (e.g. DRIVETRAIN)
    #[arg(long)]
    pub code: String,

    /// Group title
    #[arg(long)]
    pub title: String,

    /// Parent group code
    #[arg(long)]
    pub parent: Option<String>,

    /// Mark as a reusable BOM template group (mapping target)
    #[arg(long)]
    pub template: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only template groups
    #[arg(long)]
    pub template: bool,

    /// Include obsolete groups
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Group code or entity ID
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct RetireArgs {
    /// Group code or entity ID
    pub reference: String,
}

pub fn run(cmd: AsmCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AsmCommands::New(args) => run_new(args, global),
        AsmCommands::List(args) => run_list(args, global),
        AsmCommands::Show(args) => run_show(args, global),
        AsmCommands::Retire(args) => run_retire(args, global),
    }
}

pub fn load_groups(project: &crate::core::Project) -> Result<Vec<Assembly>> {
    loader::load_all(&project.entity_dir(EntityPrefix::Asm))
}

pub fn find_group(
    project: &crate::core::Project,
    reference: &str,
) -> Result<Option<(std::path::PathBuf, Assembly)>> {
    let dir = project.entity_dir(EntityPrefix::Asm);

    if let Some(found) = loader::load_entity::<Assembly>(&dir, reference)? {
        return Ok(Some(found));
    }

    for path in project.iter_entity_files(EntityPrefix::Asm) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        if let Ok(group) = serde_yml::from_str::<Assembly>(&content) {
            if group.group_code == reference {
                return Ok(Some((path, group)));
            }
        }
    }

    Ok(None)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    if find_group(&project, &args.code)?.is_some() {
        return Err(miette::miette!("group {} already exists", args.code));
    }

    let mut group = if args.template {
        Assembly::template(&args.code, &args.title, config.author())
    } else {
        Assembly::new(&args.code, &args.title, config.author())
    };
    group.parent = args.parent;

    let path = project.entity_path(EntityPrefix::Asm, group.id());
    loader::save_entity(&path, &group)?;

    if !global.quiet {
        println!(
            "{} Created group {} ({})",
            style("✓").green().bold(),
            style(&group.group_code).cyan(),
            group.id()
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut groups = load_groups(&project)?;

    if args.template {
        groups.retain(|g| g.template);
    }
    if !args.all {
        groups.retain(|g| g.status != Status::Obsolete);
    }
    groups.sort_by(|a, b| a.group_code.cmp(&b.group_code));

    let mut table = Table::new(&["Code", "Title", "Parent", "Template", "Status"], "group");
    for group in &groups {
        table.add_row(vec![
            group.group_code.clone(),
            truncate_str(&group.title, 32),
            group.parent.clone().unwrap_or_else(|| "-".to_string()),
            if group.template { "yes" } else { "no" }.to_string(),
            group.status.to_string(),
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, group)) = find_group(&project, &args.reference)? else {
        return Err(miette::miette!("no group matching '{}'", args.reference));
    };

    let yaml = serde_yml::to_string(&group)
        .map_err(|e| miette::miette!("failed to serialize group: {}", e))?;
    print!("{}", yaml);
    if global.verbose {
        println!("# file: {}", path.display());
    }
    Ok(())
}

fn run_retire(args: RetireArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, mut group)) = find_group(&project, &args.reference)? else {
        return Err(miette::miette!("no group matching '{}'", args.reference));
    };

    group.retire();
    loader::save_entity(&path, &group)?;

    if !global.quiet {
        println!(
            "{} Retired group {}",
            style("✓").green().bold(),
            style(&group.group_code).cyan()
        );
    }
    Ok(())
}
