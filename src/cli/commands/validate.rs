//! `bct validate` command - validate entity files against their schemas

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::resolve_project;
use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::schema::Validator;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Specific files to validate (default: every entity file)
    pub paths: Vec<PathBuf>,

    /// Only validate one entity type (item, asm, vnd, ctr, chg, spec, map, task)
    #[arg(long, short = 't')]
    pub entity_type: Option<String>,

    /// Stop at the first invalid file
    #[arg(long)]
    pub fail_fast: bool,

    /// Only print the summary line
    #[arg(long)]
    pub summary: bool,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let validator = Validator::new();

    let type_filter: Option<EntityPrefix> = match &args.entity_type {
        Some(s) => Some(
            s.parse()
                .map_err(|e| miette::miette!("{}", e))?,
        ),
        None => None,
    };

    let files: Vec<PathBuf> = if args.paths.is_empty() {
        let mut files = Vec::new();
        for prefix in EntityPrefix::all() {
            if type_filter.is_some() && type_filter != Some(*prefix) {
                continue;
            }
            files.extend(project.iter_entity_files(*prefix));
        }
        // vendors/ walks into vendors/contracts/; drop the duplicates
        files.sort();
        files.dedup();
        files
    } else {
        args.paths.clone()
    };

    let mut checked = 0;
    let mut invalid = 0;

    for path in &files {
        let Some(prefix) = EntityPrefix::from_path(path) else {
            if !args.summary {
                println!(
                    "  {} {}: cannot determine entity type, skipped",
                    style("?").dim(),
                    path.display()
                );
            }
            continue;
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;

        checked += 1;
        let result = validator.validate(&content, prefix);

        if result.valid {
            if global.verbose && !args.summary {
                println!("  {} {}", style("✓").green(), path.display());
            }
            continue;
        }

        invalid += 1;
        if !args.summary {
            println!("  {} {}", style("✗").red().bold(), path.display());
            for issue in &result.issues {
                if issue.path.is_empty() {
                    println!("      {}", issue.message);
                } else {
                    println!("      {}: {}", style(&issue.path).cyan(), issue.message);
                }
            }
        }

        if args.fail_fast {
            break;
        }
    }

    println!();
    if invalid == 0 {
        println!(
            "{} {} file(s) validated, all OK",
            style("✓").green().bold(),
            checked
        );
        Ok(())
    } else {
        println!(
            "{} {} file(s) validated, {} invalid",
            style("✗").red().bold(),
            checked,
            invalid
        );
        Err(miette::miette!("{} invalid file(s)", invalid))
    }
}
