//! `bct init` command - create a new project workspace

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::parse_date;
use crate::core::project::{Gate, Project, ProjectMeta};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Project name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Bike type this project builds (e.g. gravel, road, emtb)
    #[arg(long, default_value = "")]
    pub bike_type: String,

    /// Named gate dates, e.g. --gate DTx=2025-09-01 (repeatable)
    #[arg(long)]
    pub gate: Vec<String>,

    /// Reinitialize even if a project already exists
    #[arg(long)]
    pub force: bool,
}

fn parse_gate(arg: &str) -> Result<Gate> {
    let (name, date) = arg
        .split_once('=')
        .ok_or_else(|| miette::miette!("invalid gate '{}' (expected NAME=YYYY-MM-DD)", arg))?;
    Ok(Gate {
        name: name.trim().to_string(),
        date: parse_date(date.trim())?,
    })
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = args
        .path
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&path)
        .map_err(|e| miette::miette!("failed to create {}: {}", path.display(), e))?;

    let mut gates = Vec::new();
    for gate_arg in &args.gate {
        gates.push(parse_gate(gate_arg)?);
    }

    let meta = ProjectMeta {
        name: args.name,
        bike_type: args.bike_type,
        gates,
    };

    let project = if args.force {
        Project::init_force(&path, &meta).map_err(|e| miette::miette!("{}", e))?
    } else {
        Project::init(&path, &meta).map_err(|e| miette::miette!("{}", e))?
    };

    println!(
        "{} Initialized BCT project at {}",
        style("✓").green().bold(),
        style(project.root().display()).cyan()
    );
    println!();
    println!("Next steps:");
    println!("  {} add BOM items:        bct item new --code B100234 --description \"...\" --qty 1", style("→").blue());
    println!("  {} import a BOM CSV:     bct import item bom.csv", style("→").blue());
    println!("  {} import changes:       bct import change changes.csv", style("→").blue());
    println!("  {} see the dashboard:    bct status", style("→").blue());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gate() {
        let gate = parse_gate("DTx=2025-09-01").unwrap();
        assert_eq!(gate.name, "DTx");
        assert_eq!(
            gate.date,
            chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_gate_rejects_missing_equals() {
        assert!(parse_gate("DTx 2025-09-01").is_err());
        assert!(parse_gate("DTx=09/01/2025").is_err());
    }
}
