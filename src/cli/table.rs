//! Table formatting utilities for CLI list commands
//!
//! One table writer behind every entity list command, rendering to the
//! format picked by the global `--format` flag. CSV, TSV, and ID formats
//! stay single-line for pipability.

use console::style;

use crate::cli::helpers::escape_csv;
use crate::cli::OutputFormat;

/// A table ready to render: header row plus data rows
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Noun for the summary line (e.g. "item")
    noun: String,
}

impl Table {
    pub fn new(headers: &[&str], noun: &str) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            noun: noun.to_string(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render to stdout in the requested format
    pub fn print(&self, format: OutputFormat, quiet: bool) {
        match format {
            OutputFormat::Auto => self.print_auto(quiet),
            OutputFormat::Csv => self.print_delimited(","),
            OutputFormat::Tsv => self.print_delimited("\t"),
            OutputFormat::Md => self.print_md(),
            OutputFormat::Id => self.print_ids(),
            OutputFormat::Json => self.print_json(),
            OutputFormat::Yaml => self.print_yaml(),
        }
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() && cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }
        widths
    }

    fn print_auto(&self, quiet: bool) {
        let widths = self.column_widths();

        let header_line: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", h, width = w))
            .collect();
        println!("{}", style(header_line.join("  ")).bold());
        println!(
            "{}",
            style("-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)))
                .dim()
        );

        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = w))
                .collect();
            println!("{}", line.join("  "));
        }

        if !quiet {
            println!();
            println!(
                "{} {}(s) found",
                style(self.rows.len()).cyan(),
                self.noun
            );
        }
    }

    fn print_delimited(&self, sep: &str) {
        println!(
            "{}",
            self.headers
                .iter()
                .map(|h| escape_csv(h))
                .collect::<Vec<_>>()
                .join(sep)
        );
        for row in &self.rows {
            println!(
                "{}",
                row.iter()
                    .map(|c| escape_csv(c))
                    .collect::<Vec<_>>()
                    .join(sep)
            );
        }
    }

    fn print_md(&self) {
        println!("| {} |", self.headers.join(" | "));
        println!(
            "|{}|",
            self.headers
                .iter()
                .map(|_| "---")
                .collect::<Vec<_>>()
                .join("|")
        );
        for row in &self.rows {
            println!("| {} |", row.join(" | "));
        }
    }

    fn print_ids(&self) {
        for row in &self.rows {
            if let Some(first) = row.first() {
                println!("{}", first);
            }
        }
    }

    fn to_json(&self) -> serde_json::Value {
        let objects: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let map: serde_json::Map<String, serde_json::Value> = self
                    .headers
                    .iter()
                    .zip(row)
                    .map(|(h, c)| {
                        (
                            h.to_lowercase().replace(' ', "_"),
                            serde_json::Value::String(c.clone()),
                        )
                    })
                    .collect();
                serde_json::Value::Object(map)
            })
            .collect();
        serde_json::Value::Array(objects)
    }

    fn print_json(&self) {
        match serde_json::to_string_pretty(&self.to_json()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("failed to serialize table: {}", e),
        }
    }

    fn print_yaml(&self) {
        match serde_yml::to_string(&self.to_json()) {
            Ok(yaml) => print!("{}", yaml),
            Err(e) => eprintln!("failed to serialize table: {}", e),
        }
    }
}
