//! `bct task` command - kanban task management

use chrono::Utc;
use console::style;
use miette::Result;

use crate::cli::helpers::{parse_code_list, parse_date, resolve_project, truncate_str};
use crate::cli::table::Table;
use crate::cli::GlobalOpts;
use crate::core::entity::{Entity, Priority};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::Config;
use crate::entities::{Task, TaskColumn};

#[derive(clap::Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a new task in the backlog
    New(NewArgs),

    /// List tasks
    List(ListArgs),

    /// Move a task to another column
    Move(MoveArgs),

    /// Render the kanban board
    Board,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Task title
    #[arg(long)]
    pub title: String,

    /// Assignee
    #[arg(long)]
    pub assignee: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Priority (low, medium, high, critical)
    #[arg(long, default_value = "medium")]
    pub priority: Priority,

    /// Linked item codes (comma-separated)
    #[arg(long, default_value = "")]
    pub items: String,

    /// Linked change numbers (comma-separated)
    #[arg(long, default_value = "")]
    pub changes: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by column
    #[arg(long)]
    pub column: Option<TaskColumn>,

    /// Filter by assignee
    #[arg(long)]
    pub assignee: Option<String>,

    /// Only open tasks
    #[arg(long)]
    pub open: bool,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Task ID (or unique title fragment)
    pub reference: String,

    /// Target column (backlog, todo, in_progress, review, done)
    pub column: TaskColumn,
}

pub fn run(cmd: TaskCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TaskCommands::New(args) => run_new(args, global),
        TaskCommands::List(args) => run_list(args, global),
        TaskCommands::Move(args) => run_move(args, global),
        TaskCommands::Board => run_board(global),
    }
}

pub fn load_tasks(project: &crate::core::Project) -> Result<Vec<Task>> {
    loader::load_all(&project.entity_dir(EntityPrefix::Task))
}

fn find_task(
    project: &crate::core::Project,
    reference: &str,
) -> Result<Option<(std::path::PathBuf, Task)>> {
    let dir = project.entity_dir(EntityPrefix::Task);

    if let Some(found) = loader::load_entity::<Task>(&dir, reference)? {
        return Ok(Some(found));
    }

    // Unique title-fragment match
    let mut matches = Vec::new();
    for path in project.iter_entity_files(EntityPrefix::Task) {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
        if let Ok(task) = serde_yml::from_str::<Task>(&content) {
            if task.title.to_lowercase().contains(&reference.to_lowercase()) {
                matches.push((path, task));
            }
        }
    }

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        n => Err(miette::miette!(
            "'{}' matches {} tasks; use the task ID",
            reference,
            n
        )),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let config = Config::load();

    let mut task = Task::new(&args.title, config.author());
    task.assignee = args.assignee;
    task.priority = args.priority;
    task.item_codes = parse_code_list(&args.items);
    task.change_numbers = parse_code_list(&args.changes);
    if let Some(due) = &args.due {
        task.due_date = Some(parse_date(due)?);
    }

    let path = project.entity_path(EntityPrefix::Task, task.id());
    loader::save_entity(&path, &task)?;

    if !global.quiet {
        println!(
            "{} Created task {} ({})",
            style("✓").green().bold(),
            style(&task.title).cyan(),
            task.id()
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let mut tasks = load_tasks(&project)?;

    if let Some(column) = args.column {
        tasks.retain(|t| t.column == column);
    }
    if let Some(assignee) = &args.assignee {
        tasks.retain(|t| t.assignee.as_deref() == Some(assignee.as_str()));
    }
    if args.open {
        tasks.retain(|t| t.is_open());
    }
    tasks.sort_by(|a, b| {
        a.column
            .cmp(&b.column)
            .then_with(|| b.priority.cmp(&a.priority))
    });

    let today = Utc::now().date_naive();
    let mut table = Table::new(
        &["ID", "Title", "Column", "Priority", "Assignee", "Due"],
        "task",
    );
    for task in &tasks {
        let due = match task.due_date {
            Some(d) if task.is_overdue(today) => format!("{} (overdue)", d),
            Some(d) => d.to_string(),
            None => "-".to_string(),
        };
        table.add_row(vec![
            crate::cli::helpers::format_short_id(task.id()),
            truncate_str(&task.title, 32),
            task.column.to_string(),
            task.priority.to_string(),
            task.assignee.clone().unwrap_or_else(|| "-".to_string()),
            due,
        ]);
    }
    table.print(global.format, global.quiet);
    Ok(())
}

fn run_move(args: MoveArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;

    let Some((path, mut task)) = find_task(&project, &args.reference)? else {
        return Err(miette::miette!("no task matching '{}'", args.reference));
    };

    let from = task.column;
    task.move_to(args.column);
    loader::save_entity(&path, &task)?;

    if !global.quiet {
        println!(
            "{} {} : {} -> {}",
            style("✓").green().bold(),
            style(&task.title).cyan(),
            from,
            task.column
        );
    }
    Ok(())
}

fn run_board(global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(&global.project)?;
    let tasks = load_tasks(&project)?;
    let today = Utc::now().date_naive();

    for column in TaskColumn::all() {
        let mut in_column: Vec<&Task> = tasks.iter().filter(|t| t.column == *column).collect();
        in_column.sort_by(|a, b| b.priority.cmp(&a.priority));

        println!(
            "{} {}",
            style(format!("{:=<12}", format!("{} ", column))).bold(),
            style(format!("({})", in_column.len())).dim()
        );

        for task in in_column {
            let marker = match task.priority {
                Priority::Critical => style("!!").red().bold().to_string(),
                Priority::High => style(" !").yellow().to_string(),
                _ => "  ".to_string(),
            };
            let overdue = if task.is_overdue(today) {
                style(" [overdue]").red().to_string()
            } else {
                String::new()
            };
            let assignee = task
                .assignee
                .as_deref()
                .map(|a| format!(" @{}", a))
                .unwrap_or_default();
            println!(
                "{} {}{}{}",
                marker,
                truncate_str(&task.title, 48),
                style(assignee).dim(),
                overdue
            );
        }
        println!();
    }

    if !global.quiet {
        let open = tasks.iter().filter(|t| t.is_open()).count();
        println!("{} open task(s), {} total", open, tasks.len());
    }
    Ok(())
}
