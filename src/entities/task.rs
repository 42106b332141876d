//! Task entity - kanban board cards

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};

/// Kanban column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum TaskColumn {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskColumn {
    /// Board columns in display order
    pub fn all() -> &'static [TaskColumn] {
        &[
            TaskColumn::Backlog,
            TaskColumn::Todo,
            TaskColumn::InProgress,
            TaskColumn::Review,
            TaskColumn::Done,
        ]
    }
}

impl std::fmt::Display for TaskColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskColumn::Backlog => write!(f, "backlog"),
            TaskColumn::Todo => write!(f, "todo"),
            TaskColumn::InProgress => write!(f, "in_progress"),
            TaskColumn::Review => write!(f, "review"),
            TaskColumn::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for TaskColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backlog" => Ok(TaskColumn::Backlog),
            "todo" => Ok(TaskColumn::Todo),
            "in_progress" | "in-progress" | "doing" => Ok(TaskColumn::InProgress),
            "review" => Ok(TaskColumn::Review),
            "done" => Ok(TaskColumn::Done),
            _ => Err(format!(
                "Invalid column: {}. Use backlog, todo, in_progress, review, or done",
                s
            )),
        }
    }
}

/// Kanban task card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (TASK-...)
    pub id: EntityId,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Board column
    #[serde(default)]
    pub column: TaskColumn,

    /// Assignee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Priority
    #[serde(default)]
    pub priority: Priority,

    /// Linked BOM item codes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_codes: Vec<String>,

    /// Linked change notice numbers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_numbers: Vec<String>,

    /// Classification tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author name
    pub author: String,

    /// Revision counter for entity updates
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Task {
    const PREFIX: &'static str = "TASK";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        match self.column {
            TaskColumn::Backlog => "backlog",
            TaskColumn::Todo => "todo",
            TaskColumn::InProgress => "in_progress",
            TaskColumn::Review => "review",
            TaskColumn::Done => "done",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Task {
    /// Create a new task in the backlog
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Task),
            title: title.into(),
            description: None,
            column: TaskColumn::default(),
            assignee: None,
            due_date: None,
            priority: Priority::default(),
            item_codes: Vec::new(),
            change_numbers: Vec::new(),
            tags: Vec::new(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Move the task to another column
    pub fn move_to(&mut self, column: TaskColumn) {
        if self.column != column {
            self.column = column;
            self.entity_revision += 1;
        }
    }

    /// Whether the task is still open
    pub fn is_open(&self) -> bool {
        self.column != TaskColumn::Done
    }

    /// Whether the task is overdue as of the given date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date.map_or(false, |due| due < today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_task_creation() {
        let task = Task::new("Confirm CN-0099 go-live", "Test Author");
        assert!(task.id.to_string().starts_with("TASK-"));
        assert_eq!(task.column, TaskColumn::Backlog);
        assert!(task.is_open());
    }

    #[test]
    fn test_move_to_bumps_revision_once() {
        let mut task = Task::new("Card", "Author");
        task.move_to(TaskColumn::InProgress);
        task.move_to(TaskColumn::InProgress);

        assert_eq!(task.column, TaskColumn::InProgress);
        assert_eq!(task.entity_revision, 2);
    }

    #[test]
    fn test_overdue() {
        let mut task = Task::new("Card", "Author");
        task.due_date = Some(date(2025, 6, 1));

        assert!(!task.is_overdue(date(2025, 6, 1)));
        assert!(task.is_overdue(date(2025, 6, 2)));

        task.move_to(TaskColumn::Done);
        assert!(!task.is_overdue(date(2025, 6, 2)));
    }

    #[test]
    fn test_column_parsing() {
        assert_eq!("todo".parse::<TaskColumn>().unwrap(), TaskColumn::Todo);
        assert_eq!(
            "in-progress".parse::<TaskColumn>().unwrap(),
            TaskColumn::InProgress
        );
        assert!("archived".parse::<TaskColumn>().is_err());
    }

    #[test]
    fn test_task_roundtrip() {
        let mut task = Task::new("Chase vendor sample", "Author");
        task.assignee = Some("mkranz".to_string());
        task.priority = Priority::High;
        task.item_codes = vec!["B100234".to_string()];
        task.change_numbers = vec!["CN-0099".to_string()];

        let yaml = serde_yml::to_string(&task).unwrap();
        let parsed: Task = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(parsed.assignee.as_deref(), Some("mkranz"));
        assert_eq!(parsed.priority, Priority::High);
        assert_eq!(parsed.change_numbers, vec!["CN-0099"]);
    }
}
