use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Stable id for a task saved with a numeric (millisecond timestamp) id.
    /// The same number always maps to the same id, so prefixes printed by
    /// one run still resolve in the next even before the file is rewritten.
    pub fn from_legacy(n: u64) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, n.to_string().as_bytes()))
    }

    /// First eight hex digits, enough to address a task on the command line.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::InvalidArgument(format!("not a task id: {s}")))
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::from_legacy(n)),
            Raw::Text(s) => match s.parse::<u64>() {
                Ok(n) => Ok(Self::from_legacy(n)),
                Err(_) => Uuid::parse_str(&s)
                    .map(Self)
                    .map_err(|_| serde::de::Error::custom(format!("not a task id: {s}"))),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::InvalidArgument(format!("unknown priority: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    /// Column order on the board.
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "inProgress",
            Status::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::InProgress => "IN PROGRESS",
            Status::Done => "DONE",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Status::Todo => 0,
            Status::InProgress => 1,
            Status::Done => 2,
        }
    }

    /// Neighbouring column, clamped at the board edges.
    pub fn shifted(&self, direction: isize) -> Status {
        let idx = (self.index() as isize + direction).clamp(0, Self::ALL.len() as isize - 1);
        Self::ALL[idx as usize]
    }

    /// Next status in column order, wrapping around.
    pub fn cycled(&self) -> Status {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Status::Todo),
            "inprogress" | "doing" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            _ => Err(Error::InvalidArgument(format!("unknown status: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "deserialize_due_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(skip)]
    pub editing: bool,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        priority: Priority,
        due_date: Option<NaiveDate>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            description,
            priority,
            status: Status::Todo,
            created_at: Utc::now(),
            due_date,
            editing: false,
        }
    }
}

/// The editable fields of a task, detached from the collection until saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

impl From<&Task> for TaskEdit {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date,
        }
    }
}

/// Parse a `YYYY-MM-DD` date; empty input means "no date".
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| Error::InvalidArgument(format!("not a date (YYYY-MM-DD): {raw}")))
}

// Stored collections may carry `"dueDate": ""` for tasks without a due date.
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(raw) => parse_date(&raw).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_stored_field_names() {
        let mut task = Task::new(
            "Buy milk",
            Priority::High,
            NaiveDate::from_ymd_opt(2024, 1, 1),
            None,
        );
        task.editing = true;
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["title"], "Buy milk");
        assert_eq!(json["priority"], "High");
        assert_eq!(json["status"], "todo");
        assert_eq!(json["dueDate"], "2024-01-01");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("editing").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn empty_due_date_reads_as_absent() {
        let id = TaskId::new();
        let raw = format!(
            r#"{{"id":"{id}","title":"t","priority":"Medium","status":"inProgress",
                "createdAt":"2024-03-01T10:00:00Z","dueDate":""}}"#
        );
        let task: Task = serde_json::from_str(&raw).unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.editing);
    }

    #[test]
    fn timestamp_due_date_is_truncated_to_its_day() {
        assert_eq!(
            parse_date("2024-05-06T23:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 6)
        );
        assert!(parse_date("next tuesday").is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let id = TaskId::new();
        let raw = format!(
            r#"{{"id":"{id}","title":"t","status":"blocked","createdAt":"2024-03-01T10:00:00Z"}}"#
        );
        assert!(serde_json::from_str::<Task>(&raw).is_err());
    }

    #[test]
    fn status_parsing_accepts_common_spellings() {
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("inProgress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("DONE".parse::<Status>().unwrap(), Status::Done);
        assert!("later".parse::<Status>().is_err());
    }

    #[test]
    fn status_shift_clamps_and_cycle_wraps() {
        assert_eq!(Status::Todo.shifted(-1), Status::Todo);
        assert_eq!(Status::Todo.shifted(1), Status::InProgress);
        assert_eq!(Status::Done.shifted(1), Status::Done);
        assert_eq!(Status::Done.cycled(), Status::Todo);
    }

    #[test]
    fn short_id_is_a_prefix() {
        let id = TaskId::new();
        assert!(id.to_string().replace('-', "").starts_with(&id.short()));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn numeric_ids_from_older_files_still_load() {
        let json = r#"[
            {"id": 1712345678901, "title": "a", "priority": "Low", "status": "todo",
             "createdAt": "2024-04-05T19:34:38.901Z"},
            {"id": "1712345678902", "title": "b", "priority": "Low", "status": "done",
             "createdAt": "2024-04-05T19:34:38.902Z"}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_eq!(tasks[0].id, TaskId::from_legacy(1712345678901));
        assert_eq!(tasks[1].id, TaskId::from_legacy(1712345678902));
        assert_ne!(tasks[0].id, tasks[1].id);

        // rewritten as a uuid, which reads back unchanged
        let again: Vec<Task> =
            serde_json::from_str(&serde_json::to_string(&tasks).unwrap()).unwrap();
        assert_eq!(again[0].id, tasks[0].id);

        assert!(serde_json::from_str::<TaskId>("\"not-an-id\"").is_err());
    }
}
