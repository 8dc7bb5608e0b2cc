//! The task collection and its three status columns.
//!
//! The board owns one authoritative `Vec<Task>`, read from storage when the
//! board is opened. Every mutation writes the whole collection back under
//! the `tasks` key and then re-derives the columns (filter, stable sort,
//! partition by status).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::{self, KeyValueStore, TASKS_KEY};
use crate::task::{Priority, Status, Task, TaskEdit, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    CreatedAt,
    DueDate,
}

/// Keep tasks whose chosen date falls on `date` (UTC calendar day).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    pub field: DateField,
    pub date: NaiveDate,
}

impl DateFilter {
    fn matches(&self, task: &Task) -> bool {
        match self.field {
            DateField::CreatedAt => task.created_at.date_naive() == self.date,
            DateField::DueDate => task.due_date == Some(self.date),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub priority: Option<Priority>,
    pub date: Option<DateFilter>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.priority.map_or(true, |p| task.priority == p)
            && self.date.map_or(true, |d| d.matches(task))
    }

    pub fn is_active(&self) -> bool {
        self.priority.is_some() || self.date.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    #[default]
    None,
    Created,
    Due,
}

impl SortOption {
    pub fn cycled(&self) -> SortOption {
        match self {
            SortOption::None => SortOption::Created,
            SortOption::Created => SortOption::Due,
            SortOption::Due => SortOption::None,
        }
    }

    /// Ascending key; a missing due date counts as the Unix epoch.
    fn key(&self, task: &Task) -> i64 {
        match self {
            SortOption::None => 0,
            SortOption::Created => task.created_at.timestamp_millis(),
            SortOption::Due => task
                .due_date
                .map(|d| d.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
                .unwrap_or(0),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOption::None => "none",
            SortOption::Created => "created",
            SortOption::Due => "due",
        })
    }
}

impl FromStr for SortOption {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SortOption::None),
            "created" | "createdat" => Ok(SortOption::Created),
            "due" | "duedate" => Ok(SortOption::Due),
            other => Err(Error::InvalidArgument(format!("unknown sort: {other}"))),
        }
    }
}

/// A move between two positions of the displayed columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragDrop {
    pub from: Status,
    pub from_index: usize,
    pub to: Status,
    pub to_index: usize,
}

pub struct KanbanBoard<S> {
    storage: S,
    tasks: Vec<Task>,
    filter: TaskFilter,
    sort: SortOption,
    // Indices into `tasks`, one list per status in column order.
    columns: [Vec<usize>; 3],
}

impl<S: KeyValueStore> KanbanBoard<S> {
    /// Read the stored collection and derive the columns.
    pub fn open(storage: S) -> Result<Self> {
        let mut board = Self {
            storage,
            tasks: Vec::new(),
            filter: TaskFilter::default(),
            sort: SortOption::None,
            columns: Default::default(),
        };
        board.reload()?;
        Ok(board)
    }

    /// Discard the in-memory collection and read it again from storage.
    pub fn reload(&mut self) -> Result<()> {
        self.tasks = storage::read_json(&self.storage, TASKS_KEY)?.unwrap_or_default();
        debug!(count = self.tasks.len(), "loaded tasks");
        self.load_tasks();
        Ok(())
    }

    fn save_tasks(&self) -> Result<()> {
        storage::write_json(&self.storage, TASKS_KEY, &self.tasks)
    }

    /// Persist the collection. If the write fails, put back `before` so
    /// memory never holds a change storage does not.
    fn commit(&mut self, before: Vec<Task>) -> Result<()> {
        let saved = self.save_tasks();
        if let Err(err) = &saved {
            warn!(%err, "write failed, rolling back");
            self.tasks = before;
        }
        self.load_tasks();
        saved
    }

    /// Re-derive the three columns from the collection.
    pub fn load_tasks(&mut self) {
        let mut visible: Vec<usize> = (0..self.tasks.len())
            .filter(|&i| self.filter.matches(&self.tasks[i]))
            .collect();
        if self.sort != SortOption::None {
            visible.sort_by_key(|&i| self.sort.key(&self.tasks[i]));
        }

        let mut columns: [Vec<usize>; 3] = Default::default();
        for i in visible {
            columns[self.tasks[i].status.index()].push(i);
        }
        self.columns = columns;
    }

    pub fn sort_tasks(&mut self) {
        self.load_tasks();
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.load_tasks();
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
        self.sort_tasks();
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Displayed tasks with the given status, in display order.
    pub fn partition(&self, status: Status) -> Vec<&Task> {
        self.columns[status.index()]
            .iter()
            .map(|&i| &self.tasks[i])
            .collect()
    }

    pub fn partitions(&self) -> [(Status, Vec<&Task>); 3] {
        Status::ALL.map(|s| (s, self.partition(s)))
    }

    /// Per-status counts over the whole collection, ignoring the filter.
    pub fn stats(&self) -> [(Status, usize); 3] {
        Status::ALL.map(|s| (s, self.tasks.iter().filter(|t| t.status == s).count()))
    }

    /// Resolve a full id or a unique prefix of one (dashes ignored).
    pub fn find_by_prefix(&self, prefix: &str) -> Result<TaskId> {
        let needle: String = prefix
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("empty task id".to_string()));
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.to_string().replace('-', "").starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id),
            (Some(_), Some(_)) => Err(Error::AmbiguousTask(prefix.to_string())),
            (None, _) => Err(Error::TaskNotFound(prefix.to_string())),
        }
    }

    /// Append a new `todo` task. Blank titles are ignored.
    pub fn add_task(
        &mut self,
        title: &str,
        priority: Priority,
        due_date: Option<NaiveDate>,
        description: Option<String>,
    ) -> Result<Option<TaskId>> {
        let title = title.trim();
        if title.is_empty() {
            debug!("ignoring task with blank title");
            return Ok(None);
        }
        let description = description.filter(|d| !d.trim().is_empty());
        let task = Task::new(title, priority, due_date, description);
        let id = task.id;
        debug!(%id, %priority, "adding task");
        let before = self.tasks.clone();
        self.tasks.push(task);
        self.commit(before)?;
        Ok(Some(id))
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            warn!(%id, "delete of unknown task");
            return Ok(false);
        };
        let before = self.tasks.clone();
        self.tasks.remove(pos);
        debug!(%id, "deleted task");
        self.commit(before)?;
        Ok(true)
    }

    /// Enter edit mode and hand out a draft of the task's fields.
    pub fn edit_task(&mut self, id: TaskId) -> Option<TaskEdit> {
        let pos = self.position(id)?;
        let task = &mut self.tasks[pos];
        task.editing = true;
        Some(TaskEdit::from(&*task))
    }

    /// Commit a draft. A blank title leaves the task untouched and in edit
    /// mode.
    pub fn save_edit(&mut self, id: TaskId, edit: TaskEdit) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            warn!(%id, "save of unknown task");
            return Ok(false);
        };
        let title = edit.title.trim();
        if title.is_empty() {
            debug!(%id, "ignoring edit with blank title");
            return Ok(false);
        }

        let before = self.tasks.clone();
        let task = &mut self.tasks[pos];
        task.title = title.to_string();
        task.description = edit.description.filter(|d| !d.trim().is_empty());
        task.priority = edit.priority;
        task.due_date = edit.due_date;
        task.editing = false;
        debug!(%id, "saved edit");
        self.commit(before)?;
        Ok(true)
    }

    /// Leave edit mode, re-reading the stored collection so nothing
    /// uncommitted survives. Other tasks stay in edit mode.
    pub fn cancel_edit(&mut self, id: TaskId) -> Result<()> {
        let still_editing: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.editing && t.id != id)
            .map(|t| t.id)
            .collect();
        self.reload()?;
        for task in &mut self.tasks {
            task.editing = still_editing.contains(&task.id);
        }
        Ok(())
    }

    /// Move a displayed task: reorder inside a column, or transfer it to
    /// another column and take on that column's status. Target indices are
    /// clamped; an unknown source position is a no-op.
    pub fn drop_task(&mut self, event: DragDrop) -> Result<bool> {
        let mut columns = self.columns.clone();
        let source = &mut columns[event.from.index()];
        if event.from_index >= source.len() {
            warn!(?event, "drop from an empty position");
            return Ok(false);
        }
        let moved = source.remove(event.from_index);
        let before = self.tasks.clone();

        let target = &mut columns[event.to.index()];
        let at = event.to_index.min(target.len());
        target.insert(at, moved);

        if event.from != event.to {
            self.tasks[moved].status = event.to;
        }
        debug!(id = %self.tasks[moved].id, from = %event.from, to = %event.to, at, "dropped task");

        self.write_back_order(columns.concat());
        self.commit(before)?;
        Ok(true)
    }

    // Visible tasks take the slots previously held by visible tasks, in the
    // new display order; hidden tasks keep their positions.
    fn write_back_order(&mut self, order: Vec<usize>) {
        let mut is_slot = vec![false; self.tasks.len()];
        for &i in &order {
            is_slot[i] = true;
        }

        let mut old: Vec<Option<Task>> = std::mem::take(&mut self.tasks)
            .into_iter()
            .map(Some)
            .collect();
        let mut next = order.into_iter();
        let mut reordered = Vec::with_capacity(old.len());
        for pos in 0..old.len() {
            let src = if is_slot[pos] { next.next() } else { Some(pos) };
            if let Some(task) = src.and_then(|s| old[s].take()) {
                reordered.push(task);
            }
        }
        self.tasks = reordered;
    }

    /// Set a task's status directly; it joins the end of its new column.
    pub fn change_status(&mut self, id: TaskId, status: Status) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            warn!(%id, "status change of unknown task");
            return Ok(false);
        };
        if self.tasks[pos].status == status {
            return Ok(true);
        }
        let before = self.tasks.clone();
        let mut task = self.tasks.remove(pos);
        task.status = status;
        debug!(%id, %status, "changed status");
        self.tasks.push(task);
        self.commit(before)?;
        Ok(true)
    }
}
