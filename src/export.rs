use std::io;
use std::path::Path;

use csv::Writer;

use crate::error::Result;
use crate::task::Task;

const HEADER: [&str; 7] = [
    "id",
    "status",
    "priority",
    "title",
    "description",
    "created_at",
    "due_date",
];

pub fn write_csv<W: io::Write>(tasks: &[Task], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(HEADER)?;
    for task in tasks {
        writer.write_record([
            task.id.to_string(),
            task.status.to_string(),
            task.priority.to_string(),
            task.title.clone(),
            task.description.clone().unwrap_or_default(),
            task.created_at.to_rfc3339(),
            task.due_date.map_or(String::new(), |d| d.to_string()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_to_csv(tasks: &[Task], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(tasks, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, Status};
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_one_row_per_task() {
        let mut done = Task::new(
            "Write report, draft 2",
            Priority::High,
            NaiveDate::from_ymd_opt(2024, 1, 1),
            Some("for Q1".into()),
        );
        done.status = Status::Done;
        let todo = Task::new("Buy milk", Priority::Low, None, None);

        let mut out = Vec::new();
        write_csv(&[done.clone(), todo], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "id,status,priority,title,description,created_at,due_date"
        );
        assert!(lines[1].starts_with(&format!("{},done,High,\"Write report, draft 2\",for Q1,", done.id)));
        assert!(lines[1].ends_with(",2024-01-01"));
        assert!(lines[2].contains(",todo,Low,Buy milk,,"));
        assert!(lines[2].ends_with(','));
    }
}
