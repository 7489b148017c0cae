//! Import tasks from flat comma-separated text.
//!
//! The first line names the columns; every later non-blank line is one task.
//! Fields are split on bare commas and trimmed. There is no quoting, so a
//! comma inside a value shifts the row and it is usually rejected for having
//! the wrong number of fields.
//!
//! Rows are skipped, never fatal: a wrong field count or an empty `title`
//! only bumps a counter in the returned [`ImportSummary`].

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::storage::Storage;
use crate::store::TaskStore;
use crate::task::{Status, TaskInput};
use crate::Result;

/// Counts from one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_blank: usize,
    pub rejected_field_count: usize,
    pub rejected_missing_title: usize,
}

impl ImportSummary {
    pub fn rejected(&self) -> usize {
        self.rejected_field_count + self.rejected_missing_title
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} imported, {} rejected ({} wrong field count, {} missing title)",
            self.imported,
            self.rejected(),
            self.rejected_field_count,
            self.rejected_missing_title
        )
    }
}

/// Parse `text` into task inputs without touching any store.
pub fn parse_csv(text: &str) -> (Vec<TaskInput>, ImportSummary) {
    let mut summary = ImportSummary::default();
    let mut inputs = Vec::new();

    let mut lines = text.split('\n');
    let Some(header_line) = lines.next() else {
        return (inputs, summary);
    };
    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

    for (offset, line) in lines.enumerate() {
        let line_no = offset + 2;
        if line.trim().is_empty() {
            summary.skipped_blank += 1;
            continue;
        }

        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        if values.len() != headers.len() {
            debug!(
                line = line_no,
                expected = headers.len(),
                found = values.len(),
                "skipping row with wrong field count"
            );
            summary.rejected_field_count += 1;
            continue;
        }

        let record: HashMap<&str, &str> = headers.iter().copied().zip(values).collect();
        match record_to_input(&record, line_no) {
            Some(input) => inputs.push(input),
            None => {
                debug!(line = line_no, "skipping row without a title");
                summary.rejected_missing_title += 1;
            }
        }
    }

    (inputs, summary)
}

/// Parse `text` and create one task per accepted row.
pub fn import_csv<S: Storage>(store: &mut TaskStore<S>, text: &str) -> Result<ImportSummary> {
    let (inputs, mut summary) = parse_csv(text);
    for input in inputs {
        store.create(input)?;
        summary.imported += 1;
    }
    info!(%summary, "csv import finished");
    Ok(summary)
}

/// Read a CSV file and import it.
pub fn import_file<S: Storage>(store: &mut TaskStore<S>, path: &Path) -> Result<ImportSummary> {
    let text = fs::read_to_string(path)?;
    import_csv(store, &text)
}

fn field<'a>(record: &HashMap<&str, &'a str>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| record.get(name).copied())
        .filter(|value| !value.is_empty())
}

fn record_to_input(record: &HashMap<&str, &str>, line_no: usize) -> Option<TaskInput> {
    let title = field(record, &["title"])?;
    let mut input = TaskInput::new(title);

    if let Some(description) = field(record, &["description"]) {
        input = input.with_description(description);
    }

    if let Some(due) = field(record, &["dueDate", "due_date", "due"]) {
        match NaiveDate::parse_from_str(due, "%Y-%m-%d") {
            Ok(date) => input = input.with_due_date(date),
            Err(_) => warn!(line = line_no, value = due, "ignoring unparseable due date"),
        }
    }

    if let Some(estimate) = field(record, &["timeEstimate", "time_estimate", "estimate"]) {
        match estimate.parse::<f64>() {
            Ok(hours) if hours.is_finite() => input = input.with_time_estimate(hours),
            _ => warn!(line = line_no, value = estimate, "ignoring unparseable time estimate"),
        }
    }

    if let Some(status) = field(record, &["status"]) {
        match Status::parse(status) {
            Some(status) => input = input.with_status(status),
            None => warn!(line = line_no, value = status, "unknown status, using To Do"),
        }
    }

    Some(input)
}
