use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// The four workflow columns, persisted as their display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Review")]
    Review,
    #[serde(rename = "Done")]
    Done,
}

impl Status {
    /// Board order, left to right.
    pub const ALL: [Status; 4] = [Status::ToDo, Status::InProgress, Status::Review, Status::Done];

    pub fn label(&self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Review => "Review",
            Status::Done => "Done",
        }
    }

    /// Lenient parse: accepts the labels and common spellings such as
    /// `todo`, `in-progress`, `DOING` or `in_progress`.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "todo" => Some(Status::ToDo),
            "inprogress" | "doing" => Some(Status::InProgress),
            "review" => Some(Status::Review),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        Status::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or_default()
    }

    /// Neighbouring column, clamped at the board edges.
    pub fn shifted(&self, direction: isize) -> Status {
        let index = (self.index() as isize + direction).clamp(0, Status::ALL.len() as isize - 1);
        Status::ALL[index as usize]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::parse(s).ok_or_else(|| {
            Error::InvalidInput(format!(
                "unknown status '{s}' (expected To Do, In Progress, Review or Done)"
            ))
        })
    }
}

/// A timestamped note on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Stable identity; legacy comments get one when loaded.
    #[serde(default = "new_id")]
    pub id: String,
    pub text: String,
    pub date: DateTime<Utc>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            date: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::text"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::date"
    )]
    pub due_date: Option<NaiveDate>,
    /// Hours.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::hours"
    )]
    pub time_estimate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::status")]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Fields supplied when creating a task. The store assigns id and timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub time_estimate: Option<f64>,
    pub status: Status,
}

impl TaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_time_estimate(mut self, hours: f64) -> Self {
        self.time_estimate = Some(hours);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn into_task(self, id: String, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description.and_then(non_empty),
            due_date: self.due_date,
            time_estimate: self.time_estimate,
            status: self.status,
            created_at,
            comments: Vec::new(),
        }
    }
}

/// A typed shallow merge: each `Some` field overwrites, each `None` field is
/// left alone. Nullable fields nest a second `Option` so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub time_estimate: Option<Option<f64>>,
    pub status: Option<Status>,
}

impl TaskPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_time_estimate(mut self, hours: Option<f64>) -> Self {
        self.time_estimate = Some(hours);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.time_estimate.is_none()
            && self.status.is_none()
    }

    /// Merge onto `task`. Never touches `id`, `created_at` or `comments`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone().and_then(non_empty);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(time_estimate) = self.time_estimate {
            task.time_estimate = time_estimate;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

/// Default due date for new tasks: the coming Sunday, or `today` on a Sunday.
pub fn next_sunday(today: NaiveDate) -> NaiveDate {
    let days = (7 - today.weekday().num_days_from_sunday()) % 7;
    today + Duration::days(i64::from(days))
}

/// Readers for optional task fields as older clients wrote them: blank
/// strings for "unset", numbers as strings, free-form status labels.
mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Number(f64),
        Text(String),
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.and_then(non_empty))
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        // Full timestamps carry the date in their first ten characters.
        let day = raw.get(..10).unwrap_or(raw);
        Ok(NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
    }

    pub fn hours<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let hours = match Option::<Scalar>::deserialize(d)? {
            Some(Scalar::Number(n)) => Some(n),
            Some(Scalar::Text(s)) => s.trim().parse::<f64>().ok(),
            None => None,
        };
        Ok(hours.filter(|h| h.is_finite()))
    }

    pub fn status<'de, D: Deserializer<'de>>(d: D) -> Result<Status, D::Error> {
        Ok(Option::<String>::deserialize(d)?
            .and_then(|s| Status::parse(&s))
            .unwrap_or_default())
    }
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        TaskInput::new("Write docs")
            .with_description("user guide")
            .with_time_estimate(2.0)
            .into_task("abc".to_string(), Utc::now())
    }

    #[test]
    fn test_status_parse_accepts_labels_and_variants() {
        assert_eq!(Status::parse("To Do"), Some(Status::ToDo));
        assert_eq!(Status::parse("todo"), Some(Status::ToDo));
        assert_eq!(Status::parse("In Progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("in_progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("DOING"), Some(Status::InProgress));
        assert_eq!(Status::parse("Review"), Some(Status::Review));
        assert_eq!(Status::parse("done"), Some(Status::Done));
        assert_eq!(Status::parse("blocked"), None);
        assert!("blocked".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_shifted_clamps_at_edges() {
        assert_eq!(Status::ToDo.shifted(-1), Status::ToDo);
        assert_eq!(Status::ToDo.shifted(1), Status::InProgress);
        assert_eq!(Status::Done.shifted(1), Status::Done);
        assert_eq!(Status::Review.shifted(-2), Status::ToDo);
    }

    #[test]
    fn test_task_serializes_with_labels_and_camel_case() {
        let mut task = sample_task();
        task.status = Status::InProgress;
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "In Progress");
        assert_eq!(json["timeEstimate"], 2.0);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("dueDate").is_none());
    }

    #[test]
    fn test_legacy_comment_without_id_gets_one() {
        let json = r#"{
            "id": "t1",
            "title": "Legacy",
            "status": "Review",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "comments": [{"text": "hi", "date": "2024-03-02T10:00:00.000Z"}]
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, Status::Review);
        assert_eq!(task.comments.len(), 1);
        assert!(!task.comments[0].id.is_empty());
    }

    #[test]
    fn test_legacy_field_shapes_are_normalized() {
        let json = r#"{
            "id": "t2",
            "title": "Old form",
            "description": "",
            "dueDate": "",
            "timeEstimate": "3",
            "status": "Blocked",
            "createdAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.time_estimate, Some(3.0));
        assert_eq!(task.status, Status::ToDo);
        assert!(task.comments.is_empty());
    }

    #[test]
    fn test_nulls_and_odd_values_read_as_unset() {
        let json = r#"{
            "id": "t3",
            "title": "Nulls",
            "description": null,
            "dueDate": "2024-06-01T00:00:00.000Z",
            "timeEstimate": "soon",
            "status": "in-progress",
            "createdAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(task.time_estimate, None);
        assert_eq!(task.status, Status::InProgress);
    }

    #[test]
    fn test_next_sunday() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 5, 5).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();
        assert_eq!(next_sunday(wednesday), sunday);
        assert_eq!(next_sunday(sunday), sunday);
        assert_eq!(next_sunday(saturday), sunday);
    }

    #[test]
    fn test_patch_overwrites_present_and_preserves_absent() {
        let mut task = sample_task();
        let created_at = task.created_at;

        TaskPatch::new("ignored")
            .with_title("Write better docs")
            .with_status(Status::Done)
            .apply(&mut task);

        assert_eq!(task.id, "abc");
        assert_eq!(task.created_at, created_at);
        assert_eq!(task.title, "Write better docs");
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.description.as_deref(), Some("user guide"));
        assert_eq!(task.time_estimate, Some(2.0));
    }

    #[test]
    fn test_patch_can_clear_nullable_fields() {
        let mut task = sample_task();
        TaskPatch::new("abc")
            .with_description(Some("   ".to_string()))
            .with_time_estimate(None)
            .apply(&mut task);
        assert_eq!(task.description, None);
        assert_eq!(task.time_estimate, None);
    }

    #[test]
    fn test_empty_patch() {
        assert!(TaskPatch::new("x").is_empty());
        assert!(!TaskPatch::new("x").with_status(Status::Review).is_empty());
    }
}
