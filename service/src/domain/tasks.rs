//! The bundled `Task` resource served under `/v1/tasks`.
//!
//! Two schemas describe it: [`task_schema`] for stored records (used to dump
//! responses and parse filters) and [`new_task_schema`] for client payloads
//! (create and partial update). Server-owned fields (`id`, `created`) only
//! appear in the former.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::fields::{DecimalValidator, Field, IntegerValidator, StrValidator};
use crate::domain::{DataSchema, Filter, ValidationError, ValidationErrors};

/// Component name of the stored record schema.
pub const TASK_SCHEMA: &str = "Task";
/// Component name of the client payload schema.
pub const NEW_TASK_SCHEMA: &str = "TaskCreate";

const KINDS: [&str; 3] = ["bug", "feature", "chore"];

/// A unit of work tracked by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    /// 32 hex digit identifier.
    #[schema(example = "67e5504410b1426f9247bb680e5fe0c8")]
    pub id: String,
    /// Short summary.
    pub title: String,
    /// Longer free text.
    #[serde(default)]
    pub description: Option<String>,
    /// 1 (trivial) to 5 (critical).
    pub severity: i64,
    /// Estimate, one decimal place.
    #[serde(default)]
    pub story_points: Option<f64>,
    /// Completion flag.
    pub done: bool,
    /// Due date (`YYYY-MM-DD`).
    #[serde(default)]
    pub due: Option<String>,
    /// One of `bug`, `feature`, `chore`.
    pub kind: String,
    /// Address of whoever raised the task.
    #[serde(default)]
    pub reporter_email: Option<String>,
    /// Creation time, RFC 3339.
    pub created: String,
}

fn client_fields() -> [Field; 8] {
    [
        Field::string("title", StrValidator::new().min_length(3).max_length(64))
            .required()
            .description("Short summary"),
        Field::string("description", StrValidator::new().max_length(1024)),
        Field::integer("severity", IntegerValidator::new().min(1).max(5))
            .default_value(3)
            .ops(["gt", "ge", "lt", "le"])
            .description("1 (trivial) to 5 (critical)"),
        Field::decimal("story_points", DecimalValidator::new().min(0.0).precision(1))
            .ops(["gt", "lt"]),
        Field::boolean("done").default_value(false).ops(["ne"]),
        Field::date("due").ops(["gt", "lt"]),
        Field::enumeration("kind", KINDS).default_value("feature"),
        Field::email("reporter_email", StrValidator::new().max_length(255)),
    ]
}

/// Schema of a stored task, including server-owned fields.
pub fn task_schema() -> DataSchema {
    let schema = DataSchema::new(TASK_SCHEMA)
        .description("A unit of work")
        .field(Field::uuid("id").required());
    client_fields()
        .into_iter()
        .fold(schema, DataSchema::field)
        .field(Field::date_time("created", true).required())
}

/// Schema of task payloads sent by clients.
pub fn new_task_schema() -> DataSchema {
    client_fields()
        .into_iter()
        .fold(DataSchema::new(NEW_TASK_SCHEMA), DataSchema::field)
}

impl Task {
    /// Build a task from a payload validated by [`new_task_schema`].
    ///
    /// # Errors
    ///
    /// Fails when the validated data does not fit the record, which only
    /// happens if the schema and the struct drift apart.
    pub fn create(
        mut data: Map<String, Value>,
        id: Uuid,
        created: DateTime<Utc>,
    ) -> Result<Self, ValidationErrors> {
        data.insert("id".to_owned(), Value::from(id.simple().to_string()));
        data.insert(
            "created".to_owned(),
            Value::from(created.to_rfc3339_opts(SecondsFormat::Secs, false)),
        );
        Self::from_map(data)
    }

    /// Apply a partially validated update on top of this task.
    ///
    /// # Errors
    ///
    /// Fails when the merged data does not fit the record, which only happens
    /// if the schema and the struct drift apart.
    pub fn apply(&self, update: Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut data = self.to_map();
        data.extend(update);
        Self::from_map(data)
    }

    /// The record as a JSON object.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Whether the task satisfies every filter.
    pub fn matches(&self, filters: &[Filter]) -> bool {
        if filters.is_empty() {
            return true;
        }
        let record = self.to_map();
        filters.iter().all(|filter| filter.matches(&record))
    }

    fn from_map(data: Map<String, Value>) -> Result<Self, ValidationErrors> {
        serde_json::from_value(Value::Object(data))
            .map_err(|error| ValidationError::new("", error.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FilterOp;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn task() -> Task {
        let data = new_task_schema()
            .validate(&json!({
                "title": "Fix login",
                "severity": "4",
                "story_points": "2.26",
                "kind": "bug",
                "due": "2024-03-01"
            }))
            .expect("valid payload");
        let created = DateTime::parse_from_rfc3339("2024-02-01T09:30:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        Task::create(data, Uuid::nil(), created).expect("task fits")
    }

    #[rstest]
    fn created_tasks_carry_defaults_and_server_fields(task: Task) {
        assert_eq!(task.id, "00000000000000000000000000000000");
        assert_eq!(task.created, "2024-02-01T09:30:00+00:00");
        assert_eq!(task.severity, 4);
        assert_eq!(task.story_points, Some(2.3));
        assert!(!task.done);
        assert_eq!(task.kind, "bug");
        assert_eq!(task.description, None);
    }

    #[rstest]
    fn stored_tasks_validate_against_the_record_schema(task: Task) {
        let stored = task_schema()
            .validate(&Value::Object(task.to_map()))
            .expect("stored record is valid");
        assert_eq!(stored.get("created"), Some(&json!("2024-02-01T09:30:00+00:00")));
    }

    #[rstest]
    fn updates_merge_over_existing_values(task: Task) {
        let update = new_task_schema()
            .validate_partial(&json!({ "done": "true", "description": "Session expiry" }))
            .expect("valid update");
        let updated = task.apply(update).expect("merged");
        assert!(updated.done);
        assert_eq!(updated.description.as_deref(), Some("Session expiry"));
        assert_eq!(updated.title, task.title);
    }

    #[rstest]
    fn null_updates_restore_defaults_and_clear_optionals(task: Task) {
        let update = new_task_schema()
            .validate_partial(&json!({ "severity": null, "kind": null, "due": null }))
            .expect("nulls accepted on optional fields");
        let updated = task.apply(update).expect("merged");
        assert_eq!(updated.severity, 3);
        assert_eq!(updated.kind, "feature");
        assert_eq!(updated.due, None);
    }

    #[rstest]
    #[case(vec![], true)]
    #[case(vec![Filter::new("severity", FilterOp::Ge, json!(4))], true)]
    #[case(vec![Filter::new("kind", FilterOp::Eq, json!("chore"))], false)]
    #[case(vec![
        Filter::new("due", FilterOp::Lt, json!("2024-04-01")),
        Filter::new("done", FilterOp::Ne, json!(true)),
    ], true)]
    fn filters_apply_to_the_record(task: Task, #[case] filters: Vec<Filter>, #[case] expected: bool) {
        assert_eq!(task.matches(&filters), expected);
    }

    #[rstest]
    fn client_schema_excludes_server_fields() {
        let schema = new_task_schema();
        assert!(schema.get("id").is_none());
        assert!(schema.get("created").is_none());
        assert!(task_schema().get("id").is_some_and(Field::is_required));
    }
}
