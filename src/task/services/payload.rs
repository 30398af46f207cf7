//! Payload templating.
//!
//! String leaves of a task payload are rendered as `minijinja` templates
//! with `task_id`, `task_name`, `invocation_id` and `dispatched_at` in
//! scope. Leaves without template syntax are left untouched.

use minijinja::Environment;
use serde_json::{Map, Value};

use crate::dispatch::domain::InvocationId;
use crate::schedule::domain::UnixTimestamp;
use crate::task::domain::{Task, TaskDomainError};

/// Renders the payload of `task` for one invocation.
///
/// # Errors
///
/// Returns [`TaskDomainError::PayloadTemplate`] when a template leaf fails
/// to render.
pub fn render_payload(
    task: &Task,
    invocation_id: InvocationId,
    dispatched_at: UnixTimestamp,
) -> Result<Option<Value>, TaskDomainError> {
    let Some(payload) = task.payload() else {
        return Ok(None);
    };
    let environment = Environment::new();
    let context = build_template_context(task, invocation_id, dispatched_at);
    render_value(&environment, &context, payload)
        .map(Some)
        .map_err(|error| TaskDomainError::PayloadTemplate {
            task_id: task.id(),
            reason: error.to_string(),
        })
}

fn build_template_context(
    task: &Task,
    invocation_id: InvocationId,
    dispatched_at: UnixTimestamp,
) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("task_id".to_owned(), Value::String(task.id().to_string()));
    context.insert(
        "task_name".to_owned(),
        Value::String(task.name().as_str().to_owned()),
    );
    context.insert(
        "invocation_id".to_owned(),
        Value::String(invocation_id.to_string()),
    );
    context.insert(
        "dispatched_at".to_owned(),
        Value::from(dispatched_at.as_secs()),
    );
    context
}

fn render_value(
    environment: &Environment<'_>,
    context: &Map<String, Value>,
    value: &Value,
) -> Result<Value, minijinja::Error> {
    match value {
        Value::String(text) if is_template(text) => environment
            .render_str(text, context)
            .map(Value::String),
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(environment, context, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, item)| {
                render_value(environment, context, item).map(|rendered| (key.clone(), rendered))
            })
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn is_template(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}
