// Tue Jan 13 2026 - Alex

use crate::engine::error::Fault;
use crate::engine::step::Args;
use serde_json::Value;

/// What a pipeline carries between steps: arguments in normal mode, the
/// fault in fault mode.
pub type Flow = Result<Args, Fault>;

/// Final result of a completed task, as reported to its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success(Value),
    Failure(Fault),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failure(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            TaskOutcome::Success(value) => Some(value),
            TaskOutcome::Failure(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            TaskOutcome::Failure(fault) => Some(fault),
            TaskOutcome::Success(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Value, Fault> {
        match self {
            TaskOutcome::Success(value) => Ok(value),
            TaskOutcome::Failure(fault) => Err(fault),
        }
    }
}

/// Arguments for the step after a handler returned `value`. A `Null`
/// return keeps the arguments the handler was given.
pub(crate) fn next_args(value: &Value, previous: Args) -> Args {
    if value.is_null() {
        previous
    } else {
        vec![value.clone()]
    }
}

/// Arguments a parent resumes with once its children have settled. When
/// no child produced a defined value the parent's own arguments win.
pub(crate) fn fold_children(collected: Vec<Value>, fallback: Args) -> Args {
    if collected.iter().any(|v| !v.is_null()) {
        collected
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_args_null_passes_through() {
        assert_eq!(next_args(&Value::Null, vec![json!(1)]), vec![json!(1)]);
        assert_eq!(next_args(&json!("x"), vec![json!(1)]), vec![json!("x")]);
    }

    #[test]
    fn test_fold_children_fallback() {
        assert_eq!(
            fold_children(vec![Value::Null, Value::Null], vec![json!(9)]),
            vec![json!(9)]
        );
        assert_eq!(
            fold_children(vec![json!(1), Value::Null], vec![json!(9)]),
            vec![json!(1), Value::Null]
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = TaskOutcome::Success(json!(3));
        assert!(ok.is_success());
        assert_eq!(ok.value(), Some(&json!(3)));

        let failed = TaskOutcome::Failure(Fault::raise("nope"));
        assert!(failed.is_failure());
        assert_eq!(failed.clone().into_result(), Err(Fault::raise("nope")));
        assert!(failed.value().is_none());
    }
}
