// Tue Jan 13 2026 - Alex

use crate::engine::context::Context;
use crate::engine::error::Fault;
use crate::engine::trigger::TriggerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Arguments flowing from one step to the next.
pub type Args = Vec<Value>;

pub type NormalHandler = Box<dyn FnMut(&mut Context<'_>, Args) -> Result<Value, Fault>>;
pub type ExceptionHandler = Box<dyn FnMut(&mut Context<'_>, Fault) -> Result<Value, Fault>>;

/// One queued unit of pipeline work.
///
/// In normal mode a `Normal` step runs its handler and an `Exception` step
/// passes its arguments through untouched. In fault mode it is the other
/// way round: `Normal` steps re-raise and `Exception` steps get the fault.
pub enum Step {
    Normal(NormalHandler),
    Exception(ExceptionHandler),
    Delay(Duration),
    Trigger(TriggerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Normal,
    Exception,
    Delay,
    Trigger,
}

impl Step {
    pub fn normal<F>(handler: F) -> Self
    where
        F: FnMut(&mut Context<'_>, Args) -> Result<Value, Fault> + 'static,
    {
        Step::Normal(Box::new(handler))
    }

    pub fn exception<F>(handler: F) -> Self
    where
        F: FnMut(&mut Context<'_>, Fault) -> Result<Value, Fault> + 'static,
    {
        Step::Exception(Box::new(handler))
    }

    pub fn delay(duration: Duration) -> Self {
        Step::Delay(duration)
    }

    /// Negative durations are clamped to zero; the step still yields.
    pub fn delay_ms(millis: i64) -> Self {
        Step::Delay(Duration::from_millis(millis.max(0) as u64))
    }

    pub fn trigger(trigger: TriggerId) -> Self {
        Step::Trigger(trigger)
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Normal(_) => StepKind::Normal,
            Step::Exception(_) => StepKind::Exception,
            Step::Delay(_) => StepKind::Delay,
            Step::Trigger(_) => StepKind::Trigger,
        }
    }

    pub fn is_suspending(&self) -> bool {
        matches!(self, Step::Delay(_) | Step::Trigger(_))
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Normal(_) => write!(f, "Step::Normal(..)"),
            Step::Exception(_) => write!(f, "Step::Exception(..)"),
            Step::Delay(d) => write!(f, "Step::Delay({:?})", d),
            Step::Trigger(t) => write!(f, "Step::Trigger({})", t),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Normal => write!(f, "then"),
            StepKind::Exception => write!(f, "once"),
            StepKind::Delay => write!(f, "wait"),
            StepKind::Trigger => write!(f, "trigger"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_ms_clamps_negative() {
        match Step::delay_ms(-25) {
            Step::Delay(d) => assert_eq!(d, Duration::ZERO),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_step_kinds() {
        assert_eq!(Step::normal(|_, _| Ok(Value::Null)).kind(), StepKind::Normal);
        assert_eq!(Step::exception(|_, f| Err(f)).kind(), StepKind::Exception);
        assert!(Step::delay_ms(10).is_suspending());
        assert!(!Step::normal(|_, _| Ok(Value::Null)).is_suspending());
    }
}
