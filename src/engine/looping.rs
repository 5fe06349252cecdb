// Thu Jan 15 2026 - Alex

use crate::engine::context::Context;
use crate::engine::error::Fault;
use crate::engine::step::Step;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

pub type LoopBody = Box<dyn FnMut(&mut Context<'_>, i64, Value) -> Result<Value, Fault>>;

/// Continuation test for the loop counter.
pub enum Bound {
    /// Runs while the counter has not reached the limit (from above when
    /// the stride is negative).
    Limit(i64),
    While(Box<dyn Fn(i64) -> bool>),
}

pub enum Stride {
    By(i64),
    With(Box<dyn Fn(i64) -> i64>),
}

/// Counter settings for `repeat`: `init`, a continuation bound, an increment
/// and an optional pause between iterations.
pub struct LoopRange {
    init: i64,
    condition: Bound,
    increment: Stride,
    delay: Option<Duration>,
}

impl LoopRange {
    pub fn new(init: i64, condition: Bound, increment: Stride) -> Self {
        Self { init, condition, increment, delay: None }
    }

    /// Counter 0, 1, .., n-1.
    pub fn count(n: i64) -> Self {
        Self::new(0, Bound::Limit(n), Stride::By(1))
    }

    pub fn while_true<C, I>(init: i64, condition: C, increment: I) -> Self
    where
        C: Fn(i64) -> bool + 'static,
        I: Fn(i64) -> i64 + 'static,
    {
        Self::new(init, Bound::While(Box::new(condition)), Stride::With(Box::new(increment)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn init(&self) -> i64 {
        self.init
    }

    pub fn holds(&self, counter: i64) -> bool {
        match &self.condition {
            Bound::Limit(limit) => match self.increment {
                Stride::By(step) if step < 0 => counter > *limit,
                _ => counter < *limit,
            },
            Bound::While(condition) => condition(counter),
        }
    }

    pub fn advance(&self, counter: i64) -> i64 {
        match &self.increment {
            Stride::By(step) => counter + step,
            Stride::With(increment) => increment(counter),
        }
    }
}

impl From<i64> for LoopRange {
    fn from(n: i64) -> Self {
        LoopRange::count(n)
    }
}

impl From<i32> for LoopRange {
    fn from(n: i32) -> Self {
        LoopRange::count(n as i64)
    }
}

impl From<usize> for LoopRange {
    fn from(n: usize) -> Self {
        LoopRange::count(n as i64)
    }
}

impl From<Range<i64>> for LoopRange {
    fn from(range: Range<i64>) -> Self {
        LoopRange::new(range.start, Bound::Limit(range.end), Stride::By(1))
    }
}

impl fmt::Debug for LoopRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let condition = match &self.condition {
            Bound::Limit(limit) => format!("limit {}", limit),
            Bound::While(_) => "fn".to_string(),
        };
        let increment = match &self.increment {
            Stride::By(step) => format!("by {}", step),
            Stride::With(_) => "fn".to_string(),
        };
        f.debug_struct("LoopRange")
            .field("init", &self.init)
            .field("condition", &condition)
            .field("increment", &increment)
            .field("delay", &self.delay)
            .finish()
    }
}

struct LoopState {
    range: LoopRange,
    counter: i64,
    body: LoopBody,
}

/// The step `repeat` appends. When reached it fires an anonymous child
/// task that runs the iterations; the parent resumes with the last body
/// result once the child completes. A range that never holds spawns
/// nothing and the parent keeps its own args.
pub(crate) fn loop_step(range: LoopRange, body: LoopBody) -> Step {
    let mut pending = Some((range, body));

    Step::normal(move |ctx, args| {
        let (range, body) = pending.take().ok_or_else(|| Fault::raise("loop step already ran"))?;
        if !range.holds(range.init) {
            return Ok(Value::Null);
        }
        let state = Rc::new(RefCell::new(LoopState { counter: range.init, range, body }));
        ctx.task().named("loop").transient().add_step(iteration(state)).fire(args)?;
        Ok(Value::Null)
    })
}

fn iteration(state: Rc<RefCell<LoopState>>) -> Step {
    Step::normal(move |ctx, args| {
        let previous = args.into_iter().next().unwrap_or(Value::Null);

        let mut guard = state.borrow_mut();
        let counter = guard.counter;
        if !guard.range.holds(counter) {
            return Ok(Value::Null);
        }
        let value = (guard.body)(ctx, counter, previous)?;
        guard.counter = guard.range.advance(counter);
        let again = guard.range.holds(guard.counter);
        let delay = guard.range.delay;
        drop(guard);

        if again {
            let me = ctx.current();
            if let Some(delay) = delay {
                ctx.append_step(me, Step::delay(delay))?;
            }
            ctx.append_step(me, iteration(state.clone()))?;
        }
        Ok(value)
    })
}
