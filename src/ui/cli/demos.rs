// Thu Jan 15 2026 - Alex

use super::args::Scenario;
use crate::engine::{Fault, LoopRange, Scheduler, SchedulerError, TaskHandle};
use log::info;
use serde_json::{json, Value};
use std::time::Duration;

/// Builds the scenario's task tree and fires its root. The caller drives
/// the scheduler afterwards.
pub fn build(scenario: Scenario, scheduler: &mut Scheduler) -> Result<TaskHandle, SchedulerError> {
    match scenario {
        Scenario::Sequence => sequence(scheduler),
        Scenario::FanOut => fan_out(scheduler),
        Scenario::FailFast => fail_fast(scheduler),
        Scenario::Loop => counting_loop(scheduler),
        Scenario::Delay => delay(scheduler),
        Scenario::Trigger => trigger(scheduler),
    }
}

fn first_i64(args: &[Value]) -> Result<i64, Fault> {
    args.first()
        .and_then(Value::as_i64)
        .ok_or_else(|| Fault::raise("expected a number"))
}

fn sequence(scheduler: &mut Scheduler) -> Result<TaskHandle, SchedulerError> {
    scheduler
        .task()
        .named("sequence")
        .then(|_, args| {
            let n = first_i64(&args)?;
            info!("parsed {}", n);
            Ok(json!(n))
        })
        .then(|_, args| Ok(json!(first_i64(&args)? * 2)))
        .then(|_, args| Ok(json!(format!("result = {}", first_i64(&args)?))))
        .fire(vec![json!(21)])
}

fn fan_out(scheduler: &mut Scheduler) -> Result<TaskHandle, SchedulerError> {
    scheduler
        .task()
        .named("fan-out")
        .then(|ctx, _| {
            for (name, millis) in [("alpha", 30), ("beta", 10), ("gamma", 20)] {
                ctx.task()
                    .named(name)
                    .wait_ms(millis)
                    .then(move |_, _| {
                        info!("{} finished after {}ms", name, millis);
                        Ok(json!(name))
                    })
                    .start()?;
            }
            Ok(Value::Null)
        })
        .then(|_, args| {
            info!("collected {} results", args.len());
            Ok(Value::Array(args))
        })
        .start()
}

fn fail_fast(scheduler: &mut Scheduler) -> Result<TaskHandle, SchedulerError> {
    scheduler
        .task()
        .named("fail-fast")
        .then(|ctx, _| {
            ctx.task()
                .named("slow")
                .wait_ms(50)
                .then(|_, _| Ok(json!("slow done")))
                .start()?;
            ctx.task()
                .named("broken")
                .wait_ms(10)
                .then(|_, _| Err(Fault::raise("connection refused")))
                .start()?;
            Ok(Value::Null)
        })
        .once(|_, fault| {
            info!("recovered from: {}", fault);
            Ok(json!(format!("recovered: {}", fault.root())))
        })
        .start()
}

fn counting_loop(scheduler: &mut Scheduler) -> Result<TaskHandle, SchedulerError> {
    scheduler
        .task()
        .named("loop")
        .repeat(LoopRange::count(5).with_delay(Duration::from_millis(10)), |_, counter, previous| {
            let total = previous.as_i64().unwrap_or(0) + counter;
            info!("iteration {} running total {}", counter, total);
            Ok(json!(total))
        })
        .then(|_, args| Ok(json!(format!("sum = {}", first_i64(&args)?))))
        .start()
}

fn delay(scheduler: &mut Scheduler) -> Result<TaskHandle, SchedulerError> {
    scheduler
        .task()
        .named("delay")
        .then(|ctx, _| Ok(json!(ctx.now().as_millis() as u64)))
        .wait(Duration::from_millis(50))
        .then(|ctx, args| {
            let started = first_i64(&args)? as u128;
            Ok(json!(format!("waited {}ms", ctx.now().as_millis() - started)))
        })
        .start()
}

fn trigger(scheduler: &mut Scheduler) -> Result<TaskHandle, SchedulerError> {
    let tick = scheduler.trigger_once("tick");

    let root = scheduler
        .task()
        .named("listener")
        .wait_for(tick)
        .then(|_, args| Ok(json!(format!("heard {}", args.first().cloned().unwrap_or(Value::Null)))))
        .start()?;

    scheduler
        .task()
        .named("ticker")
        .wait_ms(25)
        .then(move |ctx, _| {
            let resolved = ctx.emit(tick, vec![json!("tick")])?;
            info!("tick resolved {} task(s)", resolved);
            Ok(Value::Null)
        })
        .start()?;

    Ok(root)
}
