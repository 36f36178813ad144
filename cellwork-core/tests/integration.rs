//! Integration Tests for Reactive System
//!
//! These tests verify that reactive cells, computed cells, and records work
//! together through the public API.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use cellwork_core::reactive::{ComputedCell, DependencyMarker, ReactiveCell, Runtime};
use cellwork_core::{CellError, NotifyPolicy, Record, ReentrancyPolicy, RuntimeConfig};

fn todo(done: bool) -> Value {
    json!({ "title": "task", "done": done })
}

/// The todo list walkthrough: a done counter announces every change.
#[test]
fn todo_done_count_scenario() {
    let record = Record::new();
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    record.define_reactive_empty("todos");

    let sink = log.clone();
    record.define_computed(
        "doneCount",
        |this| {
            let todos = this.get("todos")?;
            let done = todos
                .as_array()
                .map(|items| items.iter().filter(|t| t["done"] == json!(true)).count())
                .unwrap_or(0);
            Ok(json!(done))
        },
        move |count| {
            let line = format!("new done count is {count}");
            println!("{line}");
            sink.lock().push(line);
        },
    );

    record
        .set("todos", json!([todo(false), todo(false), todo(false)]))
        .unwrap();

    // A read registers the dependency but is not a change notification.
    assert_eq!(record.get("doneCount").unwrap(), json!(0));
    assert!(log.lock().is_empty());

    record
        .set("todos", json!([todo(true), todo(false), todo(false)]))
        .unwrap();
    record
        .set("todos", json!([todo(true), todo(true), todo(false)]))
        .unwrap();
    record
        .set("todos", json!([todo(true), todo(true), todo(true)]))
        .unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            "new done count is 1",
            "new done count is 2",
            "new done count is 3",
        ]
    );
}

/// Reading once registers exactly one subscriber per cell read, however many
/// times the derivation reads it.
#[test]
fn dependency_capture_is_deduplicated() {
    let a = ReactiveCell::new(1);
    let b = ReactiveCell::new(2);

    let (ra, rb) = (a.clone(), b.clone());
    let computed = ComputedCell::new(move || ra.get() + rb.get() + ra.get() + rb.get());

    assert_eq!(computed.get().unwrap(), 6);
    assert_eq!(a.subscriber_ids(), vec![computed.subscriber_id()]);
    assert_eq!(b.subscriber_ids(), vec![computed.subscriber_id()]);
}

/// The change callback sees the derivation evaluated against the new value.
#[test]
fn write_recomputes_against_new_value() {
    let signal = ReactiveCell::new(100);
    let observed = Arc::new(AtomicI32::new(-1));

    let source = signal.clone();
    let sink = observed.clone();
    let tripled = ComputedCell::with_callback(move || source.get() * 3, move |v| {
        sink.store(v, Ordering::SeqCst)
    });

    assert_eq!(tripled.get().unwrap(), 300);
    assert_eq!(observed.load(Ordering::SeqCst), -1);

    signal.set(50).unwrap();
    assert_eq!(observed.load(Ordering::SeqCst), 150);
}

/// Consecutive reads with no write in between both run the derivation.
#[test]
fn reads_are_never_cached() {
    let compute_count = Arc::new(AtomicI32::new(0));
    let counter = compute_count.clone();
    let computed = ComputedCell::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        42
    });

    assert_eq!(computed.get().unwrap(), 42);
    assert_eq!(computed.get().unwrap(), 42);
    assert_eq!(computed.get().unwrap(), 42);
    assert_eq!(compute_count.load(Ordering::SeqCst), 3);
}

/// The marker is empty after successful, failed and panicking reads.
#[test]
fn marker_isolation() {
    let cell = ReactiveCell::new(0);

    let source = cell.clone();
    let ok = ComputedCell::new(move || source.get());
    ok.get().unwrap();
    assert!(!DependencyMarker::is_active());

    let failing: ComputedCell<i32> = ComputedCell::try_new(|| Err(CellError::derivation("nope")));
    assert!(failing.get().is_err());
    assert!(!DependencyMarker::is_active());

    let panicking = ComputedCell::new(|| -> i32 { panic!("boom") });
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| panicking.get()));
    assert!(result.is_err());
    assert!(!DependencyMarker::is_active());

    // A later plain read attributes nothing to a stale subscriber.
    let before = cell.subscriber_count();
    let other = ReactiveCell::new(1);
    other.get();
    cell.get();
    assert_eq!(other.subscriber_count(), 0);
    assert_eq!(cell.subscriber_count(), before);
}

/// Callbacks fire in the order their computed cells were first read.
#[test]
fn callbacks_follow_first_read_order() {
    let cell = ReactiveCell::new(0);
    let order = Arc::new(Mutex::new(Vec::new()));

    let make = |label: &'static str| {
        let source = cell.clone();
        let order = order.clone();
        ComputedCell::with_callback(move || source.get(), move |_| order.lock().push(label))
    };

    let alpha = make("alpha");
    let beta = make("beta");

    beta.get().unwrap();
    alpha.get().unwrap();
    beta.get().unwrap();

    cell.set(1).unwrap();
    assert_eq!(*order.lock(), vec!["beta", "alpha"]);
}

/// A computed cell reading another computed cell follows their shared source.
#[test]
fn computed_depends_on_computed() {
    let base = ReactiveCell::new(5);
    let latest = Arc::new(AtomicI32::new(0));

    let source = base.clone();
    let doubled = ComputedCell::new(move || source.get() * 2);

    let inner = doubled.clone();
    let sink = latest.clone();
    let plus_ten = ComputedCell::try_with_callback(move || Ok(inner.get()? + 10), move |v| {
        sink.store(v, Ordering::SeqCst)
    });

    assert_eq!(doubled.get().unwrap(), 10);
    assert_eq!(plus_ten.get().unwrap(), 20);

    base.set(10).unwrap();
    assert_eq!(latest.load(Ordering::SeqCst), 30);
    assert_eq!(plus_ten.get().unwrap(), 30);
}

/// Under the reject policy a nested computed read is a detectable error.
#[test]
fn reject_policy_from_json_config() {
    let config = RuntimeConfig::from_json(r#"{ "reentrancy": "reject" }"#).unwrap();
    assert_eq!(config.reentrancy, ReentrancyPolicy::Reject);

    let record = Record::new();
    record.define_reactive("n", json!(3));
    record.define_computed_silent("double", |this| {
        Ok(json!(this.get("n")?.as_i64().unwrap_or(0) * 2))
    });
    record.define_computed_silent("quad", |this| {
        Ok(json!(this.get("double")?.as_i64().unwrap_or(0) * 2))
    });

    Runtime::with_config(config, || {
        assert_eq!(record.get("double").unwrap(), json!(6));
        assert!(matches!(
            record.get("quad"),
            Err(CellError::ReentrantDerivation { .. })
        ));
        assert!(!DependencyMarker::is_active());
    });

    // The default nesting policy handles the same read.
    assert_eq!(record.get("quad").unwrap(), json!(12));
}

/// Collect-all reports every failing subscriber after notifying all of them.
#[test]
fn collect_all_reports_every_failure() {
    let cell = ReactiveCell::new(0);
    let healthy_runs = Arc::new(AtomicI32::new(0));

    let source = cell.clone();
    let failing_a = ComputedCell::try_new(move || {
        let v = source.get();
        if v > 0 {
            Err(CellError::derivation(format!("a rejects {v}")))
        } else {
            Ok(v)
        }
    });

    let source = cell.clone();
    let runs = healthy_runs.clone();
    let healthy = ComputedCell::with_callback(move || source.get(), move |_| {
        runs.fetch_add(1, Ordering::SeqCst);
    });

    let source = cell.clone();
    let failing_b = ComputedCell::try_new(move || {
        let v = source.get();
        if v > 0 {
            Err(CellError::derivation(format!("b rejects {v}")))
        } else {
            Ok(v)
        }
    });

    failing_a.get().unwrap();
    healthy.get().unwrap();
    failing_b.get().unwrap();

    let config = RuntimeConfig::default().with_notify(NotifyPolicy::CollectAll);
    let err = Runtime::with_config(config, || cell.set(1)).unwrap_err();

    let CellError::Notification { failures, .. } = err else {
        panic!("expected a notification error");
    };
    let messages: Vec<String> = failures.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec!["derivation failed: a rejects 1", "derivation failed: b rejects 1"]
    );
    assert_eq!(healthy_runs.load(Ordering::SeqCst), 1);

    // Fail-fast stops before the healthy subscriber.
    assert!(cell.set(2).is_err());
    assert_eq!(healthy_runs.load(Ordering::SeqCst), 1);
}
