//! Post-commit isolation
//!
//! A failing or panicking side effect is logged against its attribute and
//! transaction, and the remaining attributes still run.

mod common;

use std::sync::Arc;

use common::{two_attr_catalogue, CountingValidator};
use provgate_core::core_types::schema::EVENT_SIDE_EFFECT_FAILED;
use provgate_core::logging_facility::test_capture::init_test_capture;
use provgate_core::{
    DeltaBatch, EntryKind, MemEntry, OpKind, Orchestrator, TransactionContext, Validator,
    ValidatorRegistry,
};
use tracing::Level;

fn orchestrator(id: &'static str, failing: CountingValidator) -> (Orchestrator, Arc<CountingValidator>) {
    let validator = Arc::new(failing);
    let catalogue = two_attr_catalogue(id);
    let bound = vec![validator.clone() as Arc<dyn Validator>];
    let registry = ValidatorRegistry::from_catalogue(&catalogue, bound).unwrap();
    (Orchestrator::new(catalogue, registry), validator)
}

fn entry() -> MemEntry {
    MemEntry::new(EntryKind::Account, "acct-1", "a@x.com")
        .with_attr("x", "1")
        .with_attr("y", "2")
}

#[test]
fn test_failing_side_effect_is_logged_and_others_run() {
    // GIVEN a validator bound to x and y whose post_modify always fails
    let capture = init_test_capture();
    let mut failing = CountingValidator::new("fails_after_commit");
    failing.fail_post = true;
    let (orchestrator, validator) = orchestrator("fails_after_commit", failing);

    // WHEN both attributes are notified
    let mut ctx = TransactionContext::new(OpKind::Modify);
    let txn_id = ctx.txn_id().as_str().to_string();
    orchestrator.notify(&entry(), ["x", "y"], &mut ctx);

    // THEN both ran and each failure was logged for this transaction
    assert_eq!(validator.post_calls(), 2);
    let failures: Vec<_> = capture
        .events_for_txn(&txn_id)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_SIDE_EFFECT_FAILED))
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|e| e.level == Level::WARN));
    assert!(failures.iter().all(|e| e.op.as_deref() == Some("notify")));
    assert!(failures
        .iter()
        .all(|e| e.field("validator") == Some("fails_after_commit")));
    assert!(failures.iter().all(|e| e.field("err.code") == Some("ERR_FAILURE")));

    let attrs: Vec<_> = failures.iter().filter_map(|e| e.attr.as_deref()).collect();
    assert_eq!(attrs, vec!["x", "y"]);
}

#[test]
fn test_panicking_side_effect_is_contained() {
    // GIVEN a validator whose post_modify panics
    let capture = init_test_capture();
    let mut panicking = CountingValidator::new("panics_after_commit");
    panicking.panic_post = true;
    let (orchestrator, validator) = orchestrator("panics_after_commit", panicking);

    // WHEN notify runs over both attributes
    let mut ctx = TransactionContext::new(OpKind::Modify);
    let txn_id = ctx.txn_id().as_str().to_string();
    orchestrator.notify(&entry(), ["x", "y"], &mut ctx);

    // THEN notify returned normally and both panics were logged
    assert_eq!(validator.post_calls(), 2);
    let logged = capture.count_events(|e| {
        e.txn_id.as_deref() == Some(txn_id.as_str())
            && e.event.as_deref() == Some(EVENT_SIDE_EFFECT_FAILED)
            && e.field("error").is_some_and(|m| m.contains("post_modify exploded"))
    });
    assert_eq!(logged, 2);
}

#[test]
fn test_prefixed_names_visit_base_once() {
    let (orchestrator, validator) = orchestrator("counts", CountingValidator::new("counts"));

    let mut ctx = TransactionContext::new(OpKind::Modify);
    orchestrator.notify(&entry(), ["+x", "-x", "X", "y"], &mut ctx);

    assert_eq!(validator.post_calls(), 2);
}

#[test]
fn test_apply_then_notify_uses_same_context() {
    // GIVEN a successful phase 1
    let capture = init_test_capture();
    let (orchestrator, validator) = orchestrator("counts_ctx", CountingValidator::new("counts_ctx"));
    let prepared = orchestrator
        .apply(Some(&entry()), DeltaBatch::new().with("x", "9"), OpKind::Modify)
        .unwrap();
    let txn_id = prepared.ctx().txn_id().as_str().to_string();

    // WHEN phase 2 runs with the returned context
    let names = prepared.changed_names();
    let (_, mut ctx) = prepared.into_parts();
    orchestrator.notify(&entry(), &names, &mut ctx);

    // THEN both phases logged under one transaction id
    assert_eq!(validator.pre_calls(), 1);
    assert_eq!(validator.post_calls(), 1);
    let ops: Vec<_> = capture
        .events_for_txn(&txn_id)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some("end"))
        .filter_map(|e| e.op)
        .collect();
    assert_eq!(ops, vec!["apply".to_string(), "notify".to_string()]);
}
