mod common;

use common::harness;
use provgate_core::{
    DataKey, DeltaBatch, EntryKind, MemEntry, OpKind, ProvError, TransactionContext,
};

fn account_with_limit(limit: &str) -> MemEntry {
    MemEntry::new(EntryKind::Account, "acct-1", "a@x.com").with_attr("mailSignatureMaxLength", limit)
}

#[test]
fn test_override_beats_sibling_and_stored_limit() {
    // GIVEN a stored limit of 20, a sibling change to 10 and an override of 5
    let h = harness("0");
    let entry = account_with_limit("20");
    let batch = DeltaBatch::new()
        .with("mailSignature", "1234567")
        .with("mailSignatureMaxLength", "10");
    let ctx = TransactionContext::new(OpKind::Modify).with_data(DataKey::MaxSignatureLength, "5");

    // WHEN a 7-character signature is set
    let err = h.orchestrator.apply_with(Some(&entry), batch, ctx).unwrap_err();

    // THEN the override decides
    assert_eq!(
        err,
        ProvError::ValueTooLong {
            attr: "mailSignature".into(),
            length: 7,
            max: 5,
        }
    );
}

#[test]
fn test_sibling_beats_stored_limit() {
    // GIVEN the same batch without the override
    let h = harness("0");
    let entry = account_with_limit("20");
    let batch = DeltaBatch::new()
        .with("mailSignature", "1234567")
        .with("mailSignatureMaxLength", "10");

    // THEN the sibling limit of 10 accepts it
    assert!(h
        .orchestrator
        .apply(Some(&entry), batch, OpKind::Modify)
        .is_ok());

    // AND a lowered sibling rejects it even though 20 is stored
    let batch = DeltaBatch::new()
        .with("mailSignature", "1234567")
        .with("mailSignatureMaxLength", "3");
    let err = h
        .orchestrator
        .apply(Some(&entry), batch, OpKind::Modify)
        .unwrap_err();
    assert!(matches!(err, ProvError::ValueTooLong { max: 3, .. }));
}

#[test]
fn test_stored_then_default_limit() {
    let h = harness("0");

    let batch = DeltaBatch::new().with("mailSignature", "x".repeat(21));
    let err = h
        .orchestrator
        .apply(Some(&account_with_limit("20")), batch, OpKind::Modify)
        .unwrap_err();
    assert!(matches!(err, ProvError::ValueTooLong { max: 20, .. }));

    // no stored limit: the catalogue default (1024) applies
    let bare = MemEntry::new(EntryKind::Account, "acct-2", "b@x.com");
    let batch = DeltaBatch::new().with("mailSignature", "x".repeat(1025));
    let err = h
        .orchestrator
        .apply(Some(&bare), batch, OpKind::Modify)
        .unwrap_err();
    assert!(matches!(err, ProvError::ValueTooLong { max: 1024, .. }));
}

#[test]
fn test_length_counts_characters() {
    let h = harness("0");
    let batch = DeltaBatch::new().with("mailSignature", "ééééé");
    assert!(h
        .orchestrator
        .apply(Some(&account_with_limit("5")), batch, OpKind::Modify)
        .is_ok());
}

#[test]
fn test_zero_limit_is_unlimited() {
    let h = harness("0");
    let batch = DeltaBatch::new().with("mailSignature", "x".repeat(5000));
    assert!(h
        .orchestrator
        .apply(Some(&account_with_limit("0")), batch, OpKind::Modify)
        .is_ok());
}

#[test]
fn test_create_without_limits_skips_check() {
    let h = harness("0");
    let batch = DeltaBatch::new().with("mailSignature", "x".repeat(5000));
    assert!(h.orchestrator.apply(None, batch, OpKind::Create).is_ok());
}
