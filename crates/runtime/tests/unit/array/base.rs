//! Base Registry Lifecycle Tests.
//!
//! Verifies id issue, discard marking, deferred retirement, and data
//! handle bookkeeping.

use arrayfuse_core::array::{BaseRegistry, DataHandle};
use arrayfuse_core::common::{ContractError, ElemType};

// ══════════════════════════════════════════════════════════
// 1. Allocation
// ══════════════════════════════════════════════════════════

/// Ids are issued monotonically and never collide.
#[test]
fn ids_are_monotonic_and_unique() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Float32, 10).unwrap();
    let b = registry.new_base(ElemType::Float32, 10).unwrap();
    let c = registry.new_base(ElemType::Int64, 1).unwrap();
    assert!(a < b && b < c);
    assert_eq!(registry.len(), 3);
}

/// A base must hold at least one element.
#[test]
fn zero_element_base_is_rejected() {
    let mut registry = BaseRegistry::new();
    let err = registry.new_base(ElemType::Float64, 0).unwrap_err();
    assert_eq!(err, ContractError::EmptyBase);
}

/// Element sizes drive view pricing; unknown bases price at zero.
#[test]
fn elem_size_lookup() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Float64, 4).unwrap();
    let b = registry.new_base(ElemType::Complex64, 4).unwrap();
    assert_eq!(registry.elem_size(a), 8);
    assert_eq!(registry.elem_size(b), 16);

    let gone = a;
    assert!(registry.retire(gone));
    assert_eq!(registry.elem_size(gone), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Discard lifecycle
// ══════════════════════════════════════════════════════════

/// Marking a base twice before retirement is a contract violation.
#[test]
fn double_discard_is_rejected() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Float32, 8).unwrap();
    registry.mark_discard(a).unwrap();
    assert_eq!(registry.mark_discard(a).unwrap_err(), ContractError::DoubleDiscard(a));
}

/// Marking an unknown base is a contract violation.
#[test]
fn discard_of_unknown_base_is_rejected() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Float32, 8).unwrap();
    assert!(registry.retire(a));
    assert_eq!(registry.mark_discard(a).unwrap_err(), ContractError::UnknownBase(a));
}

/// A discard mark survives until retirement; the record stays live so
/// in-flight IR references remain valid.
#[test]
fn discard_is_deferred_until_retirement() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Float32, 8).unwrap();
    registry.mark_discard(a).unwrap();
    assert!(registry.contains(a));
    assert!(registry.discard_pending(a));

    assert!(registry.retire(a));
    assert!(!registry.contains(a));
    assert!(!registry.discard_pending(a));
}

/// Clearing a pending mark (failed flush path) permits a fresh discard.
#[test]
fn cleared_mark_allows_rediscard() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Float32, 8).unwrap();
    registry.mark_discard(a).unwrap();
    registry.clear_discard(a);
    registry.mark_discard(a).unwrap();
}

// ══════════════════════════════════════════════════════════
// 3. Data handles
// ══════════════════════════════════════════════════════════

/// `Free` releases the data handle but keeps the metadata record.
#[test]
fn release_data_keeps_metadata() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Int32, 16).unwrap();
    registry.attach_data(a, DataHandle(42)).unwrap();
    assert_eq!(registry.get(a).unwrap().data, Some(DataHandle(42)));

    registry.release_data(a);
    assert!(registry.contains(a));
    assert_eq!(registry.get(a).unwrap().data, None);
}

/// Attaching data to an unknown base is a contract violation.
#[test]
fn attach_data_to_unknown_base_is_rejected() {
    let mut registry = BaseRegistry::new();
    let a = registry.new_base(ElemType::Int32, 16).unwrap();
    assert!(registry.retire(a));
    assert_eq!(
        registry.attach_data(a, DataHandle(1)).unwrap_err(),
        ContractError::UnknownBase(a)
    );
}
