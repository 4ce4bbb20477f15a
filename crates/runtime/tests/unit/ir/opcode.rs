//! Opcode Table Tests.
//!
//! Verifies arity, classification, and wire-tag round-trips across the
//! whole opcode set.

use arrayfuse_core::ir::Opcode;

/// Every opcode survives a wire round-trip.
#[test]
fn wire_roundtrip_covers_all_opcodes() {
    for op in Opcode::ALL {
        assert_eq!(Opcode::from_wire(op.to_wire()), Some(op));
    }
}

/// Unassigned tags decode to nothing.
#[test]
fn unknown_wire_tags_are_rejected() {
    for raw in [-1, 5, 15, 63, 999] {
        assert_eq!(Opcode::from_wire(raw), None, "tag {raw}");
    }
}

/// System, reduction, and elementwise classes are disjoint; `UserFunc`
/// belongs to none of them.
#[test]
fn classification_is_disjoint() {
    for op in Opcode::ALL {
        let classes = [op.is_system(), op.is_reduction(), op.is_elementwise()];
        assert!(
            classes.iter().filter(|&&c| c).count() <= 1,
            "{op} is in more than one class"
        );
    }
    assert!(!Opcode::UserFunc.is_system());
    assert!(!Opcode::UserFunc.is_reduction());
    assert!(!Opcode::UserFunc.is_elementwise());
}

/// Arity per opcode class.
#[test]
fn arity_table() {
    assert_eq!(Opcode::None.arity(), 0);
    assert_eq!(Opcode::UserFunc.arity(), 0);
    assert_eq!(Opcode::Sync.arity(), 1);
    assert_eq!(Opcode::Discard.arity(), 1);
    assert_eq!(Opcode::Free.arity(), 1);
    assert_eq!(Opcode::Negate.arity(), 2);
    assert_eq!(Opcode::Cast.arity(), 2);
    assert_eq!(Opcode::Add.arity(), 3);
    assert_eq!(Opcode::RightShift.arity(), 3);
    for op in Opcode::ALL.into_iter().filter(|o| o.is_reduction()) {
        assert_eq!(op.arity(), 3, "{op}");
    }
}
