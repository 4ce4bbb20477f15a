//! View Algebra Tests.
//!
//! Verifies alignment, element counting (broadcast included), contiguity,
//! and axis collapsing.

use rstest::rstest;

use arrayfuse_core::array::{BaseId, View};

// ══════════════════════════════════════════════════════════
// 1. Alignment
// ══════════════════════════════════════════════════════════

/// Alignment requires identical base, start, rank, shape, and stride.
#[test]
fn aligned_is_full_structural_match() {
    let a = View::dense(BaseId(1), &[4, 4]);
    let b = View::dense(BaseId(1), &[4, 4]);
    assert!(a.aligned(&b));

    let other_base = View::dense(BaseId(2), &[4, 4]);
    assert!(!a.aligned(&other_base));

    let mut shifted = View::dense(BaseId(1), &[4, 4]);
    shifted.start = 1;
    assert!(!a.aligned(&shifted));

    let mut strided = View::dense(BaseId(1), &[4, 4]);
    strided.stride[1] = 2;
    assert!(!a.aligned(&strided));
}

// ══════════════════════════════════════════════════════════
// 2. Element counts
// ══════════════════════════════════════════════════════════

/// Dense strides are row-major products of inner extents.
#[test]
fn dense_strides_are_row_major() {
    let v = View::dense(BaseId(0), &[2, 3, 4]);
    assert_eq!(v.stride, vec![12, 4, 1]);
    assert_eq!(v.nelements(), 24);
}

/// A rank-0 view addresses a single element.
#[test]
fn rank_zero_counts_one_element() {
    let v = View::new(BaseId(0), 5, vec![], vec![]);
    assert_eq!(v.rank(), 0);
    assert_eq!(v.nelements(), 1);
    assert_eq!(v.nelements_nbcast(), 1);
}

/// Broadcast axes (stride 0) count a single distinct element.
#[test]
fn broadcast_axis_prices_as_one() {
    let v = View::new(BaseId(0), 0, vec![8, 3], vec![0, 1]);
    assert_eq!(v.nelements(), 24);
    assert_eq!(v.nelements_nbcast(), 3);
}

// ══════════════════════════════════════════════════════════
// 3. Contiguity and collapsing
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(vec![4], vec![1], true)]
#[case(vec![2, 3], vec![3, 1], true)]
#[case(vec![2, 3], vec![4, 1], false)]
#[case(vec![2, 3], vec![3, 2], false)]
#[case(vec![2, 1, 3], vec![3, 3, 1], true)]
fn contiguity(#[case] shape: Vec<i64>, #[case] stride: Vec<i64>, #[case] expected: bool) {
    let v = View::new(BaseId(0), 0, shape, stride);
    assert_eq!(v.is_contiguous(), expected);
}

/// Contiguous neighbouring axes merge into one.
#[test]
fn contiguous_axes_merge() {
    let mut v = View::new(BaseId(0), 0, vec![2, 3], vec![3, 1]);
    assert!(v.can_merge_axes(0));
    v.merge_axes(0);
    assert_eq!(v.shape, vec![6]);
    assert_eq!(v.stride, vec![1]);
}

/// A window with a gap between rows must not merge.
#[test]
fn strided_axes_do_not_merge() {
    let v = View::new(BaseId(0), 0, vec![2, 3], vec![4, 1]);
    assert!(!v.can_merge_axes(0));
}

/// Dropping a unit axis keeps the remaining geometry.
#[test]
fn unit_axis_drops() {
    let mut v = View::new(BaseId(0), 0, vec![2, 1, 3], vec![3, 3, 1]);
    v.drop_axis(1);
    assert_eq!(v.shape, vec![2, 3]);
    assert_eq!(v.stride, vec![3, 1]);
}
