//! Fuse Cache Tests.
//!
//! Verifies structural keying (base-renaming invariance, constant values
//! excluded), hit materialization with base substitution, and the reshape
//! agreement between insert and get paths.

use pretty_assertions::assert_eq;

use arrayfuse_core::array::BaseRegistry;
use arrayfuse_core::config::FuserKind;
use arrayfuse_core::fuse::{partition, FuseCache, FuseContext};
use arrayfuse_core::ir::Constant;

use crate::common::builder::{add, add_const, base_f32, discard, mul};
use crate::common::accept_all;

/// Renaming every base preserves the key.
#[test]
fn key_is_invariant_under_base_renaming() {
    let mut reg = BaseRegistry::new();
    let (a, b, c, d) = (
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
    );
    let (a2, b2, c2, d2) = (
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
    );
    let first = vec![add(c, a, b, &[64]), mul(d, c, a, &[64])];
    let second = vec![add(c2, a2, b2, &[64]), mul(d2, c2, a2, &[64])];
    assert_eq!(FuseCache::key_of(&first), FuseCache::key_of(&second));
}

/// Shape, stride, start, and base *positions* all feed the key.
#[test]
fn key_distinguishes_structure() {
    let mut reg = BaseRegistry::new();
    let (a, b, c, d) = (
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
    );
    let baseline = vec![add(c, a, b, &[64]), mul(d, c, a, &[64])];

    let other_shape = vec![add(c, a, b, &[8, 8]), mul(d, c, a, &[64])];
    assert_ne!(FuseCache::key_of(&baseline), FuseCache::key_of(&other_shape));

    // Reusing the output as both reads changes the position pattern.
    let other_wiring = vec![add(c, a, b, &[64]), mul(d, c, c, &[64])];
    assert_ne!(FuseCache::key_of(&baseline), FuseCache::key_of(&other_wiring));
}

/// Constant values stay out of the key; their type stays in.
#[test]
fn constant_values_do_not_key() {
    let mut reg = BaseRegistry::new();
    let (a, c) = (base_f32(&mut reg, 64), base_f32(&mut reg, 64));
    let three = vec![add_const(c, a, Constant::from_f32(3.0), &[64])];
    let four = vec![add_const(c, a, Constant::from_f32(4.0), &[64])];
    assert_eq!(FuseCache::key_of(&three), FuseCache::key_of(&four));

    let double = vec![add_const(c, a, Constant::from_f64(3.0), &[64])];
    assert_ne!(FuseCache::key_of(&three), FuseCache::key_of(&double));
}

/// A hit replays the cached layout over the caller's bases.
#[test]
fn hit_substitutes_caller_bases() {
    let mut reg = BaseRegistry::new();
    let (a, b, c, d) = (
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
    );
    let ctx = FuseContext::new(&reg, &accept_all, 0, true);
    let mut cache = FuseCache::new();

    let mut first = vec![add(c, a, b, &[1000]), mul(d, c, a, &[1000]), discard(&reg, c)];
    let kernels = partition(&mut first, &ctx, FuserKind::Greedy);
    cache.insert(&first, &kernels);
    assert_eq!(cache.len(), 1);

    let (a2, b2, c2, d2) = (
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
    );
    let mut replay = vec![
        add(c2, a2, b2, &[1000]),
        mul(d2, c2, a2, &[1000]),
        discard(&reg, c2),
    ];
    let hit = cache.get(&mut replay).unwrap();
    assert_eq!(hit.len(), kernels.len());
    assert_eq!(hit[0].temp_list(), &[c2]);
    let outputs: Vec<_> = hit[0].output_list().iter().map(|v| v.base).collect();
    assert_eq!(outputs, vec![d2]);
}

/// Get applies the canonical reshape, so raw multi-axis replays hit
/// layouts inserted after the singleton pass collapsed them.
#[test]
fn get_reshapes_before_lookup() {
    let mut reg = BaseRegistry::new();
    let (a, b, c) = (
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
    );
    let ctx = FuseContext::new(&reg, &accept_all, 0, true);
    let mut cache = FuseCache::new();

    let mut first = vec![add(c, a, b, &[4, 4, 4])];
    let kernels = partition(&mut first, &ctx, FuserKind::Greedy);
    cache.insert(&first, &kernels);

    let (a2, b2, c2) = (
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
    );
    let mut replay = vec![add(c2, a2, b2, &[4, 4, 4])];
    assert!(cache.get(&mut replay).is_some());
    // The caller's instructions now carry the collapsed shape.
    let view = replay[0].operands[0].as_view().unwrap();
    assert_eq!(view.shape, vec![64]);
}

/// Misses return nothing and clearing forgets everything.
#[test]
fn miss_and_clear() {
    let mut reg = BaseRegistry::new();
    let (a, b, c) = (
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
    );
    let ctx = FuseContext::new(&reg, &accept_all, 0, true);
    let mut cache = FuseCache::new();
    assert!(cache.is_empty());

    let mut instrs = vec![add(c, a, b, &[64])];
    assert!(cache.get(&mut instrs).is_none());

    let kernels = partition(&mut instrs, &ctx, FuserKind::Greedy);
    cache.insert(&instrs, &kernels);
    assert!(cache.get(&mut instrs.clone()).is_some());

    cache.clear();
    assert!(cache.get(&mut instrs).is_none());
}

/// The canonical slot vector records first-seen base positions.
#[test]
fn slot_count_tracks_distinct_bases() {
    let mut reg = BaseRegistry::new();
    let (a, b, c, d) = (
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
        base_f32(&mut reg, 64),
    );
    let mut instrs = vec![add(c, a, b, &[64]), mul(d, c, a, &[64])];
    let ctx = FuseContext::new(&reg, &accept_all, 0, true);
    let kernels = partition(&mut instrs, &ctx, FuserKind::Greedy);
    let mut cache = FuseCache::new();
    cache.insert(&instrs, &kernels);
    let key = FuseCache::key_of(&instrs);
    assert_eq!(cache.slot_count(key), Some(4));
}
