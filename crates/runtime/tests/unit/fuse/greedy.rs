//! Greedy Fuser Tests.
//!
//! Verifies price-drop ordering: the highest-saving neighbour pair merges
//! first, zero-drop fusible pairs still coalesce, and the greedy result
//! can beat the serial sweep.

use arrayfuse_core::array::BaseRegistry;
use arrayfuse_core::common::ElemType;
use arrayfuse_core::config::FuserKind;
use arrayfuse_core::fuse::{partition, FuseContext};
use arrayfuse_core::ir::Instruction;

use crate::common::builder::{add, base_f32, discard, mul};
use crate::common::{accept_all, concat_instrs};

/// Independent same-shape instructions coalesce even at zero drop.
#[test]
fn zero_drop_pairs_still_merge() {
    let mut reg = BaseRegistry::new();
    let bases: Vec<_> = (0..12).map(|_| base_f32(&mut reg, 64)).collect();
    let mut instrs: Vec<_> = (0..4)
        .map(|i| add(bases[3 * i], bases[3 * i + 1], bases[3 * i + 2], &[64]))
        .collect();
    let ctx = FuseContext::new(&reg, &accept_all, 0, true);
    let kernels = partition(&mut instrs, &ctx, FuserKind::Greedy);
    assert_eq!(kernels.len(), 1);
    assert_eq!(concat_instrs(&kernels), instrs);
}

/// The producer/consumer/discard chain collapses with the temp folded in.
#[test]
fn chain_with_discard_fuses_fully() {
    let mut reg = BaseRegistry::new();
    let (a, b, c, d) = (
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
        base_f32(&mut reg, 1000),
    );
    let mut instrs = vec![add(c, a, b, &[1000]), mul(d, c, a, &[1000]), discard(&reg, c)];
    let ctx = FuseContext::new(&reg, &accept_all, 0, true);
    let kernels = partition(&mut instrs, &ctx, FuserKind::Greedy);
    assert_eq!(kernels.len(), 1);
    assert_eq!(kernels[0].temp_list(), &[c]);
    let out: Vec<_> = kernels[0].output_list().iter().map(|v| v.base).collect();
    assert_eq!(out, vec![d]);
}

/// Greedy beats serial: legality B1↔B2 and B2↔B3 with B1 and B3
/// incompatible, drops 10 and 100. Greedy keeps the expensive pair
/// together; serial grabs the first pair it sees.
#[test]
fn greedy_beats_serial_on_asymmetric_drops() {
    let mut reg = BaseRegistry::new();
    let u = reg.new_base(ElemType::Int8, 10).unwrap();
    let w = reg.new_base(ElemType::Int8, 10).unwrap();
    let x = reg.new_base(ElemType::Int8, 100).unwrap();
    let y = reg.new_base(ElemType::Int8, 100).unwrap();

    // B1: w = u + u      (10-byte views)
    // B2: x = w * w      (writes 100 bytes, reads B1's 10-byte output)
    // B3: y = x + x      (reads B2's 100-byte output)
    let b1 = add(w, u, u, &[10]);
    let mut b2 = mul(x, w, w, &[100]);
    for operand in b2.operands.iter_mut().skip(1) {
        if let Some(view) = operand.as_view_mut() {
            view.shape = vec![10];
            view.stride = vec![1];
        }
    }
    let b3 = add(y, x, x, &[100]);

    // B1 and B3 never fuse; every other pair does.
    let incompatible = |i: &Instruction| i.written_base() == Some(w) || i.written_base() == Some(y);
    let check = move |a: &Instruction, b: &Instruction| {
        !(incompatible(a) && incompatible(b) && a.written_base() != b.written_base())
    };

    let ctx = FuseContext::new(&reg, &check, 0, false);
    let mut for_greedy = vec![b1.clone(), b2.clone(), b3.clone()];
    let kernels = partition(&mut for_greedy, &ctx, FuserKind::Greedy);
    assert_eq!(kernels.len(), 2);
    assert_eq!(kernels[0].instr_list().len(), 1, "B1 alone");
    assert_eq!(kernels[1].instr_list().len(), 2, "B2 and B3 together");

    let mut for_serial = vec![b1, b2, b3];
    let kernels = partition(&mut for_serial, &ctx, FuserKind::Serial);
    assert_eq!(kernels.len(), 2);
    assert_eq!(kernels[0].instr_list().len(), 2, "B1 and B2 together");
    assert_eq!(kernels[1].instr_list().len(), 1, "B3 alone");
}

/// An unfusible middle block seals both frontiers.
#[test]
fn unfusible_block_splits_the_list() {
    let mut reg = BaseRegistry::new();
    let bases: Vec<_> = (0..9).map(|_| base_f32(&mut reg, 64)).collect();
    let locked = bases[3];
    let mut instrs = vec![
        add(bases[0], bases[1], bases[2], &[64]),
        add(locked, bases[4], bases[5], &[64]),
        add(bases[6], bases[7], bases[8], &[64]),
    ];
    let check = move |a: &Instruction, b: &Instruction| {
        a.written_base() != Some(locked) && b.written_base() != Some(locked)
    };
    let ctx = FuseContext::new(&reg, &check, 0, true);
    let kernels = partition(&mut instrs, &ctx, FuserKind::Greedy);
    assert_eq!(kernels.len(), 3);
    assert_eq!(concat_instrs(&kernels), instrs);
}
