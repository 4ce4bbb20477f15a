//! Strided view algebra.
//!
//! A view is a strided rectangular window into a base: a start offset, a
//! per-axis shape, and signed per-axis strides, all in elements. Views are
//! transient values inside instructions with no identity of their own; the
//! canonical equivalence used throughout the runtime is *alignment*, not
//! object identity.

use crate::array::base::BaseId;

/// A strided window into a base.
///
/// Rank is the length of `shape`; `shape` and `stride` always have equal
/// length in a well-formed view (enforced at enqueue time). A stride of
/// zero marks a broadcast axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct View {
    /// Base this view reads from or writes to.
    pub base: BaseId,
    /// Offset of the first element, in elements.
    pub start: i64,
    /// Extent of each axis.
    pub shape: Vec<i64>,
    /// Signed step of each axis, in elements.
    pub stride: Vec<i64>,
}

impl View {
    /// Creates a view from explicit shape and stride arrays.
    pub fn new(base: BaseId, start: i64, shape: Vec<i64>, stride: Vec<i64>) -> Self {
        Self {
            base,
            start,
            shape,
            stride,
        }
    }

    /// Creates a dense row-major view of the given shape starting at
    /// element 0.
    pub fn dense(base: BaseId, shape: &[i64]) -> Self {
        let mut stride = vec![0i64; shape.len()];
        let mut step = 1i64;
        for axis in (0..shape.len()).rev() {
            stride[axis] = step;
            step *= shape[axis];
        }
        Self {
            base,
            start: 0,
            shape: shape.to_vec(),
            stride,
        }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Whether this view is aligned with `other`: identical base, start,
    /// rank, shape, and stride.
    pub fn aligned(&self, other: &Self) -> bool {
        self.base == other.base
            && self.start == other.start
            && self.shape == other.shape
            && self.stride == other.stride
    }

    /// Total number of elements addressed by the view (rank 0 counts as 1).
    pub fn nelements(&self) -> u64 {
        self.shape.iter().map(|&s| s.max(0) as u64).product()
    }

    /// Number of distinct elements, counting each broadcast axis
    /// (stride 0) as a single element.
    ///
    /// This is the element count used for pricing: a broadcast axis reads
    /// the same storage repeatedly and costs nothing extra.
    pub fn nelements_nbcast(&self) -> u64 {
        self.shape
            .iter()
            .zip(&self.stride)
            .map(|(&s, &st)| if st == 0 { 1 } else { s.max(0) as u64 })
            .product()
    }

    /// Whether the view is dense row-major: innermost stride 1 and each
    /// outer stride the product of the inner extent and stride.
    ///
    /// A contiguous view can always be collapsed to rank 1, so instructions
    /// over contiguous views stay reshapable.
    pub fn is_contiguous(&self) -> bool {
        let rank = self.rank();
        if rank == 0 {
            return true;
        }
        if self.stride[rank - 1] != 1 {
            return false;
        }
        for axis in 0..rank - 1 {
            if self.stride[axis] != self.stride[axis + 1] * self.shape[axis + 1] {
                return false;
            }
        }
        true
    }

    /// Whether axes `axis` and `axis + 1` address one contiguous run and
    /// can be merged into a single axis.
    pub fn can_merge_axes(&self, axis: usize) -> bool {
        axis + 1 < self.rank() && self.stride[axis] == self.stride[axis + 1] * self.shape[axis + 1]
    }

    /// Merges axes `axis` and `axis + 1` into one axis.
    ///
    /// Caller must have checked `can_merge_axes(axis)`.
    pub fn merge_axes(&mut self, axis: usize) {
        if axis + 1 >= self.rank() {
            return;
        }
        self.shape[axis] *= self.shape[axis + 1];
        self.stride[axis] = self.stride[axis + 1];
        let _ = self.shape.remove(axis + 1);
        let _ = self.stride.remove(axis + 1);
    }

    /// Removes a length-1 axis.
    pub fn drop_axis(&mut self, axis: usize) {
        if axis >= self.rank() {
            return;
        }
        let _ = self.shape.remove(axis);
        let _ = self.stride.remove(axis);
    }
}
