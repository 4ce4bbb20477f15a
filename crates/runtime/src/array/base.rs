//! Base metadata and the registry that owns it.
//!
//! A base is the owner of an array's storage metadata: a stable identifier,
//! an element type, an element count, and an opaque data handle filled
//! lazily by the backend. The registry exclusively owns all `Base` records;
//! views reference bases by id and never extend their lifetime.
//!
//! Destruction is deferred: `discard` only marks a base, and the record is
//! removed when the corresponding `Discard` instruction has executed. This
//! keeps every id referenced by an in-flight IR valid.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::common::error::ContractError;
use crate::common::types::ElemType;

/// Stable identifier of a base.
///
/// Issued monotonically by the registry; never reused within a runtime
/// instance, which keeps serialized IRs free of aliasing hazards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseId(pub u64);

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base-{}", self.0)
    }
}

/// Opaque handle to backend-owned data.
///
/// The runtime never dereferences a handle; it only records whether one is
/// attached. Handles replace raw pointers so the metadata stays
/// serialization-safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DataHandle(pub u64);

/// Storage metadata of one array base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Base {
    /// Stable identifier of this base.
    pub id: BaseId,
    /// Element type of the stored data.
    pub elem_type: ElemType,
    /// Number of elements (always positive).
    pub nelem: u64,
    /// Backend data handle; `None` until the backend materializes the data.
    pub data: Option<DataHandle>,
}

/// Registry owning every live base.
///
/// All mutation is serialized by the runtime's single-threaded discipline;
/// the registry carries no locks.
#[derive(Debug, Default)]
pub struct BaseRegistry {
    next_id: u64,
    bases: HashMap<BaseId, Base>,
    discard_pending: HashSet<BaseId>,
}

impl BaseRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates metadata for a new base and returns its id.
    ///
    /// The data handle stays empty until the backend materializes the
    /// buffer.
    pub fn new_base(&mut self, elem_type: ElemType, nelem: u64) -> Result<BaseId, ContractError> {
        if nelem == 0 {
            return Err(ContractError::EmptyBase);
        }
        let id = BaseId(self.next_id);
        self.next_id += 1;
        let _ = self.bases.insert(
            id,
            Base {
                id,
                elem_type,
                nelem,
                data: None,
            },
        );
        Ok(id)
    }

    /// Looks up a base by id.
    pub fn get(&self, id: BaseId) -> Option<&Base> {
        self.bases.get(&id)
    }

    /// Returns whether `id` names a live base.
    pub fn contains(&self, id: BaseId) -> bool {
        self.bases.contains_key(&id)
    }

    /// Number of live bases.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Returns whether the registry holds no bases.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Element size in bytes of the base, or 0 for an unknown id.
    ///
    /// Views in a well-formed IR always reference registered bases; an
    /// unknown base prices at zero.
    pub fn elem_size(&self, id: BaseId) -> u64 {
        self.bases.get(&id).map_or(0, |b| b.elem_type.size_bytes())
    }

    /// Attaches a backend data handle to a base.
    pub fn attach_data(&mut self, id: BaseId, handle: DataHandle) -> Result<(), ContractError> {
        let base = self
            .bases
            .get_mut(&id)
            .ok_or(ContractError::UnknownBase(id))?;
        base.data = Some(handle);
        Ok(())
    }

    /// Marks a base for discard.
    ///
    /// The record survives until the `Discard` instruction executes. A
    /// second mark before that is a contract violation.
    pub fn mark_discard(&mut self, id: BaseId) -> Result<(), ContractError> {
        if !self.bases.contains_key(&id) {
            return Err(ContractError::UnknownBase(id));
        }
        if !self.discard_pending.insert(id) {
            return Err(ContractError::DoubleDiscard(id));
        }
        Ok(())
    }

    /// Returns whether a discard is pending for `id`.
    pub fn discard_pending(&self, id: BaseId) -> bool {
        self.discard_pending.contains(&id)
    }

    /// Clears a pending discard mark without retiring the base.
    ///
    /// Used when the flush carrying the `Discard` instruction failed: the
    /// instruction is gone, so the caller may discard again.
    pub fn clear_discard(&mut self, id: BaseId) {
        let _ = self.discard_pending.remove(&id);
    }

    /// Retires a base after its `Discard` instruction executed.
    ///
    /// Removes the metadata record and the pending mark. Returns whether a
    /// record was removed.
    pub fn retire(&mut self, id: BaseId) -> bool {
        let _ = self.discard_pending.remove(&id);
        self.bases.remove(&id).is_some()
    }

    /// Releases the data handle of a base after its `Free` instruction
    /// executed, keeping the metadata.
    pub fn release_data(&mut self, id: BaseId) {
        if let Some(base) = self.bases.get_mut(&id) {
            base.data = None;
        }
    }
}
