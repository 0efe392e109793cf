//! Fixed-capacity, edge-ordered child sets.
//!
//! A node's children are addressed by a single edge byte ("radix"). The inline
//! [`Childs`] set covers the common case of a handful of children per branch;
//! a node whose child count exceeds that inline capacity spills the excess
//! into a [`HugeChilds`] block, addressed by an index stored in the inline
//! set. Both sets keep their entries in strictly ascending edge order at all
//! times, which is what lets the cursor (see [`crate::cursor`]) walk the tree
//! in lexicographic order without re-sorting anything.

use arrayvec::ArrayVec;

pub(crate) const CHILDS_SIZE: usize = 10;
const ASCII_MAX_CHAR: usize = 127;
pub(crate) const HUGE_CHILDS_SIZE: usize = ASCII_MAX_CHAR - CHILDS_SIZE;

/// A child set ordered ascending by edge byte.
pub(crate) trait ChildSet {
    fn find(&self, radix: u8) -> Option<u32>;
    /// Insert `(radix, idx)`, keeping the set ordered. `radix` must not
    /// already be present.
    fn insert(&mut self, radix: u8, idx: u32);
    fn remove(&mut self, radix: u8) -> Option<u32>;
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;
    fn iter(&self) -> impl Iterator<Item = (u8, u32)>;
}

#[repr(C, align(64))]
pub(crate) struct Childs {
    radixs: ArrayVec<u8, CHILDS_SIZE>,
    idxs: ArrayVec<u32, CHILDS_SIZE>,
    maybe_next_childs_idx: u32,
}

impl Default for Childs {
    fn default() -> Self {
        Self {
            maybe_next_childs_idx: u32::MAX,
            radixs: ArrayVec::default(),
            idxs: ArrayVec::default(),
        }
    }
}

impl ChildSet for Childs {
    fn find(&self, radix: u8) -> Option<u32> {
        self.radixs
            .binary_search(&radix)
            .ok()
            .map(|pos| self.idxs[pos])
    }

    fn insert(&mut self, radix: u8, idx: u32) {
        assert!(!self.is_full());
        let pos = self
            .radixs
            .binary_search(&radix)
            .expect_err("radix already present in Childs");
        self.radixs.insert(pos, radix);
        self.idxs.insert(pos, idx);
    }

    fn remove(&mut self, radix: u8) -> Option<u32> {
        let pos = self.radixs.binary_search(&radix).ok()?;
        self.radixs.remove(pos);
        Some(self.idxs.remove(pos))
    }

    fn is_empty(&self) -> bool {
        self.idxs.is_empty()
    }

    fn len(&self) -> usize {
        self.idxs.len()
    }

    fn iter(&self) -> impl Iterator<Item = (u8, u32)> {
        self.radixs.iter().copied().zip(self.idxs.iter().copied())
    }
}

impl Childs {
    pub(crate) fn get_next_idx(&self) -> Option<u32> {
        if self.maybe_next_childs_idx == u32::MAX {
            None
        } else {
            Some(self.maybe_next_childs_idx)
        }
    }
    pub(crate) fn is_full(&self) -> bool {
        self.idxs.is_full()
    }
    pub(crate) fn set_new_childs(&mut self, idx: u32) {
        assert!(self.maybe_next_childs_idx == u32::MAX);
        self.maybe_next_childs_idx = idx
    }
    /// Drops the overflow block reference, e.g. once it has been freed
    /// because its last entry was removed.
    pub(crate) fn clear_next_idx(&mut self) {
        self.maybe_next_childs_idx = u32::MAX;
    }
    /// Returns `(radix, idx)` if the *inline* set alone holds exactly one
    /// entry and no overflow block exists. This does not account for a
    /// lone child living in the overflow block instead — callers that need
    /// "exactly one child overall" must also consult the overflow block via
    /// [`crate::RaxTree`]'s `child_list`, which this type has no access to.
    pub(crate) fn get_single_child(&self) -> Option<(u8, u32)> {
        if self.idxs.len() == 1 && self.maybe_next_childs_idx == u32::MAX {
            Some((self.radixs[0], self.idxs[0]))
        } else {
            None
        }
    }
}

#[derive(Clone, Copy)]
struct HugeChildRegistry {
    radix: u8,
    idx: u32,
}

#[repr(align(64))]
pub(crate) struct HugeChilds {
    entries: ArrayVec<HugeChildRegistry, HUGE_CHILDS_SIZE>,
}

impl Default for HugeChilds {
    fn default() -> Self {
        Self {
            entries: ArrayVec::new(),
        }
    }
}

impl HugeChilds {
    pub(crate) fn new(radix: u8, idx: u32) -> Self {
        let mut entries = ArrayVec::new();
        entries.push(HugeChildRegistry { radix, idx });
        Self { entries }
    }
}

impl ChildSet for HugeChilds {
    fn find(&self, radix: u8) -> Option<u32> {
        self.entries
            .binary_search_by_key(&radix, |e| e.radix)
            .ok()
            .map(|pos| self.entries[pos].idx)
    }

    fn insert(&mut self, radix: u8, idx: u32) {
        let pos = self
            .entries
            .binary_search_by_key(&radix, |e| e.radix)
            .expect_err("radix already present in HugeChilds");
        self.entries.insert(pos, HugeChildRegistry { radix, idx });
    }

    fn remove(&mut self, radix: u8) -> Option<u32> {
        let pos = self
            .entries
            .binary_search_by_key(&radix, |e| e.radix)
            .ok()?;
        Some(self.entries.remove(pos).idx)
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> impl Iterator<Item = (u8, u32)> {
        self.entries.iter().map(|e| (e.radix, e.idx))
    }
}
