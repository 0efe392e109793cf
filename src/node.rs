//! The tree's node record.
//!
//! Each node carries an edge byte-string ("compression") leading into it from
//! its parent, an optional key/value marking, and a child set. A node whose
//! child set holds exactly one entry and which is not itself a key plays the
//! role of a "compressed" node in the base specification's two-layout model;
//! one holding two or more plays the role of a "normal" node. Unifying both
//! into a single record (rather than a tagged enum) is the representation
//! the reference crate this design is grounded on actually uses.

use bytes::Bytes;
use smallvec::SmallVec;

use crate::childs::Childs;

/// Outcome of comparing a node's edge string against the unconsumed
/// remainder of a key being walked.
pub(crate) enum CompResult {
    /// The edge string is a strict prefix of the remaining key: the node is
    /// fully consumed and the walk should continue into a child.
    Path,
    /// The edge string exactly equals the remaining key: the walk stops at
    /// this node with the key fully matched.
    Final,
    /// The two diverge (or the remaining key is a strict prefix of the edge
    /// string) after `usize` bytes in common.
    Partial(usize),
}

#[derive(Default)]
pub(crate) struct Node {
    pub(crate) compression: SmallVec<[u8; 23]>,
    pub(crate) is_key: bool,
    pub(crate) val: Bytes,
    pub(crate) childs: Childs,
}

impl Node {
    pub(crate) fn compare_compression_key(&self, key_rest: &[u8]) -> CompResult {
        use std::cmp::Ordering::*;
        match self.compression.len().cmp(&key_rest.len()) {
            Equal => {
                let common_len = self.get_common_len(key_rest);
                if common_len == key_rest.len() {
                    CompResult::Final
                } else {
                    CompResult::Partial(common_len)
                }
            }
            Greater => CompResult::Partial(self.get_common_len(key_rest)),
            Less => {
                let common_len = self.get_common_len(key_rest);
                if common_len == self.compression.len() {
                    CompResult::Path
                } else {
                    CompResult::Partial(common_len)
                }
            }
        }
    }

    #[allow(clippy::needless_range_loop)]
    pub(crate) fn get_common_len(&self, key_rest: &[u8]) -> usize {
        let len = self.compression.len().min(key_rest.len());
        for i in 0..len {
            if self.compression[i] != key_rest[i] {
                return i;
            }
        }
        len
    }

    /// Marks this node as a key carrying `val`. A node is a key iff
    /// `is_key` is set; `val` is always present but only meaningful then,
    /// which is what lets a key's value be the empty byte string (the
    /// "null" payload in the base specification) without that being
    /// confused with "not a key" the way an `Option<Bytes>` field would.
    pub(crate) fn set_value(&mut self, val: Bytes) {
        self.is_key = true;
        self.val = val;
    }

    /// Clears the key flag and returns the previous value, if any.
    pub(crate) fn take_value(&mut self) -> Option<Bytes> {
        if self.is_key {
            self.is_key = false;
            Some(std::mem::take(&mut self.val))
        } else {
            None
        }
    }

    pub(crate) fn get_huge_childs_idx(&self) -> Option<u32> {
        self.childs.get_next_idx()
    }

    pub(crate) fn new_leaf(compression: &[u8], val: Bytes) -> Self {
        Node {
            compression: SmallVec::from_slice(compression),
            is_key: true,
            val,
            childs: Childs::default(),
        }
    }
}
