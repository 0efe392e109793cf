//! # raxtree
//!
//! An ordered, compressed radix tree ("Patricia trie") for byte-string keyed
//! maps, with point insert/lookup/delete, prefix-scoped bulk operations, and
//! a cursor supporting ordered iteration and relative seeks (`<`, `<=`, `==`,
//! `>=`, `>`, first, last).
//!
//! ## Features
//!
//! - **O(k) point operations**: `insert`/`get`/`remove` run in O(k) time
//!   where k is the key length, independent of how many other keys are
//!   stored.
//! - **Path compression**: runs of single-child nodes are folded into one
//!   node's edge string, minimizing memory usage and pointer-chasing.
//! - **Ordered cursor**: [`Cursor`] supports forward/backward iteration and
//!   seeking to the first key `<`, `<=`, `==`, `>=`, or `>` a given key.
//! - **Prefix operations**: [`RaxTree::get_prefix`] and
//!   [`RaxTree::remove_prefix`] answer and mutate by prefix.
//! - **Zero-copy values**: uses `bytes::Bytes` so returning a value from
//!   `get`/`remove` is O(1) and never requires the caller to free anything.
//!
//! ## Example
//!
//! ```rust
//! use raxtree::RaxTree;
//! use bytes::Bytes;
//!
//! let mut tree = RaxTree::new();
//!
//! tree.insert(Bytes::from_static(b"hello"), Bytes::from_static(b"world")).unwrap();
//! tree.insert(Bytes::from_static(b"hello:foo"), Bytes::from_static(b"bar")).unwrap();
//!
//! assert_eq!(tree.get(b"hello"), Some(Bytes::from_static(b"world")));
//!
//! let entries = tree.get_prefix(b"hello");
//! assert_eq!(entries.len(), 2);
//!
//! let deleted = tree.remove(b"hello");
//! assert_eq!(deleted, Some(Bytes::from_static(b"world")));
//! ```
//!
//! ## Key requirements
//!
//! Keys must be valid ASCII bytes. Non-ASCII keys trigger a debug assertion.

mod childs;
mod cursor;
mod error;
mod node;
#[cfg(test)]
mod tests;

use bytes::Bytes;
use slab::Slab;
use smallvec::SmallVec;

use crate::childs::{ChildSet, Childs, HugeChilds};
use crate::node::{CompResult, Node};

pub use crate::cursor::{Cursor, SeekOp};
pub use crate::error::TreeError;

/// Outcome of an [`RaxTree::insert`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was not previously present; it is now.
    Inserted,
    /// The key was already present; its value was overwritten.
    Updated,
}

impl InsertOutcome {
    fn replace_if(self, already_present: bool) -> Self {
        if already_present {
            InsertOutcome::Updated
        } else {
            self
        }
    }
}

/// An ordered, compressed radix tree mapping byte-string keys to [`Bytes`]
/// values.
///
/// See the crate documentation for an overview; see [`Cursor`] for ordered
/// iteration and relative seeks.
pub struct RaxTree {
    pub(crate) map: Slab<Node>,
    pub(crate) child_list: Slab<HugeChilds>,
    pub(crate) root_idx: u32,
    len: usize,
}

impl Default for RaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RaxTree {
    /// Above this length a single edge string is split into a chain of
    /// compressed nodes instead of one arbitrarily long allocation. This
    /// only affects how aggressively chains are compressed, never
    /// correctness (see DESIGN.md).
    pub const MAX_COMPRESSED_EDGE: usize = 255;

    /// Creates a new, empty tree, pre-allocated with capacity for 1024
    /// nodes.
    pub fn new() -> Self {
        let mut map = Slab::with_capacity(1024);
        let root_idx = map.insert(Node::default()) as u32;
        let child_list = Slab::with_capacity(32);

        Self {
            map,
            root_idx,
            child_list,
            len: 0,
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes currently allocated (always `>= 1`: the root).
    pub fn node_count(&self) -> usize {
        self.map.len()
    }

    /// Starts a new read-only cursor positioned before the first key.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    fn insert_node(&mut self, node: Node) -> u32 {
        self.map.insert(node) as u32
    }

    pub(crate) fn get_node(&self, idx: u32) -> &Node {
        self.try_get_node(idx)
            .expect("node index must be live for the duration of any call that uses it")
    }
    fn get_node_mut(&mut self, idx: u32) -> &mut Node {
        self.try_get_node_mut(idx)
            .expect("node index must be live for the duration of any call that uses it")
    }

    pub(crate) fn try_get_node(&self, idx: u32) -> Option<&Node> {
        self.map.get(idx as usize)
    }
    fn try_get_node_mut(&mut self, idx: u32) -> Option<&mut Node> {
        self.map.get_mut(idx as usize)
    }

    pub(crate) fn find(&self, idx: u32, radix: u8) -> Option<u32> {
        let childs = &self.try_get_node(idx)?.childs;
        if let Some(index) = childs.find(radix) {
            return Some(index);
        }
        self.child_list.get(childs.get_next_idx()? as usize)?.find(radix)
    }

    fn initiate_new_huge_child(&mut self, radix: u8, idx: u32) -> u32 {
        self.child_list.insert(HugeChilds::new(radix, idx)) as u32
    }
}

impl RaxTree {
    /// Retrieves the value associated with `key`, or `None` if it is absent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use raxtree::RaxTree;
    /// use bytes::Bytes;
    ///
    /// let mut tree = RaxTree::new();
    /// tree.insert(Bytes::from_static(b"hello"), Bytes::from_static(b"world")).unwrap();
    ///
    /// assert_eq!(tree.get(b"hello"), Some(Bytes::from_static(b"world")));
    /// assert_eq!(tree.get(b"missing"), None);
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        debug_assert!(key.is_ascii(), "key must be ASCII");
        let key_len = key.len();
        if key_len == 0 {
            let root = self.try_get_node(self.root_idx)?;
            return root.is_key.then(|| root.val.clone());
        }

        let mut idx = self.root_idx;
        let mut cursor = 0;

        loop {
            idx = self.find(idx, key[cursor])?;
            let node = self.try_get_node(idx)?;
            cursor += 1;
            match node.compare_compression_key(&key[cursor..]) {
                CompResult::Final => return node.is_key.then(|| node.val.clone()),
                CompResult::Partial(_) => return None,
                CompResult::Path => cursor += node.compression.len(),
            }
        }
    }

    /// Returns all key/value pairs whose key starts with `prefix`. An empty
    /// prefix returns every entry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use raxtree::RaxTree;
    /// use bytes::Bytes;
    ///
    /// let mut tree = RaxTree::new();
    /// tree.insert(Bytes::from_static(b"user:1"), Bytes::from_static(b"alice")).unwrap();
    /// tree.insert(Bytes::from_static(b"user:2"), Bytes::from_static(b"bob")).unwrap();
    /// tree.insert(Bytes::from_static(b"post:1"), Bytes::from_static(b"hello")).unwrap();
    ///
    /// assert_eq!(tree.get_prefix(b"user:").len(), 2);
    /// ```
    pub fn get_prefix(&self, prefix: &[u8]) -> Vec<(Bytes, Bytes)> {
        debug_assert!(prefix.is_ascii(), "prefix must be ASCII");
        let mut results = Vec::new();
        let prefix_len = prefix.len();

        if prefix_len == 0 {
            self.collect_all(self.root_idx, Vec::new(), &mut results);
            return results;
        }

        let mut idx = self.root_idx;
        let mut cursor = 0;
        let mut key_path: Vec<u8> = Vec::new();

        loop {
            let radix = prefix[cursor];
            let Some(child_idx) = self.find(idx, radix) else {
                return results;
            };
            idx = child_idx;
            key_path.push(radix);
            cursor += 1;

            let Some(node) = self.try_get_node(idx) else {
                return results;
            };

            match node.compare_compression_key(&prefix[cursor..]) {
                CompResult::Final => {
                    key_path.extend_from_slice(&node.compression);
                    self.collect_all_from(idx, key_path, &mut results);
                    return results;
                }
                CompResult::Partial(common_len) => {
                    let prefix_rest_len = prefix_len - cursor;
                    if common_len == prefix_rest_len {
                        key_path.extend_from_slice(&node.compression);
                        self.collect_all_from(idx, key_path, &mut results);
                    }
                    return results;
                }
                CompResult::Path => {
                    key_path.extend_from_slice(&node.compression);
                    cursor += node.compression.len();
                }
            }
        }
    }

    /// Collects starting from `node_idx`, whose own full key is already in
    /// `key_path` (its edge string is not appended again).
    fn collect_all_from(&self, node_idx: u32, key_path: Vec<u8>, results: &mut Vec<(Bytes, Bytes)>) {
        let Some(node) = self.try_get_node(node_idx) else {
            return;
        };
        if node.is_key {
            results.push((Bytes::from(key_path.clone()), node.val.clone()));
        }
        self.iter_all_children(node_idx, |radix, child_idx| {
            let mut child_key = key_path.clone();
            child_key.push(radix);
            self.collect_all(child_idx, child_key, results);
        });
    }

    /// Recursively collects, appending `node_idx`'s own edge string first.
    fn collect_all(&self, node_idx: u32, mut key_prefix: Vec<u8>, results: &mut Vec<(Bytes, Bytes)>) {
        let Some(node) = self.try_get_node(node_idx) else {
            return;
        };
        key_prefix.extend_from_slice(&node.compression);
        if node.is_key {
            results.push((Bytes::from(key_prefix.clone()), node.val.clone()));
        }
        self.iter_all_children(node_idx, |radix, child_idx| {
            let mut child_key = key_prefix.clone();
            child_key.push(radix);
            self.collect_all(child_idx, child_key, results);
        });
    }

    fn iter_all_children<F: FnMut(u8, u32)>(&self, node_idx: u32, mut f: F) {
        let Some(node) = self.try_get_node(node_idx) else {
            return;
        };
        for (radix, child_idx) in node.childs.iter() {
            f(radix, child_idx);
        }
        if let Some(huge_idx) = node.childs.get_next_idx() {
            if let Some(huge_childs) = self.child_list.get(huge_idx as usize) {
                for (radix, child_idx) in huge_childs.iter() {
                    f(radix, child_idx);
                }
            }
        }
    }

    /// Inserts or updates the value for `key`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use raxtree::{RaxTree, InsertOutcome};
    /// use bytes::Bytes;
    ///
    /// let mut tree = RaxTree::new();
    /// let outcome = tree.insert(Bytes::from_static(b"key"), Bytes::from_static(b"v1")).unwrap();
    /// assert_eq!(outcome, InsertOutcome::Inserted);
    ///
    /// let outcome = tree.insert(Bytes::from_static(b"key"), Bytes::from_static(b"v2")).unwrap();
    /// assert_eq!(outcome, InsertOutcome::Updated);
    /// assert_eq!(tree.get(b"key"), Some(Bytes::from_static(b"v2")));
    /// ```
    pub fn insert(&mut self, key: Bytes, val: Bytes) -> Result<InsertOutcome, TreeError> {
        debug_assert!(key.is_ascii(), "key must be ASCII");
        let key_len = key.len();
        if key_len == 0 {
            let root = self.get_node_mut(self.root_idx);
            let was_key = root.is_key;
            root.set_value(val);
            if !was_key {
                self.len += 1;
            }
            return Ok(InsertOutcome::Inserted.replace_if(was_key));
        }

        let mut idx = self.root_idx;
        let mut cursor = 0;

        loop {
            let Some(child_idx) = self.find(idx, key[cursor]) else {
                self.create_node_with_val(idx, key[cursor], val, &key[(cursor + 1)..]);
                self.len += 1;
                log::trace!("insert: appended new suffix at node {idx}");
                return Ok(InsertOutcome::Inserted);
            };
            idx = child_idx;
            cursor += 1;
            let comparison = self.get_node(idx).compare_compression_key(&key[cursor..]);
            let common_len = match comparison {
                CompResult::Final => {
                    let node = self.get_node_mut(idx);
                    let was_key = node.is_key;
                    node.set_value(val);
                    if !was_key {
                        self.len += 1;
                    }
                    return Ok(InsertOutcome::Inserted.replace_if(was_key));
                }
                CompResult::Path => {
                    cursor += self.get_node(idx).compression.len();
                    continue;
                }
                CompResult::Partial(common_len) => common_len,
            };

            // Case B/C: `idx`'s edge string only partially matches what's left of `key`.
            log::trace!("insert: splitting compressed node {idx} at offset {common_len}");
            let key_rest = &key[cursor..];
            let val_on_intermediate = common_len == key_rest.len();

            let (old_compression, old_is_key, old_val, old_childs) = {
                let node = self.get_node_mut(idx);
                let old_compression = std::mem::take(&mut node.compression);
                let old_is_key = node.is_key;
                let old_val = std::mem::take(&mut node.val);
                let old_childs = std::mem::take(&mut node.childs);

                node.compression = SmallVec::from_slice(&old_compression[..common_len]);
                node.is_key = false;
                if val_on_intermediate {
                    node.set_value(val.clone());
                }

                (old_compression, old_is_key, old_val, old_childs)
            };

            let old_radix = old_compression[common_len];
            let old_child = Node {
                compression: SmallVec::from_slice(&old_compression[common_len + 1..]),
                is_key: old_is_key,
                val: old_val,
                childs: old_childs,
            };
            let old_child_idx = self.insert_node(old_child);
            self.get_node_mut(idx).childs.insert(old_radix, old_child_idx);

            if !val_on_intermediate {
                let new_radix = key_rest[common_len];
                let new_compression = &key_rest[common_len + 1..];
                self.create_node_with_val(idx, new_radix, val, new_compression);
            }

            self.len += 1;
            return Ok(InsertOutcome::Inserted);
        }
    }

    /// Builds the (possibly chained, see [`Self::MAX_COMPRESSED_EDGE`]) node
    /// holding the tail `suffix` of a key, with `val` on the innermost node,
    /// and attaches it to `parent_idx` under edge byte `radix`.
    fn create_node_with_val(&mut self, parent_idx: u32, radix: u8, val: Bytes, suffix: &[u8]) {
        let (is_full, huge_child_idx) = {
            let parent = self.get_node(parent_idx);
            (parent.childs.is_full(), parent.get_huge_childs_idx())
        };
        let new_idx = self.build_suffix_chain(suffix, val);
        match (is_full, huge_child_idx) {
            (false, _) => {
                self.get_node_mut(parent_idx).childs.insert(radix, new_idx);
            }
            (true, None) => {
                let huge_idx = self.initiate_new_huge_child(radix, new_idx);
                self.get_node_mut(parent_idx).childs.set_new_childs(huge_idx);
            }
            (true, Some(huge_idx)) => {
                self.child_list
                    .get_mut(huge_idx as usize)
                    .expect("a node reporting a huge-childs index must have a live block")
                    .insert(radix, new_idx);
            }
        }
    }

    fn build_suffix_chain(&mut self, suffix: &[u8], val: Bytes) -> u32 {
        if suffix.len() <= Self::MAX_COMPRESSED_EDGE {
            return self.insert_node(Node::new_leaf(suffix, val));
        }
        let head = &suffix[..Self::MAX_COMPRESSED_EDGE];
        let radix = suffix[Self::MAX_COMPRESSED_EDGE];
        let rest = &suffix[Self::MAX_COMPRESSED_EDGE + 1..];
        let child_idx = self.build_suffix_chain(rest, val);
        let mut node = Node {
            compression: SmallVec::from_slice(head),
            is_key: false,
            val: Bytes::new(),
            childs: Childs::default(),
        };
        node.childs.insert(radix, child_idx);
        self.insert_node(node)
    }

    /// Deletes `key`, returning its value if it was present.
    ///
    /// # Example
    ///
    /// ```rust
    /// use raxtree::RaxTree;
    /// use bytes::Bytes;
    ///
    /// let mut tree = RaxTree::new();
    /// tree.insert(Bytes::from_static(b"key"), Bytes::from_static(b"value")).unwrap();
    ///
    /// assert_eq!(tree.remove(b"key"), Some(Bytes::from_static(b"value")));
    /// assert_eq!(tree.get(b"key"), None);
    /// ```
    pub fn remove(&mut self, key: &[u8]) -> Option<Bytes> {
        debug_assert!(key.is_ascii(), "key must be ASCII");
        let key_len = key.len();
        if key_len == 0 {
            let old_val = self.get_node_mut(self.root_idx).take_value();
            if old_val.is_some() {
                self.len -= 1;
            }
            return old_val;
        }

        let mut ancestors: Vec<(u32, u8)> = Vec::new();
        let mut idx = self.root_idx;
        let mut cursor = 0;

        let target_idx = loop {
            let radix = key[cursor];
            let child_idx = self.find(idx, radix)?;
            ancestors.push((idx, radix));
            idx = child_idx;
            cursor += 1;

            let node = self.try_get_node(idx)?;
            match node.compare_compression_key(&key[cursor..]) {
                CompResult::Final => break idx,
                CompResult::Partial(_) => return None,
                CompResult::Path => cursor += node.compression.len(),
            }
        };

        let has_children = {
            let node = self.get_node(target_idx);
            !node.childs.is_empty() || node.childs.get_next_idx().is_some()
        };

        if has_children {
            let old_val = self.get_node_mut(target_idx).take_value()?;
            self.len -= 1;
            self.try_recompress(target_idx);
            Some(old_val)
        } else {
            let node = self.map.remove(target_idx as usize);
            let old_val = if node.is_key { Some(node.val) } else { None };
            if old_val.is_some() {
                self.len -= 1;
            }
            log::trace!("remove: pruned leaf node {target_idx}");

            // Phase 1: upward pruning cascade. Cut the link from the
            // immediate parent, then keep walking up while the ancestor at
            // hand is left non-key and childless, freeing each one in turn.
            // Stop (and single-absorb via `try_recompress`) at the first
            // ancestor that is either a key or still has a child, or at the
            // root, which is never freed or recompressed.
            while let Some((anc_idx, anc_radix)) = ancestors.pop() {
                self.remove_child(anc_idx, anc_radix);
                if anc_idx == self.root_idx {
                    break;
                }
                let anc = self.get_node(anc_idx);
                let anc_childless = anc.childs.is_empty() && anc.childs.get_next_idx().is_none();
                if anc.is_key || !anc_childless {
                    self.try_recompress(anc_idx);
                    break;
                }
                log::trace!("remove: pruned now-empty ancestor node {anc_idx}");
                self.map.remove(anc_idx as usize);
            }

            old_val
        }
    }

    /// Deletes every key starting with `prefix`, returning how many were
    /// removed. An empty prefix clears the tree.
    ///
    /// # Example
    ///
    /// ```rust
    /// use raxtree::RaxTree;
    /// use bytes::Bytes;
    ///
    /// let mut tree = RaxTree::new();
    /// tree.insert(Bytes::from_static(b"user:1"), Bytes::from_static(b"alice")).unwrap();
    /// tree.insert(Bytes::from_static(b"user:2"), Bytes::from_static(b"bob")).unwrap();
    /// tree.insert(Bytes::from_static(b"post:1"), Bytes::from_static(b"hello")).unwrap();
    ///
    /// assert_eq!(tree.remove_prefix(b"user:"), 2);
    /// assert_eq!(tree.get_prefix(b"").len(), 1);
    /// ```
    pub fn remove_prefix(&mut self, prefix: &[u8]) -> usize {
        debug_assert!(prefix.is_ascii(), "prefix must be ASCII");
        let prefix_len = prefix.len();

        if prefix_len == 0 {
            let root = self.get_node_mut(self.root_idx);
            let had_val = root.take_value().is_some();
            let childs_to_free = self.collect_child_indices(self.root_idx);
            self.get_node_mut(self.root_idx).childs = Childs::default();
            let freed = self.free_subtree_iterative(childs_to_free);
            let total = freed + usize::from(had_val);
            self.len -= total;
            return total;
        }

        let mut parent_idx = self.root_idx;
        let mut parent_radix = prefix[0];
        let Some(mut idx) = self.find(parent_idx, parent_radix) else {
            return 0;
        };
        let mut cursor = 1;

        let target_idx = loop {
            let Some(node) = self.try_get_node(idx) else {
                return 0;
            };
            match node.compare_compression_key(&prefix[cursor..]) {
                CompResult::Final => break idx,
                CompResult::Partial(common_len) => {
                    let prefix_rest_len = prefix_len - cursor;
                    if common_len == prefix_rest_len {
                        break idx;
                    }
                    return 0;
                }
                CompResult::Path => cursor += node.compression.len(),
            }

            parent_idx = idx;
            parent_radix = prefix[cursor];
            let Some(child_idx) = self.find(idx, parent_radix) else {
                return 0;
            };
            idx = child_idx;
            cursor += 1;
        };

        self.remove_child(parent_idx, parent_radix);
        let count = self.free_subtree_iterative(vec![target_idx]);
        self.len -= count;

        if parent_idx != self.root_idx {
            self.try_recompress(parent_idx);
        }

        count
    }

    fn collect_child_indices(&self, node_idx: u32) -> Vec<u32> {
        let mut indices = Vec::new();
        self.iter_all_children(node_idx, |_, child_idx| indices.push(child_idx));
        indices
    }

    /// Frees a subtree iteratively (no recursion, so depth does not risk
    /// stack overflow), returning the number of keys it contained.
    fn free_subtree_iterative(&mut self, initial_nodes: Vec<u32>) -> usize {
        let mut stack = initial_nodes;
        let mut count = 0;

        while let Some(node_idx) = stack.pop() {
            let (children, has_val, huge_child_idx) = {
                let Some(node) = self.try_get_node(node_idx) else {
                    continue;
                };
                let mut children: Vec<u32> = node.childs.iter().map(|(_, idx)| idx).collect();
                let huge_idx = node.childs.get_next_idx();
                if let Some(hi) = huge_idx {
                    if let Some(huge_childs) = self.child_list.get(hi as usize) {
                        children.extend(huge_childs.iter().map(|(_, idx)| idx));
                    }
                }
                (children, node.is_key, huge_idx)
            };

            stack.extend(children);
            if has_val {
                count += 1;
            }
            if let Some(huge_idx) = huge_child_idx {
                self.child_list.remove(huge_idx as usize);
            }
            self.map.remove(node_idx as usize);
        }

        count
    }

    /// Returns `(radix, idx)` if `node_idx` has exactly one child overall,
    /// counting across both the inline set and the overflow block.
    /// [`Childs::get_single_child`] alone only sees the inline set, so it
    /// misses a lone child stranded in the overflow block — reachable once
    /// a node has overflowed past `CHILDS_SIZE` children and is later
    /// pruned back down to one. This falls back to the overflow block when
    /// the inline set is empty but an overflow block with exactly one
    /// surviving entry exists.
    fn single_child(&self, node_idx: u32) -> Option<(u8, u32)> {
        let node = self.get_node(node_idx);
        if let Some(found) = node.childs.get_single_child() {
            return Some(found);
        }
        if !node.childs.is_empty() {
            return None;
        }
        let huge_idx = node.childs.get_next_idx()?;
        let huge = self.child_list.get(huge_idx as usize)?;
        if huge.len() == 1 {
            huge.iter().next()
        } else {
            None
        }
    }

    /// If `node_idx` is not a key and has exactly one child, absorbs that
    /// child into it, restoring maximal compression.
    ///
    /// Never recompresses the root: every other operation walks from the
    /// root assuming its own edge string is empty (the root addresses the
    /// empty-string prefix), so absorbing a child into it would make that
    /// assumption false for every later lookup.
    fn try_recompress(&mut self, node_idx: u32) {
        if node_idx == self.root_idx {
            return;
        }
        let node = self.get_node(node_idx);
        if node.is_key {
            return;
        }
        let Some((child_radix, child_idx)) = self.single_child(node_idx) else {
            return;
        };

        // The sole child may be the last entry of an overflow block (the
        // inline set is empty in that case); that block is now dead and its
        // slab slot can be freed, since the node's overflow pointer is
        // about to be overwritten wholesale by the absorbed child's own
        // child set anyway.
        let node = self.get_node(node_idx);
        if node.childs.is_empty() {
            if let Some(huge_idx) = node.childs.get_next_idx() {
                self.child_list.remove(huge_idx as usize);
            }
        }

        let child = self.map.remove(child_idx as usize);
        log::trace!("recompress: absorbing node {child_idx} into {node_idx}");
        let node = self.get_node_mut(node_idx);
        node.compression.push(child_radix);
        node.compression.extend_from_slice(&child.compression);
        node.is_key = child.is_key;
        node.val = child.val;
        node.childs = child.childs;
    }

    fn remove_child(&mut self, parent_idx: u32, radix: u8) {
        let parent = self.get_node_mut(parent_idx);
        if parent.childs.remove(radix).is_some() {
            return;
        }
        let Some(huge_idx) = parent.childs.get_next_idx() else {
            return;
        };
        let huge = self
            .child_list
            .get_mut(huge_idx as usize)
            .expect("a node reporting a huge-childs index must have a live block");
        huge.remove(radix);
        if huge.is_empty() {
            self.child_list.remove(huge_idx as usize);
            self.get_node_mut(parent_idx).childs.clear_next_idx();
        }
    }
}

impl std::fmt::Debug for RaxTree {
    /// Diagnostic-only ASCII rendering of the tree; not parsed by any
    /// consumer, and not part of any stability contract.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_node(f, self.root_idx, 0)
    }
}

impl RaxTree {
    fn fmt_node(&self, f: &mut std::fmt::Formatter<'_>, idx: u32, depth: usize) -> std::fmt::Result {
        let Some(node) = self.try_get_node(idx) else {
            return Ok(());
        };
        writeln!(
            f,
            "{}[{}]{}",
            "  ".repeat(depth),
            String::from_utf8_lossy(&node.compression),
            if node.is_key { " *" } else { "" }
        )?;
        for (_, child_idx) in node.childs.iter() {
            self.fmt_node(f, child_idx, depth + 1)?;
        }
        if let Some(huge_idx) = node.childs.get_next_idx() {
            if let Some(huge) = self.child_list.get(huge_idx as usize) {
                for (_, child_idx) in huge.iter() {
                    self.fmt_node(f, child_idx, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}
