//! Ordered iteration and relative seeking.
//!
//! A [`Cursor`] holds no reference into the tree's internal structure
//! (indices, stacks) between calls; every `next`/`prev`/`seek` re-derives its
//! new position from the tree root and the previous key. This costs O(depth)
//! per step rather than the O(1) amortized a resumable DFS stack would give,
//! in exchange for a much smaller surface to get wrong: the same relational
//! search (`seek_ge`/`seek_le`) backs every operation.

use bytes::Bytes;

use crate::RaxTree;
use crate::TreeError;
use crate::childs::ChildSet;
use crate::node::CompResult;

/// A relative position to seek a [`Cursor`] to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOp {
    /// The smallest key in the tree.
    First,
    /// The largest key in the tree.
    Last,
    /// The given key, if present.
    Eq,
    /// The smallest key `>= ` the given key.
    Ge,
    /// The smallest key `>` the given key.
    Gt,
    /// The largest key `<=` the given key.
    Le,
    /// The largest key `<` the given key.
    Lt,
}

impl TryFrom<&str> for SeekOp {
    type Error = TreeError;

    fn try_from(op: &str) -> Result<Self, Self::Error> {
        match op {
            "^" => Ok(SeekOp::First),
            "$" => Ok(SeekOp::Last),
            "==" => Ok(SeekOp::Eq),
            ">=" => Ok(SeekOp::Ge),
            ">" => Ok(SeekOp::Gt),
            "<=" => Ok(SeekOp::Le),
            "<" => Ok(SeekOp::Lt),
            other => Err(TreeError::InvalidSeekOp(other.to_string())),
        }
    }
}

#[derive(Clone)]
enum CursorState {
    NotStarted,
    /// Just landed here via `seek`; not yet "confirmed" by a `next`/`prev`
    /// call. The first such call reports this key without moving past it;
    /// only the following one actually advances. This mirrors the
    /// reference crate's own seek/next split: `seek` locates the pivot,
    /// `next`/`prev` is what the caller uses to actually read it off.
    Pending(Vec<u8>, Bytes),
    Positioned(Vec<u8>, Bytes),
    Eof,
}

/// A read-only ordered cursor over a [`RaxTree`].
///
/// A freshly created cursor is positioned before the first key; calling
/// [`Cursor::next`] moves it to the smallest key, matching the usual
/// `while cursor.next() { ... }` iteration idiom.
///
/// [`Cursor::seek`] locates a pivot but, like the reference crate's own
/// iterator, does not by itself count as "reading" it: the first
/// `next`/`prev` call afterward reports the pivot itself without moving
/// past it, and only a second such call actually advances. This lets
/// `seek(">=", k)` followed by a single `next()` return the `>=` match
/// directly, regardless of which of `next`/`prev` is used to read it.
///
/// Falling off either end parks the cursor at EOF; a cursor parked at EOF
/// stays there until re-seeked (it does not silently wrap around).
pub struct Cursor<'a> {
    tree: &'a RaxTree,
    state: CursorState,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tree: &'a RaxTree) -> Self {
        Self {
            tree,
            state: CursorState::NotStarted,
        }
    }

    /// Positions the cursor per `op` relative to `key`. Returns whether a
    /// qualifying key exists (`false` means EOF). The match, if any, is
    /// reported by the following `next`/`prev` call — see the type docs.
    pub fn seek(&mut self, op: SeekOp, key: &[u8]) -> bool {
        match self.tree.seek_relative(op, key) {
            Some((k, v)) => {
                self.state = CursorState::Pending(k, v);
                true
            }
            None => {
                self.state = CursorState::Eof;
                false
            }
        }
    }

    /// As [`Cursor::seek`], but parses `op` from its string form (`"^"`,
    /// `"$"`, `"=="`, `">="`, `">"`, `"<="`, `"<"`).
    pub fn try_seek(&mut self, op: &str, key: &[u8]) -> Result<bool, TreeError> {
        let op = SeekOp::try_from(op)?;
        Ok(self.seek(op, key))
    }

    /// Advances to the next key in ascending order. Returns whether the
    /// cursor landed on a key.
    pub fn next(&mut self) -> bool {
        match std::mem::replace(&mut self.state, CursorState::Eof) {
            CursorState::NotStarted => {
                let result = self.tree.first_key_from(self.tree.root_idx, Vec::new(), true);
                self.land(result)
            }
            CursorState::Pending(k, v) => {
                self.state = CursorState::Positioned(k, v);
                true
            }
            CursorState::Positioned(key, _) => {
                let result = self.tree.seek_ge(self.tree.root_idx, Vec::new(), &key, false);
                self.land(result)
            }
            CursorState::Eof => false,
        }
    }

    /// Moves to the previous key in ascending order. Returns whether the
    /// cursor landed on a key.
    pub fn prev(&mut self) -> bool {
        match std::mem::replace(&mut self.state, CursorState::Eof) {
            CursorState::NotStarted => {
                let result = self.tree.last_key_from(self.tree.root_idx, Vec::new(), true);
                self.land(result)
            }
            CursorState::Pending(k, v) => {
                self.state = CursorState::Positioned(k, v);
                true
            }
            CursorState::Positioned(key, _) => {
                let result = self.tree.seek_le(self.tree.root_idx, Vec::new(), &key, false);
                self.land(result)
            }
            CursorState::Eof => false,
        }
    }

    fn land(&mut self, result: Option<(Vec<u8>, Bytes)>) -> bool {
        match result {
            Some((k, v)) => {
                self.state = CursorState::Positioned(k, v);
                true
            }
            None => {
                self.state = CursorState::Eof;
                false
            }
        }
    }

    /// The key at the cursor's current position, or `None` at EOF / before
    /// the first call to `next`/`prev`/`seek`.
    pub fn key(&self) -> Option<&[u8]> {
        match &self.state {
            CursorState::Pending(k, _) | CursorState::Positioned(k, _) => Some(k),
            _ => None,
        }
    }

    /// The value at the cursor's current position.
    pub fn value(&self) -> Option<&Bytes> {
        match &self.state {
            CursorState::Pending(_, v) | CursorState::Positioned(_, v) => Some(v),
            _ => None,
        }
    }

    /// Whether the cursor is currently positioned at EOF.
    pub fn is_eof(&self) -> bool {
        matches!(self.state, CursorState::Eof)
    }

    /// Performs a random walk of `steps` moves from the cursor's current
    /// position (or the root, if not yet positioned), uniformly choosing at
    /// each step among the current node's parent (if any) and each of its
    /// children. The cursor is repositioned on the last key node entered
    /// along the walk, if any. Returns whether the cursor moved.
    ///
    /// This is primarily a statistical coverage / fuzzing aid: it visits
    /// tree structure, not just key-bearing nodes, so intermediate steps
    /// may pass through non-key nodes without updating the cursor's
    /// reported position.
    pub fn random_walk(&mut self, steps: usize, rng: &mut impl rand::Rng) -> bool {
        use rand::Rng;

        let start_key = match &self.state {
            CursorState::Pending(k, _) | CursorState::Positioned(k, _) => k.clone(),
            _ => Vec::new(),
        };
        let Some((mut ancestors, mut cur_idx, mut key)) = self.tree.locate_node_path(&start_key)
        else {
            return false;
        };

        let mut moved = false;
        for _ in 0..steps {
            let children = self.tree.ordered_children(cur_idx);
            let has_parent = !ancestors.is_empty();
            let choices = children.len() + usize::from(has_parent);
            if choices == 0 {
                break;
            }

            let pick = rng.gen_range(0..choices);
            if has_parent && pick == 0 {
                let node = self.tree.get_node(cur_idx);
                let drop_len = node.compression.len() + 1;
                let new_len = key.len().saturating_sub(drop_len);
                key.truncate(new_len);
                cur_idx = ancestors.pop().expect("has_parent checked above");
            } else {
                let child_pos = pick - usize::from(has_parent);
                let (radix, child_idx) = children[child_pos];
                ancestors.push(cur_idx);
                key.push(radix);
                key.extend_from_slice(&self.tree.get_node(child_idx).compression);
                cur_idx = child_idx;
            }

            moved = true;
            let node = self.tree.get_node(cur_idx);
            if node.is_key {
                self.state = CursorState::Positioned(key.clone(), node.val.clone());
            }
        }

        moved
    }
}

/// Classification of a node's edge string against the unconsumed remainder
/// of a relative-seek target.
enum Locate {
    /// Edge string and remainder match exactly.
    Equal,
    /// Edge string is a strict prefix of the remainder; descend to the
    /// child reached by the given next byte, `common_len` bytes in.
    Continue(u8, usize),
    /// This node's subtree is entirely greater than the target.
    NodeGreater,
    /// This node's subtree is entirely less than the target.
    NodeLess,
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn locate(compression: &[u8], rest: &[u8]) -> Locate {
    let common = common_prefix_len(compression, rest);
    if common == compression.len() && common == rest.len() {
        Locate::Equal
    } else if common == compression.len() {
        Locate::Continue(rest[common], common)
    } else if common == rest.len() {
        Locate::NodeGreater
    } else if compression[common] > rest[common] {
        Locate::NodeGreater
    } else {
        Locate::NodeLess
    }
}

impl RaxTree {
    pub(crate) fn seek_relative(&self, op: SeekOp, key: &[u8]) -> Option<(Vec<u8>, Bytes)> {
        match op {
            SeekOp::First => self.first_key_from(self.root_idx, Vec::new(), true),
            SeekOp::Last => self.last_key_from(self.root_idx, Vec::new(), true),
            SeekOp::Eq => self.get(key).map(|v| (key.to_vec(), v)),
            SeekOp::Ge => self.seek_ge(self.root_idx, Vec::new(), key, true),
            SeekOp::Gt => self.seek_ge(self.root_idx, Vec::new(), key, false),
            SeekOp::Le => self.seek_le(self.root_idx, Vec::new(), key, true),
            SeekOp::Lt => self.seek_le(self.root_idx, Vec::new(), key, false),
        }
    }

    pub(crate) fn ordered_children(&self, node_idx: u32) -> Vec<(u8, u32)> {
        let node = self.get_node(node_idx);
        let primary: Vec<(u8, u32)> = node.childs.iter().collect();
        let Some(huge_idx) = node.childs.get_next_idx() else {
            return primary;
        };
        let Some(huge) = self.child_list.get(huge_idx as usize) else {
            return primary;
        };

        let mut merged = Vec::with_capacity(primary.len() + huge.len());
        let mut a = primary.into_iter().peekable();
        let mut b = huge.iter().peekable();
        loop {
            match (a.peek(), b.peek()) {
                (Some(&(ra, _)), Some(&(rb, _))) => {
                    if ra <= rb {
                        merged.push(a.next().unwrap());
                    } else {
                        merged.push(b.next().unwrap());
                    }
                }
                (Some(_), None) => merged.push(a.next().unwrap()),
                (None, Some(_)) => merged.push(b.next().unwrap()),
                (None, None) => break,
            }
        }
        merged
    }

    /// Smallest key in the subtree rooted at `idx`, whose accumulated path
    /// so far is `prefix`. If `include_self` is false, the node `idx`
    /// itself is never returned even if it is a key (used to implement
    /// strict `>`).
    pub(crate) fn first_key_from(
        &self,
        idx: u32,
        prefix: Vec<u8>,
        include_self: bool,
    ) -> Option<(Vec<u8>, Bytes)> {
        let node = self.get_node(idx);
        let mut full = prefix;
        full.extend_from_slice(&node.compression);

        if include_self && node.is_key {
            return Some((full, node.val.clone()));
        }

        let children = self.ordered_children(idx);
        let &(radix, child_idx) = children.first()?;
        full.push(radix);
        self.first_key_from(child_idx, full, true)
    }

    /// Largest key in the subtree rooted at `idx`, mirroring
    /// [`Self::first_key_from`].
    pub(crate) fn last_key_from(
        &self,
        idx: u32,
        prefix: Vec<u8>,
        include_self: bool,
    ) -> Option<(Vec<u8>, Bytes)> {
        let node = self.get_node(idx);
        let mut full = prefix;
        full.extend_from_slice(&node.compression);

        let children = self.ordered_children(idx);
        if let Some(&(radix, child_idx)) = children.last() {
            let mut child_prefix = full.clone();
            child_prefix.push(radix);
            if let Some(found) = self.last_key_from(child_idx, child_prefix, true) {
                return Some(found);
            }
        }

        if include_self && node.is_key {
            return Some((full, node.val.clone()));
        }
        None
    }

    /// Smallest key `>= rest` (or `> rest` if `!inclusive`) in the subtree
    /// rooted at `idx`, whose accumulated path so far is `prefix`.
    pub(crate) fn seek_ge(
        &self,
        idx: u32,
        prefix: Vec<u8>,
        rest: &[u8],
        inclusive: bool,
    ) -> Option<(Vec<u8>, Bytes)> {
        let node = self.get_node(idx);
        match locate(&node.compression, rest) {
            Locate::Equal => self.first_key_from(idx, prefix, inclusive),
            Locate::NodeGreater => self.first_key_from(idx, prefix, true),
            Locate::NodeLess => None,
            Locate::Continue(radix, common) => {
                let mut full = prefix;
                full.extend_from_slice(&node.compression);
                let new_rest = &rest[common + 1..];

                if let Some(child_idx) = self.find(idx, radix) {
                    let mut child_prefix = full.clone();
                    child_prefix.push(radix);
                    if let Some(found) = self.seek_ge(child_idx, child_prefix, new_rest, inclusive) {
                        return Some(found);
                    }
                }

                let children = self.ordered_children(idx);
                let next_sibling = children.iter().find(|&&(r, _)| r > radix);
                if let Some(&(r2, c2)) = next_sibling {
                    let mut child_prefix = full;
                    child_prefix.push(r2);
                    return self.first_key_from(c2, child_prefix, true);
                }
                None
            }
        }
    }

    /// Largest key `<= rest` (or `< rest` if `!inclusive`) in the subtree
    /// rooted at `idx`, mirroring [`Self::seek_ge`].
    pub(crate) fn seek_le(
        &self,
        idx: u32,
        prefix: Vec<u8>,
        rest: &[u8],
        inclusive: bool,
    ) -> Option<(Vec<u8>, Bytes)> {
        let node = self.get_node(idx);
        match locate(&node.compression, rest) {
            Locate::Equal => {
                if inclusive && node.is_key {
                    let mut full = prefix;
                    full.extend_from_slice(&node.compression);
                    Some((full, node.val.clone()))
                } else {
                    None
                }
            }
            Locate::NodeGreater => None,
            Locate::NodeLess => self.last_key_from(idx, prefix, true),
            Locate::Continue(radix, common) => {
                let mut full = prefix;
                full.extend_from_slice(&node.compression);
                let new_rest = &rest[common + 1..];

                if let Some(child_idx) = self.find(idx, radix) {
                    let mut child_prefix = full.clone();
                    child_prefix.push(radix);
                    if let Some(found) = self.seek_le(child_idx, child_prefix, new_rest, inclusive) {
                        return Some(found);
                    }
                }

                let children = self.ordered_children(idx);
                let prev_sibling = children.iter().rev().find(|&&(r, _)| r < radix);
                if let Some(&(r2, c2)) = prev_sibling {
                    let mut child_prefix = full;
                    child_prefix.push(r2);
                    return self.last_key_from(c2, child_prefix, true);
                }
                None
            }
        }
    }

    /// Walks down to the node exactly matching `key`, returning the stack
    /// of ancestor node indices, the matched node's index, and its full
    /// (re-derived) key. Used by [`Cursor::random_walk`] to seed a walk
    /// from an arbitrary starting key.
    pub(crate) fn locate_node_path(&self, key: &[u8]) -> Option<(Vec<u32>, u32, Vec<u8>)> {
        let mut idx = self.root_idx;
        let root = self.get_node(idx);
        let mut keybuf: Vec<u8> = root.compression.to_vec();

        if key.len() < keybuf.len() || key[..keybuf.len()] != keybuf[..] {
            return None;
        }

        let mut cursor = keybuf.len();
        let mut ancestors = Vec::new();

        while cursor < key.len() {
            let next_idx = self.find(idx, key[cursor])?;
            ancestors.push(idx);
            idx = next_idx;
            cursor += 1;

            let node = self.get_node(idx);
            match node.compare_compression_key(&key[cursor..]) {
                CompResult::Final => {
                    keybuf.extend_from_slice(&node.compression);
                    cursor = key.len();
                }
                CompResult::Path => {
                    keybuf.extend_from_slice(&node.compression);
                    cursor += node.compression.len();
                }
                CompResult::Partial(_) => return None,
            }
        }

        Some((ancestors, idx, keybuf))
    }
}
