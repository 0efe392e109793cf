use bytes::Bytes;

use crate::{InsertOutcome, RaxTree, SeekOp, TreeError};

fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

/// Installs a logger so the `trace!` events emitted at split/recompress/
/// prune points (see `src/lib.rs`) are actually surfaced when these tests
/// run with `RUST_LOG=trace`. Safe to call from every test: `try_init`
/// only installs the logger on the first call and is a no-op afterward.
fn init_logging() {
    let _ = env_logger::try_init();
}

#[test]
fn get_returns_none_on_empty_tree() {
    let tree = RaxTree::new();
    assert_eq!(tree.get(b"anything".as_ref()), None);
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
}

#[test]
fn insert_then_get_roundtrips() {
    let mut tree = RaxTree::new();
    tree.insert(b("hello"), b("world")).unwrap();
    assert_eq!(tree.get(b"hello"), Some(b("world")));
    assert_eq!(tree.len(), 1);
}

#[test]
fn insert_reports_inserted_then_updated() {
    let mut tree = RaxTree::new();
    let first = tree.insert(b("key"), b("v1")).unwrap();
    assert_eq!(first, InsertOutcome::Inserted);
    assert_eq!(tree.len(), 1);

    let second = tree.insert(b("key"), b("v2")).unwrap();
    assert_eq!(second, InsertOutcome::Updated);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(b"key"), Some(b("v2")));
}

#[test]
fn empty_key_is_a_valid_key() {
    let mut tree = RaxTree::new();
    tree.insert(b(""), b("root-value")).unwrap();
    assert_eq!(tree.get(b""), Some(b("root-value")));
    assert_eq!(tree.len(), 1);
}

#[test]
fn remove_missing_key_is_none() {
    let mut tree = RaxTree::new();
    tree.insert(b("foo"), b("bar")).unwrap();
    assert_eq!(tree.remove(b"nope"), None);
    assert_eq!(tree.len(), 1);
}

#[test]
fn remove_roundtrip() {
    let mut tree = RaxTree::new();
    tree.insert(b("key"), b("value")).unwrap();
    assert_eq!(tree.remove(b"key"), Some(b("value")));
    assert_eq!(tree.get(b"key"), None);
    assert_eq!(tree.len(), 0);
}

/// `foo`/`foobar` split then remove `foo`: the residual chain should
/// recompress into a single node whose edge string is `foobar`.
#[test]
fn foo_foobar_recompresses_after_removing_foo() {
    init_logging();
    let mut tree = RaxTree::new();
    tree.insert(b("foo"), b("1")).unwrap();
    tree.insert(b("foobar"), b("2")).unwrap();

    assert_eq!(tree.remove(b"foo"), Some(b("1")));
    assert_eq!(tree.get(b"foobar"), Some(b("2")));
    assert_eq!(tree.get(b"foo"), None);
    assert_eq!(tree.len(), 1);
    // one key node, holding the fully recompressed "foobar" edge plus root
    assert_eq!(tree.node_count(), 2);
}

/// `foobar`/`footer` split then remove `footer`: residual chain
/// recompresses to a node with edge string `foobar`.
#[test]
fn foobar_footer_recompresses_after_removing_footer() {
    init_logging();
    let mut tree = RaxTree::new();
    tree.insert(b("foobar"), b("1")).unwrap();
    tree.insert(b("footer"), b("2")).unwrap();

    assert_eq!(tree.remove(b"footer"), Some(b("2")));
    assert_eq!(tree.get(b"foobar"), Some(b("1")));
    assert_eq!(tree.get(b"footer"), None);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.node_count(), 2);
}

/// Insert key `D`, then empty key `""` with a null (empty) value, then
/// remove `D`: must not read past the node record, and `""` must survive.
#[test]
fn null_value_key_survives_sibling_removal() {
    init_logging();
    let mut tree = RaxTree::new();
    tree.insert(b("D"), b("1")).unwrap();
    tree.insert(b(""), Bytes::new()).unwrap();

    assert_eq!(tree.remove(b"D"), Some(b("1")));
    assert_eq!(tree.get(b""), Some(Bytes::new()));
    assert_eq!(tree.get(b"D"), None);
}

#[test]
fn null_value_and_non_null_values_coexist() {
    let mut tree = RaxTree::new();
    tree.insert(b("a"), Bytes::new()).unwrap();
    tree.insert(b("b"), b("real")).unwrap();

    assert_eq!(tree.get(b"a"), Some(Bytes::new()));
    assert_eq!(tree.get(b"b"), Some(b("real")));
    assert_eq!(tree.len(), 2);

    assert_eq!(tree.remove(b"a"), Some(Bytes::new()));
    assert_eq!(tree.get(b"a"), None);
    assert_eq!(tree.get(b"b"), Some(b("real")));
}

const DICTIONARY: &[(&str, &str)] = &[
    ("romane", "1"),
    ("romanus", "2"),
    ("romulus", "3"),
    ("rubens", "4"),
    ("ruber", "5"),
    ("rubicon", "6"),
    ("rubicundus", "7"),
];

#[test]
fn dictionary_scenario() {
    init_logging();
    let mut tree = RaxTree::new();
    for (k, v) in DICTIONARY {
        tree.insert(b(k), b(v)).unwrap();
    }

    assert_eq!(tree.get(b"romanus"), Some(b("2")));
    assert_eq!(tree.get(b"rubicon"), Some(b("6")));
    assert_eq!(tree.get(b"ruby"), None);
    assert_eq!(tree.len(), DICTIONARY.len());

    let mut cursor = tree.cursor();
    let mut seen = Vec::new();
    while cursor.next() {
        seen.push(String::from_utf8(cursor.key().unwrap().to_vec()).unwrap());
    }

    let mut expected: Vec<String> = DICTIONARY.iter().map(|(k, _)| k.to_string()).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn get_prefix_collects_every_matching_key() {
    let mut tree = RaxTree::new();
    tree.insert(b("user:1"), b("alice")).unwrap();
    tree.insert(b("user:2"), b("bob")).unwrap();
    tree.insert(b("post:1"), b("hello")).unwrap();

    let mut results = tree.get_prefix(b"user:");
    results.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        results,
        vec![(b("user:1"), b("alice")), (b("user:2"), b("bob"))]
    );
}

#[test]
fn get_prefix_empty_returns_everything() {
    let mut tree = RaxTree::new();
    tree.insert(b("a"), b("1")).unwrap();
    tree.insert(b("ab"), b("2")).unwrap();

    let mut all = tree.get_prefix(b"");
    all.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(all, vec![(b("a"), b("1")), (b("ab"), b("2"))]);
}

#[test]
fn remove_prefix_deletes_matching_subtree_and_recompresses_rest() {
    let mut tree = RaxTree::new();
    tree.insert(b("user:1"), b("alice")).unwrap();
    tree.insert(b("user:2"), b("bob")).unwrap();
    tree.insert(b("post:1"), b("hello")).unwrap();

    assert_eq!(tree.remove_prefix(b"user:"), 2);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(b"user:1"), None);
    assert_eq!(tree.get(b"user:2"), None);
    assert_eq!(tree.get(b"post:1"), Some(b("hello")));
}

#[test]
fn remove_prefix_empty_clears_tree() {
    let mut tree = RaxTree::new();
    tree.insert(b("a"), b("1")).unwrap();
    tree.insert(b("bcd"), b("2")).unwrap();

    assert_eq!(tree.remove_prefix(b""), 2);
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.get_prefix(b""), Vec::new());
}

#[test]
fn remove_prefix_no_match_is_a_no_op() {
    let mut tree = RaxTree::new();
    tree.insert(b("a"), b("1")).unwrap();
    assert_eq!(tree.remove_prefix(b"zzz"), 0);
    assert_eq!(tree.len(), 1);
}

/// `LKE, TQ, B, FY, WI` then `seek(">", "FMP")` + `next()` should land on
/// `FY` (the smallest key strictly greater than "FMP").
#[test]
fn seek_greater_than_lands_on_expected_key() {
    let mut tree = RaxTree::new();
    for k in ["LKE", "TQ", "B", "FY", "WI"] {
        tree.insert(b(k), b(k)).unwrap();
    }

    let mut cursor = tree.cursor();
    assert!(cursor.seek(SeekOp::Gt, b"FMP"));
    assert!(cursor.next());
    assert_eq!(cursor.key(), Some(b"FY".as_ref()));
}

fn seek_table_tree() -> RaxTree {
    let mut tree = RaxTree::new();
    for k in [
        "alligator",
        "alien",
        "baloon",
        "chromodynamic",
        "romane",
        "romanus",
        "romulus",
        "rubens",
        "ruber",
        "rubicon",
        "rubicundus",
        "all",
        "rub",
        "ba",
    ] {
        tree.insert(b(k), b(k)).unwrap();
    }
    tree
}

#[test]
fn seek_table_le_rpxxx_then_next_is_romulus() {
    let tree = seek_table_tree();
    let mut cursor = tree.cursor();
    assert!(cursor.seek(SeekOp::Le, b"rpxxx"));
    assert!(cursor.next());
    assert_eq!(cursor.key(), Some(b"romulus".as_ref()));
}

#[test]
fn seek_table_ge_rom_then_next_is_romane() {
    let tree = seek_table_tree();
    let mut cursor = tree.cursor();
    assert!(cursor.seek(SeekOp::Ge, b"rom"));
    assert!(cursor.next());
    assert_eq!(cursor.key(), Some(b"romane".as_ref()));
}

#[test]
fn seek_table_first_then_next_is_alien() {
    let tree = seek_table_tree();
    let mut cursor = tree.cursor();
    assert!(cursor.seek(SeekOp::First, b""));
    assert!(cursor.next());
    assert_eq!(cursor.key(), Some(b"alien".as_ref()));
}

#[test]
fn seek_table_last_then_next_is_rubicundus() {
    let tree = seek_table_tree();
    let mut cursor = tree.cursor();
    assert!(cursor.seek(SeekOp::Last, b""));
    assert!(cursor.next());
    assert_eq!(cursor.key(), Some(b"rubicundus".as_ref()));
}

#[test]
fn seek_table_gt_zo_finds_nothing() {
    let tree = seek_table_tree();
    let mut cursor = tree.cursor();
    assert!(!cursor.seek(SeekOp::Gt, b"zo"));
    assert!(cursor.is_eof());
    assert!(!cursor.next());
    assert!(cursor.is_eof());
}

#[test]
fn forward_and_backward_traversal_are_mirror_images() {
    let tree = seek_table_tree();

    let mut forward = Vec::new();
    let mut cursor = tree.cursor();
    while cursor.next() {
        forward.push(cursor.key().unwrap().to_vec());
    }

    let mut backward = Vec::new();
    let mut cursor = tree.cursor();
    while cursor.prev() {
        backward.push(cursor.key().unwrap().to_vec());
    }
    backward.reverse();

    assert_eq!(forward, backward);
    assert_eq!(forward.len(), 14);
}

#[test]
fn seek_eq_finds_exact_key_only() {
    let tree = seek_table_tree();
    let mut cursor = tree.cursor();
    assert!(cursor.seek(SeekOp::Eq, b"ruber"));
    assert_eq!(cursor.key(), Some(b"ruber".as_ref()));

    let mut cursor = tree.cursor();
    assert!(!cursor.seek(SeekOp::Eq, b"rube"));
    assert!(cursor.is_eof());
}

#[test]
fn try_seek_rejects_unknown_operator() {
    let tree = seek_table_tree();
    let mut cursor = tree.cursor();
    let err = cursor.try_seek("~=", b"anything").unwrap_err();
    assert_eq!(err, TreeError::InvalidSeekOp("~=".to_string()));
    assert!(cursor.is_eof());
}

#[test]
fn random_walk_eventually_covers_every_key() {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    let mut tree = RaxTree::new();
    for k in ["cat", "car", "card", "care", "dog", "do"] {
        tree.insert(b(k), b(k)).unwrap();
    }
    let expected: HashSet<Vec<u8>> = ["cat", "car", "card", "care", "dog", "do"]
        .iter()
        .map(|s| s.as_bytes().to_vec())
        .collect();

    let mut rng = StdRng::seed_from_u64(42);
    let mut visited: HashSet<Vec<u8>> = HashSet::new();

    for _ in 0..200 {
        let mut cursor = tree.cursor();
        cursor.random_walk(40, &mut rng);
        if let Some(key) = cursor.key() {
            visited.insert(key.to_vec());
        }
    }

    assert_eq!(visited, expected);
}

#[test]
fn long_key_spanning_multiple_compressed_edges() {
    init_logging();
    let mut tree = RaxTree::new();
    let before = tree.node_count();
    let long_key = "a".repeat(RaxTree::MAX_COMPRESSED_EDGE * 3 + 10);
    tree.insert(Bytes::from(long_key.clone()), b("value")).unwrap();

    // the chain of compressed nodes built by `build_suffix_chain` for a
    // suffix this long; the root plus at least one node per chained segment.
    assert!(tree.node_count() > before + 1);

    assert_eq!(tree.get(long_key.as_bytes()), Some(b("value")));
    assert_eq!(tree.remove(long_key.as_bytes()), Some(b("value")));
    assert_eq!(tree.get(long_key.as_bytes()), None);

    // the whole chained sequence of now-empty, non-key ancestors must be
    // pruned on the way back up, not just the innermost leaf.
    assert_eq!(tree.node_count(), before);
}

/// After a run of deletions, every surviving key must still round-trip and
/// the reported element count must match what `get_prefix` actually finds
/// (a collapsible non-key chain surviving a mutation would not break either
/// of these checks by itself, but a dangling or mis-recompressed node
/// would: both would show up as a missing or duplicated entry here).
#[test]
fn remaining_keys_round_trip_after_deletions() {
    let mut tree = RaxTree::new();
    for k in DICTIONARY {
        tree.insert(b(k.0), b(k.1)).unwrap();
    }
    tree.remove(b"romane");
    tree.remove(b"rubens");
    tree.remove(b"rubicon");

    let remaining = tree.get_prefix(b"");
    assert_eq!(remaining.len(), tree.len());
    for (k, v) in &remaining {
        assert_eq!(tree.get(k), Some(v.clone()));
    }
    assert_eq!(tree.get(b"romane"), None);
    assert_eq!(tree.get(b"romulus"), Some(b("3")));
}

#[test]
fn element_count_tracks_is_key_nodes() {
    let mut tree = RaxTree::new();
    assert_eq!(tree.len(), 0);
    tree.insert(b("a"), b("1")).unwrap();
    tree.insert(b("ab"), b("2")).unwrap();
    assert_eq!(tree.len(), 2);
    tree.insert(b("a"), b("3")).unwrap();
    assert_eq!(tree.len(), 2);
    tree.remove(b("a").as_ref());
    assert_eq!(tree.len(), 1);
    tree.remove(b("ab").as_ref());
    assert_eq!(tree.len(), 0);
}

#[test]
fn debug_fmt_does_not_panic() {
    let mut tree = RaxTree::new();
    tree.insert(b("romane"), b("1")).unwrap();
    tree.insert(b("romanus"), b("2")).unwrap();
    let rendered = format!("{tree:?}");
    assert!(rendered.contains("roman"));
}

/// A branch node with more than `CHILDS_SIZE` children spills the excess
/// into the overflow ("huge") child block. Pruning it back down to a
/// single remaining child — which may itself be stranded in that overflow
/// block rather than the inline set — must still trigger recompression.
#[test]
fn recompresses_after_overflow_block_prunes_to_one_child() {
    init_logging();
    let mut tree = RaxTree::new();

    let letters: Vec<u8> = (b'a'..=b'l').collect(); // 12 siblings, beyond the 10-entry inline set
    for &c in &letters {
        let mut key = b"root".to_vec();
        key.push(c);
        tree.insert(Bytes::from(key), b("v")).unwrap();
    }
    assert_eq!(tree.len(), letters.len());

    // remove every sibling but the last, which was inserted after the
    // inline set overflowed and so lives only in the huge block.
    for &c in &letters[..letters.len() - 1] {
        let mut key = b"root".to_vec();
        key.push(c);
        assert_eq!(tree.remove(&key), Some(b("v")));
    }

    let mut remaining_key = b"root".to_vec();
    remaining_key.push(*letters.last().unwrap());
    assert_eq!(tree.get(&remaining_key), Some(b("v")));
    assert_eq!(tree.len(), 1);

    // the branch node and its lone surviving child must have recompressed
    // into a single node: root plus one collapsed key node, nothing else.
    assert_eq!(tree.node_count(), 2);
}
