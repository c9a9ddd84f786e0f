use rustydb::{BTree, DataType, Error, RecordId, ReplacementPolicy, TreeScan};
use tempfile::tempdir;

/// Scenario E: order-3 tree, insert four keys (the fourth forces a leaf
/// split), then check node count, point lookup, ascending scan order, and
/// entry count, followed by a delete and a lookup miss.
#[test]
fn insert_find_scan_and_delete_with_a_split() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("idx.btr");
    let mut tree = BTree::create(&path, DataType::Int, 3, 8, ReplacementPolicy::Lru).unwrap();

    tree.insert_key(10, RecordId::new(1, 0)).unwrap();
    tree.insert_key(20, RecordId::new(1, 1)).unwrap();
    tree.insert_key(30, RecordId::new(1, 2)).unwrap();
    tree.insert_key(40, RecordId::new(1, 3)).unwrap();

    assert!(tree.get_num_nodes() >= 3);
    assert_eq!(tree.find_key(30).unwrap(), RecordId::new(1, 2));
    assert_eq!(tree.get_num_entries(), 4);

    let mut scan = TreeScan::start(&mut tree);
    let mut collected = Vec::new();
    while let Ok(pair) = scan.next() {
        collected.push(pair);
    }
    assert_eq!(
        collected,
        vec![
            (10, RecordId::new(1, 0)),
            (20, RecordId::new(1, 1)),
            (30, RecordId::new(1, 2)),
            (40, RecordId::new(1, 3)),
        ]
    );
    scan.close();

    tree.delete_key(20).unwrap();
    assert_eq!(tree.find_key(20).unwrap_err(), Error::KeyNotFound);
    assert_eq!(tree.get_num_entries(), 3);

    tree.close().unwrap();
}

#[test]
fn duplicate_key_insert_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dup.btr");
    let mut tree = BTree::create(&path, DataType::Int, 4, 8, ReplacementPolicy::Fifo).unwrap();
    tree.insert_key(1, RecordId::new(1, 0)).unwrap();
    assert_eq!(
        tree.insert_key(1, RecordId::new(1, 1)).unwrap_err(),
        Error::DuplicateKey
    );
}

#[test]
fn create_rejects_a_non_int_key_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wrongtype.btr");
    assert!(matches!(
        BTree::create(&path, DataType::String, 4, 8, ReplacementPolicy::Fifo),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn print_tree_is_deterministic_across_calls() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("print.btr");
    let mut tree = BTree::create(&path, DataType::Int, 3, 8, ReplacementPolicy::Lru).unwrap();
    for k in [5, 15, 25, 35, 45] {
        tree.insert_key(k, RecordId::new(1, k)).unwrap();
    }
    let first = tree.print_tree().unwrap();
    let second = tree.print_tree().unwrap();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}
