use rustydb::{Attribute, DataType, Error, Expr, Field, ReplacementPolicy, Schema, Table};
use tempfile::tempdir;

fn schema_abc() -> Schema {
    Schema::new(
        vec![
            Attribute::new_int("a"),
            Attribute::new_string("b", 4),
            Attribute::new_int("c"),
        ],
        vec![0],
    )
    .unwrap()
}

/// Scenario C: insert three records, check RIDs land on page 1 at
/// sequential slots, read them back byte-for-byte, then delete one and
/// confirm a later insert reuses its slot.
#[test]
fn record_round_trip_with_delete_and_slot_reuse() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.tbl");
    let mut table = Table::create(&path, schema_abc(), 8, ReplacementPolicy::Lru).unwrap();

    let mut r1 = rustydb::Record::new(vec![
        Field::Int(1),
        Field::Str("abcd".into()),
        Field::Int(10),
    ]);
    let mut r2 = rustydb::Record::new(vec![
        Field::Int(2),
        Field::Str("efgh".into()),
        Field::Int(20),
    ]);
    let mut r3 = rustydb::Record::new(vec![
        Field::Int(3),
        Field::Str("ijkl".into()),
        Field::Int(30),
    ]);

    let rid1 = table.insert(&mut r1).unwrap();
    let rid2 = table.insert(&mut r2).unwrap();
    let rid3 = table.insert(&mut r3).unwrap();

    assert_eq!((rid1.page, rid1.slot), (1, 0));
    assert_eq!((rid2.page, rid2.slot), (1, 1));
    assert_eq!((rid3.page, rid3.slot), (1, 2));
    assert_eq!(table.get_num_tuples(), 3);

    assert_eq!(table.get(rid1).unwrap(), r1);
    assert_eq!(table.get(rid2).unwrap(), r2);
    assert_eq!(table.get(rid3).unwrap(), r3);

    table.delete(rid1).unwrap();
    assert_eq!(table.get(rid1).unwrap_err(), Error::NotFound);
    assert_eq!(table.get_num_tuples(), 2);

    let mut r4 = rustydb::Record::new(vec![
        Field::Int(4),
        Field::Str("mnop".into()),
        Field::Int(40),
    ]);
    let rid4 = table.insert(&mut r4).unwrap();
    assert_eq!((rid4.page, rid4.slot), (1, 0));

    table.close().unwrap();
}

/// Scenario D: after the delete in Scenario C, a scan predicated on `a > 1`
/// should yield only the still-live records with a > 1, then exhaust.
#[test]
fn scan_with_predicate_skips_tombstones_and_non_matches() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan.tbl");
    let mut table = Table::create(&path, schema_abc(), 8, ReplacementPolicy::Lru).unwrap();

    for (a, b, c) in [(1, "abcd", 10), (2, "efgh", 20), (3, "ijkl", 30)] {
        let mut rec = rustydb::Record::new(vec![
            Field::Int(a),
            Field::Str(b.into()),
            Field::Int(c),
        ]);
        table.insert(&mut rec).unwrap();
    }
    let first_rid = rustydb::RecordId::new(1, 0);
    table.delete(first_rid).unwrap();

    let cond = Expr::attr(0).gt(Expr::constant(Field::Int(1)));
    let mut scan = rustydb::Scan::start(&mut table, Some(cond));

    let mut seen = Vec::new();
    while let Ok(rec) = scan.next() {
        seen.push(rec);
    }
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].get_attr(0).unwrap(), &Field::Int(3));
}

/// Scenario F: close and reopen a table; schema, tuple count, and record
/// contents must all survive the round trip.
#[test]
fn table_persists_across_close_and_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persist.tbl");
    let schema = schema_abc();
    let mut table = Table::create(&path, schema.clone(), 4, ReplacementPolicy::Fifo).unwrap();

    let mut inserted = Vec::new();
    for (a, b, c) in [(1, "abcd", 10), (2, "efgh", 20)] {
        let mut rec = rustydb::Record::new(vec![
            Field::Int(a),
            Field::Str(b.into()),
            Field::Int(c),
        ]);
        let rid = table.insert(&mut rec).unwrap();
        inserted.push((rid, rec));
    }
    table.close().unwrap();

    let mut reopened = Table::open(&path, 4, ReplacementPolicy::Fifo).unwrap();
    assert_eq!(reopened.schema(), &schema);
    assert_eq!(reopened.get_num_tuples(), 2);
    for (rid, rec) in &inserted {
        assert_eq!(reopened.get(*rid).unwrap(), *rec);
    }
    reopened.close().unwrap();
}

#[test]
fn schema_rejects_out_of_range_key_attribute() {
    let result = Schema::new(vec![Attribute::new_int("a")], vec![5]);
    assert!(result.is_err());
}

/// Boundary behavior (spec §8): a scan over an empty table returns
/// `NoMoreTuples` on its first `next`.
#[test]
fn scan_over_empty_table_is_exhausted_immediately() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.tbl");
    let mut table = Table::create(&path, schema_abc(), 4, ReplacementPolicy::Fifo).unwrap();
    let mut scan = rustydb::Scan::start(&mut table, None);
    assert_eq!(scan.next().unwrap_err(), Error::NoMoreTuples);
}

#[test]
fn field_type_mismatch_on_set_attr_is_rejected() {
    let mut rec = rustydb::Record::new(vec![Field::Int(1)]);
    assert_eq!(
        rec.set_attr(0, Field::Str("x".into())).unwrap_err(),
        Error::InvalidArgument("attribute 0 type mismatch".into())
    );
    assert_eq!(rec.get_attr(0).unwrap().get_type(), DataType::Int);
}
