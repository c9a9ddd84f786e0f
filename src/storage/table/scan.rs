use crate::common::{Error, Result};
use crate::expr::Expr;
use crate::storage::page::RecordId;
use crate::storage::table::Table;
use crate::storage::tuple::{Record, TOMBSTONE_LIVE};

/// A cursor over a table with an optional predicate (spec §3 "Scan",
/// §4.2 "Scan"). `None` matches every live record (spec §9 Open Question
/// 6). Borrows the table mutably for its lifetime, matching the arena
/// ownership pattern spec §9 recommends: the scan borrows its table, no
/// back-pointer needed.
pub struct Scan<'a> {
    table: &'a mut Table,
    cond: Option<Expr>,
    current_page: i32,
    current_slot: i32,
    scanned_count: i32,
}

impl<'a> Scan<'a> {
    /// `startScan`: captures the predicate and starts at (page 1, slot 0).
    pub fn start(table: &'a mut Table, cond: Option<Expr>) -> Self {
        Scan {
            table,
            cond,
            current_page: 1,
            current_slot: 0,
            scanned_count: 0,
        }
    }

    /// `next`: advances through (page, slot) in lexicographic order,
    /// skipping tombstoned slots, evaluating the predicate against each
    /// live record. Returns `NoMoreTuples` once a full pass completes
    /// without a further match.
    pub fn next(&mut self) -> Result<Record> {
        let last_page = self.table.pool().total_num_pages() - 1;
        let slots_per_page = self.table.slots_per_page();
        let record_size = self.table.record_size();

        while self.current_page <= last_page {
            let handle = self.table.pool().pin(self.current_page)?;
            let mut matched: Option<(i32, Record)> = None;
            {
                let page = handle.read().unwrap();
                let data = page.data();
                let mut slot = self.current_slot;
                while (slot as usize) < slots_per_page {
                    let off = slot as usize * record_size;
                    if data[off] == TOMBSTONE_LIVE {
                        self.scanned_count += 1;
                        let rec = Record::unpack(
                            self.table.schema(),
                            &data[off + 1..off + record_size],
                        )?;
                        let is_match = match &self.cond {
                            None => true,
                            Some(expr) => expr.eval_bool(&rec, self.table.schema())?,
                        };
                        if is_match {
                            let mut rec = rec;
                            rec.set_rid(RecordId::new(self.current_page, slot));
                            matched = Some((slot, rec));
                            break;
                        }
                    }
                    slot += 1;
                }
            }
            self.table.pool().unpin(self.current_page)?;

            match matched {
                Some((slot, rec)) => {
                    self.current_slot = slot + 1;
                    if (self.current_slot as usize) >= slots_per_page {
                        self.current_page += 1;
                        self.current_slot = 0;
                    }
                    return Ok(rec);
                }
                None => {
                    self.current_page += 1;
                    self.current_slot = 0;
                }
            }
        }
        Err(Error::NoMoreTuples)
    }

    pub fn scanned_count(&self) -> i32 {
        self.scanned_count
    }

    /// `closeScan`: releases scan state. A scan with no further references
    /// closes itself on drop; this is a named, explicit equivalent for
    /// callers that mirror the spec's close-handle style.
    pub fn close(self) {}
}

impl<'a> Iterator for Scan<'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match Scan::next(self) {
            Ok(rec) => Some(Ok(rec)),
            Err(Error::NoMoreTuples) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
