use crate::common::{Error, Result};
use crate::storage::disk::PageId;
use crate::storage::index::btree::BTree;
use crate::storage::page::RecordId;

/// An ascending cursor over every `(key, rid)` entry in a `BTree`, walking
/// leaf-to-leaf via each leaf's `next_leaf` sibling link (spec §4.3
/// "TreeScan"). Mirrors [`crate::storage::table::Scan`]'s borrow-the-parent
/// shape.
pub struct TreeScan<'a> {
    tree: &'a mut BTree,
    current_leaf: PageId,
    current_index: usize,
    keys: Vec<i32>,
    rids: Vec<RecordId>,
    started: bool,
}

impl<'a> TreeScan<'a> {
    /// `openTreeScan`: positions at the leftmost leaf's first entry without
    /// loading it yet; the first `next()` call performs the initial load.
    pub fn start(tree: &'a mut BTree) -> Self {
        TreeScan {
            tree,
            current_leaf: -1,
            current_index: 0,
            keys: Vec::new(),
            rids: Vec::new(),
            started: false,
        }
    }

    fn load_current_leaf(&mut self) -> Result<()> {
        let (keys, rids, _next) = self.tree.load_leaf(self.current_leaf)?;
        self.keys = keys;
        self.rids = rids;
        self.current_index = 0;
        Ok(())
    }

    /// `next`: returns the next `(key, rid)` pair in ascending key order,
    /// crossing into the next leaf via its sibling link when the current
    /// leaf is exhausted. Returns `NoMoreTuples` once the rightmost leaf is
    /// exhausted.
    pub fn next(&mut self) -> Result<(i32, RecordId)> {
        if !self.started {
            self.current_leaf = self.tree.leftmost_leaf()?;
            self.load_current_leaf()?;
            self.started = true;
        }

        loop {
            if self.current_index < self.keys.len() {
                let key = self.keys[self.current_index];
                let rid = self.rids[self.current_index];
                self.current_index += 1;
                return Ok((key, rid));
            }
            let (_, _, next_leaf) = self.tree.load_leaf(self.current_leaf)?;
            if next_leaf < 0 {
                return Err(Error::NoMoreTuples);
            }
            self.current_leaf = next_leaf;
            self.load_current_leaf()?;
        }
    }

    /// `closeTreeScan`: explicit, named no-op equivalent to drop.
    pub fn close(self) {}
}

impl<'a> Iterator for TreeScan<'a> {
    type Item = Result<(i32, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        match TreeScan::next(self) {
            Ok(pair) => Some(Ok(pair)),
            Err(Error::NoMoreTuples) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
