use crate::common::constants::PAGE_SIZE;
use crate::storage::disk::PageId;
use std::sync::{Arc, RwLock};

/// A record identifier: the (page, slot) pair spec §3 calls RID. Stable for
/// a record's lifetime until deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RecordId {
    pub page: PageId,
    pub slot: i32,
}

impl RecordId {
    pub fn new(page: PageId, slot: i32) -> Self {
        RecordId { page, slot }
    }

    /// Packs this RID as two little-endian i32s, used both in slotted-page
    /// leaf entries and in `printTree` output.
    pub fn pack(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.page.to_le_bytes());
        out.extend_from_slice(&self.slot.to_le_bytes());
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        RecordId {
            page: i32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            slot: i32::from_le_bytes(bytes[4..8].try_into().unwrap()),
        }
    }

    pub const PACKED_SIZE: usize = 8;
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.page, self.slot)
    }
}

/// The opaque `PAGE_SIZE`-byte buffer a buffer-pool frame holds, spec §3
/// "Page". Higher layers (the record manager's slotted pages, the B+-tree's
/// node pages) interpret these bytes according to their own layout; `Page`
/// itself carries only the page number and the dirty flag the buffer pool
/// bookkeeping needs.
#[derive(Debug, Clone)]
pub struct Page {
    page_id: PageId,
    data: Box<[u8; PAGE_SIZE]>,
    is_dirty: bool,
}

impl Page {
    pub fn new(page_id: PageId, data: [u8; PAGE_SIZE]) -> Self {
        Page {
            page_id,
            data: Box::new(data),
            is_dirty: false,
        }
    }

    /// A page not yet bound to any on-disk page number, used to fill a
    /// frame before its first pin.
    pub fn invalid() -> Self {
        Page::new(-1, [0u8; PAGE_SIZE])
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn set_is_dirty(&mut self, dirty: bool) {
        self.is_dirty = dirty;
    }

    pub(crate) fn reset(&mut self, page_id: PageId, data: [u8; PAGE_SIZE]) {
        self.page_id = page_id;
        self.data = Box::new(data);
        self.is_dirty = false;
    }
}

/// The client view of a pinned page: a shared, lock-guarded pointer into the
/// frame's data buffer, valid only while the frame remains pinned for this
/// request (spec §3 "Page Handle").
pub type PageHandle = Arc<RwLock<Page>>;
