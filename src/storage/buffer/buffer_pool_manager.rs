use crate::common::constants::PAGE_SIZE;
use crate::common::{Error, Result};
use crate::storage::buffer::replacer::{FrameId, Replacer, ReplacementPolicy};
use crate::storage::disk::{DiskManager, PageId};
use crate::storage::page::{Page, PageHandle};
use hdrhistogram::Histogram;
use log::{debug, trace, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Per-frame bookkeeping the buffer pool keeps outside the frame's own
/// `Page` (which only knows its page number and dirty flag). Split out the
/// same way the teacher's `FrameMetadata` is: pin count lives here, dirty
/// state lives on the page itself.
#[derive(Copy, Clone, Debug)]
struct FrameMetadata {
    frame_id: FrameId,
    pin_count: usize,
}

impl FrameMetadata {
    fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            pin_count: 0,
        }
    }
}

/// A fixed-size array of frames bound to exactly one file (spec §3 "Buffer
/// Pool"). Mediates every read/write of that file: higher layers pin a
/// page, read or write through the returned handle, mark it dirty if
/// modified, and unpin it.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<PageHandle>,
    page_table: HashMap<PageId, FrameMetadata>,
    disk_manager: DiskManager,
    replacer: Box<dyn Replacer>,
    free_list: VecDeque<FrameId>,
    num_read_io: u64,
    num_write_io: u64,
    io_latency: Histogram<u64>,
}

impl BufferPoolManager {
    /// `initBufferPool`: allocates `pool_size` empty frames bound to
    /// `disk_manager` under the given replacement policy. Fails with
    /// `InvalidArgument` when `pool_size` is non-positive.
    pub fn init(
        disk_manager: DiskManager,
        pool_size: usize,
        policy: ReplacementPolicy,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::InvalidArgument(
                "buffer pool frame count must be positive".into(),
            ));
        }
        Ok(BufferPoolManager {
            pool_size,
            frames: (0..pool_size)
                .map(|_| Arc::new(RwLock::new(Page::invalid())))
                .collect(),
            page_table: HashMap::new(),
            disk_manager,
            replacer: policy.build(pool_size),
            free_list: (0..pool_size).collect(),
            num_read_io: 0,
            num_write_io: 0,
            io_latency: Histogram::new(3).expect("histogram config is valid"),
        })
    }

    /// `shutdown`: forces every dirty frame to disk and releases the pool.
    /// Fails with `StillPinned` if any frame's pin count is still > 0.
    pub fn shutdown(mut self) -> Result<()> {
        if let Some((&page_id, _)) = self.page_table.iter().find(|(_, m)| m.pin_count > 0) {
            return Err(Error::StillPinned(page_id));
        }
        self.force_flush()?;
        debug!(
            "buffer pool for {:?} shut down cleanly",
            self.disk_manager.file_name()
        );
        Ok(())
    }

    fn find_victim(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop_front() {
            return Ok(frame_id);
        }
        self.replacer.evict().ok_or(Error::NoVictimAvailable)
    }

    /// Evicts whatever page currently occupies `frame_id` (if any),
    /// flushing it first if dirty, and removes its page-table entry.
    fn evict_frame(&mut self, frame_id: FrameId) -> Result<()> {
        let old_page_id = self.frames[frame_id].read().unwrap().page_id();
        if old_page_id >= 0 {
            let is_dirty = self.frames[frame_id].read().unwrap().is_dirty();
            if is_dirty {
                let data = *self.frames[frame_id].read().unwrap().data();
                let started = Instant::now();
                self.disk_manager.write_block(old_page_id, &data)?;
                self.record_latency_us(started.elapsed().as_micros() as u64);
                self.num_write_io += 1;
                trace!("evicted dirty page {old_page_id} from frame {frame_id}, flushed");
            }
            self.page_table.remove(&old_page_id);
        }
        Ok(())
    }

    /// Pin algorithm (spec §4.1): if `page_num` is resident, bump its pin
    /// count and return a handle with no I/O. Otherwise select a victim
    /// frame (free list first, then the replacer), flush it if dirty, read
    /// `page_num` from disk into it, and pin it.
    pub fn pin(&mut self, page_num: PageId) -> Result<PageHandle> {
        if let Some(meta) = self.page_table.get_mut(&page_num) {
            meta.pin_count += 1;
            let frame_id = meta.frame_id;
            self.replacer.record_access(frame_id);
            self.replacer.set_evictable(frame_id, false);
            trace!("pin hit: page {page_num} in frame {frame_id}");
            return Ok(Arc::clone(&self.frames[frame_id]));
        }

        let frame_id = self.find_victim()?;
        self.evict_frame(frame_id)?;

        let mut buf = [0u8; PAGE_SIZE];
        let started = Instant::now();
        self.disk_manager.read_block(page_num, &mut buf)?;
        self.record_latency_us(started.elapsed().as_micros() as u64);
        self.num_read_io += 1;

        self.frames[frame_id].write().unwrap().reset(page_num, buf);
        self.page_table.insert(page_num, FrameMetadata::new(frame_id));
        self.page_table.get_mut(&page_num).unwrap().pin_count = 1;
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
        debug!("pin miss: loaded page {page_num} into frame {frame_id}");
        Ok(Arc::clone(&self.frames[frame_id]))
    }

    /// `unpin`: decrements the pin count of the frame holding `page_num`.
    /// Idempotent no-op success if the pin count is already zero (this
    /// crate's resolution of spec §9 Open Question 1).
    pub fn unpin(&mut self, page_num: PageId) -> Result<()> {
        let meta = self
            .page_table
            .get_mut(&page_num)
            .ok_or(Error::PageNotInPool(page_num))?;
        if meta.pin_count == 0 {
            warn!("unpin called on page {page_num} with pin count already zero");
            return Ok(());
        }
        meta.pin_count -= 1;
        let frame_id = meta.frame_id;
        if meta.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        Ok(())
    }

    /// `markDirty`: sets the dirty flag of the frame holding `page_num`.
    /// Fails with `PageNotInPool` if not resident. Idempotent.
    pub fn mark_dirty(&mut self, page_num: PageId) -> Result<()> {
        let meta = self
            .page_table
            .get(&page_num)
            .ok_or(Error::PageNotInPool(page_num))?;
        self.frames[meta.frame_id].write().unwrap().set_is_dirty(true);
        Ok(())
    }

    /// `forcePage`: if `page_num` is resident and dirty, writes it through
    /// to disk and clears the dirty flag. A resident, clean page is a
    /// no-op success (spec §9 Open Question 3).
    pub fn force_page(&mut self, page_num: PageId) -> Result<()> {
        let meta = *self
            .page_table
            .get(&page_num)
            .ok_or(Error::PageNotInPool(page_num))?;
        let is_dirty = self.frames[meta.frame_id].read().unwrap().is_dirty();
        if !is_dirty {
            return Ok(());
        }
        let data = *self.frames[meta.frame_id].read().unwrap().data();
        let started = Instant::now();
        self.disk_manager.write_block(page_num, &data)?;
        self.record_latency_us(started.elapsed().as_micros() as u64);
        self.num_write_io += 1;
        self.frames[meta.frame_id].write().unwrap().set_is_dirty(false);
        Ok(())
    }

    /// `forceFlush`: force-pages every resident, unpinned, dirty frame.
    /// Pinned dirty frames are left dirty. Continues past a per-frame
    /// failure (best-effort, per spec §4.1's explicitly-left choice) and
    /// returns the first error encountered, if any.
    pub fn force_flush(&mut self) -> Result<()> {
        let page_ids: Vec<PageId> = self
            .page_table
            .iter()
            .filter(|(_, m)| m.pin_count == 0)
            .map(|(&page_id, _)| page_id)
            .collect();
        let mut first_err = None;
        for page_id in page_ids {
            if let Err(e) = self.force_page(page_id) {
                warn!("forceFlush: page {page_id} failed to flush: {e}");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Per-frame snapshot of held page numbers (`None` for an empty frame),
    /// in frame-index order.
    pub fn frame_contents(&self) -> Vec<Option<PageId>> {
        self.frames
            .iter()
            .map(|f| {
                let page_id = f.read().unwrap().page_id();
                if page_id < 0 {
                    None
                } else {
                    Some(page_id)
                }
            })
            .collect()
    }

    /// Per-frame snapshot of dirty flags, in frame-index order.
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames
            .iter()
            .map(|f| f.read().unwrap().is_dirty())
            .collect()
    }

    /// Per-frame snapshot of pin counts, in frame-index order.
    pub fn fix_counts(&self) -> Vec<usize> {
        let by_frame: HashMap<FrameId, usize> = self
            .page_table
            .values()
            .map(|m| (m.frame_id, m.pin_count))
            .collect();
        (0..self.pool_size)
            .map(|frame_id| *by_frame.get(&frame_id).unwrap_or(&0))
            .collect()
    }

    pub fn num_read_io(&self) -> u64 {
        self.num_read_io
    }

    pub fn num_write_io(&self) -> u64 {
        self.num_write_io
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Records an observed disk I/O latency sample (microseconds), called
    /// from every `read_block`/`write_block` site in `pin`/`evict_frame`/
    /// `force_page`. Not part of spec's contract; purely ambient
    /// instrumentation backing `latency_histogram()`.
    fn record_latency_us(&mut self, micros: u64) {
        let _ = self.io_latency.record(micros);
    }

    pub fn latency_histogram(&self) -> &Histogram<u64> {
        &self.io_latency
    }

    /// Gives the record manager / B+-tree a way to grow the backing file
    /// before pinning a freshly appended page. Not a spec buffer-pool
    /// operation on its own; it delegates straight to the disk manager,
    /// which remains the pool's only I/O path.
    pub fn append_page(&mut self) -> Result<PageId> {
        self.disk_manager.append_empty_block()
    }

    pub fn ensure_capacity(&mut self, n: i32) -> Result<()> {
        self.disk_manager.ensure_capacity(n)
    }

    pub fn total_num_pages(&self) -> i32 {
        self.disk_manager.total_num_pages()
    }
}
