use super::{FrameId, Replacer};
use std::collections::HashMap;

#[derive(Debug)]
struct FifoNode {
    /// Sequence number assigned the first time this frame was loaded.
    /// Never updated afterwards — that's what makes this FIFO rather than
    /// LRU: a cache hit does not move the frame to the back of the queue.
    load_seq: usize,
    is_evictable: bool,
}

/// First-in-first-out replacement (spec §4.1): the victim is the resident
/// frame that was loaded earliest, regardless of how recently it was
/// re-accessed. Structure mirrors the teacher's `LRUKReplacer` (a
/// `node_store` map plus an evictable-count invariant) with the k-distance
/// logic replaced by a single monotonic load-sequence number.
#[derive(Debug)]
pub struct FifoReplacer {
    node_store: HashMap<FrameId, FifoNode>,
    next_seq: usize,
    curr_size: usize,
    max_size: usize,
}

impl FifoReplacer {
    pub fn new(num_frames: usize) -> Self {
        FifoReplacer {
            node_store: HashMap::new(),
            next_seq: 0,
            curr_size: 0,
            max_size: num_frames,
        }
    }
}

impl Replacer for FifoReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        assert!(frame_id < self.max_size, "frame_id exceeds pool size");
        self.node_store.entry(frame_id).or_insert_with(|| {
            let seq = self.next_seq;
            self.next_seq += 1;
            FifoNode {
                load_seq: seq,
                is_evictable: false,
            }
        });
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        assert!(frame_id < self.max_size, "frame_id exceeds pool size");
        if let Some(node) = self.node_store.get_mut(&frame_id) {
            if node.is_evictable != evictable {
                node.is_evictable = evictable;
                if evictable {
                    self.curr_size += 1;
                } else {
                    self.curr_size -= 1;
                }
            }
        }
    }

    fn evict(&mut self) -> Option<FrameId> {
        let victim = self
            .node_store
            .iter()
            .filter(|(_, n)| n.is_evictable)
            .min_by_key(|(&frame_id, n)| (n.load_seq, frame_id))
            .map(|(&frame_id, _)| frame_id)?;
        self.node_store.remove(&victim);
        self.curr_size -= 1;
        Some(victim)
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(node) = self.node_store.remove(&frame_id) {
            if node.is_evictable {
                self.curr_size -= 1;
            }
        }
    }

    fn size(&self) -> usize {
        self.curr_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_earliest_loaded_frame_regardless_of_later_hits() {
        let mut r = FifoReplacer::new(3);
        r.record_access(0);
        r.record_access(1);
        r.record_access(2);
        r.set_evictable(0, true);
        r.set_evictable(1, true);
        r.set_evictable(2, true);
        r.record_access(0); // a cache hit must not move frame 0 to the back
        assert_eq!(r.evict(), Some(0));
    }

    #[test]
    fn non_evictable_frames_are_never_chosen() {
        let mut r = FifoReplacer::new(2);
        r.record_access(0);
        r.record_access(1);
        r.set_evictable(1, true);
        assert_eq!(r.evict(), Some(1));
    }

    #[test]
    fn size_tracks_only_evictable_frames() {
        let mut r = FifoReplacer::new(2);
        r.record_access(0);
        r.record_access(1);
        assert_eq!(r.size(), 0);
        r.set_evictable(0, true);
        assert_eq!(r.size(), 1);
        r.remove(0);
        assert_eq!(r.size(), 0);
    }
}
