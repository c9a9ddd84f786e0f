use super::{FrameId, Replacer};
use std::collections::HashMap;

#[derive(Debug)]
struct LruNode {
    /// Fresh monotonically increasing counter set on every access — unlike
    /// `FifoNode::load_seq`, this is updated on cache hits too.
    recency: usize,
    is_evictable: bool,
}

/// Least-recently-used replacement (spec §4.1): the victim is the
/// evictable frame with the smallest recency counter, i.e. the one pinned
/// longest ago. Ties are broken by lowest frame index.
#[derive(Debug)]
pub struct LruReplacer {
    node_store: HashMap<FrameId, LruNode>,
    current_timestamp: usize,
    curr_size: usize,
    max_size: usize,
}

impl LruReplacer {
    pub fn new(num_frames: usize) -> Self {
        LruReplacer {
            node_store: HashMap::new(),
            current_timestamp: 0,
            curr_size: 0,
            max_size: num_frames,
        }
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        assert!(frame_id < self.max_size, "frame_id exceeds pool size");
        let timestamp = self.current_timestamp;
        self.current_timestamp += 1;
        self.node_store
            .entry(frame_id)
            .and_modify(|n| n.recency = timestamp)
            .or_insert(LruNode {
                recency: timestamp,
                is_evictable: false,
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
            .min_by_key(|(&frame_id, n)| (n.recency, frame_id))
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
    fn a_later_hit_protects_a_frame_from_eviction() {
        let mut r = LruReplacer::new(2);
        r.record_access(0);
        r.record_access(1);
        r.set_evictable(0, true);
        r.set_evictable(1, true);
        r.record_access(0); // now 1 is the least recently used
        assert_eq!(r.evict(), Some(1));
    }

    #[test]
    fn oldest_recency_among_evictable_frames_is_chosen() {
        let mut r = LruReplacer::new(2);
        r.record_access(0);
        r.record_access(1);
        r.set_evictable(0, true);
        r.set_evictable(1, true);
        assert_eq!(r.evict(), Some(0));
    }
}
