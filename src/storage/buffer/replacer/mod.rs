mod fifo;
mod lru;

pub use fifo::FifoReplacer;
pub use lru::LruReplacer;

/// An index into a buffer pool's frame array.
pub type FrameId = usize;

/// The replacement policy a buffer pool is bound to at `init` (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Fifo,
    Lru,
}

impl ReplacementPolicy {
    pub fn build(self, num_frames: usize) -> Box<dyn Replacer> {
        match self {
            ReplacementPolicy::Fifo => Box::new(FifoReplacer::new(num_frames)),
            ReplacementPolicy::Lru => Box::new(LruReplacer::new(num_frames)),
        }
    }
}

/// Common interface both replacement policies implement, generalized from
/// the teacher's `LRUKReplacer` (`node_store`/`curr_size`/`max_size` plus
/// `evict`/`record_access`/`set_evictable`/`remove`) down to the single-
/// distance FIFO and LRU policies spec §4.1 names as the CORE.
pub trait Replacer: std::fmt::Debug {
    /// Records an access to `frame_id` at the current logical timestamp.
    /// FIFO implementations only care about the first access (the frame's
    /// load time); LRU implementations update recency on every call.
    fn record_access(&mut self, frame_id: FrameId);

    /// Marks `frame_id` as eligible (or ineligible) for eviction. The
    /// replacer's `size()` counts only evictable frames.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);

    /// Evicts and returns the frame the policy selects among evictable
    /// frames, or `None` if none are evictable.
    fn evict(&mut self) -> Option<FrameId>;

    /// Drops all bookkeeping for `frame_id`, e.g. because its page was
    /// deleted outright.
    fn remove(&mut self, frame_id: FrameId);

    /// Number of frames currently evictable.
    fn size(&self) -> usize;
}
