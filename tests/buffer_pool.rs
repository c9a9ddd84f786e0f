use rustydb::storage::disk::DiskManager;
use rustydb::{BufferPoolManager, ReplacementPolicy};
use tempfile::tempdir;

fn fresh_pool(dir: &tempfile::TempDir, name: &str, frames: usize) -> BufferPoolManager {
    let path = dir.path().join(name);
    DiskManager::create(&path).unwrap();
    let mut dm = DiskManager::open(&path).unwrap();
    dm.ensure_capacity(5).unwrap();
    BufferPoolManager::init(dm, frames, ReplacementPolicy::Fifo).unwrap()
}

/// Scenario A: pin 1,2,3, unpin all three, pin 4 -> the frame that held
/// page 1 (the first loaded, and the only evictable frame under FIFO with
/// an empty access history) now holds page 4.
#[test]
fn fifo_evicts_oldest_loaded_frame() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.db");
    DiskManager::create(&path).unwrap();
    let mut dm = DiskManager::open(&path).unwrap();
    dm.ensure_capacity(5).unwrap();
    let mut pool = BufferPoolManager::init(dm, 3, ReplacementPolicy::Fifo).unwrap();

    pool.pin(1).unwrap();
    pool.pin(2).unwrap();
    pool.pin(3).unwrap();
    pool.unpin(1).unwrap();
    pool.unpin(2).unwrap();
    pool.unpin(3).unwrap();
    pool.pin(4).unwrap();

    let contents = pool.frame_contents();
    assert!(!contents.contains(&Some(1)));
    assert!(contents.contains(&Some(4)));
    assert_eq!(pool.num_read_io(), 4);
    assert_eq!(pool.num_write_io(), 0);
}

/// Scenario B: same sequence, but page 1 is marked dirty before its last
/// unpin. Evicting it to make room for page 4 must write it back first.
#[test]
fn dirty_frame_flushes_on_eviction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("b.db");
    DiskManager::create(&path).unwrap();
    let mut dm = DiskManager::open(&path).unwrap();
    dm.ensure_capacity(5).unwrap();
    let mut pool = BufferPoolManager::init(dm, 3, ReplacementPolicy::Fifo).unwrap();

    let handle = pool.pin(1).unwrap();
    handle.write().unwrap().data_mut()[0] = 0xAB;
    pool.mark_dirty(1).unwrap();
    pool.unpin(1).unwrap();
    pool.pin(2).unwrap();
    pool.unpin(2).unwrap();
    pool.pin(3).unwrap();
    pool.unpin(3).unwrap();

    pool.pin(4).unwrap();

    assert_eq!(pool.num_write_io(), 1);
    let contents = pool.frame_contents();
    assert!(contents.contains(&Some(2)));
    assert!(contents.contains(&Some(3)));
    assert!(contents.contains(&Some(4)));
    pool.unpin(4).unwrap();
    pool.shutdown().unwrap();

    let mut dm2 = DiskManager::open(&path).unwrap();
    let mut buf = [0u8; rustydb::common::constants::PAGE_SIZE];
    dm2.read_block(1, &mut buf).unwrap();
    assert_eq!(buf[0], 0xAB);
}

#[test]
fn unpin_below_zero_is_idempotent_success() {
    let dir = tempdir().unwrap();
    let mut pool = fresh_pool(&dir, "c.db", 2);
    pool.pin(0).unwrap();
    pool.unpin(0).unwrap();
    assert!(pool.unpin(0).is_ok());
}

#[test]
fn force_page_on_clean_page_is_a_noop() {
    let dir = tempdir().unwrap();
    let mut pool = fresh_pool(&dir, "d.db", 2);
    pool.pin(0).unwrap();
    pool.unpin(0).unwrap();
    let writes_before = pool.num_write_io();
    pool.force_page(0).unwrap();
    assert_eq!(pool.num_write_io(), writes_before);
}

#[test]
fn latency_histogram_records_a_sample_per_disk_io() {
    let dir = tempdir().unwrap();
    let mut pool = fresh_pool(&dir, "latency.db", 2);
    assert_eq!(pool.latency_histogram().len(), 0);
    pool.pin(0).unwrap(); // pin miss: one disk read
    pool.unpin(0).unwrap();
    assert_eq!(pool.latency_histogram().len(), 1);
}

/// Boundary behavior (spec §8): with F=1 and its single frame pinned,
/// pinning a different page has no victim to evict.
#[test]
fn single_frame_pool_with_pinned_page_rejects_a_second_distinct_pin() {
    let dir = tempdir().unwrap();
    let mut pool = fresh_pool(&dir, "e.db", 1);
    pool.pin(0).unwrap();
    assert_eq!(
        pool.pin(1).unwrap_err(),
        rustydb::Error::NoVictimAvailable
    );
}
