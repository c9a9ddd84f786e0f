use crate::common::constants::PAGE_SIZE;
use crate::common::{Error, Result};
use crate::storage::buffer::{BufferPoolManager, ReplacementPolicy};
use crate::storage::disk::{DiskManager, PageId};
use crate::storage::index::node::{Node, NodeBody};
use crate::storage::page::RecordId;
use crate::types::DataType;
use log::debug;
use std::path::Path;

const ROOT_FIRST_PAGE: PageId = 1;

/// A persistent B+-tree index of order `n` over a single `INT` key,
/// mapping keys to RIDs (spec §4.3). One page per node; node pages are
/// allocated sequentially as the tree grows. Header lives on page 0.
pub struct BTree {
    name: String,
    pool: BufferPoolManager,
    n: usize,
    key_type: DataType,
    node_count: i32,
    entry_count: i32,
    root_page: PageId,
}

impl BTree {
    fn header_bytes(node_count: i32, entry_count: i32, key_type: DataType, n: usize, root_page: PageId) -> [u8; PAGE_SIZE] {
        let mut buf = [0u8; PAGE_SIZE];
        buf[0..4].copy_from_slice(&node_count.to_le_bytes());
        buf[4..8].copy_from_slice(&entry_count.to_le_bytes());
        buf[8..12].copy_from_slice(&key_type.as_i32().to_le_bytes());
        buf[12..16].copy_from_slice(&(n as i32).to_le_bytes());
        buf[16..20].copy_from_slice(&root_page.to_le_bytes());
        buf
    }

    fn parse_header(buf: &[u8; PAGE_SIZE]) -> Result<(i32, i32, DataType, usize, PageId)> {
        let node_count = i32::from_le_bytes(buf[0..4].try_into().unwrap());
        let entry_count = i32::from_le_bytes(buf[4..8].try_into().unwrap());
        let key_type = DataType::from_i32(i32::from_le_bytes(buf[8..12].try_into().unwrap()))?;
        let n = i32::from_le_bytes(buf[12..16].try_into().unwrap()) as usize;
        let root_page = i32::from_le_bytes(buf[16..20].try_into().unwrap());
        Ok((node_count, entry_count, key_type, n, root_page))
    }

    /// `createBtree`: creates the backing file, writes the header, and
    /// allocates an empty leaf root at page 1.
    pub fn create(
        name: impl AsRef<Path>,
        key_type: DataType,
        n: usize,
        pool_size: usize,
        policy: ReplacementPolicy,
    ) -> Result<Self> {
        if key_type != DataType::Int {
            return Err(Error::InvalidArgument(
                "btree key type must be INT (spec §4.3: single INT key)".into(),
            ));
        }
        if n < 2 {
            return Err(Error::InvalidArgument("order n must be >= 2".into()));
        }
        if !crate::storage::index::node::fits_in_page(n) {
            return Err(Error::InvalidArgument(
                "order n too large: a full node would not fit in one page".into(),
            ));
        }
        let name = name.as_ref();
        DiskManager::create(name)?;
        let disk_manager = DiskManager::open(name)?;
        let mut pool = BufferPoolManager::init(disk_manager, pool_size, policy)?;

        let header = Self::header_bytes(1, 0, key_type, n, ROOT_FIRST_PAGE);
        {
            let handle = pool.pin(0)?;
            handle.write().unwrap().data_mut().copy_from_slice(&header);
            pool.mark_dirty(0)?;
            pool.unpin(0)?;
        }
        pool.append_page()?;
        let root_bytes = Node::new_leaf(ROOT_FIRST_PAGE).serialize(n)?;
        {
            let handle = pool.pin(ROOT_FIRST_PAGE)?;
            handle.write().unwrap().data_mut().copy_from_slice(&root_bytes);
            pool.mark_dirty(ROOT_FIRST_PAGE)?;
            pool.unpin(ROOT_FIRST_PAGE)?;
        }
        pool.force_flush()?;

        Ok(BTree {
            name: name.display().to_string(),
            pool,
            n,
            key_type,
            node_count: 1,
            entry_count: 0,
            root_page: ROOT_FIRST_PAGE,
        })
    }

    /// `openBtree`.
    pub fn open(name: impl AsRef<Path>, pool_size: usize, policy: ReplacementPolicy) -> Result<Self> {
        let name = name.as_ref();
        let disk_manager = DiskManager::open(name)?;
        let mut pool = BufferPoolManager::init(disk_manager, pool_size, policy)?;
        let (node_count, entry_count, key_type, n, root_page) = {
            let handle = pool.pin(0)?;
            let parsed = Self::parse_header(handle.read().unwrap().data());
            pool.unpin(0)?;
            parsed?
        };
        if key_type != DataType::Int {
            return Err(Error::InvalidArgument(
                "btree key type must be INT (spec §4.3: single INT key)".into(),
            ));
        }
        Ok(BTree {
            name: name.display().to_string(),
            pool,
            n,
            key_type,
            node_count,
            entry_count,
            root_page,
        })
    }

    /// `closeBtree`.
    pub fn close(self) -> Result<()> {
        self.pool.force_flush()?;
        self.pool.shutdown()
    }

    /// `deleteBtree`.
    pub fn destroy(self) -> Result<()> {
        let name = self.name.clone();
        self.pool.shutdown()?;
        DiskManager::destroy(name)
    }

    pub fn get_num_nodes(&self) -> i32 {
        self.node_count
    }

    pub fn get_num_entries(&self) -> i32 {
        self.entry_count
    }

    pub fn get_key_type(&self) -> DataType {
        self.key_type
    }

    pub fn order(&self) -> usize {
        self.n
    }

    pub fn root_page(&self) -> PageId {
        self.root_page
    }

    fn write_header(&mut self) -> Result<()> {
        let handle = self.pool.pin(0)?;
        let header = Self::header_bytes(
            self.node_count,
            self.entry_count,
            self.key_type,
            self.n,
            self.root_page,
        );
        handle.write().unwrap().data_mut().copy_from_slice(&header);
        self.pool.mark_dirty(0)?;
        self.pool.unpin(0)
    }

    fn load_node(&mut self, page_id: PageId) -> Result<Node> {
        let handle = self.pool.pin(page_id)?;
        let node = Node::deserialize(page_id, handle.read().unwrap().data(), self.n);
        self.pool.unpin(page_id)?;
        node
    }

    fn store_node(&mut self, node: &Node) -> Result<()> {
        let handle = self.pool.pin(node.page_id)?;
        let result = node.serialize(self.n).map(|bytes| {
            handle.write().unwrap().data_mut().copy_from_slice(&bytes);
        });
        if result.is_ok() {
            self.pool.mark_dirty(node.page_id)?;
        }
        self.pool.unpin(node.page_id)?;
        result
    }

    fn allocate_node_page(&mut self) -> Result<PageId> {
        let page_id = self.pool.append_page()?;
        self.node_count += 1;
        Ok(page_id)
    }

    /// Finds the child index to descend into for `target` from an
    /// internal node's keys: the first index `i` with `target < keys[i]`,
    /// or `keys.len()` if `target` is at least every key (spec §4.3
    /// "binary-search for the first key >= target").
    fn child_index(keys: &[i32], target: i32) -> usize {
        match keys.binary_search(&target) {
            Ok(pos) => pos + 1,
            Err(pos) => pos,
        }
    }

    /// `findKey`: descends from the root via `child_index`, then binary
    /// searches the leaf.
    pub fn find_key(&mut self, key: i32) -> Result<RecordId> {
        let mut page_id = self.root_page;
        loop {
            let node = self.load_node(page_id)?;
            match node.body {
                NodeBody::Internal { keys, children } => {
                    let idx = Self::child_index(&keys, key);
                    page_id = children[idx];
                }
                NodeBody::Leaf { keys, rids, .. } => {
                    return match keys.binary_search(&key) {
                        Ok(pos) => Ok(rids[pos]),
                        Err(_) => Err(Error::KeyNotFound),
                    };
                }
            }
        }
    }

    /// `insertKey`: descends to the target leaf, inserts in sorted order,
    /// splitting leaves (and, recursively, internal nodes) as they
    /// overflow order `n`. If the root splits, allocates a new root and
    /// updates the header (spec §4.3 "insertKey").
    pub fn insert_key(&mut self, key: i32, rid: RecordId) -> Result<()> {
        let root = self.root_page;
        if let Some((sep_key, new_page)) = self.insert_into(root, key, rid)? {
            let new_root = self.allocate_node_page()?;
            let new_root_node =
                Node::new_internal(new_root, vec![sep_key], vec![root, new_page]);
            self.store_node(&new_root_node)?;
            self.root_page = new_root;
        }
        self.write_header()?;
        debug!("inserted key {key} into btree {}", self.name);
        Ok(())
    }

    /// Returns `Some((separator_key, new_right_sibling_page))` if `page_id`
    /// split while inserting, propagating the split to be handled by the
    /// caller (the parent, or `insert_key` if `page_id` was the root).
    fn insert_into(
        &mut self,
        page_id: PageId,
        key: i32,
        rid: RecordId,
    ) -> Result<Option<(i32, PageId)>> {
        let node = self.load_node(page_id)?;
        match node.body {
            NodeBody::Leaf {
                mut keys,
                mut rids,
                next_leaf,
            } => {
                if keys.binary_search(&key).is_ok() {
                    return Err(Error::DuplicateKey);
                }
                let pos = keys.partition_point(|&k| k < key);
                keys.insert(pos, key);
                rids.insert(pos, rid);
                self.entry_count += 1;

                if keys.len() <= self.n {
                    let node = Node {
                        page_id,
                        body: NodeBody::Leaf {
                            keys,
                            rids,
                            next_leaf,
                        },
                    };
                    self.store_node(&node)?;
                    return Ok(None);
                }

                let split_at = keys.len() - keys.len() / 2; // keep ceil(n/2) on the left per spec's "after insertion" bound
                let right_keys = keys.split_off(split_at);
                let right_rids = rids.split_off(split_at);
                let new_page = self.allocate_node_page()?;
                let sep_key = right_keys[0];

                let left = Node {
                    page_id,
                    body: NodeBody::Leaf {
                        keys,
                        rids,
                        next_leaf: new_page,
                    },
                };
                let right = Node {
                    page_id: new_page,
                    body: NodeBody::Leaf {
                        keys: right_keys,
                        rids: right_rids,
                        next_leaf,
                    },
                };
                self.store_node(&left)?;
                self.store_node(&right)?;
                Ok(Some((sep_key, new_page)))
            }
            NodeBody::Internal { mut keys, mut children } => {
                let idx = Self::child_index(&keys, key);
                let child = children[idx];
                let split = self.insert_into(child, key, rid)?;
                let Some((sep_key, new_child)) = split else {
                    return Ok(None);
                };

                keys.insert(idx, sep_key);
                children.insert(idx + 1, new_child);

                if keys.len() <= self.n {
                    let node = Node {
                        page_id,
                        body: NodeBody::Internal { keys, children },
                    };
                    self.store_node(&node)?;
                    return Ok(None);
                }

                let mid = keys.len() / 2;
                let up_key = keys[mid];
                let right_keys = keys.split_off(mid + 1);
                keys.truncate(mid);
                let right_children = children.split_off(mid + 1);
                let new_page = self.allocate_node_page()?;

                let left = Node {
                    page_id,
                    body: NodeBody::Internal { keys, children },
                };
                let right = Node {
                    page_id: new_page,
                    body: NodeBody::Internal {
                        keys: right_keys,
                        children: right_children,
                    },
                };
                self.store_node(&left)?;
                self.store_node(&right)?;
                Ok(Some((up_key, new_page)))
            }
        }
    }

    /// `deleteKey`: locates the leaf, removes the entry and shifts the
    /// remainder down. No underflow rebalancing (spec §9 Open Question 4);
    /// the tree stays searchable because every remaining key still routes
    /// correctly through its ancestors' separators.
    pub fn delete_key(&mut self, key: i32) -> Result<()> {
        let mut page_id = self.root_page;
        loop {
            let node = self.load_node(page_id)?;
            match node.body {
                NodeBody::Internal { keys, children } => {
                    let idx = Self::child_index(&keys, key);
                    page_id = children[idx];
                }
                NodeBody::Leaf {
                    mut keys,
                    mut rids,
                    next_leaf,
                } => {
                    let pos = keys.binary_search(&key).map_err(|_| Error::KeyNotFound)?;
                    keys.remove(pos);
                    rids.remove(pos);
                    self.entry_count -= 1;
                    let node = Node {
                        page_id,
                        body: NodeBody::Leaf {
                            keys,
                            rids,
                            next_leaf,
                        },
                    };
                    self.store_node(&node)?;
                    self.write_header()?;
                    return Ok(());
                }
            }
        }
    }

    /// Walks `root -> first child -> ... -> leaf` to find the leftmost
    /// leaf, the starting point for an ascending tree scan.
    pub(crate) fn leftmost_leaf(&mut self) -> Result<PageId> {
        let mut page_id = self.root_page;
        loop {
            let node = self.load_node(page_id)?;
            match node.body {
                NodeBody::Internal { children, .. } => page_id = children[0],
                NodeBody::Leaf { .. } => return Ok(page_id),
            }
        }
    }

    pub(crate) fn load_leaf(&mut self, page_id: PageId) -> Result<(Vec<i32>, Vec<RecordId>, PageId)> {
        match self.load_node(page_id)?.body {
            NodeBody::Leaf {
                keys,
                rids,
                next_leaf,
            } => Ok((keys, rids, next_leaf)),
            NodeBody::Internal { .. } => {
                Err(Error::InvalidArgument("expected a leaf page".into()))
            }
        }
    }

    /// `printTree`: depth-first pre-order dump. Each visited node is
    /// assigned a sequential index; a leaf's contents alternate
    /// `child.slot` RID text and keys, an internal node's alternate child
    /// index and key. The exact text is implementation-defined but
    /// deterministic (spec §4.3).
    pub fn print_tree(&mut self) -> Result<String> {
        let mut out = String::new();
        let mut counter = 0usize;
        self.print_node(self.root_page, &mut counter, &mut out)?;
        Ok(out)
    }

    fn print_node(&mut self, page_id: PageId, counter: &mut usize, out: &mut String) -> Result<()> {
        let node = self.load_node(page_id)?;
        let index = *counter;
        *counter += 1;
        match &node.body {
            NodeBody::Leaf { keys, rids, .. } => {
                let mut parts = Vec::new();
                for (k, r) in keys.iter().zip(rids.iter()) {
                    parts.push(format!("{r},{k}"));
                }
                if let Some(last) = rids.last() {
                    parts.push(format!("{last}"));
                }
                out.push_str(&format!("({index}) [{}]\n", parts.join(" , ")));
            }
            NodeBody::Internal { keys, children } => {
                let mut parts = Vec::new();
                for (i, k) in keys.iter().enumerate() {
                    parts.push(format!("{i},{k}"));
                }
                parts.push(format!("{}", keys.len()));
                out.push_str(&format!("({index}) [{}]\n", parts.join(" , ")));
                let children = children.clone();
                drop(node);
                for child in children {
                    self.print_node(child, counter, out)?;
                }
            }
        }
        Ok(())
    }
}
