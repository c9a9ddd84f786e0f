use crate::common::constants::PAGE_SIZE;
use crate::common::{Error, Result};
use crate::storage::disk::PageId;
use crate::storage::page::RecordId;

/// The body of one B+-tree node page: either a leaf (keys + RIDs + the
/// sibling link spec §9 Open Question 5 adds) or an internal node (keys +
/// child page numbers). A tagged union rather than a shared-layout struct,
/// per spec §9's design note — a leaf's "RID" slot and an internal's
/// "child page" slot must never be read as the other.
#[derive(Debug, Clone)]
pub enum NodeBody {
    Leaf {
        keys: Vec<i32>,
        rids: Vec<RecordId>,
        next_leaf: PageId,
    },
    Internal {
        keys: Vec<i32>,
        children: Vec<PageId>,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub page_id: PageId,
    pub body: NodeBody,
}

impl Node {
    pub fn new_leaf(page_id: PageId) -> Self {
        Node {
            page_id,
            body: NodeBody::Leaf {
                keys: Vec::new(),
                rids: Vec::new(),
                next_leaf: -1,
            },
        }
    }

    pub fn new_internal(page_id: PageId, keys: Vec<i32>, children: Vec<PageId>) -> Self {
        Node {
            page_id,
            body: NodeBody::Internal { keys, children },
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf { .. })
    }

    pub fn num_keys(&self) -> usize {
        match &self.body {
            NodeBody::Leaf { keys, .. } => keys.len(),
            NodeBody::Internal { keys, .. } => keys.len(),
        }
    }

    /// Serializes this node into a `PAGE_SIZE`-byte page per spec §4.3:
    /// `[isLeaf:byte][numKeys:int]` followed either by `n` keys + `n` RIDs
    /// + a trailing next-leaf page number, or `n` keys + `n+1` children.
    pub fn serialize(&self, n: usize) -> Result<[u8; PAGE_SIZE]> {
        let mut buf = [0u8; PAGE_SIZE];
        match &self.body {
            NodeBody::Leaf {
                keys,
                rids,
                next_leaf,
            } => {
                if keys.len() > n {
                    return Err(Error::InvalidArgument("leaf overflowed order n".into()));
                }
                buf[0] = 1;
                buf[1..5].copy_from_slice(&(keys.len() as i32).to_le_bytes());
                let mut off = 5;
                for i in 0..n {
                    let k = keys.get(i).copied().unwrap_or(0);
                    buf[off..off + 4].copy_from_slice(&k.to_le_bytes());
                    off += 4;
                }
                for i in 0..n {
                    let rid = rids.get(i).copied().unwrap_or(RecordId::new(0, 0));
                    let mut packed = Vec::with_capacity(RecordId::PACKED_SIZE);
                    rid.pack(&mut packed);
                    buf[off..off + RecordId::PACKED_SIZE].copy_from_slice(&packed);
                    off += RecordId::PACKED_SIZE;
                }
                buf[off..off + 4].copy_from_slice(&next_leaf.to_le_bytes());
            }
            NodeBody::Internal { keys, children } => {
                if keys.len() > n || children.len() > n + 1 {
                    return Err(Error::InvalidArgument("internal node overflowed order n".into()));
                }
                buf[0] = 0;
                buf[1..5].copy_from_slice(&(keys.len() as i32).to_le_bytes());
                let mut off = 5;
                for i in 0..n {
                    let k = keys.get(i).copied().unwrap_or(0);
                    buf[off..off + 4].copy_from_slice(&k.to_le_bytes());
                    off += 4;
                }
                for i in 0..n + 1 {
                    let c = children.get(i).copied().unwrap_or(-1);
                    buf[off..off + 4].copy_from_slice(&c.to_le_bytes());
                    off += 4;
                }
            }
        }
        Ok(buf)
    }

    /// Deserializes a node page written by [`Node::serialize`]. `n` must
    /// match the tree's order.
    pub fn deserialize(page_id: PageId, buf: &[u8; PAGE_SIZE], n: usize) -> Result<Self> {
        let is_leaf = buf[0] != 0;
        let num_keys = i32::from_le_bytes(buf[1..5].try_into().unwrap()) as usize;
        if num_keys > n {
            return Err(Error::InvalidArgument("corrupt node: numKeys > n".into()));
        }
        let mut off = 5;
        let mut keys = Vec::with_capacity(num_keys);
        for i in 0..n {
            let k = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
            if i < num_keys {
                keys.push(k);
            }
            off += 4;
        }
        if is_leaf {
            let mut rids = Vec::with_capacity(num_keys);
            for i in 0..n {
                let rid = RecordId::unpack(&buf[off..off + RecordId::PACKED_SIZE]);
                if i < num_keys {
                    rids.push(rid);
                }
                off += RecordId::PACKED_SIZE;
            }
            let next_leaf = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
            Ok(Node {
                page_id,
                body: NodeBody::Leaf {
                    keys,
                    rids,
                    next_leaf,
                },
            })
        } else {
            let mut children = Vec::with_capacity(num_keys + 1);
            for i in 0..n + 1 {
                let c = i32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
                if i <= num_keys {
                    children.push(c);
                }
                off += 4;
            }
            Ok(Node {
                page_id,
                body: NodeBody::Internal { keys, children },
            })
        }
    }
}

/// Minimum page-size requirement for a tree of order `n`: both a maximally
/// full leaf and a maximally full internal node must fit in one page.
pub fn fits_in_page(n: usize) -> bool {
    let leaf_bytes = 5 + n * 4 + n * RecordId::PACKED_SIZE + 4;
    let internal_bytes = 5 + n * 4 + (n + 1) * 4;
    leaf_bytes <= PAGE_SIZE && internal_bytes <= PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_round_trips_through_serialize() {
        let node = Node {
            page_id: 7,
            body: NodeBody::Leaf {
                keys: vec![1, 2, 3],
                rids: vec![RecordId::new(1, 0), RecordId::new(1, 1), RecordId::new(1, 2)],
                next_leaf: 9,
            },
        };
        let buf = node.serialize(4).unwrap();
        let back = Node::deserialize(7, &buf, 4).unwrap();
        assert!(back.is_leaf());
        assert_eq!(back.num_keys(), 3);
        match back.body {
            NodeBody::Leaf { keys, rids, next_leaf } => {
                assert_eq!(keys, vec![1, 2, 3]);
                assert_eq!(rids, vec![RecordId::new(1, 0), RecordId::new(1, 1), RecordId::new(1, 2)]);
                assert_eq!(next_leaf, 9);
            }
            NodeBody::Internal { .. } => panic!("expected leaf"),
        }
    }

    #[test]
    fn internal_round_trips_through_serialize() {
        let node = Node::new_internal(3, vec![10, 20], vec![1, 2, 4]);
        let buf = node.serialize(4).unwrap();
        let back = Node::deserialize(3, &buf, 4).unwrap();
        match back.body {
            NodeBody::Internal { keys, children } => {
                assert_eq!(keys, vec![10, 20]);
                assert_eq!(children, vec![1, 2, 4]);
            }
            NodeBody::Leaf { .. } => panic!("expected internal"),
        }
    }

    #[test]
    fn overflowing_order_n_is_rejected() {
        let node = Node::new_internal(0, vec![1, 2, 3], vec![1, 2, 3, 4]);
        assert!(node.serialize(2).is_err());
    }

    #[test]
    fn fits_in_page_rejects_absurd_orders() {
        assert!(fits_in_page(4));
        assert!(!fits_in_page(10_000_000));
    }
}
