pub mod btree;
mod node;
pub mod treescan;

pub use btree::BTree;
pub use treescan::TreeScan;
