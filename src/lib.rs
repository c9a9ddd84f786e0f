//! A disk-backed, page-oriented storage engine: a paged file store, a
//! fixed-frame buffer pool with pluggable FIFO/LRU replacement, a
//! tuple-oriented record manager built on slotted pages, and a B+-tree
//! primary-key index. See `SPEC_FULL.md` for the full design.

pub mod common;
pub mod expr;
pub mod storage;
pub mod types;

pub use common::{EngineConfig, Error, Result};
pub use expr::Expr;
pub use storage::buffer::{BufferPoolManager, ReplacementPolicy};
pub use storage::disk::{DiskManager, PageId};
pub use storage::index::{BTree, TreeScan};
pub use storage::page::{Page, PageHandle, RecordId};
pub use storage::table::{Scan, Table};
pub use storage::tuple::Record;
pub use types::{Attribute, DataType, Field, Schema};
