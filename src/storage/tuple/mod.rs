pub mod row;

pub use row::{Record, TOMBSTONE_DEAD, TOMBSTONE_LIVE};
