/// Fixed size of every page on disk and every frame in a buffer pool, in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Sentinel page number used for an "empty" header field (e.g. no next leaf).
pub const INVALID_PAGE_ID: i32 = -1;

/// Page 0 of every table or index file is reserved for the header.
pub const HEADER_PAGE_ID: i32 = 0;
