use std::fmt;

/// Every fallible operation in this crate returns this alias instead of the
/// C source's integer return-code convention.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds named by the storage core's contract (buffer pool, record
/// manager, B+-tree and the page-store collaborator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The backing page file could not be located.
    FileNotFound(String),
    /// A write to the backing page file did not complete.
    WriteFailed(String),
    /// A page number outside `[0, totalNumPages)` was requested.
    NoSuchPage(i32),
    /// A nil name, non-positive pool size, or wrong key type was supplied.
    InvalidArgument(String),
    /// `markDirty`/`forcePage`/`unpin` was called for a page not resident
    /// in the pool.
    PageNotInPool(i32),
    /// `pin` was attempted with every frame pinned.
    NoVictimAvailable,
    /// A record or key was absent or its slot was tombstoned.
    NotFound,
    /// `insertKey` was attempted for a key already present in the tree.
    DuplicateKey,
    /// A scan has been exhausted. Not a failure at caller semantics, but a
    /// distinct, expected return.
    NoMoreTuples,
    /// An allocation failed.
    MemoryFailure,
    /// `shutdown` was attempted while a frame's pin count was still > 0.
    StillPinned(i32),
    /// A B+-tree lookup did not find the requested key.
    KeyNotFound,
    /// The page store reported an I/O failure.
    IoFailure(String),
    /// The configuration layer could not resolve an `EngineConfig`.
    ConfigFailure(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileNotFound(name) => write!(f, "file not found: {name}"),
            Error::WriteFailed(name) => write!(f, "write failed: {name}"),
            Error::NoSuchPage(page) => write!(f, "no such page: {page}"),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::PageNotInPool(page) => write!(f, "page not in pool: {page}"),
            Error::NoVictimAvailable => write!(f, "no victim frame available"),
            Error::NotFound => write!(f, "record not found"),
            Error::DuplicateKey => write!(f, "duplicate key"),
            Error::NoMoreTuples => write!(f, "no more tuples"),
            Error::MemoryFailure => write!(f, "memory allocation failed"),
            Error::StillPinned(page) => write!(f, "page {page} still pinned at shutdown"),
            Error::KeyNotFound => write!(f, "key not found"),
            Error::IoFailure(msg) => write!(f, "I/O failure: {msg}"),
            Error::ConfigFailure(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoFailure(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigFailure(err.to_string())
    }
}
