//! Custom error types for the pdb-container crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum PdbError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A fixed-size region ran past the end of the available bytes.
    #[error("Truncated {context} at offset {offset}: expected {expected} bytes, but found {found} bytes")]
    Truncated {
        context: &'static str,
        offset: u64,
        expected: u64,
        found: u64,
    },

    /// The stored offsets describe a geometry that cannot be a valid container.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// A registered structured decoder was invoked and rejected its input.
    #[error("Decoder for {target} failed: {message}")]
    DecoderParse { target: String, message: String },

    /// A category name is not present in the app-info category table.
    #[error("Category not found: {0:?}")]
    CategoryNotFound(String),

    /// A category slot index outside the table.
    #[error("Category index {index} out of range (table has {len} slots)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Two index entries name the same record or resource.
    #[error("Duplicate index entry: {0}")]
    DuplicateEntryId(String),

    /// A lookup or mutation referenced an entry the database does not hold.
    #[error("Unknown index entry: {0}")]
    UnknownEntry(String),

    /// A record unique id wider than the 24 bits the index can store.
    #[error("Record unique id {0:#x} does not fit in 24 bits")]
    UniqueIdOutOfRange(u32),

    /// An encoding label `encoding_rs` does not recognize.
    #[error("Unknown text encoding label: {0:?}")]
    UnknownEncoding(String),

    /// A calendar time that cannot be stored as a 32-bit Palm timestamp.
    #[error("Timestamp {0} is outside the Palm epoch range")]
    TimestampOutOfRange(i64),

    /// Category access requires an app-info block in the standard layout.
    #[error("Database has no standard app-info block")]
    NotStandardAppInfo,
}

/// A convenience `Result` type alias using the crate's `PdbError` type.
pub type Result<T> = std::result::Result<T, PdbError>;
