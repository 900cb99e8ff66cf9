//! # pdb-container
//!
//! A reader and writer for Palm OS database containers (`.pdb` record
//! databases and `.prc` resource databases).
//!
//! A container is a fixed header, an index of record or resource
//! descriptors, optional app-info and sort-info blocks, and one blob per
//! index entry. Only offsets are stored on disk; every region length is
//! inferred on load and every offset is recomputed on write.
pub mod pdb;

// Re-export the main types for convenience
pub use pdb::{
    Database, PdbError, Result,
    codec::{DecoderRegistry, Payload, Structured, StructuredCodec, timestamp},
    format::{
        appinfo::{AppInfo, Category, CategoryTable, StandardAppInfo},
        content::DataBlob,
        header::HEADER_SIZE,
    },
    layout::{BlockExtents, Extent},
    types::{
        models::{BlobKind, EntryId, FourCC, Header, IndexEntry, RecordAttributes},
        options::{AppInfoLayout, LoadOptions},
    },
};
