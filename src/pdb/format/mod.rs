//! File format parsing layer for Palm database containers.
//!
//! # Module Organization
//!
//! - [`header`]: The fixed 78-byte database header
//! - [`index`]: Record and resource descriptors
//! - [`appinfo`]: The optional app-info block and its category table
//! - [`content`]: Per-entry blobs and decoder dispatch
//!
//! Region extents are not stored on disk; see [`crate::pdb::layout`].

pub mod appinfo;
pub mod content;
pub mod header;
pub mod index;
