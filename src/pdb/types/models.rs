//! Core data structures for Palm database container components.
//!
//! This module defines the fundamental types used throughout the library:
//! - The fixed database header
//! - Index entries (record and resource descriptors) and their identities
//! - Four-character codes and attribute bitfields

use std::fmt;

use crate::pdb::types::error::{PdbError, Result};

/// A four-character code as used for database types, creators and resource types.
///
/// Stored on disk as four raw bytes. Most codes are printable ASCII (`DATA`,
/// `appl`, `tAIN`), but nothing in the format enforces that.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(code: [u8; 4]) -> Self {
        Self(code)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            // Checked above: every byte is ASCII.
            let text: String = self.0.iter().map(|&b| b as char).collect();
            write!(f, "'{}'", text)
        } else {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }
}

/// Database header attribute bits.
pub mod header_attributes {
    /// The index holds resource descriptors (a `.prc`) instead of record descriptors.
    pub const RESOURCE_DB: u16 = 0x0001;
    pub const READ_ONLY: u16 = 0x0002;
    pub const APPINFO_DIRTY: u16 = 0x0004;
    pub const BACKUP: u16 = 0x0008;
    pub const OK_TO_INSTALL_NEWER: u16 = 0x0010;
    pub const RESET_AFTER_INSTALL: u16 = 0x0020;
    pub const COPY_PREVENTION: u16 = 0x0040;
    pub const STREAM: u16 = 0x0080;
    pub const HIDDEN: u16 = 0x0100;
    pub const LAUNCHABLE_DATA: u16 = 0x0200;
    pub const RECYCLABLE: u16 = 0x0400;
    pub const BUNDLE: u16 = 0x0800;
    pub const OPEN: u16 = 0x8000;
}

/// The fixed-size region at the start of every container.
///
/// Timestamps are kept in their on-disk form (seconds since 1904-01-01 UTC);
/// see [`crate::pdb::codec::timestamp`] for calendar conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub attributes: u16,
    pub version: u16,
    pub ctime: u32,
    pub mtime: u32,
    pub baktime: u32,
    pub modnum: u32,
    /// Absolute offset of the app-info block, `0` when absent.
    pub appinfo_offset: u32,
    /// Absolute offset of the sort-info block, `0` when absent.
    pub sortinfo_offset: u32,
    pub db_type: FourCC,
    pub creator: FourCC,
    pub unique_id_seed: u32,
    /// Not interpreted. Always written as `0`.
    pub next_record_list_id: u32,
    pub num_records: u16,
}

impl Header {
    /// Creates a header for an empty record database.
    pub fn new(name: impl Into<String>, db_type: FourCC, creator: FourCC) -> Self {
        Self {
            name: name.into(),
            db_type,
            creator,
            ..Self::default()
        }
    }

    /// Returns `true` if the index holds resource descriptors.
    pub fn is_resource_db(&self) -> bool {
        self.attributes & header_attributes::RESOURCE_DB != 0
    }

    pub fn set_resource_db(&mut self, resource: bool) {
        self.set_attribute(header_attributes::RESOURCE_DB, resource);
    }

    pub fn is_backup(&self) -> bool {
        self.attributes & header_attributes::BACKUP != 0
    }

    pub fn set_backup(&mut self, backup: bool) {
        self.set_attribute(header_attributes::BACKUP, backup);
    }

    fn set_attribute(&mut self, bit: u16, on: bool) {
        if on {
            self.attributes |= bit;
        } else {
            self.attributes &= !bit;
        }
    }

    /// The kind of descriptor the index holds, as selected by the resource flag.
    pub fn entry_kind(&self) -> BlobKind {
        if self.is_resource_db() {
            BlobKind::Resource
        } else {
            BlobKind::Record
        }
    }
}

/// Per-record attribute byte.
///
/// The high nibble carries status flags; the low nibble is the category index
/// into the app-info category table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RecordAttributes(pub u8);

impl RecordAttributes {
    pub const DELETE: u8 = 0x80;
    pub const DIRTY: u8 = 0x40;
    pub const BUSY: u8 = 0x20;
    pub const SECRET: u8 = 0x10;
    pub const CATEGORY_MASK: u8 = 0x0F;

    pub fn category(&self) -> u8 {
        self.0 & Self::CATEGORY_MASK
    }

    /// Returns these attributes with the category subfield replaced.
    pub fn with_category(self, category: u8) -> Self {
        Self((self.0 & !Self::CATEGORY_MASK) | (category & Self::CATEGORY_MASK))
    }

    pub fn is_deleted(&self) -> bool {
        self.0 & Self::DELETE != 0
    }

    pub fn is_dirty(&self) -> bool {
        self.0 & Self::DIRTY != 0
    }

    pub fn is_busy(&self) -> bool {
        self.0 & Self::BUSY != 0
    }

    pub fn is_secret(&self) -> bool {
        self.0 & Self::SECRET != 0
    }
}

/// What a byte payload belongs to. Used as half of the decoder registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Record,
    Resource,
    /// The "rest" of a standard app-info block, after the category table.
    AppInfo,
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobKind::Record => write!(f, "record"),
            BlobKind::Resource => write!(f, "resource"),
            BlobKind::AppInfo => write!(f, "app-info"),
        }
    }
}

/// Identity of an index entry, and the key of the database's blob map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryId {
    /// A record's 24-bit unique id.
    Record(u32),
    /// A resource's type code and numeric id.
    Resource(FourCC, u16),
}

impl EntryId {
    pub fn kind(&self) -> BlobKind {
        match self {
            EntryId::Record(_) => BlobKind::Record,
            EntryId::Resource(..) => BlobKind::Resource,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Record(uid) => write!(f, "record {:#08x}", uid),
            EntryId::Resource(res_type, id) => write!(f, "resource {} #{}", res_type, id),
        }
    }
}

/// A fixed-size index descriptor locating one blob.
///
/// Only the offset changes after construction; it is rewritten by the
/// offset planner before every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEntry {
    Record {
        unique_id: u32,
        attributes: RecordAttributes,
        offset: u32,
    },
    Resource {
        res_type: FourCC,
        id: u16,
        offset: u32,
    },
}

impl IndexEntry {
    /// Largest value a record unique id can hold on disk (24 bits).
    pub const MAX_UNIQUE_ID: u32 = 0x00FF_FFFF;

    /// A record descriptor with its offset left for the planner.
    ///
    /// # Errors
    /// [`PdbError::UniqueIdOutOfRange`] if `unique_id` needs more than 24 bits.
    pub fn record(unique_id: u32, attributes: RecordAttributes) -> Result<Self> {
        if unique_id > Self::MAX_UNIQUE_ID {
            return Err(PdbError::UniqueIdOutOfRange(unique_id));
        }
        Ok(IndexEntry::Record {
            unique_id,
            attributes,
            offset: 0,
        })
    }

    pub fn resource(res_type: FourCC, id: u16) -> Self {
        IndexEntry::Resource {
            res_type,
            id,
            offset: 0,
        }
    }

    pub fn id(&self) -> EntryId {
        match *self {
            IndexEntry::Record { unique_id, .. } => EntryId::Record(unique_id),
            IndexEntry::Resource { res_type, id, .. } => EntryId::Resource(res_type, id),
        }
    }

    pub fn kind(&self) -> BlobKind {
        self.id().kind()
    }

    pub fn offset(&self) -> u32 {
        match *self {
            IndexEntry::Record { offset, .. } | IndexEntry::Resource { offset, .. } => offset,
        }
    }

    pub(crate) fn set_offset(&mut self, new_offset: u32) {
        match self {
            IndexEntry::Record { offset, .. } | IndexEntry::Resource { offset, .. } => {
                *offset = new_offset
            }
        }
    }

    /// Record attributes, or `None` for a resource descriptor.
    pub fn attributes(&self) -> Option<RecordAttributes> {
        match *self {
            IndexEntry::Record { attributes, .. } => Some(attributes),
            IndexEntry::Resource { .. } => None,
        }
    }
}
