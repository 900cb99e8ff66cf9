//! App-info block parsing and the standard category table.
//!
//! # Standard App-Info Structure
//! ```text
//! [2 bytes]       Renamed-categories bitmask
//! [16 x 16 bytes] Category names (NUL-padded)
//! [16 x 1 byte]   Category ids
//! [1 byte]        Last unique category id
//! [1 byte]        Padding
//! [N bytes]       Application-specific remainder ("rest")
//! ```

use byteorder::{BigEndian, ByteOrder};
use encoding_rs::Encoding;
use log::debug;

use crate::pdb::codec::registry::{DecoderRegistry, Payload};
use crate::pdb::types::error::{PdbError, Result};
use crate::pdb::types::models::{BlobKind, FourCC};
use crate::pdb::types::options::AppInfoLayout;
use crate::pdb::utils;

/// Number of slots in a category table.
pub const CATEGORY_SLOTS: usize = 16;

/// Width of one NUL-padded category name.
pub const CATEGORY_NAME_WIDTH: usize = 16;

/// Size of the standard prefix preceding the application-specific remainder.
pub const STANDARD_APPINFO_SIZE: usize = 2 + CATEGORY_SLOTS * CATEGORY_NAME_WIDTH + CATEGORY_SLOTS + 2;

/// One slot of a category table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub id: u8,
}

/// The fixed 16-slot category table of a standard app-info block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTable {
    slots: [Category; CATEGORY_SLOTS],
}

impl CategoryTable {
    pub fn new(slots: [Category; CATEGORY_SLOTS]) -> Self {
        Self { slots }
    }

    /// Builds a table from leading `(name, id)` pairs; remaining slots are empty.
    ///
    /// Pairs beyond the sixteenth are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u8)>) -> Self {
        let mut table = Self::default();
        for (slot, (name, id)) in table.slots.iter_mut().zip(pairs) {
            *slot = Category { name: name.to_string(), id };
        }
        table
    }

    pub fn slots(&self) -> &[Category; CATEGORY_SLOTS] {
        &self.slots
    }

    /// Returns the name in slot `index`.
    ///
    /// # Errors
    /// [`PdbError::IndexOutOfRange`] if `index` is not in `0..16`.
    pub fn name(&self, index: usize) -> Result<&str> {
        self.slots
            .get(index)
            .map(|category| category.name.as_str())
            .ok_or(PdbError::IndexOutOfRange { index, len: CATEGORY_SLOTS })
    }

    /// Returns the first slot whose name equals `name`, or `None`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|category| category.name == name)
    }

    pub fn set(&mut self, index: usize, category: Category) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(PdbError::IndexOutOfRange { index, len: CATEGORY_SLOTS })?;
        *slot = category;
        Ok(())
    }
}

/// A standard app-info block: category table plus an application remainder.
#[derive(Debug, Default)]
pub struct StandardAppInfo {
    pub renamed_categories: u16,
    pub categories: CategoryTable,
    pub last_unique_id: u8,
    /// Alignment byte after `last_unique_id`, kept as read.
    pub pad: u8,
    /// Bytes after the standard prefix, decoded if a codec is registered.
    pub rest: Payload,
}

/// The app-info block of a database.
#[derive(Debug)]
pub enum AppInfo {
    /// Bytes of unknown layout, kept verbatim.
    Opaque(Vec<u8>),
    Standard(StandardAppInfo),
}

impl AppInfo {
    /// Parses an app-info block.
    ///
    /// With [`AppInfoLayout::Standard`] the category table is decoded and the
    /// remainder is dispatched to the registry under [`BlobKind::AppInfo`].
    ///
    /// # Errors
    /// [`PdbError::Truncated`] if a standard block is shorter than its fixed
    /// prefix; [`PdbError::DecoderParse`] if a registered codec rejects the
    /// remainder.
    pub fn parse(
        bytes: Vec<u8>,
        offset: u64,
        layout: AppInfoLayout,
        encoding: &'static Encoding,
        registry: &DecoderRegistry,
        creator: FourCC,
    ) -> Result<Self> {
        if layout == AppInfoLayout::Opaque {
            debug!("App-info block kept opaque ({} bytes)", bytes.len());
            return Ok(AppInfo::Opaque(bytes));
        }

        if bytes.len() < STANDARD_APPINFO_SIZE {
            return Err(PdbError::Truncated {
                context: "standard app-info block",
                offset,
                expected: STANDARD_APPINFO_SIZE as u64,
                found: bytes.len() as u64,
            });
        }

        let renamed_categories = BigEndian::read_u16(&bytes[0..2]);
        let names = &bytes[2..2 + CATEGORY_SLOTS * CATEGORY_NAME_WIDTH];
        let ids_start = 2 + CATEGORY_SLOTS * CATEGORY_NAME_WIDTH;
        let ids = &bytes[ids_start..ids_start + CATEGORY_SLOTS];
        let last_unique_id = bytes[ids_start + CATEGORY_SLOTS];
        let pad = bytes[ids_start + CATEGORY_SLOTS + 1];

        let mut categories = CategoryTable::default();
        for (i, (name, &id)) in names.chunks_exact(CATEGORY_NAME_WIDTH).zip(ids).enumerate() {
            categories.slots[i] = Category {
                name: utils::decode_fixed_str(name, encoding),
                id,
            };
        }

        let rest = bytes[STANDARD_APPINFO_SIZE..].to_vec();
        debug!(
            "Standard app-info parsed: renamed={:#06x}, last_unique_id={}, rest={} bytes",
            renamed_categories,
            last_unique_id,
            rest.len()
        );
        let rest = registry.decode(creator, BlobKind::AppInfo, rest, "app-info block")?;

        Ok(AppInfo::Standard(StandardAppInfo {
            renamed_categories,
            categories,
            last_unique_id,
            pad,
            rest,
        }))
    }

    /// Serializes the block; the inverse of [`AppInfo::parse`].
    pub fn encode(&self, encoding: &'static Encoding) -> Vec<u8> {
        match self {
            AppInfo::Opaque(bytes) => bytes.clone(),
            AppInfo::Standard(info) => {
                let rest = info.rest.to_bytes();
                let mut out = Vec::with_capacity(STANDARD_APPINFO_SIZE + rest.len());
                out.extend_from_slice(&info.renamed_categories.to_be_bytes());
                for category in info.categories.slots() {
                    out.extend(utils::encode_fixed_str(&category.name, CATEGORY_NAME_WIDTH, encoding));
                }
                out.extend(info.categories.slots().iter().map(|category| category.id));
                out.push(info.last_unique_id);
                out.push(info.pad);
                out.extend_from_slice(&rest);
                out
            }
        }
    }

    /// The category table, or `None` for an opaque block.
    pub fn categories(&self) -> Option<&CategoryTable> {
        match self {
            AppInfo::Standard(info) => Some(&info.categories),
            AppInfo::Opaque(_) => None,
        }
    }

    pub fn categories_mut(&mut self) -> Option<&mut CategoryTable> {
        match self {
            AppInfo::Standard(info) => Some(&mut info.categories),
            AppInfo::Opaque(_) => None,
        }
    }

    /// Name of the category in slot `index`.
    pub fn category_name(&self, index: usize) -> Result<&str> {
        self.categories().ok_or(PdbError::NotStandardAppInfo)?.name(index)
    }

    /// First slot named `name`, or `None`.
    pub fn category_index(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.categories().ok_or(PdbError::NotStandardAppInfo)?.index_of(name))
    }
}
