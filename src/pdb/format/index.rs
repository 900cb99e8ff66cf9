//! # Index Parsing
//!
//! The index follows the header directly and holds one fixed-size descriptor
//! per blob. The header's resource flag selects the descriptor variant:
//!
//! ```text
//! Record entry (8 bytes):     [4] offset  [1] attributes  [3] unique id
//! Resource entry (10 bytes):  [4] type    [2] id          [4] offset
//! ```
//!
//! Descriptors carry offsets only. Lengths are recovered later by
//! [`crate::pdb::layout`] from the offset-sorted order produced here.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace, warn};

use crate::pdb::format::header::{read_fourcc, HEADER_SIZE};
use crate::pdb::types::error::{PdbError, Result};
use crate::pdb::types::models::{BlobKind, Header, IndexEntry, RecordAttributes};
use crate::pdb::utils;

pub const RECORD_ENTRY_SIZE: usize = 8;
pub const RESOURCE_ENTRY_SIZE: usize = 10;

/// Encoded size of one descriptor of the given kind.
pub fn entry_size(kind: BlobKind) -> usize {
    match kind {
        BlobKind::Resource => RESOURCE_ENTRY_SIZE,
        BlobKind::Record | BlobKind::AppInfo => RECORD_ENTRY_SIZE,
    }
}

impl IndexEntry {
    /// Encoded size of this descriptor on disk.
    pub fn encoded_len(&self) -> usize {
        entry_size(self.kind())
    }
}

/// Parses `header.num_records` descriptors from a reader positioned right after the header.
///
/// The returned entries are in on-disk order; call [`sort_by_offset`] before
/// inferring lengths.
pub fn parse<R: Read>(reader: &mut R, header: &Header) -> Result<Vec<IndexEntry>> {
    let kind = header.entry_kind();
    let count = header.num_records as usize;
    let region_len = (count * entry_size(kind)) as u64;
    let bytes = utils::read_region(reader, "index", HEADER_SIZE as u64, region_len)?;

    let mut reader = bytes.as_slice();
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let entry = match kind {
            BlobKind::Resource => {
                let res_type = read_fourcc(&mut reader)?;
                let id = reader.read_u16::<BigEndian>()?;
                let offset = reader.read_u32::<BigEndian>()?;
                IndexEntry::Resource { res_type, id, offset }
            }
            BlobKind::Record | BlobKind::AppInfo => {
                let offset = reader.read_u32::<BigEndian>()?;
                let attributes = RecordAttributes(reader.read_u8()?);
                let unique_id = reader.read_u24::<BigEndian>()?;
                IndexEntry::Record { unique_id, attributes, offset }
            }
        };
        trace!("Index entry: {} at offset {}", entry.id(), entry.offset());
        entries.push(entry);
    }

    debug!("Index parsed: {} {} entries ({} bytes)", entries.len(), kind, region_len);
    Ok(entries)
}

/// Orders the index ascending by offset.
///
/// The sort is stable: entries sharing an offset keep their on-disk relative
/// order. Shared offsets are reported but tolerated, since some historical
/// files contain them.
pub fn sort_by_offset(entries: &mut [IndexEntry]) {
    let mut seen: BTreeMap<u32, usize> = BTreeMap::new();
    for entry in entries.iter() {
        *seen.entry(entry.offset()).or_default() += 1;
    }
    for (offset, count) in seen.iter().filter(|(_, count)| **count > 1) {
        warn!("{} index entries share offset {}", count, offset);
    }

    entries.sort_by_key(|entry| entry.offset());
}

/// Checks that every descriptor can be written under `header`.
///
/// # Errors
/// - [`PdbError::InvalidLayout`] if an entry's variant disagrees with the
///   header's resource flag
/// - [`PdbError::UniqueIdOutOfRange`] if a record id needs more than 24 bits
pub fn validate(header: &Header, entries: &[IndexEntry]) -> Result<()> {
    let expected = header.entry_kind();
    for entry in entries {
        if entry.kind() != expected {
            return Err(PdbError::InvalidLayout(format!(
                "{} in a {} database index",
                entry.id(),
                expected
            )));
        }
        if let IndexEntry::Record { unique_id, .. } = *entry
            && unique_id > IndexEntry::MAX_UNIQUE_ID
        {
            return Err(PdbError::UniqueIdOutOfRange(unique_id));
        }
    }
    Ok(())
}

/// Writes every descriptor in slice order.
///
/// Nothing is written unless the whole slice passes [`validate`].
pub fn write<W: Write>(writer: &mut W, header: &Header, entries: &[IndexEntry]) -> Result<()> {
    validate(header, entries)?;
    for entry in entries {
        match *entry {
            IndexEntry::Resource { res_type, id, offset } => {
                writer.write_all(res_type.as_bytes())?;
                writer.write_u16::<BigEndian>(id)?;
                writer.write_u32::<BigEndian>(offset)?;
            }
            IndexEntry::Record { unique_id, attributes, offset } => {
                writer.write_u32::<BigEndian>(offset)?;
                writer.write_u8(attributes.0)?;
                writer.write_u24::<BigEndian>(unique_id)?;
            }
        }
    }
    Ok(())
}
