//! Container geometry: recovering region extents from stored offsets, and
//! planning fresh offsets before a write.
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌─────────────────┐ 0
//! │  Header         │
//! ├─────────────────┤ HEADER_SIZE
//! │  Index          │  N fixed-size entries
//! ├─────────────────┤ appinfo_offset  (optional)
//! │  App-info       │
//! ├─────────────────┤ sortinfo_offset (optional)
//! │  Sort-info      │
//! ├─────────────────┤ first entry offset
//! │  Blobs          │  one per entry, in offset order
//! └─────────────────┘ end of file
//! ```
//!
//! No lengths are stored on disk. Each region ends where the next one starts.

use log::debug;

use crate::pdb::format::header::HEADER_SIZE;
use crate::pdb::types::error::{PdbError, Result};
use crate::pdb::types::models::{Header, IndexEntry};

/// An absolute byte range inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub offset: u64,
    pub len: u64,
}

impl Extent {
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Inferred extents of the two optional blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockExtents {
    pub appinfo: Option<Extent>,
    pub sortinfo: Option<Extent>,
}

/// Infers app-info and sort-info extents from their offsets.
///
/// `next_offset` is where the blob stream begins: the offset of the first
/// entry of the offset-sorted index, or the end of the file when the index is
/// empty. Four placements are valid:
///
/// | appinfo | sortinfo | appinfo ends at | sortinfo ends at |
/// |---------|----------|-----------------|------------------|
/// | > 0     | > 0      | sortinfo        | next_offset      |
/// | > 0     | 0        | next_offset     | -                |
/// | 0       | > 0      | -               | next_offset      |
/// | 0       | 0        | -               | -                |
///
/// # Errors
/// [`PdbError::InvalidLayout`] if any inferred length would be negative.
pub fn infer_block_extents(appinfo_offset: u32, sortinfo_offset: u32, next_offset: u64) -> Result<BlockExtents> {
    let appinfo_offset = appinfo_offset as u64;
    let sortinfo_offset = sortinfo_offset as u64;

    let extents = match (appinfo_offset > 0, sortinfo_offset > 0) {
        (true, true) => BlockExtents {
            appinfo: Some(span("app-info", appinfo_offset, sortinfo_offset)?),
            sortinfo: Some(span("sort-info", sortinfo_offset, next_offset)?),
        },
        (true, false) => BlockExtents {
            appinfo: Some(span("app-info", appinfo_offset, next_offset)?),
            sortinfo: None,
        },
        (false, true) => BlockExtents {
            appinfo: None,
            sortinfo: Some(span("sort-info", sortinfo_offset, next_offset)?),
        },
        (false, false) => BlockExtents::default(),
    };

    debug!(
        "Block extents: appinfo={:?}, sortinfo={:?} (blobs start at {})",
        extents.appinfo, extents.sortinfo, next_offset
    );
    Ok(extents)
}

/// Infers one extent per entry of an offset-sorted index.
///
/// Each blob runs up to the next entry's offset; the last one runs to
/// `end_of_file`. Entries sharing an offset get zero-length extents, except
/// the last of them.
///
/// # Errors
/// [`PdbError::InvalidLayout`] if the index is not sorted or an offset lies
/// past the end of the file.
pub fn blob_extents(entries: &[IndexEntry], end_of_file: u64) -> Result<Vec<Extent>> {
    let mut extents = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let next = entries
            .get(i + 1)
            .map(|next| next.offset() as u64)
            .unwrap_or(end_of_file);
        let start = entry.offset() as u64;
        if next < start {
            return Err(PdbError::InvalidLayout(format!(
                "{} at offset {} would end at {} (negative length)",
                entry.id(),
                start,
                next
            )));
        }
        extents.push(Extent { offset: start, len: next - start });
    }
    Ok(extents)
}

fn span(context: &str, start: u64, end: u64) -> Result<Extent> {
    if end < start {
        return Err(PdbError::InvalidLayout(format!(
            "{} block at offset {} would end at {} (negative length)",
            context, start, end
        )));
    }
    Ok(Extent { offset: start, len: end - start })
}

/// Recomputes every stored offset for a fresh write.
///
/// In order:
/// 1. `num_records` becomes `record_count`; `next_record_list_id` becomes 0.
/// 2. Space is reserved for the header and for every index entry.
/// 3. The app-info block, then the sort-info block, are placed if present;
///    absent blocks get offset 0.
/// 4. Each entry, in current slice order, is placed right after the previous
///    blob, with `blob_len` giving its payload length.
///
/// Entries are not re-sorted: the slice order is the write order, and the
/// index is offset-sorted afterwards by construction.
///
/// Returns the total size of the container.
///
/// # Errors
/// [`PdbError::InvalidLayout`] if the container outgrows 32-bit offsets or
/// `record_count` does not fit the 16-bit count field. Errors from `blob_len`
/// are passed through.
pub fn plan_offsets<F>(
    header: &mut Header,
    index: &mut [IndexEntry],
    record_count: usize,
    appinfo_len: Option<u64>,
    sortinfo_len: Option<u64>,
    mut blob_len: F,
) -> Result<u64>
where
    F: FnMut(&IndexEntry) -> Result<u64>,
{
    header.num_records = u16::try_from(record_count).map_err(|_| {
        PdbError::InvalidLayout(format!("{} entries exceed the 16-bit entry count", record_count))
    })?;
    header.next_record_list_id = 0;

    let mut cursor = HEADER_SIZE as u64;
    for entry in index.iter() {
        cursor += entry.encoded_len() as u64;
    }

    header.appinfo_offset = 0;
    if let Some(len) = appinfo_len {
        header.appinfo_offset = to_offset(cursor, "app-info block")?;
        cursor += len;
    }

    header.sortinfo_offset = 0;
    if let Some(len) = sortinfo_len {
        header.sortinfo_offset = to_offset(cursor, "sort-info block")?;
        cursor += len;
    }

    for entry in index.iter_mut() {
        let len = blob_len(entry)?;
        entry.set_offset(to_offset(cursor, "blob")?);
        cursor += len;
    }

    debug!(
        "Offsets planned: {} entries, appinfo={}, sortinfo={}, total {} bytes",
        index.len(),
        header.appinfo_offset,
        header.sortinfo_offset,
        cursor
    );
    Ok(cursor)
}

fn to_offset(cursor: u64, context: &str) -> Result<u32> {
    u32::try_from(cursor)
        .map_err(|_| PdbError::InvalidLayout(format!("{} offset {} exceeds 32 bits", context, cursor)))
}
