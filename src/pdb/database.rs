use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, WINDOWS_1252};
use log::{debug, info};

use super::codec::registry::Payload;
use super::codec::timestamp;
use super::format::appinfo::AppInfo;
use super::format::content::{self, DataBlob};
use super::format::{header, index};
use super::layout::{self, Extent};
use super::types::error::{PdbError, Result};
use super::types::models::{EntryId, Header, IndexEntry};
use super::types::options::LoadOptions;
use super::utils;

/// An in-memory Palm database container (`.pdb` or `.prc`).
///
/// Holds the header, the index in offset order, one [`DataBlob`] per index
/// entry, and the optional app-info and sort-info blocks. Offsets in the
/// header and index reflect the last load or write; they are recomputed
/// from scratch by [`Database::dump`].
#[derive(Debug)]
pub struct Database {
    header: Header,
    index: Vec<IndexEntry>,
    blobs: HashMap<EntryId, DataBlob>,
    appinfo: Option<AppInfo>,
    sortinfo: Option<Vec<u8>>,
    encoding: &'static Encoding,
}

impl Default for Database {
    fn default() -> Self {
        Self::new(Header::default())
    }
}

impl Database {
    /// Creates an empty database with the given header.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            index: Vec::new(),
            blobs: HashMap::new(),
            appinfo: None,
            sortinfo: None,
            encoding: WINDOWS_1252,
        }
    }

    /// Loads a container with default [`LoadOptions`].
    pub fn load<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Self::load_with(reader, &LoadOptions::default())
    }

    /// Loads a container starting at the reader's current position.
    ///
    /// All stored offsets are taken relative to that position.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A fixed-size region (header, index, standard app-info prefix) is truncated
    /// - Stored offsets imply a negative block or blob length
    /// - Two index entries name the same record or resource
    /// - A registered decoder rejects its payload
    pub fn load_with<R: Read + Seek>(reader: &mut R, options: &LoadOptions) -> Result<Self> {
        let base = reader.stream_position()?;
        let end_of_file = reader.seek(SeekFrom::End(0))?.saturating_sub(base);
        reader.seek(SeekFrom::Start(base))?;
        info!("Loading Palm database ({} bytes)", end_of_file);

        // Step 1: Fixed header
        let header = header::parse(reader, options.encoding)?;

        // Step 2: Index, put into offset order
        let mut index = index::parse(reader, &header)?;
        index::sort_by_offset(&mut index);

        // Step 3: Infer region extents from neighbouring offsets
        let blobs_start = index
            .first()
            .map(|entry| entry.offset() as u64)
            .unwrap_or(end_of_file);
        let blocks = layout::infer_block_extents(header.appinfo_offset, header.sortinfo_offset, blobs_start)?;
        let extents = layout::blob_extents(&index, end_of_file)?;

        // Step 4: Optional blocks
        let appinfo = match blocks.appinfo.filter(|extent| extent.len > 0) {
            Some(extent) => {
                let bytes = read_extent(reader, base, extent, "app-info block")?;
                Some(AppInfo::parse(
                    bytes,
                    extent.offset,
                    options.appinfo_layout,
                    options.encoding,
                    &options.registry,
                    header.creator,
                )?)
            }
            None => None,
        };
        let sortinfo = match blocks.sortinfo.filter(|extent| extent.len > 0) {
            Some(extent) => Some(read_extent(reader, base, extent, "sort-info block")?),
            None => None,
        };

        // Step 5: One blob per index entry
        let mut blobs = HashMap::with_capacity(index.len());
        for (entry, extent) in index.iter().zip(&extents) {
            let bytes = read_extent(reader, base, *extent, "blob")?;
            let blob = content::decode_blob(bytes, entry.id(), header.creator, &options.registry)?;
            if blobs.insert(entry.id(), blob).is_some() {
                return Err(PdbError::DuplicateEntryId(entry.id().to_string()));
            }
        }

        info!(
            "Database '{}' loaded: {} {} entries, appinfo={}, sortinfo={}",
            header.name,
            index.len(),
            header.entry_kind(),
            appinfo.is_some(),
            sortinfo.is_some()
        );

        Ok(Self {
            header,
            index,
            blobs,
            appinfo,
            sortinfo,
            encoding: options.encoding,
        })
    }

    /// Loads a container from an in-memory buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(&mut Cursor::new(bytes))
    }

    pub fn from_bytes_with(bytes: &[u8], options: &LoadOptions) -> Result<Self> {
        Self::load_with(&mut Cursor::new(bytes), options)
    }

    /// Recomputes the record count, block offsets and every entry offset.
    ///
    /// Entries keep their current order; afterwards the index is sorted by
    /// offset by construction. [`Database::dump`] calls this implicitly.
    pub fn recompute_offsets(&mut self) -> Result<()> {
        let appinfo_len = self
            .appinfo
            .as_ref()
            .map(|appinfo| appinfo.encode(self.encoding).len() as u64);
        let sortinfo_len = self.sortinfo.as_ref().map(|bytes| bytes.len() as u64);
        let blobs = &self.blobs;
        layout::plan_offsets(
            &mut self.header,
            &mut self.index,
            blobs.len(),
            appinfo_len,
            sortinfo_len,
            |entry| {
                blobs
                    .get(&entry.id())
                    .map(|blob| blob.len() as u64)
                    .ok_or_else(|| PdbError::UnknownEntry(entry.id().to_string()))
            },
        )?;
        Ok(())
    }

    /// Writes the container: header, index, app-info, sort-info, then blobs
    /// in index order. Offsets are recomputed first.
    ///
    /// The index is validated before any byte reaches `writer`, so an error
    /// from an invalid entry leaves the writer untouched.
    pub fn dump<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        info!("Writing database '{}' ({} entries)", self.header.name, self.index.len());
        index::validate(&self.header, &self.index)?;

        let appinfo = self.appinfo.as_ref().map(|appinfo| appinfo.encode(self.encoding));
        let payloads = self
            .index
            .iter()
            .map(|entry| Ok((entry.id(), self.blob_for(entry.id())?.dump())))
            .collect::<Result<HashMap<EntryId, Vec<u8>>>>()?;

        let total = layout::plan_offsets(
            &mut self.header,
            &mut self.index,
            self.blobs.len(),
            appinfo.as_ref().map(|bytes| bytes.len() as u64),
            self.sortinfo.as_ref().map(|bytes| bytes.len() as u64),
            |entry| {
                payloads
                    .get(&entry.id())
                    .map(|bytes| bytes.len() as u64)
                    .ok_or_else(|| PdbError::UnknownEntry(entry.id().to_string()))
            },
        )?;

        header::write(writer, &self.header, self.encoding)?;
        index::write(writer, &self.header, &self.index)?;
        if let Some(bytes) = &appinfo {
            writer.write_all(bytes)?;
        }
        if let Some(bytes) = &self.sortinfo {
            writer.write_all(bytes)?;
        }
        for entry in &self.index {
            if let Some(bytes) = payloads.get(&entry.id()) {
                writer.write_all(bytes)?;
            }
        }

        debug!("Database '{}' written: {} bytes", self.header.name, total);
        Ok(())
    }

    /// Writes the container into a fresh buffer.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.dump(&mut out)?;
        Ok(out)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable header access. Offsets and the entry count are overwritten on write.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// The text encoding used for the name and category fields.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = encoding;
    }

    /// Index entries in their current order.
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn blob(&self, id: EntryId) -> Option<&DataBlob> {
        self.blobs.get(&id)
    }

    pub fn blob_mut(&mut self, id: EntryId) -> Option<&mut DataBlob> {
        self.blobs.get_mut(&id)
    }

    /// All blobs, in index order.
    pub fn blobs(&self) -> impl Iterator<Item = &DataBlob> + '_ {
        self.index.iter().filter_map(move |entry| self.blobs.get(&entry.id()))
    }

    /// Appends an entry and its payload.
    ///
    /// The entry's offset is ignored until the next write assigns one.
    ///
    /// # Errors
    /// - [`PdbError::InvalidLayout`] if the entry variant disagrees with the
    ///   header's resource flag
    /// - [`PdbError::UniqueIdOutOfRange`] if a record id needs more than 24 bits
    /// - [`PdbError::DuplicateEntryId`] if the id is already present
    pub fn insert(&mut self, entry: IndexEntry, payload: impl Into<Payload>) -> Result<()> {
        let id = entry.id();
        index::validate(&self.header, std::slice::from_ref(&entry))?;
        if self.blobs.contains_key(&id) {
            return Err(PdbError::DuplicateEntryId(id.to_string()));
        }
        self.index.push(entry);
        self.blobs.insert(id, DataBlob::new(id, payload));
        Ok(())
    }

    /// Removes an entry and returns its blob.
    pub fn remove(&mut self, id: EntryId) -> Result<DataBlob> {
        let blob = self
            .blobs
            .remove(&id)
            .ok_or_else(|| PdbError::UnknownEntry(id.to_string()))?;
        self.index.retain(|entry| entry.id() != id);
        Ok(blob)
    }

    /// Replaces an entry's payload, returning the previous one.
    pub fn replace_payload(&mut self, id: EntryId, payload: impl Into<Payload>) -> Result<Payload> {
        let blob = self
            .blobs
            .get_mut(&id)
            .ok_or_else(|| PdbError::UnknownEntry(id.to_string()))?;
        Ok(std::mem::replace(&mut blob.payload, payload.into()))
    }

    pub fn appinfo(&self) -> Option<&AppInfo> {
        self.appinfo.as_ref()
    }

    pub fn appinfo_mut(&mut self) -> Option<&mut AppInfo> {
        self.appinfo.as_mut()
    }

    pub fn set_appinfo(&mut self, appinfo: Option<AppInfo>) -> Option<AppInfo> {
        std::mem::replace(&mut self.appinfo, appinfo)
    }

    pub fn sortinfo(&self) -> Option<&[u8]> {
        self.sortinfo.as_deref()
    }

    pub fn set_sortinfo(&mut self, sortinfo: Option<Vec<u8>>) -> Option<Vec<u8>> {
        std::mem::replace(&mut self.sortinfo, sortinfo)
    }

    /// Creation time, or `None` if unset.
    pub fn ctime(&self) -> Option<DateTime<Utc>> {
        timestamp::from_palm(self.header.ctime)
    }

    pub fn set_ctime(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.header.ctime = timestamp::to_palm(time)?;
        Ok(())
    }

    /// Modification time, or `None` if unset.
    pub fn mtime(&self) -> Option<DateTime<Utc>> {
        timestamp::from_palm(self.header.mtime)
    }

    pub fn set_mtime(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.header.mtime = timestamp::to_palm(time)?;
        Ok(())
    }

    /// Last backup time, or `None` if the database was never backed up.
    pub fn backup_time(&self) -> Option<DateTime<Utc>> {
        timestamp::from_palm(self.header.baktime)
    }

    pub fn set_backup_time(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.header.baktime = timestamp::to_palm(time)?;
        Ok(())
    }

    /// Name of the category a record is filed under.
    ///
    /// # Errors
    /// - [`PdbError::UnknownEntry`] if `id` is not a record of this database
    /// - [`PdbError::NotStandardAppInfo`] without a standard app-info block
    pub fn record_category(&self, id: EntryId) -> Result<&str> {
        let attributes = self
            .index
            .iter()
            .find(|entry| entry.id() == id)
            .and_then(|entry| entry.attributes())
            .ok_or_else(|| PdbError::UnknownEntry(id.to_string()))?;
        self.appinfo
            .as_ref()
            .ok_or(PdbError::NotStandardAppInfo)?
            .category_name(attributes.category() as usize)
    }

    /// Files a record under the category named `name`.
    ///
    /// # Errors
    /// - [`PdbError::CategoryNotFound`] if no slot carries that name; no
    ///   category is created
    /// - [`PdbError::UnknownEntry`] if `id` is not a record of this database
    /// - [`PdbError::NotStandardAppInfo`] without a standard app-info block
    pub fn set_record_category(&mut self, id: EntryId, name: &str) -> Result<()> {
        let category = self
            .appinfo
            .as_ref()
            .ok_or(PdbError::NotStandardAppInfo)?
            .category_index(name)?
            .ok_or_else(|| PdbError::CategoryNotFound(name.to_string()))?;

        match self.index.iter_mut().find(|entry| entry.id() == id) {
            Some(IndexEntry::Record { attributes, .. }) => {
                *attributes = attributes.with_category(category as u8);
                Ok(())
            }
            _ => Err(PdbError::UnknownEntry(id.to_string())),
        }
    }

    fn blob_for(&self, id: EntryId) -> Result<&DataBlob> {
        self.blobs
            .get(&id)
            .ok_or_else(|| PdbError::UnknownEntry(id.to_string()))
    }
}

/// Seek to an extent (relative to the container start) and read it whole.
fn read_extent<R: Read + Seek>(
    reader: &mut R,
    base: u64,
    extent: Extent,
    context: &'static str,
) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(base + extent.offset))?;
    utils::read_region(reader, context, extent.offset, extent.len)
}
