//! Hand-built container fixtures.
//!
//! Bytes are assembled field by field here instead of through
//! `Database::dump`, so the loader is tested against an independent writer.

#![allow(dead_code)]

pub const HEADER_SIZE: usize = 78;

/// Header fields that tests care about; everything else is written as zero.
#[derive(Debug, Clone)]
pub struct HeaderSpec {
    pub name: &'static str,
    pub attributes: u16,
    pub ctime: u32,
    pub mtime: u32,
    pub appinfo_offset: u32,
    pub sortinfo_offset: u32,
    pub db_type: [u8; 4],
    pub creator: [u8; 4],
    pub num_records: u16,
}

impl Default for HeaderSpec {
    fn default() -> Self {
        Self {
            name: "TestDB",
            attributes: 0,
            ctime: 0,
            mtime: 0,
            appinfo_offset: 0,
            sortinfo_offset: 0,
            db_type: *b"DATA",
            creator: *b"test",
            num_records: 0,
        }
    }
}

pub fn header_bytes(spec: &HeaderSpec) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE);
    let mut name = [0u8; 32];
    name[..spec.name.len()].copy_from_slice(spec.name.as_bytes());
    out.extend_from_slice(&name);
    out.extend_from_slice(&spec.attributes.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // version
    out.extend_from_slice(&spec.ctime.to_be_bytes());
    out.extend_from_slice(&spec.mtime.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // baktime
    out.extend_from_slice(&7u32.to_be_bytes()); // modnum
    out.extend_from_slice(&spec.appinfo_offset.to_be_bytes());
    out.extend_from_slice(&spec.sortinfo_offset.to_be_bytes());
    out.extend_from_slice(&spec.db_type);
    out.extend_from_slice(&spec.creator);
    out.extend_from_slice(&0u32.to_be_bytes()); // unique id seed
    out.extend_from_slice(&0u32.to_be_bytes()); // next record list id
    out.extend_from_slice(&spec.num_records.to_be_bytes());
    assert_eq!(out.len(), HEADER_SIZE);
    out
}

pub fn record_entry(offset: u32, attributes: u8, unique_id: u32) -> Vec<u8> {
    let mut out = offset.to_be_bytes().to_vec();
    out.push(attributes);
    out.extend_from_slice(&unique_id.to_be_bytes()[1..]);
    out
}

pub fn resource_entry(res_type: [u8; 4], id: u16, offset: u32) -> Vec<u8> {
    let mut out = res_type.to_vec();
    out.extend_from_slice(&id.to_be_bytes());
    out.extend_from_slice(&offset.to_be_bytes());
    out
}

/// A record database laid out contiguously in canonical order:
/// header, index, app-info, sort-info, records.
pub struct RecordDb {
    pub header: HeaderSpec,
    pub appinfo: Option<Vec<u8>>,
    pub sortinfo: Option<Vec<u8>>,
    /// `(unique id, attributes, payload)`
    pub records: Vec<(u32, u8, Vec<u8>)>,
}

impl RecordDb {
    pub fn new(records: Vec<(u32, u8, Vec<u8>)>) -> Self {
        Self {
            header: HeaderSpec::default(),
            appinfo: None,
            sortinfo: None,
            records,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut cursor = HEADER_SIZE + 8 * self.records.len();
        let mut header = self.header.clone();
        header.num_records = self.records.len() as u16;
        if let Some(appinfo) = &self.appinfo {
            header.appinfo_offset = cursor as u32;
            cursor += appinfo.len();
        }
        if let Some(sortinfo) = &self.sortinfo {
            header.sortinfo_offset = cursor as u32;
            cursor += sortinfo.len();
        }

        let mut out = header_bytes(&header);
        for (uid, attributes, payload) in &self.records {
            out.extend(record_entry(cursor as u32, *attributes, *uid));
            cursor += payload.len();
        }
        out.extend(self.appinfo.iter().flatten());
        out.extend(self.sortinfo.iter().flatten());
        for (_, _, payload) in &self.records {
            out.extend_from_slice(payload);
        }
        out
    }
}

/// A record database with explicit offsets: header, the given index
/// entries verbatim, then `body` placed right after the index.
pub fn raw_record_db(header: HeaderSpec, entries: &[(u32, u8, u32)], body: &[u8]) -> Vec<u8> {
    let header = HeaderSpec {
        num_records: entries.len() as u16,
        ..header
    };
    let mut out = header_bytes(&header);
    for &(offset, attributes, uid) in entries {
        out.extend(record_entry(offset, attributes, uid));
    }
    out.extend_from_slice(body);
    out
}

/// Builds a standard app-info block: category table followed by `rest`.
pub fn standard_appinfo(categories: &[(&str, u8)], rest: &[u8]) -> Vec<u8> {
    let mut out = 0u16.to_be_bytes().to_vec();
    for slot in 0..16 {
        let mut name = [0u8; 16];
        if let Some((text, _)) = categories.get(slot) {
            name[..text.len()].copy_from_slice(text.as_bytes());
        }
        out.extend_from_slice(&name);
    }
    for slot in 0..16 {
        out.push(categories.get(slot).map(|(_, id)| *id).unwrap_or(0));
    }
    out.push(categories.len() as u8); // last unique id
    out.push(0);
    out.extend_from_slice(rest);
    out
}
