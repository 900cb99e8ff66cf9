//! Database header parsing and serialization.
//!
//! # Header Structure (78 bytes, big-endian)
//! ```text
//! [32 bytes] Name (NUL-padded)
//! [2 bytes]  Attributes
//! [2 bytes]  Version
//! [4 bytes]  Creation time
//! [4 bytes]  Modification time
//! [4 bytes]  Backup time
//! [4 bytes]  Modification number
//! [4 bytes]  App-info offset (0 = absent)
//! [4 bytes]  Sort-info offset (0 = absent)
//! [4 bytes]  Type
//! [4 bytes]  Creator
//! [4 bytes]  Unique id seed
//! [4 bytes]  Next record-list id
//! [2 bytes]  Number of index entries
//! ```

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::Encoding;
use log::{debug, trace};

use crate::pdb::types::error::Result;
use crate::pdb::types::models::{FourCC, Header};
use crate::pdb::utils;

/// Size of the fixed header region. The index starts right after it.
pub const HEADER_SIZE: usize = 78;

/// Width of the NUL-padded database name field.
pub const NAME_WIDTH: usize = 32;

/// Parses the header from a reader positioned at the start of the container.
///
/// # Errors
/// [`PdbError::Truncated`](crate::PdbError::Truncated) if fewer than
/// [`HEADER_SIZE`] bytes are available; no partial header is ever returned.
pub fn parse<R: Read>(reader: &mut R, encoding: &'static Encoding) -> Result<Header> {
    let bytes = utils::read_region(reader, "header", 0, HEADER_SIZE as u64)?;
    let name = utils::decode_fixed_str(&bytes[..NAME_WIDTH], encoding);

    let mut fields = &bytes[NAME_WIDTH..];
    let header = Header {
        name,
        attributes: fields.read_u16::<BigEndian>()?,
        version: fields.read_u16::<BigEndian>()?,
        ctime: fields.read_u32::<BigEndian>()?,
        mtime: fields.read_u32::<BigEndian>()?,
        baktime: fields.read_u32::<BigEndian>()?,
        modnum: fields.read_u32::<BigEndian>()?,
        appinfo_offset: fields.read_u32::<BigEndian>()?,
        sortinfo_offset: fields.read_u32::<BigEndian>()?,
        db_type: read_fourcc(&mut fields)?,
        creator: read_fourcc(&mut fields)?,
        unique_id_seed: fields.read_u32::<BigEndian>()?,
        next_record_list_id: fields.read_u32::<BigEndian>()?,
        num_records: fields.read_u16::<BigEndian>()?,
    };

    debug!(
        "Header parsed: name='{}', type={}, creator={}, attributes={:#06x}, entries={}",
        header.name, header.db_type, header.creator, header.attributes, header.num_records
    );
    trace!(
        "Header offsets: appinfo={}, sortinfo={}, next_record_list_id={}",
        header.appinfo_offset, header.sortinfo_offset, header.next_record_list_id
    );
    Ok(header)
}

/// Writes the header; the exact inverse of [`parse`].
pub fn write<W: Write>(writer: &mut W, header: &Header, encoding: &'static Encoding) -> Result<()> {
    writer.write_all(&utils::encode_fixed_str(&header.name, NAME_WIDTH, encoding))?;
    writer.write_u16::<BigEndian>(header.attributes)?;
    writer.write_u16::<BigEndian>(header.version)?;
    writer.write_u32::<BigEndian>(header.ctime)?;
    writer.write_u32::<BigEndian>(header.mtime)?;
    writer.write_u32::<BigEndian>(header.baktime)?;
    writer.write_u32::<BigEndian>(header.modnum)?;
    writer.write_u32::<BigEndian>(header.appinfo_offset)?;
    writer.write_u32::<BigEndian>(header.sortinfo_offset)?;
    writer.write_all(header.db_type.as_bytes())?;
    writer.write_all(header.creator.as_bytes())?;
    writer.write_u32::<BigEndian>(header.unique_id_seed)?;
    writer.write_u32::<BigEndian>(header.next_record_list_id)?;
    writer.write_u16::<BigEndian>(header.num_records)?;
    Ok(())
}

/// Reads a raw four-character code.
pub(crate) fn read_fourcc<R: Read>(reader: &mut R) -> Result<FourCC> {
    let mut code = [0u8; 4];
    reader.read_exact(&mut code)?;
    Ok(FourCC(code))
}
