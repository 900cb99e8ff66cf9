//! # Blob Content Decoding
//!
//! Turns the bytes of one index entry into a [`DataBlob`]. The decoder
//! registry is consulted with the database creator and the entry kind; with
//! no codec registered the bytes are kept raw and written back unchanged.

use crate::pdb::codec::registry::{DecoderRegistry, Payload};
use crate::pdb::types::error::Result;
use crate::pdb::types::models::{BlobKind, EntryId, FourCC};

/// The payload of one record or resource.
///
/// A blob knows its own identity only. Anything that needs the owning
/// database (category names, for instance) goes through
/// [`Database`](crate::Database), which holds both.
#[derive(Debug)]
pub struct DataBlob {
    id: EntryId,
    pub payload: Payload,
}

impl DataBlob {
    pub fn new(id: EntryId, payload: impl Into<Payload>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> BlobKind {
        self.id.kind()
    }

    /// Serialized length of the payload.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The bytes written for this blob.
    pub fn dump(&self) -> Vec<u8> {
        self.payload.to_bytes().into_owned()
    }
}

/// Decodes the bytes of entry `id` from a database created by `creator`.
///
/// # Errors
/// [`PdbError::DecoderParse`](crate::PdbError::DecoderParse) if a codec is
/// registered for this blob and rejects it. A missing codec is not an error.
pub fn decode_blob(
    bytes: Vec<u8>,
    id: EntryId,
    creator: FourCC,
    registry: &DecoderRegistry,
) -> Result<DataBlob> {
    let payload = registry.decode(creator, id.kind(), bytes, id)?;
    Ok(DataBlob { id, payload })
}
