//! Pluggable structured decoders for blob payloads.
//!
//! The container never interprets record, resource or app-info bytes itself.
//! Callers register a [`StructuredCodec`] for a `(creator, kind)` pair; when a
//! payload of that kind is loaded from a database with that creator, the codec
//! turns the bytes into a [`Structured`] view. Every other payload stays raw.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::pdb::types::error::{PdbError, Result};
use crate::pdb::types::models::{BlobKind, FourCC};

/// A decoded, application-specific view of a payload.
pub trait Structured: Any + fmt::Debug + Send + Sync {
    /// Serializes the view back into the bytes stored in the container.
    fn encode(&self) -> Vec<u8>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Turns raw payload bytes into a [`Structured`] view.
pub trait StructuredCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Box<dyn Structured>, Box<dyn Error + Send + Sync>>;
}

/// The bytes of one record, resource or app-info remainder.
#[derive(Debug)]
pub enum Payload {
    /// Bytes kept exactly as read; written back unchanged.
    Raw(Vec<u8>),
    /// A view produced by a registered codec; re-encoded on write.
    Decoded(Box<dyn Structured>),
}

impl Payload {
    /// The bytes this payload occupies on disk.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Payload::Raw(bytes) => Cow::Borrowed(bytes),
            Payload::Decoded(view) => Cow::Owned(view.encode()),
        }
    }

    /// Serialized length. Encodes decoded views, so not free.
    pub fn len(&self) -> usize {
        match self {
            Payload::Raw(bytes) => bytes.len(),
            Payload::Decoded(view) => view.encode().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Payload::Decoded(_))
    }

    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Payload::Raw(bytes) => Some(bytes),
            Payload::Decoded(_) => None,
        }
    }

    /// Downcasts a decoded view to its concrete type.
    pub fn view<T: Structured>(&self) -> Option<&T> {
        match self {
            Payload::Decoded(view) => view.as_any().downcast_ref::<T>(),
            Payload::Raw(_) => None,
        }
    }

    pub fn view_mut<T: Structured>(&mut self) -> Option<&mut T> {
        match self {
            Payload::Decoded(view) => view.as_any_mut().downcast_mut::<T>(),
            Payload::Raw(_) => None,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Raw(Vec::new())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Raw(bytes)
    }
}

/// Registry key: the database creator code plus the kind of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderKey {
    pub creator: FourCC,
    pub kind: BlobKind,
}

/// Explicit mapping from [`DecoderKey`] to codec, populated by the caller.
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    codecs: HashMap<DecoderKey, Arc<dyn StructuredCodec>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `codec` for payloads of `kind` in databases created by `creator`.
    ///
    /// Returns the codec previously registered under the same key, if any.
    pub fn register(
        &mut self,
        creator: FourCC,
        kind: BlobKind,
        codec: impl StructuredCodec + 'static,
    ) -> Option<Arc<dyn StructuredCodec>> {
        self.codecs.insert(DecoderKey { creator, kind }, Arc::new(codec))
    }

    /// Looks up a codec. `None` is the normal outcome for most databases.
    pub fn lookup(&self, creator: FourCC, kind: BlobKind) -> Option<&dyn StructuredCodec> {
        self.codecs
            .get(&DecoderKey { creator, kind })
            .map(|codec| &**codec)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Builds the payload for `bytes`: decoded if a codec is registered, raw otherwise.
    ///
    /// `target` names the payload in the error when the codec rejects it.
    pub fn decode(
        &self,
        creator: FourCC,
        kind: BlobKind,
        bytes: Vec<u8>,
        target: impl fmt::Display,
    ) -> Result<Payload> {
        let Some(codec) = self.lookup(creator, kind) else {
            trace!("No {} decoder for creator {}, keeping {} raw", kind, creator, target);
            return Ok(Payload::Raw(bytes));
        };

        let view = codec.decode(&bytes).map_err(|e| PdbError::DecoderParse {
            target: target.to_string(),
            message: e.to_string(),
        })?;
        trace!("Decoded {} with {} decoder for creator {}", target, kind, creator);
        Ok(Payload::Decoded(view))
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.codecs.keys()).finish()
    }
}
