//! Payload codecs that sit outside the container layout: pluggable
//! structured decoders and timestamp conversion.

pub mod registry;
pub mod timestamp;

pub use registry::{DecoderKey, DecoderRegistry, Payload, Structured, StructuredCodec};
