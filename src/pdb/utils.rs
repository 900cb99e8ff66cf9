//! Low-level byte reading utilities

use std::io::Read;

use encoding_rs::Encoding;

use super::types::error::{PdbError, Result};

/// Read exactly `len` bytes of a named region.
///
/// A short read is reported as [`PdbError::Truncated`] carrying the region
/// name, its absolute offset and how many bytes were actually available.
pub fn read_region<R: Read>(
    reader: &mut R,
    context: &'static str,
    offset: u64,
    len: u64,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len as usize);
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(PdbError::Truncated {
            context,
            offset,
            expected: len,
            found: buf.len() as u64,
        });
    }
    Ok(buf)
}

/// Decode a NUL-padded fixed-width string field.
///
/// Bytes after the first NUL are ignored.
pub fn decode_fixed_str(bytes: &[u8], encoding: &'static Encoding) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, _, _) = encoding.decode(&bytes[..end]);
    text.into_owned()
}

/// Encode a string into a NUL-padded field of exactly `width` bytes.
///
/// Text that fills the whole field is stored without a terminator, matching
/// [`decode_fixed_str`]; longer text is cut at `width` bytes.
pub fn encode_fixed_str(text: &str, width: usize, encoding: &'static Encoding) -> Vec<u8> {
    let (encoded, _, _) = encoding.encode(text);
    let mut field = vec![0u8; width];
    let n = encoded.len().min(width);
    field[..n].copy_from_slice(&encoded[..n]);
    field
}
