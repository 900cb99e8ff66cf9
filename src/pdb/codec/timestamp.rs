//! Conversion between Palm timestamps and calendar time.
//!
//! Palm OS stores times as unsigned 32-bit seconds since
//! 1904-01-01T00:00:00Z. A stored value of `0` means "never set".

use chrono::{DateTime, TimeZone, Utc};

use crate::pdb::types::error::{PdbError, Result};

/// Seconds between the Palm epoch (1904-01-01) and the Unix epoch (1970-01-01).
pub const PALM_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Converts a stored Palm timestamp into UTC calendar time.
///
/// Returns `None` for `0`, the value Palm OS uses for an unset time.
pub fn from_palm(seconds: u32) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    Utc.timestamp_opt(seconds as i64 - PALM_EPOCH_OFFSET, 0).single()
}

/// Converts UTC calendar time into a Palm timestamp.
///
/// # Errors
/// [`PdbError::TimestampOutOfRange`] if `time` is before 1904 or after 2040-02-06.
pub fn to_palm(time: DateTime<Utc>) -> Result<u32> {
    let unix = time.timestamp();
    u32::try_from(unix + PALM_EPOCH_OFFSET).map_err(|_| PdbError::TimestampOutOfRange(unix))
}
