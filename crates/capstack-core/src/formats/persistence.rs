//! Header-framed postcard codec.
//!
//! Layout of every encoded record:
//!
//! ```text
//! +-------+---------+------+------------------+
//! | magic | version | kind | postcard payload |
//! | 4 B   | u16 LE  | u16  | ...              |
//! +-------+---------+------+------------------+
//! ```

use crate::{CoreError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Leading bytes of every record.
pub const MAGIC: [u8; 4] = *b"CSTK";

/// Current on-disk format version.
pub const FORMAT_VERSION: u16 = 1;

/// Size of the header in bytes.
pub const HEADER_LEN: usize = 8;

/// Discriminates record payloads so one table cannot decode another's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum RecordKind {
    Profile = 1,
    User = 2,
    Allocation = 3,
    Emergency = 4,
    Plan = 5,
    Lock = 6,
}

impl RecordKind {
    fn from_u16(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Self::Profile),
            2 => Some(Self::User),
            3 => Some(Self::Allocation),
            4 => Some(Self::Emergency),
            5 => Some(Self::Plan),
            6 => Some(Self::Lock),
            _ => None,
        }
    }
}

/// A value that can be persisted.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;
}

impl Record for crate::profile::FinancialProfile {
    const KIND: RecordKind = RecordKind::Profile;
}

impl Record for crate::savings::SavingsPlan {
    const KIND: RecordKind = RecordKind::Plan;
}

impl Record for crate::savings::SavingsLock {
    const KIND: RecordKind = RecordKind::Lock;
}

fn header(kind: RecordKind) -> [u8; HEADER_LEN] {
    let mut h = [0u8; HEADER_LEN];
    h[..4].copy_from_slice(&MAGIC);
    h[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    h[6..8].copy_from_slice(&(kind as u16).to_le_bytes());
    h
}

/// Encode a record behind its header.
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>> {
    let mut out = header(R::KIND).to_vec();
    let payload = postcard::to_allocvec(record)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Check the header and decode the payload.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R> {
    let Some((head, payload)) = bytes.split_first_chunk::<HEADER_LEN>() else {
        return Err(CoreError::Header(format!(
            "record is {} bytes, shorter than the {HEADER_LEN}-byte header",
            bytes.len()
        )));
    };
    if head[..4] != MAGIC {
        return Err(CoreError::Header("bad magic".to_string()));
    }
    let version = u16::from_le_bytes([head[4], head[5]]);
    if version != FORMAT_VERSION {
        return Err(CoreError::Header(format!(
            "unsupported format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    let raw_kind = u16::from_le_bytes([head[6], head[7]]);
    match RecordKind::from_u16(raw_kind) {
        Some(kind) if kind == R::KIND => {}
        Some(kind) => {
            return Err(CoreError::Header(format!(
                "expected {:?} record, found {kind:?}",
                R::KIND
            )));
        }
        None => {
            return Err(CoreError::Header(format!("unknown record kind {raw_kind}")));
        }
    }
    Ok(postcard::from_bytes(payload)?)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::profile::FinancialProfile;
    use crate::savings::SavingsLock;
    use crate::tables::SavingsTables;
    use crate::UserId;
    use rust_decimal_macros::dec;

    #[test]
    fn profile_survives_encoding() {
        let profile = FinancialProfile::fallback();
        let bytes = encode(&profile).unwrap();
        assert_eq!(&bytes[..4], b"CSTK");
        let back: Result<FinancialProfile> = decode(&bytes);
        assert_eq!(back.ok(), Some(profile));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let lock = SavingsLock::new(1, UserId(1), dec!(10), None, 0, &SavingsTables::default())
            .unwrap();
        let bytes = encode(&lock).unwrap();
        let wrong: Result<FinancialProfile> = decode(&bytes);
        assert!(matches!(wrong, Err(CoreError::Header(_))));
    }

    #[test]
    fn truncated_and_foreign_bytes_are_rejected() {
        let short: Result<FinancialProfile> = decode(b"CST");
        assert!(matches!(short, Err(CoreError::Header(_))));

        let foreign: Result<FinancialProfile> = decode(b"ABCD\x01\x00\x01\x00rest");
        assert!(matches!(foreign, Err(CoreError::Header(m)) if m == "bad magic"));

        let mut future = encode(&FinancialProfile::empty()).unwrap();
        future[4] = 9;
        let newer: Result<FinancialProfile> = decode(&future);
        assert!(matches!(newer, Err(CoreError::Header(_))));
    }
}
