//! Persisted record types that only exist at the storage boundary.

use super::persistence::{Record, RecordKind};
use crate::UserId;
use crate::allocation::AssetAllocation;
use crate::emergency::EmergencyFundStatus;
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// Argon2id PHC string (algorithm, parameters, salt and hash).
    pub password_digest: String,
    pub created_at: i64,
}

impl Record for UserRecord {
    const KIND: RecordKind = RecordKind::User;
}

/// Latest asset allocation of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSnapshot {
    pub user_id: UserId,
    pub allocation: AssetAllocation,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for AllocationSnapshot {
    const KIND: RecordKind = RecordKind::Allocation;
}

/// Latest emergency-fund assessment of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencySnapshot {
    pub user_id: UserId,
    pub status: EmergencyFundStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for EmergencySnapshot {
    const KIND: RecordKind = RecordKind::Emergency;
}
