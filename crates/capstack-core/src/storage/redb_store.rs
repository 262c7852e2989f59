//! redb-backed store for users, profiles, snapshots, plans and locks.

use crate::allocation::AssetAllocation;
use crate::emergency::EmergencyFundStatus;
use crate::formats::{AllocationSnapshot, EmergencySnapshot, Record, UserRecord, decode, encode};
use crate::profile::{FinancialProfile, ProfileRepository};
use crate::savings::{NewSavingsPlan, SavingsLock, SavingsPlan, total_locked};
use crate::tables::SavingsTables;
use crate::{CoreError, UserId};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use rust_decimal::Decimal;
use std::path::Path;

const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const USER_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("user_emails");
const PROFILES: TableDefinition<u64, &[u8]> = TableDefinition::new("profiles");
const ALLOCATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("allocations");
const EMERGENCY: TableDefinition<u64, &[u8]> = TableDefinition::new("emergency_fund");
/// Keyed by (user, plan id).
const PLANS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("savings_plans");
/// Keyed by (user, lock id).
const LOCKS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("savings_locks");
/// Monotonic id counters.
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

type ByUser = TableDefinition<'static, u64, &'static [u8]>;
type ByUserAndId = TableDefinition<'static, (u64, u64), &'static [u8]>;

/// Errors raised by [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("{0} not found")]
    NotFound(String),
}

/// Row counts, for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub users: usize,
    pub profiles: usize,
    pub plans: usize,
    pub locks: usize,
}

/// The embedded database.
pub struct Store {
    db: Database,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn next_id(txn: &WriteTransaction, counter: &str) -> Result<u64, StoreError> {
    let mut meta = txn.open_table(META)?;
    let current = meta.get(counter)?.map(|g| g.value()).unwrap_or(0);
    let next = current.saturating_add(1);
    meta.insert(counter, next)?;
    Ok(next)
}

impl Store {
    /// Open or create the database at `path`, creating all tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        {
            txn.open_table(USERS)?;
            txn.open_table(USER_EMAILS)?;
            txn.open_table(PROFILES)?;
            txn.open_table(ALLOCATIONS)?;
            txn.open_table(EMERGENCY)?;
            txn.open_table(PLANS)?;
            txn.open_table(LOCKS)?;
            txn.open_table(META)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    // -------------------------------------------------------------------------
    // generic helpers
    // -------------------------------------------------------------------------

    fn read_one<R: Record>(&self, table: ByUser, key: u64) -> Result<Option<R>, StoreError> {
        let txn = self.db.begin_read()?;
        let t = txn.open_table(table)?;
        let found = match t.get(key)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(found)
    }

    fn write_one<R: Record>(&self, table: ByUser, key: u64, record: &R) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        let txn = self.db.begin_write()?;
        {
            let mut t = txn.open_table(table)?;
            t.insert(key, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Read the current record (if any) and write its replacement inside one
    /// write transaction.
    fn upsert_one<R: Record>(
        &self,
        table: ByUser,
        key: u64,
        build: impl FnOnce(Option<R>) -> R,
    ) -> Result<R, StoreError> {
        let txn = self.db.begin_write()?;
        let record = {
            let mut t = txn.open_table(table)?;
            let existing: Option<R> = match t.get(key)? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            let record = build(existing);
            let bytes = encode(&record)?;
            t.insert(key, bytes.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    fn read_user_range<R: Record>(&self, table: ByUserAndId, user: UserId) -> Result<Vec<R>, StoreError> {
        let txn = self.db.begin_read()?;
        let t = txn.open_table(table)?;
        let mut out = Vec::new();
        for entry in t.range((user.0, 0)..=(user.0, u64::MAX))? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    fn count(&self, name: &str) -> Result<usize, StoreError> {
        let txn = self.db.begin_read()?;
        let n = match name {
            "users" => txn.open_table(USERS)?.iter()?.count(),
            "profiles" => txn.open_table(PROFILES)?.iter()?.count(),
            "plans" => txn.open_table(PLANS)?.iter()?.count(),
            _ => txn.open_table(LOCKS)?.iter()?.count(),
        };
        Ok(n)
    }

    /// Row counts of the main tables.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            users: self.count("users")?,
            profiles: self.count("profiles")?,
            plans: self.count("plans")?,
            locks: self.count("locks")?,
        })
    }

    // -------------------------------------------------------------------------
    // users
    // -------------------------------------------------------------------------

    /// Register a user. Emails are unique, compared case-insensitively.
    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        password_digest: &str,
        now: i64,
    ) -> Result<UserRecord, StoreError> {
        let email = normalize_email(email);
        let txn = self.db.begin_write()?;
        let record = {
            let mut emails = txn.open_table(USER_EMAILS)?;
            if emails.get(email.as_str())?.is_some() {
                return Err(StoreError::DuplicateEmail(email));
            }
            let id = next_id(&txn, "user")?;
            let record = UserRecord {
                id: UserId(id),
                email: email.clone(),
                name: name.trim().to_string(),
                password_digest: password_digest.to_string(),
                created_at: now,
            };
            let bytes = encode(&record)?;
            emails.insert(email.as_str(), id)?;
            txn.open_table(USERS)?.insert(id, bytes.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    /// Look up a user by email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let email = normalize_email(email);
        let id = {
            let txn = self.db.begin_read()?;
            let emails = txn.open_table(USER_EMAILS)?;
            emails.get(email.as_str())?.map(|g| g.value())
        };
        match id {
            Some(id) => self.load_user(UserId(id)),
            None => Ok(None),
        }
    }

    pub fn load_user(&self, user: UserId) -> Result<Option<UserRecord>, StoreError> {
        self.read_one(USERS, user.0)
    }

    // -------------------------------------------------------------------------
    // profiles and snapshots
    // -------------------------------------------------------------------------

    pub fn put_profile(&self, user: UserId, profile: &FinancialProfile) -> Result<(), StoreError> {
        self.write_one(PROFILES, user.0, profile)
    }

    pub fn load_profile(&self, user: UserId) -> Result<Option<FinancialProfile>, StoreError> {
        self.read_one(PROFILES, user.0)
    }

    /// Upsert the user's allocation. The first `created_at` is kept.
    pub fn save_allocation(
        &self,
        user: UserId,
        allocation: AssetAllocation,
        now: i64,
    ) -> Result<AllocationSnapshot, StoreError> {
        self.upsert_one(ALLOCATIONS, user.0, |existing: Option<AllocationSnapshot>| {
            AllocationSnapshot {
                user_id: user,
                allocation,
                created_at: existing.map_or(now, |s| s.created_at),
                updated_at: now,
            }
        })
    }

    pub fn load_allocation(&self, user: UserId) -> Result<Option<AllocationSnapshot>, StoreError> {
        self.read_one(ALLOCATIONS, user.0)
    }

    /// Upsert the user's emergency-fund assessment. The first `created_at`
    /// is kept.
    pub fn save_emergency(
        &self,
        user: UserId,
        status: EmergencyFundStatus,
        now: i64,
    ) -> Result<EmergencySnapshot, StoreError> {
        self.upsert_one(EMERGENCY, user.0, |existing: Option<EmergencySnapshot>| {
            EmergencySnapshot {
                user_id: user,
                status,
                created_at: existing.map_or(now, |s| s.created_at),
                updated_at: now,
            }
        })
    }

    pub fn load_emergency(&self, user: UserId) -> Result<Option<EmergencySnapshot>, StoreError> {
        self.read_one(EMERGENCY, user.0)
    }

    // -------------------------------------------------------------------------
    // savings plans and locks
    // -------------------------------------------------------------------------

    /// Validate and store a new plan. A rejected plan consumes no id.
    pub fn create_plan(
        &self,
        user: UserId,
        request: NewSavingsPlan,
        now: i64,
        tables: &SavingsTables,
    ) -> Result<SavingsPlan, StoreError> {
        let txn = self.db.begin_write()?;
        let plan = {
            let id = next_id(&txn, "plan")?;
            let plan = request.into_plan(id, user, now, tables)?;
            let bytes = encode(&plan)?;
            txn.open_table(PLANS)?.insert((user.0, id), bytes.as_slice())?;
            plan
        };
        txn.commit()?;
        Ok(plan)
    }

    pub fn list_plans(&self, user: UserId) -> Result<Vec<SavingsPlan>, StoreError> {
        self.read_user_range(PLANS, user)
    }

    pub fn create_lock(
        &self,
        user: UserId,
        amount: Decimal,
        reason: Option<String>,
        now: i64,
        tables: &SavingsTables,
    ) -> Result<SavingsLock, StoreError> {
        let txn = self.db.begin_write()?;
        let lock = {
            let id = next_id(&txn, "lock")?;
            let lock = SavingsLock::new(id, user, amount, reason, now, tables)?;
            let bytes = encode(&lock)?;
            txn.open_table(LOCKS)?.insert((user.0, id), bytes.as_slice())?;
            lock
        };
        txn.commit()?;
        Ok(lock)
    }

    pub fn list_locks(&self, user: UserId) -> Result<Vec<SavingsLock>, StoreError> {
        self.read_user_range(LOCKS, user)
    }

    /// Release one of the user's locks. Returns the released lock and the
    /// total still locked afterwards.
    pub fn release_lock(
        &self,
        user: UserId,
        lock_id: u64,
        reason: Option<String>,
        now: i64,
    ) -> Result<(SavingsLock, Decimal), StoreError> {
        let txn = self.db.begin_write()?;
        let released = {
            let mut locks = txn.open_table(LOCKS)?;
            let existing: Option<SavingsLock> = match locks.get((user.0, lock_id))? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            let mut lock =
                existing.ok_or_else(|| StoreError::NotFound(format!("lock {lock_id}")))?;
            lock.release(reason, now)?;
            let bytes = encode(&lock)?;
            locks.insert((user.0, lock_id), bytes.as_slice())?;
            lock
        };
        txn.commit()?;

        let remaining = total_locked(&self.list_locks(user)?);
        Ok((released, remaining))
    }
}

impl ProfileRepository for Store {
    type Error = StoreError;

    fn get_profile(&self, user: UserId) -> Result<Option<FinancialProfile>, Self::Error> {
        self.load_profile(user)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use crate::emergency;
    use crate::profile::{ProfileSource, resolve_profile};
    use crate::tables::{EmergencyTables, ScoringTables};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("capstack.redb")).unwrap();
        (dir, store)
    }

    #[test]
    fn users_are_unique_by_email() {
        let (_dir, store) = open_temp();
        let alice = store.create_user("Alice@Example.com ", "Alice", "digest", 1);
        assert!(alice.is_ok());
        let again = store.create_user("alice@example.com", "Other", "digest", 2);
        assert!(matches!(again, Err(StoreError::DuplicateEmail(_))));

        let found = store.find_user_by_email("ALICE@example.com").ok().flatten();
        assert_eq!(found.map(|u| u.name), Some("Alice".to_string()));
    }

    #[test]
    fn profile_repository_round_trip() {
        let (_dir, store) = open_temp();
        let user = UserId(5);
        assert!(resolve_profile(&store, user).is_default());

        let profile = FinancialProfile::new(dec!(50000), dec!(30000), dec!(90000), dec!(0));
        assert!(store.put_profile(user, &profile).is_ok());
        let resolved = resolve_profile(&store, user);
        assert_eq!(resolved.source, ProfileSource::Stored);
        assert_eq!(resolved.profile, profile);
    }

    #[test]
    fn snapshot_upsert_keeps_created_at() {
        let (_dir, store) = open_temp();
        let user = UserId(1);
        let tables = ScoringTables::standard();
        let allocation = allocate(&FinancialProfile::fallback(), &tables);

        let first = store.save_allocation(user, allocation.clone(), 100).ok();
        let second = store.save_allocation(user, allocation, 200).ok();
        assert_eq!(first.map(|s| s.created_at), Some(100));
        assert_eq!(second.as_ref().map(|s| s.created_at), Some(100));
        assert_eq!(second.map(|s| s.updated_at), Some(200));

        let status = emergency::status(dec!(30000), dec!(10000), &tables.emergency);
        let snap = store.save_emergency(user, status.clone(), 300).ok();
        assert_eq!(snap.map(|s| s.status), Some(status));
    }

    #[test]
    fn concurrent_upserts_agree_on_created_at() {
        let (_dir, store) = open_temp();
        let user = UserId(8);
        let status = emergency::status(dec!(30000), dec!(10000), &EmergencyTables::default());

        let created: Vec<i64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=8_i64)
                .map(|now| {
                    let store = &store;
                    let status = status.clone();
                    scope.spawn(move || store.save_emergency(user, status, now).unwrap().created_at)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let stored = store.load_emergency(user).unwrap().unwrap();
        assert!(created.iter().all(|c| *c == stored.created_at));
    }

    #[test]
    fn plans_are_scoped_per_user() {
        let (_dir, store) = open_temp();
        let t = SavingsTables::default();
        let request = NewSavingsPlan {
            name: "Bike".to_string(),
            target_amount: dec!(80000),
            ..NewSavingsPlan::default()
        };
        assert!(store.create_plan(UserId(1), request.clone(), 10, &t).is_ok());
        assert!(store.create_plan(UserId(2), request.clone(), 11, &t).is_ok());

        let bad = NewSavingsPlan {
            target_amount: Decimal::ZERO,
            ..request
        };
        assert!(matches!(
            store.create_plan(UserId(1), bad, 12, &t),
            Err(StoreError::Core(CoreError::InvalidPlan(_)))
        ));

        let plans = store.list_plans(UserId(1)).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, 1);
        assert_eq!(store.list_plans(UserId(2)).unwrap()[0].id, 2);
    }

    #[test]
    fn locks_release_and_report_remaining() {
        let (_dir, store) = open_temp();
        let t = SavingsTables::default();
        let user = UserId(3);
        let a = store.create_lock(user, dec!(5000), None, 0, &t).ok();
        let b = store.create_lock(user, dec!(15000), Some("goal".to_string()), 0, &t).ok();
        let a_id = a.map(|l| l.id).unwrap();
        assert!(b.is_some());

        let released = store.release_lock(user, a_id, None, 50);
        let (lock, remaining) = released.unwrap();
        assert_eq!(lock.amount, dec!(5000));
        assert_eq!(remaining, dec!(15000));

        assert!(store.release_lock(user, a_id, None, 60).is_err());
        assert!(matches!(
            store.release_lock(user, 999, None, 60),
            Err(StoreError::NotFound(_))
        ));

        let stats = store.stats().unwrap();
        assert_eq!(stats.locks, 2);
    }
}
