//! # Savings Plans and Locks
//!
//! Bookkeeping for goal-based savings plans, time-locked savings and the
//! aggregate savings status. Timestamps are Unix milliseconds.

use crate::math::{floor_amount, mul, ratio_or_zero, sum};
use crate::profile::MAX_AMOUNT;
use crate::tables::SavingsTables;
use crate::{CoreError, Result, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DAY_MS: i64 = 86_400_000;

// =============================================================================
// PLANS
// =============================================================================

/// A request to open a savings plan. Accepts camelCase or snake_case keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewSavingsPlan {
    pub name: String,
    #[serde(alias = "target_amount")]
    pub target_amount: Decimal,
    #[serde(alias = "current_amount")]
    pub current_amount: Decimal,
    #[serde(alias = "monthly_contribution")]
    pub monthly_contribution: Decimal,
    /// Share to auto-lock, in percent (0-100).
    #[serde(alias = "lock_percentage")]
    pub lock_percentage: Option<Decimal>,
    #[serde(alias = "target_date")]
    pub target_date: Option<String>,
}

/// A stored savings plan. `lock_percentage` is a fraction (0-1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPlan {
    pub id: u64,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub monthly_contribution: Decimal,
    pub lock_percentage: Decimal,
    pub target_date: Option<String>,
    pub created_at: i64,
}

impl SavingsPlan {
    /// Progress toward the target, 0-1.
    #[must_use]
    pub fn progress(&self) -> Decimal {
        ratio_or_zero(self.current_amount, self.target_amount).min(Decimal::ONE)
    }

    /// Whether part of each contribution is auto-locked.
    #[must_use]
    pub fn auto_lock_scheduled(&self) -> bool {
        self.lock_percentage > Decimal::ZERO
    }
}

impl NewSavingsPlan {
    /// Validate the request and build the plan.
    pub fn into_plan(
        self,
        id: u64,
        user_id: UserId,
        created_at: i64,
        tables: &SavingsTables,
    ) -> Result<SavingsPlan> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::InvalidPlan("Plan name is required".to_string()));
        }
        if self.target_amount <= Decimal::ZERO {
            return Err(CoreError::InvalidPlan(
                "Target amount must be greater than 0".to_string(),
            ));
        }
        if self.monthly_contribution < Decimal::ZERO {
            return Err(CoreError::InvalidPlan(
                "Monthly contribution cannot be negative".to_string(),
            ));
        }
        for (field, value) in [
            ("Target amount", self.target_amount),
            ("Current amount", self.current_amount),
            ("Monthly contribution", self.monthly_contribution),
        ] {
            if value > MAX_AMOUNT {
                return Err(CoreError::InvalidPlan(format!(
                    "{field} cannot exceed {MAX_AMOUNT}"
                )));
            }
        }
        let percent = self
            .lock_percentage
            .unwrap_or(tables.default_lock_percentage);
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(CoreError::InvalidPlan(
                "Lock percentage must be between 0 and 100".to_string(),
            ));
        }

        Ok(SavingsPlan {
            id,
            user_id,
            name,
            target_amount: self.target_amount,
            current_amount: self.current_amount.max(Decimal::ZERO),
            monthly_contribution: self.monthly_contribution,
            lock_percentage: percent / Decimal::ONE_HUNDRED,
            target_date: self.target_date,
            created_at,
        })
    }
}

// =============================================================================
// LOCKS
// =============================================================================

/// An amount held back from spending until `unlock_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsLock {
    pub id: u64,
    pub user_id: UserId,
    pub amount: Decimal,
    pub reason: String,
    pub created_at: i64,
    pub unlock_at: i64,
    pub released_at: Option<i64>,
    pub release_reason: Option<String>,
}

impl SavingsLock {
    /// Lock `amount` for the configured number of days.
    pub fn new(
        id: u64,
        user_id: UserId,
        amount: Decimal,
        reason: Option<String>,
        now: i64,
        tables: &SavingsTables,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::InvalidLock(
                "Lock amount must be greater than 0".to_string(),
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(CoreError::InvalidLock(format!(
                "Lock amount cannot exceed {MAX_AMOUNT}"
            )));
        }
        Ok(Self {
            id,
            user_id,
            amount,
            reason: reason.unwrap_or_else(|| "auto_lock".to_string()),
            created_at: now,
            unlock_at: now.saturating_add(i64::from(tables.lock_days).saturating_mul(DAY_MS)),
            released_at: None,
            release_reason: None,
        })
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.released_at.is_none()
    }

    /// Release the lock. Returns the released amount.
    pub fn release(&mut self, reason: Option<String>, now: i64) -> Result<Decimal> {
        if !self.is_active() {
            return Err(CoreError::InvalidLock(format!(
                "lock {} was already released",
                self.id
            )));
        }
        self.released_at = Some(now);
        self.release_reason = Some(reason.unwrap_or_else(|| "goal_achieved".to_string()));
        Ok(self.amount)
    }

    /// Whether releasing at `now` is ahead of the lock period.
    #[must_use]
    pub fn is_early(&self, now: i64) -> bool {
        now < self.unlock_at
    }
}

/// Total of all locks still held.
#[must_use]
pub fn total_locked(locks: &[SavingsLock]) -> Decimal {
    sum(locks.iter().filter(|l| l.is_active()).map(|l| l.amount))
}

// =============================================================================
// STATUS
// =============================================================================

/// Aggregate savings position of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsStatus {
    pub total_saved: Decimal,
    pub locked: Decimal,
    pub available: Decimal,
    pub monthly_auto_save: Decimal,
    pub discipline_score: u8,
    /// Amount held in active locks.
    pub held_in_locks: Decimal,
    pub next_unlock_at: Option<i64>,
    pub plans: Vec<SavingsPlan>,
}

/// Summarize plans and locks. Plans are listed newest first.
#[must_use]
pub fn savings_status(
    mut plans: Vec<SavingsPlan>,
    locks: &[SavingsLock],
    monthly_income: Decimal,
    tables: &SavingsTables,
) -> SavingsStatus {
    plans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let total_saved = sum(plans.iter().map(|p| p.current_amount));
    let locked = floor_amount(mul(total_saved, tables.status_locked_share));

    SavingsStatus {
        total_saved,
        locked,
        available: total_saved - locked,
        monthly_auto_save: floor_amount(mul(monthly_income, tables.auto_save_rate)),
        discipline_score: tables.discipline_score,
        held_in_locks: total_locked(locks),
        next_unlock_at: locks
            .iter()
            .filter(|l| l.is_active())
            .map(|l| l.unlock_at)
            .min(),
        plans,
    }
}

// =============================================================================
// TESTS
// =============================================================================
