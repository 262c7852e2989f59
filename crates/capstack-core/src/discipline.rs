//! # Discipline Protocol
//!
//! Spending rules applied to individual transactions, and the auto-save
//! split applied to income.

use crate::math::{floor_amount, mul};
use crate::tables::SavingsTables;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Spending caps per period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimits {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
}

/// The rules a user has agreed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisciplineProtocol {
    pub spending_limits: SpendingLimits,
    /// Categories where spending is refused outright.
    pub category_blocks: Vec<String>,
    pub auto_save_percentage: Decimal,
    /// Minimum emergency fund before discretionary spending.
    pub emergency_buffer: Decimal,
    pub reward_system: bool,
}

impl Default for DisciplineProtocol {
    fn default() -> Self {
        Self {
            spending_limits: SpendingLimits {
                daily: dec!(2000),
                weekly: dec!(10000),
                monthly: dec!(35000),
            },
            category_blocks: vec!["entertainment".to_string(), "dining_out".to_string()],
            auto_save_percentage: dec!(0.25),
            emergency_buffer: dec!(200000),
            reward_system: true,
        }
    }
}

impl DisciplineProtocol {
    #[must_use]
    pub fn blocks(&self, category: &str) -> bool {
        self.category_blocks.iter().any(|c| c == category)
    }
}

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A transaction presented for checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Option<u64>,
    pub amount: Decimal,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// Verdict of [`check_spending_limit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Check a transaction against the protocol. Blocked categories win over the
/// daily limit; an amount equal to the limit is allowed.
#[must_use]
pub fn check_spending_limit(tx: &Transaction, protocol: &DisciplineProtocol) -> SpendingCheck {
    if protocol.blocks(&tx.category) {
        return SpendingCheck {
            allowed: false,
            reason: Some(format!(
                "Spending blocked on {} category due to discipline protocol",
                tx.category
            )),
        };
    }
    if tx.amount > protocol.spending_limits.daily {
        return SpendingCheck {
            allowed: false,
            reason: Some(format!(
                "Transaction exceeds daily spending limit of ₹{}",
                protocol.spending_limits.daily.normalize()
            )),
        };
    }
    SpendingCheck {
        allowed: true,
        reason: None,
    }
}

/// Split of an auto-saved amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSave {
    pub saved_amount: Decimal,
    pub locked_amount: Decimal,
    pub available_amount: Decimal,
}

/// Move a share of income into savings, most of it locked. All amounts are
/// floored to whole units; non-positive income saves nothing.
#[must_use]
pub fn auto_save_income(amount: Decimal, tables: &SavingsTables) -> AutoSave {
    let saved = floor_amount(mul(amount, tables.auto_save_rate));
    AutoSave {
        saved_amount: saved,
        locked_amount: floor_amount(mul(saved, tables.locked_share)),
        available_amount: floor_amount(mul(saved, tables.available_share)),
    }
}

/// Result of running a transaction through the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolOutcome {
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub alternative_actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_saved: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Check a transaction and, for income, apply auto-save.
#[must_use]
pub fn enforce_protocol(
    tx: &Transaction,
    protocol: &DisciplineProtocol,
    tables: &SavingsTables,
) -> ProtocolOutcome {
    let check = check_spending_limit(tx, protocol);
    if !check.allowed {
        return ProtocolOutcome {
            blocked: true,
            reason: check.reason,
            alternative_actions: vec![
                "Use available savings instead".to_string(),
                "Wait until next pay cycle".to_string(),
                "Review and adjust spending limits".to_string(),
            ],
            auto_saved: None,
            message: None,
        };
    }

    if tx.kind == TransactionKind::Income {
        let saved = auto_save_income(tx.amount, tables).saved_amount;
        return ProtocolOutcome {
            blocked: false,
            reason: None,
            alternative_actions: Vec::new(),
            auto_saved: Some(saved),
            message: Some(format!(
                "Transaction approved. ₹{} automatically saved.",
                saved.normalize()
            )),
        };
    }

    ProtocolOutcome {
        blocked: false,
        reason: None,
        alternative_actions: Vec::new(),
        auto_saved: None,
        message: Some("Transaction approved".to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
