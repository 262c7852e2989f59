//! # Capstack Core
//!
//! The deterministic scoring engine behind Capstack.
//!
//! Every calculator in this crate is a pure function from a small
//! [`FinancialProfile`] (plus immutable [`ScoringTables`]) to a result record:
//!
//! - [`health`]: six weighted category scores and a letter grade
//! - [`survival`]: months of solvency under stress scenarios
//! - [`income`]: income quality across five weighted dimensions
//! - [`allocation`]: asset-allocation percentages and planning formulas
//! - [`emergency`]: emergency-fund coverage, simulations and depletion risk
//! - [`discipline`] / [`savings`]: spending rules, auto-save and plan bookkeeping
//! - [`insights`]: alerts and insights aggregated from all of the above
//!
//! ## Design Principles
//!
//! - Money is `rust_decimal::Decimal`; no floating-point arithmetic.
//! - `BTreeMap` only, for deterministic ordering.
//! - Calculators are total: zero or negative denominators are clamped
//!   before division, arithmetic on amounts saturates instead of
//!   overflowing, and scores saturate to `0..=100`.
//! - No clock and no I/O in the calculators. Timestamps are integer
//!   milliseconds supplied by the caller.
//!
//! Persistence ([`storage`]) and the snapshot wire format ([`formats`]) live
//! here as well so the app layer stays a thin HTTP/CLI facade.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod allocation;
pub mod discipline;
pub mod emergency;
pub mod formats;
pub mod grade;
pub mod health;
pub mod income;
pub mod insights;
pub mod profile;
pub mod savings;
pub mod storage;
pub mod survival;
pub mod tables;

mod math;

pub use grade::Grade;
pub use profile::{
    FinancialProfile, InMemoryProfiles, IncomeFrequency, IncomeSource, IncomeSourceKind,
    Industry, Location, MAX_AMOUNT, MarketConditions, ProfileRepository, ProfileSource,
    ProfileUpdate, ResolvedProfile, RiskTolerance, check_amount, resolve_profile,
};
pub use rust_decimal::Decimal;
pub use tables::ScoringTables;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of an account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by the core crate.
///
/// Calculators never return errors; these cover configuration, input
/// validation for persisted records, and the snapshot codec.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Scoring tables failed validation.
    #[error("invalid scoring tables: {0}")]
    InvalidTables(String),

    /// A savings plan request failed validation.
    #[error("invalid savings plan: {0}")]
    InvalidPlan(String),

    /// A client-supplied asset allocation is inconsistent.
    #[error("invalid asset allocation: {0}")]
    InvalidAllocation(String),

    /// A client-supplied amount is negative or too large.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A savings lock could not be created or released.
    #[error("invalid savings lock: {0}")]
    InvalidLock(String),

    /// postcard encoding or decoding failed.
    #[error("snapshot codec error: {0}")]
    Codec(#[from] postcard::Error),

    /// Snapshot bytes did not carry the expected header.
    #[error("invalid snapshot header: {0}")]
    Header(String),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
