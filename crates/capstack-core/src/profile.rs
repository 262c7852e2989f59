//! # Profile Module
//!
//! The financial profile every calculator consumes, plus the repository seam
//! used to look one up for a user.
//!
//! Fields are not checked for consistency. Calculators accept expenses above
//! income, zero income and zero expenses.

use crate::{CoreError, Result as CoreResult, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Appetite for investment risk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    #[default]
    Medium,
    High,
}

/// Cost-of-living tier of the user's location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    Metro,
    Tier1,
    Tier2,
    Rural,
}

/// Industry of the primary income.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    #[default]
    Technology,
    Finance,
    Healthcare,
    Education,
    Retail,
    Other,
}

/// Broad market regime, used by the allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketConditions {
    Bull,
    Bear,
    #[default]
    Neutral,
}

/// Kind of an income source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeSourceKind {
    Salary,
    Freelance,
    Business,
    Investment,
    Other,
}

/// Payment cadence of an income source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeFrequency {
    Monthly,
    Irregular,
}

/// One stream of monthly income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeSource {
    #[serde(rename = "type")]
    pub kind: IncomeSourceKind,
    pub amount: Decimal,
    pub frequency: IncomeFrequency,
    /// Reliability of the stream, 0-1.
    pub stability: Decimal,
}

impl IncomeSource {
    #[must_use]
    pub fn new(
        kind: IncomeSourceKind,
        amount: Decimal,
        frequency: IncomeFrequency,
        stability: Decimal,
    ) -> Self {
        Self {
            kind,
            amount,
            frequency,
            stability,
        }
    }
}

// =============================================================================
// FINANCIAL PROFILE
// =============================================================================

fn default_age() -> u8 {
    30
}

fn default_experience() -> u8 {
    5
}

/// Largest money amount accepted from clients (10^15).
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Reject a client-supplied amount that is negative or above [`MAX_AMOUNT`].
pub fn check_amount(field: &str, value: Decimal) -> CoreResult<()> {
    if value < Decimal::ZERO {
        return Err(CoreError::InvalidAmount(format!("{field} cannot be negative")));
    }
    if value > MAX_AMOUNT {
        return Err(CoreError::InvalidAmount(format!(
            "{field} cannot exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

fn default_growth() -> Decimal {
    dec!(0.05)
}

/// The inputs to every calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    pub emergency_fund: Decimal,
    pub debt_amount: Decimal,
    /// Self-reported job stability, 0-10.
    pub job_stability_score: u8,
    pub risk_tolerance: RiskTolerance,
    #[serde(default = "default_age")]
    pub age: u8,
    #[serde(default)]
    pub dependents: u8,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub industry: Industry,
    #[serde(default = "default_experience")]
    pub experience_years: u8,
    /// Expected year-over-year income growth, as a fraction.
    #[serde(default = "default_growth")]
    pub growth_rate: Decimal,
    #[serde(default)]
    pub market_conditions: MarketConditions,
    /// Up to twelve recent monthly incomes, oldest first.
    #[serde(default)]
    pub income_history: Vec<Decimal>,
    #[serde(default)]
    pub income_sources: Vec<IncomeSource>,
}

impl FinancialProfile {
    /// A profile holding only the four core amounts; every other field takes
    /// its default.
    #[must_use]
    pub fn new(
        monthly_income: Decimal,
        monthly_expenses: Decimal,
        emergency_fund: Decimal,
        debt_amount: Decimal,
    ) -> Self {
        Self {
            monthly_income,
            monthly_expenses,
            emergency_fund,
            debt_amount,
            job_stability_score: 5,
            risk_tolerance: RiskTolerance::Medium,
            age: default_age(),
            dependents: 0,
            location: Location::default(),
            industry: Industry::default(),
            experience_years: default_experience(),
            growth_rate: default_growth(),
            market_conditions: MarketConditions::default(),
            income_history: Vec::new(),
            income_sources: Vec::new(),
        }
    }

    /// All amounts zero. Starting point for a first profile update.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    /// The representative profile used when a user has none stored.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            job_stability_score: 7,
            dependents: 2,
            growth_rate: dec!(0.08),
            income_history: vec![
                dec!(70000),
                dec!(72000),
                dec!(74000),
                dec!(75000),
                dec!(76000),
                dec!(75000),
                dec!(77000),
                dec!(78000),
                dec!(75000),
                dec!(80000),
                dec!(82000),
                dec!(75000),
            ],
            income_sources: vec![
                IncomeSource::new(
                    IncomeSourceKind::Salary,
                    dec!(65000),
                    IncomeFrequency::Monthly,
                    dec!(0.9),
                ),
                IncomeSource::new(
                    IncomeSourceKind::Freelance,
                    dec!(10000),
                    IncomeFrequency::Irregular,
                    dec!(0.6),
                ),
            ],
            ..Self::new(dec!(75000), dec!(45000), dec!(600000), dec!(22500))
        }
    }

    /// Check every amount against [`check_amount`]. Calculators do not need
    /// this; it guards what gets stored.
    pub fn validate(&self) -> CoreResult<()> {
        check_amount("monthlyIncome", self.monthly_income)?;
        check_amount("monthlyExpenses", self.monthly_expenses)?;
        check_amount("emergencyFund", self.emergency_fund)?;
        check_amount("debtAmount", self.debt_amount)?;
        for amount in &self.income_history {
            check_amount("incomeHistory", *amount)?;
        }
        for source in &self.income_sources {
            check_amount("incomeSources.amount", source.amount)?;
        }
        Ok(())
    }

    /// Job stability on a 0-1 scale.
    #[must_use]
    pub fn job_stability(&self) -> Decimal {
        Decimal::from(self.job_stability_score.min(10)) / Decimal::TEN
    }

    /// The income history, or twelve copies of the current income if none
    /// was recorded.
    #[must_use]
    pub fn effective_income_history(&self) -> Vec<Decimal> {
        if self.income_history.is_empty() {
            vec![self.monthly_income; 12]
        } else {
            self.income_history.clone()
        }
    }

    /// The income sources, or a single salary equal to the current income.
    #[must_use]
    pub fn effective_income_sources(&self) -> Vec<IncomeSource> {
        if self.income_sources.is_empty() {
            vec![IncomeSource::new(
                IncomeSourceKind::Salary,
                self.monthly_income,
                IncomeFrequency::Monthly,
                self.job_stability(),
            )]
        } else {
            self.income_sources.clone()
        }
    }
}

impl Default for FinancialProfile {
    fn default() -> Self {
        Self::fallback()
    }
}

// =============================================================================
// PARTIAL UPDATES
// =============================================================================

/// A partial profile. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub monthly_income: Option<Decimal>,
    pub monthly_expenses: Option<Decimal>,
    pub emergency_fund: Option<Decimal>,
    pub debt_amount: Option<Decimal>,
    pub job_stability_score: Option<u8>,
    pub risk_tolerance: Option<RiskTolerance>,
    pub age: Option<u8>,
    pub dependents: Option<u8>,
    pub location: Option<Location>,
    pub industry: Option<Industry>,
    pub experience_years: Option<u8>,
    pub growth_rate: Option<Decimal>,
    pub market_conditions: Option<MarketConditions>,
    pub income_history: Option<Vec<Decimal>>,
    pub income_sources: Option<Vec<IncomeSource>>,
}

impl ProfileUpdate {
    /// Apply this update on top of `base`.
    #[must_use]
    pub fn apply(self, base: FinancialProfile) -> FinancialProfile {
        FinancialProfile {
            monthly_income: self.monthly_income.unwrap_or(base.monthly_income),
            monthly_expenses: self.monthly_expenses.unwrap_or(base.monthly_expenses),
            emergency_fund: self.emergency_fund.unwrap_or(base.emergency_fund),
            debt_amount: self.debt_amount.unwrap_or(base.debt_amount),
            job_stability_score: self
                .job_stability_score
                .map(|s| s.min(10))
                .unwrap_or(base.job_stability_score),
            risk_tolerance: self.risk_tolerance.unwrap_or(base.risk_tolerance),
            age: self.age.unwrap_or(base.age),
            dependents: self.dependents.unwrap_or(base.dependents),
            location: self.location.unwrap_or(base.location),
            industry: self.industry.unwrap_or(base.industry),
            experience_years: self.experience_years.unwrap_or(base.experience_years),
            growth_rate: self.growth_rate.unwrap_or(base.growth_rate),
            market_conditions: self.market_conditions.unwrap_or(base.market_conditions),
            income_history: self
                .income_history
                .map(|mut h| {
                    let skip = h.len().saturating_sub(12);
                    h.drain(..skip);
                    h
                })
                .unwrap_or(base.income_history),
            income_sources: self.income_sources.unwrap_or(base.income_sources),
        }
    }
}

// =============================================================================
// REPOSITORY SEAM
// =============================================================================

/// Lookup of stored profiles.
pub trait ProfileRepository {
    type Error: fmt::Display;

    /// The stored profile for `user`, if any.
    fn get_profile(&self, user: UserId) -> Result<Option<FinancialProfile>, Self::Error>;
}

/// Profiles kept in memory, for tests and the CLI.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfiles {
    profiles: BTreeMap<UserId, FinancialProfile>,
}

impl InMemoryProfiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub fn insert(&mut self, user: UserId, profile: FinancialProfile) {
        self.profiles.insert(user, profile);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileRepository for InMemoryProfiles {
    type Error = std::convert::Infallible;

    fn get_profile(&self, user: UserId) -> Result<Option<FinancialProfile>, Self::Error> {
        Ok(self.profiles.get(&user).cloned())
    }
}

/// Where a resolved profile came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProfileSource {
    Stored,
    Default { reason: String },
}

/// A profile together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub profile: FinancialProfile,
    pub source: ProfileSource,
}

impl ResolvedProfile {
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self.source, ProfileSource::Default { .. })
    }
}

/// The stored profile for `user`, or the fallback profile when none is
/// stored or the lookup fails. Never an error.
pub fn resolve_profile<R: ProfileRepository + ?Sized>(repo: &R, user: UserId) -> ResolvedProfile {
    match repo.get_profile(user) {
        Ok(Some(profile)) => ResolvedProfile {
            profile,
            source: ProfileSource::Stored,
        },
        Ok(None) => ResolvedProfile {
            profile: FinancialProfile::fallback(),
            source: ProfileSource::Default {
                reason: format!("no profile stored for user {user}"),
            },
        },
        Err(e) => ResolvedProfile {
            profile: FinancialProfile::fallback(),
            source: ProfileSource::Default {
                reason: format!("profile lookup failed: {e}"),
            },
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    struct Broken;

    impl ProfileRepository for Broken {
        type Error = String;

        fn get_profile(&self, _user: UserId) -> Result<Option<FinancialProfile>, Self::Error> {
            Err("disk on fire".to_string())
        }
    }

    #[test]
    fn fallback_matches_representative_values() {
        let p = FinancialProfile::fallback();
        assert_eq!(p.monthly_income, dec!(75000));
        assert_eq!(p.emergency_fund, dec!(600000));
        assert_eq!(p.income_history.len(), 12);
        assert_eq!(p.income_sources.len(), 2);
        assert_eq!(p.job_stability(), dec!(0.7));
    }

    #[test]
    fn validate_bounds_amounts() {
        assert!(FinancialProfile::fallback().validate().is_ok());
        assert!(check_amount("x", MAX_AMOUNT).is_ok());

        let mut p = FinancialProfile::fallback();
        p.debt_amount = dec!(-1);
        assert!(matches!(p.validate(), Err(CoreError::InvalidAmount(m)) if m == "debtAmount cannot be negative"));

        let mut p = FinancialProfile::fallback();
        p.income_history.push(MAX_AMOUNT + Decimal::ONE);
        assert!(matches!(p.validate(), Err(CoreError::InvalidAmount(_))));

        let mut p = FinancialProfile::fallback();
        p.income_sources[0].amount = MAX_AMOUNT * Decimal::TEN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn effective_history_defaults_to_flat_income() {
        let p = FinancialProfile::new(dec!(50000), dec!(30000), dec!(0), dec!(0));
        let history = p.effective_income_history();
        assert_eq!(history.len(), 12);
        assert!(history.iter().all(|v| *v == dec!(50000)));

        let sources = p.effective_income_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].kind, IncomeSourceKind::Salary);
        assert_eq!(sources[0].stability, dec!(0.5));
    }

    #[test]
    fn update_overrides_only_named_fields() {
        let update = ProfileUpdate {
            monthly_expenses: Some(dec!(50000)),
            job_stability_score: Some(42),
            ..ProfileUpdate::default()
        };
        let p = update.apply(FinancialProfile::fallback());
        assert_eq!(p.monthly_expenses, dec!(50000));
        assert_eq!(p.monthly_income, dec!(75000));
        assert_eq!(p.job_stability_score, 10);
    }

    #[test]
    fn update_keeps_last_twelve_history_entries() {
        let update = ProfileUpdate {
            income_history: Some((1..=15).map(Decimal::from).collect()),
            ..ProfileUpdate::default()
        };
        let p = update.apply(FinancialProfile::empty());
        assert_eq!(p.income_history.len(), 12);
        assert_eq!(p.income_history[0], dec!(4));
    }

    #[test]
    fn resolve_prefers_stored_profile() {
        let mut repo = InMemoryProfiles::new();
        let stored = FinancialProfile::new(dec!(1), dec!(2), dec!(3), dec!(4));
        repo.insert(UserId(7), stored.clone());

        let hit = resolve_profile(&repo, UserId(7));
        assert_eq!(hit.source, ProfileSource::Stored);
        assert_eq!(hit.profile, stored);

        let miss = resolve_profile(&repo, UserId(8));
        assert!(miss.is_default());
        assert_eq!(miss.profile, FinancialProfile::fallback());
    }

    #[test]
    fn resolve_survives_repository_errors() {
        let resolved = resolve_profile(&Broken, UserId(1));
        let ProfileSource::Default { reason } = resolved.source else {
            panic!("broken repository returned a stored profile");
        };
        assert!(reason.contains("disk on fire"));
    }

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let json = r#"{
            "monthlyIncome": 60000,
            "monthlyExpenses": 40000,
            "emergencyFund": 100000,
            "debtAmount": 0,
            "jobStabilityScore": 8,
            "riskTolerance": "high"
        }"#;
        let p: FinancialProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.monthly_income, dec!(60000));
        assert_eq!(p.risk_tolerance, RiskTolerance::High);
        assert_eq!(p.age, 30);
        assert_eq!(p.location, Location::Metro);
    }
}
