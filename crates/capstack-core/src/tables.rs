//! # Scoring Tables
//!
//! Every weight, threshold and lookup table used by the calculators.
//!
//! Tables are immutable configuration passed into each calculator, so tests
//! can exercise boundary values and deployments can load overrides from JSON.
//! [`ScoringTables::standard`] reproduces the production constants.
//!
//! All structs deserialize with `#[serde(default)]`: a partial JSON document
//! overrides only the fields it names.

use crate::math::{add, sum};
use crate::profile::{Industry, Location, RiskTolerance};
use crate::{CoreError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// =============================================================================
// KEYED LOOKUPS
// =============================================================================

/// One value per risk tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByRisk {
    pub low: Decimal,
    pub medium: Decimal,
    pub high: Decimal,
}

impl ByRisk {
    #[must_use]
    pub fn get(&self, risk: RiskTolerance) -> Decimal {
        match risk {
            RiskTolerance::Low => self.low,
            RiskTolerance::Medium => self.medium,
            RiskTolerance::High => self.high,
        }
    }
}

/// One value per location tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByLocation {
    pub metro: Decimal,
    pub tier1: Decimal,
    pub tier2: Decimal,
    pub rural: Decimal,
}

impl ByLocation {
    #[must_use]
    pub fn get(&self, location: Location) -> Decimal {
        match location {
            Location::Metro => self.metro,
            Location::Tier1 => self.tier1,
            Location::Tier2 => self.tier2,
            Location::Rural => self.rural,
        }
    }
}

/// One value per industry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByIndustry {
    pub technology: Decimal,
    pub finance: Decimal,
    pub healthcare: Decimal,
    pub education: Decimal,
    pub retail: Decimal,
    pub other: Decimal,
}

impl ByIndustry {
    #[must_use]
    pub fn get(&self, industry: Industry) -> Decimal {
        match industry {
            Industry::Technology => self.technology,
            Industry::Finance => self.finance,
            Industry::Healthcare => self.healthcare,
            Industry::Education => self.education,
            Industry::Retail => self.retail,
            Industry::Other => self.other,
        }
    }
}

// =============================================================================
// GRADES
// =============================================================================

/// Lowest score earning each grade. Must be strictly descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradeThresholds {
    pub a_plus: u8,
    pub a: u8,
    pub b_plus: u8,
    pub b: u8,
    pub c_plus: u8,
    pub c: u8,
    pub d: u8,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a_plus: 90,
            a: 80,
            b_plus: 70,
            b: 60,
            c_plus: 50,
            c: 40,
            d: 30,
        }
    }
}

impl GradeThresholds {
    fn is_descending(&self) -> bool {
        let steps = [
            self.a_plus,
            self.a,
            self.b_plus,
            self.b,
            self.c_plus,
            self.c,
            self.d,
        ];
        steps.windows(2).all(|w| w[0] > w[1])
    }
}

// =============================================================================
// HEALTH SCORE
// =============================================================================

/// Category weights for the health score. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthWeights {
    pub income_stability: Decimal,
    pub expense_management: Decimal,
    pub savings_discipline: Decimal,
    pub emergency_preparedness: Decimal,
    pub debt_management: Decimal,
    pub investment_strategy: Decimal,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            income_stability: dec!(0.25),
            expense_management: dec!(0.20),
            savings_discipline: dec!(0.20),
            emergency_preparedness: dec!(0.15),
            debt_management: dec!(0.10),
            investment_strategy: dec!(0.10),
        }
    }
}

impl HealthWeights {
    fn sum(&self) -> Decimal {
        sum([
            self.income_stability,
            self.expense_management,
            self.savings_discipline,
            self.emergency_preparedness,
            self.debt_management,
            self.investment_strategy,
        ])
    }
}

/// Health score constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthTables {
    pub weights: HealthWeights,
    /// Savings rate multiplier (25% savings = 100).
    pub savings_multiplier: Decimal,
    /// Months of coverage scoring 100.
    pub emergency_target_months: Decimal,
    /// Debt-to-income penalty multiplier.
    pub debt_multiplier: Decimal,
    /// Diversification proxy per risk tolerance (0-1).
    pub diversification: ByRisk,
}

impl Default for HealthTables {
    fn default() -> Self {
        Self {
            weights: HealthWeights::default(),
            savings_multiplier: dec!(400),
            emergency_target_months: dec!(12),
            debt_multiplier: dec!(200),
            diversification: ByRisk {
                low: dec!(0.4),
                medium: dec!(0.6),
                high: dec!(0.8),
            },
        }
    }
}

// =============================================================================
// SURVIVAL MONTHS
// =============================================================================

/// Multipliers for the three planning scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioMultipliers {
    pub conservative: Decimal,
    pub moderate: Decimal,
    pub optimistic: Decimal,
}

impl Default for ScenarioMultipliers {
    fn default() -> Self {
        Self {
            conservative: dec!(0.7),
            moderate: dec!(0.9),
            optimistic: dec!(1.1),
        }
    }
}

/// Stress-test fractions of the conservative estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StressMultipliers {
    pub job_loss: Decimal,
    pub medical_emergency: Decimal,
    pub market_crash: Decimal,
}

impl Default for StressMultipliers {
    fn default() -> Self {
        Self {
            job_loss: dec!(0.8),
            medical_emergency: dec!(0.6),
            market_crash: dec!(0.9),
        }
    }
}

/// Survival months constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurvivalTables {
    /// Share of expenses assumed discretionary and cut in an emergency.
    pub expense_cut: Decimal,
    /// Smallest monthly outflow used as a divisor.
    pub min_monthly_expenses: Decimal,
    pub income_stability_weight: Decimal,
    pub job_security_weight: Decimal,
    pub scenarios: ScenarioMultipliers,
    pub location: ByLocation,
    /// Extra burn per dependent.
    pub dependent_step: Decimal,
    pub stress: StressMultipliers,
    /// Conservative months at or above which risk is low.
    pub low_risk_months: u64,
    pub medium_risk_months: u64,
    pub high_risk_months: u64,
}

impl Default for SurvivalTables {
    fn default() -> Self {
        Self {
            expense_cut: dec!(0.25),
            min_monthly_expenses: Decimal::ONE,
            income_stability_weight: dec!(0.8),
            job_security_weight: dec!(0.2),
            scenarios: ScenarioMultipliers::default(),
            location: ByLocation {
                metro: dec!(1.2),
                tier1: dec!(0.8),
                tier2: dec!(1.0),
                rural: dec!(0.8),
            },
            dependent_step: dec!(0.1),
            stress: StressMultipliers::default(),
            low_risk_months: 12,
            medium_risk_months: 6,
            high_risk_months: 3,
        }
    }
}

// =============================================================================
// INCOME SUITABILITY
// =============================================================================

/// Dimension weights for the income score. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeWeights {
    pub stability: Decimal,
    pub growth: Decimal,
    pub diversification: Decimal,
    pub market_alignment: Decimal,
    pub goal_suitability: Decimal,
}

impl Default for IncomeWeights {
    fn default() -> Self {
        Self {
            stability: dec!(0.30),
            growth: dec!(0.25),
            diversification: dec!(0.20),
            market_alignment: dec!(0.15),
            goal_suitability: dec!(0.10),
        }
    }
}

impl IncomeWeights {
    fn sum(&self) -> Decimal {
        sum([
            self.stability,
            self.growth,
            self.diversification,
            self.market_alignment,
            self.goal_suitability,
        ])
    }
}

/// Income suitability constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeTables {
    pub weights: IncomeWeights,
    /// Coefficient-of-variation penalty (CV of 0.1 = -100).
    pub cv_penalty: Decimal,
    pub cv_weight: Decimal,
    pub source_stability_weight: Decimal,
    /// Growth-rate multiplier (10% growth = 100).
    pub growth_multiplier: Decimal,
    pub experience_step: Decimal,
    pub experience_cap: Decimal,
    pub industry_growth: ByIndustry,
    /// Diversification score for exactly one income source.
    pub single_source_score: Decimal,
    pub type_bonus_step: Decimal,
    pub type_bonus_cap: Decimal,
    pub market_location: ByLocation,
    pub industry_baseline: ByIndustry,
    pub experience_bonus_step: Decimal,
    pub experience_bonus_cap: Decimal,
    /// Total score at or above which income risk is low.
    pub low_risk_score: u8,
    pub medium_risk_score: u8,
    pub confidence_floor: Decimal,
    pub confidence_slope: Decimal,
}

impl Default for IncomeTables {
    fn default() -> Self {
        Self {
            weights: IncomeWeights::default(),
            cv_penalty: dec!(1000),
            cv_weight: dec!(0.6),
            source_stability_weight: dec!(0.4),
            growth_multiplier: dec!(1000),
            experience_step: dec!(0.05),
            experience_cap: dec!(1.5),
            industry_growth: ByIndustry {
                technology: dec!(1.2),
                finance: dec!(1.1),
                healthcare: dec!(1.1),
                education: dec!(0.9),
                retail: dec!(0.8),
                other: dec!(1.0),
            },
            single_source_score: dec!(30),
            type_bonus_step: dec!(5),
            type_bonus_cap: dec!(20),
            market_location: ByLocation {
                metro: dec!(1.0),
                tier1: dec!(0.85),
                tier2: dec!(0.7),
                rural: dec!(0.5),
            },
            industry_baseline: ByIndustry {
                technology: dec!(80000),
                finance: dec!(75000),
                healthcare: dec!(70000),
                education: dec!(45000),
                retail: dec!(35000),
                other: dec!(50000),
            },
            experience_bonus_step: dec!(2),
            experience_bonus_cap: dec!(15),
            low_risk_score: 70,
            medium_risk_score: 50,
            confidence_floor: dec!(0.6),
            confidence_slope: dec!(0.5),
        }
    }
}

// =============================================================================
// SAVINGS
// =============================================================================

/// Savings discipline constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavingsTables {
    /// Share of each income transaction moved to savings.
    pub auto_save_rate: Decimal,
    /// Share of the saved amount that is locked.
    pub locked_share: Decimal,
    /// Share of the saved amount left available.
    pub available_share: Decimal,
    /// Share of total plan balances reported as locked.
    pub status_locked_share: Decimal,
    /// Days a savings lock is held.
    pub lock_days: u32,
    /// Lock percentage applied when a plan does not name one (0-100).
    pub default_lock_percentage: Decimal,
    /// Heuristic discipline score reported with the savings status.
    pub discipline_score: u8,
}

impl Default for SavingsTables {
    fn default() -> Self {
        Self {
            auto_save_rate: dec!(0.25),
            locked_share: dec!(0.8),
            available_share: dec!(0.2),
            status_locked_share: dec!(0.7),
            lock_days: 90,
            default_lock_percentage: dec!(80),
            discipline_score: 85,
        }
    }
}

// =============================================================================
// ASSET ALLOCATION
// =============================================================================

/// Starting mix for one risk tolerance, in whole percentage points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseMix {
    pub sip: Decimal,
    pub stocks: Decimal,
    pub bonds: Decimal,
}

/// Asset allocation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllocationTables {
    pub low: BaseMix,
    pub medium: BaseMix,
    pub high: BaseMix,
    /// Lifestyle share before emergency adjustments.
    pub lifestyle: Decimal,
    /// Emergency share before emergency adjustments.
    pub emergency: Decimal,
    /// Below this age, shift points from bonds to stocks.
    pub young_age: u8,
    pub young_shift: Decimal,
    /// Above this age, shift points from stocks to bonds.
    pub senior_age: u8,
    pub senior_shift: Decimal,
    /// Coverage (months) below which the emergency share is raised.
    pub thin_cover_months: Decimal,
    pub thin_cover_boost: Decimal,
    pub critical_cover_months: Decimal,
    pub critical_cover_boost: Decimal,
    /// Debt to annual income above which stocks shift to bonds.
    pub heavy_debt_ratio: Decimal,
    pub debt_shift: Decimal,
    pub market_shift: Decimal,
    /// Expected annual return (%) used for the SIP formula.
    pub sip_expected_return: Decimal,
    /// Risk weight per bucket for the 0-10 investment risk score.
    pub stocks_risk: Decimal,
    pub sip_risk: Decimal,
    pub bonds_risk: Decimal,
}

impl Default for AllocationTables {
    fn default() -> Self {
        Self {
            low: BaseMix {
                sip: dec!(30),
                stocks: dec!(10),
                bonds: dec!(25),
            },
            medium: BaseMix {
                sip: dec!(35),
                stocks: dec!(20),
                bonds: dec!(10),
            },
            high: BaseMix {
                sip: dec!(30),
                stocks: dec!(30),
                bonds: dec!(5),
            },
            lifestyle: dec!(25),
            emergency: dec!(10),
            young_age: 30,
            young_shift: dec!(5),
            senior_age: 50,
            senior_shift: dec!(10),
            thin_cover_months: dec!(6),
            thin_cover_boost: dec!(10),
            critical_cover_months: dec!(3),
            critical_cover_boost: dec!(15),
            heavy_debt_ratio: dec!(0.4),
            debt_shift: dec!(5),
            market_shift: dec!(5),
            sip_expected_return: dec!(12),
            stocks_risk: dec!(1.0),
            sip_risk: dec!(0.6),
            bonds_risk: dec!(0.2),
        }
    }
}

impl AllocationTables {
    #[must_use]
    pub fn base_mix(&self, risk: RiskTolerance) -> &BaseMix {
        match risk {
            RiskTolerance::Low => &self.low,
            RiskTolerance::Medium => &self.medium,
            RiskTolerance::High => &self.high,
        }
    }
}

// =============================================================================
// EMERGENCY FUND
// =============================================================================

/// Emergency fund monitoring constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmergencyTables {
    pub target_months: u32,
    pub excellent_months: Decimal,
    pub good_months: Decimal,
    pub adequate_months: Decimal,
    pub insufficient_months: Decimal,
    /// One-off medical cost, in months of expenses.
    pub medical_cost_months: Decimal,
    /// Portfolio haircut in a market crash.
    pub market_crash_haircut: Decimal,
    /// Income retained in the income-reduction scenario.
    pub reduced_income_share: Decimal,
    /// Months over which a funding gap is closed.
    pub catch_up_months: Decimal,
    /// Largest share of monthly surplus directed to the fund.
    pub max_surplus_share: Decimal,
}

impl Default for EmergencyTables {
    fn default() -> Self {
        Self {
            target_months: 6,
            excellent_months: dec!(12),
            good_months: dec!(6),
            adequate_months: dec!(3),
            insufficient_months: dec!(1),
            medical_cost_months: dec!(3),
            market_crash_haircut: dec!(0.2),
            reduced_income_share: dec!(0.5),
            catch_up_months: dec!(12),
            max_surplus_share: dec!(0.5),
        }
    }
}

// =============================================================================
// SCORING TABLES
// =============================================================================

/// The complete immutable configuration for all calculators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTables {
    pub grades: GradeThresholds,
    pub health: HealthTables,
    pub survival: SurvivalTables,
    pub income: IncomeTables,
    pub savings: SavingsTables,
    pub allocation: AllocationTables,
    pub emergency: EmergencyTables,
}

impl ScoringTables {
    /// The production constants.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
    }

    /// Parse tables from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidTables(e.to_string()))?;
        tables.validate()?;
        Ok(tables)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.health.weights.sum() != Decimal::ONE {
            return Err(CoreError::InvalidTables(format!(
                "health weights sum to {}, expected 1",
                self.health.weights.sum()
            )));
        }
        if self.income.weights.sum() != Decimal::ONE {
            return Err(CoreError::InvalidTables(format!(
                "income weights sum to {}, expected 1",
                self.income.weights.sum()
            )));
        }
        if !self.grades.is_descending() {
            return Err(CoreError::InvalidTables(
                "grade thresholds must be strictly descending".to_string(),
            ));
        }
        let s = &self.survival;
        if !(s.low_risk_months > s.medium_risk_months && s.medium_risk_months > s.high_risk_months)
        {
            return Err(CoreError::InvalidTables(
                "survival risk tiers must be strictly descending".to_string(),
            ));
        }
        if s.min_monthly_expenses <= Decimal::ZERO {
            return Err(CoreError::InvalidTables(
                "minimum monthly expenses must be positive".to_string(),
            ));
        }
        if add(self.savings.locked_share, self.savings.available_share) > Decimal::ONE {
            return Err(CoreError::InvalidTables(
                "locked and available shares exceed the saved amount".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn standard_tables_are_valid() {
        assert!(ScoringTables::standard().validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let tables = ScoringTables::from_json(r#"{"savings":{"disciplineScore":70}}"#).unwrap();
        assert_eq!(tables.savings.discipline_score, 70);
        assert_eq!(tables.health, HealthTables::default());
    }

    #[test]
    fn huge_weights_are_rejected_not_overflowed() {
        let json = r#"{"health":{"weights":{
            "incomeStability": 70000000000000000000000000000,
            "expenseManagement": 70000000000000000000000000000
        }}}"#;
        assert!(matches!(
            ScoringTables::from_json(json),
            Err(CoreError::InvalidTables(_))
        ));
    }
}
