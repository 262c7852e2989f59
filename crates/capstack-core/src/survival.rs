//! # Survival Months
//!
//! How long the emergency fund lasts with reduced spending, adjusted for
//! stability, location and dependents, under three planning scenarios and
//! three stress tests.

use crate::math::{add, floor_count, mul, ratio, sub};
use crate::profile::{FinancialProfile, Location};
use crate::tables::{ScoringTables, SurvivalTables};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Inputs to the survival calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalInputs {
    pub emergency_fund: Decimal,
    pub monthly_expenses: Decimal,
    pub monthly_income: Decimal,
    /// 0-1.
    pub income_stability: Decimal,
    /// 0-1.
    pub job_security: Decimal,
    pub has_side_income: bool,
    pub dependents: u8,
    pub location: Location,
}

impl SurvivalInputs {
    #[must_use]
    pub fn from_profile(profile: &FinancialProfile) -> Self {
        let stability = profile.job_stability();
        Self {
            emergency_fund: profile.emergency_fund,
            monthly_expenses: profile.monthly_expenses,
            monthly_income: profile.monthly_income,
            income_stability: stability,
            job_security: stability,
            has_side_income: profile.income_sources.len() > 1,
            dependents: profile.dependents,
            location: profile.location,
        }
    }
}

/// Risk tier derived from conservative months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurvivalRisk {
    Low,
    Medium,
    High,
    Critical,
}

impl SurvivalRisk {
    #[must_use]
    pub fn from_months(months: u64, tables: &SurvivalTables) -> Self {
        if months >= tables.low_risk_months {
            Self::Low
        } else if months >= tables.medium_risk_months {
            Self::Medium
        } else if months >= tables.high_risk_months {
            Self::High
        } else {
            Self::Critical
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Intermediate values of the calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalBreakdown {
    pub emergency_fund: Decimal,
    pub monthly_expenses: Decimal,
    pub adjusted_expenses: Decimal,
    pub conservative_months: u64,
    pub moderate_months: u64,
    pub optimistic_months: u64,
}

/// Months survivable under specific shocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressScenarios {
    pub job_loss: u64,
    pub medical_emergency: u64,
    pub market_crash: u64,
}

/// The survival result. `months` is the moderate scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalEstimate {
    pub months: u64,
    pub breakdown: SurvivalBreakdown,
    pub risk_level: SurvivalRisk,
    pub scenarios: StressScenarios,
    pub recommendations: Vec<String>,
}

/// Planning scenario for [`scenario_months`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Conservative,
    Moderate,
    Optimistic,
}

/// Estimate survival months.
#[must_use]
pub fn estimate(inputs: &SurvivalInputs, tables: &ScoringTables) -> SurvivalEstimate {
    let t = &tables.survival;

    let adjusted_expenses = mul(inputs.monthly_expenses, sub(Decimal::ONE, t.expense_cut));
    let divisor = adjusted_expenses.max(t.min_monthly_expenses);
    let base_months = ratio(inputs.emergency_fund.max(Decimal::ZERO), divisor)
        .unwrap_or(Decimal::ZERO);

    let stability = add(
        mul(inputs.income_stability, t.income_stability_weight),
        mul(inputs.job_security, t.job_security_weight),
    );
    let location = t.location.get(inputs.location);
    let dependents = add(
        Decimal::ONE,
        mul(t.dependent_step, Decimal::from(inputs.dependents)),
    );
    let adjusted = mul(mul(mul(base_months, stability), location), dependents);

    let conservative = floor_count(mul(adjusted, t.scenarios.conservative));
    let moderate = floor_count(mul(adjusted, t.scenarios.moderate));
    let optimistic = floor_count(mul(adjusted, t.scenarios.optimistic));

    let risk_level = SurvivalRisk::from_months(conservative, t);
    let conservative_dec = Decimal::from(conservative);
    let scenarios = StressScenarios {
        job_loss: floor_count(mul(conservative_dec, t.stress.job_loss)),
        medical_emergency: floor_count(mul(conservative_dec, t.stress.medical_emergency)),
        market_crash: floor_count(mul(conservative_dec, t.stress.market_crash)),
    };

    SurvivalEstimate {
        months: moderate,
        breakdown: SurvivalBreakdown {
            emergency_fund: inputs.emergency_fund,
            monthly_expenses: inputs.monthly_expenses,
            adjusted_expenses,
            conservative_months: conservative,
            moderate_months: moderate,
            optimistic_months: optimistic,
        },
        risk_level,
        scenarios,
        recommendations: recommend(inputs, conservative, t),
    }
}

/// Estimate survival months for a profile.
#[must_use]
pub fn estimate_profile(profile: &FinancialProfile, tables: &ScoringTables) -> SurvivalEstimate {
    estimate(&SurvivalInputs::from_profile(profile), tables)
}

/// Unadjusted months for a single scenario. Zero when expenses are not
/// positive.
#[must_use]
pub fn scenario_months(
    emergency_fund: Decimal,
    monthly_expenses: Decimal,
    scenario: Scenario,
    tables: &SurvivalTables,
) -> u64 {
    let multiplier = match scenario {
        Scenario::Conservative => tables.scenarios.conservative,
        Scenario::Moderate => tables.scenarios.moderate,
        Scenario::Optimistic => tables.scenarios.optimistic,
    };
    ratio(emergency_fund, monthly_expenses)
        .map(|base| floor_count(mul(base, multiplier)))
        .unwrap_or(0)
}

fn recommend(inputs: &SurvivalInputs, conservative: u64, t: &SurvivalTables) -> Vec<String> {
    let tier: &[&str] = if conservative < t.high_risk_months {
        &[
            "CRITICAL: Build emergency fund immediately - target 3-6 months of expenses",
            "Reduce discretionary spending by 30-50% temporarily",
            "Consider part-time work or side income sources",
        ]
    } else if conservative < t.medium_risk_months {
        &[
            "HIGH PRIORITY: Increase emergency fund to at least 6 months coverage",
            "Review and optimize monthly expenses",
            "Explore additional income streams for stability",
        ]
    } else if conservative < t.low_risk_months {
        &[
            "MODERATE: Aim for 12 months of emergency coverage",
            "Continue building savings consistently",
            "Consider high-yield savings options for emergency fund",
        ]
    } else {
        &[
            "EXCELLENT: Maintain current emergency preparedness",
            "Consider investing excess emergency funds appropriately",
        ]
    };
    let mut out: Vec<String> = tier.iter().map(|s| (*s).to_string()).collect();

    if inputs.location == Location::Metro && inputs.monthly_expenses > dec!(40000) {
        out.push("Consider relocation to reduce cost of living if feasible".to_string());
    }
    if inputs.dependents > 2 {
        out.push("Review family insurance coverage for comprehensive protection".to_string());
    }
    if inputs.income_stability < dec!(0.7) {
        out.push("Diversify income sources to improve financial stability".to_string());
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> SurvivalInputs {
        SurvivalInputs {
            emergency_fund: dec!(600000),
            monthly_expenses: dec!(45000),
            monthly_income: dec!(75000),
            income_stability: dec!(0.8),
            job_security: dec!(0.7),
            has_side_income: false,
            dependents: 2,
            location: Location::Metro,
        }
    }

    #[test]
    fn representative_case() {
        let result = estimate(&inputs(), &ScoringTables::standard());
        // base = 600000 / 33750 = 17.777..., stability 0.78, metro 1.2, deps 1.2
        // adjusted = 19.968; x0.7 = 13.97, x0.9 = 17.97, x1.1 = 21.96
        assert_eq!(result.breakdown.adjusted_expenses, dec!(33750.00));
        assert_eq!(result.breakdown.conservative_months, 13);
        assert_eq!(result.months, 17);
        assert_eq!(result.breakdown.optimistic_months, 21);
        assert_eq!(result.risk_level, SurvivalRisk::Low);
        assert_eq!(
            result.scenarios,
            StressScenarios {
                job_loss: 10,
                medical_emergency: 7,
                market_crash: 11,
            }
        );
        assert_eq!(result.recommendations[0], "EXCELLENT: Maintain current emergency preparedness");
        assert!(result
            .recommendations
            .contains(&"Consider relocation to reduce cost of living if feasible".to_string()));
    }

    #[test]
    fn zero_fund_is_critical() {
        let mut i = inputs();
        i.emergency_fund = Decimal::ZERO;
        i.income_stability = dec!(0.5);
        let result = estimate(&i, &ScoringTables::standard());
        assert_eq!(result.months, 0);
        assert_eq!(result.risk_level, SurvivalRisk::Critical);
        assert!(result.recommendations[0].starts_with("CRITICAL"));
        assert_eq!(
            result.recommendations.last().map(String::as_str),
            Some("Diversify income sources to improve financial stability")
        );
    }

    #[test]
    fn zero_expenses_do_not_divide_by_zero() {
        let mut i = inputs();
        i.monthly_expenses = Decimal::ZERO;
        let result = estimate(&i, &ScoringTables::standard());
        assert!(result.months > 0);
        assert_eq!(result.risk_level, SurvivalRisk::Low);
    }

    #[test]
    fn huge_fund_saturates_month_counts() {
        let mut profile = FinancialProfile::new(
            dec!(75000),
            Decimal::ZERO,
            Decimal::from_i128_with_scale(7 * 10_i128.pow(28), 0),
            Decimal::ZERO,
        );
        profile.dependents = 5;
        let result = estimate_profile(&profile, &ScoringTables::standard());
        assert_eq!(result.breakdown.optimistic_months, u64::MAX);
        assert_eq!(result.months, u64::MAX);
        assert!(result.breakdown.conservative_months <= result.months);
        assert_eq!(result.risk_level, SurvivalRisk::Low);
    }

    #[test]
    fn risk_tiers_are_inclusive() {
        let t = SurvivalTables::default();
        assert_eq!(SurvivalRisk::from_months(12, &t), SurvivalRisk::Low);
        assert_eq!(SurvivalRisk::from_months(11, &t), SurvivalRisk::Medium);
        assert_eq!(SurvivalRisk::from_months(6, &t), SurvivalRisk::Medium);
        assert_eq!(SurvivalRisk::from_months(3, &t), SurvivalRisk::High);
        assert_eq!(SurvivalRisk::from_months(2, &t), SurvivalRisk::Critical);
    }

    #[test]
    fn scenario_helper() {
        let t = SurvivalTables::default();
        assert_eq!(scenario_months(dec!(100000), dec!(10000), Scenario::Conservative, &t), 7);
        assert_eq!(scenario_months(dec!(100000), dec!(10000), Scenario::Optimistic, &t), 11);
        assert_eq!(scenario_months(dec!(100000), Decimal::ZERO, Scenario::Moderate, &t), 0);
    }

    #[test]
    fn many_dependents_add_insurance_advice() {
        let mut i = inputs();
        i.dependents = 3;
        i.location = Location::Rural;
        let result = estimate(&i, &ScoringTables::standard());
        assert!(result
            .recommendations
            .contains(&"Review family insurance coverage for comprehensive protection".to_string()));
        assert!(!result
            .recommendations
            .iter()
            .any(|r| r.contains("relocation")));
    }
}
