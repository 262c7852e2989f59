//! # Health Score
//!
//! Six weighted category scores combined into a 0-100 total and a letter
//! grade, with template insights and recommendations.
//!
//! A ratio whose denominator is zero is *degenerate* and scores its category
//! at 0. The same inputs always yield the same result.

use crate::grade::Grade;
use crate::math::{clamp_score, mul, ratio, round_dp, round_whole, sub, sum, to_score};
use crate::profile::FinancialProfile;
use crate::tables::{HealthTables, ScoringTables};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Ratios feeding the health score. `None` marks a degenerate ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInputs {
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    pub savings_rate: Option<Decimal>,
    pub emergency_fund_months: Option<Decimal>,
    pub debt_to_income: Option<Decimal>,
    /// 0-1.
    pub income_stability: Decimal,
    /// 0-1.
    pub investment_diversification: Decimal,
}

impl HealthInputs {
    /// Derive ratios from a profile.
    #[must_use]
    pub fn from_profile(profile: &FinancialProfile, tables: &HealthTables) -> Self {
        let income = profile.monthly_income;
        let expenses = profile.monthly_expenses;
        Self {
            monthly_income: income,
            monthly_expenses: expenses,
            savings_rate: ratio(sub(income, expenses), income),
            emergency_fund_months: ratio(profile.emergency_fund, expenses),
            debt_to_income: ratio(profile.debt_amount, income),
            income_stability: profile.job_stability(),
            investment_diversification: tables.diversification.get(profile.risk_tolerance),
        }
    }

    fn expense_ratio(&self) -> Option<Decimal> {
        ratio(self.monthly_expenses, self.monthly_income)
    }
}

/// Rounded per-category scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCategoryScores {
    pub income_stability: u8,
    pub expense_management: u8,
    pub savings_discipline: u8,
    pub emergency_preparedness: u8,
    pub debt_management: u8,
    pub investment_strategy: u8,
}

/// The health score result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub total_score: u8,
    pub category_scores: HealthCategoryScores,
    pub grade: Grade,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Unrounded category scores, clamped to 0-100.
struct RawScores {
    income_stability: Decimal,
    expense_management: Decimal,
    savings_discipline: Decimal,
    emergency_preparedness: Decimal,
    debt_management: Decimal,
    investment_strategy: Decimal,
}

fn raw_scores(inputs: &HealthInputs, tables: &HealthTables) -> RawScores {
    let hundred = Decimal::ONE_HUNDRED;
    RawScores {
        income_stability: clamp_score(mul(inputs.income_stability, hundred)),
        expense_management: inputs
            .expense_ratio()
            .map(|r| clamp_score(sub(hundred, mul(r, hundred))))
            .unwrap_or(Decimal::ZERO),
        savings_discipline: inputs
            .savings_rate
            .map(|r| clamp_score(mul(r, tables.savings_multiplier)))
            .unwrap_or(Decimal::ZERO),
        emergency_preparedness: inputs
            .emergency_fund_months
            .and_then(|m| ratio(m, tables.emergency_target_months))
            .map(|r| clamp_score(mul(r, hundred)))
            .unwrap_or(Decimal::ZERO),
        debt_management: inputs
            .debt_to_income
            .map(|r| clamp_score(sub(hundred, mul(r, tables.debt_multiplier))))
            .unwrap_or(Decimal::ZERO),
        investment_strategy: clamp_score(mul(inputs.investment_diversification, hundred)),
    }
}

/// Score a set of health inputs.
#[must_use]
pub fn score(inputs: &HealthInputs, tables: &ScoringTables) -> HealthScore {
    let raw = raw_scores(inputs, &tables.health);
    let w = &tables.health.weights;

    let weighted = sum([
        mul(raw.income_stability, w.income_stability),
        mul(raw.expense_management, w.expense_management),
        mul(raw.savings_discipline, w.savings_discipline),
        mul(raw.emergency_preparedness, w.emergency_preparedness),
        mul(raw.debt_management, w.debt_management),
        mul(raw.investment_strategy, w.investment_strategy),
    ]);
    let total_score = to_score(weighted);

    let (insights, recommendations) = narrate(inputs, &raw);

    HealthScore {
        total_score,
        category_scores: HealthCategoryScores {
            income_stability: to_score(raw.income_stability),
            expense_management: to_score(raw.expense_management),
            savings_discipline: to_score(raw.savings_discipline),
            emergency_preparedness: to_score(raw.emergency_preparedness),
            debt_management: to_score(raw.debt_management),
            investment_strategy: to_score(raw.investment_strategy),
        },
        grade: Grade::from_score(total_score, &tables.grades),
        insights,
        recommendations,
    }
}

/// Score a profile.
#[must_use]
pub fn score_profile(profile: &FinancialProfile, tables: &ScoringTables) -> HealthScore {
    score(&HealthInputs::from_profile(profile, &tables.health), tables)
}

fn narrate(inputs: &HealthInputs, raw: &RawScores) -> (Vec<String>, Vec<String>) {
    let mut insights = Vec::new();
    let mut recommendations = Vec::new();

    if raw.income_stability < dec!(70) {
        insights.push(
            "Your income shows some variability that could impact financial stability".to_string(),
        );
        recommendations.push(
            "Consider building multiple income streams or emergency savings to buffer income fluctuations"
                .to_string(),
        );
    } else {
        insights.push(
            "Your income stability provides a solid foundation for financial planning".to_string(),
        );
    }

    match inputs.expense_ratio() {
        Some(r) if r < dec!(0.5) => insights.push(
            "Excellent expense management with significant surplus for savings and investments"
                .to_string(),
        ),
        Some(r) if r <= dec!(0.7) => {}
        _ => {
            insights.push(
                "Your expense ratio is high, leaving limited room for savings and investments"
                    .to_string(),
            );
            recommendations.push(
                "Aim to reduce monthly expenses to below 70% of income for better financial health"
                    .to_string(),
            );
        }
    }

    match inputs.savings_rate {
        Some(rate) if rate >= dec!(0.2) => insights.push(format!(
            "Strong savings discipline with {}% savings rate",
            round_whole(mul(rate, Decimal::ONE_HUNDRED))
        )),
        _ => {
            insights.push(
                "Your savings rate needs improvement to build financial security".to_string(),
            );
            recommendations.push("Target saving at least 20% of your income monthly".to_string());
        }
    }

    match inputs.emergency_fund_months {
        Some(months) if months >= dec!(6) => insights.push(format!(
            "Well-prepared with {} months of emergency coverage",
            round_dp(months, 1).normalize()
        )),
        _ => {
            insights.push("Emergency fund coverage is below recommended 6 months".to_string());
            recommendations.push("Build emergency fund to cover 6-12 months of expenses".to_string());
        }
    }

    match inputs.debt_to_income {
        Some(dti) if dti <= dec!(0.4) => {
            insights.push("Debt levels are well-managed relative to income".to_string());
        }
        _ => {
            insights.push(
                "Debt-to-income ratio is high and may impact financial flexibility".to_string(),
            );
            recommendations.push(
                "Focus on debt reduction strategies and consider debt consolidation".to_string(),
            );
        }
    }

    if raw.investment_strategy < dec!(60) {
        insights
            .push("Investment portfolio could benefit from better diversification".to_string());
        recommendations.push(
            "Consider diversifying investments across different asset classes and risk levels"
                .to_string(),
        );
    } else {
        insights.push(
            "Investment strategy shows good diversification and risk management".to_string(),
        );
    }

    (insights, recommendations)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::RiskTolerance;

    fn pow10(n: u32) -> Decimal {
        Decimal::from_i128_with_scale(10_i128.pow(n), 0)
    }

    fn reference_inputs() -> HealthInputs {
        HealthInputs {
            monthly_income: dec!(75000),
            monthly_expenses: dec!(45000),
            savings_rate: Some(dec!(0.25)),
            emergency_fund_months: Some(dec!(8)),
            debt_to_income: Some(dec!(0.3)),
            income_stability: dec!(0.85),
            investment_diversification: dec!(0.7),
        }
    }

    #[test]
    fn reference_case_is_weighted_sum() {
        let result = score(&reference_inputs(), &ScoringTables::standard());
        // 21.25 + 8 + 20 + 10 + 4 + 7 = 70.25
        assert_eq!(result.total_score, 70);
        assert_eq!(result.grade, Grade::BPlus);
        assert_eq!(result.category_scores.income_stability, 85);
        assert_eq!(result.category_scores.expense_management, 40);
        assert_eq!(result.category_scores.savings_discipline, 100);
        assert_eq!(result.category_scores.emergency_preparedness, 67);
        assert_eq!(result.category_scores.debt_management, 40);
        assert_eq!(result.category_scores.investment_strategy, 70);
    }

    #[test]
    fn reference_case_narrative() {
        let result = score(&reference_inputs(), &ScoringTables::standard());
        assert_eq!(result.insights.len(), 5);
        assert!(result.insights.contains(&"Strong savings discipline with 25% savings rate".to_string()));
        assert!(result.insights.contains(&"Well-prepared with 8 months of emergency coverage".to_string()));
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn expenses_above_income_saturate_at_zero() {
        let mut profile = FinancialProfile::new(dec!(30000), dec!(90000), dec!(0), dec!(0));
        profile.job_stability_score = 2;
        profile.risk_tolerance = RiskTolerance::Low;
        let result = score_profile(&profile, &ScoringTables::standard());

        assert_eq!(result.category_scores.expense_management, 0);
        assert_eq!(result.category_scores.savings_discipline, 0);
        assert_eq!(result.category_scores.emergency_preparedness, 0);
        assert!(result.total_score <= 100);
        assert!(result.recommendations.len() >= 4);
    }

    #[test]
    fn zero_income_scores_worst_case() {
        let profile = FinancialProfile::new(dec!(0), dec!(20000), dec!(50000), dec!(1000));
        let result = score_profile(&profile, &ScoringTables::standard());
        assert_eq!(result.category_scores.expense_management, 0);
        assert_eq!(result.category_scores.savings_discipline, 0);
        assert_eq!(result.category_scores.debt_management, 0);
        assert!(result
            .insights
            .contains(&"Your expense ratio is high, leaving limited room for savings and investments".to_string()));
    }

    #[test]
    fn zero_expenses_marks_emergency_degenerate() {
        let profile = FinancialProfile::new(dec!(50000), dec!(0), dec!(100000), dec!(0));
        let result = score_profile(&profile, &ScoringTables::standard());
        assert_eq!(result.category_scores.expense_management, 100);
        assert_eq!(result.category_scores.emergency_preparedness, 0);
    }

    #[test]
    fn extreme_amounts_saturate() {
        let tiny_income = FinancialProfile::new(dec!(0.01), pow10(26), dec!(0), pow10(26));
        let result = score_profile(&tiny_income, &ScoringTables::standard());
        assert_eq!(result.category_scores.expense_management, 0);
        assert_eq!(result.category_scores.savings_discipline, 0);
        assert_eq!(result.category_scores.debt_management, 0);

        let huge_fund = FinancialProfile::new(dec!(50000), dec!(0.01), pow10(28), dec!(0));
        let result = score_profile(&huge_fund, &ScoringTables::standard());
        assert_eq!(result.category_scores.emergency_preparedness, 100);
        assert!(result.total_score <= 100);
    }

    #[test]
    fn low_stability_triggers_variability_insight() {
        let mut inputs = reference_inputs();
        inputs.income_stability = dec!(0.5);
        inputs.investment_diversification = dec!(0.4);
        let result = score(&inputs, &ScoringTables::standard());
        assert_eq!(
            result.insights[0],
            "Your income shows some variability that could impact financial stability"
        );
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.starts_with("Consider diversifying investments")));
    }
}
