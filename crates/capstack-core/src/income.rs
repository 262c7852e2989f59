//! # Income Suitability
//!
//! Scores the quality of a user's income across five weighted dimensions:
//! stability, growth, diversification, market alignment and goal
//! suitability. Also projects income forward and exposes the older
//! variance/prediction views built on the same numbers.

use crate::grade::Grade;
use crate::math::{
    add, clamp_score, mul, ratio, ratio_or_zero, round_dp, round_whole, sub, sum, to_score,
};
use crate::profile::{FinancialProfile, IncomeSource, IncomeSourceKind};
use crate::tables::{IncomeTables, ScoringTables};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rounded per-dimension scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeCategoryScores {
    pub stability: u8,
    pub growth: u8,
    pub diversification: u8,
    pub market_alignment: u8,
    pub goal_suitability: u8,
}

/// Income risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeRisk {
    Low,
    Medium,
    High,
}

/// Forward income projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeProjections {
    pub next_year: Decimal,
    pub five_year: Decimal,
    pub confidence: Decimal,
}

/// The income suitability result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeScore {
    pub total_score: u8,
    pub category_scores: IncomeCategoryScores,
    pub grade: Grade,
    pub risk_level: IncomeRisk,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub projections: IncomeProjections,
}

/// Stability expressed as a 0-1 fraction and its complement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeVariance {
    pub stability: Decimal,
    pub predicted_variance: Decimal,
}

/// Expected income for the coming month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomePrediction {
    pub next_month: Decimal,
    pub confidence: Decimal,
}

/// Unrounded dimension scores.
#[derive(Debug, Clone, Copy)]
struct RawScores {
    stability: Decimal,
    growth: Decimal,
    diversification: Decimal,
    market_alignment: Decimal,
    goal_suitability: Decimal,
}

/// Score the income side of a profile.
#[must_use]
pub fn score(profile: &FinancialProfile, tables: &ScoringTables) -> IncomeScore {
    let t = &tables.income;
    let history = profile.effective_income_history();
    let sources = profile.effective_income_sources();

    let raw = RawScores {
        stability: stability_score(profile.monthly_income, &history, &sources, t),
        growth: growth_score(profile, t),
        diversification: diversification_score(&sources, t),
        market_alignment: market_alignment_score(profile, t),
        goal_suitability: goal_suitability_score(profile.monthly_income),
    };

    let w = &t.weights;
    let total_score = to_score(sum([
        mul(raw.stability, w.stability),
        mul(raw.growth, w.growth),
        mul(raw.diversification, w.diversification),
        mul(raw.market_alignment, w.market_alignment),
        mul(raw.goal_suitability, w.goal_suitability),
    ]));

    let risk_level = if total_score >= t.low_risk_score {
        IncomeRisk::Low
    } else if total_score >= t.medium_risk_score {
        IncomeRisk::Medium
    } else {
        IncomeRisk::High
    };

    let (insights, recommendations) = narrate(profile, &raw);

    IncomeScore {
        total_score,
        category_scores: IncomeCategoryScores {
            stability: to_score(raw.stability),
            growth: to_score(raw.growth),
            diversification: to_score(raw.diversification),
            market_alignment: to_score(raw.market_alignment),
            goal_suitability: to_score(raw.goal_suitability),
        },
        grade: Grade::from_score(total_score, &tables.grades),
        risk_level,
        insights,
        recommendations,
        projections: project(profile, t),
    }
}

/// Stability as a fraction, from a computed score.
#[must_use]
pub fn variance_view(result: &IncomeScore) -> IncomeVariance {
    let stability = Decimal::from(result.category_scores.stability) / Decimal::ONE_HUNDRED;
    IncomeVariance {
        stability,
        predicted_variance: Decimal::ONE - stability,
    }
}

/// Next month's expected income, from a computed score.
#[must_use]
pub fn next_month_prediction(result: &IncomeScore) -> IncomePrediction {
    IncomePrediction {
        next_month: round_dp(result.projections.next_year / dec!(12), 2),
        confidence: result.projections.confidence,
    }
}

// =============================================================================
// DIMENSIONS
// =============================================================================

fn stability_score(
    income: Decimal,
    history: &[Decimal],
    sources: &[IncomeSource],
    t: &IncomeTables,
) -> Decimal {
    let cv_score = coefficient_of_variation(history)
        .map(|cv| sub(Decimal::ONE_HUNDRED, mul(cv, t.cv_penalty)).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO);

    let weighted = sum(
        sources
            .iter()
            .map(|s| mul(s.stability, ratio_or_zero(s.amount, income))),
    );

    clamp_score(add(
        mul(cv_score, t.cv_weight),
        mul(mul(weighted, Decimal::ONE_HUNDRED), t.source_stability_weight),
    ))
}

/// Population standard deviation over mean. `None` for an empty history or
/// a non-positive mean.
///
/// Deviations are taken relative to the mean, so the result does not depend
/// on the magnitude of the amounts.
fn coefficient_of_variation(history: &[Decimal]) -> Option<Decimal> {
    let n = Decimal::from(history.len());
    let mean = ratio(sum(history.iter().copied()), n)?;
    if mean <= Decimal::ZERO {
        return None;
    }
    let squares = sum(history.iter().map(|x| {
        let d = sub(ratio_or_zero(*x, mean), Decimal::ONE);
        mul(d, d)
    }));
    ratio(squares, n)?.sqrt()
}

fn growth_score(profile: &FinancialProfile, t: &IncomeTables) -> Decimal {
    let base = clamp_score(mul(profile.growth_rate, t.growth_multiplier));
    let experience = add(
        Decimal::ONE,
        mul(t.experience_step, Decimal::from(profile.experience_years)),
    )
    .min(t.experience_cap);
    let industry = t.industry_growth.get(profile.industry);
    mul(mul(base, experience), industry).min(Decimal::ONE_HUNDRED)
}

fn diversification_score(sources: &[IncomeSource], t: &IncomeTables) -> Decimal {
    if sources.len() == 1 {
        return t.single_source_score;
    }
    let total = sum(sources.iter().map(|s| s.amount));
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let hhi = sum(sources.iter().map(|s| {
        let share = ratio_or_zero(s.amount, total);
        mul(share, share)
    }));
    let concentration =
        sub(Decimal::ONE_HUNDRED, mul(hhi, Decimal::ONE_HUNDRED)).max(Decimal::ZERO);

    let kinds: BTreeSet<IncomeSourceKind> = sources.iter().map(|s| s.kind).collect();
    let bonus = mul(t.type_bonus_step, Decimal::from(kinds.len())).min(t.type_bonus_cap);

    add(concentration, bonus).min(Decimal::ONE_HUNDRED)
}

fn market_alignment_score(profile: &FinancialProfile, t: &IncomeTables) -> Decimal {
    let expected = mul(
        t.industry_baseline.get(profile.industry),
        t.market_location.get(profile.location),
    );
    let band = match ratio(profile.monthly_income, expected) {
        Some(r) if r > dec!(1.2) => dec!(30),
        Some(r) if r > dec!(1.0) => dec!(15),
        Some(r) if r > dec!(0.8) => dec!(5),
        Some(r) if r > dec!(0.6) => dec!(-10),
        _ => dec!(-25),
    };
    let experience = mul(
        t.experience_bonus_step,
        Decimal::from(profile.experience_years),
    )
    .min(t.experience_bonus_cap);
    clamp_score(sum([dec!(50), band, experience]))
}

/// Bands against multiples of income. With positive income the upper
/// bands are out of reach, so real profiles land at 20.
fn goal_suitability_score(income: Decimal) -> Decimal {
    if income <= Decimal::ZERO {
        return dec!(20);
    }
    let emergency = mul(income, dec!(6));
    let retirement = mul(income, dec!(0.15));
    let investment = mul(income, dec!(0.20));
    let major_purchase = mul(income, dec!(12));

    if income >= sum([emergency, retirement, investment]) {
        dec!(100)
    } else if income >= add(emergency, retirement) {
        dec!(80)
    } else if income >= add(emergency, investment) {
        dec!(70)
    } else if income >= emergency {
        dec!(60)
    } else if income >= mul(major_purchase, dec!(0.5)) {
        dec!(40)
    } else {
        dec!(20)
    }
}

fn project(profile: &FinancialProfile, t: &IncomeTables) -> IncomeProjections {
    let growth = add(Decimal::ONE, profile.growth_rate);
    let income = profile.monthly_income;
    let confidence = sub(Decimal::ONE, mul(profile.growth_rate, t.confidence_slope))
        .max(t.confidence_floor);
    IncomeProjections {
        next_year: round_whole(mul(income, growth)),
        five_year: round_whole(
            growth
                .checked_powi(5)
                .and_then(|g| income.checked_mul(g))
                .unwrap_or(Decimal::MAX),
        ),
        confidence: round_dp(confidence, 2),
    }
}

// =============================================================================
// NARRATIVE
// =============================================================================

fn narrate(profile: &FinancialProfile, raw: &RawScores) -> (Vec<String>, Vec<String>) {
    let mut insights = Vec::new();
    let mut recommendations = Vec::new();

    if raw.stability >= dec!(80) {
        insights.push("Excellent income stability with consistent earnings pattern".to_string());
    } else if raw.stability >= dec!(60) {
        insights.push("Good income stability with minor variations".to_string());
    } else {
        insights.push(
            "Income shows significant variability that may impact financial planning".to_string(),
        );
        recommendations
            .push("Consider building additional income streams to improve stability".to_string());
    }

    if raw.growth >= dec!(80) {
        insights.push(format!(
            "Strong income growth trajectory ({}% annually)",
            round_whole(mul(profile.growth_rate, Decimal::ONE_HUNDRED))
        ));
    } else if raw.growth >= dec!(60) {
        insights.push("Moderate income growth potential".to_string());
    } else {
        insights.push("Limited income growth potential in current role/industry".to_string());
        recommendations
            .push("Explore career advancement opportunities or skill development".to_string());
    }

    if raw.diversification >= dec!(70) {
        insights.push("Well-diversified income sources provide good risk protection".to_string());
    } else {
        insights.push("Income heavily dependent on single source".to_string());
        recommendations.push(
            "Develop additional income streams (freelance, investments, side business)".to_string(),
        );
    }

    if raw.market_alignment >= dec!(80) {
        insights.push(
            "Income well-aligned with market expectations for your industry and location"
                .to_string(),
        );
    } else if raw.market_alignment >= dec!(60) {
        insights.push("Income reasonably aligned with market standards".to_string());
    } else {
        insights.push("Income below market expectations for your experience level".to_string());
        recommendations.push(
            "Consider salary negotiation or career transition to higher-paying roles".to_string(),
        );
    }

    if raw.goal_suitability >= dec!(80) {
        insights.push("Income level supports comprehensive financial goal achievement".to_string());
    } else if raw.goal_suitability >= dec!(60) {
        insights.push("Income supports most major financial goals".to_string());
    } else {
        insights.push(
            "Income may limit ability to achieve multiple financial goals simultaneously"
                .to_string(),
        );
        recommendations
            .push("Prioritize financial goals and consider phased approach".to_string());
    }

    (insights, recommendations)
}

// =============================================================================
// TESTS
// =============================================================================
