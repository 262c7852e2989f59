//! # Emergency Fund
//!
//! Coverage status, shock simulations, a contribution plan toward the
//! target, and a depletion-risk score.

use crate::math::{
    clamp_score, floor_amount, floor_count, mul, ratio, round_dp, sub, sum, to_score,
};
use crate::tables::EmergencyTables;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// =============================================================================
// STATUS
// =============================================================================

/// Coverage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageLevel {
    Excellent,
    Good,
    Adequate,
    Insufficient,
    Critical,
}

impl CoverageLevel {
    /// Tier for a coverage in months. `None` (no burn rate) is excellent.
    #[must_use]
    pub fn from_months(months: Option<Decimal>, t: &EmergencyTables) -> Self {
        let Some(m) = months else {
            return Self::Excellent;
        };
        if m >= t.excellent_months {
            Self::Excellent
        } else if m >= t.good_months {
            Self::Good
        } else if m >= t.adequate_months {
            Self::Adequate
        } else if m >= t.insufficient_months {
            Self::Insufficient
        } else {
            Self::Critical
        }
    }

    fn recommended_action(self) -> &'static str {
        match self {
            Self::Excellent => "Consider investing surplus beyond 12 months of expenses",
            Self::Good => "Maintain your emergency fund and review it annually",
            Self::Adequate => "Keep contributing monthly until you reach 6 months of coverage",
            Self::Insufficient => "Prioritise emergency savings before new investments",
            Self::Critical => "Build an emergency buffer immediately and cut discretionary spending",
        }
    }

    fn alert(self) -> Option<&'static str> {
        match self {
            Self::Excellent | Self::Good => None,
            Self::Adequate => Some("Emergency fund is below the 6-month target"),
            Self::Insufficient => Some("Emergency fund is below 3 months of expenses"),
            Self::Critical => Some("Emergency fund covers less than 1 month of expenses"),
        }
    }
}

/// Current emergency-fund position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyFundStatus {
    pub current_balance: Decimal,
    pub target_months: u32,
    pub monthly_burn_rate: Decimal,
    /// `None` when there is no burn rate to cover.
    pub months_coverage: Option<Decimal>,
    pub status: CoverageLevel,
    pub recommended_action: String,
    pub alerts: Vec<String>,
}

/// Assess coverage of `balance` against `monthly_expenses`.
#[must_use]
pub fn status(balance: Decimal, monthly_expenses: Decimal, t: &EmergencyTables) -> EmergencyFundStatus {
    let months = ratio(balance.max(Decimal::ZERO), monthly_expenses).map(|m| round_dp(m, 2));
    let level = CoverageLevel::from_months(months, t);
    EmergencyFundStatus {
        current_balance: balance,
        target_months: t.target_months,
        monthly_burn_rate: monthly_expenses,
        months_coverage: months,
        status: level,
        recommended_action: level.recommended_action().to_string(),
        alerts: level.alert().map(|a| vec![a.to_string()]).unwrap_or_default(),
    }
}

// =============================================================================
// SIMULATIONS
// =============================================================================

/// A financial shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockKind {
    JobLoss,
    MedicalEmergency,
    MarketCrash,
    IncomeReduction,
}

/// Severity of a simulated shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

/// Outcome of one shock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub scenario: ShockKind,
    pub description: String,
    /// Fund left after any one-off cost or haircut.
    pub remaining_balance: Decimal,
    /// Monthly cash shortfall during the shock.
    pub monthly_shortfall: Decimal,
    /// `None` when income still covers expenses.
    pub months_survivable: Option<Decimal>,
    pub impact: Impact,
}

fn simulate_one(
    scenario: ShockKind,
    description: String,
    remaining: Decimal,
    income: Decimal,
    expenses: Decimal,
) -> Simulation {
    let remaining = remaining.max(Decimal::ZERO);
    let shortfall = sub(expenses, income).max(Decimal::ZERO);
    let months = ratio(remaining, shortfall).map(|m| round_dp(m, 1));
    let impact = match months {
        None => Impact::Low,
        Some(m) if m >= dec!(6) => Impact::Low,
        Some(m) if m >= dec!(3) => Impact::Medium,
        Some(_) => Impact::High,
    };
    Simulation {
        scenario,
        description,
        remaining_balance: remaining,
        monthly_shortfall: shortfall,
        months_survivable: months,
        impact,
    }
}

/// Run every shock, in a fixed order.
#[must_use]
pub fn simulate(
    balance: Decimal,
    monthly_expenses: Decimal,
    monthly_income: Decimal,
    t: &EmergencyTables,
) -> Vec<Simulation> {
    let medical_cost = mul(monthly_expenses, t.medical_cost_months);
    let crashed = mul(balance, sub(Decimal::ONE, t.market_crash_haircut));
    let reduced_income = mul(monthly_income, t.reduced_income_share);

    vec![
        simulate_one(
            ShockKind::JobLoss,
            "Complete loss of income; expenses continue".to_string(),
            balance,
            Decimal::ZERO,
            monthly_expenses,
        ),
        simulate_one(
            ShockKind::MedicalEmergency,
            format!(
                "One-off medical cost of {} months of expenses",
                t.medical_cost_months.normalize()
            ),
            sub(balance, medical_cost),
            monthly_income,
            monthly_expenses,
        ),
        simulate_one(
            ShockKind::MarketCrash,
            format!(
                "Emergency fund loses {}% of its value",
                mul(t.market_crash_haircut, Decimal::ONE_HUNDRED).normalize()
            ),
            crashed,
            monthly_income,
            monthly_expenses,
        ),
        simulate_one(
            ShockKind::IncomeReduction,
            format!(
                "Income drops to {}% of current level",
                mul(t.reduced_income_share, Decimal::ONE_HUNDRED).normalize()
            ),
            balance,
            reduced_income,
            monthly_expenses,
        ),
    ]
}

// =============================================================================
// CONTRIBUTION PLAN
// =============================================================================

/// Monthly contribution toward the target coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionPlan {
    pub target_amount: Decimal,
    pub gap: Decimal,
    pub monthly_surplus: Decimal,
    pub recommended_monthly: Decimal,
    /// `None` when there is a gap but no surplus to close it.
    pub months_to_target: Option<u64>,
}

/// Close the gap to the target within the catch-up window without taking
/// more than the allowed share of surplus.
#[must_use]
pub fn optimal_contribution(
    balance: Decimal,
    monthly_expenses: Decimal,
    monthly_income: Decimal,
    t: &EmergencyTables,
) -> ContributionPlan {
    let target = mul(monthly_expenses.max(Decimal::ZERO), Decimal::from(t.target_months));
    let gap = sub(target, balance).max(Decimal::ZERO);
    let surplus = sub(monthly_income, monthly_expenses).max(Decimal::ZERO);

    if gap.is_zero() {
        return ContributionPlan {
            target_amount: target,
            gap,
            monthly_surplus: surplus,
            recommended_monthly: Decimal::ZERO,
            months_to_target: Some(0),
        };
    }

    let catch_up = ratio(gap, t.catch_up_months).unwrap_or(gap).ceil();
    let recommended = catch_up.min(floor_amount(mul(surplus, t.max_surplus_share)));
    let months = ratio(gap, recommended).map(|m| floor_count(m.ceil()));

    ContributionPlan {
        target_amount: target,
        gap,
        monthly_surplus: surplus,
        recommended_monthly: recommended,
        months_to_target: months,
    }
}

// =============================================================================
// DEPLETION RISK
// =============================================================================

/// Depletion risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

/// How exposed the fund is to running out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepletionRisk {
    pub risk_score: u8,
    pub risk_level: RiskBand,
    /// Present only when expenses exceed income.
    pub months_until_depletion: Option<Decimal>,
    pub factors: Vec<String>,
}

/// Additive 0-100 risk score from coverage, job stability and cash flow.
#[must_use]
pub fn depletion_risk(
    balance: Decimal,
    monthly_expenses: Decimal,
    monthly_income: Decimal,
    job_stability_score: u8,
) -> DepletionRisk {
    let mut factors = Vec::new();
    let coverage = ratio(balance.max(Decimal::ZERO), monthly_expenses);

    let coverage_points = match coverage {
        Some(m) if m < dec!(1) => {
            factors.push("Less than 1 month of expenses covered".to_string());
            dec!(50)
        }
        Some(m) if m < dec!(3) => {
            factors.push("Less than 3 months of expenses covered".to_string());
            dec!(30)
        }
        Some(m) if m < dec!(6) => {
            factors.push("Less than 6 months of expenses covered".to_string());
            dec!(15)
        }
        _ => dec!(5),
    };

    let job = job_stability_score.min(10);
    let job_points = Decimal::from(10 - job) * dec!(3);
    if job < 5 {
        factors.push("Low job stability".to_string());
    }

    let burn = sub(monthly_expenses, monthly_income);
    let (cashflow_points, months_until_depletion) = if burn > Decimal::ZERO {
        factors.push("Monthly expenses exceed income".to_string());
        (
            dec!(20),
            ratio(balance.max(Decimal::ZERO), burn).map(|m| round_dp(m, 1)),
        )
    } else {
        (Decimal::ZERO, None)
    };

    let risk_score = to_score(clamp_score(sum([coverage_points, job_points, cashflow_points])));
    let risk_level = if risk_score >= 70 {
        RiskBand::High
    } else if risk_score >= 40 {
        RiskBand::Medium
    } else {
        RiskBand::Low
    };

    DepletionRisk {
        risk_score,
        risk_level,
        months_until_depletion,
        factors,
    }
}

// =============================================================================
// TESTS
// =============================================================================
