//! # Asset Allocation
//!
//! Splits monthly income into five buckets (SIP, stocks, bonds, lifestyle,
//! emergency fund) starting from a mix keyed by risk tolerance and shifted
//! for emergency coverage, age, debt load and market conditions. Every shift
//! moves points between two buckets, so the percentages always sum to 100
//! and no bucket goes negative.
//!
//! Also hosts the planning formulas reported next to an allocation and the
//! SIP (systematic investment plan) projector.

use crate::math::{
    clamp_score, mul, ratio, ratio_or_zero, round_dp, round_whole, sub, sum, to_score,
};
use crate::profile::{FinancialProfile, MarketConditions, RiskTolerance};
use crate::tables::{AllocationTables, ScoringTables};
use crate::{CoreError, Result};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Monthly amounts per bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedAmounts {
    pub sip: Decimal,
    pub stocks: Decimal,
    pub bonds: Decimal,
    pub lifestyle: Decimal,
    pub emergency: Decimal,
}

/// Percentages per bucket, amounts and the reasoning behind each shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocation {
    pub sip_percentage: Decimal,
    pub stocks_percentage: Decimal,
    pub bonds_percentage: Decimal,
    pub lifestyle_percentage: Decimal,
    pub emergency_fund_percentage: Decimal,
    pub allocated_amounts: AllocatedAmounts,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

impl AssetAllocation {
    /// Sum of the five percentages.
    #[must_use]
    pub fn total_percentage(&self) -> Decimal {
        sum([
            self.sip_percentage,
            self.stocks_percentage,
            self.bonds_percentage,
            self.lifestyle_percentage,
            self.emergency_fund_percentage,
        ])
    }

    /// Check a client-supplied allocation before storing it.
    pub fn validate(&self) -> Result<()> {
        let pcts = [
            self.sip_percentage,
            self.stocks_percentage,
            self.bonds_percentage,
            self.lifestyle_percentage,
            self.emergency_fund_percentage,
        ];
        if pcts.iter().any(|p| *p < Decimal::ZERO) {
            return Err(CoreError::InvalidAllocation(
                "percentages cannot be negative".to_string(),
            ));
        }
        if self.total_percentage() != Decimal::ONE_HUNDRED {
            return Err(CoreError::InvalidAllocation(format!(
                "percentages sum to {}, expected 100",
                self.total_percentage()
            )));
        }
        let a = &self.allocated_amounts;
        if [a.sip, a.stocks, a.bonds, a.lifestyle, a.emergency]
            .iter()
            .any(|v| *v < Decimal::ZERO)
        {
            return Err(CoreError::InvalidAllocation(
                "allocated amounts cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// ALLOCATOR
// =============================================================================

struct Mix {
    sip: Decimal,
    stocks: Decimal,
    bonds: Decimal,
    lifestyle: Decimal,
    emergency: Decimal,
}

/// Move up to `points` from one bucket to another. Returns what moved.
fn shift(from: &mut Decimal, to: &mut Decimal, points: Decimal) -> Decimal {
    let moved = points.min(*from).max(Decimal::ZERO);
    *from -= moved;
    *to += moved;
    moved
}

fn risk_label(risk: RiskTolerance) -> &'static str {
    match risk {
        RiskTolerance::Low => "low",
        RiskTolerance::Medium => "medium",
        RiskTolerance::High => "high",
    }
}

/// Compute the recommended allocation for a profile.
#[must_use]
pub fn allocate(profile: &FinancialProfile, tables: &ScoringTables) -> AssetAllocation {
    let t = &tables.allocation;
    let base = t.base_mix(profile.risk_tolerance);
    let mut mix = Mix {
        sip: base.sip,
        stocks: base.stocks,
        bonds: base.bonds,
        lifestyle: t.lifestyle,
        emergency: t.emergency,
    };
    let mut reasoning = vec![format!(
        "Base mix for {} risk tolerance: {}% SIP, {}% stocks, {}% bonds",
        risk_label(profile.risk_tolerance),
        mix.sip,
        mix.stocks,
        mix.bonds
    )];

    let coverage = ratio(profile.emergency_fund, profile.monthly_expenses);
    match coverage {
        Some(m) if m < t.critical_cover_months => {
            let moved = shift(&mut mix.lifestyle, &mut mix.emergency, t.critical_cover_boost);
            reasoning.push(format!(
                "Emergency fund covers under {} months: {}% moved from lifestyle to emergency fund",
                t.critical_cover_months, moved
            ));
        }
        Some(m) if m < t.thin_cover_months => {
            let moved = shift(&mut mix.lifestyle, &mut mix.emergency, t.thin_cover_boost);
            reasoning.push(format!(
                "Emergency fund covers under {} months: {}% moved from lifestyle to emergency fund",
                t.thin_cover_months, moved
            ));
        }
        _ => reasoning.push("Emergency coverage is adequate; standard emergency allocation kept".to_string()),
    }

    if profile.age > t.senior_age {
        let moved = shift(&mut mix.stocks, &mut mix.bonds, t.senior_shift);
        reasoning.push(format!(
            "Age above {}: {}% shifted from stocks to bonds for capital preservation",
            t.senior_age, moved
        ));
    } else if profile.age < t.young_age {
        let moved = shift(&mut mix.bonds, &mut mix.stocks, t.young_shift);
        reasoning.push(format!(
            "Age below {}: {}% shifted from bonds to stocks for long-term growth",
            t.young_age, moved
        ));
    }

    let dti = ratio(profile.debt_amount, mul(profile.monthly_income, dec!(12)));
    if dti.is_none_or(|r| r > t.heavy_debt_ratio) && profile.debt_amount > Decimal::ZERO {
        let moved = shift(&mut mix.stocks, &mut mix.bonds, t.debt_shift);
        reasoning.push(format!(
            "High debt load: {}% shifted from stocks to bonds",
            moved
        ));
    }

    match profile.market_conditions {
        MarketConditions::Bear => {
            let moved = shift(&mut mix.stocks, &mut mix.bonds, t.market_shift);
            reasoning.push(format!("Bear market: {}% shifted from stocks to bonds", moved));
        }
        MarketConditions::Bull => {
            let moved = shift(&mut mix.bonds, &mut mix.stocks, t.market_shift);
            reasoning.push(format!("Bull market: {}% shifted from bonds to stocks", moved));
        }
        MarketConditions::Neutral => {}
    }

    let income = profile.monthly_income.max(Decimal::ZERO);
    let amount = |pct: Decimal| round_whole(mul(income, pct / Decimal::ONE_HUNDRED));

    AssetAllocation {
        allocated_amounts: AllocatedAmounts {
            sip: amount(mix.sip),
            stocks: amount(mix.stocks),
            bonds: amount(mix.bonds),
            lifestyle: amount(mix.lifestyle),
            emergency: amount(mix.emergency),
        },
        sip_percentage: mix.sip,
        stocks_percentage: mix.stocks,
        bonds_percentage: mix.bonds,
        lifestyle_percentage: mix.lifestyle,
        emergency_fund_percentage: mix.emergency,
        reasoning,
    }
}

// =============================================================================
// FORMULAS
// =============================================================================

/// Planning metrics reported next to an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationFormulas {
    /// Effective annual return of the SIP, in percent.
    pub sip_cagr: Decimal,
    pub emergency_months: Decimal,
    /// Debt over annual income.
    pub debt_to_income: Decimal,
    /// Percent of income saved.
    pub savings_rate: Decimal,
    /// 0-10.
    pub investment_risk_score: Decimal,
    /// 0-100.
    pub stability_index: u8,
}

/// Effective annual rate of monthly compounding at `annual_return_pct`.
#[must_use]
pub fn sip_cagr(annual_return_pct: Decimal) -> Decimal {
    let monthly = Decimal::ONE + annual_return_pct / dec!(1200);
    monthly
        .checked_powi(12)
        .and_then(|g| (g - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| round_dp(pct, 2))
        .unwrap_or(Decimal::ZERO)
}

/// Months of expenses covered by `balance`. Zero for non-positive expenses.
#[must_use]
pub fn emergency_months(balance: Decimal, monthly_expenses: Decimal) -> Decimal {
    round_dp(ratio_or_zero(balance, monthly_expenses), 2)
}

/// Debt over annual income.
#[must_use]
pub fn debt_to_income(debt: Decimal, annual_income: Decimal) -> Decimal {
    round_dp(ratio_or_zero(debt, annual_income), 2)
}

/// Percent of income left after expenses.
#[must_use]
pub fn savings_rate(monthly_income: Decimal, monthly_expenses: Decimal) -> Decimal {
    round_dp(
        mul(
            ratio_or_zero(sub(monthly_income, monthly_expenses), monthly_income),
            Decimal::ONE_HUNDRED,
        ),
        2,
    )
}

/// Risk of the invested buckets on a 0-10 scale.
#[must_use]
pub fn investment_risk_score(allocation: &AssetAllocation, t: &AllocationTables) -> Decimal {
    let weighted = sum([
        mul(allocation.stocks_percentage, t.stocks_risk),
        mul(allocation.sip_percentage, t.sip_risk),
        mul(allocation.bonds_percentage, t.bonds_risk),
    ]);
    round_dp((weighted / Decimal::TEN).min(Decimal::TEN), 1)
}

/// Composite 0-100 resilience index.
#[must_use]
pub fn stability_index(
    emergency_months: Decimal,
    savings_rate_pct: Decimal,
    debt_to_income: Decimal,
    job_stability_score: u8,
) -> u8 {
    let coverage = emergency_months.max(Decimal::ZERO).min(dec!(6)) / dec!(6) * dec!(30);
    let savings = savings_rate_pct.max(Decimal::ZERO).min(dec!(40)) / dec!(40) * dec!(30);
    let debt = (Decimal::ONE - debt_to_income.max(Decimal::ZERO).min(Decimal::ONE)) * dec!(20);
    let job = Decimal::from(job_stability_score.min(10)) / Decimal::TEN * dec!(20);
    to_score(clamp_score(coverage + savings + debt + job))
}

/// All formulas for a profile and its allocation.
#[must_use]
pub fn formulas(
    profile: &FinancialProfile,
    allocation: &AssetAllocation,
    tables: &ScoringTables,
) -> AllocationFormulas {
    let t = &tables.allocation;
    let months = emergency_months(profile.emergency_fund, profile.monthly_expenses);
    let dti = debt_to_income(profile.debt_amount, mul(profile.monthly_income, dec!(12)));
    let rate = savings_rate(profile.monthly_income, profile.monthly_expenses);
    AllocationFormulas {
        sip_cagr: sip_cagr(t.sip_expected_return),
        emergency_months: months,
        debt_to_income: dti,
        savings_rate: rate,
        investment_risk_score: investment_risk_score(allocation, t),
        stability_index: stability_index(months, rate, dti, profile.job_stability_score),
    }
}

// =============================================================================
// SIP PLANNER
// =============================================================================

/// Projection of a monthly investment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPlan {
    pub monthly_investment: Decimal,
    pub years: u32,
    pub expected_return: Decimal,
    pub future_value: Decimal,
    pub total_invested: Decimal,
    pub wealth_gained: Decimal,
    /// Effective annual rate, in percent.
    pub cagr: Decimal,
}

/// Future value of investing `monthly` at the start of each month for
/// `years` at `expected_return_pct` per year, compounded monthly.
pub fn sip_plan(monthly: Decimal, years: u32, expected_return_pct: Decimal) -> Result<SipPlan> {
    if monthly < Decimal::ZERO {
        return Err(CoreError::InvalidPlan(
            "Monthly investment cannot be negative".to_string(),
        ));
    }
    if years == 0 || years > 100 {
        return Err(CoreError::InvalidPlan(
            "Years must be between 1 and 100".to_string(),
        ));
    }
    if expected_return_pct < Decimal::ZERO || expected_return_pct > Decimal::ONE_HUNDRED {
        return Err(CoreError::InvalidPlan(
            "Expected return must be between 0 and 100".to_string(),
        ));
    }

    let months = i64::from(years) * 12;
    let total_invested = monthly
        .checked_mul(Decimal::from(months))
        .ok_or_else(|| CoreError::InvalidPlan("SIP value overflows".to_string()))?;
    let rate = expected_return_pct / dec!(1200);

    let future_value = if rate.is_zero() {
        total_invested
    } else {
        let growth = (Decimal::ONE + rate)
            .checked_powi(months)
            .ok_or_else(|| CoreError::InvalidPlan("SIP horizon overflows".to_string()))?;
        (growth - Decimal::ONE)
            .checked_div(rate)
            .and_then(|f| f.checked_mul(Decimal::ONE + rate))
            .and_then(|f| f.checked_mul(monthly))
            .ok_or_else(|| CoreError::InvalidPlan("SIP value overflows".to_string()))?
    };
    let future_value = round_whole(future_value);

    Ok(SipPlan {
        monthly_investment: monthly,
        years,
        expected_return: expected_return_pct,
        future_value,
        total_invested,
        wealth_gained: future_value - total_invested,
        cagr: sip_cagr(expected_return_pct),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn profile() -> FinancialProfile {
        let mut p = FinancialProfile::new(dec!(100000), dec!(50000), dec!(600000), dec!(0));
        p.age = 35;
        p
    }

    #[test]
    fn medium_base_mix() {
        let a = allocate(&profile(), &ScoringTables::standard());
        assert_eq!(a.sip_percentage, dec!(35));
        assert_eq!(a.stocks_percentage, dec!(20));
        assert_eq!(a.bonds_percentage, dec!(10));
        assert_eq!(a.lifestyle_percentage, dec!(25));
        assert_eq!(a.emergency_fund_percentage, dec!(10));
        assert_eq!(a.allocated_amounts.sip, dec!(35000));
        assert_eq!(a.total_percentage(), Decimal::ONE_HUNDRED);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn thin_coverage_boosts_emergency_bucket() {
        let mut p = profile();
        p.emergency_fund = dec!(200000); // 4 months
        let a = allocate(&p, &ScoringTables::standard());
        assert_eq!(a.emergency_fund_percentage, dec!(20));
        assert_eq!(a.lifestyle_percentage, dec!(15));

        p.emergency_fund = dec!(50000); // 1 month
        let a = allocate(&p, &ScoringTables::standard());
        assert_eq!(a.emergency_fund_percentage, dec!(25));
        assert_eq!(a.lifestyle_percentage, dec!(10));
    }

    #[test]
    fn shifts_never_go_negative() {
        let mut p = profile();
        p.risk_tolerance = RiskTolerance::High;
        p.age = 60;
        p.debt_amount = dec!(10000000);
        p.market_conditions = MarketConditions::Bear;
        let a = allocate(&p, &ScoringTables::standard());
        assert_eq!(a.stocks_percentage, dec!(10));
        assert_eq!(a.bonds_percentage, dec!(25));
        assert_eq!(a.total_percentage(), Decimal::ONE_HUNDRED);

        p.risk_tolerance = RiskTolerance::Low;
        let a = allocate(&p, &ScoringTables::standard());
        assert_eq!(a.stocks_percentage, Decimal::ZERO);
        assert_eq!(a.total_percentage(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn young_bull_market_leans_to_stocks() {
        let mut p = profile();
        p.age = 25;
        p.market_conditions = MarketConditions::Bull;
        let a = allocate(&p, &ScoringTables::standard());
        assert_eq!(a.stocks_percentage, dec!(30));
        assert_eq!(a.bonds_percentage, Decimal::ZERO);
    }

    #[test]
    fn validate_rejects_bad_totals() {
        let mut a = allocate(&profile(), &ScoringTables::standard());
        a.sip_percentage = dec!(40);
        assert!(matches!(a.validate(), Err(CoreError::InvalidAllocation(_))));
    }

    #[test]
    fn formulas_for_profile() {
        let p = profile();
        let tables = ScoringTables::standard();
        let a = allocate(&p, &tables);
        let f = formulas(&p, &a, &tables);
        assert_eq!(f.sip_cagr, dec!(12.68));
        assert_eq!(f.emergency_months, dec!(12));
        assert_eq!(f.debt_to_income, Decimal::ZERO);
        assert_eq!(f.savings_rate, dec!(50));
        // (20 + 35*0.6 + 10*0.2) / 10
        assert_eq!(f.investment_risk_score, dec!(4.3));
        // 30 + 30 + 20 + 10
        assert_eq!(f.stability_index, 90);
    }

    #[test]
    fn zero_expenses_give_zero_months() {
        assert_eq!(emergency_months(dec!(1000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(savings_rate(Decimal::ZERO, dec!(10)), Decimal::ZERO);
    }

    #[test]
    fn extreme_profiles_keep_percentages_whole() {
        let mut p = FinancialProfile::new(Decimal::MAX, dec!(0.01), Decimal::MAX, Decimal::MAX);
        p.age = 70;
        let tables = ScoringTables::standard();
        let a = allocate(&p, &tables);
        assert_eq!(a.total_percentage(), Decimal::ONE_HUNDRED);
        assert!(a.allocated_amounts.sip > Decimal::ZERO);

        let f = formulas(&p, &a, &tables);
        assert!(f.stability_index <= 100);
        assert!(f.investment_risk_score <= Decimal::TEN);
    }

    #[test]
    fn sip_plan_rejects_overflowing_amounts() {
        assert!(matches!(
            sip_plan(Decimal::MAX, 100, dec!(12)),
            Err(CoreError::InvalidPlan(_))
        ));
        assert!(matches!(
            sip_plan(Decimal::MAX, 2, Decimal::ZERO),
            Err(CoreError::InvalidPlan(_))
        ));
    }

    #[test]
    fn sip_plan_annuity_due() {
        let plan = sip_plan(dec!(10000), 10, dec!(12)).unwrap();
        assert_eq!(plan.total_invested, dec!(1200000));
        assert_eq!(plan.future_value, dec!(2323391));
        assert_eq!(plan.wealth_gained, dec!(1123391));
        assert_eq!(plan.cagr, dec!(12.68));
    }

    #[test]
    fn sip_plan_zero_return_is_principal() {
        let plan = sip_plan(dec!(500), 2, Decimal::ZERO).unwrap();
        assert_eq!(plan.future_value, dec!(12000));
        assert_eq!(plan.wealth_gained, Decimal::ZERO);
        assert!(sip_plan(dec!(500), 0, dec!(10)).is_err());
        assert!(sip_plan(dec!(-1), 5, dec!(10)).is_err());
    }
}
