//! Property tests for the calculators.

#![allow(clippy::unwrap_used, clippy::panic)]

use capstack_core::allocation::allocate;
use capstack_core::emergency::{self, ShockKind};
use capstack_core::{
    Decimal, FinancialProfile, IncomeFrequency, IncomeSource, IncomeSourceKind, Location,
    MarketConditions, RiskTolerance, ScoringTables, health, income, survival,
};
use proptest::prelude::*;

/// Whole amounts in a household range.
fn everyday_amount() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000).prop_map(Decimal::from)
}

/// Any non-negative mantissa at up to nine decimal places, so values run
/// from fractions of a paisa to about 9.2e18.
fn wide_amount() -> impl Strategy<Value = Decimal> {
    (0i64..i64::MAX, 0u32..10).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![3 => everyday_amount(), 2 => wide_amount()]
}

fn share() -> impl Strategy<Value = Decimal> {
    (0i64..=100).prop_map(|n| Decimal::new(n, 2))
}

fn income_source() -> impl Strategy<Value = IncomeSource> {
    let kind = prop_oneof![
        Just(IncomeSourceKind::Salary),
        Just(IncomeSourceKind::Freelance),
        Just(IncomeSourceKind::Business),
        Just(IncomeSourceKind::Investment),
        Just(IncomeSourceKind::Other),
    ];
    let frequency = prop_oneof![Just(IncomeFrequency::Monthly), Just(IncomeFrequency::Irregular)];
    (kind, amount(), frequency, share()).prop_map(|(kind, amount, frequency, stability)| {
        IncomeSource::new(kind, amount, frequency, stability)
    })
}

fn location() -> impl Strategy<Value = Location> {
    prop_oneof![
        Just(Location::Metro),
        Just(Location::Tier1),
        Just(Location::Tier2),
        Just(Location::Rural),
    ]
}

fn risk_tolerance() -> impl Strategy<Value = RiskTolerance> {
    prop_oneof![
        Just(RiskTolerance::Low),
        Just(RiskTolerance::Medium),
        Just(RiskTolerance::High),
    ]
}

fn market() -> impl Strategy<Value = MarketConditions> {
    prop_oneof![
        Just(MarketConditions::Bull),
        Just(MarketConditions::Bear),
        Just(MarketConditions::Neutral),
    ]
}

fn profile() -> impl Strategy<Value = FinancialProfile> {
    let money = (amount(), amount(), amount(), amount());
    let person = (0u8..=10, 0u8..6, 18u8..80, 0u8..40, location(), risk_tolerance());
    let outlook = (
        (0i64..=200).prop_map(|n| Decimal::new(n, 2)),
        market(),
        prop::collection::vec(amount(), 0..13),
        prop::collection::vec(income_source(), 0..5),
    );
    (money, person, outlook).prop_map(
        |(
            (income, expenses, fund, debt),
            (job, dependents, age, experience, location, risk),
            (growth, market, history, sources),
        )| {
            let mut p = FinancialProfile::new(income, expenses, fund, debt);
            p.job_stability_score = job;
            p.dependents = dependents;
            p.age = age;
            p.experience_years = experience;
            p.location = location;
            p.risk_tolerance = risk;
            p.growth_rate = growth;
            p.market_conditions = market;
            p.income_history = history;
            p.income_sources = sources;
            p
        },
    )
}

proptest! {
    #[test]
    fn prop_scores_stay_in_range(p in profile()) {
        let tables = ScoringTables::standard();
        let h = health::score_profile(&p, &tables);
        prop_assert!(h.total_score <= 100);
        let c = h.category_scores;
        for s in [
            c.income_stability,
            c.expense_management,
            c.savings_discipline,
            c.emergency_preparedness,
            c.debt_management,
            c.investment_strategy,
        ] {
            prop_assert!(s <= 100);
        }

        let i = income::score(&p, &tables);
        prop_assert!(i.total_score <= 100);
        let c = i.category_scores;
        for s in [c.stability, c.growth, c.diversification, c.market_alignment, c.goal_suitability] {
            prop_assert!(s <= 100);
        }
        prop_assert!(i.projections.confidence >= Decimal::ZERO);
        prop_assert!(i.projections.confidence <= Decimal::ONE);
    }

    #[test]
    fn prop_survival_grows_with_fund(p in profile(), extra in amount()) {
        let tables = ScoringTables::standard();
        let base = survival::estimate_profile(&p, &tables);
        let mut richer = p.clone();
        richer.emergency_fund += extra;
        let more = survival::estimate_profile(&richer, &tables);
        prop_assert!(more.months >= base.months);
        prop_assert!(more.breakdown.conservative_months >= base.breakdown.conservative_months);
    }

    #[test]
    fn prop_survival_shrinks_with_expenses(p in profile(), extra in amount()) {
        let tables = ScoringTables::standard();
        let base = survival::estimate_profile(&p, &tables);
        let mut costlier = p.clone();
        costlier.monthly_expenses += extra;
        let fewer = survival::estimate_profile(&costlier, &tables);
        prop_assert!(fewer.months <= base.months);
    }

    #[test]
    fn prop_scenarios_are_ordered(p in profile()) {
        let est = survival::estimate_profile(&p, &ScoringTables::standard());
        let b = &est.breakdown;
        prop_assert!(b.conservative_months <= b.moderate_months);
        prop_assert!(b.moderate_months <= b.optimistic_months);
        prop_assert_eq!(est.months, b.moderate_months);
    }

    #[test]
    fn prop_single_source_diversification(mut p in profile(), source in income_source()) {
        let tables = ScoringTables::standard();
        p.income_sources.clear();
        let implicit = income::score(&p, &tables);
        prop_assert_eq!(implicit.category_scores.diversification, 30);

        p.income_sources = vec![source];
        let explicit = income::score(&p, &tables);
        prop_assert_eq!(explicit.category_scores.diversification, 30);
    }

    #[test]
    fn prop_allocation_sums_to_hundred(p in profile()) {
        let alloc = allocate(&p, &ScoringTables::standard());
        prop_assert_eq!(alloc.total_percentage(), Decimal::ONE_HUNDRED);
        prop_assert!(alloc.validate().is_ok());
    }

    #[test]
    fn prop_emergency_status_is_total(balance in amount(), expenses in amount()) {
        let status = emergency::status(balance, expenses, &ScoringTables::standard().emergency);
        prop_assert_eq!(status.months_coverage.is_none(), expenses.is_zero());
    }

    #[test]
    fn prop_emergency_simulation_is_total(
        balance in amount(),
        expenses in amount(),
        income in amount(),
        job in 0u8..=10,
    ) {
        let t = ScoringTables::standard().emergency;
        let sims = emergency::simulate(balance, expenses, income, &t);
        let kinds: Vec<ShockKind> = sims.iter().map(|s| s.scenario).collect();
        prop_assert_eq!(
            kinds,
            vec![
                ShockKind::JobLoss,
                ShockKind::MedicalEmergency,
                ShockKind::MarketCrash,
                ShockKind::IncomeReduction,
            ]
        );
        for sim in &sims {
            prop_assert!(sim.remaining_balance >= Decimal::ZERO);
            prop_assert!(sim.remaining_balance <= balance);
            prop_assert!(sim.monthly_shortfall >= Decimal::ZERO);
            prop_assert!(sim.monthly_shortfall <= expenses);
            prop_assert_eq!(sim.months_survivable.is_none(), sim.monthly_shortfall.is_zero());
            if let Some(months) = sim.months_survivable {
                prop_assert!(months >= Decimal::ZERO);
            }
        }
        // Job loss removes all income.
        prop_assert_eq!(sims[0].monthly_shortfall, expenses);

        let plan = emergency::optimal_contribution(balance, expenses, income, &t);
        prop_assert!(plan.gap >= Decimal::ZERO);
        prop_assert!(plan.recommended_monthly >= Decimal::ZERO);
        let _ = emergency::depletion_risk(balance, expenses, income, job);
    }
}

#[test]
fn test_overspending_profile_still_scores() {
    let tables = ScoringTables::standard();
    let p = FinancialProfile::new(Decimal::from(20_000), Decimal::from(45_000), Decimal::ZERO, Decimal::from(300_000));
    let h = health::score_profile(&p, &tables);
    assert_eq!(h.category_scores.savings_discipline, 0);
    assert_eq!(h.category_scores.emergency_preparedness, 0);
    let s = survival::estimate_profile(&p, &tables);
    assert_eq!(s.months, 0);
    assert_eq!(s.risk_level, survival::SurvivalRisk::Critical);
}
