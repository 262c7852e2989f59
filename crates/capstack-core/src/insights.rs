//! # Insights Module
//!
//! Alerts and typed insights aggregated from the health, survival, income
//! and savings results of one user.
//!
//! - Alerts flag conditions needing action (critical / warning / info)
//! - Insights describe achievements, opportunities, risks and trends
//! - Every entry carries a stable id of the form `{topic}_{user}`

use crate::UserId;
use crate::emergency::Impact;
use crate::health::HealthScore;
use crate::income::{IncomeRisk, IncomeScore};
use crate::savings::SavingsStatus;
use crate::survival::{SurvivalEstimate, SurvivalRisk};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Savings,
    Spending,
    Income,
    Emergency,
    Investment,
    Debt,
}

/// A condition needing the user's attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub priority: Priority,
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
    pub actionable: bool,
    pub timestamp: i64,
    pub metadata: BTreeMap<String, u64>,
}

impl Alert {
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.level == AlertLevel::Critical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Trend,
    Opportunity,
    Risk,
    Achievement,
}

/// An observation about the user's finances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub category: String,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    /// 0-1.
    pub confidence: Decimal,
    pub timestamp: i64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSummary {
    pub critical_count: usize,
    pub warning_count: usize,
    pub opportunity_count: usize,
    pub achievements_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub spending_trend: Trend,
    pub savings_trend: Trend,
    pub health_trend: Trend,
}

impl Default for Trends {
    fn default() -> Self {
        Self {
            spending_trend: Trend::Stable,
            savings_trend: Trend::Stable,
            health_trend: Trend::Stable,
        }
    }
}

/// The full insights report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub alerts: Vec<Alert>,
    pub insights: Vec<Insight>,
    pub summary: InsightSummary,
    pub trends: Trends,
}

impl InsightsReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alert and refresh the summary.
    pub fn add_alert(&mut self, alert: Alert) {
        self.alerts.push(alert);
        self.refresh_summary();
    }

    /// Add an insight and refresh the summary.
    pub fn add_insight(&mut self, insight: Insight) {
        self.insights.push(insight);
        self.refresh_summary();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty() && self.insights.is_empty()
    }

    fn refresh_summary(&mut self) {
        let count_alerts =
            |level: AlertLevel| self.alerts.iter().filter(|a| a.level == level).count();
        let count_insights =
            |kind: InsightKind| self.insights.iter().filter(|i| i.kind == kind).count();
        self.summary = InsightSummary {
            critical_count: count_alerts(AlertLevel::Critical),
            warning_count: count_alerts(AlertLevel::Warning),
            opportunity_count: count_insights(InsightKind::Opportunity),
            achievements_count: count_insights(InsightKind::Achievement),
        };
    }

    /// Render as a boxed plain-text report.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("┌─────────────────────────────────────┐\n");
        output.push_str("│ ALERTS                              │\n");
        if self.alerts.is_empty() {
            output.push_str("│ - (none)                            │\n");
        } else {
            for alert in &self.alerts {
                output.push_str(&format!(
                    "│ - [{}] {}: {}\n",
                    level_label(alert.level),
                    alert.title,
                    alert.message
                ));
            }
        }

        output.push_str("├─────────────────────────────────────┤\n");
        output.push_str("│ INSIGHTS                            │\n");
        if self.insights.is_empty() {
            output.push_str("│ - (none)                            │\n");
        } else {
            for insight in &self.insights {
                output.push_str(&format!(
                    "│ - {} [{}% confidence]\n",
                    insight.title,
                    (insight.confidence * Decimal::ONE_HUNDRED).round()
                ));
            }
        }

        output.push_str("├─────────────────────────────────────┤\n");
        output.push_str(&format!(
            "│ {} critical, {} warnings, {} opportunities, {} achievements\n",
            self.summary.critical_count,
            self.summary.warning_count,
            self.summary.opportunity_count,
            self.summary.achievements_count
        ));
        output.push_str("└─────────────────────────────────────┘\n");

        output
    }
}

fn level_label(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Critical => "CRITICAL",
        AlertLevel::Warning => "WARNING",
        AlertLevel::Info => "INFO",
        AlertLevel::Success => "SUCCESS",
    }
}

// =============================================================================
// AGGREGATION
// =============================================================================

/// Results the report is built from.
#[derive(Debug, Clone, Copy)]
pub struct InsightSources<'a> {
    pub health: &'a HealthScore,
    pub survival: &'a SurvivalEstimate,
    pub income: &'a IncomeScore,
    pub savings: &'a SavingsStatus,
}

struct AlertSpec {
    topic: &'static str,
    level: AlertLevel,
    priority: Priority,
    category: AlertCategory,
    title: &'static str,
    message: String,
    metadata: (&'static str, u64),
}

fn alert(user: UserId, now: i64, spec: AlertSpec) -> Alert {
    let (key, value) = spec.metadata;
    Alert {
        id: format!("{}_{}", spec.topic, user),
        level: spec.level,
        priority: spec.priority,
        category: spec.category,
        title: spec.title.to_string(),
        message: spec.message,
        actionable: true,
        timestamp: now,
        metadata: BTreeMap::from([(key.to_string(), value)]),
    }
}

/// Build the report for `user` at time `now` (Unix milliseconds).
#[must_use]
pub fn build_report(user: UserId, sources: InsightSources<'_>, now: i64) -> InsightsReport {
    let mut report = InsightsReport::new();
    let health = sources.health.total_score;
    let months = sources.survival.months;
    let discipline = sources.savings.discipline_score;

    // ---- alerts ----
    if health < 50 {
        report.add_alert(alert(user, now, AlertSpec {
            topic: "health_critical",
            level: AlertLevel::Critical,
            priority: Priority::High,
            category: AlertCategory::Emergency,
            title: "Critical Financial Health Alert",
            message: format!(
                "Your financial health score is critically low at {health}. Immediate action required."
            ),
            metadata: ("score", u64::from(health)),
        }));
    } else if health < 70 {
        report.add_alert(alert(user, now, AlertSpec {
            topic: "health_warning",
            level: AlertLevel::Warning,
            priority: Priority::Medium,
            category: AlertCategory::Savings,
            title: "Financial Health Needs Attention",
            message: format!(
                "Your financial health score of {health} indicates areas for improvement."
            ),
            metadata: ("score", u64::from(health)),
        }));
    }

    match sources.survival.risk_level {
        SurvivalRisk::Critical => report.add_alert(alert(user, now, AlertSpec {
            topic: "emergency_critical",
            level: AlertLevel::Critical,
            priority: Priority::High,
            category: AlertCategory::Emergency,
            title: "Emergency Fund Critical",
            message: format!(
                "You can only survive {months} months financially. Build emergency fund immediately."
            ),
            metadata: ("months", months),
        })),
        SurvivalRisk::High => report.add_alert(alert(user, now, AlertSpec {
            topic: "emergency_warning",
            level: AlertLevel::Warning,
            priority: Priority::Medium,
            category: AlertCategory::Emergency,
            title: "Emergency Fund Low",
            message: format!(
                "Your emergency coverage of {months} months is below recommended levels."
            ),
            metadata: ("months", months),
        })),
        SurvivalRisk::Low | SurvivalRisk::Medium => {}
    }

    if discipline < 60 {
        report.add_alert(alert(user, now, AlertSpec {
            topic: "discipline_warning",
            level: AlertLevel::Warning,
            priority: Priority::Medium,
            category: AlertCategory::Savings,
            title: "Savings Discipline Alert",
            message: format!(
                "Your savings discipline score is {discipline}. Consider strengthening your saving habits."
            ),
            metadata: ("score", u64::from(discipline)),
        }));
    }

    if sources.income.risk_level == IncomeRisk::High {
        let score = sources.income.total_score;
        report.add_alert(alert(user, now, AlertSpec {
            topic: "income_warning",
            level: AlertLevel::Warning,
            priority: Priority::Medium,
            category: AlertCategory::Income,
            title: "Income Stability Concern",
            message: format!(
                "Your income stability score of {score} indicates potential financial vulnerability."
            ),
            metadata: ("score", u64::from(score)),
        }));
    }

    // ---- insights ----
    if health >= 80 {
        report.add_insight(Insight {
            id: format!("achievement_health_{user}"),
            kind: InsightKind::Achievement,
            category: "health".to_string(),
            title: "Financial Health Champion".to_string(),
            description: format!(
                "Congratulations! Your financial health score of {health} ({}) demonstrates excellent financial management.",
                sources.health.grade
            ),
            impact: Impact::High,
            confidence: Decimal::ONE,
            timestamp: now,
            recommendations: Vec::new(),
        });
    }

    if months >= 12 {
        report.add_insight(Insight {
            id: format!("achievement_emergency_{user}"),
            kind: InsightKind::Achievement,
            category: "emergency".to_string(),
            title: "Emergency Preparedness Master".to_string(),
            description: format!(
                "Outstanding! You have {months} months of emergency coverage, providing excellent financial security."
            ),
            impact: Impact::High,
            confidence: Decimal::ONE,
            timestamp: now,
            recommendations: Vec::new(),
        });
    }

    if sources.income.category_scores.growth < 70 {
        report.add_insight(Insight {
            id: format!("opportunity_growth_{user}"),
            kind: InsightKind::Opportunity,
            category: "income".to_string(),
            title: "Income Growth Opportunity".to_string(),
            description: "Your industry and experience suggest potential for higher earnings. Consider skill development or career advancement.".to_string(),
            impact: Impact::High,
            confidence: dec!(0.8),
            timestamp: now,
            recommendations: strings(&[
                "Pursue professional certifications",
                "Network with industry leaders",
                "Consider higher-paying roles in your field",
            ]),
        });
    }

    if discipline >= 85 {
        report.add_insight(Insight {
            id: format!("opportunity_investment_{user}"),
            kind: InsightKind::Opportunity,
            category: "investment".to_string(),
            title: "Investment Ready".to_string(),
            description: "Your strong savings discipline indicates readiness for investment opportunities.".to_string(),
            impact: Impact::Medium,
            confidence: dec!(0.9),
            timestamp: now,
            recommendations: strings(&[
                "Consider diversified investment portfolio",
                "Explore tax-advantaged investment options",
                "Consult with financial advisor for personalized strategy",
            ]),
        });
    }

    if sources.income.category_scores.diversification < 60 {
        report.add_insight(Insight {
            id: format!("risk_diversification_{user}"),
            kind: InsightKind::Risk,
            category: "income".to_string(),
            title: "Income Concentration Risk".to_string(),
            description: "Heavy reliance on single income source increases financial vulnerability.".to_string(),
            impact: Impact::High,
            confidence: dec!(0.85),
            timestamp: now,
            recommendations: strings(&[
                "Develop side income streams",
                "Build freelance or consulting skills",
                "Consider passive income investments",
            ]),
        });
    }

    let auto_save = sources.savings.monthly_auto_save;
    if auto_save > Decimal::ZERO {
        report.add_insight(Insight {
            id: format!("trend_savings_{user}"),
            kind: InsightKind::Trend,
            category: "savings".to_string(),
            title: "Positive Savings Momentum".to_string(),
            description: format!(
                "Auto-saving ₹{} monthly shows strong financial discipline.",
                auto_save.normalize()
            ),
            impact: Impact::Medium,
            confidence: dec!(0.9),
            timestamp: now,
            recommendations: Vec::new(),
        });
    }

    report.trends = Trends {
        spending_trend: Trend::Stable,
        savings_trend: if discipline > 80 {
            Trend::Improving
        } else {
            Trend::Stable
        },
        health_trend: if health > 75 {
            Trend::Improving
        } else {
            Trend::Stable
        },
    };

    report
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FinancialProfile;
    use crate::savings::savings_status;
    use crate::tables::ScoringTables;
    use crate::{health, income, survival};

    fn report_for(profile: &FinancialProfile) -> InsightsReport {
        let tables = ScoringTables::standard();
        let h = health::score_profile(profile, &tables);
        let s = survival::estimate_profile(profile, &tables);
        let i = income::score(profile, &tables);
        let status = savings_status(Vec::new(), &[], profile.monthly_income, &tables.savings);
        build_report(
            UserId(42),
            InsightSources {
                health: &h,
                survival: &s,
                income: &i,
                savings: &status,
            },
            1_700_000_000_000,
        )
    }

    #[test]
    fn healthy_profile_earns_achievements() {
        let report = report_for(&FinancialProfile::fallback());
        assert!(report.alerts.iter().all(|a| !a.is_critical()));
        assert!(report.insights.iter().any(|i| i.id == "achievement_emergency_42"));
        assert!(report.insights.iter().any(|i| i.id == "opportunity_investment_42"));
        assert!(report.insights.iter().any(|i| i.id == "trend_savings_42"));
        assert_eq!(report.trends.savings_trend, Trend::Improving);
    }

    #[test]
    fn broke_profile_raises_critical_alerts() {
        let mut profile = FinancialProfile::new(dec!(20000), dec!(40000), dec!(0), dec!(100000));
        profile.job_stability_score = 2;
        let report = report_for(&profile);

        let ids: Vec<&str> = report.alerts.iter().map(|a| a.id.as_str()).collect();
        assert!(ids.contains(&"health_critical_42"));
        assert!(ids.contains(&"emergency_critical_42"));
        assert_eq!(report.summary.critical_count, 2);
        assert_eq!(
            report.alerts[0].metadata.get("score").copied(),
            Some(u64::from(health::score_profile(&profile, &ScoringTables::standard()).total_score))
        );
    }

    #[test]
    fn summary_tracks_additions() {
        let mut report = InsightsReport::new();
        assert!(report.is_empty());
        report.add_insight(Insight {
            id: "x".to_string(),
            kind: InsightKind::Achievement,
            category: "health".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            impact: Impact::Low,
            confidence: Decimal::ONE,
            timestamp: 0,
            recommendations: Vec::new(),
        });
        assert_eq!(report.summary.achievements_count, 1);
        assert!(!report.is_empty());
    }

    #[test]
    fn to_text_lists_sections() {
        let report = report_for(&FinancialProfile::fallback());
        let text = report.to_text();
        assert!(text.contains("ALERTS"));
        assert!(text.contains("INSIGHTS"));
        assert!(text.contains("Emergency Preparedness Master [100% confidence]"));
        assert!(text.contains("achievements"));
    }
}
