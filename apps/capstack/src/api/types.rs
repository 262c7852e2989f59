//! API request and response bodies.
//!
//! All bodies are camelCase JSON.

use crate::auth::Claims;
use capstack_core::allocation::{AllocationFormulas, AssetAllocation};
use capstack_core::emergency::{
    ContributionPlan, DepletionRisk, EmergencyFundStatus, ShockKind, Simulation,
};
use capstack_core::health::HealthCategoryScores;
use capstack_core::income::{IncomeCategoryScores, IncomeProjections, IncomeRisk};
use capstack_core::savings::{SavingsLock, SavingsPlan};
use capstack_core::survival::{StressScenarios, SurvivalBreakdown, SurvivalRisk};
use capstack_core::{Decimal, FinancialProfile, Grade, ProfileSource};
use serde::{Deserialize, Serialize};

// =============================================================================
// SERVER
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerHealth {
    pub status: String,
    pub version: String,
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub payload: Claims,
}

// =============================================================================
// SCORES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreResponse {
    pub score: u8,
    pub grade: Grade,
    pub category_scores: HealthCategoryScores,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalResponse {
    pub months: u64,
    pub risk_level: SurvivalRisk,
    pub breakdown: SurvivalBreakdown,
    pub scenarios: StressScenarios,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeScoreResponse {
    pub score: u8,
    pub grade: Grade,
    pub risk_level: IncomeRisk,
    pub category_scores: IncomeCategoryScores,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub projections: IncomeProjections,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculateRequest {
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    /// `null` when income is not positive.
    pub expense_ratio: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: FinancialProfile,
    pub source: ProfileSource,
}

// =============================================================================
// ALLOCATION
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub allocation: AssetAllocation,
    pub formulas: AllocationFormulas,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationUpdateRequest {
    pub allocation: AssetAllocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationUpdateResponse {
    pub success: bool,
    pub message: String,
    pub allocation: AssetAllocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPlanRequest {
    pub monthly_investment: Decimal,
    pub years: u32,
    pub expected_return: Decimal,
}

// =============================================================================
// EMERGENCY FUND
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyResponse {
    pub status: EmergencyFundStatus,
    pub simulations: Vec<Simulation>,
    pub optimal_contribution: ContributionPlan,
    pub depletion_risk: DepletionRisk,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    #[serde(default)]
    pub scenario: Option<ShockKind>,
    pub current_balance: Decimal,
    pub monthly_expenses: Decimal,
    pub monthly_income: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    pub simulation: Option<Simulation>,
    pub all_scenarios: Vec<Simulation>,
}

// =============================================================================
// SAVINGS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCreated {
    pub success: bool,
    pub plan: SavingsPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveRequest {
    pub income_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockCreated {
    pub success: bool,
    pub message: String,
    pub lock: SavingsLock,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub success: bool,
    pub released_amount: Decimal,
    /// Released before the lock period ended.
    pub early: bool,
    pub remaining_locked: Decimal,
    pub lock: SavingsLock,
}
