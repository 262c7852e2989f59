//! HTTP handlers.
//!
//! Each handler resolves the caller's profile, runs one calculator from
//! `capstack_core` and shapes the JSON. A missing profile falls back to the
//! default profile and is logged, never reported as an error.

use super::middleware::AuthUser;
use super::types::{
    AllocationResponse, AllocationUpdateRequest, AllocationUpdateResponse, AuthResponse,
    AutoSaveRequest, CalculateRequest, CalculateResponse, EmergencyResponse, HealthScoreResponse,
    IncomeScoreResponse, LockCreated, LockRequest, LoginRequest, PlanCreated, ProfileResponse,
    RegisterRequest, ServerHealth, SimulationRequest, SimulationResponse, SipPlanRequest,
    SurvivalResponse, UnlockRequest, UnlockResponse, UserView, VerifyResponse,
};
use super::{ApiError, AppState, now_ms, now_secs};
use crate::auth::{self, bearer_token};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use capstack_core::allocation::{self, SipPlan};
use capstack_core::discipline::{self, AutoSave, ProtocolOutcome, SpendingCheck, Transaction};
use capstack_core::formats::UserRecord;
use capstack_core::insights::{self, InsightSources, InsightsReport};
use capstack_core::savings::{self, NewSavingsPlan, SavingsStatus};
use capstack_core::{
    Decimal, FinancialProfile, ProfileSource, ProfileUpdate, ResolvedProfile, UserId,
    check_amount, emergency, health, income, resolve_profile, survival,
};
use serde_json::json;

type ApiResult<T> = Result<Json<T>, ApiError>;

const EMERGENCY_RECOMMENDATIONS: [&str; 3] = [
    "Maintain emergency fund at 6 months of expenses",
    "Contribute monthly to build fund gradually",
    "Review and adjust based on life changes",
];

fn resolve(state: &AppState, user: UserId) -> ResolvedProfile {
    let resolved = resolve_profile(&*state.store, user);
    if let ProfileSource::Default { reason } = &resolved.source {
        tracing::warn!(%user, %reason, "falling back to default profile");
    }
    resolved
}

fn user_view(user: &UserRecord) -> UserView {
    UserView {
        id: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
    }
}

// =============================================================================
// SERVER & AUTH
// =============================================================================

pub async fn server_health() -> Json<ServerHealth> {
    Json(ServerHealth {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let email = body.email.trim();
    let name = body.name.trim();
    if email.is_empty() || body.password.is_empty() || name.is_empty() {
        return Err(ApiError::BadRequest(
            "Email, password, and name are required".to_string(),
        ));
    }

    let password = body.password;
    let digest = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    let user = state.store.create_user(email, name, &digest, now_ms())?;
    tracing::info!(user = %user.id, "user registered");

    let token = state.signer.issue(user.id, &user.email, &user.name, now_secs());
    Ok(Json(AuthResponse {
        message: Some("User registered successfully".to_string()),
        token,
        user: user_view(&user),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());
    let user = state
        .store
        .find_user_by_email(&body.email)?
        .ok_or_else(invalid)?;

    let password = body.password;
    let phc = user.password_digest.clone();
    let matches = tokio::task::spawn_blocking(move || auth::verify_password(&password, &phc))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !matches {
        return Err(invalid());
    }

    let token = state.signer.issue(user.id, &user.email, &user.name, now_secs());
    Ok(Json(AuthResponse {
        message: None,
        token,
        user: user_view(&user),
    }))
}

pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    match bearer_token(header_value).and_then(|t| state.signer.verify(t, now_secs())) {
        Ok(claims) => Json(VerifyResponse {
            valid: true,
            payload: claims,
        })
        .into_response(),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

// =============================================================================
// SCORES
// =============================================================================

pub async fn health_score(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<HealthScoreResponse> {
    let resolved = resolve(&state, user.id);
    let result = health::score_profile(&resolved.profile, &state.tables);
    Json(HealthScoreResponse {
        score: result.total_score,
        grade: result.grade,
        category_scores: result.category_scores,
        insights: result.insights,
        recommendations: result.recommendations,
    })
}

pub async fn survival(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<SurvivalResponse> {
    let resolved = resolve(&state, user.id);
    let result = survival::estimate_profile(&resolved.profile, &state.tables);
    Json(SurvivalResponse {
        months: result.months,
        risk_level: result.risk_level,
        breakdown: result.breakdown,
        scenarios: result.scenarios,
        recommendations: result.recommendations,
    })
}

pub async fn income_score(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<IncomeScoreResponse> {
    let resolved = resolve(&state, user.id);
    let result = income::score(&resolved.profile, &state.tables);
    Json(IncomeScoreResponse {
        score: result.total_score,
        grade: result.grade,
        risk_level: result.risk_level,
        category_scores: result.category_scores,
        insights: result.insights,
        recommendations: result.recommendations,
        projections: result.projections,
    })
}

pub async fn calculate(Json(body): Json<CalculateRequest>) -> ApiResult<CalculateResponse> {
    check_amount("income", body.income)?;
    check_amount("expenses", body.expenses)?;
    let expense_ratio = if body.income > Decimal::ZERO {
        body.expenses.checked_div(body.income)
    } else {
        None
    };
    Ok(Json(CalculateResponse { expense_ratio }))
}

fn savings_status_for(
    state: &AppState,
    user: UserId,
    profile: &FinancialProfile,
) -> Result<SavingsStatus, ApiError> {
    let plans = state.store.list_plans(user)?;
    let locks = state.store.list_locks(user)?;
    Ok(savings::savings_status(
        plans,
        &locks,
        profile.monthly_income,
        &state.tables.savings,
    ))
}

pub async fn comprehensive_insights(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<InsightsReport> {
    let resolved = resolve(&state, user.id);
    let profile = &resolved.profile;
    let health = health::score_profile(profile, &state.tables);
    let survival = survival::estimate_profile(profile, &state.tables);
    let income = income::score(profile, &state.tables);
    let savings = savings_status_for(&state, user.id, profile)?;

    let report = insights::build_report(
        user.id,
        InsightSources {
            health: &health,
            survival: &survival,
            income: &income,
            savings: &savings,
        },
        now_ms(),
    );
    Ok(Json(report))
}

// =============================================================================
// PROFILE
// =============================================================================

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<ProfileResponse> {
    let resolved = resolve(&state, user.id);
    Json(ProfileResponse {
        profile: resolved.profile,
        source: resolved.source,
    })
}

pub async fn put_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<ProfileResponse> {
    let base = state
        .store
        .load_profile(user.id)?
        .unwrap_or_else(FinancialProfile::empty);
    let profile = update.apply(base);
    profile.validate()?;

    state.store.put_profile(user.id, &profile)?;
    tracing::info!(user = %user.id, "profile updated");
    Ok(Json(ProfileResponse {
        profile,
        source: ProfileSource::Stored,
    }))
}

// =============================================================================
// ASSET ALLOCATION
// =============================================================================

/// The stored allocation if the user saved one, otherwise a fresh one.
/// Fresh allocations are persisted only for stored profiles.
pub async fn asset_allocation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<AllocationResponse> {
    let resolved = resolve(&state, user.id);
    let allocation = match state.store.load_allocation(user.id)? {
        Some(snapshot) => snapshot.allocation,
        None => {
            let computed = allocation::allocate(&resolved.profile, &state.tables);
            if !resolved.is_default() {
                state
                    .store
                    .save_allocation(user.id, computed.clone(), now_ms())?;
            }
            computed
        }
    };
    let formulas = allocation::formulas(&resolved.profile, &allocation, &state.tables);
    Ok(Json(AllocationResponse {
        allocation,
        formulas,
    }))
}

pub async fn update_asset_allocation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AllocationUpdateRequest>,
) -> ApiResult<AllocationUpdateResponse> {
    body.allocation.validate()?;
    let snapshot = state
        .store
        .save_allocation(user.id, body.allocation, now_ms())?;
    Ok(Json(AllocationUpdateResponse {
        success: true,
        message: "Asset allocation updated successfully".to_string(),
        allocation: snapshot.allocation,
    }))
}

pub async fn sip_plan(Json(body): Json<SipPlanRequest>) -> ApiResult<SipPlan> {
    check_amount("monthlyInvestment", body.monthly_investment)?;
    let plan = allocation::sip_plan(body.monthly_investment, body.years, body.expected_return)?;
    Ok(Json(plan))
}

// =============================================================================
// EMERGENCY FUND
// =============================================================================

pub async fn emergency_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<EmergencyResponse> {
    let resolved = resolve(&state, user.id);
    let p = &resolved.profile;
    let t = &state.tables.emergency;

    let status = emergency::status(p.emergency_fund, p.monthly_expenses, t);
    if !resolved.is_default() {
        state
            .store
            .save_emergency(user.id, status.clone(), now_ms())?;
    }

    Ok(Json(EmergencyResponse {
        status,
        simulations: emergency::simulate(p.emergency_fund, p.monthly_expenses, p.monthly_income, t),
        optimal_contribution: emergency::optimal_contribution(
            p.emergency_fund,
            p.monthly_expenses,
            p.monthly_income,
            t,
        ),
        depletion_risk: emergency::depletion_risk(
            p.emergency_fund,
            p.monthly_expenses,
            p.monthly_income,
            p.job_stability_score,
        ),
        recommendations: EMERGENCY_RECOMMENDATIONS
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    }))
}

/// Run every shock and single out the requested one (the first when none
/// is named).
pub async fn emergency_simulation(
    State(state): State<AppState>,
    Json(body): Json<SimulationRequest>,
) -> ApiResult<SimulationResponse> {
    check_amount("currentBalance", body.current_balance)?;
    check_amount("monthlyExpenses", body.monthly_expenses)?;
    check_amount("monthlyIncome", body.monthly_income)?;
    let all = emergency::simulate(
        body.current_balance,
        body.monthly_expenses,
        body.monthly_income,
        &state.tables.emergency,
    );
    let simulation = body
        .scenario
        .and_then(|kind| all.iter().find(|s| s.scenario == kind))
        .or_else(|| all.first())
        .cloned();
    Ok(Json(SimulationResponse {
        simulation,
        all_scenarios: all,
    }))
}

// =============================================================================
// SAVINGS
// =============================================================================

pub async fn savings_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<SavingsStatus> {
    let resolved = resolve(&state, user.id);
    Ok(Json(savings_status_for(&state, user.id, &resolved.profile)?))
}

pub async fn create_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewSavingsPlan>,
) -> ApiResult<PlanCreated> {
    let plan = state
        .store
        .create_plan(user.id, body, now_ms(), &state.tables.savings)?;
    tracing::info!(user = %user.id, plan = plan.id, "savings plan created");
    Ok(Json(PlanCreated {
        success: true,
        plan,
    }))
}

pub async fn check_transaction(
    State(state): State<AppState>,
    Json(tx): Json<Transaction>,
) -> ApiResult<SpendingCheck> {
    check_amount("amount", tx.amount)?;
    Ok(Json(discipline::check_spending_limit(&tx, &state.protocol)))
}

pub async fn process_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(tx): Json<Transaction>,
) -> ApiResult<ProtocolOutcome> {
    check_amount("amount", tx.amount)?;
    let outcome = discipline::enforce_protocol(&tx, &state.protocol, &state.tables.savings);
    if outcome.blocked {
        tracing::info!(user = %user.id, category = %tx.category, "transaction blocked");
    }
    Ok(Json(outcome))
}

pub async fn auto_save(
    State(state): State<AppState>,
    Json(body): Json<AutoSaveRequest>,
) -> ApiResult<AutoSave> {
    check_amount("incomeAmount", body.income_amount)?;
    Ok(Json(discipline::auto_save_income(
        body.income_amount,
        &state.tables.savings,
    )))
}

pub async fn lock_savings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LockRequest>,
) -> ApiResult<LockCreated> {
    let lock = state.store.create_lock(
        user.id,
        body.amount,
        body.reason,
        now_ms(),
        &state.tables.savings,
    )?;
    Ok(Json(LockCreated {
        success: true,
        message: format!(
            "₹{} locked for {} days",
            lock.amount.normalize(),
            state.tables.savings.lock_days
        ),
        lock,
    }))
}

/// The body is optional; `{ "reason": ... }` when present.
pub async fn unlock_savings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(lock_id): Path<u64>,
    body: Bytes,
) -> ApiResult<UnlockResponse> {
    let request: UnlockRequest = if body.is_empty() {
        UnlockRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?
    };

    let now = now_ms();
    let (lock, remaining) = state
        .store
        .release_lock(user.id, lock_id, request.reason, now)?;
    let early = lock.is_early(now);
    if early {
        tracing::info!(user = %user.id, lock = lock_id, "lock released early");
    }
    Ok(Json(UnlockResponse {
        success: true,
        released_amount: lock.amount,
        early,
        remaining_locked: remaining,
        lock,
    }))
}
