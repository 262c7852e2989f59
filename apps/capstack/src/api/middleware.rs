//! Request middleware: bearer authentication and the global rate limit.

use super::{AppState, ApiError, now_secs};
use crate::auth::{Claims, bearer_token};
use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use capstack_core::UserId;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub claims: Claims,
}

/// Reject requests without a valid bearer token. Preflight requests pass.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = bearer_token(header_value)
        .and_then(|token| state.signer.verify(token, now_secs()))
        .map_err(|e| {
            tracing::debug!(error = %e, path = %req.uri().path(), "rejected request");
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.user_id,
        claims,
    });
    Ok(next.run(req).await)
}

/// A process-wide limiter allowing `per_second` requests. `None` when
/// `per_second` is zero.
pub fn rate_limiter(per_second: u32) -> Option<Arc<DefaultDirectRateLimiter>> {
    let rate = NonZeroU32::new(per_second)?;
    Some(Arc::new(RateLimiter::direct(Quota::per_second(rate))))
}

/// Answer 429 once the limiter is exhausted.
pub async fn rate_limit(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.check().is_err() {
        tracing::warn!(path = %req.uri().path(), "rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }
    next.run(req).await
}
