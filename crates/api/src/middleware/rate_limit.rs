//! Rate limiting middleware.
//!
//! Each authenticated principal (user or blood bank) gets its own
//! token-bucket limiter.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::AuthClaims;

type PrincipalRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const FALLBACK_LIMIT: NonZeroU32 = match NonZeroU32::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

/// Rate limiter state shared across all requests.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<Uuid, Arc<PrincipalRateLimiter>>>,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            rate_limit_per_minute,
        }
    }

    fn get_or_create_limiter(&self, principal_id: Uuid) -> Arc<PrincipalRateLimiter> {
        {
            let limiters = self
                .limiters
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(limiter) = limiters.get(&principal_id) {
                return limiter.clone();
            }
        }

        let mut limiters = self
            .limiters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another request may have created it while we waited
        if let Some(limiter) = limiters.get(&principal_id) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(self.rate_limit_per_minute).unwrap_or(FALLBACK_LIMIT));
        let limiter = Arc::new(GovRateLimiter::direct(quota));
        limiters.insert(principal_id, limiter.clone());
        limiter
    }

    /// Returns `Err(retry_after_secs)` when the principal is over its quota.
    pub fn check(&self, principal_id: Uuid) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(principal_id);

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(DefaultClock::default().now());
                Err(wait_time.as_secs().max(1))
            }
        }
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = self.limiters.read().map(|l| l.len()).unwrap_or_default();
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("active_limiters", &active)
            .finish()
    }
}

/// Applies the per-principal limit.
///
/// Must run after [`crate::middleware::auth::require_auth`], which puts the
/// claims in request extensions.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(principal_id) = req.extensions().get::<AuthClaims>().map(|c| c.principal_id) else {
        return next.run(req).await;
    };

    if let Some(ref rate_limiter) = state.rate_limiter {
        if let Err(retry_after_secs) = rate_limiter.check(principal_id) {
            tracing::warn!(
                principal_id = %principal_id,
                retry_after_secs = retry_after_secs,
                "Rate limit exceeded"
            );
            return ApiError::RateLimited { retry_after_secs }.into_response();
        }
    }

    next.run(req).await
}
