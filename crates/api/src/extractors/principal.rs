//! Authenticated principal extractors.
//!
//! Each extractor reads the [`AuthClaims`] left by the auth middleware (or
//! verifies the Bearer token itself when the middleware did not run), loads
//! the account from its store and checks the kind the route requires.
//!
//! A token of the wrong kind is `403`; a token for a missing or deactivated
//! account is `401`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::user::Role;
use domain::models::{BloodBank, User};
use domain::services::Caller;
use shared::jwt::PrincipalKind;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::{bearer_token, rejection, AuthClaims};

fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<AuthClaims, ApiError> {
    if let Some(claims) = parts.extensions.get::<AuthClaims>() {
        return Ok(claims.clone());
    }

    let token = bearer_token(&parts.headers).ok_or_else(|| {
        ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;
    AuthClaims::from_token(&state.jwt, token).map_err(rejection)
}

fn role_kind(role: Role) -> PrincipalKind {
    match role {
        Role::Donor => PrincipalKind::Donor,
        Role::Doctor => PrincipalKind::Doctor,
    }
}

async fn load_user(state: &AppState, claims: &AuthClaims) -> Result<User, ApiError> {
    let user = state
        .users
        .find_by_id(claims.principal_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account not found".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }
    // Role is immutable, so a mismatch means the token was not issued for this account
    if role_kind(user.role()) != claims.kind {
        return Err(ApiError::Unauthorized("Invalid or expired token".to_string()));
    }
    Ok(user)
}

async fn load_blood_bank(state: &AppState, claims: &AuthClaims) -> Result<BloodBank, ApiError> {
    let bank = state
        .blood_banks
        .find_by_id(claims.principal_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Blood bank not found".to_string()))?;

    if !bank.is_active {
        return Err(ApiError::Unauthorized(
            "Blood bank account is deactivated".to_string(),
        ));
    }
    Ok(bank)
}

fn require_kind(claims: &AuthClaims, expected: PrincipalKind, message: &str) -> Result<(), ApiError> {
    if claims.kind == expected {
        Ok(())
    } else {
        Err(ApiError::Forbidden(message.to_string()))
    }
}

/// An authenticated donor.
#[derive(Debug, Clone)]
pub struct DonorAuth(pub User);

#[async_trait]
impl FromRequestParts<AppState> for DonorAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        require_kind(&claims, PrincipalKind::Donor, "Only donors can access this resource")?;
        load_user(state, &claims).await.map(DonorAuth)
    }
}

/// An authenticated doctor.
#[derive(Debug, Clone)]
pub struct DoctorAuth(pub User);

#[async_trait]
impl FromRequestParts<AppState> for DoctorAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        require_kind(&claims, PrincipalKind::Doctor, "Only doctors can access this resource")?;
        load_user(state, &claims).await.map(DoctorAuth)
    }
}

/// An authenticated donor or doctor.
#[derive(Debug, Clone)]
pub struct UserAuth(pub User);

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        if !claims.kind.is_user() {
            return Err(ApiError::Forbidden(
                "Only donors and doctors can access this resource".to_string(),
            ));
        }
        load_user(state, &claims).await.map(UserAuth)
    }
}

/// An authenticated blood bank.
#[derive(Debug, Clone)]
pub struct BloodBankAuth(pub BloodBank);

#[async_trait]
impl FromRequestParts<AppState> for BloodBankAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        require_kind(
            &claims,
            PrincipalKind::BloodBank,
            "Only blood banks can access this resource",
        )?;
        load_blood_bank(state, &claims).await.map(BloodBankAuth)
    }
}

/// Any authenticated principal.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    BloodBank(BloodBank),
}

impl Principal {
    pub fn id(&self) -> Uuid {
        match self {
            Principal::User(user) => user.id,
            Principal::BloodBank(bank) => bank.id,
        }
    }

    pub fn caller(&self) -> Caller<'_> {
        match self {
            Principal::User(user) => Caller::User(user),
            Principal::BloodBank(bank) => Caller::BloodBank(bank),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        if claims.kind.is_user() {
            load_user(state, &claims).await.map(Principal::User)
        } else {
            load_blood_bank(state, &claims).await.map(Principal::BloodBank)
        }
    }
}
