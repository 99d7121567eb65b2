//! Account routes for users (donors and doctors) and blood banks.

use axum::{extract::State, Json};
use serde::Serialize;
use validator::Validate;

use domain::models::blood_bank::{BloodBankResponse, RegisterBloodBankRequest};
use domain::models::user::{LoginRequest, RegisterUserRequest, UserResponse};
use shared::jwt::IssuedToken;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{BloodBankAuth, UserAuth};
use crate::response::ApiResponse;
use crate::services::{BloodBankSession, UserSession};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodBankAuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub blood_bank: BloodBankResponse,
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodBankProfileResponse {
    pub blood_bank: BloodBankResponse,
}

fn user_auth_response(session: UserSession) -> UserAuthResponse {
    let IssuedToken {
        token, expires_in, ..
    } = session.token;
    UserAuthResponse {
        token,
        token_type: "Bearer",
        expires_in,
        user: session.user.into(),
    }
}

fn blood_bank_auth_response(session: BloodBankSession) -> BloodBankAuthResponse {
    let IssuedToken {
        token, expires_in, ..
    } = session.token;
    BloodBankAuthResponse {
        token,
        token_type: "Bearer",
        expires_in,
        blood_bank: session.blood_bank.into(),
    }
}

/// Register a donor or doctor.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<ApiResponse<UserAuthResponse>, ApiError> {
    request.validate()?;

    let session = state.auth.register_user(&request).await?;

    Ok(ApiResponse::created(user_auth_response(session)).with_message("Registration successful"))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<UserAuthResponse>, ApiError> {
    request.validate()?;

    let session = state
        .auth
        .login_user(&request.email, &request.password)
        .await?;

    Ok(ApiResponse::ok(user_auth_response(session)).with_message("Login successful"))
}

/// GET /api/auth/profile
pub async fn profile(UserAuth(user): UserAuth) -> ApiResponse<UserProfileResponse> {
    ApiResponse::ok(UserProfileResponse { user: user.into() })
}

/// Register a blood bank. Its inventory starts at zero for every blood type.
///
/// POST /api/auth/bloodbank/register
pub async fn register_blood_bank(
    State(state): State<AppState>,
    Json(request): Json<RegisterBloodBankRequest>,
) -> Result<ApiResponse<BloodBankAuthResponse>, ApiError> {
    request.validate()?;

    let session = state.auth.register_blood_bank(&request).await?;

    Ok(ApiResponse::created(blood_bank_auth_response(session))
        .with_message("Blood bank registered successfully"))
}

/// POST /api/auth/bloodbank/login
pub async fn login_blood_bank(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<BloodBankAuthResponse>, ApiError> {
    request.validate()?;

    let session = state
        .auth
        .login_blood_bank(&request.email, &request.password)
        .await?;

    Ok(ApiResponse::ok(blood_bank_auth_response(session)).with_message("Login successful"))
}

/// GET /api/auth/bloodbank/profile
pub async fn blood_bank_profile(
    BloodBankAuth(bank): BloodBankAuth,
) -> ApiResponse<BloodBankProfileResponse> {
    ApiResponse::ok(BloodBankProfileResponse {
        blood_bank: bank.into(),
    })
}
