//! Account registration and login for users and blood banks.

use std::sync::Arc;

use domain::models::blood_bank::{NewBloodBank, RegisterBloodBankRequest};
use domain::models::user::{NewUser, RegisterUserRequest, UserProfile};
use domain::models::{BloodBank, GeoPoint, User};
use domain::ports::{BloodBankStore, UserStore};
use domain::DomainError;
use shared::jwt::{IssuedToken, JwtConfig, JwtError, PrincipalKind};
use shared::password::{check_password_policy, hash_password, verify_password, PasswordError};
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDisabled,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WeakPassword(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::AccountDisabled => {
                ApiError::Unauthorized("Account is deactivated".to_string())
            }
            AuthError::Domain(e) => e.into(),
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
        }
    }
}

/// Result of a successful user registration or login.
#[derive(Debug)]
pub struct UserSession {
    pub user: User,
    pub token: IssuedToken,
}

/// Result of a successful blood bank registration or login.
#[derive(Debug)]
pub struct BloodBankSession {
    pub blood_bank: BloodBank,
    pub token: IssuedToken,
}

/// Authentication service backed by the user and blood bank stores.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    banks: Arc<dyn BloodBankStore>,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        banks: Arc<dyn BloodBankStore>,
        jwt: Arc<JwtConfig>,
    ) -> Self {
        Self { users, banks, jwt }
    }

    /// Registers a donor or doctor. The role-specific fields are checked
    /// before anything is stored.
    pub async fn register_user(&self, request: &RegisterUserRequest) -> Result<UserSession, AuthError> {
        check_password_policy(&request.password)
            .map_err(|msg| AuthError::WeakPassword(msg.to_string()))?;
        let profile = UserProfile::from_registration(request)?;

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .insert(NewUser {
                name: request.name.trim().to_string(),
                email: normalize_email(&request.email),
                password_hash,
                phone: request.phone.trim().to_string(),
                profile,
            })
            .await?;

        let token = self.jwt.issue(user.id, principal_kind(&user))?;

        tracing::info!(user_id = %user.id, role = user.role().as_str(), "User registered");
        Ok(UserSession { user, token })
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<UserSession, AuthError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        self.users.record_login(user.id).await?;
        let token = self.jwt.issue(user.id, principal_kind(&user))?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(UserSession { user, token })
    }

    /// Registers a blood bank with an empty inventory.
    pub async fn register_blood_bank(
        &self,
        request: &RegisterBloodBankRequest,
    ) -> Result<BloodBankSession, AuthError> {
        check_password_policy(&request.password)
            .map_err(|msg| AuthError::WeakPassword(msg.to_string()))?;
        let location = GeoPoint::new(request.latitude, request.longitude)?;

        let password_hash = hash_password(&request.password)?;
        let blood_bank = self
            .banks
            .insert(NewBloodBank {
                hospital_name: request.hospital_name.trim().to_string(),
                address: request.address.trim().to_string(),
                phone: request.phone.trim().to_string(),
                email: normalize_email(&request.email),
                password_hash,
                location,
            })
            .await?;

        let token = self.jwt.issue(blood_bank.id, PrincipalKind::BloodBank)?;

        tracing::info!(
            blood_bank_id = %blood_bank.id,
            hospital_name = %blood_bank.hospital_name,
            "Blood bank registered"
        );
        Ok(BloodBankSession { blood_bank, token })
    }

    pub async fn login_blood_bank(
        &self,
        email: &str,
        password: &str,
    ) -> Result<BloodBankSession, AuthError> {
        let blood_bank = self
            .banks
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &blood_bank.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !blood_bank.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let token = self.jwt.issue(blood_bank.id, PrincipalKind::BloodBank)?;

        tracing::info!(blood_bank_id = %blood_bank.id, "Blood bank logged in");
        Ok(BloodBankSession { blood_bank, token })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn principal_kind(user: &User) -> PrincipalKind {
    match user.profile {
        UserProfile::Donor(_) => PrincipalKind::Donor,
        UserProfile::Doctor(_) => PrincipalKind::Doctor,
    }
}
