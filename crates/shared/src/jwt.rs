//! JWT issuance and verification.
//!
//! Tokens identify one of three principal kinds: a donor, a doctor, or a
//! blood bank. Production keys are RS256; tests use an HS256 shared secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Kind of authenticated principal a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Donor,
    Doctor,
    BloodBank,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Donor => "donor",
            PrincipalKind::Doctor => "doctor",
            PrincipalKind::BloodBank => "blood_bank",
        }
    }

    /// True for donors and doctors, which are both stored as users.
    pub fn is_user(&self) -> bool {
        !matches!(self, PrincipalKind::BloodBank)
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id or blood bank id.
    pub sub: String,
    pub kind: PrincipalKind,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    /// Parses the subject back into a UUID.
    pub fn subject_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_in: i64,
}

/// Signing and verification keys with token lifetime settings.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    pub access_token_expiry_secs: i64,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// Builds an RS256 configuration from a PEM key pair.
    pub fn from_rsa_pem(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
            access_token_expiry_secs,
            leeway_secs,
        })
    }

    /// Builds an HS256 configuration from a shared secret.
    /// Only meant for tests.
    pub fn from_secret(secret: &str, access_token_expiry_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            access_token_expiry_secs,
            leeway_secs: 0,
        }
    }

    /// Issues an access token for the given principal.
    pub fn issue(&self, subject: Uuid, kind: PrincipalKind) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            exp: (now + Duration::seconds(self.access_token_expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_in: self.access_token_expiry_secs,
        })
    }

    /// Verifies signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::from_secret("bloodlink_test_secret_for_jwt_0001", 900)
    }

    #[test]
    fn test_issue_and_verify_donor_token() {
        let config = test_config();
        let donor_id = Uuid::new_v4();

        let issued = config.issue(donor_id, PrincipalKind::Donor).unwrap();
        let claims = config.verify(&issued.token).unwrap();

        assert_eq!(claims.subject_id().unwrap(), donor_id);
        assert_eq!(claims.kind, PrincipalKind::Donor);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(issued.expires_in, 900);
    }

    #[test]
    fn test_blood_bank_kind_survives_roundtrip() {
        let config = test_config();
        let issued = config.issue(Uuid::new_v4(), PrincipalKind::BloodBank).unwrap();
        let claims = config.verify(&issued.token).unwrap();
        assert_eq!(claims.kind, PrincipalKind::BloodBank);
        assert!(!claims.kind.is_user());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = JwtConfig::from_secret("bloodlink_test_secret_for_jwt_0001", -120);
        let issued = config.issue(Uuid::new_v4(), PrincipalKind::Doctor).unwrap();
        assert!(matches!(config.verify(&issued.token), Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issued = test_config()
            .issue(Uuid::new_v4(), PrincipalKind::Doctor)
            .unwrap();
        let other = JwtConfig::from_secret("a_completely_different_secret_0002", 900);
        assert!(matches!(other.verify(&issued.token), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(test_config().verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_invalid_rsa_key() {
        let result = JwtConfig::from_rsa_pem("nope", "nope", 900, DEFAULT_LEEWAY_SECS);
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }

    #[test]
    fn test_principal_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&PrincipalKind::BloodBank).unwrap(),
            "\"blood_bank\""
        );
        assert_eq!(PrincipalKind::Doctor.to_string(), "doctor");
        assert!(PrincipalKind::Donor.is_user());
    }
}
