//! Firebase Cloud Messaging push transport.
//!
//! Implements [`PushTransport`] on the FCM HTTP v1 API. Access tokens come
//! from the service account's OAuth2 JWT-bearer flow and are cached until a
//! minute before they expire.

use std::time::{Duration, Instant};

use chrono::Utc;
use domain::services::{PushMessage, PushOutcome, PushTransport};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::FcmConfig;
use crate::middleware::metrics::record_push_outcome;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

pub struct FcmPushTransport {
    client: Client,
    config: FcmConfig,
    credentials: ServiceAccountCredentials,
    token_cache: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct OAuthClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Serialize)]
struct FcmMessage {
    message: MessagePayload,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    token: String,
    notification: NotificationPayload,
    /// FCM requires every data value to be a string.
    data: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    android: Option<AndroidConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apns: Option<ApnsConfig>,
}

#[derive(Debug, Serialize)]
struct NotificationPayload {
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct AndroidConfig {
    priority: &'static str,
}

#[derive(Debug, Serialize)]
struct ApnsConfig {
    headers: ApnsHeaders,
}

#[derive(Debug, Serialize)]
struct ApnsHeaders {
    #[serde(rename = "apns-priority")]
    priority: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum FcmError {
    #[error("Failed to parse credentials: {0}")]
    Credentials(String),

    #[error("Failed to create JWT: {0}")]
    Jwt(String),

    #[error("Failed to get access token: {0}")]
    Token(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FCM API error: {0}")]
    Api(String),

    #[error("Invalid FCM token")]
    InvalidToken,

    #[error("FCM is not enabled")]
    NotEnabled,
}

impl FcmPushTransport {
    pub fn new(config: FcmConfig) -> Result<Self, FcmError> {
        if !config.enabled {
            return Err(FcmError::NotEnabled);
        }

        let credentials = load_credentials(&config.credentials)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            credentials,
            token_cache: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, FcmError> {
        if let Some(token) = self.token_cache.read().await.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let mut cache = self.token_cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cache.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.fetch_access_token().await?;
        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_access_token(&self) -> Result<CachedToken, FcmError> {
        let now = Utc::now().timestamp();
        let claims = OAuthClaims {
            iss: self.credentials.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| FcmError::Jwt(format!("Invalid private key: {}", e)))?;
        let assertion = jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| FcmError::Jwt(e.to_string()))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FcmError::Token(format!("Token exchange failed: {}", error_text)));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    fn build_message(&self, message: PushMessage) -> FcmMessage {
        let (android, apns) = if self.config.high_priority {
            (
                Some(AndroidConfig { priority: "high" }),
                Some(ApnsConfig {
                    headers: ApnsHeaders { priority: "10" },
                }),
            )
        } else {
            (None, None)
        };

        FcmMessage {
            message: MessagePayload {
                token: message.token,
                notification: NotificationPayload {
                    title: message.title,
                    body: message.body,
                },
                data: stringify_data(message.data),
                android,
                apns,
            },
        }
    }

    async fn send_message(&self, message: &FcmMessage) -> Result<(), FcmError> {
        let access_token = self.access_token().await?;
        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.config.project_id
        );

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // 100ms, 200ms, 400ms, ...
                tokio::time::sleep(Duration::from_millis(100 * (1 << (attempt - 1).min(6)))).await;
            }

            let resp = match self
                .client
                .post(&url)
                .bearer_auth(&access_token)
                .json(message)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(FcmError::Http(e));
                    continue;
                }
            };

            let status = resp.status();
            if status.is_success() {
                tracing::debug!(attempt = attempt, "FCM message sent");
                return Ok(());
            }

            let error_text = resp.text().await.unwrap_or_default();
            if status.is_server_error() {
                last_error = Some(FcmError::Api(error_text));
                continue;
            }
            if is_unregistered(status.as_u16(), &error_text) {
                return Err(FcmError::InvalidToken);
            }
            return Err(FcmError::Api(error_text));
        }

        Err(last_error.unwrap_or_else(|| FcmError::Api("Unknown error".to_string())))
    }
}

#[async_trait::async_trait]
impl PushTransport for FcmPushTransport {
    async fn send(&self, message: PushMessage) -> PushOutcome {
        let payload = self.build_message(message);

        match self.send_message(&payload).await {
            Ok(()) => {
                record_push_outcome("sent");
                PushOutcome::Sent
            }
            Err(FcmError::InvalidToken) => {
                record_push_outcome("invalid_token");
                tracing::warn!("FCM token rejected, device should re-register");
                PushOutcome::NoToken
            }
            Err(e) => {
                record_push_outcome("failed");
                tracing::error!(error = %e, "Failed to send push notification");
                PushOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Reads service account credentials from inline JSON or a file path.
fn load_credentials(source: &str) -> Result<ServiceAccountCredentials, FcmError> {
    let json = if source.trim_start().starts_with('{') {
        source.to_string()
    } else {
        std::fs::read_to_string(source)
            .map_err(|e| FcmError::Credentials(format!("Failed to read credentials file: {}", e)))?
    };
    serde_json::from_str(&json).map_err(|e| FcmError::Credentials(format!("Invalid JSON: {}", e)))
}

fn stringify_data(data: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match data {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let s = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, serde_json::Value::String(s))
            })
            .collect(),
        _ => serde_json::Map::new(),
    }
}

fn is_unregistered(status: u16, body: &str) -> bool {
    matches!(status, 400 | 404) && (body.contains("UNREGISTERED") || body.contains("INVALID_ARGUMENT"))
}
