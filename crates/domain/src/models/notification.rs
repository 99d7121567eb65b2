//! Notification delivery records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::blood_bank::BloodBank;
use super::user::User;
use crate::error::DomainError;

/// Title used for tags outside the known set.
pub const DEFAULT_TITLE: &str = "BloodLink Notification";

/// Maximum number of records returned by a history query.
pub const HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    NewAlert,
    AlertCancelled,
    BloodRequest,
    DonorAccepted,
    BloodReceived,
}

impl NotificationType {
    pub const ALL: [NotificationType; 5] = [
        NotificationType::NewAlert,
        NotificationType::AlertCancelled,
        NotificationType::BloodRequest,
        NotificationType::DonorAccepted,
        NotificationType::BloodReceived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::NewAlert => "NEW_ALERT",
            NotificationType::AlertCancelled => "ALERT_CANCELLED",
            NotificationType::BloodRequest => "BLOOD_REQUEST",
            NotificationType::DonorAccepted => "DONOR_ACCEPTED",
            NotificationType::BloodReceived => "BLOOD_RECEIVED",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            NotificationType::NewAlert => "🚨 Urgent Blood Request",
            NotificationType::AlertCancelled => "Alert Cancelled",
            NotificationType::BloodRequest => "New Blood Request",
            NotificationType::DonorAccepted => "Donor Found!",
            NotificationType::BloodReceived => "Blood Received",
        }
    }

    /// Resolves the title for a raw tag. Unknown tags get [`DEFAULT_TITLE`].
    pub fn title_for(tag: &str) -> &'static str {
        tag.parse::<NotificationType>()
            .map(|t| t.title())
            .unwrap_or(DEFAULT_TITLE)
    }
}

impl FromStr for NotificationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Unknown notification type: {}", s)))
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of principal a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    User,
    BloodBank,
}

impl RecipientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientKind::User => "user",
            RecipientKind::BloodBank => "blood_bank",
        }
    }
}

impl FromStr for RecipientKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(RecipientKind::User),
            "blood_bank" => Ok(RecipientKind::BloodBank),
            other => Err(DomainError::validation(format!(
                "Unknown recipient kind: {}",
                other
            ))),
        }
    }
}

/// Addressee of a dispatch: identity plus the device token, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: Uuid,
    pub kind: RecipientKind,
    pub push_token: Option<String>,
}

impl Recipient {
    pub fn user(user: &User) -> Self {
        Self {
            id: user.id,
            kind: RecipientKind::User,
            push_token: user.push_token.clone(),
        }
    }

    pub fn blood_bank(bank: &BloodBank) -> Self {
        Self {
            id: bank.id,
            kind: RecipientKind::BloodBank,
            push_token: bank.push_token.clone(),
        }
    }
}

/// A persisted notification. Only `read` changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_kind: RecipientKind,
    pub alert_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub recipient_kind: RecipientKind,
    pub alert_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}

/// Request payload for `POST /api/notifications/fcm-token`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPushTokenRequest {
    #[validate(length(min = 1, max = 4096, message = "FCM token is required"))]
    pub fcm_token: String,
}
