//! Notification history, read receipts and push token registration.
//! Open to every principal; a principal only ever sees its own records.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use domain::models::notification::RegisterPushTokenRequest;
use domain::models::Notification;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Principal;
use crate::response::ApiResponse;

#[derive(Debug, Serialize)]
pub struct NotificationHistoryBody {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct NotificationBody {
    pub notification: Notification,
}

/// GET /api/notifications/history
pub async fn history(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<ApiResponse<NotificationHistoryBody>, ApiError> {
    let notifications = state.notifications.list_history(principal.id()).await?;
    Ok(ApiResponse::ok(NotificationHistoryBody { notifications }))
}

/// PATCH /api/notifications/:notification_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    principal: Principal,
    Path(notification_id): Path<Uuid>,
) -> Result<ApiResponse<NotificationBody>, ApiError> {
    let notification = state
        .notifications
        .mark_read(notification_id, principal.id())
        .await?;
    Ok(ApiResponse::ok(NotificationBody { notification }))
}

/// Store the device token used for push delivery. Replaces any earlier token.
///
/// POST /api/notifications/fcm-token
pub async fn register_push_token(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<RegisterPushTokenRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    request.validate()?;
    let token = request.fcm_token.trim();
    if token.is_empty() {
        return Err(ApiError::Validation("FCM token is required".to_string()));
    }

    match &principal {
        Principal::User(user) => state.users.update_push_token(user.id, token).await?,
        Principal::BloodBank(bank) => state.blood_banks.update_push_token(bank.id, token).await?,
    }

    tracing::info!(principal_id = %principal.id(), "Push token registered");
    Ok(ApiResponse::message("FCM token updated"))
}
