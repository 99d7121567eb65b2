//! Store ports.
//!
//! The services in this crate talk to storage only through these traits.
//! `persistence` implements them on PostgreSQL.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::alert::{Alert, AlertResponse, NewAlert, NewAlertResponse};
use crate::models::blood_bank::{BloodBank, NewBloodBank};
use crate::models::notification::{NewNotification, Notification};
use crate::models::user::{DonorStatus, NewUser, User};
use crate::models::{BloodType, GeoPoint};

#[async_trait::async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert(&self, alert: NewAlert) -> DomainResult<Alert>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Alert>>;

    /// Alerts targeting a bank, newest first.
    async fn list_by_blood_bank(&self, blood_bank_id: Uuid) -> DomainResult<Vec<Alert>>;

    /// Alerts raised by a doctor, newest first.
    async fn list_by_doctor(&self, doctor_id: Uuid) -> DomainResult<Vec<Alert>>;

    /// Pending alerts of the given banks whose expiry is after `now`.
    async fn list_open_for_banks(
        &self,
        blood_bank_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Alert>>;

    /// Atomically moves a pending alert to `fulfilled` with `donor_id` as the
    /// accepted donor and records the accepted response.
    ///
    /// Returns `None` without writing anything if the alert is not pending.
    async fn accept_donor(
        &self,
        alert_id: Uuid,
        donor_id: Uuid,
        message: &str,
    ) -> DomainResult<Option<Alert>>;

    async fn record_response(&self, response: NewAlertResponse) -> DomainResult<AlertResponse>;

    /// Responses for an alert in the order they were recorded.
    async fn list_responses(&self, alert_id: Uuid) -> DomainResult<Vec<AlertResponse>>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> DomainResult<User>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    /// Active donors with status `available`, optionally of one blood type.
    async fn find_available_donors(
        &self,
        blood_type: Option<BloodType>,
    ) -> DomainResult<Vec<User>>;

    async fn update_location(&self, donor_id: Uuid, location: GeoPoint) -> DomainResult<User>;

    async fn update_status(&self, donor_id: Uuid, status: DonorStatus) -> DomainResult<User>;

    async fn update_push_token(&self, user_id: Uuid, token: &str) -> DomainResult<()>;

    async fn record_login(&self, user_id: Uuid) -> DomainResult<()>;
}

#[async_trait::async_trait]
pub trait BloodBankStore: Send + Sync {
    async fn insert(&self, bank: NewBloodBank) -> DomainResult<BloodBank>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<BloodBank>>;

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<BloodBank>>;

    async fn find_by_hospital_name(&self, hospital_name: &str)
        -> DomainResult<Option<BloodBank>>;

    async fn list_active(&self) -> DomainResult<Vec<BloodBank>>;

    /// Adds `delta` units of `blood_type` to a bank's stock.
    ///
    /// Returns the new count, or `None` if the bank does not exist or the
    /// result would be negative. The check and the write are one atomic step.
    async fn adjust_inventory(
        &self,
        blood_bank_id: Uuid,
        blood_type: BloodType,
        delta: i32,
    ) -> DomainResult<Option<i32>>;

    async fn update_push_token(&self, blood_bank_id: Uuid, token: &str) -> DomainResult<()>;
}

#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> DomainResult<Notification>;

    /// Newest first, at most `limit` records.
    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: i64,
    ) -> DomainResult<Vec<Notification>>;

    /// Sets the read flag. Returns `None` if no notification with `id` is
    /// addressed to `recipient_id`.
    async fn mark_read(&self, id: Uuid, recipient_id: Uuid)
        -> DomainResult<Option<Notification>>;
}
