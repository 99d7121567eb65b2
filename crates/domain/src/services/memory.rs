//! In-memory store and push transport used by the service tests.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::alert::{
    Alert, AlertResponse, AlertStatus, NewAlert, NewAlertResponse, ResponseStatus,
};
use crate::models::blood_bank::{BloodBank, Inventory, NewBloodBank};
use crate::models::notification::{NewNotification, Notification};
use crate::models::user::{DonorStatus, NewUser, User, UserProfile};
use crate::models::{BloodType, GeoPoint};
use crate::ports::{AlertStore, BloodBankStore, NotificationStore, UserStore};
use crate::services::notification::{PushMessage, PushOutcome, PushTransport};

#[derive(Default)]
struct Tables {
    alerts: Vec<Alert>,
    responses: Vec<AlertResponse>,
    users: Vec<User>,
    banks: Vec<BloodBank>,
    notifications: Vec<Notification>,
}

/// Implements every store port over vectors behind one mutex. Rows are kept
/// in insertion order.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Forces an alert into a status, bypassing the lifecycle.
    pub fn set_alert_status(&self, alert_id: Uuid, status: AlertStatus) {
        self.with(|t| {
            if let Some(a) = t.alerts.iter_mut().find(|a| a.id == alert_id) {
                a.status = status;
            }
        });
    }

    pub fn set_alert_expiry(&self, alert_id: Uuid, expires_at: DateTime<Utc>) {
        self.with(|t| {
            if let Some(a) = t.alerts.iter_mut().find(|a| a.id == alert_id) {
                a.expires_at = expires_at;
            }
        });
    }

    pub fn set_bank_active(&self, bank_id: Uuid, is_active: bool) {
        self.with(|t| {
            if let Some(b) = t.banks.iter_mut().find(|b| b.id == bank_id) {
                b.is_active = is_active;
            }
        });
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.with(|t| t.notifications.clone())
    }

    pub fn responses(&self) -> Vec<AlertResponse> {
        self.with(|t| t.responses.clone())
    }
}

fn newest_first(mut alerts: Vec<Alert>) -> Vec<Alert> {
    alerts.reverse();
    alerts
}

#[async_trait::async_trait]
impl AlertStore for InMemoryStore {
    async fn insert(&self, new: NewAlert) -> DomainResult<Alert> {
        let now = Utc::now();
        let alert = Alert {
            id: Uuid::new_v4(),
            blood_type: new.blood_type,
            quantity: new.quantity,
            urgency: new.urgency,
            status: AlertStatus::Pending,
            patient_info: new.patient_info,
            doctor_id: new.doctor_id,
            blood_bank_id: new.blood_bank_id,
            accepted_donor_id: None,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
        };
        self.with(|t| t.alerts.push(alert.clone()));
        Ok(alert)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Alert>> {
        Ok(self.with(|t| t.alerts.iter().find(|a| a.id == id).cloned()))
    }

    async fn list_by_blood_bank(&self, blood_bank_id: Uuid) -> DomainResult<Vec<Alert>> {
        Ok(newest_first(self.with(|t| {
            t.alerts
                .iter()
                .filter(|a| a.blood_bank_id == blood_bank_id)
                .cloned()
                .collect()
        })))
    }

    async fn list_by_doctor(&self, doctor_id: Uuid) -> DomainResult<Vec<Alert>> {
        Ok(newest_first(self.with(|t| {
            t.alerts
                .iter()
                .filter(|a| a.doctor_id == doctor_id)
                .cloned()
                .collect()
        })))
    }

    async fn list_open_for_banks(
        &self,
        blood_bank_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Alert>> {
        Ok(newest_first(self.with(|t| {
            t.alerts
                .iter()
                .filter(|a| blood_bank_ids.contains(&a.blood_bank_id) && a.is_open(now))
                .cloned()
                .collect()
        })))
    }

    async fn accept_donor(
        &self,
        alert_id: Uuid,
        donor_id: Uuid,
        message: &str,
    ) -> DomainResult<Option<Alert>> {
        Ok(self.with(|t| {
            let alert = t
                .alerts
                .iter_mut()
                .find(|a| a.id == alert_id && a.status == AlertStatus::Pending)?;
            let now = Utc::now();
            alert.status = AlertStatus::Fulfilled;
            alert.accepted_donor_id = Some(donor_id);
            alert.updated_at = now;
            let updated = alert.clone();

            t.responses.push(AlertResponse {
                id: Uuid::new_v4(),
                alert_id,
                donor_id,
                status: ResponseStatus::Accepted,
                message: message.to_string(),
                responded_at: now,
            });
            Some(updated)
        }))
    }

    async fn record_response(&self, new: NewAlertResponse) -> DomainResult<AlertResponse> {
        let response = AlertResponse {
            id: Uuid::new_v4(),
            alert_id: new.alert_id,
            donor_id: new.donor_id,
            status: new.status,
            message: new.message,
            responded_at: Utc::now(),
        };
        self.with(|t| t.responses.push(response.clone()));
        Ok(response)
    }

    async fn list_responses(&self, alert_id: Uuid) -> DomainResult<Vec<AlertResponse>> {
        Ok(self.with(|t| {
            t.responses
                .iter()
                .filter(|r| r.alert_id == alert_id)
                .cloned()
                .collect()
        }))
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, new: NewUser) -> DomainResult<User> {
        self.with(|t| {
            if t.users.iter().any(|u| u.email == new.email) {
                return Err(DomainError::Conflict("Email already registered".into()));
            }
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email,
                password_hash: new.password_hash,
                phone: new.phone,
                is_active: true,
                last_login_at: None,
                push_token: None,
                profile: new.profile,
                created_at: now,
                updated_at: now,
            };
            t.users.push(user.clone());
            Ok(user)
        })
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn find_available_donors(
        &self,
        blood_type: Option<BloodType>,
    ) -> DomainResult<Vec<User>> {
        Ok(self.with(|t| {
            t.users
                .iter()
                .filter(|u| u.is_active)
                .filter(|u| {
                    u.as_donor().is_some_and(|d| {
                        d.status == DonorStatus::Available
                            && blood_type.map_or(true, |bt| d.blood_type == bt)
                    })
                })
                .cloned()
                .collect()
        }))
    }

    async fn update_location(&self, donor_id: Uuid, location: GeoPoint) -> DomainResult<User> {
        self.with(|t| {
            let user = t
                .users
                .iter_mut()
                .find(|u| u.id == donor_id)
                .ok_or_else(|| DomainError::not_found("User not found"))?;
            match &mut user.profile {
                UserProfile::Donor(d) => d.location = location,
                UserProfile::Doctor(_) => {
                    return Err(DomainError::forbidden("Only donors have a location"))
                }
            }
            user.updated_at = Utc::now();
            Ok(user.clone())
        })
    }

    async fn update_status(&self, donor_id: Uuid, status: DonorStatus) -> DomainResult<User> {
        self.with(|t| {
            let user = t
                .users
                .iter_mut()
                .find(|u| u.id == donor_id)
                .ok_or_else(|| DomainError::not_found("User not found"))?;
            match &mut user.profile {
                UserProfile::Donor(d) => d.status = status,
                UserProfile::Doctor(_) => {
                    return Err(DomainError::forbidden("Only donors have a status"))
                }
            }
            user.updated_at = Utc::now();
            Ok(user.clone())
        })
    }

    async fn update_push_token(&self, user_id: Uuid, token: &str) -> DomainResult<()> {
        self.with(|t| match t.users.iter_mut().find(|u| u.id == user_id) {
            Some(u) => {
                u.push_token = Some(token.to_string());
                Ok(())
            }
            None => Err(DomainError::not_found("User not found")),
        })
    }

    async fn record_login(&self, user_id: Uuid) -> DomainResult<()> {
        self.with(|t| {
            if let Some(u) = t.users.iter_mut().find(|u| u.id == user_id) {
                u.last_login_at = Some(Utc::now());
            }
        });
        Ok(())
    }
}

#[async_trait::async_trait]
impl BloodBankStore for InMemoryStore {
    async fn insert(&self, new: NewBloodBank) -> DomainResult<BloodBank> {
        self.with(|t| {
            if t.banks
                .iter()
                .any(|b| b.email == new.email || b.hospital_name == new.hospital_name)
            {
                return Err(DomainError::Conflict("Blood bank already registered".into()));
            }
            let now = Utc::now();
            let bank = BloodBank {
                id: Uuid::new_v4(),
                hospital_name: new.hospital_name,
                address: new.address,
                phone: new.phone,
                email: new.email,
                password_hash: new.password_hash,
                location: new.location,
                is_active: true,
                push_token: None,
                inventory: Inventory::empty(),
                created_at: now,
                updated_at: now,
            };
            t.banks.push(bank.clone());
            Ok(bank)
        })
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<BloodBank>> {
        Ok(self.with(|t| t.banks.iter().find(|b| b.id == id).cloned()))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<BloodBank>> {
        Ok(self.with(|t| t.banks.iter().find(|b| b.email == email).cloned()))
    }

    async fn find_by_hospital_name(
        &self,
        hospital_name: &str,
    ) -> DomainResult<Option<BloodBank>> {
        Ok(self.with(|t| {
            t.banks
                .iter()
                .find(|b| b.hospital_name == hospital_name)
                .cloned()
        }))
    }

    async fn list_active(&self) -> DomainResult<Vec<BloodBank>> {
        Ok(self.with(|t| t.banks.iter().filter(|b| b.is_active).cloned().collect()))
    }

    async fn adjust_inventory(
        &self,
        blood_bank_id: Uuid,
        blood_type: BloodType,
        delta: i32,
    ) -> DomainResult<Option<i32>> {
        Ok(self.with(|t| {
            let bank = t.banks.iter_mut().find(|b| b.id == blood_bank_id)?;
            let units = bank.inventory.adjusted(blood_type, delta)?;
            bank.inventory.set(blood_type, units);
            bank.updated_at = Utc::now();
            Some(units)
        }))
    }

    async fn update_push_token(&self, blood_bank_id: Uuid, token: &str) -> DomainResult<()> {
        self.with(|t| match t.banks.iter_mut().find(|b| b.id == blood_bank_id) {
            Some(b) => {
                b.push_token = Some(token.to_string());
                Ok(())
            }
            None => Err(DomainError::not_found("Blood bank not found")),
        })
    }
}

#[async_trait::async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert(&self, new: NewNotification) -> DomainResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: new.recipient_id,
            recipient_kind: new.recipient_kind,
            alert_id: new.alert_id,
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            data: new.data,
            read: false,
            created_at: Utc::now(),
        };
        self.with(|t| t.notifications.push(notification.clone()));
        Ok(notification)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: i64,
    ) -> DomainResult<Vec<Notification>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.with(|t| {
            t.notifications
                .iter()
                .rev()
                .filter(|n| n.recipient_id == recipient_id)
                .take(limit)
                .cloned()
                .collect()
        }))
    }

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> DomainResult<Option<Notification>> {
        Ok(self.with(|t| {
            let n = t
                .notifications
                .iter_mut()
                .find(|n| n.id == id && n.recipient_id == recipient_id)?;
            n.read = true;
            Some(n.clone())
        }))
    }
}

/// Push transport that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingPushTransport {
    sent: Mutex<Vec<PushMessage>>,
}

impl RecordingPushTransport {
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl PushTransport for RecordingPushTransport {
    async fn send(&self, message: PushMessage) -> PushOutcome {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
        PushOutcome::Sent
    }
}
