//! Alert lifecycle engine.
//!
//! Owns every alert state transition and orchestrates the geolocation
//! matcher, the inventory ledger and the notification dispatcher.
//!
//! ```text
//! pending ──respond(accept)──▶ fulfilled
//!    │
//!    └── (reserved) ──▶ cancelled | rejected
//! ```
//!
//! Checks run before any write in every operation. The accept transition is
//! a conditional store update, so two donors racing on one alert cannot both
//! win.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::alert::{
    Alert, AlertResponse, AlertView, BloodBankSummary, CreateAlertRequest, DoctorSummary,
    DonorSummary, NewAlert, NewAlertResponse, ResponseDecision, ResponseStatus,
};
use crate::models::blood_bank::BloodBank;
use crate::models::notification::{NotificationType, Recipient};
use crate::models::user::User;
use crate::models::GeoPoint;
use crate::ports::{AlertStore, BloodBankStore, UserStore};
use crate::services::geolocation::{find_donors_within_radius, find_within_radius};
use crate::services::inventory::InventoryLedger;
use crate::services::notification::NotificationDispatcher;

/// Tunables for the lifecycle engine.
#[derive(Debug, Clone)]
pub struct AlertSettings {
    /// Time from creation to expiry.
    pub ttl: Duration,
    pub default_notify_radius_km: f64,
    pub nearby_search_radius_km: f64,
    pub max_search_radius_km: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            default_notify_radius_km: 10.0,
            nearby_search_radius_km: 50.0,
            max_search_radius_km: 500.0,
        }
    }
}

/// The authenticated principal reading alert data.
#[derive(Debug, Clone, Copy)]
pub enum Caller<'a> {
    User(&'a User),
    BloodBank(&'a BloodBank),
}

#[derive(Clone)]
pub struct AlertLifecycleService {
    alerts: Arc<dyn AlertStore>,
    users: Arc<dyn UserStore>,
    banks: Arc<dyn BloodBankStore>,
    dispatcher: NotificationDispatcher,
    settings: AlertSettings,
}

impl AlertLifecycleService {
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        users: Arc<dyn UserStore>,
        banks: Arc<dyn BloodBankStore>,
        dispatcher: NotificationDispatcher,
        settings: AlertSettings,
    ) -> Self {
        Self {
            alerts,
            users,
            banks,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    /// Creates a pending alert against the blood bank of the doctor's
    /// hospital. Does not notify anyone.
    pub async fn create_alert(
        &self,
        doctor: &User,
        request: CreateAlertRequest,
    ) -> DomainResult<Alert> {
        let profile = doctor
            .as_doctor()
            .ok_or_else(|| DomainError::forbidden("Only doctors can create alerts"))?;

        if request.quantity <= 0 {
            return Err(DomainError::validation("Quantity must be a positive integer"));
        }

        let bank = self
            .banks
            .find_by_hospital_name(&profile.hospital)
            .await?
            .ok_or_else(|| DomainError::not_found("No blood bank found for your hospital"))?;

        let alert = self
            .alerts
            .insert(NewAlert {
                blood_type: request.blood_type,
                quantity: request.quantity,
                urgency: request.urgency,
                patient_info: request.patient_info,
                doctor_id: doctor.id,
                blood_bank_id: bank.id,
                expires_at: Utc::now() + self.settings.ttl,
            })
            .await?;

        tracing::info!(
            alert_id = %alert.id,
            doctor_id = %doctor.id,
            blood_bank_id = %bank.id,
            blood_type = %alert.blood_type,
            quantity = alert.quantity,
            urgency = alert.urgency.as_str(),
            "Alert created"
        );

        Ok(alert)
    }

    /// Sends `NEW_ALERT` to every available donor of the alert's blood type
    /// within `radius_km` of the bank. Returns how many were notified.
    ///
    /// Fails without notifying anyone when the bank's own stock already
    /// covers the alert.
    pub async fn notify_donors(
        &self,
        bank: &BloodBank,
        alert_id: Uuid,
        radius_km: Option<f64>,
    ) -> DomainResult<usize> {
        let radius_km = self.resolve_radius(radius_km, self.settings.default_notify_radius_km)?;

        let alert = self.find_alert(alert_id).await?;

        if alert.blood_bank_id != bank.id {
            return Err(DomainError::forbidden(
                "Not authorized to notify donors for this alert",
            ));
        }

        if InventoryLedger::has_available(bank, alert.blood_type, alert.quantity) {
            return Err(DomainError::invalid_state(format!(
                "Inventory already holds {} units of {}, no donors needed",
                bank.inventory.units(alert.blood_type),
                alert.blood_type
            )));
        }

        let candidates = self
            .users
            .find_available_donors(Some(alert.blood_type))
            .await?;
        let matches =
            find_donors_within_radius(bank.location, radius_km, candidates, Some(alert.blood_type));

        let message = format!(
            "Urgent need for {} blood at {}",
            alert.blood_type, bank.hospital_name
        );

        let mut notified = 0;
        for m in &matches {
            let donor = &m.candidate;
            match self
                .dispatcher
                .dispatch(
                    &Recipient::user(donor),
                    Some(&alert),
                    NotificationType::NewAlert,
                    message.clone(),
                )
                .await
            {
                Ok(_) => notified += 1,
                Err(e) => tracing::warn!(
                    alert_id = %alert.id,
                    donor_id = %donor.id,
                    error = %e,
                    "Failed to record donor notification"
                ),
            }
        }

        tracing::info!(
            alert_id = %alert.id,
            blood_bank_id = %bank.id,
            radius_km = radius_km,
            candidates = matches.len(),
            notified_count = notified,
            "Donors notified"
        );

        Ok(notified)
    }

    /// Records a donor's reply.
    ///
    /// Accepting fulfils the alert and notifies the bank and the doctor.
    /// Declining only appends to the response log. Either way the donor's
    /// blood type must match and the alert must still be pending.
    pub async fn respond_to_alert(
        &self,
        donor: &User,
        alert_id: Uuid,
        decision: ResponseDecision,
        message: &str,
    ) -> DomainResult<Alert> {
        let profile = donor
            .as_donor()
            .ok_or_else(|| DomainError::forbidden("Only donors can respond to alerts"))?;

        let alert = self.find_alert(alert_id).await?;

        if profile.blood_type != alert.blood_type {
            return Err(DomainError::invalid_state(format!(
                "Your blood type {} does not match the required {}",
                profile.blood_type, alert.blood_type
            )));
        }

        if !alert.is_pending() {
            return Err(no_longer_active());
        }

        match decision {
            ResponseDecision::Declined => {
                self.alerts
                    .record_response(NewAlertResponse {
                        alert_id,
                        donor_id: donor.id,
                        status: ResponseStatus::Declined,
                        message: message.to_string(),
                    })
                    .await?;

                tracing::info!(alert_id = %alert_id, donor_id = %donor.id, "Donor declined alert");
                Ok(alert)
            }
            ResponseDecision::Accepted => {
                let fulfilled = self
                    .alerts
                    .accept_donor(alert_id, donor.id, message)
                    .await?
                    .ok_or_else(|| {
                        tracing::info!(
                            alert_id = %alert_id,
                            donor_id = %donor.id,
                            "Donor lost acceptance race"
                        );
                        no_longer_active()
                    })?;

                tracing::info!(alert_id = %alert_id, donor_id = %donor.id, "Alert fulfilled");

                self.announce_acceptance(&fulfilled, donor).await;

                Ok(fulfilled)
            }
        }
    }

    async fn announce_acceptance(&self, alert: &Alert, donor: &User) {
        match self.banks.find_by_id(alert.blood_bank_id).await {
            Ok(Some(bank)) => {
                let message = format!(
                    "Donor {} accepted the alert for {} blood ({} units)",
                    donor.name, alert.blood_type, alert.quantity
                );
                if let Err(e) = self
                    .dispatcher
                    .dispatch(
                        &Recipient::blood_bank(&bank),
                        Some(alert),
                        NotificationType::DonorAccepted,
                        message,
                    )
                    .await
                {
                    tracing::warn!(alert_id = %alert.id, error = %e, "Failed to notify blood bank");
                }
            }
            Ok(None) => tracing::warn!(alert_id = %alert.id, "Blood bank of alert not found"),
            Err(e) => tracing::warn!(alert_id = %alert.id, error = %e, "Failed to load blood bank"),
        }

        match self.users.find_by_id(alert.doctor_id).await {
            Ok(Some(doctor)) => {
                let message = format!(
                    "A donor accepted your request for {} blood",
                    alert.blood_type
                );
                if let Err(e) = self
                    .dispatcher
                    .dispatch(
                        &Recipient::user(&doctor),
                        Some(alert),
                        NotificationType::DonorAccepted,
                        message,
                    )
                    .await
                {
                    tracing::warn!(alert_id = %alert.id, error = %e, "Failed to notify doctor");
                }
            }
            Ok(None) => tracing::warn!(alert_id = %alert.id, "Doctor of alert not found"),
            Err(e) => tracing::warn!(alert_id = %alert.id, error = %e, "Failed to load doctor"),
        }
    }

    /// Alerts targeting the bank, newest first.
    pub async fn list_for_blood_bank(&self, bank: &BloodBank) -> DomainResult<Vec<AlertView>> {
        let alerts = self.alerts.list_by_blood_bank(bank.id).await?;
        self.project(alerts, &HashMap::new()).await
    }

    /// Alerts the doctor raised, newest first.
    pub async fn list_for_doctor(&self, doctor: &User) -> DomainResult<Vec<AlertView>> {
        if doctor.as_doctor().is_none() {
            return Err(DomainError::forbidden("Only doctors can list their alerts"));
        }
        let alerts = self.alerts.list_by_doctor(doctor.id).await?;
        self.project(alerts, &HashMap::new()).await
    }

    /// Open alerts of active blood banks near the donor, most urgent first
    /// and newest first within an urgency.
    ///
    /// The center is `center` when given, else the donor's stored location.
    pub async fn nearby_alerts(
        &self,
        donor: &User,
        center: Option<GeoPoint>,
        radius_km: Option<f64>,
    ) -> DomainResult<Vec<AlertView>> {
        let profile = donor
            .as_donor()
            .ok_or_else(|| DomainError::forbidden("Only donors can search nearby alerts"))?;
        let radius_km = self.resolve_radius(radius_km, self.settings.nearby_search_radius_km)?;
        let center = center.unwrap_or(profile.location);

        let banks = self.banks.list_active().await?;
        let nearby = find_within_radius(center, radius_km, banks, |_| true);
        if nearby.is_empty() {
            return Ok(Vec::new());
        }

        let distances: HashMap<Uuid, f64> = nearby
            .iter()
            .map(|m| (m.candidate.id, m.distance_km))
            .collect();
        let bank_ids: Vec<Uuid> = distances.keys().copied().collect();

        let mut alerts = self.alerts.list_open_for_banks(&bank_ids, Utc::now()).await?;
        alerts.sort_by(|a, b| {
            b.urgency
                .cmp(&a.urgency)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        self.project(alerts, &distances).await
    }

    /// The response log of an alert. Only the targeted blood bank and the
    /// requesting doctor may read it.
    pub async fn list_responses(
        &self,
        caller: Caller<'_>,
        alert_id: Uuid,
    ) -> DomainResult<Vec<AlertResponse>> {
        let alert = self.find_alert(alert_id).await?;

        let allowed = match caller {
            Caller::BloodBank(bank) => bank.id == alert.blood_bank_id,
            Caller::User(user) => user.id == alert.doctor_id,
        };
        if !allowed {
            return Err(DomainError::forbidden(
                "Not authorized to view responses for this alert",
            ));
        }

        self.alerts.list_responses(alert_id).await
    }

    async fn find_alert(&self, alert_id: Uuid) -> DomainResult<Alert> {
        self.alerts
            .find_by_id(alert_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Alert not found"))
    }

    fn resolve_radius(&self, requested: Option<f64>, default: f64) -> DomainResult<f64> {
        let radius = requested.unwrap_or(default);
        if !radius.is_finite() || radius <= 0.0 || radius > self.settings.max_search_radius_km {
            return Err(DomainError::validation(format!(
                "Radius must be greater than 0 and at most {} km",
                self.settings.max_search_radius_km
            )));
        }
        Ok(radius)
    }

    /// Populates doctor, bank and accepted donor display fields. Each related
    /// record is loaded once per call.
    async fn project(
        &self,
        alerts: Vec<Alert>,
        distances: &HashMap<Uuid, f64>,
    ) -> DomainResult<Vec<AlertView>> {
        let mut users: HashMap<Uuid, Option<User>> = HashMap::new();
        let mut banks: HashMap<Uuid, Option<BloodBank>> = HashMap::new();
        let mut views = Vec::with_capacity(alerts.len());

        for alert in alerts {
            if !users.contains_key(&alert.doctor_id) {
                users.insert(alert.doctor_id, self.users.find_by_id(alert.doctor_id).await?);
            }
            if let Some(donor_id) = alert.accepted_donor_id {
                if !users.contains_key(&donor_id) {
                    users.insert(donor_id, self.users.find_by_id(donor_id).await?);
                }
            }
            if !banks.contains_key(&alert.blood_bank_id) {
                banks.insert(
                    alert.blood_bank_id,
                    self.banks.find_by_id(alert.blood_bank_id).await?,
                );
            }

            let doctor = users
                .get(&alert.doctor_id)
                .and_then(Option::as_ref)
                .and_then(|u| {
                    u.as_doctor().map(|d| DoctorSummary {
                        id: u.id,
                        name: u.name.clone(),
                        phone: u.phone.clone(),
                        hospital: d.hospital.clone(),
                    })
                });

            let accepted_donor = alert
                .accepted_donor_id
                .and_then(|id| users.get(&id))
                .and_then(Option::as_ref)
                .and_then(|u| {
                    u.blood_type().map(|blood_type| DonorSummary {
                        id: u.id,
                        name: u.name.clone(),
                        phone: u.phone.clone(),
                        blood_type,
                    })
                });

            let blood_bank = banks
                .get(&alert.blood_bank_id)
                .and_then(Option::as_ref)
                .map(|b| BloodBankSummary {
                    id: b.id,
                    hospital_name: b.hospital_name.clone(),
                    address: b.address.clone(),
                    phone: b.phone.clone(),
                });

            let distance_km = distances.get(&alert.blood_bank_id).copied();

            views.push(AlertView {
                alert,
                doctor,
                blood_bank,
                accepted_donor,
                distance_km,
            });
        }

        Ok(views)
    }
}

fn no_longer_active() -> DomainError {
    DomainError::invalid_state("Alert is no longer active")
}
