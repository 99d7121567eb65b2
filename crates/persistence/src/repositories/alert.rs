//! Alert and alert response repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::alert::{Alert, AlertResponse, NewAlert, NewAlertResponse};
use domain::ports::AlertStore;
use domain::DomainResult;

use crate::entities::{AlertEntity, AlertResponseEntity};
use crate::metrics::QueryTimer;

/// Repository for alert database operations.
#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Creates a new AlertRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_domain_all(rows: Vec<AlertEntity>) -> DomainResult<Vec<Alert>> {
        rows.into_iter().map(Alert::try_from).collect()
    }
}

#[async_trait::async_trait]
impl AlertStore for AlertRepository {
    async fn insert(&self, alert: NewAlert) -> DomainResult<Alert> {
        let timer = QueryTimer::new("insert_alert");
        let result = sqlx::query_as::<_, AlertEntity>(
            r#"
            INSERT INTO alerts (
                blood_type, quantity, urgency,
                patient_name, patient_age, patient_condition,
                doctor_id, blood_bank_id, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(alert.blood_type.as_str())
        .bind(alert.quantity)
        .bind(alert.urgency.as_str())
        .bind(&alert.patient_info.name)
        .bind(alert.patient_info.age)
        .bind(&alert.patient_info.condition)
        .bind(alert.doctor_id)
        .bind(alert.blood_bank_id)
        .bind(alert.expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Alert::try_from(result?)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Alert>> {
        let timer = QueryTimer::new("find_alert_by_id");
        let result = sqlx::query_as::<_, AlertEntity>("SELECT * FROM alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result?.map(Alert::try_from).transpose()
    }

    async fn list_by_blood_bank(&self, blood_bank_id: Uuid) -> DomainResult<Vec<Alert>> {
        let timer = QueryTimer::new("list_alerts_by_blood_bank");
        let result = sqlx::query_as::<_, AlertEntity>(
            r#"
            SELECT * FROM alerts
            WHERE blood_bank_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(blood_bank_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Self::to_domain_all(result?)
    }

    async fn list_by_doctor(&self, doctor_id: Uuid) -> DomainResult<Vec<Alert>> {
        let timer = QueryTimer::new("list_alerts_by_doctor");
        let result = sqlx::query_as::<_, AlertEntity>(
            r#"
            SELECT * FROM alerts
            WHERE doctor_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Self::to_domain_all(result?)
    }

    async fn list_open_for_banks(
        &self,
        blood_bank_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<Alert>> {
        if blood_bank_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("list_open_alerts_for_banks");
        let result = sqlx::query_as::<_, AlertEntity>(
            r#"
            SELECT * FROM alerts
            WHERE blood_bank_id = ANY($1)
              AND status = 'pending'
              AND expires_at > $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(blood_bank_ids)
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Self::to_domain_all(result?)
    }

    async fn accept_donor(
        &self,
        alert_id: Uuid,
        donor_id: Uuid,
        message: &str,
    ) -> DomainResult<Option<Alert>> {
        let timer = QueryTimer::new("accept_alert_donor");
        let mut tx = self.pool.begin().await?;

        // Only a pending row matches, so at most one concurrent caller gets it back.
        let updated = sqlx::query_as::<_, AlertEntity>(
            r#"
            UPDATE alerts
            SET status = 'fulfilled', accepted_donor_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(alert_id)
        .bind(donor_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(entity) = updated else {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO alert_responses (alert_id, donor_id, status, message)
            VALUES ($1, $2, 'accepted', $3)
            "#,
        )
        .bind(alert_id)
        .bind(donor_id)
        .bind(message)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        Alert::try_from(entity).map(Some)
    }

    async fn record_response(&self, response: NewAlertResponse) -> DomainResult<AlertResponse> {
        let timer = QueryTimer::new("insert_alert_response");
        let result = sqlx::query_as::<_, AlertResponseEntity>(
            r#"
            INSERT INTO alert_responses (alert_id, donor_id, status, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(response.alert_id)
        .bind(response.donor_id)
        .bind(response.status.as_str())
        .bind(&response.message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        AlertResponse::try_from(result?)
    }

    async fn list_responses(&self, alert_id: Uuid) -> DomainResult<Vec<AlertResponse>> {
        let timer = QueryTimer::new("list_alert_responses");
        let result = sqlx::query_as::<_, AlertResponseEntity>(
            r#"
            SELECT * FROM alert_responses
            WHERE alert_id = $1
            ORDER BY responded_at ASC
            "#,
        )
        .bind(alert_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result?.into_iter().map(AlertResponse::try_from).collect()
    }
}
