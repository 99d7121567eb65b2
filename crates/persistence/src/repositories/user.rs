//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::user::{DonorStatus, NewUser, User, UserProfile};
use domain::models::{BloodType, GeoPoint};
use domain::ports::UserStore;
use domain::{DomainError, DomainResult};

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_domain(entity: UserEntity) -> DomainResult<User> {
        User::try_from(entity)
    }
}

#[async_trait::async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, user: NewUser) -> DomainResult<User> {
        let role = user.profile.role();
        let (donor, doctor) = match &user.profile {
            UserProfile::Donor(d) => (Some(d), None),
            UserProfile::Doctor(d) => (None, Some(d)),
        };

        let timer = QueryTimer::new("insert_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (
                name, email, password_hash, phone, role,
                blood_type, donor_status, latitude, longitude, medical_history,
                hospital, national_id, license_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(role.as_str())
        .bind(donor.map(|d| d.blood_type.as_str()))
        .bind(donor.map(|d| d.status.as_str()))
        .bind(donor.map(|d| d.location.latitude))
        .bind(donor.map(|d| d.location.longitude))
        .bind(donor.map(|d| d.medical_history.as_str()))
        .bind(doctor.map(|d| d.hospital.as_str()))
        .bind(doctor.and_then(|d| d.national_id.as_deref()))
        .bind(doctor.and_then(|d| d.license_number.as_deref()))
        .fetch_one(&self.pool)
        .await;
        timer.record();

        match result {
            Ok(entity) => Self::to_domain(entity),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DomainError::Conflict("Email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result?.map(Self::to_domain).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let timer = QueryTimer::new("find_user_by_email");
        let result =
            sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result?.map(Self::to_domain).transpose()
    }

    async fn find_available_donors(
        &self,
        blood_type: Option<BloodType>,
    ) -> DomainResult<Vec<User>> {
        let timer = QueryTimer::new("find_available_donors");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users
            WHERE role = 'donor'
              AND is_active = TRUE
              AND donor_status = 'available'
              AND ($1::TEXT IS NULL OR blood_type = $1)
            "#,
        )
        .bind(blood_type.map(|bt| bt.as_str()))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result?.into_iter().map(Self::to_domain).collect()
    }

    async fn update_location(&self, donor_id: Uuid, location: GeoPoint) -> DomainResult<User> {
        let timer = QueryTimer::new("update_donor_location");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET latitude = $2, longitude = $3, updated_at = NOW()
            WHERE id = $1 AND role = 'donor'
            RETURNING *
            "#,
        )
        .bind(donor_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?
            .map(Self::to_domain)
            .transpose()?
            .ok_or_else(|| DomainError::not_found("Donor not found"))
    }

    async fn update_status(&self, donor_id: Uuid, status: DonorStatus) -> DomainResult<User> {
        let timer = QueryTimer::new("update_donor_status");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET donor_status = $2, updated_at = NOW()
            WHERE id = $1 AND role = 'donor'
            RETURNING *
            "#,
        )
        .bind(donor_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?
            .map(Self::to_domain)
            .transpose()?
            .ok_or_else(|| DomainError::not_found("Donor not found"))
    }

    async fn update_push_token(&self, user_id: Uuid, token: &str) -> DomainResult<()> {
        let timer = QueryTimer::new("update_user_fcm_token");
        let result = sqlx::query(
            "UPDATE users SET fcm_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await;
        timer.record();
        if result?.rows_affected() == 0 {
            return Err(DomainError::not_found("User not found"));
        }
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid) -> DomainResult<()> {
        let timer = QueryTimer::new("record_user_login");
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result?;
        Ok(())
    }
}
