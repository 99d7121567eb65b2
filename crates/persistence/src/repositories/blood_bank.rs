//! Blood bank and inventory repository.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::blood_bank::{BloodBank, NewBloodBank};
use domain::models::BloodType;
use domain::ports::BloodBankStore;
use domain::{DomainError, DomainResult};

use crate::entities::BloodBankEntity;
use crate::metrics::QueryTimer;

/// Bank columns plus the inventory aggregated as `{"A+": 3, ...}`.
const SELECT_BANK: &str = r#"
    SELECT b.*,
           COALESCE(
               (SELECT jsonb_object_agg(i.blood_type, i.units)
                FROM blood_inventory i
                WHERE i.blood_bank_id = b.id),
               '{}'::jsonb
           ) AS inventory
    FROM blood_banks b
"#;

/// Repository for blood bank database operations.
#[derive(Clone)]
pub struct BloodBankRepository {
    pool: PgPool,
}

impl BloodBankRepository {
    /// Creates a new BloodBankRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        query_name: &str,
        condition: &str,
        value: &str,
    ) -> DomainResult<Option<BloodBank>> {
        let timer = QueryTimer::new(query_name);
        let sql = format!("{SELECT_BANK} WHERE {condition}");
        let result = sqlx::query_as::<_, BloodBankEntity>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result?.map(BloodBank::try_from).transpose()
    }
}

#[async_trait::async_trait]
impl BloodBankStore for BloodBankRepository {
    async fn insert(&self, bank: NewBloodBank) -> DomainResult<BloodBank> {
        let timer = QueryTimer::new("insert_blood_bank");
        let mut tx = self.pool.begin().await?;

        let inserted: Result<(Uuid,), sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO blood_banks (hospital_name, address, phone, email, password_hash, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&bank.hospital_name)
        .bind(&bank.address)
        .bind(&bank.phone)
        .bind(&bank.email)
        .bind(&bank.password_hash)
        .bind(bank.location.latitude)
        .bind(bank.location.longitude)
        .fetch_one(&mut *tx)
        .await;

        let (id,) = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(DomainError::Conflict(
                    "A blood bank with this email or hospital name already exists".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let blood_types: Vec<&str> = BloodType::ALL.iter().map(|bt| bt.as_str()).collect();
        sqlx::query(
            r#"
            INSERT INTO blood_inventory (blood_bank_id, blood_type, units)
            SELECT $1, bt, 0 FROM UNNEST($2::TEXT[]) AS bt
            "#,
        )
        .bind(id)
        .bind(blood_types)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::Storage("Inserted blood bank not found".into()))
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<BloodBank>> {
        let timer = QueryTimer::new("find_blood_bank_by_id");
        let sql = format!("{SELECT_BANK} WHERE b.id = $1");
        let result = sqlx::query_as::<_, BloodBankEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result?.map(BloodBank::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<BloodBank>> {
        self.fetch_one_where("find_blood_bank_by_email", "LOWER(b.email) = LOWER($1)", email)
            .await
    }

    async fn find_by_hospital_name(
        &self,
        hospital_name: &str,
    ) -> DomainResult<Option<BloodBank>> {
        self.fetch_one_where(
            "find_blood_bank_by_hospital_name",
            "b.hospital_name = $1",
            hospital_name,
        )
        .await
    }

    async fn list_active(&self) -> DomainResult<Vec<BloodBank>> {
        let timer = QueryTimer::new("list_active_blood_banks");
        let sql = format!("{SELECT_BANK} WHERE b.is_active = TRUE");
        let result = sqlx::query_as::<_, BloodBankEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result?.into_iter().map(BloodBank::try_from).collect()
    }

    async fn adjust_inventory(
        &self,
        blood_bank_id: Uuid,
        blood_type: BloodType,
        delta: i32,
    ) -> DomainResult<Option<i32>> {
        let timer = QueryTimer::new("adjust_blood_inventory");
        // Widened to BIGINT so the floor and overflow checks cannot themselves overflow.
        let result: Result<Option<(i32,)>, sqlx::Error> = sqlx::query_as(
            r#"
            UPDATE blood_inventory
            SET units = units + $3, updated_at = NOW()
            WHERE blood_bank_id = $1
              AND blood_type = $2
              AND units::BIGINT + $3 BETWEEN 0 AND 2147483647
            RETURNING units
            "#,
        )
        .bind(blood_bank_id)
        .bind(blood_type.as_str())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(|(units,)| units))
    }

    async fn update_push_token(&self, blood_bank_id: Uuid, token: &str) -> DomainResult<()> {
        let timer = QueryTimer::new("update_blood_bank_fcm_token");
        let result = sqlx::query(
            "UPDATE blood_banks SET fcm_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(blood_bank_id)
        .bind(token)
        .execute(&self.pool)
        .await;
        timer.record();
        if result?.rows_affected() == 0 {
            return Err(DomainError::not_found("Blood bank not found"));
        }
        Ok(())
    }
}
