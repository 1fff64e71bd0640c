use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::service::{Beneficiary, Service, ServiceInput},
    services::residents::ResidentService,
};

const SERVICE_COLS: &str = "s.id, s.service_name, s.description, s.service_date, s.location,
     (SELECT COUNT(*) FROM service_beneficiaries sb WHERE sb.service_id = s.id) AS beneficiary_count,
     s.created_at";

pub const HAS_BENEFICIARIES: &str =
    "Cannot delete service. It has beneficiaries. Please remove them first.";

pub struct SocialServiceService;

impl SocialServiceService {
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLS} FROM services s
             ORDER BY s.service_date DESC NULLS LAST, s.service_name"
        ))
        .fetch_all(pool)
        .await?;
        Ok(services)
    }

    pub async fn get(pool: &PgPool, id: i64) -> AppResult<Service> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLS} FROM services s WHERE s.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found."))
    }

    pub async fn create(pool: &PgPool, input: &ServiceInput) -> AppResult<Service> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO services (service_name, description, service_date, location)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.service_name)
        .bind(&input.description)
        .bind(input.service_date)
        .bind(&input.location)
        .fetch_one(pool)
        .await?;
        Self::get(pool, id).await
    }

    pub async fn update(pool: &PgPool, id: i64, input: &ServiceInput) -> AppResult<Service> {
        let result = sqlx::query(
            "UPDATE services
             SET service_name = $1, description = $2, service_date = $3, location = $4
             WHERE id = $5",
        )
        .bind(&input.service_name)
        .bind(&input.description)
        .bind(input.service_date)
        .bind(&input.location)
        .bind(id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Service not found."));
        }
        Self::get(pool, id).await
    }

    /// Refused while any beneficiary is linked.
    pub async fn delete(pool: &PgPool, id: i64) -> AppResult<Service> {
        let mut tx = pool.begin().await?;

        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLS} FROM services s WHERE s.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found."))?;

        let linked: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM service_beneficiaries WHERE service_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if linked > 0 {
            return Err(AppError::Rejected(HAS_BENEFICIARIES.into()));
        }

        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(service)
    }

    pub async fn list_beneficiaries(pool: &PgPool, service_id: i64) -> AppResult<Vec<Beneficiary>> {
        let beneficiaries = sqlx::query_as::<_, Beneficiary>(
            "SELECT sb.id, sb.service_id, sb.resident_id, r.first_name, r.last_name, sb.notes
             FROM service_beneficiaries sb
             JOIN residents r ON r.id = sb.resident_id
             WHERE sb.service_id = $1
             ORDER BY r.last_name, r.first_name",
        )
        .bind(service_id)
        .fetch_all(pool)
        .await?;
        Ok(beneficiaries)
    }

    pub async fn add_beneficiary(
        pool: &PgPool,
        service_id: i64,
        resident_id: i64,
        notes: Option<String>,
    ) -> AppResult<Beneficiary> {
        Self::get(pool, service_id).await?;
        ResidentService::find(pool, resident_id)
            .await?
            .ok_or_else(|| AppError::not_found("Resident not found."))?;

        let beneficiary = sqlx::query_as::<_, Beneficiary>(
            "WITH inserted AS (
                 INSERT INTO service_beneficiaries (service_id, resident_id, notes)
                 VALUES ($1, $2, $3)
                 RETURNING id, service_id, resident_id, notes
             )
             SELECT i.id, i.service_id, i.resident_id, r.first_name, r.last_name, i.notes
             FROM inserted i
             JOIN residents r ON r.id = i.resident_id",
        )
        .bind(service_id)
        .bind(resident_id)
        .bind(&notes)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::from(e).on_foreign_key_violation("Service or resident not found."))?;
        Ok(beneficiary)
    }

    pub async fn remove_beneficiary(
        pool: &PgPool,
        service_id: i64,
        beneficiary_id: i64,
    ) -> AppResult<Beneficiary> {
        sqlx::query_as::<_, Beneficiary>(
            "WITH removed AS (
                 DELETE FROM service_beneficiaries
                 WHERE id = $1 AND service_id = $2
                 RETURNING id, service_id, resident_id, notes
             )
             SELECT d.id, d.service_id, d.resident_id, r.first_name, r.last_name, d.notes
             FROM removed d
             JOIN residents r ON r.id = d.resident_id",
        )
        .bind(beneficiary_id)
        .bind(service_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::not_found("Beneficiary not found or does not belong to this service.")
        })
    }
}
