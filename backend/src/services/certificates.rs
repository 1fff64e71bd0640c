use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{
        certificate::{Certificate, CertificateInput, CertificateListItem},
        resident::Resident,
    },
    services::residents::ResidentService,
};

pub struct CertificateService;

impl CertificateService {
    pub async fn list(pool: &PgPool) -> AppResult<Vec<CertificateListItem>> {
        let certificates = sqlx::query_as::<_, CertificateListItem>(
            "SELECT c.*, r.first_name, r.last_name, r.middle_name
             FROM certificates c
             JOIN residents r ON r.id = c.resident_id
             ORDER BY c.issue_date DESC, c.created_at DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(certificates)
    }

    /// Issuance history of one resident. An unknown resident is a 404, not an empty list.
    pub async fn for_resident(pool: &PgPool, resident_id: i64) -> AppResult<Vec<Certificate>> {
        ResidentService::find(pool, resident_id)
            .await?
            .ok_or_else(|| AppError::not_found("Resident not found."))?;
        ResidentService::certificates(pool, resident_id).await
    }

    /// Records an issued certificate and returns it with the resident it was issued to.
    pub async fn create(
        pool: &PgPool,
        input: &CertificateInput,
    ) -> AppResult<(Certificate, Resident)> {
        let resident = ResidentService::find(pool, input.resident_id)
            .await?
            .ok_or_else(|| AppError::not_found("Resident not found."))?;

        let certificate = sqlx::query_as::<_, Certificate>(
            "INSERT INTO certificates
             (resident_id, certificate_type, purpose, issue_date, place_issued, or_number, amount)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(input.resident_id)
        .bind(&input.certificate_type)
        .bind(&input.purpose)
        .bind(input.issue_date)
        .bind(&input.place_issued)
        .bind(&input.or_number)
        .bind(input.amount)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::from(e).on_foreign_key_violation("Resident not found."))?;

        Ok((certificate, resident))
    }
}
