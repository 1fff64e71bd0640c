use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::incident::{Incident, IncidentInput, IncidentListItem},
};

pub struct IncidentService;

impl IncidentService {
    /// Newest first, with the names of linked complainant and respondent residents.
    pub async fn list(pool: &PgPool) -> AppResult<Vec<IncidentListItem>> {
        let incidents = sqlx::query_as::<_, IncidentListItem>(
            "SELECT i.*,
                    c.first_name AS complainant_first_name,
                    c.last_name  AS complainant_last_name,
                    r.first_name AS respondent_first_name,
                    r.last_name  AS respondent_last_name
             FROM incidents i
             LEFT JOIN residents c ON c.id = i.complainant_id
             LEFT JOIN residents r ON r.id = i.respondent_id
             ORDER BY i.incident_date DESC, i.id DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(incidents)
    }

    pub async fn create(pool: &PgPool, input: &IncidentInput) -> AppResult<Incident> {
        check_parties(pool, input).await?;
        let incident = sqlx::query_as::<_, Incident>(
            "INSERT INTO incidents
             (incident_date, incident_type, location, description,
              complainant_id, complainant_name, respondent_id, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(input.incident_date)
        .bind(&input.incident_type)
        .bind(&input.location)
        .bind(&input.description)
        .bind(input.complainant_id)
        .bind(&input.complainant_name)
        .bind(input.respondent_id)
        .bind(&input.status)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::from(e).on_foreign_key_violation("Resident not found."))?;
        Ok(incident)
    }

    pub async fn update(pool: &PgPool, id: i64, input: &IncidentInput) -> AppResult<Incident> {
        check_parties(pool, input).await?;
        sqlx::query_as::<_, Incident>(
            "UPDATE incidents
             SET incident_date = $1, incident_type = $2, location = $3, description = $4,
                 complainant_id = $5, complainant_name = $6, respondent_id = $7, status = $8
             WHERE id = $9
             RETURNING *",
        )
        .bind(input.incident_date)
        .bind(&input.incident_type)
        .bind(&input.location)
        .bind(&input.description)
        .bind(input.complainant_id)
        .bind(&input.complainant_name)
        .bind(input.respondent_id)
        .bind(&input.status)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from(e).on_foreign_key_violation("Resident not found."))?
        .ok_or_else(|| AppError::not_found("Incident not found."))
    }

    pub async fn delete(pool: &PgPool, id: i64) -> AppResult<Incident> {
        sqlx::query_as::<_, Incident>("DELETE FROM incidents WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::not_found("Incident not found."))
    }
}

/// Linked residents must exist; a free-text complainant name needs no row.
async fn check_parties(pool: &PgPool, input: &IncidentInput) -> AppResult<()> {
    for (id, label) in [
        (input.complainant_id, "Complainant"),
        (input.respondent_id, "Respondent"),
    ] {
        let Some(id) = id else { continue };
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM residents WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(AppError::not_found(format!("{label} resident not found.")));
        }
    }
    Ok(())
}
