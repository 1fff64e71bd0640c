use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::barangay_profile::{BarangayProfile, BarangayProfileInput},
};

pub struct BarangayProfileService;

impl BarangayProfileService {
    pub async fn get(pool: &PgPool) -> AppResult<Option<BarangayProfile>> {
        let profile = sqlx::query_as::<_, BarangayProfile>(
            "SELECT * FROM barangay_profile ORDER BY id LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        Ok(profile)
    }

    /// Updates the single profile row, or creates it on first save.
    pub async fn upsert(pool: &PgPool, input: &BarangayProfileInput) -> AppResult<BarangayProfile> {
        let mut tx = pool.begin().await?;

        // Serializes concurrent first saves so only one row is ever created.
        sqlx::query("LOCK TABLE barangay_profile IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM barangay_profile ORDER BY id LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let profile = match existing {
            Some(id) => {
                sqlx::query_as::<_, BarangayProfile>(
                    "UPDATE barangay_profile
                     SET barangay_name = $1, municipality = $2, province = $3, place_issued = $4
                     WHERE id = $5
                     RETURNING *",
                )
                .bind(&input.barangay_name)
                .bind(&input.municipality)
                .bind(&input.province)
                .bind(&input.place_issued)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, BarangayProfile>(
                    "INSERT INTO barangay_profile (barangay_name, municipality, province, place_issued)
                     VALUES ($1, $2, $3, $4)
                     RETURNING *",
                )
                .bind(&input.barangay_name)
                .bind(&input.municipality)
                .bind(&input.province)
                .bind(&input.place_issued)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(profile)
    }
}
