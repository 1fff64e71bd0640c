use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::official::{Official, OfficialInput},
};

pub struct OfficialService;

impl OfficialService {
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Official>> {
        let officials =
            sqlx::query_as::<_, Official>("SELECT * FROM officials ORDER BY order_no, position, full_name")
                .fetch_all(pool)
                .await?;
        Ok(officials)
    }

    pub async fn create(
        pool: &PgPool,
        input: &OfficialInput,
        signature_path: Option<&str>,
        picture_path: Option<&str>,
    ) -> AppResult<Official> {
        let official = sqlx::query_as::<_, Official>(
            "INSERT INTO officials
             (full_name, position, order_no, is_captain, is_secretary, signature_path, picture_path)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(&input.full_name)
        .bind(&input.position)
        .bind(input.order_no)
        .bind(input.is_captain)
        .bind(input.is_secretary)
        .bind(signature_path)
        .bind(picture_path)
        .fetch_one(pool)
        .await?;
        Ok(official)
    }

    /// A `None` path keeps whatever file the official already has.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        input: &OfficialInput,
        signature_path: Option<&str>,
        picture_path: Option<&str>,
    ) -> AppResult<Official> {
        sqlx::query_as::<_, Official>(
            "UPDATE officials
             SET full_name = $1, position = $2, order_no = $3, is_captain = $4,
                 is_secretary = $5,
                 signature_path = COALESCE($6, signature_path),
                 picture_path = COALESCE($7, picture_path)
             WHERE id = $8
             RETURNING *",
        )
        .bind(&input.full_name)
        .bind(&input.position)
        .bind(input.order_no)
        .bind(input.is_captain)
        .bind(input.is_secretary)
        .bind(signature_path)
        .bind(picture_path)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Official not found."))
    }

    pub async fn exists(pool: &PgPool, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM officials WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    pub async fn delete(pool: &PgPool, id: i64) -> AppResult<Official> {
        sqlx::query_as::<_, Official>("DELETE FROM officials WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::not_found("Official not found."))
    }
}
