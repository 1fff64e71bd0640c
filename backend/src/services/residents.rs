use chrono::{Datelike, Local, NaiveDate};
use sqlx::{PgExecutor, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{
        certificate::Certificate,
        resident::{Resident, ResidentInput},
    },
};

/// Whole years between `birthdate` and `today`, decremented when this year's
/// birthday has not been reached yet.
pub fn calendar_age(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Rows whose cached age disagrees with their birthdate, as `(id, age)` pairs.
pub fn stale_ages<I>(rows: I, today: NaiveDate) -> Vec<(i64, i32)>
where
    I: IntoIterator<Item = (i64, Option<NaiveDate>, Option<i32>)>,
{
    rows.into_iter()
        .filter_map(|(id, birthdate, age)| {
            let fresh = calendar_age(birthdate?, today);
            (age != Some(fresh)).then_some((id, fresh))
        })
        .collect()
}

/// Persists recomputed ages in a single statement.
pub async fn persist_ages(pool: &PgPool, updates: &[(i64, i32)]) -> AppResult<()> {
    if updates.is_empty() {
        return Ok(());
    }
    let (ids, ages): (Vec<i64>, Vec<i32>) = updates.iter().copied().unzip();
    sqlx::query(
        "UPDATE residents r SET age = v.age
         FROM UNNEST($1::BIGINT[], $2::INT[]) AS v(id, age)
         WHERE r.id = v.id",
    )
    .bind(&ids)
    .bind(&ages)
    .execute(pool)
    .await?;
    Ok(())
}

pub struct ResidentService;

impl ResidentService {
    /// Lists residents, repairing stale cached ages on the way out.
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Resident>> {
        let mut residents = sqlx::query_as::<_, Resident>(
            "SELECT * FROM residents ORDER BY last_name, first_name",
        )
        .fetch_all(pool)
        .await?;
        Self::repair_ages(pool, &mut residents).await?;
        Ok(residents)
    }

    pub async fn get(pool: &PgPool, id: i64) -> AppResult<Resident> {
        let mut resident = Self::find(pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Resident not found."))?;
        Self::repair_ages(pool, std::slice::from_mut(&mut resident)).await?;
        Ok(resident)
    }

    pub async fn find<'e>(db: impl PgExecutor<'e>, id: i64) -> AppResult<Option<Resident>> {
        let resident = sqlx::query_as::<_, Resident>("SELECT * FROM residents WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(resident)
    }

    pub async fn create(pool: &PgPool, input: &ResidentInput) -> AppResult<Resident> {
        Self::insert(pool, input, today()).await
    }

    /// Inserts one resident; the age column is derived here, never taken from the client.
    pub async fn insert<'e>(
        db: impl PgExecutor<'e>,
        input: &ResidentInput,
        today: NaiveDate,
    ) -> AppResult<Resident> {
        let age = input.birthdate.map(|b| calendar_age(b, today));
        let resident = sqlx::query_as::<_, Resident>(
            "INSERT INTO residents
             (last_name, first_name, middle_name, suffix, nickname, sex, birthdate, age,
              civil_status, employment_status, registered_voter, resident_status,
              is_senior_citizen, is_pwd, contact_no, address)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *",
        )
        .bind(&input.last_name)
        .bind(&input.first_name)
        .bind(&input.middle_name)
        .bind(&input.suffix)
        .bind(&input.nickname)
        .bind(input.sex.as_str())
        .bind(input.birthdate)
        .bind(age)
        .bind(&input.civil_status)
        .bind(&input.employment_status)
        .bind(&input.registered_voter)
        .bind(&input.resident_status)
        .bind(input.is_senior_citizen)
        .bind(input.is_pwd)
        .bind(&input.contact_no)
        .bind(&input.address)
        .fetch_one(db)
        .await?;
        Ok(resident)
    }

    /// Full replacement of a resident row.
    pub async fn update(pool: &PgPool, id: i64, input: &ResidentInput) -> AppResult<Resident> {
        let age = input.birthdate.map(|b| calendar_age(b, today()));
        sqlx::query_as::<_, Resident>(
            "UPDATE residents
             SET last_name = $1, first_name = $2, middle_name = $3, suffix = $4, nickname = $5,
                 sex = $6, birthdate = $7, age = $8, civil_status = $9, employment_status = $10,
                 registered_voter = $11, resident_status = $12, is_senior_citizen = $13,
                 is_pwd = $14, contact_no = $15, address = $16
             WHERE id = $17
             RETURNING *",
        )
        .bind(&input.last_name)
        .bind(&input.first_name)
        .bind(&input.middle_name)
        .bind(&input.suffix)
        .bind(&input.nickname)
        .bind(input.sex.as_str())
        .bind(input.birthdate)
        .bind(age)
        .bind(&input.civil_status)
        .bind(&input.employment_status)
        .bind(&input.registered_voter)
        .bind(&input.resident_status)
        .bind(input.is_senior_citizen)
        .bind(input.is_pwd)
        .bind(&input.contact_no)
        .bind(&input.address)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Resident not found."))
    }

    pub async fn certificates(pool: &PgPool, resident_id: i64) -> AppResult<Vec<Certificate>> {
        let certificates = sqlx::query_as::<_, Certificate>(
            "SELECT * FROM certificates
             WHERE resident_id = $1
             ORDER BY issue_date DESC, created_at DESC",
        )
        .bind(resident_id)
        .fetch_all(pool)
        .await?;
        Ok(certificates)
    }

    /// Read-with-repair: rewrites stale `age` values in `residents` and in storage.
    async fn repair_ages(pool: &PgPool, residents: &mut [Resident]) -> AppResult<()> {
        let today = today();
        let updates = stale_ages(
            residents.iter().map(|r| (r.id, r.birthdate, r.age)),
            today,
        );
        persist_ages(pool, &updates).await?;
        for resident in residents.iter_mut() {
            if let Some(&(_, age)) = updates.iter().find(|(id, _)| *id == resident.id) {
                resident.age = Some(age);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_decrements_before_birthday() {
        assert_eq!(calendar_age(date(1990, 10, 16), date(2026, 10, 15)), 35);
        assert_eq!(calendar_age(date(1990, 10, 15), date(2026, 10, 15)), 36);
        assert_eq!(calendar_age(date(1990, 3, 1), date(2026, 10, 15)), 36);
    }

    #[test]
    fn leap_day_birthdays_count_from_march() {
        assert_eq!(calendar_age(date(2004, 2, 29), date(2026, 2, 28)), 21);
        assert_eq!(calendar_age(date(2004, 2, 29), date(2026, 3, 1)), 22);
        assert_eq!(calendar_age(date(2004, 2, 29), date(2028, 2, 29)), 24);
    }

    #[test]
    fn stale_rows_are_detected() {
        let today = date(2026, 10, 15);
        let rows = vec![
            (1, Some(date(1990, 1, 1)), Some(36)),
            (2, Some(date(1990, 1, 1)), Some(35)),
            (3, None, None),
            (4, Some(date(2000, 12, 25)), None),
        ];
        assert_eq!(stale_ages(rows, today), vec![(2, 36), (4, 25)]);
    }
}
