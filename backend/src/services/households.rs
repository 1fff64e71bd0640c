use sqlx::{PgExecutor, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::household::{
        clamp_num_members, Household, HouseholdInput, HouseholdMember, HouseholdWithResidents,
        HouseholdWithResidentsInput, Relation,
    },
    services::residents::{self, ResidentService},
};

/// Household columns plus the live member count. The table must be aliased `h`.
const HOUSEHOLD_COLS: &str = "h.id, h.household_name, h.address, h.purok, h.num_members,
     (SELECT COUNT(*) FROM household_members hm WHERE hm.household_id = h.id) AS member_count,
     h.created_at";

const MEMBER_COLS: &str = "hm.id, hm.household_id, hm.resident_id, hm.relation_to_head,
     r.first_name, r.last_name, r.middle_name, r.suffix, r.nickname, r.sex, r.birthdate, r.age,
     r.civil_status, r.employment_status, r.registered_voter, r.resident_status,
     r.is_senior_citizen, r.is_pwd, r.contact_no, r.address";

pub const LAST_MEMBER: &str =
    "Cannot remove the last member from a household. Delete the household instead.";
pub const DUPLICATE_MEMBER: &str = "This resident is already a member of this household.";

pub struct HouseholdService;

impl HouseholdService {
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Household>> {
        let households = sqlx::query_as::<_, Household>(&format!(
            "SELECT {HOUSEHOLD_COLS} FROM households h ORDER BY h.household_name"
        ))
        .fetch_all(pool)
        .await?;
        Ok(households)
    }

    pub async fn get(pool: &PgPool, id: i64) -> AppResult<Household> {
        Self::find(pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Household not found."))
    }

    async fn find<'e>(db: impl PgExecutor<'e>, id: i64) -> AppResult<Option<Household>> {
        let household = sqlx::query_as::<_, Household>(&format!(
            "SELECT {HOUSEHOLD_COLS} FROM households h WHERE h.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(household)
    }

    /// A new household starts with a declared size of at least one.
    pub async fn create(pool: &PgPool, input: &HouseholdInput) -> AppResult<Household> {
        let num_members = input.num_members.unwrap_or(1).max(1);
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO households (household_name, address, purok, num_members)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.household_name)
        .bind(&input.address)
        .bind(&input.purok)
        .bind(num_members)
        .fetch_one(pool)
        .await?;
        Self::get(pool, id).await
    }

    /// `num_members` is clamped to the member count read inside the same transaction.
    pub async fn update(pool: &PgPool, id: i64, input: &HouseholdInput) -> AppResult<Household> {
        let mut tx = pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM households WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::not_found("Household not found."));
        }

        let actual = count_members(&mut *tx, id).await?;
        let num_members = clamp_num_members(input.num_members, actual);

        sqlx::query(
            "UPDATE households
             SET household_name = $1, address = $2, purok = $3, num_members = $4
             WHERE id = $5",
        )
        .bind(&input.household_name)
        .bind(&input.address)
        .bind(&input.purok)
        .bind(num_members)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let household = Self::find(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Household not found."))?;
        tx.commit().await?;
        Ok(household)
    }

    /// Deletes the household and its memberships; the residents stay.
    pub async fn delete(pool: &PgPool, id: i64) -> AppResult<Household> {
        let household = Self::get(pool, id).await?;
        let result = sqlx::query("DELETE FROM households WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Household not found."));
        }
        Ok(household)
    }

    /// Members with their resident fields; stale ages are repaired.
    pub async fn list_members(pool: &PgPool, household_id: i64) -> AppResult<Vec<HouseholdMember>> {
        let mut members = sqlx::query_as::<_, HouseholdMember>(&format!(
            "SELECT {MEMBER_COLS}
             FROM household_members hm
             JOIN residents r ON r.id = hm.resident_id
             WHERE hm.household_id = $1
             ORDER BY r.last_name, r.first_name"
        ))
        .bind(household_id)
        .fetch_all(pool)
        .await?;

        let updates = residents::stale_ages(
            members.iter().map(|m| (m.resident_id, m.birthdate, m.age)),
            residents::today(),
        );
        residents::persist_ages(pool, &updates).await?;
        for member in members.iter_mut() {
            if let Some(&(_, age)) = updates.iter().find(|(id, _)| *id == member.resident_id) {
                member.age = Some(age);
            }
        }
        Ok(members)
    }

    pub async fn add_member(
        pool: &PgPool,
        household_id: i64,
        resident_id: i64,
        relation: Option<Relation>,
    ) -> AppResult<HouseholdMember> {
        Self::get(pool, household_id).await?;
        ResidentService::get(pool, resident_id).await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM household_members WHERE household_id = $1 AND resident_id = $2)",
        )
        .bind(household_id)
        .bind(resident_id)
        .fetch_one(pool)
        .await?;
        if exists {
            return Err(AppError::Conflict(DUPLICATE_MEMBER.into()));
        }

        let mut tx = pool.begin().await?;
        let member_id: i64 = sqlx::query_scalar(
            "INSERT INTO household_members (household_id, resident_id, relation_to_head)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(household_id)
        .bind(resident_id)
        .bind(relation.map(Relation::as_str))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from(e).on_unique_violation(DUPLICATE_MEMBER))?;

        sqlx::query(
            "UPDATE households
             SET num_members = GREATEST(num_members,
                 (SELECT COUNT(*) FROM household_members WHERE household_id = $1)::INT)
             WHERE id = $1",
        )
        .bind(household_id)
        .execute(&mut *tx)
        .await?;

        let member = find_member(&mut *tx, household_id, member_id)
            .await?
            .ok_or_else(|| AppError::not_found("Household member not found."))?;
        tx.commit().await?;
        Ok(member)
    }

    /// Refuses to remove the sole remaining member. The household row is locked
    /// so two concurrent removals cannot both pass the count check.
    pub async fn remove_member(
        pool: &PgPool,
        household_id: i64,
        member_id: i64,
    ) -> AppResult<HouseholdMember> {
        let mut tx = pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM households WHERE id = $1 FOR UPDATE")
                .bind(household_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::not_found("Household not found."));
        }

        let member = find_member(&mut *tx, household_id, member_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "Household member not found or does not belong to this household.",
                )
            })?;

        if count_members(&mut *tx, household_id).await? <= 1 {
            return Err(AppError::Rejected(LAST_MEMBER.into()));
        }

        sqlx::query("DELETE FROM household_members WHERE id = $1 AND household_id = $2")
            .bind(member_id)
            .bind(household_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE households
             SET num_members = (SELECT COUNT(*) FROM household_members WHERE household_id = $1)::INT
             WHERE id = $1",
        )
        .bind(household_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(member)
    }

    /// Household, residents and memberships in one transaction. Any failure
    /// rolls everything back when `tx` is dropped.
    pub async fn create_with_residents(
        pool: &PgPool,
        input: HouseholdWithResidentsInput,
    ) -> AppResult<HouseholdWithResidents> {
        let HouseholdWithResidentsInput {
            household,
            residents: entries,
        } = input;
        let today = residents::today();
        let num_members = household
            .num_members
            .filter(|n| *n > 0)
            .unwrap_or_else(|| i32::try_from(entries.len()).unwrap_or(i32::MAX));

        let mut tx = pool.begin().await?;

        let household_id: i64 = sqlx::query_scalar(
            "INSERT INTO households (household_name, address, purok, num_members)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&household.household_name)
        .bind(&household.address)
        .bind(&household.purok)
        .bind(num_members)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(entries.len());
        for (position, (resident, relation)) in entries.iter().enumerate() {
            let row = ResidentService::insert(&mut *tx, resident, today)
                .await
                .map_err(|e| resident_failure(position + 1, e))?;

            sqlx::query(
                "INSERT INTO household_members (household_id, resident_id, relation_to_head)
                 VALUES ($1, $2, $3)",
            )
            .bind(household_id)
            .bind(row.id)
            .bind(relation.map(Relation::as_str))
            .execute(&mut *tx)
            .await
            .map_err(|e| resident_failure(position + 1, AppError::from(e)))?;

            created.push(row);
        }

        let household = Self::find(&mut *tx, household_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("household vanished mid-transaction")))?;
        tx.commit().await?;

        tracing::info!(
            household_id,
            residents = created.len(),
            "created household with residents"
        );
        Ok(HouseholdWithResidents {
            household,
            residents: created,
        })
    }
}

async fn count_members<'e>(db: impl PgExecutor<'e>, household_id: i64) -> AppResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM household_members WHERE household_id = $1")
            .bind(household_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

async fn find_member<'e>(
    db: impl PgExecutor<'e>,
    household_id: i64,
    member_id: i64,
) -> AppResult<Option<HouseholdMember>> {
    let member = sqlx::query_as::<_, HouseholdMember>(&format!(
        "SELECT {MEMBER_COLS}
         FROM household_members hm
         JOIN residents r ON r.id = hm.resident_id
         WHERE hm.id = $1 AND hm.household_id = $2"
    ))
    .bind(member_id)
    .bind(household_id)
    .fetch_optional(db)
    .await?;
    Ok(member)
}

/// Rows rejected by the database are reported against the resident that caused them.
/// Connection and server failures stay 500s.
fn resident_failure(position: usize, err: AppError) -> AppError {
    if err.is_rejected_row() {
        tracing::error!("household-with-residents failed at resident #{position}: {err}");
        return AppError::Validation(format!("Resident #{position}: could not be saved."));
    }
    err
}
