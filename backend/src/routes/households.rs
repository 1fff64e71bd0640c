use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{
        auth::AuthenticatedUser,
        household::{
            AddMemberRequest, Household, HouseholdMember, HouseholdRequest,
            HouseholdWithResidents, HouseholdWithResidentsRequest,
        },
        resident::display_name,
    },
    routes::{message, AppJson},
    services::{households::HouseholdService, residents::today},
    AppState,
};

pub async fn list_households(State(state): State<AppState>) -> AppResult<Json<Vec<Household>>> {
    Ok(Json(HouseholdService::list(&state.db).await?))
}

pub async fn get_household(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Household>> {
    Ok(Json(HouseholdService::get(&state.db, id).await?))
}

pub async fn create_household(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<HouseholdRequest>,
) -> AppResult<(StatusCode, Json<Household>)> {
    let input = body.validate()?;
    let household = HouseholdService::create(&state.db, &input).await?;
    state.audit.record(
        &user,
        format!("created a new household: {}", household.household_name),
    );
    Ok((StatusCode::CREATED, Json(household)))
}

pub async fn update_household(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    AppJson(body): AppJson<HouseholdRequest>,
) -> AppResult<Json<Household>> {
    let input = body.validate()?;
    let household = HouseholdService::update(&state.db, id, &input).await?;
    state.audit.record(
        &user,
        format!("updated household: {}", household.household_name),
    );
    Ok(Json(household))
}

pub async fn delete_household(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let household = HouseholdService::delete(&state.db, id).await?;
    state.audit.record(
        &user,
        format!("deleted household: {}", household.household_name),
    );
    Ok(message("Household deleted successfully."))
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<HouseholdMember>>> {
    Ok(Json(HouseholdService::list_members(&state.db, id).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    AppJson(body): AppJson<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<HouseholdMember>)> {
    let (resident_id, relation) = body.validate()?;
    let member = HouseholdService::add_member(&state.db, id, resident_id, relation).await?;
    let name = display_name(&member.first_name, member.middle_name.as_deref(), &member.last_name);
    state.audit.record(&user, format!("added {name} to household"));
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, member_id)): Path<(i64, i64)>,
) -> AppResult<Json<Value>> {
    let member = HouseholdService::remove_member(&state.db, id, member_id).await?;
    let name = display_name(&member.first_name, member.middle_name.as_deref(), &member.last_name);
    state.audit.record(&user, format!("removed {name} from household"));
    Ok(message("Household member removed successfully."))
}

pub async fn create_household_with_residents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(body): AppJson<HouseholdWithResidentsRequest>,
) -> AppResult<(StatusCode, Json<HouseholdWithResidents>)> {
    let input = body.validate(today())?;
    let created = HouseholdService::create_with_residents(&state.db, input).await?;
    state.audit.record(
        &user,
        format!(
            "created household \"{}\" with {} resident(s)",
            created.household.household_name,
            created.residents.len()
        ),
    );
    Ok((StatusCode::CREATED, Json(created)))
}
