use crate::dtos::credentials::CredentialListParams;
use crate::dtos::{
    ActivityResponse, CreateCredentialRequest, CredentialView, GrantRequest,
    UpdateCredentialRequest,
};
use crate::models::{Principal, RoleGrant, RoleLevel, SubjectType};
use crate::services::CredentialVault;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn list_credentials(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<CredentialListParams>,
) -> Result<Json<Vec<CredentialView>>, AppError> {
    let credentials = state
        .vault
        .list(&state.access, &principal, params.kind)
        .await?;
    Ok(Json(credentials))
}

pub async fn create_credential(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credential = state.vault.create(request, &principal.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CredentialVault::redact(&credential)),
    ))
}

pub async fn get_credential(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<CredentialView>, AppError> {
    let credential = state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Read)
        .await?;
    Ok(Json(CredentialVault::redact(&credential)))
}

pub async fn update_credential(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(patch): Json<UpdateCredentialRequest>,
) -> Result<Json<CredentialView>, AppError> {
    state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Admin)
        .await?;
    let credential = state.vault.update(&id, patch, &principal.user_id).await?;
    Ok(Json(CredentialVault::redact(&credential)))
}

pub async fn delete_credential(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Admin)
        .await?;
    state.vault.delete(&id, &principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn owner_users(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let credential = state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Read)
        .await?;
    Ok(Json(CredentialVault::owner_users(&credential)))
}

pub async fn owner_teams(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let credential = state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Read)
        .await?;
    Ok(Json(CredentialVault::owner_teams(&credential)))
}

pub async fn grant_access(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<GrantRequest>,
) -> Result<Json<CredentialView>, AppError> {
    state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Admin)
        .await?;
    let credential = state
        .vault
        .grant(&id, RoleGrant::from(request), &principal.user_id)
        .await?;
    Ok(Json(CredentialVault::redact(&credential)))
}

pub async fn revoke_access(
    State(state): State<AppState>,
    principal: Principal,
    Path((id, subject_type, subject_id)): Path<(String, SubjectType, String)>,
) -> Result<Json<CredentialView>, AppError> {
    state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Admin)
        .await?;
    let credential = state
        .vault
        .revoke(&id, subject_type, &subject_id, &principal.user_id)
        .await?;
    Ok(Json(CredentialVault::redact(&credential)))
}

pub async fn activity_stream(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    state
        .vault
        .authorize(&state.access, &principal, &id, RoleLevel::Read)
        .await?;
    let entries = state.activity.for_object(&id).await?;
    Ok(Json(entries.into_iter().map(ActivityResponse::from).collect()))
}
