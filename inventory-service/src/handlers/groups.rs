use crate::dtos::groups::GroupListParams;
use crate::dtos::{
    ActivityResponse, CascadeDeleteResponse, GroupRequest, GroupResponse, PatchGroupRequest,
};
use crate::models::{Group, Principal};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use service_core::error::AppError;

fn responses(groups: Vec<Group>) -> Vec<GroupResponse> {
    groups.into_iter().map(GroupResponse::from).collect()
}

pub async fn list_groups(
    State(state): State<AppState>,
    _principal: Principal,
    Query(params): Query<GroupListParams>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let groups = state.groups.list(params.inventory_id.as_deref()).await?;
    Ok(Json(responses(groups)))
}

pub async fn create_group(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<GroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let group = state.groups.create(request, &principal.user_id).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

pub async fn get_group(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<GroupResponse>, AppError> {
    Ok(Json(state.groups.get(&id).await?.into()))
}

pub async fn replace_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<GroupRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = state.groups.update(&id, request, &principal.user_id).await?;
    Ok(Json(group.into()))
}

pub async fn patch_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(patch): Json<PatchGroupRequest>,
) -> Result<Json<GroupResponse>, AppError> {
    let group = state.groups.patch(&id, patch, &principal.user_id).await?;
    Ok(Json(group.into()))
}

pub async fn delete_group(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<CascadeDeleteResponse>, AppError> {
    let summary = state
        .groups
        .cascade_delete(&id, &principal.user_id)
        .await?;
    Ok(Json(summary.into()))
}

pub async fn group_variables(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Map<String, Value>>, AppError> {
    Ok(Json(state.groups.variables(&id).await?))
}

pub async fn group_children(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    Ok(Json(responses(state.groups.children(&id).await?)))
}

pub async fn group_ancestors(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    Ok(Json(responses(state.groups.ancestors(&id).await?)))
}

pub async fn group_activity_stream(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    let group = state.groups.get(&id).await?;
    let entries = state.activity.for_object(&group.id).await?;
    Ok(Json(entries.into_iter().map(ActivityResponse::from).collect()))
}
