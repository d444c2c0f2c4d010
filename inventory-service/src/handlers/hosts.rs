use crate::dtos::hosts::HostListParams;
use crate::dtos::{ActivityResponse, GroupResponse, HostRequest, HostResponse, PatchHostRequest};
use crate::models::Principal;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use service_core::error::AppError;

pub async fn list_hosts(
    State(state): State<AppState>,
    _principal: Principal,
    Query(params): Query<HostListParams>,
) -> Result<Json<Vec<HostResponse>>, AppError> {
    let hosts = state
        .hosts
        .list(params.inventory_id.as_deref(), params.group_id.as_deref())
        .await?;
    Ok(Json(hosts.into_iter().map(HostResponse::from).collect()))
}

pub async fn create_host(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<HostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let host = state.hosts.create(request, &principal.user_id).await?;
    Ok((StatusCode::CREATED, Json(HostResponse::from(host))))
}

pub async fn get_host(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<HostResponse>, AppError> {
    Ok(Json(state.hosts.get(&id).await?.into()))
}

pub async fn replace_host(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<HostRequest>,
) -> Result<Json<HostResponse>, AppError> {
    let host = state.hosts.update(&id, request, &principal.user_id).await?;
    Ok(Json(host.into()))
}

pub async fn patch_host(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(patch): Json<PatchHostRequest>,
) -> Result<Json<HostResponse>, AppError> {
    let host = state.hosts.patch(&id, patch, &principal.user_id).await?;
    Ok(Json(host.into()))
}

pub async fn delete_host(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.hosts.delete(&id, &principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn host_variables(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Map<String, Value>>, AppError> {
    Ok(Json(state.hosts.variables(&id).await?))
}

pub async fn host_all_groups(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let groups = state.hosts.all_groups(&id).await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

/// The host's direct group, as a list of zero or one.
pub async fn host_groups(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<GroupResponse>>, AppError> {
    let group = state.hosts.group(&id).await?;
    Ok(Json(group.into_iter().map(GroupResponse::from).collect()))
}

pub async fn host_activity_stream(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    let host = state.hosts.get(&id).await?;
    let entries = state.activity.for_object(&host.id).await?;
    Ok(Json(entries.into_iter().map(ActivityResponse::from).collect()))
}
