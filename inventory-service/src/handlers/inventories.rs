use crate::dtos::inventories::InventoryListParams;
use crate::dtos::{CreateInventoryRequest, InventoryRemovalResponse, InventoryResponse};
use crate::models::Principal;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn list_inventories(
    State(state): State<AppState>,
    _principal: Principal,
    Query(params): Query<InventoryListParams>,
) -> Result<Json<Vec<InventoryResponse>>, AppError> {
    let inventories = state
        .inventories
        .list(params.project_id.as_deref())
        .await?;
    Ok(Json(
        inventories
            .into_iter()
            .map(InventoryResponse::from)
            .collect(),
    ))
}

pub async fn create_inventory(
    State(state): State<AppState>,
    principal: Principal,
    Json(request): Json<CreateInventoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let inventory = state
        .inventories
        .create(request, &principal.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(InventoryResponse::from(inventory))))
}

pub async fn get_inventory(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<InventoryResponse>, AppError> {
    Ok(Json(state.inventories.get(&id).await?.into()))
}

pub async fn delete_inventory(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<InventoryRemovalResponse>, AppError> {
    let removal = state.inventories.delete(&id, &principal.user_id).await?;
    Ok(Json(removal.into()))
}
