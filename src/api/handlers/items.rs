//! Item endpoints: public reads, ownership-gated writes.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::store::{DynStore, ItemChanges, ItemRecord, NewItem};

use super::auth::AuthState;
use super::auth::policy::ensure_owner_or_superuser;
use super::auth::principal::require_user;
use super::error::ApiError;
use super::Pagination;

const MAX_TITLE_LENGTH: usize = 255;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ItemCreateRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct ItemUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ItemResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemRecord> for ItemResponse {
    fn from(item: ItemRecord) -> Self {
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            owner_id: item.owner_id,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.is_empty() || title.len() > MAX_TITLE_LENGTH {
        return Err(ApiError::Validation(
            "Title must be between 1 and 255 characters".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = ItemCreateRequest,
    responses(
        (status = 201, description = "Item created, owned by the requester", body = ItemResponse),
        (status = 400, description = "Invalid title"),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "items"
)]
pub async fn create_item(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
    Json(payload): Json<ItemCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state, &store).await?;
    validate_title(&payload.title)?;

    let item = store
        .insert_item(NewItem {
            title: payload.title,
            description: payload.description,
            owner_id: user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(Pagination),
    responses(
        (status = 200, description = "All items; no authentication required", body = [ItemResponse]),
    ),
    tag = "items"
)]
pub async fn list_items(
    Query(pagination): Query<Pagination>,
    Extension(store): Extension<DynStore>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = store.list_items(pagination.page()).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/my-items",
    params(Pagination),
    responses(
        (status = 200, description = "Items owned by the requester", body = [ItemResponse]),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "items"
)]
pub async fn my_items(
    Query(pagination): Query<Pagination>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let user = require_user(&headers, &state, &store).await?;
    let items = store.items_by_owner(user.id, pagination.page()).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item detail; no authentication required", body = ItemResponse),
        (status = 404, description = "Item not found"),
    ),
    tag = "items"
)]
pub async fn get_item(
    Path(id): Path<i64>,
    Extension(store): Extension<DynStore>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = store
        .item_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Item not found"))?;
    Ok(Json(ItemResponse::from(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    request_body = ItemUpdateRequest,
    responses(
        (status = 200, description = "Updated item", body = ItemResponse),
        (status = 400, description = "Invalid title"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Requester is not the owner or a superuser"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer" = [])),
    tag = "items"
)]
pub async fn update_item(
    Path(id): Path<i64>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
    Json(payload): Json<ItemUpdateRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let user = require_user(&headers, &state, &store).await?;

    let item = store
        .item_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Item not found"))?;

    ensure_owner_or_superuser(&user, item.owner_id)?;

    if let Some(title) = &payload.title {
        validate_title(title)?;
    }

    let updated = store
        .update_item(
            id,
            ItemChanges {
                title: payload.title,
                description: payload.description,
            },
        )
        .await?
        .ok_or(ApiError::NotFound("Item not found"))?;

    Ok(Json(ItemResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Requester is not the owner or a superuser"),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer" = [])),
    tag = "items"
)]
pub async fn delete_item(
    Path(id): Path<i64>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_user(&headers, &state, &store).await?;

    let item = store
        .item_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Item not found"))?;

    ensure_owner_or_superuser(&user, item.owner_id)?;

    store.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds() {
        assert!(validate_title("T").is_ok());
        assert!(validate_title(&"x".repeat(255)).is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"x".repeat(256)).is_err());
    }
}
