//! Artwork catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::Paging;
use crate::AppState;
use museo_common::{
    auth::{AuthContext, Capability},
    domain::{ArtworkFilter, ArtworkInput, ArtworkView, Page},
    errors::Result,
};

/// Search the whole catalog, any state
pub async fn list_artworks(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(filter): Query<ArtworkFilter>,
    Query(paging): Query<Paging>,
) -> Result<Json<Page<ArtworkView>>> {
    auth.require(Capability::ViewCatalog)?;

    let limit = paging.limit_or(state.config.catalog.default_page_size);
    let page = state.catalog.search_artworks(filter, paging.offset, limit).await?;

    Ok(Json(page.map(|a| ArtworkView::project(&a, auth.role))))
}

pub async fn get_artwork(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ArtworkView>> {
    auth.require(Capability::ViewCatalog)?;

    let artwork = state.catalog.artwork(id).await?;
    Ok(Json(ArtworkView::project(&artwork, auth.role)))
}

pub async fn create_artwork(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(input): Json<ArtworkInput>,
) -> Result<(StatusCode, Json<ArtworkView>)> {
    auth.require(Capability::EditCatalog)?;

    let artwork = state.catalog.create_artwork(input).await?;

    tracing::info!(
        artwork_id = %artwork.id,
        request_id = %auth.request_id,
        "Artwork registered"
    );

    Ok((StatusCode::CREATED, Json(ArtworkView::project(&artwork, auth.role))))
}

pub async fn update_artwork(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(input): Json<ArtworkInput>,
) -> Result<Json<ArtworkView>> {
    auth.require(Capability::EditCatalog)?;

    let artwork = state.catalog.update_artwork(id, input).await?;
    Ok(Json(ArtworkView::project(&artwork, auth.role)))
}

pub async fn delete_artwork(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require(Capability::EditCatalog)?;

    state.catalog.delete_artwork(id).await?;

    tracing::info!(artwork_id = %id, request_id = %auth.request_id, "Artwork deleted");
    Ok(StatusCode::NO_CONTENT)
}
