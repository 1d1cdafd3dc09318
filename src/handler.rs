//! HTTP request handlers for the visit map API
//!
//! Handlers are thin: they pull identity, path and body apart, call into the
//! domain modules and turn the result into JSON. Every failure is an
//! [`AppError`], which renders its own status code.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::database::AppState;
use crate::error::{AppError, AppResult};
use crate::favorites::{favorites_for_regions, remove_favorite, set_favorite};
use crate::map::{assemble_map, region_detail};
use crate::middleware::ActingUser;
use crate::model::{
    CreatePostRequest, CreatePostResponse, FavoritePhotoView, FavoritesParams,
    RegionListResponse, RegionView, SetFavoriteRequest, SetFavoriteResponse, UpsertOutcome,
};
use crate::posts::record_post;

/// Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Lists every region in the catalog
///
/// `GET /api/regions`
pub async fn list_regions(State(state): State<AppState>) -> impl IntoResponse {
    let regions: Vec<RegionView> = state
        .catalog
        .regions()
        .map(|region| RegionView::new(region, &state.catalog))
        .collect();

    Json(RegionListResponse {
        total_regions: regions.len(),
        regions,
    })
}

/// Returns the visit map of a user
///
/// `GET /api/users/{user_id}/map`
///
/// # Response
///
/// ```json
/// {
///   "regions": [{ "id": 13, "name": "Tokyo", "visit_count": 3, ... }],
///   "total_regions": 47,
///   "total_visited": 1
/// }
/// ```
pub async fn get_map(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let map = assemble_map(&state.db, &state.catalog, &state.config, &user_id)?;
    Ok(Json(map))
}

/// Returns one region of a user's map
///
/// `GET /api/users/{user_id}/regions/{region_id}`
///
/// - **200 OK** - `visit` is `null` when the user has not been there
/// - **404 Not Found** - region is not in the catalog
pub async fn get_region(
    Path((user_id, region_id)): Path<(String, u32)>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let detail = region_detail(
        &state.db,
        &state.catalog,
        &state.config,
        &user_id,
        region_id,
    )?;
    Ok(Json(detail))
}

/// Reads a user's favorite placements
///
/// `GET /api/users/{user_id}/favorites?region_ids=1,13`
///
/// Without `region_ids` every catalog region is read.
pub async fn list_favorites(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Query(params): Query<FavoritesParams>,
) -> AppResult<impl IntoResponse> {
    let region_ids: Vec<u32> = match params.region_ids.as_deref() {
        Some(raw) => parse_region_ids(raw)?,
        None => state.catalog.regions().map(|region| region.id).collect(),
    };

    let favorites = favorites_for_regions(&state.db, &user_id, region_ids)?;
    let favorites: Vec<_> = favorites.into_values().collect();

    Ok(Json(json!({
        "user_id": user_id,
        "total": favorites.len(),
        "favorites": favorites,
    })))
}

fn parse_region_ids(raw: &str) -> AppResult<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| AppError::Validation(format!("invalid region id '{}'", part)))
        })
        .collect()
}

/// Sets (or replaces) the favorite photo of a region
///
/// `PUT /api/users/{user_id}/favorites`
///
/// # Request Body
///
/// ```json
/// { "region_id": 13, "photo_id": "a8Kd02LmQz", "position_x": 40, "scale": 1.5 }
/// ```
///
/// # Response
///
/// - **201 Created** - first favorite for the region
/// - **200 OK** - previous favorite replaced
/// - **400 / 401 / 403 / 404 / 422** - see [`AppError`]
pub async fn put_favorite(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    acting_user: ActingUser,
    payload: Result<Json<SetFavoriteRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    acting_user.authorize(&user_id)?;
    let Json(payload) = payload?;

    let stored = set_favorite(
        &state.db,
        &state.catalog,
        acting_user.id(),
        &user_id,
        &payload,
    )?;

    let status = match stored.outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Replaced => StatusCode::OK,
    };
    let response = SetFavoriteResponse {
        outcome: stored.outcome,
        region_id: stored.placement.region_id,
        favorite_photo: FavoritePhotoView::new(&stored.placement, &stored.photo, &state.config),
        updated_at: stored.placement.updated_at,
    };

    Ok((status, Json(response)))
}

/// Removes the favorite photo of a region
///
/// `DELETE /api/users/{user_id}/favorites/{region_id}`
///
/// Succeeds whether or not a favorite existed.
pub async fn delete_favorite(
    Path((user_id, region_id)): Path<(String, u32)>,
    State(state): State<AppState>,
    acting_user: ActingUser,
) -> AppResult<impl IntoResponse> {
    let removed = remove_favorite(&state.db, acting_user.id(), &user_id, region_id)?;

    Ok(Json(json!({
        "message": "Favorite photo removed",
        "region_id": region_id,
        "removed": removed,
    })))
}

/// Records the metadata of a new post
///
/// `POST /api/users/{user_id}/posts`
///
/// # Request Body
///
/// ```json
/// {
///   "sub_location_id": 13001,
///   "created_at": "2024-05-01T09:00:00Z",
///   "photos": [{ "image_url": "/uploads/a.webp", "title": "Gyoen" }]
/// }
/// ```
pub async fn create_post(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    acting_user: ActingUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    acting_user.authorize(&user_id)?;
    let Json(payload) = payload?;

    let entry = record_post(&state.db, &state.catalog, &user_id, payload)?;
    let region_id = entry
        .post
        .sub_location_id
        .and_then(|sub_id| state.catalog.region_of(sub_id));

    let response = CreatePostResponse {
        id: entry.post.id,
        sub_location_id: entry.post.sub_location_id,
        region_id,
        created_at: entry.post.created_at,
        photo_ids: entry.post.photo_ids,
    };

    Ok((StatusCode::CREATED, Json(response)))
}
