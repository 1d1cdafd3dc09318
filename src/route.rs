//! Route definitions for the visit map API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::database::AppState;
use crate::handler::{
    create_post, delete_favorite, get_map, get_region, health, list_favorites, list_regions,
    put_favorite,
};

use crate::middleware::auth_middleware;
use axum::middleware;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /health` - Liveness probe (public)
/// - `GET /api/regions` - Region catalog
/// - `GET /api/users/{user_id}/map` - Visit map of a user
/// - `GET /api/users/{user_id}/regions/{region_id}` - One region of a user's map
/// - `GET /api/users/{user_id}/favorites` - Favorite placements (optional `region_ids`)
/// - `PUT /api/users/{user_id}/favorites` - Set a region's favorite photo
/// - `DELETE /api/users/{user_id}/favorites/{region_id}` - Remove a region's favorite photo
/// - `POST /api/users/{user_id}/posts` - Record a post's metadata
///
/// Mutating routes act for the user named in the `X-User-Id` header.
///
/// # Example Usage
///
/// ```no_run
/// # use visitmap::catalog::RegionCatalog;
/// # use visitmap::config::Config;
/// # use visitmap::database::{init_db, AppState};
/// # use visitmap::route::create_app;
/// # let db = init_db("data.db").unwrap();
/// let state = AppState::new(db, RegionCatalog::builtin(), Config::default());
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/regions", get(list_regions))
        .route("/users/{user_id}/map", get(get_map))
        .route("/users/{user_id}/regions/{region_id}", get(get_region))
        .route(
            "/users/{user_id}/favorites",
            get(list_favorites).put(put_favorite),
        )
        .route(
            "/users/{user_id}/favorites/{region_id}",
            delete(delete_favorite),
        )
        .route("/users/{user_id}/posts", post(create_post))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .with_state(state)
}
