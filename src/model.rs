//! Data models for the visit map
//!
//! This module defines the records kept in the database, the request payloads
//! accepted by the API and the response shapes handed to the map renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Region, RegionCatalog};
use crate::config::Config;

/// A post as stored by the post collaborator
///
/// Only the metadata the map needs is kept: where it was posted, when, and
/// which photos it carries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: String,

    pub owner_user_id: String,

    /// City the post is tagged with; `None` for free-text locations
    pub sub_location_id: Option<u32>,

    /// Creation time, used as the visit date
    pub created_at: DateTime<Utc>,

    /// Photos attached to the post, in upload order
    #[serde(default)]
    pub photo_ids: Vec<String>,
}

/// A photo belonging to exactly one post
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: String,
    pub post_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
}

/// A post together with its photos, ready to be folded into visits
#[derive(Debug, Clone, PartialEq)]
pub struct PostEntry {
    pub post: PostRecord,
    pub photos: Vec<PhotoRecord>,
}

/// How the favorite photo is framed inside its region tile
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayPosition {
    Center,
    Top,
    Bottom,
    Left,
    Right,
    /// Framing comes from `position_x`, `position_y` and `scale`
    #[default]
    Custom,
}

/// The one favorite photo a user picked for a region, with its crop geometry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FavoritePlacement {
    pub user_id: String,
    pub region_id: u32,
    pub photo_id: String,

    /// Horizontal focus point in percent, 0..=100
    pub position_x: u8,

    /// Vertical focus point in percent, 0..=100
    pub position_y: u8,

    /// Zoom factor, 0.1..=5.0
    pub scale: f64,

    #[serde(default)]
    pub display_position: DisplayPosition,

    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert wrote a new row or overwrote an existing one
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request payload for choosing a region's favorite photo
///
/// # Example
/// ```json
/// {
///   "region_id": 13,
///   "photo_id": "a8Kd02LmQz",
///   "display_position": "custom",
///   "position_x": 40,
///   "position_y": 60,
///   "scale": 1.5
/// }
/// ```
///
/// Ids are optional at the type level so that a missing id is reported as a
/// validation error rather than a body parsing failure. Geometry is signed for
/// the same reason.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SetFavoriteRequest {
    pub region_id: Option<u32>,
    pub photo_id: Option<String>,
    #[serde(default, alias = "display_mode")]
    pub display_position: Option<DisplayPosition>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    pub scale: Option<f64>,
}

/// Query parameters for reading favorites
///
/// Query string: `?region_ids=1,13,47`. Without it every region is read.
#[derive(Deserialize, Debug, Default)]
pub struct FavoritesParams {
    pub region_ids: Option<String>,
}

/// Request payload for recording a post's metadata
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreatePostRequest {
    pub sub_location_id: Option<u32>,

    /// Defaults to the time of the request
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub photos: Vec<NewPhoto>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NewPhoto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub thumbnail_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response returned after recording a post
#[derive(Serialize, Debug)]
pub struct CreatePostResponse {
    pub id: String,
    pub sub_location_id: Option<u32>,
    pub region_id: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub photo_ids: Vec<String>,
}

/// A photo as shown in a region's gallery
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PhotoView {
    pub id: String,
    pub post_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

impl PhotoView {
    pub fn new(photo: &PhotoRecord, config: &Config) -> Self {
        Self {
            id: photo.id.clone(),
            post_id: photo.post_id.clone(),
            title: photo.title.clone(),
            description: photo.description.clone(),
            url: config.display_url(&photo.image_url),
            thumbnail_url: photo
                .thumbnail_url
                .as_deref()
                .map(|path| config.display_url(path)),
        }
    }
}

/// The favorite photo of a region tile, with its framing
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FavoritePhotoView {
    pub id: String,
    pub post_id: String,
    pub title: Option<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub display_position: DisplayPosition,
    pub position_x: u8,
    pub position_y: u8,
    pub scale: f64,
}

impl FavoritePhotoView {
    pub fn new(placement: &FavoritePlacement, photo: &PhotoRecord, config: &Config) -> Self {
        let view = PhotoView::new(photo, config);
        Self {
            id: view.id,
            post_id: view.post_id,
            title: view.title,
            url: view.url,
            thumbnail_url: view.thumbnail_url,
            display_position: placement.display_position,
            position_x: placement.position_x,
            position_y: placement.position_y,
            scale: placement.scale,
        }
    }
}

/// One visited region in the map response
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RegionEntry {
    pub id: u32,
    pub name: String,
    pub code: String,
    pub visit_count: u32,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
    pub photos: Vec<PhotoView>,
    pub favorite_photo: Option<FavoritePhotoView>,
}

/// Everything the map renderer needs for one user
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MapResponse {
    /// Visited regions only, ascending by region id
    pub regions: Vec<RegionEntry>,
    pub total_regions: usize,
    pub total_visited: usize,
}

/// Response returned after setting a favorite photo
#[derive(Serialize, Debug)]
pub struct SetFavoriteResponse {
    pub outcome: UpsertOutcome,
    pub region_id: u32,
    pub favorite_photo: FavoritePhotoView,
    pub updated_at: DateTime<Utc>,
}

/// Catalog entry as listed to clients
#[derive(Serialize, Debug, Clone)]
pub struct RegionView {
    pub id: u32,
    pub name: String,
    pub code: String,
    pub capital: Option<String>,
}

impl RegionView {
    pub fn new(region: &Region, catalog: &RegionCatalog) -> Self {
        Self {
            id: region.id,
            name: region.name.clone(),
            code: region.code.clone(),
            capital: catalog.capital(region.id).map(|sub| sub.name.clone()),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RegionListResponse {
    pub regions: Vec<RegionView>,
    pub total_regions: usize,
}

/// A single region and, if the user has been there, its visit entry
#[derive(Serialize, Debug)]
pub struct RegionDetailResponse {
    pub region: RegionView,
    pub visit: Option<RegionEntry>,
}
