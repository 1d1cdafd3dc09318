//! Favorite photo placements
//!
//! A user may pin one of their own photos to each region they have posted in,
//! together with the crop position and zoom used to draw it inside the region
//! tile. There is at most one placement per (user, region); setting a new one
//! overwrites the old.

use std::collections::BTreeMap;

use chrono::Utc;
use redb::{Database, ReadableDatabase, WriteTransaction};

use crate::catalog::RegionCatalog;
use crate::database::{favorite_key, TABLE_FAVORITES, TABLE_PHOTOS, TABLE_POSTS};
use crate::error::{AppError, AppResult};
use crate::middleware::authorize_owner;
use crate::model::{
    DisplayPosition, FavoritePlacement, PhotoRecord, PostRecord, SetFavoriteRequest,
    UpsertOutcome,
};
use crate::posts::load_record;

pub const DEFAULT_POSITION: u8 = 50;
pub const DEFAULT_SCALE: f64 = 1.0;
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 5.0;

/// Crop and zoom of a favorite photo, already range-checked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub position_x: u8,
    pub position_y: u8,
    pub scale: f64,
    pub display_position: DisplayPosition,
}

impl Geometry {
    /// Applies defaults to omitted fields and rejects out-of-range values
    pub fn from_request(request: &SetFavoriteRequest) -> AppResult<Self> {
        Ok(Self {
            position_x: percent("position_x", request.position_x)?,
            position_y: percent("position_y", request.position_y)?,
            scale: zoom(request.scale)?,
            display_position: request.display_position.unwrap_or_default(),
        })
    }
}

fn percent(field: &str, value: Option<i64>) -> AppResult<u8> {
    match value {
        None => Ok(DEFAULT_POSITION),
        Some(v) => u8::try_from(v)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or_else(|| {
                AppError::Validation(format!("{} must be between 0 and 100, got {}", field, v))
            }),
    }
}

fn zoom(value: Option<f64>) -> AppResult<f64> {
    match value {
        None => Ok(DEFAULT_SCALE),
        Some(v) if v.is_finite() && (MIN_SCALE..=MAX_SCALE).contains(&v) => Ok(v),
        Some(v) => Err(AppError::Validation(format!(
            "scale must be between {} and {}, got {}",
            MIN_SCALE, MAX_SCALE, v
        ))),
    }
}

/// A placement as it was written, with the photo it points at
#[derive(Debug, Clone)]
pub struct StoredFavorite {
    pub outcome: UpsertOutcome,
    pub placement: FavoritePlacement,
    pub photo: PhotoRecord,
}

/// Validates and upserts the favorite photo of `map_owner_id` for a region
///
/// Checks run in order: acting user is the owner, ids present and geometry in
/// range, photo exists, photo's post is owned by the acting user, photo's post
/// lies in the requested region. The lookups and the upsert share one write
/// transaction, so a failed check leaves the store untouched and concurrent
/// calls for the same pair serialize.
pub fn set_favorite(
    db: &Database,
    catalog: &RegionCatalog,
    acting_user_id: Option<&str>,
    map_owner_id: &str,
    request: &SetFavoriteRequest,
) -> AppResult<StoredFavorite> {
    authorize_owner(acting_user_id, map_owner_id)?;

    let region_id = request
        .region_id
        .ok_or_else(|| AppError::Validation("region_id is required".to_string()))?;
    let photo_id = request
        .photo_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("photo_id is required".to_string()))?;
    if catalog.region(region_id).is_none() {
        return Err(AppError::Validation(format!(
            "unknown region_id {}",
            region_id
        )));
    }
    let geometry = Geometry::from_request(request)?;

    let write_txn = db.begin_write()?;
    let checked = checked_upsert(
        &write_txn,
        catalog,
        map_owner_id,
        region_id,
        photo_id,
        geometry,
    );
    let stored = match checked {
        Ok(stored) => stored,
        Err(err) => {
            write_txn.abort()?;
            return Err(err);
        }
    };
    write_txn.commit()?;

    tracing::info!(
        user_id = map_owner_id,
        region_id,
        photo_id,
        outcome = ?stored.outcome,
        "favorite photo set"
    );

    Ok(stored)
}

/// Runs the photo checks and the upsert inside `write_txn`
fn checked_upsert(
    write_txn: &WriteTransaction,
    catalog: &RegionCatalog,
    map_owner_id: &str,
    region_id: u32,
    photo_id: &str,
    geometry: Geometry,
) -> AppResult<StoredFavorite> {
    let posts = write_txn.open_table(TABLE_POSTS)?;
    let photos = write_txn.open_table(TABLE_PHOTOS)?;
    let mut favorites = write_txn.open_table(TABLE_FAVORITES)?;

    let photo: PhotoRecord = load_record(&photos, photo_id)?
        .ok_or_else(|| AppError::NotFound(format!("photo {} not found", photo_id)))?;

    let post: Option<PostRecord> = load_record(&posts, &photo.post_id)?;
    let post = post
        .filter(|post| post.owner_user_id == map_owner_id)
        .ok_or_else(|| {
            AppError::Forbidden(format!("photo {} does not belong to you", photo_id))
        })?;

    let photo_region = post
        .sub_location_id
        .and_then(|sub_id| catalog.region_of(sub_id));
    if photo_region != Some(region_id) {
        return Err(AppError::Conflict(format!(
            "photo {} was not taken in region {}",
            photo_id, region_id
        )));
    }

    let placement = FavoritePlacement {
        user_id: map_owner_id.to_string(),
        region_id,
        photo_id: photo.id.clone(),
        position_x: geometry.position_x,
        position_y: geometry.position_y,
        scale: geometry.scale,
        display_position: geometry.display_position,
        updated_at: Utc::now(),
    };
    let key = favorite_key(map_owner_id, region_id);
    let placement_json = serde_json::to_string(&placement)?;
    let replaced = favorites
        .insert(key.as_str(), placement_json.as_str())?
        .is_some();

    Ok(StoredFavorite {
        outcome: if replaced {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Created
        },
        placement,
        photo,
    })
}

/// Deletes the favorite of `map_owner_id` for a region
///
/// Returns whether a row was removed; a missing row is not an error.
pub fn remove_favorite(
    db: &Database,
    acting_user_id: Option<&str>,
    map_owner_id: &str,
    region_id: u32,
) -> AppResult<bool> {
    authorize_owner(acting_user_id, map_owner_id)?;

    let key = favorite_key(map_owner_id, region_id);
    let write_txn = db.begin_write()?;
    let removed = {
        let mut favorites = write_txn.open_table(TABLE_FAVORITES)?;
        // bound so the returned guard is dropped before `favorites`
        let removed = favorites.remove(key.as_str())?.is_some();
        removed
    };
    write_txn.commit()?;

    tracing::info!(user_id = map_owner_id, region_id, removed, "favorite photo removed");

    Ok(removed)
}

/// Reads the favorites of a user for the given regions
///
/// Regions without a favorite are absent from the result.
pub fn favorites_for_regions<I>(
    db: &Database,
    user_id: &str,
    region_ids: I,
) -> AppResult<BTreeMap<u32, FavoritePlacement>>
where
    I: IntoIterator<Item = u32>,
{
    let read_txn = db.begin_read()?;
    let favorites = read_txn.open_table(TABLE_FAVORITES)?;

    let mut found = BTreeMap::new();
    for region_id in region_ids {
        if found.contains_key(&region_id) {
            continue;
        }
        let key = favorite_key(user_id, region_id);
        if let Some(placement) = load_record::<FavoritePlacement, _>(&favorites, &key)? {
            found.insert(region_id, placement);
        }
    }

    Ok(found)
}
