//! Post and photo records
//!
//! Posts are owned by the wider application; this module only keeps the
//! metadata the map reads: owner, city, timestamp and photos. No image bytes
//! are stored here.

use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use redb::{Database, ReadableDatabase, ReadableTable};
use serde::de::DeserializeOwned;

use crate::catalog::RegionCatalog;
use crate::database::{TABLE_PHOTOS, TABLE_POSTS, TABLE_USER_POSTS};
use crate::error::{AppError, AppResult};
use crate::model::{CreatePostRequest, PhotoRecord, PostEntry, PostRecord};

const ID_LEN: usize = 10;

/// Reads and decodes one JSON record from any readable string table
pub(crate) fn load_record<T, R>(table: &R, key: &str) -> AppResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static str>,
{
    match table.get(key)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

/// Generates a random id that is not yet used as a key in `table`
fn unused_id<R>(table: &R) -> AppResult<String>
where
    R: ReadableTable<&'static str, &'static str>,
{
    loop {
        let id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(ID_LEN)
            .map(char::from)
            .collect();

        if table.get(id.as_str())?.is_none() {
            return Ok(id);
        }
    }
}

/// Records a post and its photos for `owner_user_id`
///
/// The sub-location must be known to the catalog and every photo needs an
/// image URL. All rows are written in one transaction.
pub fn record_post(
    db: &Database,
    catalog: &RegionCatalog,
    owner_user_id: &str,
    request: CreatePostRequest,
) -> AppResult<PostEntry> {
    if let Some(sub_id) = request.sub_location_id {
        if catalog.sub_location(sub_id).is_none() {
            return Err(AppError::Validation(format!(
                "unknown sub_location_id {}",
                sub_id
            )));
        }
    }
    if request
        .photos
        .iter()
        .any(|photo| photo.image_url.trim().is_empty())
    {
        return Err(AppError::Validation(
            "every photo needs an image_url".to_string(),
        ));
    }

    let created_at = request.created_at.unwrap_or_else(Utc::now);

    let write_txn = db.begin_write()?;
    let entry = {
        let mut posts = write_txn.open_table(TABLE_POSTS)?;
        let mut photos = write_txn.open_table(TABLE_PHOTOS)?;
        let mut user_posts = write_txn.open_multimap_table(TABLE_USER_POSTS)?;

        let post_id = unused_id(&posts)?;

        let mut photo_records = Vec::with_capacity(request.photos.len());
        for new_photo in request.photos {
            let photo = PhotoRecord {
                id: unused_id(&photos)?,
                post_id: post_id.clone(),
                title: new_photo.title,
                description: new_photo.description,
                image_url: new_photo.image_url,
                thumbnail_url: new_photo.thumbnail_url,
            };
            let photo_json = serde_json::to_string(&photo)?;
            photos.insert(photo.id.as_str(), photo_json.as_str())?;
            photo_records.push(photo);
        }

        let post = PostRecord {
            id: post_id,
            owner_user_id: owner_user_id.to_string(),
            sub_location_id: request.sub_location_id,
            created_at,
            photo_ids: photo_records.iter().map(|photo| photo.id.clone()).collect(),
        };
        let post_json = serde_json::to_string(&post)?;
        posts.insert(post.id.as_str(), post_json.as_str())?;
        user_posts.insert(owner_user_id, post.id.as_str())?;

        PostEntry {
            post,
            photos: photo_records,
        }
    };
    write_txn.commit()?;

    tracing::info!(
        user_id = owner_user_id,
        post_id = %entry.post.id,
        sub_location_id = ?entry.post.sub_location_id,
        photos = entry.photos.len(),
        "post recorded"
    );

    Ok(entry)
}

/// Loads every post of a user together with its photos
///
/// Order is unspecified. Photo ids that no longer resolve are skipped.
pub fn posts_for_user(db: &Database, user_id: &str) -> AppResult<Vec<PostEntry>> {
    let read_txn = db.begin_read()?;
    let user_posts = read_txn.open_multimap_table(TABLE_USER_POSTS)?;
    let posts = read_txn.open_table(TABLE_POSTS)?;
    let photos = read_txn.open_table(TABLE_PHOTOS)?;

    let mut entries = Vec::new();
    for post_id in user_posts.get(user_id)? {
        let post_id = post_id?;
        let Some(post) = load_record::<PostRecord, _>(&posts, post_id.value())? else {
            continue;
        };

        let mut post_photos = Vec::with_capacity(post.photo_ids.len());
        for photo_id in &post.photo_ids {
            if let Some(photo) = load_record::<PhotoRecord, _>(&photos, photo_id)? {
                post_photos.push(photo);
            }
        }

        entries.push(PostEntry {
            post,
            photos: post_photos,
        });
    }

    Ok(entries)
}

