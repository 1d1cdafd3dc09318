//! Database initialization and table definitions
//!
//! This module handles the setup of the embedded redb database. Records are
//! stored as JSON strings, keyed by their ids.

use redb::{Database, MultimapTableDefinition, TableDefinition};
use std::sync::Arc;

use crate::catalog::RegionCatalog;
use crate::config::Config;
use crate::error::AppResult;

/// Posts by id
///
/// Key: post id (e.g. "Qm3kd9Lx0a")
/// Value: JSON-serialized PostRecord
pub const TABLE_POSTS: TableDefinition<&str, &str> = TableDefinition::new("posts_v1");

/// Photos by id
///
/// Key: photo id
/// Value: JSON-serialized PhotoRecord (carries its post id)
pub const TABLE_PHOTOS: TableDefinition<&str, &str> = TableDefinition::new("photos_v1");

/// Secondary index from a user to the ids of the posts they own
pub const TABLE_USER_POSTS: MultimapTableDefinition<&str, &str> =
    MultimapTableDefinition::new("user_posts_v1");

/// Favorite photo placements, one row per (user, region)
///
/// Key: composite key from [`favorite_key`], e.g. "user_123:013"
/// Value: JSON-serialized FavoritePlacement
///
/// Keying the row by the pair is what keeps it unique: an upsert for the same
/// pair overwrites the same key inside a single write transaction.
pub const TABLE_FAVORITES: TableDefinition<&str, &str> = TableDefinition::new("favorites_v1");

/// Builds the favorites key for a user and region
///
/// The region id is zero-padded to a fixed width, so two different pairs can
/// never produce the same key even when a user id contains ':'.
pub fn favorite_key(user_id: &str, region_id: u32) -> String {
    format!("{}:{:03}", user_id, region_id)
}

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub catalog: Arc<RegionCatalog>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, catalog: RegionCatalog, config: Config) -> Self {
        Self {
            db: Arc::new(db),
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }
}

/// Creates or opens the database file and makes sure every table exists
///
/// # Example
///
/// ```no_run
/// # use visitmap::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> AppResult<Database> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_POSTS)?;
        write_txn.open_table(TABLE_PHOTOS)?;
        write_txn.open_multimap_table(TABLE_USER_POSTS)?;
        write_txn.open_table(TABLE_FAVORITES)?;
    }
    write_txn.commit()?;

    Ok(db)
}
