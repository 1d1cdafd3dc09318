//! Folding a user's posts into per-region visit summaries
//!
//! The fold is pure: it reads nothing but its arguments and returns the same
//! summaries for the same posts regardless of the order they arrive in.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::catalog::RegionCatalog;
use crate::model::{FavoritePlacement, PhotoRecord, PostEntry};

/// What a user's posts add up to in one region
#[derive(Debug, Clone, PartialEq)]
pub struct VisitSummary {
    pub region_id: u32,

    /// Number of posts made in the region
    pub visit_count: u32,

    pub first_visit_at: DateTime<Utc>,
    pub last_visit_at: DateTime<Utc>,

    /// Photos from those posts, each id once, in first-seen order
    pub photos: Vec<PhotoRecord>,

    /// Filled in by the map assembler, never by the fold
    pub favorite_photo: Option<FavoritePlacement>,
}

impl VisitSummary {
    fn opened_at(region_id: u32, at: DateTime<Utc>) -> Self {
        Self {
            region_id,
            visit_count: 0,
            first_visit_at: at,
            last_visit_at: at,
            photos: Vec::new(),
            favorite_photo: None,
        }
    }

    pub fn photo(&self, photo_id: &str) -> Option<&PhotoRecord> {
        self.photos.iter().find(|photo| photo.id == photo_id)
    }
}

/// Folds one user's posts into a summary per visited region
///
/// Posts are taken oldest first (ties by post id). A post whose sub-location is
/// missing or unknown to the catalog counts toward nothing. Regions without
/// posts are absent from the result.
pub fn fold_visits(posts: &[PostEntry], catalog: &RegionCatalog) -> BTreeMap<u32, VisitSummary> {
    let mut ordered: Vec<&PostEntry> = posts.iter().collect();
    ordered.sort_by(|a, b| {
        a.post
            .created_at
            .cmp(&b.post.created_at)
            .then_with(|| a.post.id.cmp(&b.post.id))
    });

    let mut summaries: BTreeMap<u32, VisitSummary> = BTreeMap::new();
    let mut seen_photos: HashMap<u32, HashSet<&str>> = HashMap::new();

    for entry in ordered {
        let Some(region_id) = entry
            .post
            .sub_location_id
            .and_then(|sub_id| catalog.region_of(sub_id))
        else {
            continue;
        };

        let at = entry.post.created_at;
        let summary = summaries
            .entry(region_id)
            .or_insert_with(|| VisitSummary::opened_at(region_id, at));

        summary.visit_count += 1;
        summary.first_visit_at = summary.first_visit_at.min(at);
        summary.last_visit_at = summary.last_visit_at.max(at);

        let seen = seen_photos.entry(region_id).or_default();
        for photo in &entry.photos {
            if seen.insert(photo.id.as_str()) {
                summary.photos.push(photo.clone());
            }
        }
    }

    summaries
}
