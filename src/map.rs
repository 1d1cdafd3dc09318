//! Map data assembly
//!
//! Joins the region catalog, a fresh fold of the user's posts and their stored
//! favorites into the structure the map renderer draws from.

use std::collections::BTreeMap;

use redb::Database;

use crate::catalog::RegionCatalog;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::favorites::favorites_for_regions;
use crate::model::{
    FavoritePhotoView, FavoritePlacement, MapResponse, PhotoView, RegionDetailResponse,
    RegionEntry, RegionView,
};
use crate::posts::posts_for_user;
use crate::visits::{fold_visits, VisitSummary};

/// Builds the complete map of `user_id`
pub fn assemble_map(
    db: &Database,
    catalog: &RegionCatalog,
    config: &Config,
    user_id: &str,
) -> AppResult<MapResponse> {
    let posts = posts_for_user(db, user_id)?;
    let visits = fold_visits(&posts, catalog);
    let favorites = favorites_for_regions(db, user_id, visits.keys().copied())?;

    tracing::debug!(
        user_id,
        posts = posts.len(),
        visited = visits.len(),
        favorites = favorites.len(),
        "map assembled"
    );

    Ok(build_map(visits, favorites, catalog, config))
}

/// Builds one region's detail for `user_id`, whether visited or not
pub fn region_detail(
    db: &Database,
    catalog: &RegionCatalog,
    config: &Config,
    user_id: &str,
    region_id: u32,
) -> AppResult<RegionDetailResponse> {
    let region = catalog
        .region(region_id)
        .ok_or_else(|| AppError::NotFound(format!("region {} not found", region_id)))?;

    let posts = posts_for_user(db, user_id)?;
    let mut visits = fold_visits(&posts, catalog);
    let visit = match visits.remove(&region_id) {
        Some(summary) => {
            let mut one = BTreeMap::from([(region_id, summary)]);
            let favorites = favorites_for_regions(db, user_id, [region_id])?;
            attach_favorites(&mut one, favorites);
            one.remove(&region_id)
                .and_then(|summary| region_entry(&summary, catalog, config))
        }
        None => None,
    };

    Ok(RegionDetailResponse {
        region: RegionView::new(region, catalog),
        visit,
    })
}

/// Merges folded visits and stored favorites into the map response
///
/// Unvisited regions are left out; entries come out in ascending region id.
pub fn build_map(
    mut visits: BTreeMap<u32, VisitSummary>,
    favorites: BTreeMap<u32, FavoritePlacement>,
    catalog: &RegionCatalog,
    config: &Config,
) -> MapResponse {
    attach_favorites(&mut visits, favorites);

    let regions: Vec<RegionEntry> = visits
        .values()
        .filter_map(|summary| region_entry(summary, catalog, config))
        .collect();

    MapResponse {
        total_regions: catalog.total_regions(),
        total_visited: regions.len(),
        regions,
    }
}

/// Attaches each favorite to its region's summary
///
/// A favorite whose photo is no longer among the region's photos is dropped.
fn attach_favorites(
    visits: &mut BTreeMap<u32, VisitSummary>,
    favorites: BTreeMap<u32, FavoritePlacement>,
) {
    for (region_id, placement) in favorites {
        let Some(summary) = visits.get_mut(&region_id) else {
            continue;
        };
        if summary.photo(&placement.photo_id).is_some() {
            summary.favorite_photo = Some(placement);
        } else {
            tracing::warn!(
                user_id = %placement.user_id,
                region_id,
                photo_id = %placement.photo_id,
                "favorite photo no longer resolves"
            );
        }
    }
}

fn region_entry(
    summary: &VisitSummary,
    catalog: &RegionCatalog,
    config: &Config,
) -> Option<RegionEntry> {
    let region = catalog.region(summary.region_id)?;

    let favorite_photo = summary.favorite_photo.as_ref().and_then(|placement| {
        summary
            .photo(&placement.photo_id)
            .map(|photo| FavoritePhotoView::new(placement, photo, config))
    });

    Some(RegionEntry {
        id: region.id,
        name: region.name.clone(),
        code: region.code.clone(),
        visit_count: summary.visit_count,
        first_visit: summary.first_visit_at,
        last_visit: summary.last_visit_at,
        photos: summary
            .photos
            .iter()
            .map(|photo| PhotoView::new(photo, config))
            .collect(),
        favorite_photo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DisplayPosition, PhotoRecord};
    use chrono::{TimeZone, Utc};

    fn summary(region_id: u32, photo_ids: &[&str]) -> VisitSummary {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        VisitSummary {
            region_id,
            visit_count: 1,
            first_visit_at: at,
            last_visit_at: at,
            photos: photo_ids
                .iter()
                .map(|id| PhotoRecord {
                    id: id.to_string(),
                    post_id: "post".to_string(),
                    title: Some(format!("title {}", id)),
                    description: None,
                    image_url: format!("uploads/{}.webp", id),
                    thumbnail_url: Some(format!("https://cdn.example.com/{}.jpg", id)),
                })
                .collect(),
            favorite_photo: None,
        }
    }

    fn placement(region_id: u32, photo_id: &str) -> FavoritePlacement {
        FavoritePlacement {
            user_id: "alice".to_string(),
            region_id,
            photo_id: photo_id.to_string(),
            position_x: 20,
            position_y: 80,
            scale: 1.5,
            display_position: DisplayPosition::Custom,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn regions_are_ordered_and_counted() {
        let catalog = RegionCatalog::builtin();
        let config = Config::default();
        let visits = BTreeMap::from([
            (47, summary(47, &[])),
            (1, summary(1, &["A"])),
            (13, summary(13, &["B"])),
        ]);

        let map = build_map(visits, BTreeMap::new(), &catalog, &config);
        let ids: Vec<u32> = map.regions.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 13, 47]);
        assert_eq!(map.total_regions, 47);
        assert_eq!(map.total_visited, 3);
        assert_eq!(map.regions[0].name, "Hokkaido");
        assert_eq!(map.regions[0].code, "JP-01");
        assert_eq!(
            map.regions[0].photos[0].url,
            "http://localhost:8080/uploads/A.webp"
        );
    }

    #[test]
    fn favorites_attach_only_to_resolvable_photos() {
        let catalog = RegionCatalog::builtin();
        let config = Config::default();
        let visits = BTreeMap::from([(13, summary(13, &["B", "C"])), (27, summary(27, &["D"]))]);
        let favorites = BTreeMap::from([
            (13, placement(13, "C")),
            (27, placement(27, "gone")),
            (40, placement(40, "E")),
        ]);

        let map = build_map(visits, favorites, &catalog, &config);
        assert_eq!(map.total_visited, 2);

        let tokyo = map.regions.iter().find(|r| r.id == 13).unwrap();
        let favorite = tokyo.favorite_photo.as_ref().unwrap();
        assert_eq!(favorite.id, "C");
        assert_eq!(favorite.title.as_deref(), Some("title C"));
        assert_eq!((favorite.position_x, favorite.position_y), (20, 80));
        assert_eq!(favorite.scale, 1.5);
        assert_eq!(
            favorite.thumbnail_url.as_deref(),
            Some("https://cdn.example.com/C.jpg")
        );

        let osaka = map.regions.iter().find(|r| r.id == 27).unwrap();
        assert!(osaka.favorite_photo.is_none());
    }
}
