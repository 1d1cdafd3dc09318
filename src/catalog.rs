//! Region catalog: prefectures and the sub-locations (cities) inside them
//!
//! The hierarchy is two levels deep, so it is stored as two flat lookup tables.
//! The built-in catalog covers the 47 prefectures of Japan. A JSON file with
//! the same shape can replace it at startup.

use std::collections::{BTreeMap, HashMap};
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Top-level administrative area drawn as one tile on the map
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: u32,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub capital_sub_location_id: Option<u32>,
}

/// A locality within a region that posts can be tagged with
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubLocation {
    pub id: u32,
    pub region_id: u32,
    pub name: String,
}

/// On-disk layout of a catalog override file
#[derive(Deserialize)]
struct CatalogFile {
    regions: Vec<Region>,
    #[serde(default)]
    sub_locations: Vec<SubLocation>,
}

/// Prefecture id, name, then its cities with the capital first
const PREFECTURES: &[(u32, &str, &[&str])] = &[
    (1, "Hokkaido", &["Sapporo", "Hakodate", "Asahikawa"]),
    (2, "Aomori", &["Aomori", "Hirosaki"]),
    (3, "Iwate", &["Morioka", "Hiraizumi"]),
    (4, "Miyagi", &["Sendai", "Matsushima"]),
    (5, "Akita", &["Akita", "Kakunodate"]),
    (6, "Yamagata", &["Yamagata", "Sakata"]),
    (7, "Fukushima", &["Fukushima", "Aizuwakamatsu"]),
    (8, "Ibaraki", &["Mito", "Tsukuba"]),
    (9, "Tochigi", &["Utsunomiya", "Nikko"]),
    (10, "Gunma", &["Maebashi", "Kusatsu"]),
    (11, "Saitama", &["Saitama", "Kawagoe"]),
    (12, "Chiba", &["Chiba", "Narita"]),
    (13, "Tokyo", &["Shinjuku", "Shibuya", "Hachioji"]),
    (14, "Kanagawa", &["Yokohama", "Kamakura", "Kawasaki"]),
    (15, "Niigata", &["Niigata", "Sado"]),
    (16, "Toyama", &["Toyama", "Takaoka"]),
    (17, "Ishikawa", &["Kanazawa", "Wajima"]),
    (18, "Fukui", &["Fukui", "Tsuruga"]),
    (19, "Yamanashi", &["Kofu", "Fujiyoshida"]),
    (20, "Nagano", &["Nagano", "Matsumoto"]),
    (21, "Gifu", &["Gifu", "Takayama"]),
    (22, "Shizuoka", &["Shizuoka", "Hamamatsu", "Atami"]),
    (23, "Aichi", &["Nagoya", "Toyota"]),
    (24, "Mie", &["Tsu", "Ise"]),
    (25, "Shiga", &["Otsu", "Hikone"]),
    (26, "Kyoto", &["Kyoto", "Uji"]),
    (27, "Osaka", &["Osaka", "Sakai"]),
    (28, "Hyogo", &["Kobe", "Himeji"]),
    (29, "Nara", &["Nara", "Yoshino"]),
    (30, "Wakayama", &["Wakayama", "Shirahama"]),
    (31, "Tottori", &["Tottori", "Yonago"]),
    (32, "Shimane", &["Matsue", "Izumo"]),
    (33, "Okayama", &["Okayama", "Kurashiki"]),
    (34, "Hiroshima", &["Hiroshima", "Hatsukaichi", "Onomichi"]),
    (35, "Yamaguchi", &["Yamaguchi", "Shimonoseki"]),
    (36, "Tokushima", &["Tokushima", "Naruto"]),
    (37, "Kagawa", &["Takamatsu", "Kotohira"]),
    (38, "Ehime", &["Matsuyama", "Imabari"]),
    (39, "Kochi", &["Kochi", "Shimanto"]),
    (40, "Fukuoka", &["Fukuoka", "Kitakyushu", "Dazaifu"]),
    (41, "Saga", &["Saga", "Karatsu"]),
    (42, "Nagasaki", &["Nagasaki", "Sasebo"]),
    (43, "Kumamoto", &["Kumamoto", "Aso"]),
    (44, "Oita", &["Oita", "Beppu", "Yufu"]),
    (45, "Miyazaki", &["Miyazaki", "Takachiho"]),
    (46, "Kagoshima", &["Kagoshima", "Yakushima"]),
    (47, "Okinawa", &["Naha", "Ishigaki", "Nago"]),
];

/// Read-only lookup tables for regions and sub-locations
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: BTreeMap<u32, Region>,
    sub_locations: HashMap<u32, SubLocation>,
}

impl RegionCatalog {
    /// The 47 prefectures of Japan
    ///
    /// Sub-location ids are `region_id * 1000 + n`, where `n = 1` is the capital.
    pub fn builtin() -> Self {
        let mut regions = BTreeMap::new();
        let mut sub_locations = HashMap::new();

        for &(id, name, cities) in PREFECTURES {
            for (n, city) in (1u32..).zip(cities.iter()) {
                let sub_id = id * 1000 + n;
                sub_locations.insert(
                    sub_id,
                    SubLocation {
                        id: sub_id,
                        region_id: id,
                        name: city.to_string(),
                    },
                );
            }

            regions.insert(
                id,
                Region {
                    id,
                    name: name.to_string(),
                    code: format!("JP-{:02}", id),
                    capital_sub_location_id: Some(id * 1000 + 1),
                },
            );
        }

        Self {
            regions,
            sub_locations,
        }
    }

    /// Builds a catalog from flat lists, rejecting inconsistent data
    pub fn from_parts(regions: Vec<Region>, sub_locations: Vec<SubLocation>) -> AppResult<Self> {
        let mut region_map = BTreeMap::new();
        for region in regions {
            let id = region.id;
            if region_map.insert(id, region).is_some() {
                return Err(AppError::Config(format!("duplicate region id {}", id)));
            }
        }

        let mut sub_map = HashMap::new();
        for sub in sub_locations {
            if !region_map.contains_key(&sub.region_id) {
                return Err(AppError::Config(format!(
                    "sub-location {} references unknown region {}",
                    sub.id, sub.region_id
                )));
            }
            let id = sub.id;
            if sub_map.insert(id, sub).is_some() {
                return Err(AppError::Config(format!("duplicate sub-location id {}", id)));
            }
        }

        for region in region_map.values() {
            if let Some(capital_id) = region.capital_sub_location_id {
                match sub_map.get(&capital_id) {
                    Some(sub) if sub.region_id == region.id => {}
                    _ => {
                        return Err(AppError::Config(format!(
                            "capital {} of region {} is not one of its sub-locations",
                            capital_id, region.id
                        )))
                    }
                }
            }
        }

        Ok(Self {
            regions: region_map,
            sub_locations: sub_map,
        })
    }

    pub fn from_json_str(raw: &str) -> AppResult<Self> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("invalid region catalog: {}", e)))?;
        Self::from_parts(file.regions, file.sub_locations)
    }

    /// Reads and validates a catalog override file
    pub fn load(path: &str) -> AppResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path, e)))?;
        Self::from_json_str(&raw)
    }

    pub fn region(&self, id: u32) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn sub_location(&self, id: u32) -> Option<&SubLocation> {
        self.sub_locations.get(&id)
    }

    /// Region a sub-location belongs to, if both are known
    pub fn region_of(&self, sub_location_id: u32) -> Option<u32> {
        self.sub_locations
            .get(&sub_location_id)
            .map(|sub| sub.region_id)
            .filter(|region_id| self.regions.contains_key(region_id))
    }

    pub fn capital(&self, region_id: u32) -> Option<&SubLocation> {
        self.region(region_id)
            .and_then(|region| region.capital_sub_location_id)
            .and_then(|id| self.sub_location(id))
    }

    /// All regions in ascending id order
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn total_regions(&self) -> usize {
        self.regions.len()
    }
}
