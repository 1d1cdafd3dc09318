//! Benchmark tests for critical operations
//!
//! Run with: cargo test --release -- --nocapture bench

use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

use chrono::{Duration, TimeZone, Utc};
use visitmap::catalog::RegionCatalog;
use visitmap::config::Config;
use visitmap::database::{init_db, AppState};
use visitmap::favorites::set_favorite;
use visitmap::map::assemble_map;
use visitmap::model::{CreatePostRequest, NewPhoto, SetFavoriteRequest};
use visitmap::posts::record_post;

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(),
{
    let start = Instant::now();

    for _ in 0..iterations {
        f();
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_millis() as f64 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

fn setup_state() -> (AppState, NamedTempFile) {
    let temp_db = NamedTempFile::new().unwrap();
    let db = init_db(temp_db.path().to_str().unwrap()).unwrap();
    (
        AppState::new(db, RegionCatalog::builtin(), Config::default()),
        temp_db,
    )
}

/// Spreads `count` posts with two photos each across every prefecture
fn fill_posts(state: &AppState, user: &str, count: u32) -> Vec<(u32, String)> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let mut favorites = Vec::new();

    for i in 0..count {
        let region_id = i % 47 + 1;
        let request = CreatePostRequest {
            sub_location_id: Some(region_id * 1000 + 1),
            created_at: Some(start + Duration::hours(i as i64)),
            photos: (0..2)
                .map(|n| NewPhoto {
                    title: None,
                    description: None,
                    image_url: format!("/uploads/{}-{}.webp", i, n),
                    thumbnail_url: None,
                })
                .collect(),
        };
        let entry = record_post(&state.db, &state.catalog, user, request).unwrap();
        if i < 47 {
            favorites.push((region_id, entry.photos[0].id.clone()));
        }
    }

    favorites
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_record_posts() {
    println!("\n=== Benchmark: Record Posts ===\n");

    let (state, _temp_db) = setup_state();

    let mut i = 0u32;
    benchmark("Record post with 2 photos", 1000, || {
        let request = CreatePostRequest {
            sub_location_id: Some((i % 47 + 1) * 1000 + 1),
            created_at: None,
            photos: vec![
                NewPhoto {
                    image_url: "/uploads/a.webp".to_string(),
                    ..Default::default()
                },
                NewPhoto {
                    image_url: "/uploads/b.webp".to_string(),
                    ..Default::default()
                },
            ],
        };
        record_post(&state.db, &state.catalog, "bench_user", request).unwrap();
        i += 1;
    });
}

#[test]
#[ignore]
fn bench_assemble_map_scaling() {
    println!("\n=== Benchmark: Map Assembly Scaling ===\n");

    for &size in &[100u32, 1000, 5000] {
        let (state, _temp_db) = setup_state();
        let user = format!("scale_user_{}", size);

        let start = Instant::now();
        let favorites = fill_posts(&state, &user, size);
        println!("  {} posts, fill time: {:?}", size, start.elapsed());

        for (region_id, photo_id) in favorites {
            let request = SetFavoriteRequest {
                region_id: Some(region_id),
                photo_id: Some(photo_id),
                ..Default::default()
            };
            set_favorite(&state.db, &state.catalog, Some(user.as_str()), &user, &request).unwrap();
        }

        benchmark(&format!("Assemble map over {} posts", size), 50, || {
            let map = assemble_map(&state.db, &state.catalog, &state.config, &user).unwrap();
            assert_eq!(map.total_visited, (size as usize).min(47));
        });
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn bench_concurrent_favorites() {
    println!("\n=== Benchmark: Concurrent Favorite Upserts ===\n");

    let (state, _temp_db) = setup_state();
    let state = Arc::new(state);
    let favorites = Arc::new(fill_posts(&state, "busy_user", 47));

    let num_tasks = 50;
    let ops_per_task = 20;

    println!(
        "  Running {} concurrent tasks with {} ops each...",
        num_tasks, ops_per_task
    );

    let start = Instant::now();
    let mut handles = vec![];

    for task_id in 0..num_tasks {
        let state = state.clone();
        let favorites = favorites.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            for op_id in 0..ops_per_task {
                let (region_id, photo_id) = &favorites[(task_id + op_id) % favorites.len()];
                let request = SetFavoriteRequest {
                    region_id: Some(*region_id),
                    photo_id: Some(photo_id.clone()),
                    position_x: Some((op_id % 101) as i64),
                    ..Default::default()
                };
                set_favorite(&state.db, &state.catalog, Some("busy_user"), "busy_user", &request)
                    .unwrap();
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let duration = start.elapsed();
    let total_ops = num_tasks * ops_per_task;

    println!("  Total operations: {}", total_ops);
    println!("  Total time: {:?}", duration);
    println!(
        "  Throughput: {:.0} ops/sec\n",
        total_ops as f64 / duration.as_secs_f64()
    );

    let map = assemble_map(&state.db, &state.catalog, &state.config, "busy_user").unwrap();
    assert_eq!(map.total_visited, 47);
    assert!(map.regions.iter().all(|entry| entry.favorite_photo.is_some()));
}

#[test]
fn bench_summary() {
    println!("\n{}", "=".repeat(60));
    println!("Benchmark Test Suite");
    println!("{}", "=".repeat(60));
    println!("\nTo run benchmarks, use:");
    println!("  cargo test --release bench -- --ignored --nocapture");
    println!("\nAvailable benchmarks:");
    println!("  • bench_record_posts          - Post ingest performance");
    println!("  • bench_assemble_map_scaling  - Map assembly at different post counts");
    println!("  • bench_concurrent_favorites  - Concurrent favorite upserts");
    println!("\n{}\n", "=".repeat(60));
}
