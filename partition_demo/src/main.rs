//! Partition Demo
//!
//! Headless driver for the spatial partitioning library:
//! - Scatters axis-aligned cubes through a cubic region as one scene mesh
//! - Builds an octree and a BSP tree over it
//! - Throws random query boxes at both and compares the answers
//! - Logs build statistics and debug-view sizes
//!
//! Usage: `partition_demo [config.toml|config.ron]`. `RUST_LOG` overrides
//! the default `info` level.

mod demo_config;

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial_engine::config::Config;
use spatial_engine::debug::PartitionDebugVisualizer;
use spatial_engine::foundation::logging::{self, LevelFilter};
use spatial_engine::foundation::math::{Transform, Vec3};
use spatial_engine::geometry::{BoundingBox, Fragment};
use spatial_engine::physics::PartitionTree;
use spatial_engine::spatial::{BspTree, Octree};

use demo_config::{DemoConfig, QuerySettings, SceneSettings};

/// Merge `cube_count` randomly placed cubes into one world-space fragment
fn build_scene(settings: &SceneSettings) -> Fragment {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let half = settings.cube_half_extent;
    let unit = Fragment::cuboid(Vec3::zeros(), Vec3::new(half, half, half));
    let limit = settings.region * 0.5 - half;

    let cubes: Vec<Fragment> = (0..settings.cube_count)
        .map(|_| {
            let position = Vec3::new(
                rng.gen_range(-limit..=limit),
                rng.gen_range(-limit..=limit),
                rng.gen_range(-limit..=limit),
            );
            unit.transformed(&Transform::from_position(position))
        })
        .collect();

    Fragment::merge(&cubes)
}

fn query_boxes(settings: &QuerySettings, region: f32) -> Vec<BoundingBox> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let limit = region * 0.5;
    (0..settings.count)
        .map(|_| {
            let position = Vec3::new(
                rng.gen_range(-limit..=limit),
                rng.gen_range(-limit..=limit),
                rng.gen_range(-limit..=limit),
            );
            BoundingBox::cube(position, settings.half_extent)
        })
        .collect()
}

/// Run every query, returning the per-query answers
fn run_queries(name: &str, tree: &dyn PartitionTree, queries: &[BoundingBox]) -> Vec<bool> {
    let start = Instant::now();
    let hits: Vec<bool> = queries.iter().map(|query| tree.collision_test(query)).collect();
    log::info!(
        "{}: {}/{} queries hit, {} objects flagged, {:.2?}",
        name,
        hits.iter().filter(|&&hit| hit).count(),
        queries.len(),
        tree.colliding_objects().len(),
        start.elapsed()
    );
    hits
}

fn report_views(name: &str, tree: &dyn PartitionTree, visualizer: &PartitionDebugVisualizer) {
    let instances = visualizer.cell_instances(tree);
    let objects = visualizer.objects(tree);
    let colliding = objects.iter().filter(|object| object.is_colliding).count();
    log::info!(
        "{}: {} leaf cells ({} bytes of instance data), {} objects, {} highlighted",
        name,
        instances.len(),
        std::mem::size_of_val(instances.as_slice()),
        objects.len(),
        colliding
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(LevelFilter::Info);

    log::info!("Starting partition demo");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            DemoConfig::load_from_file(&path)?
        }
        None => DemoConfig::default(),
    };
    config.validate()?;

    let scene = build_scene(&config.scene);
    log::info!(
        "Scene: {} cubes, {} triangles in a {}-unit region",
        config.scene.cube_count,
        scene.triangle_count(),
        config.scene.region
    );

    let start = Instant::now();
    let mut octree = Octree::create(
        Vec3::from(config.octree.position),
        config.octree.half_extent,
        config.octree.stop_depth,
        vec![scene.clone()],
        &config.partition,
    );
    log::info!("Octree build took {:.2?}", start.elapsed());

    let start = Instant::now();
    let mut bsp = BspTree::build(vec![scene], config.bsp.depth, &config.partition);
    log::info!("BSP build took {:.2?}", start.elapsed());

    let queries = query_boxes(&config.queries, config.scene.region);
    let octree_hits = run_queries("Octree", &octree, &queries);
    let bsp_hits = run_queries("BSP", &bsp, &queries);

    let disagreements = octree_hits
        .iter()
        .zip(&bsp_hits)
        .filter(|(a, b)| a != b)
        .count();
    if disagreements > 0 {
        // Object boxes differ between the trees, so coarse answers can too
        log::info!("Trees disagreed on {} of {} queries", disagreements, queries.len());
    }

    let visualizer = PartitionDebugVisualizer::new();
    report_views("Octree", &octree, &visualizer);
    report_views("BSP", &bsp, &visualizer);

    octree.destroy();
    bsp.destroy();
    log::info!("Partition demo finished");

    Ok(())
}
