use std::collections::{HashMap, HashSet};

use mapforge::catalog::TerrainKind;
use mapforge::codec;
use mapforge::generate::{generate, GeneratorConfig};

#[test]
fn the_same_seed_yields_the_same_map() {
    let config = GeneratorConfig {
        seed: 42,
        ..Default::default()
    };
    let first = generate(&config);
    let second = generate(&config);
    assert_eq!(first, second, "generation must be a pure function of the seed");
}

#[test]
fn different_seeds_yield_different_maps() {
    let first = generate(&GeneratorConfig {
        seed: 1,
        ..Default::default()
    });
    let second = generate(&GeneratorConfig {
        seed: 2,
        ..Default::default()
    });
    assert_ne!(first.tiles(), second.tiles());
}

#[test]
fn cities_avoid_open_water_and_keep_their_distance() {
    let grid = generate(&GeneratorConfig {
        seed: 7,
        ..Default::default()
    });
    let cities = grid.cities();
    assert_eq!(cities.len(), 3);

    let mut ids = HashSet::new();
    for city in cities {
        assert!(ids.insert(city.id), "city ids must be unique");
        assert!(
            !matches!(
                grid.terrain_at(city.coord()),
                TerrainKind::Water | TerrainKind::Ocean
            ),
            "cities must not stand in water"
        );
    }
    for a in cities {
        for b in cities {
            if a.id != b.id {
                assert!(
                    a.coord().chebyshev(b.coord()) >= 3,
                    "cities {} and {} are packed too close",
                    a.id,
                    b.id
                );
            }
        }
    }
}

#[test]
fn terrain_counts_stay_under_the_density_targets() {
    let config = GeneratorConfig {
        seed: 3,
        ..Default::default()
    };
    let grid = generate(&config);
    let total = (config.rows * config.cols) as f32;

    let mut counts: HashMap<TerrainKind, u32> = HashMap::new();
    for kind in grid.tiles().values() {
        *counts.entry(*kind).or_default() += 1;
    }

    for (kind, density) in [
        (TerrainKind::Field, 0.22_f32),
        (TerrainKind::Forest, 0.14),
        (TerrainKind::Water, 0.08),
        (TerrainKind::Mountain, 0.07),
        (TerrainKind::FieldCrop, 0.05),
        (TerrainKind::MountainMetal, 0.04),
        (TerrainKind::Ocean, 0.04),
    ] {
        let target = (total * density).round() as u32;
        let count = counts.get(&kind).copied().unwrap_or(0);
        assert!(
            count <= target,
            "{kind:?} exceeded its target: {count} > {target}"
        );
    }
    assert!(
        grid.tiles().len() >= 60,
        "a default map should be mostly filled, got {} tiles",
        grid.tiles().len()
    );
}

#[test]
fn unclustered_generation_works_too() {
    let grid = generate(&GeneratorConfig {
        seed: 11,
        cities: 0,
        clustering: 0.0,
        ..Default::default()
    });
    assert!(grid.cities().is_empty());
    assert!(!grid.tiles().is_empty());
}

#[test]
fn tiny_grids_terminate_with_fewer_cities() {
    let grid = generate(&GeneratorConfig {
        rows: 1,
        cols: 1,
        seed: 0,
        cities: 3,
        clustering: 0.6,
    });
    assert!(
        grid.cities().len() <= 1,
        "one tile cannot hold spaced-out cities"
    );
}

#[test]
fn generated_maps_load_back_through_the_codec() {
    let grid = generate(&GeneratorConfig {
        seed: 99,
        ..Default::default()
    });
    let loaded = codec::deserialize(&codec::serialize(&grid)).expect("generated maps are valid");
    assert_eq!(loaded.grid, grid);
    assert_eq!(
        loaded.next_city_id,
        grid.cities().iter().map(|c| c.id).max().unwrap_or(0) + 1
    );
}
