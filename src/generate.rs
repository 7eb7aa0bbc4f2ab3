//! Seeded starter-map generation: clustered terrain patches plus a handful
//! of spaced-out cities.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catalog::TerrainKind;
use crate::grid::{Coord, GridState};

const TERRAIN_DENSITIES: [(TerrainKind, f32); 7] = [
    (TerrainKind::Field, 0.22),
    (TerrainKind::Forest, 0.14),
    (TerrainKind::Water, 0.08),
    (TerrainKind::Mountain, 0.07),
    (TerrainKind::FieldCrop, 0.05),
    (TerrainKind::MountainMetal, 0.04),
    (TerrainKind::Ocean, 0.04),
];

const MIN_CITY_SPACING: u32 = 3;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub rows: u32,
    pub cols: u32,
    pub seed: u64,
    pub cities: u32,
    /// Probability that a new tile of a kind grows an existing patch of the
    /// same kind instead of starting somewhere fresh.
    pub clustering: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 12,
            cols: 12,
            seed: 0,
            cities: 3,
            clustering: 0.6,
        }
    }
}

pub fn generate(config: &GeneratorConfig) -> GridState {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut grid = GridState::new(config.rows, config.cols);

    for (kind, density) in TERRAIN_DENSITIES {
        scatter_terrain(&mut grid, &mut rng, kind, density, config.clustering);
    }
    place_cities(&mut grid, &mut rng, config.cities);
    grid
}

fn scatter_terrain(
    grid: &mut GridState,
    rng: &mut ChaCha8Rng,
    kind: TerrainKind,
    density: f32,
    clustering: f32,
) {
    let total = grid.rows() * grid.cols();
    let target = (total as f32 * density).round() as u32;
    // Crowded maps can run out of free tiles; the attempt bound keeps the
    // loop finite instead of insisting on the target.
    let max_attempts = target * 20 + 20;

    let mut patch: Vec<Coord> = Vec::new();
    let mut placed = 0;
    for _ in 0..max_attempts {
        if placed >= target {
            break;
        }
        let coord = if !patch.is_empty() && rng.gen::<f32>() < clustering {
            let anchor = patch[rng.gen_range(0..patch.len())];
            match neighbour(rng, anchor, grid.rows(), grid.cols()) {
                Some(coord) => coord,
                None => continue,
            }
        } else {
            random_coord(rng, grid.rows(), grid.cols())
        };
        if grid.terrain_at(coord).is_empty() {
            grid.set_terrain(coord, kind);
            patch.push(coord);
            placed += 1;
        }
    }
}

fn place_cities(grid: &mut GridState, rng: &mut ChaCha8Rng, count: u32) {
    let max_attempts = count * 200 + 20;
    let mut next_id = 1;
    for _ in 0..max_attempts {
        if grid.cities().len() as u32 >= count {
            break;
        }
        let coord = random_coord(rng, grid.rows(), grid.cols());
        if matches!(
            grid.terrain_at(coord),
            TerrainKind::Water | TerrainKind::Ocean
        ) {
            continue;
        }
        let spaced = grid
            .cities()
            .iter()
            .all(|city| coord.chebyshev(city.coord()) >= MIN_CITY_SPACING);
        if spaced {
            grid.toggle_city(coord, next_id);
            next_id += 1;
        }
    }
}

fn random_coord(rng: &mut ChaCha8Rng, rows: u32, cols: u32) -> Coord {
    Coord::new(rng.gen_range(0..rows), rng.gen_range(0..cols))
}

fn neighbour(rng: &mut ChaCha8Rng, anchor: Coord, rows: u32, cols: u32) -> Option<Coord> {
    let dr = rng.gen_range(-1_i64..=1);
    let dc = rng.gen_range(-1_i64..=1);
    if dr == 0 && dc == 0 {
        return None;
    }
    let row = anchor.row as i64 + dr;
    let col = anchor.col as i64 + dc;
    (row >= 0 && col >= 0 && row < rows as i64 && col < cols as i64)
        .then(|| Coord::new(row as u32, col as u32))
}
