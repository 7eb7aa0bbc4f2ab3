//! Bundled reference optimiser. Honors the same wire contract as any
//! external service; the editor only ever talks to it over HTTP. The
//! placement strategy is a deterministic greedy: each workable tile goes to
//! its nearest city and receives the highest-income building its terrain
//! accepts (per the catalog tables), with the per-city uniques and the
//! forest burn rule below.

use std::collections::{HashMap, HashSet};

use crate::catalog::{BuildingKind, TerrainKind};
use crate::client::{BurnRecord, OptimiseRequest, OptimiseResponse, PlacementRecord};
use crate::grid::Coord;
use crate::overlay::MarketEntry;

/// Chebyshev reach of a city's territory.
const BASE_RADIUS: u32 = 1;
const EXPANDED_RADIUS: u32 = 2;

/// Forests beyond this many lumber huts in one city are marked for burning
/// instead of yet another hut.
const MAX_LUMBER_HUTS_PER_CITY: usize = 2;

fn unique_per_city(building: BuildingKind) -> bool {
    matches!(
        building,
        BuildingKind::Sawmill | BuildingKind::Windmill | BuildingKind::Forge | BuildingKind::Market
    )
}

pub fn solve(request: &OptimiseRequest) -> OptimiseResponse {
    let city_coords: HashSet<Coord> = request.cities.iter().map(|city| city.coord()).collect();

    // Row-major tile order keeps the whole pass deterministic whatever order
    // the request listed tiles in.
    let mut tiles: Vec<(Coord, TerrainKind)> = request
        .tiles
        .iter()
        .map(|tile| (Coord::new(tile.row, tile.col), tile.terrain))
        .collect();
    tiles.sort_by_key(|(coord, _)| *coord);

    // Each workable tile belongs to its nearest city in range; distance ties
    // go to the lower city id. Tiles a city sits on hold no building.
    let mut assigned: HashMap<u32, Vec<(Coord, TerrainKind)>> = HashMap::new();
    for (coord, terrain) in tiles {
        if terrain.is_empty() || city_coords.contains(&coord) {
            continue;
        }
        let owner = request
            .cities
            .iter()
            .filter_map(|city| {
                let radius = if city.expanded {
                    EXPANDED_RADIUS
                } else {
                    BASE_RADIUS
                };
                let distance = coord.chebyshev(city.coord());
                (distance <= radius).then_some((distance, city.id))
            })
            .min();
        if let Some((_, id)) = owner {
            assigned.entry(id).or_default().push((coord, terrain));
        }
    }

    let mut placements = Vec::new();
    let mut burns = Vec::new();
    let mut markets = Vec::new();
    let mut total_income = 0;

    for city in &request.cities {
        let mut used_uniques: HashSet<BuildingKind> = HashSet::new();
        let mut lumber_huts = 0usize;
        let mut city_income = 0i64;

        for (coord, terrain) in assigned.get(&city.id).map(Vec::as_slice).unwrap_or(&[]) {
            let mut choice: Option<BuildingKind> = None;
            for candidate in terrain.eligible() {
                if unique_per_city(*candidate) && used_uniques.contains(candidate) {
                    continue;
                }
                // Strictly-greater keeps the first listed building on income
                // ties, so the choice is stable.
                if choice.map_or(true, |current| candidate.income() > current.income()) {
                    choice = Some(*candidate);
                }
            }
            let Some(building) = choice else {
                continue;
            };

            if building == BuildingKind::LumberHut && lumber_huts >= MAX_LUMBER_HUTS_PER_CITY {
                burns.push(BurnRecord {
                    row: coord.row,
                    col: coord.col,
                });
                continue;
            }

            if building == BuildingKind::LumberHut {
                lumber_huts += 1;
            }
            if unique_per_city(building) {
                used_uniques.insert(building);
            }
            city_income += building.income();
            placements.push(PlacementRecord {
                row: coord.row,
                col: coord.col,
                building,
            });
        }

        total_income += city_income;
        markets.push(MarketEntry {
            city_id: city.id,
            row: city.row,
            col: city.col,
            income: city_income,
        });
    }

    OptimiseResponse {
        placements,
        markets,
        total_income,
        burns,
    }
}
