//! Text form of the map as saved and loaded by the editor:
//! `{"rows": R, "cols": C, "tiles": {"r,c": kind}, "cities": [...]}`.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::TerrainKind;
use crate::grid::{City, Coord, GridState};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed map file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("malformed tile key `{0}` (expected \"row,col\")")]
    TileKey(String),
    #[error("map dimensions must be positive")]
    Dimensions,
    #[error("city ids must be positive")]
    CityId,
    #[error("city id {0} is too large")]
    CityIdRange(u32),
    #[error("duplicate city id {0}")]
    DuplicateCityId(u32),
    #[error("two cities share tile ({0}, {1})")]
    CityCollision(u32, u32),
}

/// A successfully parsed map plus the repaired id counter:
/// max(existing city ids) + 1, or 1 for a city-less map.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMap {
    pub grid: GridState,
    pub next_city_id: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct MapFile {
    rows: u32,
    cols: u32,
    tiles: BTreeMap<String, TerrainKind>,
    cities: Vec<City>,
}

pub fn serialize(grid: &GridState) -> String {
    let tiles = grid
        .tiles()
        .iter()
        .map(|(coord, kind)| (tile_key(*coord), *kind))
        .collect();
    let file = MapFile {
        rows: grid.rows(),
        cols: grid.cols(),
        tiles,
        cities: grid.cities().to_vec(),
    };
    serde_json::to_string_pretty(&file).expect("map file serialization cannot fail")
}

/// All-or-nothing: any structural failure returns an error and yields no
/// partially built state for the caller to swap in.
pub fn deserialize(text: &str) -> Result<LoadedMap, CodecError> {
    let file: MapFile = serde_json::from_str(text)?;
    if file.rows == 0 || file.cols == 0 {
        return Err(CodecError::Dimensions);
    }

    let mut tiles = HashMap::new();
    for (key, kind) in &file.tiles {
        let coord = parse_tile_key(key)?;
        // Absence already means "no terrain"; a stored empty entry is noise.
        if !kind.is_empty() {
            tiles.insert(coord, *kind);
        }
    }

    let mut seen_ids = HashSet::new();
    let mut seen_coords = HashSet::new();
    for city in &file.cities {
        if city.id == 0 {
            return Err(CodecError::CityId);
        }
        if !seen_ids.insert(city.id) {
            return Err(CodecError::DuplicateCityId(city.id));
        }
        if !seen_coords.insert(city.coord()) {
            return Err(CodecError::CityCollision(city.row, city.col));
        }
    }

    // The repaired counter must itself be a mintable id, so the top of the
    // id space cannot appear in a file.
    let next_city_id = match file.cities.iter().map(|city| city.id).max() {
        None => 1,
        Some(max) => max.checked_add(1).ok_or(CodecError::CityIdRange(max))?,
    };

    Ok(LoadedMap {
        grid: GridState::from_parts(file.rows, file.cols, tiles, file.cities),
        next_city_id,
    })
}

pub(crate) fn tile_key(coord: Coord) -> String {
    format!("{},{}", coord.row, coord.col)
}

fn parse_tile_key(key: &str) -> Result<Coord, CodecError> {
    key.split_once(',')
        .and_then(|(row, col)| Some(Coord::new(row.parse().ok()?, col.parse().ok()?)))
        .ok_or_else(|| CodecError::TileKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_keys_parse_strictly() {
        assert_eq!(parse_tile_key("3,7").expect("parses"), Coord::new(3, 7));
        assert!(parse_tile_key("3").is_err());
        assert!(parse_tile_key("3,7,1").is_err());
        assert!(parse_tile_key("a,b").is_err());
        assert!(parse_tile_key("-1,2").is_err());
    }
}
