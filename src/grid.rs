use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::TerrainKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: u32,
    pub col: u32,
}

impl Coord {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn chebyshev(self, other: Coord) -> u32 {
        self.row
            .abs_diff(other.row)
            .max(self.col.abs_diff(other.col))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub row: u32,
    pub col: u32,
    pub expanded: bool,
}

impl City {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityToggle {
    Added(u32),
    Removed(u32),
}

/// The authoritative map: sparse terrain plus the city list.
///
/// Tiles hold entries only for non-empty terrain. Entries outside the current
/// bounds are kept (dormant) across a shrink and become reachable again when
/// the bounds grow; nothing here ever prunes them.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    rows: u32,
    cols: u32,
    tiles: HashMap<Coord, TerrainKind>,
    cities: Vec<City>,
}

impl GridState {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            tiles: HashMap::new(),
            cities: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        rows: u32,
        cols: u32,
        tiles: HashMap<Coord, TerrainKind>,
        cities: Vec<City>,
    ) -> Self {
        Self {
            rows,
            cols,
            tiles,
            cities,
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    pub fn terrain_at(&self, coord: Coord) -> TerrainKind {
        self.tiles
            .get(&coord)
            .copied()
            .unwrap_or(TerrainKind::Empty)
    }

    pub fn tiles(&self) -> &HashMap<Coord, TerrainKind> {
        &self.tiles
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city_at(&self, coord: Coord) -> Option<&City> {
        self.cities.iter().find(|city| city.coord() == coord)
    }

    /// Paint `kind` at `coord`. Painting `Empty` removes the entry, keeping
    /// the map sparse. Returns whether the stored value actually changed.
    pub fn set_terrain(&mut self, coord: Coord, kind: TerrainKind) -> bool {
        if kind.is_empty() {
            self.tiles.remove(&coord).is_some()
        } else {
            self.tiles.insert(coord, kind) != Some(kind)
        }
    }

    /// One atomic toggle: remove the city at `coord` if present, otherwise
    /// create one there with `id` and `expanded = false`. The caller owns the
    /// id counter and advances it only on `Added`.
    pub fn toggle_city(&mut self, coord: Coord, id: u32) -> CityToggle {
        if let Some(index) = self.cities.iter().position(|city| city.coord() == coord) {
            let removed = self.cities.remove(index);
            CityToggle::Removed(removed.id)
        } else {
            self.cities.push(City {
                id,
                row: coord.row,
                col: coord.col,
                expanded: false,
            });
            CityToggle::Added(id)
        }
    }

    /// Flip `expanded` on the city at `coord`. Returns false when no city is
    /// there; that case is a plain no-op, not an error.
    pub fn toggle_expansion(&mut self, coord: Coord) -> bool {
        match self.cities.iter_mut().find(|city| city.coord() == coord) {
            Some(city) => {
                city.expanded = !city.expanded;
                true
            }
            None => false,
        }
    }

    /// Update dimensions only. Tiles and cities are untouched, so entries
    /// that fall outside the new bounds go dormant instead of being purged.
    pub fn resize(&mut self, rows: u32, cols: u32) {
        self.rows = rows;
        self.cols = cols;
    }
}
