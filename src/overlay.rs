use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::BuildingKind;
use crate::grid::Coord;

/// One per-city income line from the optimiser, positioned at the city tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub city_id: u32,
    pub row: u32,
    pub col: u32,
    pub income: i64,
}

/// A complete optimiser verdict, produced wholesale from one response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptimisationResult {
    pub placements: HashMap<Coord, BuildingKind>,
    pub markets: Vec<MarketEntry>,
    pub total_income: i64,
    pub burns: HashSet<Coord>,
}

/// The non-persisted layer drawn over the base map. Replaced wholesale by
/// each applied result, emptied wholesale by `clear`; never merged, never
/// validated against the grid it is drawn over.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    placements: HashMap<Coord, BuildingKind>,
    markets: Vec<MarketEntry>,
    total_income: i64,
    burns: HashSet<Coord>,
}

impl Overlay {
    pub fn apply(&mut self, result: OptimisationResult) {
        self.placements = result.placements;
        self.markets = result.markets;
        self.total_income = result.total_income;
        self.burns = result.burns;
    }

    pub fn clear(&mut self) {
        self.placements.clear();
        self.markets.clear();
        self.total_income = 0;
        self.burns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
            && self.markets.is_empty()
            && self.total_income == 0
            && self.burns.is_empty()
    }

    pub fn placement_at(&self, coord: Coord) -> Option<BuildingKind> {
        self.placements.get(&coord).copied()
    }

    pub fn is_burn(&self, coord: Coord) -> bool {
        self.burns.contains(&coord)
    }

    pub fn placements(&self) -> &HashMap<Coord, BuildingKind> {
        &self.placements
    }

    pub fn markets(&self) -> &[MarketEntry] {
        &self.markets
    }

    pub fn total_income(&self) -> i64 {
        self.total_income
    }

    pub fn burns(&self) -> &HashSet<Coord> {
        &self.burns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sawmill_verdict() -> OptimisationResult {
        let mut placements = HashMap::new();
        placements.insert(Coord::new(0, 0), BuildingKind::Sawmill);
        OptimisationResult {
            placements,
            markets: vec![MarketEntry {
                city_id: 1,
                row: 0,
                col: 1,
                income: 4,
            }],
            total_income: 4,
            burns: HashSet::new(),
        }
    }

    #[test]
    fn apply_replaces_the_previous_result_wholesale() {
        let mut overlay = Overlay::default();
        overlay.apply(sawmill_verdict());
        assert_eq!(
            overlay.placement_at(Coord::new(0, 0)),
            Some(BuildingKind::Sawmill)
        );

        let mut placements = HashMap::new();
        placements.insert(Coord::new(2, 2), BuildingKind::Mine);
        let mut burns = HashSet::new();
        burns.insert(Coord::new(3, 3));
        overlay.apply(OptimisationResult {
            placements,
            markets: Vec::new(),
            total_income: 3,
            burns,
        });

        assert_eq!(
            overlay.placement_at(Coord::new(0, 0)),
            None,
            "a new result must not be merged into the old one"
        );
        assert_eq!(
            overlay.placement_at(Coord::new(2, 2)),
            Some(BuildingKind::Mine)
        );
        assert!(overlay.markets().is_empty());
        assert_eq!(overlay.total_income(), 3);
        assert!(overlay.is_burn(Coord::new(3, 3)));
    }

    #[test]
    fn clear_empties_all_four_fields() {
        let mut overlay = Overlay::default();
        assert!(overlay.is_empty());

        overlay.apply(sawmill_verdict());
        assert!(!overlay.is_empty());

        overlay.clear();
        assert!(overlay.is_empty());
        assert!(overlay.placements().is_empty());
        assert!(overlay.markets().is_empty());
        assert_eq!(overlay.total_income(), 0);
        assert!(overlay.burns().is_empty());
    }
}
