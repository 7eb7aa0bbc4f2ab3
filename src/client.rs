use std::collections::{HashMap, HashSet};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{BuildingKind, TerrainKind};
use crate::grid::{City, Coord, GridState};
use crate::overlay::{MarketEntry, OptimisationResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub row: u32,
    pub col: u32,
    pub terrain: TerrainKind,
}

/// The normalized snapshot sent to the optimiser: a dense list of the
/// non-empty tiles plus the full city list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimiseRequest {
    pub tiles: Vec<TileRecord>,
    pub cities: Vec<City>,
}

impl OptimiseRequest {
    pub fn from_grid(grid: &GridState) -> Self {
        let mut tiles: Vec<TileRecord> = grid
            .tiles()
            .iter()
            .map(|(coord, kind)| TileRecord {
                row: coord.row,
                col: coord.col,
                terrain: *kind,
            })
            .collect();
        tiles.sort_by_key(|tile| (tile.row, tile.col));
        Self {
            tiles,
            cities: grid.cities().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub row: u32,
    pub col: u32,
    pub building: BuildingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRecord {
    pub row: u32,
    pub col: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimiseResponse {
    pub placements: Vec<PlacementRecord>,
    pub markets: Vec<MarketEntry>,
    pub total_income: i64,
    /// Older services omit this field; absence means no burns.
    #[serde(default)]
    pub burns: Vec<BurnRecord>,
}

impl OptimiseResponse {
    pub fn into_result(self) -> OptimisationResult {
        let placements: HashMap<Coord, BuildingKind> = self
            .placements
            .into_iter()
            .map(|p| (Coord::new(p.row, p.col), p.building))
            .collect();
        let burns: HashSet<Coord> = self
            .burns
            .into_iter()
            .map(|b| Coord::new(b.row, b.col))
            .collect();
        OptimisationResult {
            placements,
            markets: self.markets,
            total_income: self.total_income,
            burns,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("optimiser request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("optimiser returned HTTP {0}")]
    Status(StatusCode),
    #[error("optimiser response was not valid JSON: {0}")]
    Body(#[from] serde_json::Error),
}

/// Thin client for the placement-optimisation service.
#[derive(Debug, Clone)]
pub struct OptimiserClient {
    base_url: String,
    http: reqwest::Client,
}

impl OptimiserClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the snapshot and decode the report. Any failure leaves the
    /// caller's overlay untouched; transport, status and body problems
    /// surface as distinct error variants.
    pub async fn optimise(
        &self,
        request: &OptimiseRequest,
    ) -> Result<OptimiseResponse, ClientError> {
        let url = format!("{}/optimize", self.base_url.trim_end_matches('/'));
        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        let body = response.text().await?;
        let parsed = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}
