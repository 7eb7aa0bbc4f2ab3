//! Fixed catalogs of terrain and building kinds: wire identifiers, the
//! terrain-to-building eligibility table and building incomes. Pure lookup
//! tables, shared by the editor and the optimiser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    #[serde(rename = "field")]
    Field,
    #[serde(rename = "field+crop")]
    FieldCrop,
    #[serde(rename = "forest")]
    Forest,
    #[serde(rename = "mountain")]
    Mountain,
    #[serde(rename = "mountain+metal")]
    MountainMetal,
    #[serde(rename = "water")]
    Water,
    #[serde(rename = "ocean")]
    Ocean,
    #[serde(rename = "empty")]
    Empty,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 8] = [
        TerrainKind::Field,
        TerrainKind::FieldCrop,
        TerrainKind::Forest,
        TerrainKind::Mountain,
        TerrainKind::MountainMetal,
        TerrainKind::Water,
        TerrainKind::Ocean,
        TerrainKind::Empty,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TerrainKind::Field => "field",
            TerrainKind::FieldCrop => "field+crop",
            TerrainKind::Forest => "forest",
            TerrainKind::Mountain => "mountain",
            TerrainKind::MountainMetal => "mountain+metal",
            TerrainKind::Water => "water",
            TerrainKind::Ocean => "ocean",
            TerrainKind::Empty => "empty",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn is_empty(self) -> bool {
        matches!(self, TerrainKind::Empty)
    }

    /// The buildings this terrain can host, cheapest-first within a tier.
    /// Bare mountains, water, ocean and empty tiles host nothing.
    pub fn eligible(self) -> &'static [BuildingKind] {
        use BuildingKind::*;
        match self {
            TerrainKind::Field => &[Sawmill, Windmill, Forge, Market],
            TerrainKind::FieldCrop => &[Sawmill, Windmill, Forge, Market, Farm],
            TerrainKind::Forest => &[LumberHut, Forge],
            TerrainKind::MountainMetal => &[Mine],
            TerrainKind::Mountain
            | TerrainKind::Water
            | TerrainKind::Ocean
            | TerrainKind::Empty => &[],
        }
    }

    pub fn accepts(self, building: BuildingKind) -> bool {
        self.eligible().contains(&building)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Sawmill,
    Windmill,
    Forge,
    Market,
    LumberHut,
    Farm,
    Mine,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 7] = [
        BuildingKind::Sawmill,
        BuildingKind::Windmill,
        BuildingKind::Forge,
        BuildingKind::Market,
        BuildingKind::LumberHut,
        BuildingKind::Farm,
        BuildingKind::Mine,
    ];

    pub fn id(self) -> &'static str {
        match self {
            BuildingKind::Sawmill => "sawmill",
            BuildingKind::Windmill => "windmill",
            BuildingKind::Forge => "forge",
            BuildingKind::Market => "market",
            BuildingKind::LumberHut => "lumber_hut",
            BuildingKind::Farm => "farm",
            BuildingKind::Mine => "mine",
        }
    }

    /// Income per turn once built.
    pub fn income(self) -> i64 {
        match self {
            BuildingKind::Market => 4,
            BuildingKind::Forge | BuildingKind::Mine => 3,
            BuildingKind::Sawmill | BuildingKind::Windmill | BuildingKind::Farm => 2,
            BuildingKind::LumberHut => 1,
        }
    }
}
