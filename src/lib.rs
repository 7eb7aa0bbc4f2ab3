pub mod catalog;
pub mod client;
pub mod codec;
pub mod config;
pub mod generate;
pub mod grid;
pub mod overlay;
pub mod session;
pub mod solver;
pub mod web;

pub use catalog::{BuildingKind, TerrainKind};
pub use grid::{City, Coord, GridState};
pub use session::{PointerEvent, Session, Tool};
