use thiserror::Error;

use crate::catalog::TerrainKind;
use crate::codec::{self, CodecError};
use crate::grid::{CityToggle, Coord, GridState};
use crate::overlay::{OptimisationResult, Overlay};

/// The selected editing mode. Painting `Empty` is the eraser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Paint(TerrainKind),
    City,
}

impl Tool {
    pub fn id(self) -> &'static str {
        match self {
            Tool::City => "city",
            Tool::Paint(kind) => kind.id(),
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        if id == "city" {
            Some(Tool::City)
        } else {
            TerrainKind::from_id(id).map(Tool::Paint)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press(Coord),
    Enter(Coord),
    Release,
    Context(Coord),
}

/// Issued when an optimisation request leaves the session; carries the
/// request sequence number and the grid revision the snapshot was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimiseTicket {
    seq: u64,
    revision: u64,
}

/// What became of an arriving optimiser response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    /// Replaced the overlay wholesale.
    Applied,
    /// A newer request was issued after this one; dropped.
    Superseded,
    /// The grid changed after this request was issued; dropped.
    StaleGrid,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("rows and cols must be positive")]
    InvalidDimensions,
}

/// All mutable editor state for one session: the grid, the overlay, the
/// active tool, the pointer flag and the counters. Everything that mutates
/// it goes through the methods here; there are no ambient globals.
#[derive(Debug)]
pub struct Session {
    grid: GridState,
    overlay: Overlay,
    active_tool: Option<Tool>,
    pointer_engaged: bool,
    next_city_id: u32,
    revision: u64,
    optimise_seq: u64,
}

impl Session {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            grid: GridState::new(rows, cols),
            overlay: Overlay::default(),
            active_tool: None,
            pointer_engaged: false,
            next_city_id: 1,
            revision: 0,
            optimise_seq: 0,
        }
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.active_tool
    }

    pub fn pointer_engaged(&self) -> bool {
        self.pointer_engaged
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn next_city_id(&self) -> u32 {
        self.next_city_id
    }

    /// Idempotent; only changes what a future pointer event will do.
    pub fn select_tool(&mut self, tool: Option<Tool>) {
        self.active_tool = tool;
    }

    pub fn pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press(coord) => {
                self.pointer_engaged = true;
                self.apply_active_tool(coord);
            }
            // Drag-painting: a press repeated per entered tile. The city
            // tool acts on discrete presses only, never on drag.
            PointerEvent::Enter(coord) => {
                if self.pointer_engaged && self.active_tool != Some(Tool::City) {
                    self.apply_active_tool(coord);
                }
            }
            // The release listener is global; releasing outside the grid
            // still ends the drag.
            PointerEvent::Release => {
                self.pointer_engaged = false;
            }
            // Expansion toggling needs no active tool.
            PointerEvent::Context(coord) => {
                if self.grid.toggle_expansion(coord) {
                    self.note_edit();
                }
            }
        }
    }

    fn apply_active_tool(&mut self, coord: Coord) {
        match self.active_tool {
            Some(Tool::Paint(kind)) => {
                if self.grid.set_terrain(coord, kind) {
                    self.note_edit();
                }
            }
            Some(Tool::City) => {
                // The final id stays unminted so the counter can always
                // advance. Removal needs no fresh id.
                if self.grid.city_at(coord).is_none() && self.next_city_id == u32::MAX {
                    return;
                }
                match self.grid.toggle_city(coord, self.next_city_id) {
                    CityToggle::Added(_) => {
                        // Consumed ids are never recycled, even if the city
                        // is toggled away a moment later.
                        self.next_city_id += 1;
                    }
                    CityToggle::Removed(_) => {}
                }
                self.note_edit();
            }
            None => {}
        }
    }

    pub fn resize(&mut self, rows: u32, cols: u32) -> Result<bool, SessionError> {
        if rows == 0 || cols == 0 {
            return Err(SessionError::InvalidDimensions);
        }
        if rows == self.grid.rows() && cols == self.grid.cols() {
            return Ok(false);
        }
        self.grid.resize(rows, cols);
        self.note_edit();
        Ok(true)
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.clear();
        // Clearing also retires any in-flight request: a response issued
        // before the clear must not resurrect what the user just dismissed.
        self.optimise_seq += 1;
    }

    /// Tag an outgoing optimisation request. The caller snapshots the grid
    /// while still holding the session, then lets the ticket travel with the
    /// network call.
    pub fn begin_optimise(&mut self) -> OptimiseTicket {
        self.optimise_seq += 1;
        OptimiseTicket {
            seq: self.optimise_seq,
            revision: self.revision,
        }
    }

    /// Apply a response if it is still current: the latest issued request
    /// wins regardless of arrival order, and a response computed against an
    /// edited grid is dropped rather than drawn.
    pub fn apply_optimisation(
        &mut self,
        ticket: OptimiseTicket,
        result: OptimisationResult,
    ) -> OverlayOutcome {
        if ticket.seq != self.optimise_seq {
            return OverlayOutcome::Superseded;
        }
        if ticket.revision != self.revision {
            return OverlayOutcome::StaleGrid;
        }
        self.overlay.apply(result);
        OverlayOutcome::Applied
    }

    pub fn save(&self) -> String {
        codec::serialize(&self.grid)
    }

    /// All-or-nothing: on any codec failure the live state is untouched.
    /// On success the id counter is repaired from the loaded cities and the
    /// overlay is discarded; a freshly loaded map has no valid overlay.
    pub fn load(&mut self, text: &str) -> Result<(), CodecError> {
        let loaded = codec::deserialize(text)?;
        self.grid = loaded.grid;
        self.next_city_id = loaded.next_city_id;
        self.note_edit();
        Ok(())
    }

    /// Every actual grid change lands here: the revision advances (dropping
    /// any in-flight optimisation response) and the overlay is cleared, so
    /// what is drawn can never describe a grid the user has already edited.
    fn note_edit(&mut self) {
        self.revision += 1;
        self.overlay.clear();
    }
}
