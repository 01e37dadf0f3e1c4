//! # Shared Simulation Library
//!
//! This crate contains the data model, constants, and state-transition rules
//! shared by every part of the game-server simulation benchmark. It serves as
//! the single source of truth for the simulation so that the sequential
//! baseline, the batch-parallel mode, and the pipelined mode all operate on
//! identical semantics.
//!
//! ## Core Components
//!
//! ### Simulation Constants
//! Arena dimensions, snapshot cadence, and the benchmark workload shape
//! (matches, clients, inputs per client). These are compile-time constants:
//! the benchmark is a fixed workload, not a configurable service.
//!
//! ### Commands
//! The [`Action`] enum and the [`Input`] tuple describe one command from a
//! synthetic client: which match it targets, which player issued it, the
//! logical tick it was generated for, and the movement to perform.
//!
//! ### Game Entities
//! [`PlayerState`] and [`MatchState`] represent the simulated world: two
//! players per match on a small integer grid, moved one cell at a time with
//! boundary clamping.
//!
//! ### Snapshots
//! A [`Snapshot`] is a value copy of a match's state tagged with the tick at
//! which it was captured. Snapshots are the restore points for the
//! rollback-and-resimulate machinery in the server crate.
//!
//! ## Design Philosophy
//!
//! All simulation state is integer-valued and `Copy`-sized, so snapshots and
//! replays are cheap value copies with no floating-point drift. Every type
//! derives `Serialize`/`Deserialize`: in a networked deployment these are
//! exactly the values that would cross the wire, and keeping them
//! serializable keeps the data model honest about that boundary.

use serde::{Deserialize, Serialize};

/// Arena width in cells. Player `x` coordinates live in `[0, ARENA_WIDTH)`.
pub const ARENA_WIDTH: i32 = 20;

/// Arena height in cells. Player `y` coordinates live in `[0, ARENA_HEIGHT)`.
pub const ARENA_HEIGHT: i32 = 20;

/// Tick cadence of snapshot capture (and of the demonstrative rollback that
/// follows each capture).
pub const ROLLBACK_INTERVAL: i32 = 5;

/// Upper bound on retained snapshots per match. When the ring is full the
/// eldest snapshot is evicted and the input history is pruned below the new
/// eldest tick.
pub const MAX_SNAPSHOTS: usize = 10;

/// Number of concurrent matches hosted by the server.
pub const NUM_MATCHES: usize = 20;

/// Number of synthetic clients (two per match).
pub const NUM_CLIENTS: usize = 40;

/// Inputs generated by each client over a full benchmark run.
pub const INPUTS_PER_CLIENT: i32 = 10_000;

/// Total inputs across the whole fleet.
pub const TOTAL_INPUTS: usize = NUM_CLIENTS * INPUTS_PER_CLIENT as usize;

/// Batch size used by pipelined producer tasks. Small enough to force
/// frequent task switching, large enough to amortise queue locking.
pub const PIPELINE_BATCH: usize = 50;

/// A single movement command on the integer grid.
///
/// The set is closed and tiny: the simulation only needs enough state
/// transition to make rollback observable, not interesting gameplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
}

impl Action {
    /// Maps a generator ordinal onto an action. Used by the deterministic
    /// client input streams, which draw uniformly from `0..4`.
    pub fn from_index(index: u32) -> Self {
        match index % 4 {
            0 => Action::Left,
            1 => Action::Right,
            2 => Action::Up,
            _ => Action::Down,
        }
    }
}

/// One command from a client to the server.
///
/// Inputs are immutable once created; the server records them verbatim in a
/// match's input history before applying them, so a rollback can re-apply the
/// exact sequence that was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Target match. Out-of-range ids are dropped by the server.
    pub match_id: i32,
    /// Issuing player, `0` or `1` within the match.
    pub player_id: i32,
    /// Logical tick the input was generated for. Inputs whose tick is behind
    /// the match's current tick are "late" and trigger a rollback.
    pub tick_id: i32,
    /// The movement to perform.
    pub action: Action,
}

impl Input {
    pub fn new(match_id: i32, player_id: i32, tick_id: i32, action: Action) -> Self {
        Self {
            match_id,
            player_id,
            tick_id,
            action,
        }
    }
}

/// Position of a single player on the arena grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: i32,
    pub x: i32,
    pub y: i32,
}

impl PlayerState {
    pub fn new(id: i32, x: i32, y: i32) -> Self {
        Self { id, x, y }
    }

    /// Applies a movement with boundary clamping. This is the entire
    /// state-transition rule of the simulation.
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::Left => self.x = (self.x - 1).max(0),
            Action::Right => self.x = (self.x + 1).min(ARENA_WIDTH - 1),
            Action::Up => self.y = (self.y - 1).max(0),
            Action::Down => self.y = (self.y + 1).min(ARENA_HEIGHT - 1),
        }
    }

    /// True while the player sits inside the arena bounds. Every observable
    /// state must satisfy this.
    pub fn in_bounds(&self) -> bool {
        (0..ARENA_WIDTH).contains(&self.x) && (0..ARENA_HEIGHT).contains(&self.y)
    }
}

/// Complete state of one match: two players and a logical clock.
///
/// `MatchState` is a plain value type; the snapshot machinery relies on
/// `clone()` producing a faithful, independent copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub match_id: i32,
    /// Logical clock, advanced once per processed input. Monotonically
    /// non-decreasing even across rollbacks.
    pub current_tick: i32,
    pub players: [PlayerState; 2],
    pub is_running: bool,
}

impl MatchState {
    /// Creates a stopped match with the players at their spawn positions.
    pub fn new(match_id: i32) -> Self {
        Self {
            match_id,
            current_tick: 0,
            players: [PlayerState::new(0, 5, 10), PlayerState::new(1, 15, 10)],
            is_running: false,
        }
    }
}

/// A value copy of a match's state at the instant of capture, tagged with
/// the tick it was captured at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick_id: i32,
    pub state: MatchState,
}

impl Snapshot {
    pub fn new(tick_id: i32, state: &MatchState) -> Self {
        Self {
            tick_id,
            state: state.clone(),
        }
    }
}
