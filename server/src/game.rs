//! Per-match state machine: input application, periodic snapshots, and
//! rollback-and-resimulate on late inputs.

use log::debug;
use shared::{Input, MatchState, Snapshot, MAX_SNAPSHOTS, ROLLBACK_INTERVAL};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Everything the match mutex guards: the live state, the snapshot ring, the
/// arrival-ordered input history, and the snapshot cadence marker.
struct MatchInner {
    state: MatchState,
    /// Retained snapshots, tick-sorted ascending, at most [`MAX_SNAPSHOTS`].
    snapshots: VecDeque<Snapshot>,
    /// Every input this match has seen, in arrival order. Arrival order is
    /// not tick order once late inputs exist, and replays deliberately
    /// preserve the arrival order.
    input_history: Vec<Input>,
    /// Tick of the most recent cadence snapshot. Starts at
    /// `-ROLLBACK_INTERVAL` so the first processed input triggers a capture.
    last_snapshot_tick: i32,
}

/// A single two-player match.
///
/// All mutation happens under one mutex for the whole `process_input` call;
/// the sharded server guarantees inputs for a match arrive through one drain
/// at a time, so the mutex is mostly uncontended and exists to make the
/// observable state consistent for readers.
pub struct Match {
    match_id: i32,
    inner: Mutex<MatchInner>,
    /// Total rollbacks performed (late inputs plus the demonstrative
    /// rollback at every snapshot boundary). Statistics only.
    rollback_count: AtomicUsize,
}

impl Match {
    pub fn new(match_id: i32) -> Self {
        Self {
            match_id,
            inner: Mutex::new(MatchInner {
                state: MatchState::new(match_id),
                snapshots: VecDeque::new(),
                input_history: Vec::new(),
                last_snapshot_tick: -ROLLBACK_INTERVAL,
            }),
            rollback_count: AtomicUsize::new(0),
        }
    }

    /// Starts the match and captures the initial snapshot at tick 0.
    pub fn start(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state.is_running = true;
        inner.state.current_tick = 0;
        inner.save_snapshot();
        debug!("match {} started", self.match_id);
    }

    /// Processes one input from a client.
    ///
    /// A late input (tick behind the match clock) triggers a rollback to the
    /// newest snapshot covering it and a replay of the history in arrival
    /// order. Every `ROLLBACK_INTERVAL` ticks a snapshot is captured and a
    /// demonstrative rollback re-simulates the last two ticks; that rollback
    /// exists to generate re-simulation load for the scheduler benchmark and
    /// is counted like any other.
    pub fn process_input(&self, input: Input) {
        let mut inner = self.inner.lock().unwrap();

        if !inner.state.is_running {
            return;
        }

        // Record before applying, so any replay sees the full arrival order.
        inner.input_history.push(input);

        if input.tick_id < inner.state.current_tick {
            // Late input: restore a covering snapshot and replay everything
            // that arrived since it.
            self.rollback_count.fetch_add(1, Ordering::Relaxed);
            inner.resimulate(input.tick_id, None);
        } else {
            inner.apply(&input);
        }

        inner.state.current_tick += 1;

        if inner.state.current_tick - inner.last_snapshot_tick >= ROLLBACK_INTERVAL {
            inner.save_snapshot();
            inner.last_snapshot_tick = inner.state.current_tick;

            // Demonstrative rollback: re-simulate the last two ticks.
            let target = (inner.state.current_tick - 2).max(0);
            self.rollback_count.fetch_add(1, Ordering::Relaxed);
            let upper = inner.state.current_tick;
            inner.resimulate(target, Some(upper));
        }
    }

    /// Rolls back to a snapshot covering `tick` and replays the history up
    /// to the current tick. No-op before the first snapshot exists.
    pub fn rollback_to(&self, tick: i32) {
        let mut inner = self.inner.lock().unwrap();
        if inner.snapshots.is_empty() {
            return;
        }

        self.rollback_count.fetch_add(1, Ordering::Relaxed);
        let upper = inner.state.current_tick;
        inner.resimulate(tick, Some(upper));
    }

    pub fn match_id(&self) -> i32 {
        self.match_id
    }

    pub fn current_tick(&self) -> i32 {
        self.inner.lock().unwrap().state.current_tick
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().unwrap().state.is_running
    }

    /// Value copy of the live state.
    pub fn state(&self) -> MatchState {
        self.inner.lock().unwrap().state.clone()
    }

    pub fn rollback_count(&self) -> usize {
        self.rollback_count.load(Ordering::Relaxed)
    }

    pub fn snapshot_count(&self) -> usize {
        self.inner.lock().unwrap().snapshots.len()
    }
}

impl MatchInner {
    /// Applies one input to its target player via the clamped movement rule.
    fn apply(&mut self, input: &Input) {
        let idx = (input.player_id % 2) as usize;
        self.state.players[idx].apply_action(input.action);
    }

    /// Captures a snapshot of the current state, evicting the eldest and
    /// pruning the input history once the ring is over capacity.
    fn save_snapshot(&mut self) {
        let snapshot = Snapshot::new(self.state.current_tick, &self.state);
        self.snapshots.push_back(snapshot);

        if self.snapshots.len() > MAX_SNAPSHOTS {
            self.snapshots.pop_front();

            // Nothing can roll back past the eldest snapshot, so history
            // below its tick is unreachable. Arrival order is not tick
            // order, hence the full compacting scan.
            if let Some(eldest) = self.snapshots.front() {
                let eldest_tick = eldest.tick_id;
                self.input_history
                    .retain(|input| input.tick_id >= eldest_tick);
            }
        }
    }

    /// Restores the newest snapshot at or before `to_tick` (falling back to
    /// the eldest) and replays the input history in arrival order.
    ///
    /// Only entries with `tick_id >= snapshot.tick_id` are replayed, bounded
    /// above by `upper` when given. The match clock keeps its pre-restore
    /// value: rollbacks rewrite player positions, never time.
    fn resimulate(&mut self, to_tick: i32, upper: Option<i32>) {
        let Some(idx) = self.snapshot_index_for(to_tick) else {
            return;
        };

        let resume_tick = self.state.current_tick;
        let from_tick = self.snapshots[idx].tick_id;
        self.state = self.snapshots[idx].state.clone();
        self.state.current_tick = resume_tick;

        let MatchInner {
            state,
            input_history,
            ..
        } = self;
        for input in input_history.iter() {
            if input.tick_id < from_tick {
                continue;
            }
            if upper.is_some_and(|bound| input.tick_id > bound) {
                continue;
            }
            let slot = (input.player_id % 2) as usize;
            state.players[slot].apply_action(input.action);
        }
    }

    /// Index of the newest snapshot with `tick_id <= tick`; the eldest when
    /// every snapshot is newer; `None` only while no snapshot exists.
    fn snapshot_index_for(&self, tick: i32) -> Option<usize> {
        if self.snapshots.is_empty() {
            return None;
        }

        let mut best = None;
        for (idx, snapshot) in self.snapshots.iter().enumerate() {
            if snapshot.tick_id <= tick {
                best = Some(idx);
            } else {
                break;
            }
        }
        Some(best.unwrap_or(0))
    }
}
