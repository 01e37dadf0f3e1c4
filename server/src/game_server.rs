//! Sharded input routing: one queue and one match per shard, aggregate
//! counters across all of them.

use crate::game::Match;
use log::info;
use shared::{Input, MatchState};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Hosts every match and routes inputs to per-match queues.
///
/// Each shard is a plain FIFO behind its own mutex. Producers only ever hold
/// a queue mutex to push; a consumer holds it just long enough to swap the
/// queue for an empty one, then drains the swapped-out batch into the match
/// outside the queue lock so producers never wait on match processing.
pub struct GameServer {
    matches: Vec<Match>,
    queues: Vec<Mutex<VecDeque<Input>>>,
    processed_count: AtomicUsize,
}

impl GameServer {
    pub fn new(num_matches: usize) -> Self {
        Self {
            matches: (0..num_matches).map(|id| Match::new(id as i32)).collect(),
            queues: (0..num_matches).map(|_| Mutex::new(VecDeque::new())).collect(),
            processed_count: AtomicUsize::new(0),
        }
    }

    /// Starts every match.
    pub fn start(&self) {
        for game in &self.matches {
            game.start();
        }
        info!("game server started with {} matches", self.matches.len());
    }

    /// Routes one input to its match's queue. Inputs referencing an unknown
    /// match are dropped silently.
    pub fn receive(&self, input: Input) {
        let Ok(match_id) = usize::try_from(input.match_id) else {
            return;
        };
        let Some(queue) = self.queues.get(match_id) else {
            return;
        };
        queue.lock().unwrap().push_back(input);
    }

    /// Routes a batch of inputs; equivalent to repeated [`receive`], with no
    /// transactional semantics across the batch.
    ///
    /// [`receive`]: GameServer::receive
    pub fn receive_many(&self, inputs: &[Input]) {
        for &input in inputs {
            self.receive(input);
        }
    }

    /// Drains everything currently queued for one match into its state
    /// machine. Returns the number of inputs processed.
    ///
    /// Concurrent calls for the same match are safe: the swap hands the
    /// whole backlog to exactly one caller and the other drains nothing.
    pub fn process_pending(&self, match_id: usize) -> usize {
        let Some(queue) = self.queues.get(match_id) else {
            return 0;
        };

        let drained = std::mem::take(&mut *queue.lock().unwrap());
        let count = drained.len();

        for input in drained {
            self.matches[match_id].process_input(input);
            self.processed_count.fetch_add(1, Ordering::Relaxed);
        }
        count
    }

    /// Single-threaded baseline: drains every shard, one match at a time, on
    /// the calling thread.
    pub fn process_all_sequential(&self) {
        for match_id in 0..self.matches.len() {
            self.process_pending(match_id);
        }
    }

    pub fn num_matches(&self) -> usize {
        self.matches.len()
    }

    /// Total inputs applied to matches so far.
    pub fn processed_count(&self) -> usize {
        self.processed_count.load(Ordering::Relaxed)
    }

    /// Inputs still sitting in shard queues. Advisory: the answer can be
    /// stale by the time the caller looks at it.
    pub fn pending_count(&self) -> usize {
        self.queues
            .iter()
            .map(|queue| queue.lock().unwrap().len())
            .sum()
    }

    /// Sum of rollbacks across all matches.
    pub fn total_rollback_count(&self) -> usize {
        self.matches.iter().map(|game| game.rollback_count()).sum()
    }

    /// Value copy of one match's state, if the id is in range.
    pub fn match_state(&self, match_id: usize) -> Option<MatchState> {
        self.matches.get(match_id).map(|game| game.state())
    }
}
