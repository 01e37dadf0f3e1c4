//! A single deterministic client: a seeded cursor over its input stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shared::{Action, Input};

/// Simulates one game client sending inputs to the server.
///
/// The client belongs to a fixed `(match, player)` slot and produces exactly
/// `num_inputs` commands with `tick_id = 0..num_inputs`. Actions are drawn
/// from a `ChaCha8Rng` seeded with the client id, so the stream is stable
/// across runs and platforms and independent of how it is batched.
pub struct Client {
    client_id: i32,
    match_id: i32,
    player_id: i32,
    num_inputs: i32,
    next_tick: i32,
    rng: ChaCha8Rng,
}

impl Client {
    pub fn new(client_id: i32, match_id: i32, player_id: i32, num_inputs: i32) -> Self {
        Self {
            client_id,
            match_id,
            player_id,
            num_inputs,
            next_tick: 0,
            rng: ChaCha8Rng::seed_from_u64(client_id as u64),
        }
    }

    /// Returns the next `min(batch_size, remaining)` inputs and advances the
    /// cursor. An exhausted client returns an empty batch.
    pub fn generate_batch(&mut self, batch_size: usize) -> Vec<Input> {
        let end = (self.next_tick + batch_size as i32).min(self.num_inputs);
        let mut batch = Vec::with_capacity((end - self.next_tick).max(0) as usize);

        for tick in self.next_tick..end {
            let action = Action::from_index(self.rng.gen_range(0..4));
            batch.push(Input::new(self.match_id, self.player_id, tick, action));
        }

        self.next_tick = end;
        batch
    }

    /// True once the full stream has been handed out.
    pub fn is_finished(&self) -> bool {
        self.next_tick >= self.num_inputs
    }

    pub fn client_id(&self) -> i32 {
        self.client_id
    }

    pub fn match_id(&self) -> i32 {
        self.match_id
    }

    pub fn player_id(&self) -> i32 {
        self.player_id
    }

    /// Inputs still to be generated.
    pub fn remaining(&self) -> i32 {
        self.num_inputs - self.next_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_cover_exactly_the_stream() {
        let mut client = Client::new(0, 0, 0, 100);
        let mut total = 0;

        while !client.is_finished() {
            let batch = client.generate_batch(7);
            assert!(!batch.is_empty());
            total += batch.len();
        }

        assert_eq!(total, 100);
        assert_eq!(client.remaining(), 0);
        assert!(client.generate_batch(7).is_empty());
    }

    #[test]
    fn test_ticks_are_sequential_from_zero() {
        let mut client = Client::new(3, 1, 1, 50);
        let inputs = client.generate_batch(50);

        for (expected_tick, input) in inputs.iter().enumerate() {
            assert_eq!(input.tick_id, expected_tick as i32);
            assert_eq!(input.match_id, 1);
            assert_eq!(input.player_id, 1);
        }
    }

    #[test]
    fn test_stream_is_deterministic_per_client_id() {
        let mut first = Client::new(9, 0, 1, 200);
        let mut second = Client::new(9, 0, 1, 200);

        assert_eq!(first.generate_batch(200), second.generate_batch(200));
    }

    #[test]
    fn test_stream_is_independent_of_batching() {
        let mut whole = Client::new(5, 2, 1, 120);
        let mut chunked = Client::new(5, 2, 1, 120);

        let all = whole.generate_batch(120);
        let mut reassembled = Vec::new();
        while !chunked.is_finished() {
            reassembled.extend(chunked.generate_batch(13));
        }

        assert_eq!(all, reassembled);
    }

    #[test]
    fn test_distinct_clients_produce_distinct_streams() {
        let mut a = Client::new(0, 0, 0, 100);
        let mut b = Client::new(1, 0, 1, 100);

        let actions_a: Vec<_> = a.generate_batch(100).iter().map(|i| i.action).collect();
        let actions_b: Vec<_> = b.generate_batch(100).iter().map(|i| i.action).collect();
        assert_ne!(actions_a, actions_b);
    }
}
