//! Builds and hands out the client fleet for a benchmark configuration.

use crate::generator::Client;
use shared::Input;

/// Owns every synthetic client for one benchmark run.
///
/// Clients are laid out two per match: client `i` plays slot `i % 2` in
/// match `(i / 2) % num_matches`. The same manager shape feeds both
/// benchmark modes: [`generate_all`] drains the fleet eagerly for the
/// sequential and batch-parallel runs, [`into_clients`] releases the live
/// cursors for the pipelined run.
///
/// [`generate_all`]: ClientManager::generate_all
/// [`into_clients`]: ClientManager::into_clients
pub struct ClientManager {
    clients: Vec<Client>,
    inputs_per_client: i32,
}

impl ClientManager {
    pub fn new(num_clients: usize, num_matches: usize, inputs_per_client: i32) -> Self {
        let clients = (0..num_clients as i32)
            .map(|client_id| {
                let match_id = (client_id / 2) % num_matches as i32;
                let player_id = client_id % 2;
                Client::new(client_id, match_id, player_id, inputs_per_client)
            })
            .collect();

        Self {
            clients,
            inputs_per_client,
        }
    }

    /// Drains every client and concatenates the streams, client by client.
    /// After this the cursors are exhausted; build a fresh manager per run.
    pub fn generate_all(&mut self) -> Vec<Input> {
        let mut inputs = Vec::with_capacity(self.total_inputs());
        let batch_size = self.inputs_per_client.max(0) as usize;
        for client in &mut self.clients {
            inputs.extend(client.generate_batch(batch_size));
        }
        inputs
    }

    /// Releases the fleet, cursors intact, for the pipelined mode.
    pub fn into_clients(self) -> Vec<Client> {
        self.clients
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    /// Inputs the whole fleet will produce over a full run.
    pub fn total_inputs(&self) -> usize {
        self.clients.len() * self.inputs_per_client.max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_two_players_per_match() {
        let manager = ClientManager::new(8, 4, 10);
        assert_eq!(manager.num_clients(), 8);
        let clients = manager.into_clients();

        for (i, client) in clients.iter().enumerate() {
            assert_eq!(client.client_id(), i as i32);
            assert_eq!(client.match_id(), (i as i32 / 2) % 4);
            assert_eq!(client.player_id(), i as i32 % 2);
        }
    }

    #[test]
    fn test_layout_wraps_when_clients_exceed_matches() {
        let manager = ClientManager::new(12, 3, 10);
        let clients = manager.into_clients();

        // Clients 6..12 wrap back onto matches 0..3.
        assert_eq!(clients[6].match_id(), 0);
        assert_eq!(clients[11].match_id(), 2);
        for client in &clients {
            assert!((0..3).contains(&client.match_id()));
        }
    }

    #[test]
    fn test_generate_all_produces_every_input() {
        let mut manager = ClientManager::new(6, 3, 250);
        assert_eq!(manager.total_inputs(), 1_500);

        let inputs = manager.generate_all();
        assert_eq!(inputs.len(), 1_500);

        // Per-client streams are tick-monotone within the concatenation.
        for chunk in inputs.chunks(250) {
            for (expected_tick, input) in chunk.iter().enumerate() {
                assert_eq!(input.tick_id, expected_tick as i32);
            }
        }
    }

    #[test]
    fn test_generate_all_matches_pipelined_streams() {
        let mut eager = ClientManager::new(4, 2, 100);
        let all = eager.generate_all();

        let lazy = ClientManager::new(4, 2, 100);
        let mut reassembled = Vec::new();
        for mut client in lazy.into_clients() {
            while !client.is_finished() {
                reassembled.extend(client.generate_batch(9));
            }
        }

        assert_eq!(all, reassembled);
    }
}
