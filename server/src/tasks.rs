//! Task bodies for the pipelined benchmark and the parallel drivers.
//!
//! Producer and consumer tasks are self-resubmitting: each runs one slice of
//! work and, unless finished, enqueues a fresh copy of itself at its tail.
//! The pool's `pending_tasks` accounting (increment-inside-submit, decrement
//! after the body returns) makes `wait_all` a sound quiescence barrier for
//! these chains.

use crate::game_server::GameServer;
use crate::pool::ThreadPool;
use client::Client;
use log::info;
use shared::PIPELINE_BATCH;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Producer task: one per client. Owns its client cursor and moves it
/// through every resubmission, so no lock guards generation.
struct ClientTask {
    client: Client,
    server: Arc<GameServer>,
    pool: Arc<ThreadPool>,
    clients_finished: Arc<AtomicUsize>,
}

impl ClientTask {
    fn run(mut self) {
        let batch = self.client.generate_batch(PIPELINE_BATCH);
        if !batch.is_empty() {
            self.server.receive_many(&batch);
        }

        if self.client.is_finished() {
            self.clients_finished.fetch_add(1, Ordering::Relaxed);
        } else {
            let pool = Arc::clone(&self.pool);
            pool.submit(move || self.run());
        }
    }
}

/// Consumer task: one per match. Drains its shard, then either resubmits or,
/// once every producer has finished and no queue holds work, retires.
struct MatchTask {
    match_id: usize,
    num_clients: usize,
    server: Arc<GameServer>,
    pool: Arc<ThreadPool>,
    clients_finished: Arc<AtomicUsize>,
}

impl MatchTask {
    fn run(self) {
        self.server.process_pending(self.match_id);

        // Producers first: once the finished count reaches the fleet size no
        // further receive can happen, so a subsequently observed empty
        // backlog is final. The global pending count is conservative; an
        // idle match keeps spinning while any shard still holds work.
        let producers_done = self.clients_finished.load(Ordering::Relaxed) == self.num_clients;
        if producers_done && self.server.pending_count() == 0 {
            return;
        }

        let pool = Arc::clone(&self.pool);
        pool.submit(move || self.run());
    }
}

/// Runs the pipelined benchmark: one producer task per client, one consumer
/// task per match, all racing on the pool until the fleet is exhausted and
/// every shard is drained. Returns the number of clients that finished.
pub fn run_pipeline(
    server: &Arc<GameServer>,
    clients: Vec<Client>,
    pool: &Arc<ThreadPool>,
) -> usize {
    let num_clients = clients.len();
    let clients_finished = Arc::new(AtomicUsize::new(0));
    info!(
        "pipeline starting: {} clients, {} matches, {} workers",
        num_clients,
        server.num_matches(),
        pool.num_workers()
    );

    for client in clients {
        let task = ClientTask {
            client,
            server: Arc::clone(server),
            pool: Arc::clone(pool),
            clients_finished: Arc::clone(&clients_finished),
        };
        pool.submit(move || task.run());
    }

    for match_id in 0..server.num_matches() {
        let task = MatchTask {
            match_id,
            num_clients,
            server: Arc::clone(server),
            pool: Arc::clone(pool),
            clients_finished: Arc::clone(&clients_finished),
        };
        pool.submit(move || task.run());
    }

    pool.wait_all();

    let finished = clients_finished.load(Ordering::Relaxed);
    info!(
        "pipeline finished: {} clients done, {} inputs processed",
        finished,
        server.processed_count()
    );
    finished
}

/// Batch-parallel driver: assumes the shard queues are already filled and
/// submits one drain task per match, then waits for quiescence.
pub fn process_all_parallel(server: &Arc<GameServer>, pool: &Arc<ThreadPool>) {
    for match_id in 0..server.num_matches() {
        let server = Arc::clone(server);
        pool.submit(move || {
            server.process_pending(match_id);
        });
    }
    pool.wait_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::ClientManager;

    #[test]
    fn test_small_pipeline_drains_everything() {
        let num_matches = 4;
        let num_clients = 8;
        let inputs_per_client = 200;

        let server = Arc::new(GameServer::new(num_matches));
        server.start();
        let pool = Arc::new(ThreadPool::new(4));
        let manager = ClientManager::new(num_clients, num_matches, inputs_per_client);

        let finished = run_pipeline(&server, manager.into_clients(), &pool);

        assert_eq!(finished, num_clients);
        assert_eq!(
            server.processed_count(),
            num_clients * inputs_per_client as usize
        );
        assert_eq!(server.pending_count(), 0);
        pool.shutdown();
    }

    #[test]
    fn test_batch_parallel_matches_sequential_counts() {
        let num_matches = 4;
        let mut manager = ClientManager::new(8, num_matches, 100);
        let inputs = manager.generate_all();

        let server = Arc::new(GameServer::new(num_matches));
        server.start();
        server.receive_many(&inputs);

        let pool = Arc::new(ThreadPool::new(3));
        process_all_parallel(&server, &pool);
        pool.shutdown();

        assert_eq!(server.processed_count(), inputs.len());
        assert_eq!(server.pending_count(), 0);
    }
}
