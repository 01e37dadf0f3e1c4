//! # Performance Benchmark Test Suite
//!
//! Full-scale runs of the simulation benchmark, asserting throughput stays
//! inside generous bounds and, more importantly, that the complete workload
//! (40 clients x 10,000 inputs across 20 matches) is processed without
//! deadlock in every mode. Timing output goes to stdout so regressions are
//! visible in CI logs; the asserts themselves use wide safety margins to
//! stay stable across machines.
//!
//! ```bash
//! cargo test --release --test benchmark_tests
//! ```

use client::ClientManager;
use server::{tasks, GameServer, ThreadPool, WorkStealingQueue};
use shared::{INPUTS_PER_CLIENT, NUM_CLIENTS, NUM_MATCHES, TOTAL_INPUTS};
use std::sync::Arc;
use std::time::Instant;

/// Measures raw queue operation cost: the scheduler pays this price on every
/// submit, pop, and steal attempt.
#[test]
fn benchmark_work_stealing_queue_ops() {
    let queue = WorkStealingQueue::new();
    let iterations = 100_000;

    let start = Instant::now();
    for i in 0..iterations {
        queue.push_back(i);
        if i % 2 == 0 {
            queue.try_pop_back();
        } else {
            queue.try_pop_front();
        }
    }
    let duration = start.elapsed();

    println!(
        "Queue ops: {} push/pop pairs in {:?} ({:.2} ns/pair)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );
    assert!(duration.as_millis() < 5_000);
}

/// Sequential baseline over the full workload. Also pins down the exact
/// processed-input accounting for the in-range input set.
#[test]
fn benchmark_sequential_full_workload() {
    let mut manager = ClientManager::new(NUM_CLIENTS, NUM_MATCHES, INPUTS_PER_CLIENT);
    let inputs = manager.generate_all();
    assert_eq!(inputs.len(), TOTAL_INPUTS);

    let server = GameServer::new(NUM_MATCHES);
    server.start();
    server.receive_many(&inputs);

    let start = Instant::now();
    server.process_all_sequential();
    let duration = start.elapsed();

    println!(
        "Sequential: {} inputs in {:?} ({:.0} inputs/sec)",
        TOTAL_INPUTS,
        duration,
        TOTAL_INPUTS as f64 / duration.as_secs_f64()
    );
    assert_eq!(server.processed_count(), TOTAL_INPUTS);
    assert_eq!(server.pending_count(), 0);
    assert!(server.total_rollback_count() > 0);
    assert!(duration.as_secs() < 120);
}

/// Full pipelined run with 4 workers: the end-to-end scenario the benchmark
/// exists for. Every client finishes, every shard drains, nothing deadlocks.
#[test]
fn benchmark_pipeline_full_workload_4_workers() {
    let server = Arc::new(GameServer::new(NUM_MATCHES));
    server.start();
    let pool = Arc::new(ThreadPool::new(4));
    let manager = ClientManager::new(NUM_CLIENTS, NUM_MATCHES, INPUTS_PER_CLIENT);

    let start = Instant::now();
    let finished = tasks::run_pipeline(&server, manager.into_clients(), &pool);
    let duration = start.elapsed();

    println!(
        "Pipeline (4T): {} inputs in {:?}, {} steals",
        server.processed_count(),
        duration,
        pool.steal_count()
    );

    assert_eq!(finished, NUM_CLIENTS);
    assert_eq!(server.processed_count(), TOTAL_INPUTS);
    assert_eq!(server.pending_count(), 0);
    pool.shutdown();
    assert!(duration.as_secs() < 300);
}

/// Batch-parallel run over pre-filled shards; completes and accounts for
/// every input, and steal statistics remain monotone across reads.
#[test]
fn benchmark_batch_parallel_full_workload() {
    let mut manager = ClientManager::new(NUM_CLIENTS, NUM_MATCHES, INPUTS_PER_CLIENT);
    let inputs = manager.generate_all();

    let server = Arc::new(GameServer::new(NUM_MATCHES));
    server.start();
    server.receive_many(&inputs);
    let pool = Arc::new(ThreadPool::new(4));

    let start = Instant::now();
    tasks::process_all_parallel(&server, &pool);
    let duration = start.elapsed();

    let steals_mid = pool.steal_count();
    println!(
        "Batch (4T): {} inputs in {:?}, {} steals",
        server.processed_count(),
        duration,
        steals_mid
    );

    assert_eq!(server.processed_count(), TOTAL_INPUTS);
    assert!(pool.steal_count() >= steals_mid);
    pool.shutdown();
    assert!(duration.as_secs() < 120);
}
