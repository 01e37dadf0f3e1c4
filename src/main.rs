//! Benchmark driver for the sharded game-server simulation.
//!
//! Runs the same fixed workload (40 clients x 10,000 inputs across 20
//! matches) three ways: a single-threaded baseline, a batch-parallel mode
//! that drains pre-filled shards on the pool, and a fully pipelined mode
//! where producer and consumer tasks race on the work-stealing scheduler.
//! Prints per-mode timings and a summary table.

use clap::Parser;
use client::ClientManager;
use log::info;
use server::{tasks, GameServer, ThreadPool};
use shared::{
    Input, ARENA_HEIGHT, ARENA_WIDTH, INPUTS_PER_CLIENT, NUM_CLIENTS, NUM_MATCHES,
    PIPELINE_BATCH, ROLLBACK_INTERVAL, TOTAL_INPUTS,
};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Largest worker count in the parallel sweep (runs 2..=max)
    #[clap(short, long, default_value = "8")]
    max_threads: usize,

    /// Skip the interactive pause before exiting (useful in CI)
    #[clap(long)]
    no_pause: bool,
}

/// Timing and counters for one benchmark run.
struct BenchmarkResult {
    mode: String,
    time_ms: f64,
    processed: usize,
    rollbacks: usize,
    steals: Option<usize>,
}

fn run_sequential(inputs: &[Input]) -> BenchmarkResult {
    let server = GameServer::new(NUM_MATCHES);
    server.start();
    server.receive_many(inputs);

    let start = Instant::now();
    server.process_all_sequential();
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;

    BenchmarkResult {
        mode: "Sequential".to_string(),
        time_ms,
        processed: server.processed_count(),
        rollbacks: server.total_rollback_count(),
        steals: None,
    }
}

fn run_batch_parallel(inputs: &[Input], num_threads: usize) -> BenchmarkResult {
    let server = Arc::new(GameServer::new(NUM_MATCHES));
    let pool = Arc::new(ThreadPool::new(num_threads));
    server.start();
    server.receive_many(inputs);

    let start = Instant::now();
    tasks::process_all_parallel(&server, &pool);
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;

    pool.shutdown();
    BenchmarkResult {
        mode: format!("Batch ({}T)", num_threads),
        time_ms,
        processed: server.processed_count(),
        rollbacks: server.total_rollback_count(),
        steals: Some(pool.steal_count()),
    }
}

fn run_pipelined(num_threads: usize) -> BenchmarkResult {
    let server = Arc::new(GameServer::new(NUM_MATCHES));
    let pool = Arc::new(ThreadPool::new(num_threads));
    server.start();
    let manager = ClientManager::new(NUM_CLIENTS, NUM_MATCHES, INPUTS_PER_CLIENT);

    let start = Instant::now();
    let finished = tasks::run_pipeline(&server, manager.into_clients(), &pool);
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;

    pool.shutdown();
    info!("pipelined run with {} workers: {} clients finished", num_threads, finished);
    BenchmarkResult {
        mode: format!("Pipeline ({}T)", num_threads),
        time_ms,
        processed: server.processed_count(),
        rollbacks: server.total_rollback_count(),
        steals: Some(pool.steal_count()),
    }
}

fn print_separator() {
    println!("{}", "=".repeat(50));
}

fn print_result(result: &BenchmarkResult, baseline_ms: f64) {
    println!("  Time:        {:.2} ms", result.time_ms);
    println!("  Processed:   {} inputs", result.processed);
    println!("  Rollbacks:   {}", result.rollbacks);
    if let Some(steals) = result.steals {
        println!("  Work Steals: {}", steals);
        println!("  Speedup:     {:.2}x", baseline_ms / result.time_ms);
    }
    if result.time_ms > 0.0 {
        println!(
            "  Throughput:  {:.0} inputs/sec",
            result.processed as f64 / result.time_ms * 1000.0
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();
    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Note: set RUST_LOG=info to see scheduler and pipeline logs.");
    }

    let args = Args::parse();
    let hardware_threads = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

    print_separator();
    println!("  GAME SERVER SIMULATION - WORK STEALING BENCHMARK");
    print_separator();

    println!("\n[Configuration]");
    println!("  Matches:          {}", NUM_MATCHES);
    println!("  Clients:          {}", NUM_CLIENTS);
    println!("  Inputs/Client:    {}", INPUTS_PER_CLIENT);
    println!("  Total Inputs:     {}", TOTAL_INPUTS);
    println!("  Arena Size:       {}x{}", ARENA_WIDTH, ARENA_HEIGHT);
    println!("  Snapshot Every:   {} ticks", ROLLBACK_INTERVAL);
    println!("  Pipeline Batch:   {}", PIPELINE_BATCH);
    println!("  Hardware Threads: {}", hardware_threads);

    // Generate the shared input set for the sequential and batch modes; the
    // pipelined mode regenerates the identical streams through live cursors.
    println!("\n[Generating Inputs]");
    let gen_start = Instant::now();
    let mut manager = ClientManager::new(NUM_CLIENTS, NUM_MATCHES, INPUTS_PER_CLIENT);
    let all_inputs = manager.generate_all();
    println!(
        "  Generated {} inputs in {:.2} ms",
        all_inputs.len(),
        gen_start.elapsed().as_secs_f64() * 1000.0
    );

    // Sequential baseline
    print_separator();
    println!("  SEQUENTIAL MODE");
    print_separator();
    let sequential = run_sequential(&all_inputs);
    print_result(&sequential, sequential.time_ms);

    // Parallel sweep
    let thread_counts: Vec<usize> = (2..=args.max_threads.max(2)).collect();
    let mut parallel_results = Vec::new();

    for &num_threads in &thread_counts {
        print_separator();
        println!("  PARALLEL MODE ({} threads)", num_threads);
        print_separator();

        println!("\n  -- batch --");
        let batch = run_batch_parallel(&all_inputs, num_threads);
        print_result(&batch, sequential.time_ms);

        println!("\n  -- pipelined --");
        let pipelined = run_pipelined(num_threads);
        print_result(&pipelined, sequential.time_ms);

        parallel_results.push(batch);
        parallel_results.push(pipelined);
    }

    // Summary
    print_separator();
    println!("  SUMMARY");
    print_separator();
    println!("\n  Mode            | Time (ms) | Speedup | Steals");
    println!("  ----------------|-----------|---------|-------");
    println!(
        "  {:<15} | {:>9.2} | {:>7} | {:>6}",
        sequential.mode, sequential.time_ms, "1.00x", "N/A"
    );
    for result in &parallel_results {
        println!(
            "  {:<15} | {:>9.2} | {:>6.2}x | {:>6}",
            result.mode,
            result.time_ms,
            sequential.time_ms / result.time_ms,
            result.steals.unwrap_or(0)
        );
    }

    println!();
    print_separator();
    println!("  BENCHMARK COMPLETE");
    print_separator();

    if !args.no_pause {
        println!("Press Enter to exit.");
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
    }

    Ok(())
}
