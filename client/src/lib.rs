//! # Game Client Library
//!
//! This library provides the synthetic client side of the simulation
//! benchmark. Instead of capturing keyboard input and talking to a socket,
//! each client is a deterministic generator that produces the exact command
//! stream a real player session would have sent: one input per tick,
//! addressed to its match and player slot.
//!
//! ## Determinism
//!
//! Every client seeds its own `ChaCha8Rng` with its client id, so a client's
//! action stream is identical across runs, platforms, and batch sizes. The
//! benchmark leans on this twice: the sequential baseline and the parallel
//! modes consume byte-identical inputs, and any partition of a client's
//! stream into batches concatenates to the same sequence.
//!
//! ## Module Organization
//!
//! - [`generator`]: a single client, a seeded cursor over its input stream.
//! - [`manager`]: builds the whole fleet for a benchmark configuration and
//!   hands it out either eagerly (all inputs up front) or as live cursors
//!   for the pipelined mode.

pub mod generator;
pub mod manager;

pub use generator::Client;
pub use manager::ClientManager;
