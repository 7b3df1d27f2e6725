//! End-to-end test suite for BitCred.
//!
//! Drives wallet data through scoring, commitment and calldata encoding the
//! way the API does, with the clock and nonce source pinned.

pub mod helpers;
