//! # Engine Module
//!
//! The stateful layer of the library: it runs perception cycles over the
//! stateless models of [`crate::core`].
//!
//! ## Overview
//!
//! A perception cycle reads every available channel at most once, scores each
//! (situation, circumstance) pair, turns the scores into per-situation
//! fingerprints, and decides which situations occur.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Counter values and other cycle settings
//! - **Query Batching** ([`query`]) - Pattern deduplication and single-pass channel scans
//! - **Score Collection** ([`scores`]) - Value-keyed accumulation of satisfaction scores
//! - **Orchestration** ([`perceptron`]) - The perception cycle and its verdict
//! - **State Tracking** ([`state`]) - Cycle stages and outcomes
//! - **Progress Monitoring** ([`progress`]) - Optional progress callbacks
//! - **Error Handling** ([`error`]) - Errors that abort a cycle

pub mod config;
pub mod error;
pub mod perceptron;
pub mod progress;
pub mod query;
pub mod scores;
pub mod state;
