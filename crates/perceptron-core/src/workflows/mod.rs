//! # Workflows Module
//!
//! High-level entry points that tie [`crate::core`] and [`crate::engine`]
//! together.
//!
//! - **Perception Workflow** ([`perceive`]) - Loads a knowledge base, resolves
//!   channel definitions against a working directory, runs one perception
//!   cycle, and summarises the result.

pub mod perceive;
