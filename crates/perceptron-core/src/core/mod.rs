//! # Core Module
//!
//! Stateless building blocks of the perception engine.
//!
//! ## Architecture
//!
//! - **Information Channels** ([`channels`]) - Typed, restartable sources of text lines
//! - **Circumstances** ([`circumstance`]) - Elementary conditions and their scoring rules
//! - **Situations** ([`situation`]) - Named combinations of circumstances and their registry
//! - **I/O** ([`io`]) - Batched line matching and TOML knowledge-base loading
//!
//! Nothing in this module keeps state across perception cycles; see
//! [`crate::engine`] for the cycle itself.

pub mod channels;
pub mod circumstance;
pub mod io;
pub mod situation;
