//! # Perceptron Core Library
//!
//! A small inference engine that recognises known *situations* (e.g. "SCF did
//! not converge", "job terminated normally") by matching text patterns against
//! typed *information channels* such as log files, output files, and the
//! process environment.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Circumstance`,
//!   `Situation`, `InfoChannel`), the definition-line parser, the logical
//!   expression evaluator, and I/O utilities.
//!
//! - **[`engine`]: The Logic Core.** The stateful perception cycle. It batches
//!   and deduplicates text queries per channel type, reads every channel once,
//!   accumulates scores in a `ScoreCollector`, and reports whether exactly one
//!   situation occurs.
//!
//! - **[`workflows`]: The Public API.** One-call entry points that load a
//!   knowledge base and channel definitions, run a cycle, and return a report.

pub mod core;
pub mod engine;
pub mod workflows;
