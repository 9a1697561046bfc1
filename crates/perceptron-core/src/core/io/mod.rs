//! Input/output utilities: batched line matching over readers and the TOML
//! loaders for knowledge bases and channel definitions.

pub mod knowledge;
pub mod text;
