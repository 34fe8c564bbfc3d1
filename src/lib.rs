//! Reverse dependency index of remote modules for TypeScript/JavaScript projects.
//!
//! The pipeline: [`walker`] finds script files, [`parser`] extracts module
//! specifiers with their spans, [`resolver`] maps them through an import map
//! and classifies them, and [`index`] aggregates the remote ones.

pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod span;
pub mod walker;
