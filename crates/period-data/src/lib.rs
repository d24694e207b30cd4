//! Data layer for the period view batch.
//!
//! Loads the semicolon-separated input datasets, segments each endpoint's
//! energy timeline into operational periods, aggregates totals and writes
//! the result for the downstream persistence layer.

pub mod aggregator;
pub mod analysis;
pub mod labels;
pub mod operators;
pub mod reader;
pub mod segmenter;
pub mod writer;

pub use period_core as core;
