//! Core types for the period view batch.
//!
//! Record value types, the shared error type, run settings and the
//! timestamp/number helpers used by the data layer.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
