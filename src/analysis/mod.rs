//! Analysis of received contradictions.
//!
//! The detection itself runs on the backend; this module only aggregates
//! what was streamed back.

pub mod aggregator;

pub use aggregator::*;
