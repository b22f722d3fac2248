//! City aggregation and favorability ranking.
//!
//! Daily statistics are reduced to one [`types::CitySummary`] per city on
//! the worker pool, and the summaries are then ordered from most to least
//! favorable.

pub mod aggregate;
pub mod analyzer;
pub mod rank;
pub mod types;
pub mod utility;
