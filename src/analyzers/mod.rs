//! Batch aggregation.
//!
//! This module normalizes a batch of rows, computes the named category and
//! time-bucket views, and hands them to the chart adapter. Every view is
//! recomputed from scratch for each batch.

pub mod aggregate;
pub mod analyzer;
pub mod types;
pub mod utility;
