//! Collaborators at the edge of the contribution pipeline.
//!
//! The pipeline only sees these traits; HTTP implementations live with the
//! binary.

pub mod postcode_api;
pub mod store_api;

pub use postcode_api::PostcodeLookup;
pub use store_api::ContributionStore;
