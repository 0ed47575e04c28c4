//! Postcode to local authority lookup.

use anyhow::Result;

/// Resolves a postcode to the administrative district (local authority) it
/// belongs to.
#[async_trait::async_trait]
pub trait PostcodeLookup: Send + Sync {
    /// Fails when the service is unreachable or has no district for the
    /// postcode. One failure never affects other lookups.
    async fn local_authority(&self, postcode: &str) -> Result<String>;
}
