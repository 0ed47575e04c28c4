//! Shared backend table of contributed rows.

use anyhow::Result;

use crate::contribute::ContributionRow;
use crate::records::RawRow;

#[async_trait::async_trait]
pub trait ContributionStore: Send + Sync {
    /// Returns the id of the organisation called `name`, creating it first
    /// if needed. Calling it twice with the same name yields the same id.
    async fn find_or_create_organisation(&self, name: &str) -> Result<i64>;

    /// Inserts all `rows` in one call and returns how many were written.
    async fn insert_rows(&self, rows: &[ContributionRow]) -> Result<usize>;

    /// Every contributed row, in the stored (snake_case) schema.
    async fn fetch_rows(&self) -> Result<Vec<RawRow>>;
}
