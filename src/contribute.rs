//! Enrichment and persistence of a contributor's batch.
//!
//! Records are enriched with a local authority looked up from their postcode,
//! tagged with the contributor's organisation id, and bulk inserted into the
//! shared store.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::records::ActivityRecord;
use crate::services::{ContributionStore, PostcodeLookup};

/// Lookups in flight at once when the caller does not say otherwise.
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 8;

/// One row in the persisted backend schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionRow {
    pub activity: String,
    pub age_range: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub number_of_people: u64,
    pub postcode: Option<String>,
    pub type_of_insight: String,
    pub location: String,
    pub local_authority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organisation_id: Option<i64>,
}

impl From<&ActivityRecord> for ContributionRow {
    fn from(r: &ActivityRecord) -> Self {
        ContributionRow {
            activity: r.activity.clone(),
            age_range: r.age_range.clone(),
            date: r.date.format("%Y-%m-%d").to_string(),
            number_of_people: r.number_of_people,
            postcode: r.postcode.clone(),
            type_of_insight: r.type_of_insight.clone(),
            location: r.location.clone(),
            local_authority: r.local_authority.clone(),
            organisation_id: None,
        }
    }
}

/// User-facing notice that a postcode could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupWarning {
    /// Index of the record in the enriched batch, 1-based.
    pub row: usize,
    pub postcode: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct EnrichedBatch {
    pub records: Vec<ActivityRecord>,
    pub warnings: Vec<LookupWarning>,
}

/// Fills `local_authority` for every record with a postcode.
///
/// Lookups run concurrently, at most `concurrency` at a time. Output order
/// matches input order. A failed lookup leaves that record's local authority
/// empty and adds a [`LookupWarning`]; other records are unaffected.
#[tracing::instrument(skip(records, lookup), fields(records = records.len()))]
pub async fn enrich(
    records: Vec<ActivityRecord>,
    lookup: Arc<dyn PostcodeLookup>,
    concurrency: usize,
) -> EnrichedBatch {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let Some(postcode) = record.postcode.clone() else {
            continue;
        };
        let sem = semaphore.clone();
        let lookup = lookup.clone();

        let span = tracing::info_span!("lookup_postcode", row = index + 1, postcode = %postcode);
        let task = tokio::spawn(
            async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .context("lookup pool closed")?;
                let district = lookup.local_authority(&postcode).await?;
                debug!(district = %district, "Postcode resolved");
                Ok::<_, anyhow::Error>(district)
            }
            .instrument(span),
        );
        tasks.push((index, task));
    }

    let mut batch = EnrichedBatch {
        records,
        warnings: Vec::new(),
    };

    for (index, task) in tasks {
        let outcome = match task.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("lookup task failed: {e}")),
        };
        let record = &mut batch.records[index];

        match outcome {
            Ok(district) => record.local_authority = district,
            Err(e) => {
                let postcode = record.postcode.clone().unwrap_or_default();
                warn!(row = index + 1, postcode = %postcode, error = %e, "Postcode lookup failed");
                record.local_authority.clear();
                batch.warnings.push(LookupWarning {
                    row: index + 1,
                    message: format!("Failed to fetch data for postcode: {postcode}"),
                    postcode,
                });
            }
        }
    }

    info!(
        warnings = batch.warnings.len(),
        "Enrichment finished"
    );
    batch
}

/// Outcome of a finished contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContributionReceipt {
    /// `None` when there was nothing to contribute.
    pub organisation_id: Option<i64>,
    pub inserted: usize,
}

/// Trims a contributor's organisation name.
///
/// # Errors
///
/// When the name is empty or whitespace only.
pub fn organisation_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        bail!("organisation name must not be empty");
    }
    Ok(name)
}

/// Resolves the organisation and bulk inserts `records` tagged with its id.
///
/// # Errors
///
/// An empty organisation name, or any failure resolving the organisation or
/// inserting rows. On error nothing should be reported as contributed; no
/// partial reconciliation is attempted.
#[tracing::instrument(skip(store, records), fields(records = records.len()))]
pub async fn contribute(
    store: &dyn ContributionStore,
    organisation: &str,
    records: &[ActivityRecord],
) -> Result<ContributionReceipt> {
    let organisation = organisation_name(organisation)?;

    if records.is_empty() {
        info!("No rows to contribute");
        return Ok(ContributionReceipt {
            organisation_id: None,
            inserted: 0,
        });
    }

    let organisation_id = store
        .find_or_create_organisation(organisation)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to get or insert organisation id"))
        .context("failed to resolve organisation")?;
    info!(organisation_id, "Organisation resolved");

    let rows: Vec<ContributionRow> = records
        .iter()
        .map(|r| ContributionRow {
            organisation_id: Some(organisation_id),
            ..ContributionRow::from(r)
        })
        .collect();

    let inserted = store
        .insert_rows(&rows)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to insert contributed rows"))
        .context("failed to insert contributed rows")?;
    info!(inserted, "Contribution stored");

    Ok(ContributionReceipt {
        organisation_id: Some(organisation_id),
        inserted,
    })
}
