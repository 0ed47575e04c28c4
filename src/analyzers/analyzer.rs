use crate::analyzers::aggregate::build_dashboard;
use crate::analyzers::types::{Dashboard, DashboardOptions};
use crate::records::{ActivityRecord, RawRow, Schema, normalize_batch};
use crate::stats::BatchStats;
use serde::Serialize;
use tracing::{info, warn};

/// Normalized records, their batch report and the views built from them.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub stats: BatchStats,
    pub dashboard: Dashboard,
    #[serde(skip)]
    pub records: Vec<ActivityRecord>,
}

/// Normalizes `rows` and builds every view from the survivors.
///
/// An empty batch is not an error: the dashboard simply has no data.
pub fn analyze_rows(rows: &[RawRow], schema: Schema, options: &DashboardOptions) -> Analysis {
    if rows.is_empty() {
        info!("No data to process");
        return Analysis {
            stats: BatchStats::default(),
            dashboard: Dashboard::default(),
            records: Vec::new(),
        };
    }

    let batch = normalize_batch(rows, schema);
    analyze_records(batch.records, batch.stats, options)
}

/// Builds views from records that were already normalized (and possibly
/// enriched).
pub fn analyze_records(
    records: Vec<ActivityRecord>,
    stats: BatchStats,
    options: &DashboardOptions,
) -> Analysis {
    if stats.dropped_dates > 0 {
        warn!(
            dropped = stats.dropped_dates,
            dropped_pct = stats.dropped_pct(),
            "Rows excluded from all views due to invalid dates"
        );
    }

    let dashboard = build_dashboard(&records, options);

    info!(
        rows = stats.total_rows,
        records = records.len(),
        activities = dashboard.activity.len(),
        months = dashboard.date_by_month.len(),
        "Batch aggregated"
    );

    Analysis {
        stats,
        dashboard,
        records,
    }
}
