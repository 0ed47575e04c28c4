use serde::Serialize;

/// A row excluded from every view because its date could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedRow {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub date: String,
}

/// What normalization did to one input batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub total_rows: usize,
    pub kept_rows: usize,

    // row-level problems
    pub dropped_dates: usize,
    pub coerced_counts: usize,
    pub month_first_dates: usize,

    pub dropped: Vec<DroppedRow>,
}

impl BatchStats {
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn dropped_pct(&self) -> f64 {
        Self::pct(self.dropped_dates, self.total_rows)
    }

    pub fn record_drop(&mut self, row: usize, date: String) {
        self.dropped_dates += 1;
        self.dropped.push(DroppedRow { row, date });
    }

    /// True when at least one row was dropped or needs a second look.
    pub fn has_issues(&self) -> bool {
        self.dropped_dates > 0 || self.month_first_dates > 0
    }
}
