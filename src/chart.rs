//! Chart-ready marshaling of aggregate views.
//!
//! Output mirrors the `{ labels, datasets: [...] }` shape Chart.js consumes,
//! so the JSON can be handed straight to a browser renderer.

use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::analyzers::types::{AggregateView, Dashboard, NestedView};
use crate::analyzers::utility::shares;

/// Fill alpha used for every generated background colour.
const FILL_ALPHA: f32 = 0.5;

/// RGBA colour with 0..=255 channels and a 0..=1 alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f32,
}

impl Rgba {
    #[must_use]
    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn fill(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(red, green, blue, FILL_ALPHA)
    }

    /// Same channels, fully opaque.
    #[must_use]
    pub const fn border(self) -> Self {
        Self::rgba(self.red, self.green, self.blue, 1.0)
    }

    /// Colour derived from a hash of `label`.
    pub fn hashed(label: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        label.hash(&mut hasher);
        let [red, green, blue, ..] = hasher.finish().to_le_bytes();
        Self::fill(red, green, blue)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({}, {}, {}, {})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fixed colours for the predefined activity categories.
pub const ACTIVITY_COLORS: &[(&str, Rgba)] = &[
    ("Housing", Rgba::fill(255, 99, 132)),
    ("Energy", Rgba::fill(54, 162, 235)),
    ("Transport", Rgba::fill(255, 206, 86)),
    ("Finance", Rgba::fill(75, 192, 192)),
];

const LOCATION_COLOR: Rgba = Rgba::fill(54, 162, 235);
const MONTH_COLOR: Rgba = Rgba::fill(75, 192, 192);
const YEAR_COLOR: Rgba = Rgba::fill(153, 102, 255);

pub fn activity_color(label: &str) -> Rgba {
    ACTIVITY_COLORS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, color)| *color)
        .unwrap_or_else(|| Rgba::hashed(label))
}

/// How colours are assigned to labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Palette {
    /// Activity lookup table, hash fallback for unknown labels.
    Activity,
    /// Hash of each label.
    Hashed,
    /// One colour for every label.
    Single(Rgba),
}

impl Palette {
    pub fn color(&self, label: &str) -> Rgba {
        match self {
            Palette::Activity => activity_color(label),
            Palette::Hashed => Rgba::hashed(label),
            Palette::Single(color) => *color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelOrder {
    /// First-seen order of the view.
    #[default]
    Insertion,
    /// Ascending lexical order; chronological for time buckets.
    Ascending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    Raw,
    /// Values rescaled to sum to 100.
    Share,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesOptions {
    pub order: LabelOrder,
    pub scale: Scale,
    pub palette: Palette,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            order: LabelOrder::Insertion,
            scale: Scale::Raw,
            palette: Palette::Hashed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: Vec<Rgba>,
    pub border_color: Vec<Rgba>,
    pub border_width: u32,
}

/// Ordered labels with one or more parallel value series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Maps one view to a single-dataset series.
pub fn to_series(view: &AggregateView, label: &str, options: &SeriesOptions) -> ChartSeries {
    let labels: Vec<&str> = match options.order {
        LabelOrder::Insertion => view.keys().collect(),
        LabelOrder::Ascending => view.sorted_keys(),
    };

    let raw: Vec<f64> = labels
        .iter()
        .map(|k| view.get(k).unwrap_or(0) as f64)
        .collect();
    let data = match options.scale {
        Scale::Raw => raw,
        Scale::Share => shares(&raw),
    };

    let background_color: Vec<Rgba> = labels.iter().map(|l| options.palette.color(l)).collect();
    let border_color = background_color.iter().map(|c| c.border()).collect();

    ChartSeries {
        labels: labels.iter().map(|l| l.to_string()).collect(),
        datasets: vec![Dataset {
            label: label.to_string(),
            data,
            background_color,
            border_color,
            border_width: 1,
        }],
    }
}

/// Time-bucket views always render in chronological order.
pub fn time_series(view: &AggregateView, label: &str, color: Rgba) -> ChartSeries {
    to_series(
        view,
        label,
        &SeriesOptions {
            order: LabelOrder::Ascending,
            scale: Scale::Raw,
            palette: Palette::Single(color),
        },
    )
}

/// One dataset per outer key, values aligned to `axis` labels. Pairs that
/// were never observed contribute 0.
pub fn stacked_series(nested: &NestedView, axis: &[&str]) -> ChartSeries {
    let datasets = nested
        .iter()
        .map(|(outer, inner)| {
            let color = activity_color(outer);
            Dataset {
                label: outer.to_string(),
                data: axis
                    .iter()
                    .map(|k| inner.get(k).unwrap_or(0) as f64)
                    .collect(),
                background_color: vec![color],
                border_color: vec![color.border()],
                border_width: 1,
            }
        })
        .collect();

    ChartSeries {
        labels: axis.iter().map(|l| l.to_string()).collect(),
        datasets,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    HorizontalBar,
    Line,
    StackedBar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub data: ChartSeries,
}

/// Which dashboard is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardMode {
    /// The contributor's own upload.
    Mine,
    /// Every contribution in the shared backend.
    All,
}

/// The titled charts for one dashboard. Charts whose view is empty are left
/// out, so an empty batch renders nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub heading: String,
    pub charts: Vec<Chart>,
}

impl ChartSet {
    pub fn build(dashboard: &Dashboard, mode: DashboardMode) -> Self {
        let mut set = ChartSet {
            heading: match mode {
                DashboardMode::Mine => "Visualising only your data".to_string(),
                DashboardMode::All => "Visualising data from all contributors".to_string(),
            },
            charts: Vec::new(),
        };

        if dashboard.is_empty() {
            return set;
        }

        let activity_share = to_series(
            &dashboard.activity,
            "Activity Share",
            &SeriesOptions {
                scale: Scale::Share,
                palette: Palette::Activity,
                ..Default::default()
            },
        );
        let sorted = SeriesOptions {
            order: LabelOrder::Ascending,
            ..Default::default()
        };

        match mode {
            DashboardMode::Mine => {
                set.push("Activity Participation Share", ChartKind::Pie, activity_share);
                set.push(
                    "Number of People by Month",
                    ChartKind::Bar,
                    time_series(&dashboard.date_by_month, "Number of People by Month", MONTH_COLOR),
                );
                set.push(
                    "Number of People by Year",
                    ChartKind::Bar,
                    time_series(&dashboard.date_by_year, "Number of People by Year", YEAR_COLOR),
                );
                set.push(
                    "Number of People by Activity",
                    ChartKind::Bar,
                    to_series(
                        &dashboard.activity,
                        "Number of People by Activity",
                        &SeriesOptions {
                            palette: Palette::Activity,
                            ..Default::default()
                        },
                    ),
                );
                set.push(
                    "Number of People by Location",
                    ChartKind::Bar,
                    to_series(
                        &dashboard.location,
                        "Number of People by Location",
                        &SeriesOptions {
                            palette: Palette::Single(LOCATION_COLOR),
                            ..Default::default()
                        },
                    ),
                );
                set.push(
                    "Type of Insight",
                    ChartKind::Bar,
                    to_series(&dashboard.type_of_insight, "Type of Insight", &sorted),
                );
                set.push(
                    "Age Range",
                    ChartKind::Bar,
                    to_series(&dashboard.age_range, "Age Range", &sorted),
                );
                let axis = dashboard.activity_by_location.inner_keys();
                set.push(
                    "Number of People by Activity by Location",
                    ChartKind::StackedBar,
                    stacked_series(&dashboard.activity_by_location, &axis),
                );
            }
            DashboardMode::All => {
                set.push("Activity Participation Share", ChartKind::Pie, activity_share);
                set.push(
                    "Age Range",
                    ChartKind::Bar,
                    to_series(
                        &dashboard.age_range,
                        "Number of People by Age Range",
                        &SeriesOptions::default(),
                    ),
                );
                set.push(
                    "Type of Insight",
                    ChartKind::HorizontalBar,
                    to_series(
                        &dashboard.type_of_insight,
                        "Number of People by Type of Insight",
                        &SeriesOptions::default(),
                    ),
                );
                set.push(
                    "Number of People per Month",
                    ChartKind::Line,
                    time_series(&dashboard.date_by_month, "Number of People per Month", MONTH_COLOR),
                );
                set.push(
                    "Number of People per Year",
                    ChartKind::Bar,
                    time_series(&dashboard.date_by_year, "Number of People per Year", YEAR_COLOR),
                );
                set.push(
                    "Local Authority Count",
                    ChartKind::Bar,
                    to_series(
                        &dashboard.local_authority_count,
                        "Local Authority Count",
                        &SeriesOptions::default(),
                    ),
                );
                set.push(
                    "Number of People by Local Authority",
                    ChartKind::Bar,
                    to_series(
                        &dashboard.people_by_local_authority,
                        "Number of People by Local Authority",
                        &SeriesOptions::default(),
                    ),
                );
            }
        }

        set
    }

    fn push(&mut self, title: &str, kind: ChartKind, data: ChartSeries) {
        if data.is_empty() {
            return;
        }
        self.charts.push(Chart {
            title: title.to_string(),
            kind,
            data,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.title == title)
    }
}
