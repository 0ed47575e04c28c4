use charity_insights::analyzers::aggregate::{build_dashboard, month_key, sum_by, year_key};
use charity_insights::analyzers::analyzer::analyze_rows;
use charity_insights::analyzers::types::{AggregateView, DashboardOptions};
use charity_insights::chart::{ChartSet, DashboardMode};
use charity_insights::parser::parse_upload;
use charity_insights::records::{ActivityRecord, Field, Schema};
use chrono::NaiveDate;
use proptest::prelude::*;

#[test]
fn test_full_pipeline() {
    let bytes = include_bytes!("fixtures/upload.csv");
    let rows = parse_upload(bytes).expect("Failed to parse upload");
    assert_eq!(rows.len(), 5);

    let options = DashboardOptions {
        location_field: Field::Location,
    };
    let analysis = analyze_rows(&rows, Schema::Upload, &options);

    assert_eq!(analysis.stats.dropped_dates, 1);
    assert_eq!(analysis.stats.dropped[0].date, "not-a-date");
    assert_eq!(analysis.stats.coerced_counts, 1);

    let dashboard = &analysis.dashboard;
    let activity: AggregateView = [("Housing", 15), ("Energy", 7), ("Finance", 0)]
        .into_iter()
        .collect();
    assert_eq!(dashboard.activity, activity);

    let months: AggregateView = [("2023-01", 15), ("2023-02", 7), ("2023-03", 0)]
        .into_iter()
        .collect();
    assert_eq!(dashboard.date_by_month, months);
    assert_eq!(dashboard.date_by_year.get("2023"), Some(22));

    // Empty free-text location is its own key.
    assert_eq!(dashboard.location.get(""), Some(0));
    assert_eq!(dashboard.location.get("Hull"), None);

    let charts = ChartSet::build(dashboard, DashboardMode::Mine);
    let by_month = charts.get("Number of People by Month").unwrap();
    assert_eq!(by_month.data.labels, vec!["2023-01", "2023-02", "2023-03"]);
}

#[test]
fn test_scenario_three_rows() {
    let csv = "Activity,Date,Number of people\n\
               Housing,01/01/2023,10\n\
               Housing,15/01/2023,5\n\
               Energy,01/02/2023,7\n";
    let rows = parse_upload(csv.as_bytes()).unwrap();
    let analysis = analyze_rows(&rows, Schema::Upload, &DashboardOptions::default());

    let expected: AggregateView = [("Housing", 15), ("Energy", 7)].into_iter().collect();
    assert_eq!(analysis.dashboard.activity, expected);
    let months: AggregateView = [("2023-01", 15), ("2023-02", 7)].into_iter().collect();
    assert_eq!(analysis.dashboard.date_by_month, months);
    let years: AggregateView = [("2023", 22)].into_iter().collect();
    assert_eq!(analysis.dashboard.date_by_year, years);
}

#[test]
fn test_empty_upload_renders_nothing() {
    let rows = parse_upload(b"Activity,Date,Number of people\n").unwrap();
    let analysis = analyze_rows(&rows, Schema::Upload, &DashboardOptions::default());

    assert!(analysis.dashboard.is_empty());
    assert!(analysis.dashboard.activity.is_empty());
    assert!(analysis.dashboard.date_by_month.is_empty());
    assert!(ChartSet::build(&analysis.dashboard, DashboardMode::Mine).is_empty());
}

const ACTIVITIES: &[&str] = &["Housing", "Energy", "Transport", "Finance", ""];
const AUTHORITIES: &[&str] = &["Leeds", "York", "Hull", ""];

fn arb_record() -> impl Strategy<Value = ActivityRecord> {
    (
        0..ACTIVITIES.len(),
        0..AUTHORITIES.len(),
        2015i32..2026,
        1u32..=12,
        1u32..=28,
        0u64..10_000,
    )
        .prop_map(|(a, l, year, month, day, people)| ActivityRecord {
            activity: ACTIVITIES[a].to_string(),
            local_authority: AUTHORITIES[l].to_string(),
            location: AUTHORITIES[l].to_lowercase(),
            type_of_insight: "Survey".to_string(),
            age_range: "18-25".to_string(),
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            number_of_people: people,
            postcode: None,
        })
}

proptest! {
    #[test]
    fn prop_sum_views_conserve_total(records in prop::collection::vec(arb_record(), 0..60)) {
        let total: u64 = records.iter().map(|r| r.number_of_people).sum();
        let dashboard = build_dashboard(&records, &DashboardOptions::default());

        prop_assert_eq!(dashboard.activity.total(), total);
        prop_assert_eq!(dashboard.location.total(), total);
        prop_assert_eq!(dashboard.type_of_insight.total(), total);
        prop_assert_eq!(dashboard.age_range.total(), total);
        prop_assert_eq!(dashboard.date_by_month.total(), total);
        prop_assert_eq!(dashboard.date_by_year.total(), total);
        let nested: u64 = dashboard.activity_by_location.iter().map(|(_, v)| v.total()).sum();
        prop_assert_eq!(nested, total);
        prop_assert_eq!(dashboard.local_authority_count.total(), records.len() as u64);
    }

    #[test]
    fn prop_views_ignore_record_order(
        records in prop::collection::vec(arb_record(), 0..40),
        seed in any::<u64>(),
    ) {
        let mut shuffled = records.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.swap(0, len - 1);
        }

        let options = DashboardOptions::default();
        prop_assert_eq!(build_dashboard(&records, &options), build_dashboard(&shuffled, &options));
        prop_assert_eq!(build_dashboard(&records, &options), build_dashboard(&records, &options));
    }

    #[test]
    fn prop_year_bucket_contains_month_bucket(records in prop::collection::vec(arb_record(), 1..40)) {
        let dashboard = build_dashboard(&records, &DashboardOptions::default());

        for r in &records {
            let month = month_key(r.date);
            let year = year_key(r.date);
            prop_assert!(month.starts_with(&year));
            prop_assert!(dashboard.date_by_month.get(&month).is_some());
            prop_assert!(dashboard.date_by_year.get(&year).is_some());
        }
        for year in dashboard.date_by_year.keys() {
            let from_months: u64 = dashboard
                .date_by_month
                .iter()
                .filter(|(m, _)| m.starts_with(year))
                .map(|(_, v)| v)
                .sum();
            prop_assert_eq!(Some(from_months), dashboard.date_by_year.get(year));
        }
        let activity_keys = sum_by(&records, Field::Activity);
        prop_assert_eq!(activity_keys.len(), dashboard.activity_by_location.len());
    }
}
