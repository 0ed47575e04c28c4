use crate::analyzers::types::{AggregateView, Dashboard, DashboardOptions, NestedView};
use crate::records::{ActivityRecord, Field};
use chrono::NaiveDate;

/// Bucket key formats for the time views.
const MONTH_KEY: &str = "%Y-%m";
const YEAR_KEY: &str = "%Y";

pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_KEY).to_string()
}

pub fn year_key(date: NaiveDate) -> String {
    date.format(YEAR_KEY).to_string()
}

/// Sums `number_of_people` per distinct value of `field`.
pub fn sum_by(records: &[ActivityRecord], field: Field) -> AggregateView {
    let mut view = AggregateView::new();
    for r in records {
        view.add(r.field(field), r.number_of_people);
    }
    view
}

/// Counts records per distinct value of `field`.
pub fn count_by(records: &[ActivityRecord], field: Field) -> AggregateView {
    let mut view = AggregateView::new();
    for r in records {
        view.add(r.field(field), 1);
    }
    view
}

/// `outer` value to `inner` value to summed people. Only observed pairs
/// appear in the inner maps.
pub fn nested_sum_by(records: &[ActivityRecord], outer: Field, inner: Field) -> NestedView {
    let mut view = NestedView::new();
    for r in records {
        view.add(r.field(outer), r.field(inner), r.number_of_people);
    }
    view
}

/// People per `YYYY-MM` calendar month.
pub fn sum_by_month(records: &[ActivityRecord]) -> AggregateView {
    let mut view = AggregateView::new();
    for r in records {
        view.add(&month_key(r.date), r.number_of_people);
    }
    view
}

/// People per `YYYY` calendar year.
pub fn sum_by_year(records: &[ActivityRecord]) -> AggregateView {
    let mut view = AggregateView::new();
    for r in records {
        view.add(&year_key(r.date), r.number_of_people);
    }
    view
}

/// Computes every named view from the same batch. Pure: the result depends
/// only on the records (as a set of key to value mappings) and the options.
pub fn build_dashboard(records: &[ActivityRecord], options: &DashboardOptions) -> Dashboard {
    Dashboard {
        activity: sum_by(records, Field::Activity),
        location: sum_by(records, options.location_field),
        type_of_insight: sum_by(records, Field::TypeOfInsight),
        age_range: sum_by(records, Field::AgeRange),
        local_authority_count: count_by(records, Field::LocalAuthority),
        people_by_local_authority: sum_by(records, Field::LocalAuthority),
        activity_by_location: nested_sum_by(records, Field::Activity, options.location_field),
        date_by_month: sum_by_month(records),
        date_by_year: sum_by_year(records),
        record_count: records.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(activity: &str, location: &str, date: (i32, u32, u32), people: u64) -> ActivityRecord {
        ActivityRecord {
            activity: activity.to_string(),
            local_authority: location.to_string(),
            location: format!("near {location}"),
            type_of_insight: "Survey".to_string(),
            age_range: "26-35".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            number_of_people: people,
            postcode: None,
        }
    }

    fn scenario() -> Vec<ActivityRecord> {
        vec![
            record("Housing", "Leeds", (2023, 1, 1), 10),
            record("Housing", "Leeds", (2023, 1, 15), 5),
            record("Energy", "York", (2023, 2, 1), 7),
        ]
    }

    #[test]
    fn test_scenario_activity_and_time_views() {
        let records = scenario();

        let expected: AggregateView = [("Housing", 15), ("Energy", 7)].into_iter().collect();
        assert_eq!(sum_by(&records, Field::Activity), expected);

        let months: AggregateView = [("2023-01", 15), ("2023-02", 7)].into_iter().collect();
        assert_eq!(sum_by_month(&records), months);

        let years: AggregateView = [("2023", 22)].into_iter().collect();
        assert_eq!(sum_by_year(&records), years);
    }

    #[test]
    fn test_count_by_counts_records_not_people() {
        let view = count_by(&scenario(), Field::Activity);
        assert_eq!(view.get("Housing"), Some(2));
        assert_eq!(view.get("Energy"), Some(1));
    }

    #[test]
    fn test_nested_sum_is_sparse_and_accumulates() {
        let mut records = scenario();
        records.push(record("Housing", "York", (2023, 3, 1), 2));
        records.push(record("Housing", "Leeds", (2023, 3, 2), 1));

        let nested = nested_sum_by(&records, Field::Activity, Field::LocalAuthority);

        assert_eq!(nested.len(), 2);
        let housing = nested.get("Housing").unwrap();
        assert_eq!(housing.get("Leeds"), Some(16));
        assert_eq!(housing.get("York"), Some(2));
        let energy = nested.get("Energy").unwrap();
        assert_eq!(energy.get("Leeds"), None);
        assert_eq!(energy.get("York"), Some(7));
        assert_eq!(nested.inner_keys(), vec!["Leeds", "York"]);
    }

    #[test]
    fn test_empty_string_is_its_own_key() {
        let records = vec![
            record("", "", (2022, 5, 5), 3),
            record("Finance", "", (2022, 5, 6), 4),
        ];
        let view = sum_by(&records, Field::Activity);
        assert_eq!(view.get(""), Some(3));
        assert_eq!(view.get("Finance"), Some(4));
        assert_eq!(sum_by(&records, Field::LocalAuthority).get(""), Some(7));
    }

    #[test]
    fn test_zero_count_record_still_has_category() {
        let records = vec![record("Transport", "Hull", (2021, 9, 9), 0)];
        let view = sum_by(&records, Field::Activity);
        assert_eq!(view.get("Transport"), Some(0));
        assert_eq!(count_by(&records, Field::Activity).get("Transport"), Some(1));
    }

    #[test]
    fn test_sums_saturate_instead_of_overflowing() {
        let records = vec![
            record("Housing", "Leeds", (2023, 1, 1), u64::MAX),
            record("Housing", "Leeds", (2023, 1, 2), 1),
            record("Energy", "York", (2023, 1, 3), 5),
        ];

        let activity = sum_by(&records, Field::Activity);
        assert_eq!(activity.get("Housing"), Some(u64::MAX));
        assert_eq!(activity.total(), u64::MAX);
        assert_eq!(sum_by_month(&records).get("2023-01"), Some(u64::MAX));
        assert_eq!(sum_by_year(&records).get("2023"), Some(u64::MAX));

        let nested = nested_sum_by(&records, Field::Activity, Field::LocalAuthority);
        assert_eq!(nested.get("Housing").unwrap().get("Leeds"), Some(u64::MAX));
    }

    #[test]
    fn test_month_key_ignores_day_and_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(month_key(date), "2024-03");
        assert_eq!(year_key(date), "2024");
    }

    #[test]
    fn test_dashboard_order_independent() {
        let records = scenario();
        let mut reversed = records.clone();
        reversed.reverse();

        let options = DashboardOptions::default();
        assert_eq!(
            build_dashboard(&records, &options),
            build_dashboard(&reversed, &options)
        );
    }

    #[test]
    fn test_dashboard_location_field_option() {
        let records = scenario();
        let options = DashboardOptions {
            location_field: Field::Location,
        };
        let dashboard = build_dashboard(&records, &options);

        assert_eq!(dashboard.location.get("near Leeds"), Some(15));
        assert!(dashboard.activity_by_location.get("Energy").unwrap().get("near York").is_some());
        assert_eq!(dashboard.people_by_local_authority.get("Leeds"), Some(15));
        assert_eq!(dashboard.local_authority_count.get("Leeds"), Some(2));
    }

    #[test]
    fn test_empty_input_gives_empty_views() {
        let dashboard = build_dashboard(&[], &DashboardOptions::default());
        assert!(dashboard.is_empty());
        assert!(dashboard.activity.is_empty());
        assert!(dashboard.activity_by_location.is_empty());
        assert!(dashboard.date_by_month.is_empty());
        assert!(dashboard.date_by_year.is_empty());
    }
}
