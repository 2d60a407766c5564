use chrono::Duration;
use gymdesk_core::aggregate::Summarize;
use gymdesk_core::model::{AttendanceRecord, DietAssignment, Payment};
use gymdesk_core::query::{
    FilterState, PageState, Period, PeriodFilter, Query, Record, SortState, build_predicate,
    filter_and_sort, resolve_range, run_query,
};
use proptest::prelude::*;

#[path = "generators.rs"]
mod generators;
use generators::*;

fn ids<T: Record>(rows: &[&T]) -> Vec<String> {
    rows.iter().map(|r| r.id().to_string()).collect()
}

fn arb_filter() -> impl Strategy<Value = FilterState> {
    (
        prop_oneof![
            Just("all"),
            Just("paid"),
            Just("pending"),
            Just("refunded")
        ],
        prop_oneof![Just(""), Just("ana"), Just("MOSS"), Just(" o ")],
        prop_oneof![Just("all"), Just("cash"), Just("card")],
    )
        .prop_map(|(status, search, method)| {
            FilterState::new()
                .with_equals("status", status)
                .with_equals("method", method)
                .with_search(search)
        })
}

fn arb_sort_key() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("id"),
        Just("amount"),
        Just("paid_at"),
        Just("member_name"),
        Just("status"),
    ]
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn filter_is_idempotent(payments in arb_payments(40), filter in arb_filter(), now in arb_now()) {
        let predicate = build_predicate(&filter, Payment::schema(), now).unwrap();
        let once = predicate.filter(&payments);
        let twice = predicate.filter(once.iter().copied());
        prop_assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn desc_is_reverse_of_asc_for_unique_keys(payments in arb_payments(40), now in arb_now()) {
        let (asc, _) = filter_and_sort(&payments, &FilterState::new(), Some(&SortState::asc("id")), now).unwrap();
        let (desc, _) = filter_and_sort(&payments, &FilterState::new(), Some(&SortState::desc("id")), now).unwrap();
        let mut reversed = ids(&asc);
        reversed.reverse();
        prop_assert_eq!(ids(&desc), reversed);
    }

    #[test]
    fn desc_is_reverse_of_asc_for_unique_numbers_and_dates(
        payments in arb_payments_with_unique_keys(40),
        key in prop_oneof![Just("amount"), Just("paid_at")],
        now in arb_now(),
    ) {
        let (asc, _) = filter_and_sort(&payments, &FilterState::new(), Some(&SortState::asc(key)), now).unwrap();
        let (desc, _) = filter_and_sort(&payments, &FilterState::new(), Some(&SortState::desc(key)), now).unwrap();
        let mut reversed = ids(&asc);
        reversed.reverse();
        prop_assert_eq!(ids(&desc), reversed);
    }

    #[test]
    fn equal_keys_keep_input_order(
        payments in arb_payments(40),
        key in prop_oneof![Just("status"), Just("method"), Just("member_name")],
        descending in any::<bool>(),
        now in arb_now(),
    ) {
        let sort = if descending { SortState::desc(key) } else { SortState::asc(key) };
        let (rows, _) = filter_and_sort(&payments, &FilterState::new(), Some(&sort), now).unwrap();
        for pair in rows.windows(2) {
            if pair[0].value(key).to_text() == pair[1].value(key).to_text() {
                // Generated ids are zero-padded in input order.
                prop_assert!(pair[0].id < pair[1].id, "{} before {}", pair[0].id, pair[1].id);
            }
        }
    }

    #[test]
    fn pages_partition_the_sorted_set(
        payments in arb_payments(60),
        filter in arb_filter(),
        key in arb_sort_key(),
        page_size in 1_usize..9,
        now in arb_now(),
    ) {
        let sort = SortState::asc(key);
        let (all, _) = filter_and_sort(&payments, &filter, Some(&sort), now).unwrap();
        let first = run_query(
            &payments,
            &Query::new().filter(filter.clone()).sort(sort.clone()).page(PageState::new(0, page_size)),
            now,
        ).unwrap();

        let mut stitched = Vec::new();
        for page in 0..first.page_count {
            let query = Query::new()
                .filter(filter.clone())
                .sort(sort.clone())
                .page(PageState::new(page, page_size));
            let result = run_query(&payments, &query, now).unwrap();
            prop_assert!(result.rows.len() <= page_size);
            stitched.extend(ids(&result.rows));
        }
        prop_assert_eq!(stitched, ids(&all));

        let past_end = run_query(
            &payments,
            &Query::new().filter(filter).sort(sort).page(PageState::new(first.page_count, page_size)),
            now,
        ).unwrap();
        prop_assert!(past_end.rows.is_empty());
    }

    #[test]
    fn total_ignores_pagination(
        payments in arb_payments(60),
        filter in arb_filter(),
        page in 0_usize..20,
        page_size in 1_usize..20,
        now in arb_now(),
    ) {
        let predicate = build_predicate(&filter, Payment::schema(), now).unwrap();
        let expected = predicate.filter(&payments).len();
        let query = Query::new().filter(filter).page(PageState::new(page, page_size));
        prop_assert_eq!(run_query(&payments, &query, now).unwrap().total, expected);
    }

    #[test]
    fn summaries_are_finite(
        payments in arb_payments(30),
        visits in arb_attendance(30),
        assignments in arb_assignments(30),
    ) {
        let payments: Vec<_> = payments.iter().collect();
        let visits: Vec<_> = visits.iter().collect();
        let assignments: Vec<_> = assignments.iter().collect();

        let p = Payment::summarize(&payments);
        prop_assert!(p.collection_rate.is_finite() && (0.0..=100.0).contains(&p.collection_rate));
        let a = AttendanceRecord::summarize(&visits);
        prop_assert!(a.avg_duration_minutes.is_finite());
        prop_assert!((0.0..=100.0).contains(&a.completion_rate));
        prop_assert_eq!(a.checked_in + a.completed, a.total);
        let d = DietAssignment::summarize(&assignments);
        prop_assert!((0.0..=100.0).contains(&d.avg_adherence));
    }

    #[test]
    fn period_bounds_are_half_open(now in arb_now(), index in 0_usize..10) {
        let period = Period::ALL[index];
        let range = resolve_range(period, None, None, now).unwrap();
        prop_assert!(range.start < range.end);

        let template = Payment {
            id: String::new(),
            member_id: "m-1".to_string(),
            member_name: "Probe".to_string(),
            package_id: "pkg-1".to_string(),
            amount: 1.0,
            method: gymdesk_core::model::PaymentMethod::Cash,
            status: gymdesk_core::model::PaymentStatus::Paid,
            paid_at: range.start,
        };
        let probes = vec![
            Payment { id: "at-start".to_string(), paid_at: range.start, ..template.clone() },
            Payment { id: "before-end".to_string(), paid_at: range.end - Duration::nanoseconds(1), ..template.clone() },
            Payment { id: "at-end".to_string(), paid_at: range.end, ..template.clone() },
            Payment { id: "before-start".to_string(), paid_at: range.start - Duration::nanoseconds(1), ..template },
        ];
        let filter = FilterState::new().with_period(PeriodFilter::new(period.as_str()));
        let predicate = build_predicate(&filter, Payment::schema(), now).unwrap();
        prop_assert_eq!(ids(&predicate.filter(&probes)), vec!["at-start", "before-end"]);
    }
}

#[test]
fn empty_summaries_are_zero() {
    let p = Payment::summarize(&[]);
    assert_eq!(p.count, 0);
    assert_eq!(p.total_revenue, 0.0);
    assert_eq!(p.collection_rate, 0.0);
    let a = AttendanceRecord::summarize(&[]);
    assert_eq!(a.avg_duration_minutes, 0.0);
    let d = DietAssignment::summarize(&[]);
    assert_eq!(d.avg_adherence, 0.0);
    assert_eq!(d.completion_rate, 0.0);
}
