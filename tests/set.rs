use sunrule::RecurrenceSet;

use crate::{rule, snapshot, ts};

fn weekdays_in_january() -> RecurrenceSet {
    let mut set = RecurrenceSet::new();
    set.rrule(rule(
        r#"{"freq": "daily", "dtstart": "2024-01-01T09:00:00Z", "count": 10}"#,
    ))
    .exrule(rule(
        r#"{"freq": "weekly", "dtstart": "2024-01-01T09:00:00Z", "byweekday": ["SA", "SU"]}"#,
    ))
    .rdate(ts("2024-01-20T12:00:00Z"))
    .exdate(ts("2024-01-03T09:00:00Z"));
    set
}

#[test]
fn rules_and_instants_combine() {
    let set = weekdays_in_january();
    insta::assert_snapshot!(snapshot(&set), @r"
    2024-01-01T09:00:00Z
    2024-01-02T09:00:00Z
    2024-01-04T09:00:00Z
    2024-01-05T09:00:00Z
    2024-01-08T09:00:00Z
    2024-01-09T09:00:00Z
    2024-01-10T09:00:00Z
    2024-01-20T12:00:00Z
    ");
}

#[test]
fn set_queries() {
    let set = weekdays_in_january();
    insta::assert_snapshot!(
        snapshot(set.between(
            ts("2024-01-05T00:00:00Z"),
            ts("2024-01-31T00:00:00Z"),
            false,
        )),
        @r"
    2024-01-05T09:00:00Z
    2024-01-08T09:00:00Z
    2024-01-09T09:00:00Z
    2024-01-10T09:00:00Z
    2024-01-20T12:00:00Z
    ",
    );
    assert_eq!(
        set.after(ts("2024-01-02T09:00:00Z"), false),
        Some(ts("2024-01-04T09:00:00Z")),
    );
    assert_eq!(
        set.before(ts("2024-01-08T09:00:00Z"), false),
        Some(ts("2024-01-05T09:00:00Z")),
    );
    assert_eq!(set.after(ts("2024-01-20T12:00:00Z"), false), None);
}

#[test]
fn exclusions_compare_rezoned_instants() {
    // 09:00 in Tokyo is midnight UTC, which is what the exclusion names.
    let mut set = RecurrenceSet::new();
    set.rrule(rule(
        r#"{"freq": "daily", "dtstart": "2024-01-01T09:00:00Z", "tzid": "Asia/Tokyo", "count": 3}"#,
    ))
    .exdate(ts("2024-01-02T00:00:00Z"))
    .exdate(ts("2024-01-03T09:00:00Z"));
    insta::assert_snapshot!(snapshot(set.all()), @r"
    2024-01-01T00:00:00Z
    2024-01-03T00:00:00Z
    ");
}
