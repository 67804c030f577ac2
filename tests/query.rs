use crate::{rule, snapshot, ts};

fn daily() -> sunrule::RecurrenceRule {
    rule(r#"{"freq": "daily", "dtstart": "2024-01-01T09:00:00Z", "count": 10}"#)
}

#[test]
fn month_days_past_the_end_of_a_month_are_skipped() {
    let rule = rule(
        r#"{"freq": "monthly", "dtstart": "2013-01-01T10:00:00Z", "bymonthday": 28, "count": 3}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    2013-01-28T10:00:00Z
    2013-02-28T10:00:00Z
    2013-03-28T10:00:00Z
    ");
}

#[test]
fn last_day_of_month() {
    let rule = rule(
        r#"{"freq": "monthly", "dtstart": "2013-12-01T10:00:00Z", "bymonthday": -1, "count": 4}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    2013-12-31T10:00:00Z
    2014-01-31T10:00:00Z
    2014-02-28T10:00:00Z
    2014-03-31T10:00:00Z
    ");

    let rule = crate::rule(
        r#"{"freq": "monthly", "dtstart": "2015-12-01T10:00:00Z", "bymonthday": -1, "count": 4}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    2015-12-31T10:00:00Z
    2016-01-31T10:00:00Z
    2016-02-29T10:00:00Z
    2016-03-31T10:00:00Z
    ");
}

#[test]
fn positive_and_negative_month_days_are_merged() {
    let rule = rule(
        r#"{"freq": "monthly", "dtstart": "2024-01-31T09:00:00Z", "bymonthday": [31, -1], "count": 4}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    2024-01-31T09:00:00Z
    2024-02-29T09:00:00Z
    2024-03-31T09:00:00Z
    2024-04-30T09:00:00Z
    ");
}

#[test]
fn year_days_from_either_end() {
    let rule = rule(
        r#"{"freq": "yearly", "dtstart": "2020-01-01T00:00:00Z", "byyearday": [-1, 60], "count": 4}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    2020-02-29T00:00:00Z
    2020-12-31T00:00:00Z
    2021-03-01T00:00:00Z
    2021-12-31T00:00:00Z
    ");
}

#[test]
fn hours_cross_midnight() {
    let rule = rule(
        r#"{"freq": "hourly", "dtstart": "2024-01-01T22:30:00Z", "byhour": [23, 1], "count": 4}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    2024-01-01T23:30:00Z
    2024-01-02T01:30:00Z
    2024-01-02T23:30:00Z
    2024-01-03T01:30:00Z
    ");
}

#[test]
fn sub_daily_rules_skip_filtered_days() {
    let rule = rule(
        r#"{"freq": "minutely", "dtstart": "1997-09-02T09:00:00Z", "bymonthday": [1, 3], "count": 3}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    1997-09-03T00:00:00Z
    1997-09-03T00:01:00Z
    1997-09-03T00:02:00Z
    ");

    let rule = crate::rule(
        r#"{"freq": "secondly", "interval": 7, "dtstart": "1997-09-02T09:00:00Z", "bymonthday": 3, "count": 3}"#,
    );
    insta::assert_snapshot!(snapshot(&rule), @r"
    1997-09-03T00:00:05Z
    1997-09-03T00:00:12Z
    1997-09-03T00:00:19Z
    ");
}

#[test]
fn count_bounds_occurrences() {
    let rule = daily();
    assert_eq!(rule.count(), 10);
    assert_eq!(rule.all().len(), 10);
    // Every query runs its own traversal.
    assert_eq!(rule.all(), rule.iter().collect::<Vec<_>>());
    let unbounded = crate::rule(
        r#"{"freq": "secondly", "dtstart": "2024-01-01T09:00:00Z"}"#,
    );
    assert_eq!(unbounded.iter().take(1_000).count(), 1_000);
}

#[test]
fn occurrences_are_strictly_ascending() {
    let rule = rule(
        r#"{"freq": "yearly", "dtstart": "1997-01-01T00:00:00Z", "bymonth": [1, 6], "byweekday": ["MO", "FR"], "byhour": [6, 18], "count": 200}"#,
    );
    let all = rule.all();
    assert_eq!(all.len(), 200);
    assert!(all.windows(2).all(|w| w[0] < w[1]));
    assert!(all.iter().all(|&t| t >= rule.options().start));
}

#[test]
fn all_with_stops_early() {
    let rule = daily();
    let got = rule.all_with(|t, n| n < 3 && t < ts("2024-01-03T00:00:00Z"));
    insta::assert_snapshot!(snapshot(got), @r"
    2024-01-01T09:00:00Z
    2024-01-02T09:00:00Z
    ");
}

#[test]
fn between_bounds() {
    let rule = daily();
    let (after, before) =
        (ts("2024-01-03T09:00:00Z"), ts("2024-01-05T09:00:00Z"));
    insta::assert_snapshot!(
        snapshot(rule.between(after, before, false)),
        @"2024-01-04T09:00:00Z",
    );
    insta::assert_snapshot!(
        snapshot(rule.between(after, before, true)),
        @r"
    2024-01-03T09:00:00Z
    2024-01-04T09:00:00Z
    2024-01-05T09:00:00Z
    ",
    );
    assert!(rule.between(before, after, true).is_empty());

    let got = rule.between_with(
        ts("2024-01-02T00:00:00Z"),
        ts("2024-02-01T00:00:00Z"),
        false,
        |_, n| n < 2,
    );
    insta::assert_snapshot!(snapshot(got), @r"
    2024-01-02T09:00:00Z
    2024-01-03T09:00:00Z
    ");
}

#[test]
fn before_and_after() {
    let rule = daily();
    let at = ts("2024-01-05T09:00:00Z");
    let between = ts("2024-01-05T12:00:00Z");

    assert_eq!(rule.before(at, true), Some(at));
    assert_eq!(rule.after(at, true), Some(at));
    assert_eq!(rule.before(at, false), Some(ts("2024-01-04T09:00:00Z")));
    assert_eq!(rule.after(at, false), Some(ts("2024-01-06T09:00:00Z")));
    // Away from an occurrence, inclusivity makes no difference.
    assert_eq!(rule.before(between, true), rule.before(between, false));
    assert_eq!(rule.after(between, true), rule.after(between, false));

    assert_eq!(rule.before(ts("2024-01-01T09:00:00Z"), false), None);
    assert_eq!(
        rule.before(ts("2030-01-01T00:00:00Z"), false),
        Some(ts("2024-01-10T09:00:00Z")),
    );
    assert_eq!(rule.after(ts("2024-01-10T09:00:00Z"), false), None);
}

#[test]
fn after_terminates_on_unbounded_rules() {
    let rule = rule(
        r#"{"freq": "yearly", "dtstart": "2000-01-01T00:00:00Z", "bymonth": 2, "bymonthday": 29}"#,
    );
    assert_eq!(
        rule.after(ts("2001-01-01T00:00:00Z"), false),
        Some(ts("2004-02-29T00:00:00Z")),
    );
}
