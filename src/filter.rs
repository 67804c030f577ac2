use crate::{
    calendar::CalendarInfo, dayset::DaySet, options::ParsedOptions,
    weekday::ByWeekday,
};

/// Remove every day from the window that fails one of the rule's day
/// constraints.
///
/// A day survives only when it satisfies every constraint that is set.
/// Month days are the one place where two sets combine: a day survives the
/// month day check when either its positive or its negative day of the month
/// is listed.
///
/// Returns true when at least one day was removed.
pub(crate) fn remove_filtered_days(
    set: &mut DaySet,
    info: &CalendarInfo,
    opts: &ParsedOptions,
) -> bool {
    let mut plain = [false; 7];
    let mut any_plain = false;
    for wd in opts.by_week_day.iter() {
        if let ByWeekday::Any(weekday) = *wd {
            plain[weekday.to_monday_zero_offset() as usize] = true;
            any_plain = true;
        }
    }
    set.remove_if(|day| {
        if !opts.by_month.is_empty()
            && !opts.by_month.contains(&info.month_mask[day])
        {
            return true;
        }
        if let Some(ref week_no) = info.week_no {
            if !week_no[day] {
                return true;
            }
        }
        if any_plain && !plain[info.weekday[day] as usize] {
            return true;
        }
        if let Some(ref nth_weekday) = info.nth_weekday {
            if !nth_weekday[day] {
                return true;
            }
        }
        if !opts.by_month_day.is_empty()
            && !opts.by_month_day.contains(&info.month_day[day])
            && !opts.by_month_day.contains(&info.neg_month_day[day])
        {
            return true;
        }
        if !opts.by_year_day.is_empty() && !matches_year_day(day, info, opts)
        {
            return true;
        }
        false
    })
}

/// Returns true when the given day offset is listed in `by_year_day`.
///
/// Offsets in the padding past the end of the year count within the next
/// year.
fn matches_year_day(
    day: usize,
    info: &CalendarInfo,
    opts: &ParsedOptions,
) -> bool {
    let (day, yearlen, nextyearlen) =
        (day as i64, info.yearlen as i64, info.nextyearlen as i64);
    let (positive, negative) = if day < yearlen {
        (day + 1, day - yearlen)
    } else {
        (day + 1 - yearlen, day - yearlen - nextyearlen)
    };
    opts.by_year_day
        .iter()
        .any(|&v| i64::from(v) == positive || i64::from(v) == negative)
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, civil::Weekday};

    use crate::{
        cursor::Cursor,
        dayset::day_set,
        options::{Frequency, RawOptions},
        weekday::ByWeekday,
    };

    use super::*;

    /// Expands the window at the given instant and returns the surviving
    /// days along with whether anything was removed.
    fn survivors(
        freq: Frequency,
        at: &str,
        f: impl FnOnce(&mut RawOptions),
    ) -> String {
        let start: Timestamp = at.parse().unwrap();
        let mut raw = RawOptions::new(freq, start);
        f(&mut raw);
        let opts = ParsedOptions::new(&raw).unwrap();
        let cursor = Cursor::new(start);
        let info = CalendarInfo::new(&opts, cursor.year, cursor.month);
        let mut set = day_set(&opts, &info, &cursor);
        let filtered = remove_filtered_days(&mut set, &info, &opts);
        let days: Vec<String> =
            set.days().map(|d| info.date(d).unwrap().to_string()).collect();
        format!("filtered={filtered} {}", days.join(","))
    }

    #[test]
    fn month_days_accept_positive_or_negative() {
        insta::assert_snapshot!(
            survivors(Frequency::Monthly, "2024-02-01T00:00:00Z", |raw| {
                raw.by_month_day = vec![1, -1, 15];
            }),
            @"filtered=true 2024-02-01,2024-02-15,2024-02-29",
        );
    }

    #[test]
    fn constraints_combine_with_and() {
        // Friday the 13th.
        insta::assert_snapshot!(
            survivors(Frequency::Yearly, "1998-01-01T00:00:00Z", |raw| {
                raw.by_month_day = vec![13];
                raw.by_week_day = vec![ByWeekday::Any(Weekday::Friday)];
            }),
            @"filtered=true 1998-02-13,1998-03-13,1998-11-13",
        );
    }

    #[test]
    fn numbered_weekdays_within_month() {
        insta::assert_snapshot!(
            survivors(Frequency::Monthly, "1997-09-01T00:00:00Z", |raw| {
                raw.by_week_day = vec![
                    ByWeekday::Numbered { nth: 1, weekday: Weekday::Friday },
                    ByWeekday::Numbered { nth: -1, weekday: Weekday::Sunday },
                ];
            }),
            @"filtered=true 1997-09-05,1997-09-28",
        );
    }

    #[test]
    fn year_days_count_from_either_end() {
        insta::assert_snapshot!(
            survivors(Frequency::Yearly, "2024-01-01T00:00:00Z", |raw| {
                raw.by_year_day = vec![1, 100, -1];
            }),
            @"filtered=true 2024-01-01,2024-04-09,2024-12-31",
        );
    }

    #[test]
    fn year_days_in_padding_count_within_next_year() {
        // The weekly window starting on 1997-12-29 runs into 1998, whose
        // first day is year day 1 and whose last day is year day -365.
        insta::assert_snapshot!(
            survivors(Frequency::Weekly, "1997-12-29T00:00:00Z", |raw| {
                raw.by_year_day = vec![1, -365];
            }),
            @"filtered=true 1998-01-01",
        );
    }

    #[test]
    fn week_numbers() {
        insta::assert_snapshot!(
            survivors(Frequency::Yearly, "1997-01-01T00:00:00Z", |raw| {
                raw.by_week = vec![20];
                raw.by_week_day = vec![ByWeekday::Any(Weekday::Monday)];
            }),
            @"filtered=true 1997-05-12",
        );
    }

    #[test]
    fn nothing_removed_when_unconstrained() {
        insta::assert_snapshot!(
            survivors(Frequency::Daily, "2024-03-10T00:00:00Z", |_| {}),
            @"filtered=false 2024-03-10",
        );
    }
}
