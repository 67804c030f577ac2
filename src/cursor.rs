use jiff::{Timestamp, civil::Date, tz::Offset};

use crate::{
    calendar::{civil_date, days_since_epoch},
    options::{Frequency, ParsedOptions},
};

/// The largest year a cursor may reach.
///
/// This is the largest year Jiff supports. Stepping past it ends iteration.
pub(crate) const MAX_YEAR: i64 = 9999;

/// The outcome of moving a cursor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    Advanced,
    /// The cursor would have moved past `MAX_YEAR`, or a sub-daily rule can
    /// never again produce a clock value in its constraints. The cursor is
    /// left unchanged.
    Exhausted,
}

/// The civil position that a rule is currently expanding.
///
/// A cursor always holds a valid Gregorian date. How much of it matters
/// depends on the frequency: a yearly rule only looks at the year, while a
/// secondly rule looks at everything down to the second.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Cursor {
    pub(crate) year: i64,
    pub(crate) month: i64,
    pub(crate) day: i64,
    pub(crate) hour: i64,
    pub(crate) minute: i64,
    pub(crate) second: i64,
    pub(crate) millisecond: i64,
}

impl Cursor {
    /// Create a cursor from the UTC fields of the given instant.
    pub(crate) fn new(ts: Timestamp) -> Cursor {
        let dt = Offset::UTC.to_datetime(ts);
        Cursor {
            year: i64::from(dt.year()),
            month: i64::from(dt.month()),
            day: i64::from(dt.day()),
            hour: i64::from(dt.hour()),
            minute: i64::from(dt.minute()),
            second: i64::from(dt.second()),
            millisecond: i64::from(dt.subsec_nanosecond() / 1_000_000),
        }
    }

    /// Returns this cursor's date.
    pub(crate) fn date(&self) -> Date {
        // OK because a cursor always holds a valid date within MAX_YEAR.
        civil_date(self.year, self.month, self.day).unwrap()
    }

    /// Returns the number of days from 1970-01-01 to this cursor's date.
    pub(crate) fn days(&self) -> i64 {
        days_since_epoch(self.date())
    }

    /// Advance by one interval of the rule's frequency.
    ///
    /// `filtered` should be true when the window just expanded had at least
    /// one day removed by the rule's constraints. Sub-daily frequencies use
    /// it to skip straight to the last step of the day.
    pub(crate) fn step(
        &mut self,
        opts: &ParsedOptions,
        filtered: bool,
    ) -> Step {
        let n = i64::from(opts.interval);
        let mut next = *self;
        let step = match opts.freq {
            Frequency::Yearly => next.add_years(n),
            Frequency::Monthly => next.add_months(n),
            Frequency::Weekly => next.add_weekly(
                n,
                i64::from(opts.week_start.to_monday_zero_offset()),
            ),
            Frequency::Daily => next.add_days(n),
            Frequency::Hourly => next.add_hours(opts, n, filtered),
            Frequency::Minutely => next.add_minutes(opts, n, filtered),
            Frequency::Secondly => next.add_seconds(opts, n, filtered),
        };
        if step == Step::Advanced {
            *self = next;
        }
        step
    }

    fn add_years(&mut self, n: i64) -> Step {
        self.year += n;
        if self.year > MAX_YEAR {
            return Step::Exhausted;
        }
        self.clamp_day();
        Step::Advanced
    }

    fn add_months(&mut self, n: i64) -> Step {
        let months = self.month - 1 + n;
        self.year += months.div_euclid(12);
        self.month = months.rem_euclid(12) + 1;
        if self.year > MAX_YEAR {
            return Step::Exhausted;
        }
        self.clamp_day();
        Step::Advanced
    }

    /// Move to the start of the week `n` weeks from the one containing this
    /// cursor, where weeks begin on `week_start` (Monday is `0`).
    fn add_weekly(&mut self, n: i64, week_start: i64) -> Step {
        let weekday = self.date().weekday().to_monday_zero_offset();
        let weekday = i64::from(weekday);
        let since_week_start = (weekday - week_start).rem_euclid(7);
        self.add_days(n * 7 - since_week_start)
    }

    fn add_days(&mut self, n: i64) -> Step {
        self.day += n;
        self.fix_day()
    }

    /// Roll excess days into the following months.
    fn fix_day(&mut self) -> Step {
        loop {
            let len = self.month_len();
            if self.day <= len {
                return Step::Advanced;
            }
            self.day -= len;
            self.month += 1;
            if self.month == 13 {
                self.month = 1;
                self.year += 1;
                if self.year > MAX_YEAR {
                    return Step::Exhausted;
                }
            }
        }
    }

    fn clamp_day(&mut self) {
        self.day = self.day.min(self.month_len());
    }

    fn month_len(&self) -> i64 {
        civil_date(self.year, self.month, 1)
            .map_or(31, |first| i64::from(first.days_in_month()))
    }

    fn add_hours(
        &mut self,
        opts: &ParsedOptions,
        n: i64,
        filtered: bool,
    ) -> Step {
        if filtered {
            self.hour += ((23 - self.hour) / n) * n;
        }
        for _ in 0..24 {
            self.hour += n;
            let days = self.hour.div_euclid(24);
            self.hour = self.hour.rem_euclid(24);
            if days > 0 && self.add_days(days) == Step::Exhausted {
                return Step::Exhausted;
            }
            if self.clock_matches(opts) {
                return Step::Advanced;
            }
        }
        Step::Exhausted
    }

    fn add_minutes(
        &mut self,
        opts: &ParsedOptions,
        n: i64,
        filtered: bool,
    ) -> Step {
        if filtered {
            let minute_of_day = self.hour * 60 + self.minute;
            self.minute += ((1439 - minute_of_day) / n) * n;
        }
        for _ in 0..1440 {
            self.minute += n;
            let hours = self.minute.div_euclid(60);
            self.minute = self.minute.rem_euclid(60);
            if hours > 0 && self.add_hours_exact(hours) == Step::Exhausted {
                return Step::Exhausted;
            }
            if self.clock_matches(opts) {
                return Step::Advanced;
            }
        }
        Step::Exhausted
    }

    fn add_seconds(
        &mut self,
        opts: &ParsedOptions,
        n: i64,
        filtered: bool,
    ) -> Step {
        if filtered {
            let second_of_day =
                self.hour * 3600 + self.minute * 60 + self.second;
            self.second += ((86399 - second_of_day) / n) * n;
        }
        for _ in 0..86400 {
            self.second += n;
            let minutes = self.second.div_euclid(60);
            self.second = self.second.rem_euclid(60);
            if minutes > 0 {
                self.minute += minutes;
                let hours = self.minute.div_euclid(60);
                self.minute = self.minute.rem_euclid(60);
                if hours > 0 && self.add_hours_exact(hours) == Step::Exhausted
                {
                    return Step::Exhausted;
                }
            }
            if self.clock_matches(opts) {
                return Step::Advanced;
            }
        }
        Step::Exhausted
    }

    /// Add hours without consulting any constraints, carrying into days.
    fn add_hours_exact(&mut self, n: i64) -> Step {
        self.hour += n;
        let days = self.hour.div_euclid(24);
        self.hour = self.hour.rem_euclid(24);
        if days > 0 { self.add_days(days) } else { Step::Advanced }
    }

    /// Returns true when this cursor's clock satisfies the rule's hour,
    /// minute and second constraints, as far as they apply to the rule's
    /// frequency. An empty constraint accepts anything.
    pub(crate) fn clock_matches(&self, opts: &ParsedOptions) -> bool {
        fn allows(set: &[i8], value: i64) -> bool {
            set.is_empty() || set.iter().any(|&v| i64::from(v) == value)
        }

        if !allows(&opts.by_hour, self.hour) {
            return false;
        }
        if opts.freq >= Frequency::Minutely
            && !allows(&opts.by_minute, self.minute)
        {
            return false;
        }
        if opts.freq >= Frequency::Secondly
            && !allows(&opts.by_second, self.second)
        {
            return false;
        }
        true
    }
}
