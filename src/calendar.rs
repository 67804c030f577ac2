use jiff::{ToSpan, civil::Date};

use crate::options::{Frequency, ParsedOptions};

/// Structural information about the year (and month) a rule is currently
/// expanding.
///
/// Every mask is indexed by the day offset from January 1 of `year`. The
/// masks run 7 days past the end of the year so that a weekly window that
/// starts in late December can be examined without special casing.
///
/// The week number mask is only computed when the rule has a week number
/// constraint, and the numbered weekday mask only when it has numbered
/// weekdays.
#[derive(Clone, Debug)]
pub(crate) struct CalendarInfo {
    year: i64,
    month: i64,
    pub(crate) yearlen: usize,
    pub(crate) nextyearlen: usize,
    /// The number of days from 1970-01-01 to January 1 of `year`.
    pub(crate) year_ordinal: i64,
    /// The weekday of January 1, where Monday is `0`.
    year_weekday: i64,
    pub(crate) month_mask: Vec<i8>,
    pub(crate) month_day: Vec<i8>,
    /// Negative days of the month, where `-1` is the last day.
    pub(crate) neg_month_day: Vec<i8>,
    /// Weekday of each day, where Monday is `0`.
    pub(crate) weekday: Vec<i8>,
    /// `month_range[m - 1]..month_range[m]` is the range of offsets in
    /// month `m`.
    pub(crate) month_range: [usize; 13],
    pub(crate) week_no: Option<Vec<bool>>,
    pub(crate) nth_weekday: Option<Vec<bool>>,
}

impl CalendarInfo {
    pub(crate) fn new(
        opts: &ParsedOptions,
        year: i64,
        month: i64,
    ) -> CalendarInfo {
        let mut info = CalendarInfo {
            year: i64::MIN,
            month: 0,
            yearlen: 0,
            nextyearlen: 0,
            year_ordinal: 0,
            year_weekday: 0,
            month_mask: vec![],
            month_day: vec![],
            neg_month_day: vec![],
            weekday: vec![],
            month_range: [0; 13],
            week_no: None,
            nth_weekday: None,
        };
        info.rebuild(opts, year, month);
        info
    }

    /// Recompute whatever depends on the given year and month.
    ///
    /// This is cheap when neither has changed since the last call.
    pub(crate) fn rebuild(
        &mut self,
        opts: &ParsedOptions,
        year: i64,
        month: i64,
    ) {
        let year_changed = year != self.year;
        if year_changed {
            self.rebuild_year(opts, year);
        }
        let month_changed = year_changed || month != self.month;
        if opts.has_numbered_weekdays() && month_changed {
            self.rebuild_nth_weekday(opts, month);
        }
        self.month = month;
    }

    /// Returns the day offsets `[first, end)` of the given month, where
    /// January is `1`.
    fn month_bounds(&self, month: usize) -> (usize, usize) {
        (self.month_range[month - 1], self.month_range[month])
    }

    /// Returns the civil date at the given day offset.
    pub(crate) fn date(&self, day: usize) -> Option<Date> {
        let (year, month) = if day < self.yearlen {
            (self.year, self.month_mask[day])
        } else {
            (self.year + 1, 1)
        };
        let year = i16::try_from(year).ok()?;
        Date::new(year, month, self.month_day[day]).ok()
    }

    fn rebuild_year(&mut self, opts: &ParsedOptions, year: i64) {
        // OK because the cursor never leaves the years Jiff supports.
        let jan1 = civil_date(year, 1, 1).unwrap();
        self.year = year;
        self.yearlen = jan1.days_in_year() as usize;
        self.nextyearlen = civil_date(year + 1, 1, 1)
            .map_or(365, |d| d.days_in_year() as usize);
        self.year_ordinal = days_since_epoch(jan1);
        self.year_weekday = i64::from(jan1.weekday().to_monday_zero_offset());

        let padded = self.yearlen + 7;
        self.month_mask.clear();
        self.month_day.clear();
        self.neg_month_day.clear();
        self.month_range[0] = 0;
        for first in jan1.series(1.month()).take(12) {
            let (month, len) = (first.month(), first.days_in_month());
            for day in 1..=len {
                self.month_mask.push(month);
                self.month_day.push(day);
                self.neg_month_day.push(day - len - 1);
            }
            let m = month as usize;
            self.month_range[m] = self.month_range[m - 1] + len as usize;
        }
        // The padding is the first week of January of the next year. Its
        // negative days count from the end of a 31 day month.
        for day in 1..=7 {
            self.month_mask.push(1);
            self.month_day.push(day);
            self.neg_month_day.push(day - 32);
        }
        // One extra week of weekdays so that scans starting inside the
        // padding can always find the end of their week.
        let year_weekday = self.year_weekday;
        self.weekday.clear();
        self.weekday.extend(
            (0..padded + 7).map(|i| ((year_weekday + i as i64) % 7) as i8),
        );

        self.week_no = if opts.by_week.is_empty() {
            None
        } else {
            Some(self.week_number_mask(opts, jan1))
        };
    }

    /// Build the mask of days whose week number is in `by_week`.
    ///
    /// Week 1 is the first week (starting on the rule's week start) with at
    /// least 4 days in the year. Days before week 1 belong to the last week
    /// of the previous year, and the last days of the year may belong to week
    /// 1 of the next year.
    fn week_number_mask(&self, opts: &ParsedOptions, jan1: Date) -> Vec<bool> {
        let mut mask = vec![false; self.yearlen + 7];
        let wkst = i64::from(opts.week_start.to_monday_zero_offset());
        let yearlen = self.yearlen as i64;
        let first_wkst = (7 - self.year_weekday + wkst).rem_euclid(7);
        let (no1_wkst, week_yearlen) = if first_wkst >= 4 {
            (0, yearlen + (self.year_weekday - wkst).rem_euclid(7))
        } else {
            (first_wkst, yearlen - first_wkst)
        };
        let num_weeks = week_yearlen / 7 + (week_yearlen % 7) / 4;

        let mark_week = |mask: &mut Vec<bool>, mut i: i64| {
            for _ in 0..7 {
                let slot =
                    usize::try_from(i).ok().and_then(|i| mask.get_mut(i));
                let Some(slot) = slot else { return };
                *slot = true;
                i += 1;
                if i64::from(self.weekday[i as usize]) == wkst {
                    return;
                }
            }
        };
        for &week in opts.by_week.iter() {
            let mut week = i64::from(week);
            if week < 0 {
                week += num_weeks + 1;
            }
            if !(0 < week && week <= num_weeks) {
                continue;
            }
            let i = if week > 1 {
                let mut i = no1_wkst + (week - 1) * 7;
                if no1_wkst != first_wkst {
                    i -= 7 - first_wkst;
                }
                i
            } else {
                no1_wkst
            };
            mark_week(&mut mask, i);
        }
        if opts.by_week.contains(&1) {
            // The first week of next year may start in this one.
            let mut i = no1_wkst + num_weeks * 7;
            if no1_wkst != first_wkst {
                i -= 7 - first_wkst;
            }
            if i < yearlen {
                mark_week(&mut mask, i);
            }
        }
        if no1_wkst > 0 {
            // The days before week 1 belong to the last week of the previous
            // year, which is either week 52 or 53.
            let last_year_num_weeks = if opts.by_week.contains(&-1) {
                -1
            } else {
                let prev_yearlen = jan1
                    .yesterday()
                    .map_or(365, |d| i64::from(d.days_in_year()));
                let prev_weekday =
                    (self.year_weekday - prev_yearlen).rem_euclid(7);
                let prev_no1_wkst = (7 - prev_weekday + wkst).rem_euclid(7);
                if prev_no1_wkst >= 4 {
                    52 + (prev_yearlen + (prev_weekday - wkst).rem_euclid(7))
                        % 7
                        / 4
                } else {
                    52 + (yearlen - no1_wkst) % 7 / 4
                }
            };
            let last = opts
                .by_week
                .iter()
                .any(|&w| i64::from(w) == last_year_num_weeks);
            if last {
                for slot in mask.iter_mut().take(no1_wkst as usize) {
                    *slot = true;
                }
            }
        }
        mask
    }

    /// Build the mask of days matching a numbered weekday.
    ///
    /// At yearly frequency, numbered weekdays count within the whole year,
    /// or within each month in `by_month` when that is set. At monthly
    /// frequency, they count within the current month.
    fn rebuild_nth_weekday(&mut self, opts: &ParsedOptions, month: i64) {
        let mut ranges = vec![];
        match opts.freq {
            Frequency::Yearly if opts.by_month.is_empty() => {
                ranges.push((0, self.yearlen));
            }
            Frequency::Yearly => {
                for &m in opts.by_month.iter() {
                    ranges.push(self.month_bounds(m as usize));
                }
            }
            Frequency::Monthly => {
                ranges.push(self.month_bounds(month as usize));
            }
            _ => {}
        }
        if ranges.is_empty() {
            self.nth_weekday = None;
            return;
        }
        let mut mask = vec![false; self.yearlen + 7];
        for (first, end) in ranges {
            let (first, last) = (first as i64, end as i64 - 1);
            for (nth, weekday) in opts.numbered_weekdays() {
                let nth = i64::from(nth);
                let wd = i64::from(weekday.to_monday_zero_offset());
                let i = if nth < 0 {
                    let i = last + (nth + 1) * 7;
                    if i < first {
                        continue;
                    }
                    let back = i64::from(self.weekday[i as usize]) - wd;
                    i - back.rem_euclid(7)
                } else {
                    let i = first + (nth - 1) * 7;
                    if i > last {
                        continue;
                    }
                    i + (7 - i64::from(self.weekday[i as usize]) + wd)
                        .rem_euclid(7)
                };
                if first <= i && i <= last {
                    mask[i as usize] = true;
                }
            }
        }
        self.nth_weekday = Some(mask);
    }
}

const EPOCH: Date = jiff::civil::date(1970, 1, 1);

/// Returns the civil date with the given fields, if Jiff supports it.
pub(crate) fn civil_date(year: i64, month: i64, day: i64) -> Option<Date> {
    let year = i16::try_from(year).ok()?;
    let month = i8::try_from(month).ok()?;
    let day = i8::try_from(day).ok()?;
    Date::new(year, month, day).ok()
}

/// Returns the number of days from 1970-01-01 to the given date.
pub(crate) fn days_since_epoch(date: Date) -> i64 {
    i64::from((date - EPOCH).get_days())
}
