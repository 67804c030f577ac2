use crate::{
    calendar::CalendarInfo,
    cursor::Cursor,
    options::{Frequency, ParsedOptions},
};

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub(crate) const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// The window of candidate days for one step of a rule.
///
/// Each slot holds a day offset into the current `CalendarInfo`. Days that
/// are removed by constraints become `None` rather than being dropped, so
/// that the window keeps its shape.
#[derive(Clone, Debug)]
pub(crate) struct DaySet {
    slots: Vec<Option<usize>>,
}

impl DaySet {
    /// Returns every day still in this window, in ascending order.
    pub(crate) fn days(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().filter_map(|&slot| slot)
    }

    /// Remove every day for which `remove` returns true.
    ///
    /// Returns true if any day was removed.
    pub(crate) fn remove_if(
        &mut self,
        mut remove: impl FnMut(usize) -> bool,
    ) -> bool {
        let mut removed = false;
        for slot in self.slots.iter_mut() {
            if let Some(day) = *slot {
                if remove(day) {
                    *slot = None;
                    removed = true;
                }
            }
        }
        removed
    }
}

/// A time of day.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub(crate) struct Time {
    pub(crate) hour: i64,
    pub(crate) minute: i64,
    pub(crate) second: i64,
    pub(crate) millisecond: i64,
}

impl Time {
    /// Returns the number of milliseconds since midnight.
    pub(crate) fn millis(&self) -> i64 {
        self.hour * MILLIS_PER_HOUR
            + self.minute * MILLIS_PER_MINUTE
            + self.second * MILLIS_PER_SECOND
            + self.millisecond
    }
}

/// Build the window of days to expand for the cursor's position.
///
/// A yearly window is the whole year (minus months excluded by `by_month`), a
/// monthly window is the cursor's month, a weekly window runs from the cursor
/// to the end of its week and anything finer is just the cursor's day.
pub(crate) fn day_set(
    opts: &ParsedOptions,
    info: &CalendarInfo,
    cursor: &Cursor,
) -> DaySet {
    let cursor_day = || {
        // OK because the calendar is always rebuilt for the cursor's year.
        usize::try_from(cursor.days() - info.year_ordinal).unwrap_or(0)
    };
    let slots = match opts.freq {
        Frequency::Yearly => (0..info.yearlen)
            .map(|i| {
                let month = info.month_mask[i];
                let keep =
                    opts.by_month.is_empty() || opts.by_month.contains(&month);
                keep.then_some(i)
            })
            .collect(),
        Frequency::Monthly => {
            let month = cursor.month as usize;
            (info.month_range[month - 1]..info.month_range[month])
                .map(Some)
                .collect()
        }
        Frequency::Weekly => {
            let week_start = opts.week_start.to_monday_zero_offset();
            let mut slots = vec![];
            let mut i = cursor_day();
            for _ in 0..7 {
                slots.push(Some(i));
                i += 1;
                if info.weekday[i] == week_start {
                    break;
                }
            }
            slots
        }
        _ => vec![Some(cursor_day())],
    };
    DaySet { slots }
}

/// Build the times of day used for every day of a window.
///
/// At daily frequency or coarser, this is every combination of the hour,
/// minute and second constraints. Finer frequencies take the coarser fields
/// from the cursor. Every time carries the start's millisecond.
pub(crate) fn time_set(opts: &ParsedOptions, cursor: &Cursor) -> Vec<Time> {
    let ms = cursor.millisecond;
    let one = |v: i64| vec![v];
    let wide = |set: &[i8]| set.iter().map(|&v| i64::from(v)).collect();
    let (hours, minutes, seconds): (Vec<i64>, Vec<i64>, Vec<i64>) =
        match opts.freq {
            Frequency::Hourly => (
                one(cursor.hour),
                wide(&opts.by_minute),
                wide(&opts.by_second),
            ),
            Frequency::Minutely => {
                (one(cursor.hour), one(cursor.minute), wide(&opts.by_second))
            }
            Frequency::Secondly => {
                (one(cursor.hour), one(cursor.minute), one(cursor.second))
            }
            _ => (
                wide(&opts.by_hour),
                wide(&opts.by_minute),
                wide(&opts.by_second),
            ),
        };
    let mut times = vec![];
    for &hour in hours.iter() {
        for &minute in minutes.iter() {
            for &second in seconds.iter() {
                times.push(Time { hour, minute, second, millisecond: ms });
            }
        }
    }
    times
}

/// Build the time set for the first window of a rule.
///
/// When a sub-daily rule starts at a clock value outside of its own
/// constraints, the first window produces nothing. The cursor then steps to
/// the first clock value that does satisfy them.
pub(crate) fn initial_time_set(
    opts: &ParsedOptions,
    cursor: &Cursor,
) -> Vec<Time> {
    if opts.freq.is_sub_daily() && !cursor.clock_matches(opts) {
        return vec![];
    }
    time_set(opts, cursor)
}
