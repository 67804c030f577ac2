use std::collections::VecDeque;

use jiff::{Timestamp, civil::DateTime, tz::Offset};

use crate::{
    calendar::CalendarInfo,
    cursor::{Cursor, Step},
    dayset::{
        DaySet, MILLIS_PER_DAY, Time, day_set, initial_time_set, time_set,
    },
    filter::remove_filtered_days,
    options::{EventStartType, ParsedOptions},
    rule::RecurrenceRule,
    setpos,
    sun::{self, SolarEvents},
};

/// An iterator over the occurrences of a recurrence rule, in ascending
/// order.
///
/// Occurrences are computed lazily, one window (a year, a month, a week, a
/// day, ...) at a time. The iterator may be "infinite," in the sense that it
/// keeps producing occurrences up to the largest supported year. Callers
/// should bound it with `take`, `take_while` or a rule with a count or an
/// until instant.
#[derive(Clone, Debug)]
pub struct RecurrenceIter {
    rule: RecurrenceRule,
    state: State,
}

#[derive(Clone, Debug)]
enum State {
    /// Nothing has been computed yet.
    Init,
    Producing(Box<Producer>),
    /// Iteration has ceased and never resumes.
    Done,
}

impl RecurrenceIter {
    pub(crate) fn new(rule: RecurrenceRule) -> RecurrenceIter {
        RecurrenceIter { rule, state: State::Init }
    }
}

impl Iterator for RecurrenceIter {
    type Item = Timestamp;

    fn next(&mut self) -> Option<Timestamp> {
        let opts = self.rule.options();
        loop {
            match self.state {
                State::Init => {
                    if opts.interval == 0 || opts.count == Some(0) {
                        log::trace!(
                            "rule with interval {} and count {:?} \
                             produces nothing",
                            opts.interval,
                            opts.count,
                        );
                        self.state = State::Done;
                        return None;
                    }
                    let producer = Producer::new(opts);
                    self.state = State::Producing(Box::new(producer));
                }
                State::Producing(ref mut producer) => {
                    let Some(floating) = producer.next(opts) else {
                        self.state = State::Done;
                        return None;
                    };
                    return Some(self.rule.rezone(floating));
                }
                State::Done => return None,
            }
        }
    }
}

impl std::iter::FusedIterator for RecurrenceIter {}

/// The state of a rule that is producing occurrences.
///
/// Everything here is "floating": occurrences are produced as the UTC
/// encoding of wall clock readings and only rezoned on the way out.
#[derive(Clone, Debug)]
struct Producer {
    cursor: Cursor,
    calendar: CalendarInfo,
    /// The times of day for the next window.
    times: Vec<Time>,
    /// Candidates from the last window that have not been emitted yet.
    window: VecDeque<Timestamp>,
    /// The number of occurrences left to emit, when the rule has a count.
    remaining: Option<u32>,
    /// Set when the cursor can no longer advance. Whatever is left in
    /// `window` is still emitted.
    exhausted: bool,
}

impl Producer {
    fn new(opts: &ParsedOptions) -> Producer {
        let cursor = Cursor::new(opts.start);
        let calendar = CalendarInfo::new(opts, cursor.year, cursor.month);
        let times = initial_time_set(opts, &cursor);
        Producer {
            cursor,
            calendar,
            times,
            window: VecDeque::new(),
            remaining: opts.count,
            exhausted: false,
        }
    }

    fn next(&mut self, opts: &ParsedOptions) -> Option<Timestamp> {
        loop {
            if self.remaining == Some(0) {
                log::trace!("count of {:?} reached", opts.count);
                return None;
            }
            let Some(ts) = self.window.pop_front() else {
                if self.exhausted {
                    log::trace!("no more windows after {:?}", self.cursor);
                    return None;
                }
                self.fill(opts);
                continue;
            };
            if let Some(until) = opts.until {
                if ts > until {
                    log::trace!("{ts} is past until instant {until}");
                    return None;
                }
            }
            // The first window may start before the start instant. Such
            // candidates don't count toward the rule's count.
            if ts < opts.start {
                continue;
            }
            if let Some(ref mut remaining) = self.remaining {
                *remaining -= 1;
            }
            return Some(ts);
        }
    }

    /// Expand the cursor's window into candidates and then step the cursor.
    fn fill(&mut self, opts: &ParsedOptions) {
        let mut days = day_set(opts, &self.calendar, &self.cursor);
        let filtered = remove_filtered_days(&mut days, &self.calendar, opts);
        let candidates = self.candidates(opts, &days);
        if opts.by_set_pos.is_empty() {
            self.window.extend(candidates);
        } else {
            self.window.extend(setpos::select(&candidates, &opts.by_set_pos));
        }

        match self.cursor.step(opts, filtered) {
            Step::Advanced => {
                if opts.freq.is_sub_daily() {
                    self.times = time_set(opts, &self.cursor);
                }
                self.calendar.rebuild(
                    opts,
                    self.cursor.year,
                    self.cursor.month,
                );
            }
            Step::Exhausted => self.exhausted = true,
        }
    }

    /// Returns every candidate in the given window, in ascending order.
    ///
    /// A rule anchored to a solar event has at most one candidate per day.
    /// Otherwise, every day is combined with every time of day.
    fn candidates(
        &self,
        opts: &ParsedOptions,
        days: &DaySet,
    ) -> Vec<Timestamp> {
        let mut candidates = vec![];
        for day in days.days() {
            if opts.start_type.is_solar() {
                candidates.extend(self.solar_candidate(opts, day));
                continue;
            }
            let midnight = (self.calendar.year_ordinal + day as i64)
                .saturating_mul(MILLIS_PER_DAY);
            for time in self.times.iter() {
                let millis = midnight.saturating_add(time.millis());
                // Candidates beyond what Jiff can represent are skipped.
                if let Ok(ts) = Timestamp::from_millisecond(millis) {
                    candidates.push(ts);
                }
            }
        }
        candidates
    }

    fn solar_candidate(
        &self,
        opts: &ParsedOptions,
        day: usize,
    ) -> Option<Timestamp> {
        let params = opts.solar.as_ref()?;
        let date = self.calendar.date(day)?;
        let events = sun::events(date, params);
        let Some(dt) = solar_event(&events, opts.start_type) else {
            log::trace!("no {} on {date}", opts.start_type);
            return None;
        };
        Offset::UTC.to_timestamp(dt).ok()
    }
}

/// Returns the event that a solar start type refers to.
fn solar_event(
    events: &SolarEvents,
    start_type: EventStartType,
) -> Option<DateTime> {
    match start_type {
        EventStartType::Normal => None,
        EventStartType::Sunrise => events.sunrise,
        EventStartType::Sunset => events.sunset,
        EventStartType::Dawn => events.dawn,
        EventStartType::Dusk => events.dusk,
    }
}
