use std::{
    ops::{Range, RangeInclusive},
    sync::Arc,
};

use jiff::{Timestamp, civil::Weekday};

use crate::{
    iter::RecurrenceIter,
    options::{EventStartType, Frequency, Options, ParsedOptions, RawOptions},
    rezone::{Rezone, ZoneRezone},
    sink::{self, After, Before, Between, Collector},
    sun::SolarParams,
    weekday::IntoByWeekdayIter,
};

/// A recurrence rule.
///
/// A rule is cheap to clone and may be shared between threads. Every query
/// runs its own traversal, so queries never interfere with one another.
///
/// Rules are evaluated on the "floating" wall clock fields of the start
/// instant, which are its fields in UTC. When a rule has a `tzid`, each
/// occurrence is rezoned on its way out so that it happens at that wall
/// clock reading in the named time zone.
#[derive(Clone)]
pub struct RecurrenceRule {
    inner: Arc<RecurrenceRuleInner>,
}

struct RecurrenceRuleInner {
    options: ParsedOptions,
    /// Only set when the options have a `tzid`.
    rezone: Option<Arc<dyn Rezone>>,
}

impl std::fmt::Debug for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RecurrenceRule")
            .field("options", &self.inner.options)
            .field("rezone", &self.inner.rezone.is_some())
            .finish()
    }
}

impl RecurrenceRule {
    /// Returns a builder for constructing a `RecurrenceRule`.
    ///
    /// The frequency and the starting point are the only two things required
    /// to create a rule.
    pub fn builder(
        freq: Frequency,
        start: Timestamp,
    ) -> RecurrenceRuleBuilder {
        RecurrenceRuleBuilder::new(freq, start)
    }

    /// Build a rule from deserialized options.
    pub fn from_options(options: &Options) -> anyhow::Result<RecurrenceRule> {
        let raw = options.to_raw()?;
        RecurrenceRuleBuilder { raw, rezone: None }.build()
    }

    /// Build a rule from options in a JSON object.
    pub fn from_json(json: &str) -> anyhow::Result<RecurrenceRule> {
        RecurrenceRule::from_options(&Options::from_json(json)?)
    }

    /// Returns the normalized options of this rule.
    pub fn options(&self) -> &ParsedOptions {
        &self.inner.options
    }

    /// Returns an iterator over all occurrences of this rule.
    ///
    /// Note that the iterator may be "infinite," in the sense that it returns
    /// occurrences all the way up to the largest supported year. Callers
    /// should therefore either give the rule a count or an until instant, or
    /// call `take(N)` to limit the number of occurrences to `N`.
    pub fn iter(&self) -> RecurrenceIter {
        RecurrenceIter::new(self.clone())
    }

    /// Returns every occurrence of this rule.
    ///
    /// This never returns for a rule without a count or an until instant
    /// before the largest supported year is reached.
    pub fn all(&self) -> Vec<Timestamp> {
        sink::drive(self.iter(), Collector::new(sink::keep_all))
    }

    /// Returns occurrences of this rule for as long as `callback` returns
    /// true.
    ///
    /// The callback is given each occurrence along with the number of
    /// occurrences collected before it. The occurrence for which it returns
    /// false is not included.
    pub fn all_with(
        &self,
        callback: impl FnMut(Timestamp, usize) -> bool,
    ) -> Vec<Timestamp> {
        sink::drive(self.iter(), Collector::new(callback))
    }

    /// Returns the occurrences between `after` and `before`.
    ///
    /// When `inclusive` is true, occurrences equal to either bound are
    /// included.
    pub fn between(
        &self,
        after: Timestamp,
        before: Timestamp,
        inclusive: bool,
    ) -> Vec<Timestamp> {
        self.between_with(after, before, inclusive, sink::keep_all)
    }

    /// Like `between`, but stops as soon as `callback` returns false.
    ///
    /// See [`RecurrenceRule::all_with`] for how the callback is used.
    pub fn between_with(
        &self,
        after: Timestamp,
        before: Timestamp,
        inclusive: bool,
        callback: impl FnMut(Timestamp, usize) -> bool,
    ) -> Vec<Timestamp> {
        let between = Between::new(after, before, inclusive, callback);
        sink::drive(self.iter(), between)
    }

    /// Returns the last occurrence before `dt`, or at `dt` when `inclusive`
    /// is true.
    pub fn before(&self, dt: Timestamp, inclusive: bool) -> Option<Timestamp> {
        sink::drive(self.iter(), Before::new(dt, inclusive))
    }

    /// Returns the first occurrence after `dt`, or at `dt` when `inclusive`
    /// is true.
    pub fn after(&self, dt: Timestamp, inclusive: bool) -> Option<Timestamp> {
        sink::drive(self.iter(), After::new(dt, inclusive))
    }

    /// Returns the number of occurrences of this rule.
    ///
    /// Like [`RecurrenceRule::all`], this should only be used on bounded
    /// rules.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Convert a floating occurrence into the instant it denotes.
    pub(crate) fn rezone(&self, floating: Timestamp) -> Timestamp {
        let inner = &*self.inner;
        match (inner.options.tzid.as_deref(), inner.rezone.as_ref()) {
            (Some(tzid), Some(rezone)) => rezone.rezone(floating, tzid),
            _ => floating,
        }
    }
}

impl<'r> IntoIterator for &'r RecurrenceRule {
    type IntoIter = RecurrenceIter;
    type Item = Timestamp;

    fn into_iter(self) -> RecurrenceIter {
        self.iter()
    }
}

/// A builder for constructing a valid recurrence rule.
///
/// Values given to the `by_*` methods accumulate. Nothing is validated until
/// [`RecurrenceRuleBuilder::build`] is called.
#[derive(Clone)]
pub struct RecurrenceRuleBuilder {
    raw: RawOptions,
    rezone: Option<Arc<dyn Rezone>>,
}

impl std::fmt::Debug for RecurrenceRuleBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RecurrenceRuleBuilder")
            .field("raw", &self.raw)
            .field("rezone", &self.rezone.is_some())
            .finish()
    }
}

impl RecurrenceRuleBuilder {
    fn new(freq: Frequency, start: Timestamp) -> RecurrenceRuleBuilder {
        let raw = RawOptions::new(freq, start);
        RecurrenceRuleBuilder { raw, rezone: None }
    }

    /// Validate and normalize the options given so far and build a rule.
    ///
    /// When the rule has a `tzid` and no rezoner was given, the time zone is
    /// looked up in Jiff's bundled time zone database.
    pub fn build(&self) -> anyhow::Result<RecurrenceRule> {
        let options = ParsedOptions::new(&self.raw)?;
        let rezone = match (options.tzid.as_deref(), self.rezone.as_ref()) {
            (None, _) => None,
            (Some(_), Some(rezone)) => Some(Arc::clone(rezone)),
            (Some(tzid), None) => {
                let rezone: Arc<dyn Rezone> = Arc::new(ZoneRezone::new(tzid)?);
                Some(rezone)
            }
        };
        log::debug!("built recurrence rule: {options:?}");
        let inner = Arc::new(RecurrenceRuleInner { options, rezone });
        Ok(RecurrenceRule { inner })
    }

    /// The last instant (inclusive) that the rule may produce, in the same
    /// floating encoding as the start.
    pub fn until(&mut self, until: Timestamp) -> &mut RecurrenceRuleBuilder {
        self.raw.until = Some(until);
        self
    }

    /// The number of frequency units between each window. Zero produces
    /// nothing.
    pub fn interval(&mut self, interval: u32) -> &mut RecurrenceRuleBuilder {
        self.raw.interval = interval;
        self
    }

    /// The maximum number of occurrences. Zero produces nothing.
    pub fn count(&mut self, count: u32) -> &mut RecurrenceRuleBuilder {
        self.raw.count = Some(count);
        self
    }

    pub fn tzid(&mut self, tzid: &str) -> &mut RecurrenceRuleBuilder {
        self.raw.tzid = Some(tzid.to_string());
        self
    }

    /// Use the given rezoner instead of Jiff's time zone database.
    pub fn rezone<R: Rezone + 'static>(
        &mut self,
        rezone: R,
    ) -> &mut RecurrenceRuleBuilder {
        self.rezone = Some(Arc::new(rezone));
        self
    }

    pub fn week_start(
        &mut self,
        weekday: Weekday,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.week_start = weekday;
        self
    }

    pub fn start_type(
        &mut self,
        start_type: EventStartType,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.start_type = start_type;
        self
    }

    pub fn solar(
        &mut self,
        params: SolarParams,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.solar = Some(params);
        self
    }

    pub fn by_month<I: IntoI8Iter>(
        &mut self,
        months: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_month.extend(months.into_i8_iter().map(i64::from));
        self
    }

    pub fn by_week<I: IntoI8Iter>(
        &mut self,
        weeks: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_week.extend(weeks.into_i8_iter().map(i64::from));
        self
    }

    pub fn by_year_day<I: IntoI16Iter>(
        &mut self,
        days: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_year_day.extend(days.into_i16_iter().map(i64::from));
        self
    }

    pub fn by_month_day<I: IntoI8Iter>(
        &mut self,
        days: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_month_day.extend(days.into_i8_iter().map(i64::from));
        self
    }

    pub fn by_week_day<I: IntoByWeekdayIter>(
        &mut self,
        week_days: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_week_day.extend(week_days.into_by_weekday_iter());
        self
    }

    pub fn by_hour<I: IntoI8Iter>(
        &mut self,
        hours: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_hour.extend(hours.into_i8_iter().map(i64::from));
        self
    }

    pub fn by_minute<I: IntoI8Iter>(
        &mut self,
        minutes: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_minute.extend(minutes.into_i8_iter().map(i64::from));
        self
    }

    pub fn by_second<I: IntoI8Iter>(
        &mut self,
        seconds: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_second.extend(seconds.into_i8_iter().map(i64::from));
        self
    }

    pub fn by_set_position<I: IntoI16Iter>(
        &mut self,
        positions: I,
    ) -> &mut RecurrenceRuleBuilder {
        self.raw.by_set_pos.extend(positions.into_i16_iter().map(i64::from));
        self
    }
}

/// A trait that permits flexibly specifying a sequence of `i8` integers.
///
/// This trait is used for builder methods on `RecurrenceRuleBuilder`. It
/// permits callers to provide integers in a number of flexible ways:
///
/// * A single integer: `5`
/// * An array of integers: `[1, 3, 5]`.
/// * A single range of integers: `5..8` or `5..=8`.
/// * An array of ranges of integers: `[5..=10, 15..=20]`.
///
/// This trait and `IntoI16Iter` are separate so that the type of a literal
/// like the `5` in `builder.by_month(5)` can be inferred unambiguously.
pub trait IntoI8Iter {
    /// Creates an iterator over all integers in this sequence.
    fn into_i8_iter(self) -> impl Iterator<Item = i8>;
}

/// A trait that permits flexibly specifying a sequence of `i16` integers.
///
/// See [`IntoI8Iter`] for the ways a sequence can be given.
pub trait IntoI16Iter {
    /// Creates an iterator over all integers in this sequence.
    fn into_i16_iter(self) -> impl Iterator<Item = i16>;
}

impl IntoI8Iter for i8 {
    fn into_i8_iter(self) -> impl Iterator<Item = i8> {
        std::iter::once(self)
    }
}

impl IntoI16Iter for i16 {
    fn into_i16_iter(self) -> impl Iterator<Item = i16> {
        std::iter::once(self)
    }
}

impl IntoI8Iter for Range<i8> {
    fn into_i8_iter(self) -> impl Iterator<Item = i8> {
        self
    }
}

impl IntoI16Iter for Range<i16> {
    fn into_i16_iter(self) -> impl Iterator<Item = i16> {
        self
    }
}

impl IntoI8Iter for RangeInclusive<i8> {
    fn into_i8_iter(self) -> impl Iterator<Item = i8> {
        self
    }
}

impl IntoI16Iter for RangeInclusive<i16> {
    fn into_i16_iter(self) -> impl Iterator<Item = i16> {
        self
    }
}

impl<const N: usize> IntoI8Iter for [i8; N] {
    fn into_i8_iter(self) -> impl Iterator<Item = i8> {
        self.into_iter()
    }
}

impl<const N: usize> IntoI16Iter for [i16; N] {
    fn into_i16_iter(self) -> impl Iterator<Item = i16> {
        self.into_iter()
    }
}

impl<const N: usize> IntoI8Iter for [RangeInclusive<i8>; N] {
    fn into_i8_iter(self) -> impl Iterator<Item = i8> {
        self.into_iter().flatten()
    }
}

impl<const N: usize> IntoI16Iter for [RangeInclusive<i16>; N] {
    fn into_i16_iter(self) -> impl Iterator<Item = i16> {
        self.into_iter().flatten()
    }
}

impl IntoI8Iter for Vec<i8> {
    fn into_i8_iter(self) -> impl Iterator<Item = i8> {
        self.into_iter()
    }
}

impl IntoI16Iter for Vec<i16> {
    fn into_i16_iter(self) -> impl Iterator<Item = i16> {
        self.into_iter()
    }
}
