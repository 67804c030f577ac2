use std::ops::RangeInclusive;

use {
    anyhow::Context,
    jiff::{
        Timestamp,
        civil::{DateTime, Weekday},
        tz::Offset,
    },
    serde::Deserialize,
};

use crate::{
    sun::SolarParams,
    weekday::{ByWeekday, WeekdayToken},
};

/// The frequency at which a recurrence rule repeats.
///
/// Frequencies are ordered from coarsest (`Yearly`) to finest (`Secondly`).
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd,
    Deserialize,
)]
#[serde(try_from = "FrequencyToken")]
pub enum Frequency {
    #[default]
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
    Secondly,
}

impl Frequency {
    /// Returns the frequency corresponding to the given numeric code, where
    /// `0` is yearly and `6` is secondly.
    pub fn from_code(code: i64) -> anyhow::Result<Frequency> {
        use self::Frequency::*;

        let freq = match code {
            0 => Yearly,
            1 => Monthly,
            2 => Weekly,
            3 => Daily,
            4 => Hourly,
            5 => Minutely,
            6 => Secondly,
            unk => anyhow::bail!(
                "invalid frequency `{unk}` (numeric codes must be in \
                 range 0..=6)"
            ),
        };
        Ok(freq)
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Frequency::Yearly => "yearly",
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
            Frequency::Daily => "daily",
            Frequency::Hourly => "hourly",
            Frequency::Minutely => "minutely",
            Frequency::Secondly => "secondly",
        }
    }

    /// Returns true when this frequency repeats more often than daily.
    pub fn is_sub_daily(&self) -> bool {
        *self > Frequency::Daily
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Frequency> {
        use self::Frequency::*;

        let unit = match &*s.to_lowercase() {
            "yearly" | "year" | "yr" | "y" => Yearly,
            "monthly" | "month" | "mo" => Monthly,
            "weekly" | "week" | "wk" | "w" => Weekly,
            "daily" | "day" | "d" => Daily,
            "hourly" | "hour" | "hr" | "h" => Hourly,
            "minutely" | "minute" | "min" | "m" => Minutely,
            "secondly" | "second" | "sec" | "s" => Secondly,
            unk => anyhow::bail!("invalid frequency `{unk}`"),
        };
        Ok(unit)
    }
}

/// The untyped shape of a frequency in JSON options.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum FrequencyToken {
    Code(i64),
    Name(String),
    Other(serde_json::Value),
}

impl TryFrom<FrequencyToken> for Frequency {
    type Error = anyhow::Error;

    fn try_from(token: FrequencyToken) -> anyhow::Result<Frequency> {
        match token {
            FrequencyToken::Code(code) => Frequency::from_code(code),
            FrequencyToken::Name(name) => name.parse(),
            FrequencyToken::Other(value) => anyhow::bail!(
                "invalid frequency `{value}` \
                 (expected a frequency name or a numeric code)"
            ),
        }
    }
}

/// What determines the time of day of each occurrence.
///
/// `Normal` uses clock times derived from the start instant and the hour,
/// minute and second constraints. Every other variant replaces the clock time
/// with a solar event computed for the occurrence's date.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStartType {
    #[default]
    Normal,
    Sunrise,
    Sunset,
    Dawn,
    Dusk,
}

impl EventStartType {
    pub fn is_solar(&self) -> bool {
        !matches!(*self, EventStartType::Normal)
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            EventStartType::Normal => "normal",
            EventStartType::Sunrise => "sunrise",
            EventStartType::Sunset => "sunset",
            EventStartType::Dawn => "dawn",
            EventStartType::Dusk => "dusk",
        }
    }
}

impl std::fmt::Display for EventStartType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either a single value or a list of values.
///
/// Every "by" option in JSON accepts a scalar as shorthand for a list with
/// one element.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match *self {
            OneOrMany::One(ref one) => std::slice::from_ref(one),
            OneOrMany::Many(ref many) => many,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> OneOrMany<T> {
        OneOrMany::Many(vec![])
    }
}

/// Recurrence rule options as they appear in JSON.
///
/// Unknown keys are rejected. `dtstart` is the only required key, although
/// it is represented as optional here so that its absence can be reported
/// with a helpful message.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    #[serde(default)]
    pub freq: Frequency,
    #[serde(default, deserialize_with = "deserialize_dtstart")]
    pub dtstart: Option<Timestamp>,
    #[serde(default)]
    pub interval: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_until")]
    pub until: Option<Timestamp>,
    #[serde(default)]
    pub tzid: Option<String>,
    #[serde(default)]
    pub wkst: Option<WeekdayToken>,
    #[serde(default)]
    pub start_type: EventStartType,
    #[serde(default)]
    pub solar: Option<SolarParams>,
    #[serde(default)]
    pub bysetpos: OneOrMany<i64>,
    #[serde(default)]
    pub bymonth: OneOrMany<i64>,
    #[serde(default)]
    pub bymonthday: OneOrMany<i64>,
    #[serde(default)]
    pub byyearday: OneOrMany<i64>,
    #[serde(default)]
    pub byweekno: OneOrMany<i64>,
    #[serde(default)]
    pub byweekday: OneOrMany<WeekdayToken>,
    #[serde(default)]
    pub byhour: OneOrMany<i64>,
    #[serde(default)]
    pub byminute: OneOrMany<i64>,
    #[serde(default)]
    pub bysecond: OneOrMany<i64>,
}

impl Options {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> anyhow::Result<Options> {
        serde_json::from_str(json)
            .context("failed to parse recurrence rule options")
    }

    /// Resolve weekday tokens and check that a start instant is present.
    pub(crate) fn to_raw(&self) -> anyhow::Result<RawOptions> {
        let Some(start) = self.dtstart else {
            anyhow::bail!("missing required option 'dtstart'")
        };
        let mut raw = RawOptions::new(self.freq, start);
        raw.until = self.until;
        raw.interval = self.interval.unwrap_or(1);
        raw.count = self.count;
        raw.tzid = self.tzid.clone();
        if let Some(ref wkst) = self.wkst {
            raw.week_start = wkst
                .resolve_plain()
                .context("invalid 'wkst' value")?;
        }
        raw.start_type = self.start_type;
        raw.solar = self.solar.clone();
        raw.by_set_pos = self.bysetpos.as_slice().to_vec();
        raw.by_month = self.bymonth.as_slice().to_vec();
        raw.by_month_day = self.bymonthday.as_slice().to_vec();
        raw.by_year_day = self.byyearday.as_slice().to_vec();
        raw.by_week = self.byweekno.as_slice().to_vec();
        for token in self.byweekday.as_slice() {
            let weekday =
                token.resolve().context("invalid 'byweekday' value")?;
            raw.by_week_day.push(weekday);
        }
        raw.by_hour = self.byhour.as_slice().to_vec();
        raw.by_minute = self.byminute.as_slice().to_vec();
        raw.by_second = self.bysecond.as_slice().to_vec();
        Ok(raw)
    }
}

/// Options with resolved types, but not yet validated or normalized.
///
/// This is what `RecurrenceRuleBuilder` accumulates and what JSON options are
/// converted into.
#[derive(Clone, Debug)]
pub(crate) struct RawOptions {
    pub(crate) freq: Frequency,
    pub(crate) start: Timestamp,
    pub(crate) until: Option<Timestamp>,
    pub(crate) interval: u32,
    pub(crate) count: Option<u32>,
    pub(crate) tzid: Option<String>,
    pub(crate) week_start: Weekday,
    pub(crate) start_type: EventStartType,
    pub(crate) solar: Option<SolarParams>,
    pub(crate) by_set_pos: Vec<i64>,
    pub(crate) by_month: Vec<i64>,
    pub(crate) by_month_day: Vec<i64>,
    pub(crate) by_year_day: Vec<i64>,
    pub(crate) by_week: Vec<i64>,
    pub(crate) by_week_day: Vec<ByWeekday>,
    pub(crate) by_hour: Vec<i64>,
    pub(crate) by_minute: Vec<i64>,
    pub(crate) by_second: Vec<i64>,
}

impl RawOptions {
    pub(crate) fn new(freq: Frequency, start: Timestamp) -> RawOptions {
        RawOptions {
            freq,
            start,
            until: None,
            interval: 1,
            count: None,
            tzid: None,
            week_start: Weekday::Monday,
            start_type: EventStartType::Normal,
            solar: None,
            by_set_pos: vec![],
            by_month: vec![],
            by_month_day: vec![],
            by_year_day: vec![],
            by_week: vec![],
            by_week_day: vec![],
            by_hour: vec![],
            by_minute: vec![],
            by_second: vec![],
        }
    }
}

/// The canonical form of a recurrence rule's options.
///
/// Every set is sorted and free of duplicates. Defaults implied by the
/// frequency and the start instant have been filled in, so for example a
/// yearly rule without any day constraints has `by_month` and `by_month_day`
/// set from its start.
///
/// The start and until instants are "floating": their UTC fields are the
/// wall clock fields that rules are evaluated against.
#[derive(Clone, Debug)]
pub struct ParsedOptions {
    pub freq: Frequency,
    /// The start instant, truncated to millisecond precision.
    pub start: Timestamp,
    pub until: Option<Timestamp>,
    /// When zero, the rule produces nothing.
    pub interval: u32,
    /// When zero, the rule produces nothing.
    pub count: Option<u32>,
    pub tzid: Option<String>,
    pub week_start: Weekday,
    pub start_type: EventStartType,
    pub solar: Option<SolarParams>,
    // can be negative
    pub by_set_pos: Box<[i16]>,
    pub by_month: Box<[i8]>,
    // can be negative
    pub by_month_day: Box<[i8]>,
    // can be negative
    pub by_year_day: Box<[i16]>,
    // can be negative
    pub by_week: Box<[i8]>,
    /// Numbered weekdays only appear at yearly or monthly frequency.
    pub by_week_day: Box<[ByWeekday]>,
    pub by_hour: Box<[i8]>,
    pub by_minute: Box<[i8]>,
    pub by_second: Box<[i8]>,
}

impl ParsedOptions {
    /// Validate and normalize the given options.
    pub(crate) fn new(raw: &RawOptions) -> anyhow::Result<ParsedOptions> {
        check_signed("bysetpos", &raw.by_set_pos, 366)?;
        check_unsigned("bymonth", &raw.by_month, 1..=12)?;
        check_signed("bymonthday", &raw.by_month_day, 31)?;
        check_signed("byyearday", &raw.by_year_day, 366)?;
        check_signed("byweekno", &raw.by_week, 53)?;
        check_unsigned("byhour", &raw.by_hour, 0..=23)?;
        check_unsigned("byminute", &raw.by_minute, 0..=59)?;
        // RFC 5545 technically allows a value of `60` here, presumably for
        // leap seconds. Jiff doesn't support leap seconds, so reject it.
        check_unsigned("bysecond", &raw.by_second, 0..=59)?;
        for &v in raw.by_week_day.iter() {
            let Some(nth) = v.nth() else { continue };
            anyhow::ensure!(
                nth == 0
                    || (-53..=-1).contains(&nth)
                    || (1..=53).contains(&nth),
                "invalid numbered 'byweekday' value `{v}` \
                 (values must be in range 1..=53 or -53..=-1)",
            );
        }
        if raw.start_type.is_solar() {
            anyhow::ensure!(
                raw.solar.is_some(),
                "start type '{start_type}' requires solar parameters",
                start_type = raw.start_type,
            );
        }
        if let Some(ref solar) = raw.solar {
            solar.validate()?;
        }

        let start = truncate_to_millisecond(raw.start)
            .context("invalid 'dtstart' value")?;
        let until = raw
            .until
            .map(truncate_to_millisecond)
            .transpose()
            .context("invalid 'until' value")?;
        let civil = Offset::UTC.to_datetime(start);
        let freq = raw.freq;

        let mut by_month = raw.by_month.clone();
        let mut by_month_day = raw.by_month_day.clone();
        let mut by_week_day = raw.by_week_day.clone();
        if raw.by_week.is_empty()
            && raw.by_year_day.is_empty()
            && raw.by_month_day.is_empty()
            && raw.by_week_day.is_empty()
        {
            match freq {
                Frequency::Yearly => {
                    if by_month.is_empty() {
                        by_month.push(i64::from(civil.month()));
                    }
                    by_month_day.push(i64::from(civil.day()));
                }
                Frequency::Monthly => {
                    by_month_day.push(i64::from(civil.day()));
                }
                Frequency::Weekly => {
                    by_week_day.push(ByWeekday::Any(civil.weekday()));
                }
                _ => {}
            }
        }
        // Numbered weekdays only make sense when there is a year or a month
        // to count within.
        for wd in by_week_day.iter_mut() {
            if wd.nth().is_some_and(|n| n == 0 || freq > Frequency::Monthly) {
                *wd = ByWeekday::Any(wd.weekday());
            }
        }

        let by_hour = clock_default(&raw.by_hour, freq, Frequency::Daily, || {
            civil.hour()
        });
        let by_minute =
            clock_default(&raw.by_minute, freq, Frequency::Hourly, || {
                civil.minute()
            });
        let by_second =
            clock_default(&raw.by_second, freq, Frequency::Minutely, || {
                civil.second()
            });

        let opts = ParsedOptions {
            freq,
            start,
            until,
            interval: raw.interval,
            count: raw.count,
            tzid: raw.tzid.clone(),
            week_start: raw.week_start,
            start_type: raw.start_type,
            solar: raw.solar.clone(),
            by_set_pos: narrow_sorted(&raw.by_set_pos),
            by_month: narrow_sorted(&by_month),
            by_month_day: narrow_sorted(&by_month_day),
            by_year_day: narrow_sorted(&raw.by_year_day),
            by_week: narrow_sorted(&raw.by_week),
            by_week_day: sort_and_dedup(&by_week_day),
            by_hour: narrow_sorted(&by_hour),
            by_minute: narrow_sorted(&by_minute),
            by_second: narrow_sorted(&by_second),
        };
        Ok(opts)
    }

    /// Returns an iterator over all numbered weekday constraints.
    pub(crate) fn numbered_weekdays(
        &self,
    ) -> impl Iterator<Item = (i8, Weekday)> + '_ {
        self.by_week_day.iter().filter_map(|wd| match *wd {
            ByWeekday::Any(_) => None,
            ByWeekday::Numbered { nth, weekday } => Some((nth, weekday)),
        })
    }

    pub(crate) fn has_numbered_weekdays(&self) -> bool {
        self.numbered_weekdays().next().is_some()
    }
}

/// Returns the given clock constraint, or the start's clock value when the
/// constraint is empty and the frequency is no finer than `coarsest`.
fn clock_default(
    values: &[i64],
    freq: Frequency,
    coarsest: Frequency,
    start: impl FnOnce() -> i8,
) -> Vec<i64> {
    if !values.is_empty() || freq > coarsest {
        return values.to_vec();
    }
    vec![i64::from(start())]
}

fn check_unsigned(
    name: &str,
    values: &[i64],
    range: RangeInclusive<i64>,
) -> anyhow::Result<()> {
    for &v in values.iter() {
        anyhow::ensure!(
            range.contains(&v),
            "invalid '{name}' value `{v}` \
             (values must be in range {start}..={end})",
            start = range.start(),
            end = range.end(),
        );
    }
    Ok(())
}

fn check_signed(name: &str, values: &[i64], max: i64) -> anyhow::Result<()> {
    for &v in values.iter() {
        anyhow::ensure!(
            (-max <= v && v <= -1) || (1 <= v && v <= max),
            "invalid '{name}' value `{v}` \
             (values must be in range 1..={max} or -{max}..=-1)",
        );
    }
    Ok(())
}

/// Sort, de-duplicate and narrow values that have already passed a range
/// check.
fn narrow_sorted<T: TryFrom<i64> + Ord>(values: &[i64]) -> Box<[T]> {
    let mut vec: Vec<T> =
        values.iter().filter_map(|&v| T::try_from(v).ok()).collect();
    vec.sort();
    vec.dedup();
    vec.into_boxed_slice()
}

fn sort_and_dedup<T: Clone + Ord>(slice: &[T]) -> Box<[T]> {
    let mut vec = slice.to_vec();
    vec.sort();
    vec.dedup();
    vec.into_boxed_slice()
}

/// Truncate the given instant to millisecond precision, rounding toward
/// negative infinity.
fn truncate_to_millisecond(ts: Timestamp) -> anyhow::Result<Timestamp> {
    let millis = i64::try_from(ts.as_nanosecond().div_euclid(1_000_000))
        .context("instant is out of range")?;
    Ok(Timestamp::from_millisecond(millis)?)
}

/// An instant as it may appear in JSON: integer milliseconds since the Unix
/// epoch or a string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum InstantToken {
    Millis(i64),
    Text(String),
    Other(serde_json::Value),
}

impl InstantToken {
    fn to_timestamp(&self) -> anyhow::Result<Timestamp> {
        match *self {
            InstantToken::Millis(millis) => {
                Timestamp::from_millisecond(millis).with_context(|| {
                    format!("`{millis}` milliseconds is out of range")
                })
            }
            InstantToken::Text(ref text) => parse_instant(text),
            InstantToken::Other(ref value) => anyhow::bail!(
                "expected integer milliseconds or a string, found `{value}`"
            ),
        }
    }
}

/// Parse an instant from an RFC 3339 timestamp, an RFC 9557 zoned datetime
/// or a civil datetime. A civil datetime is interpreted in UTC, which makes
/// it "floating" in the sense used by recurrence rules.
pub(crate) fn parse_instant(text: &str) -> anyhow::Result<Timestamp> {
    if let Ok(ts) = text.parse::<Timestamp>() {
        return Ok(ts);
    }
    if let Ok(zdt) = text.parse::<jiff::Zoned>() {
        return Ok(zdt.timestamp());
    }
    let dt = text.parse::<DateTime>().with_context(|| {
        format!(
            "failed to parse `{text}` as an RFC 3339 timestamp, \
             an RFC 9557 zoned datetime or a civil datetime",
        )
    })?;
    Ok(Offset::UTC.to_timestamp(dt)?)
}

fn deserialize_dtstart<'de, D>(de: D) -> Result<Option<Timestamp>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_instant(de, "dtstart")
}

fn deserialize_until<'de, D>(de: D) -> Result<Option<Timestamp>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_instant(de, "until")
}

fn deserialize_instant<'de, D>(
    de: D,
    name: &str,
) -> Result<Option<Timestamp>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(token) = Option::<InstantToken>::deserialize(de)? else {
        return Ok(None);
    };
    token.to_timestamp().map(Some).map_err(|err| {
        serde::de::Error::custom(format!("invalid '{name}' value: {err:#}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> Timestamp {
        "1997-09-02T09:00:00Z".parse().unwrap()
    }

    fn parsed(raw: &RawOptions) -> ParsedOptions {
        ParsedOptions::new(raw).unwrap()
    }

    fn expect_err(raw: &RawOptions) -> String {
        match ParsedOptions::new(raw) {
            Err(err) => format!("{err:#}"),
            Ok(ok) => panic!("expected options error, but got:\n{ok:?}"),
        }
    }

    fn weekdays(opts: &ParsedOptions) -> String {
        opts.by_week_day
            .iter()
            .map(|wd| wd.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn frequency_names_and_codes() {
        insta::assert_snapshot!(
            "mo".parse::<Frequency>().unwrap(),
            @"monthly",
        );
        insta::assert_snapshot!(
            "SECONDLY".parse::<Frequency>().unwrap(),
            @"secondly",
        );
        insta::assert_snapshot!(Frequency::from_code(3).unwrap(), @"daily");
        insta::assert_snapshot!(
            Frequency::from_code(7).unwrap_err(),
            @"invalid frequency `7` (numeric codes must be in range 0..=6)",
        );
        insta::assert_snapshot!(
            "fortnightly".parse::<Frequency>().unwrap_err(),
            @"invalid frequency `fortnightly`",
        );
        assert!(Frequency::Yearly < Frequency::Secondly);
        assert!(Frequency::Hourly.is_sub_daily());
        assert!(!Frequency::Daily.is_sub_daily());
    }

    #[test]
    fn yearly_defaults_come_from_start() {
        let opts = parsed(&RawOptions::new(Frequency::Yearly, start()));
        assert_eq!(&*opts.by_month, &[9]);
        assert_eq!(&*opts.by_month_day, &[2]);
        assert_eq!(&*opts.by_hour, &[9]);
        assert_eq!(&*opts.by_minute, &[0]);
        assert_eq!(&*opts.by_second, &[0]);
        assert!(opts.by_week_day.is_empty());

        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_month = vec![3, 1, 3];
        let opts = parsed(&raw);
        assert_eq!(&*opts.by_month, &[1, 3]);
        assert_eq!(&*opts.by_month_day, &[2]);
    }

    #[test]
    fn monthly_and_weekly_defaults_come_from_start() {
        let opts = parsed(&RawOptions::new(Frequency::Monthly, start()));
        assert!(opts.by_month.is_empty());
        assert_eq!(&*opts.by_month_day, &[2]);

        let opts = parsed(&RawOptions::new(Frequency::Weekly, start()));
        assert!(opts.by_month_day.is_empty());
        insta::assert_snapshot!(weekdays(&opts), @"Tue");

        // Any day constraint suppresses the defaults.
        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_year_day = vec![100];
        let opts = parsed(&raw);
        assert!(opts.by_month.is_empty());
        assert!(opts.by_month_day.is_empty());
    }

    #[test]
    fn clock_defaults_depend_on_frequency() {
        let start = "2024-03-05T10:20:30Z".parse().unwrap();
        let opts = parsed(&RawOptions::new(Frequency::Hourly, start));
        assert!(opts.by_hour.is_empty());
        assert_eq!(&*opts.by_minute, &[20]);
        assert_eq!(&*opts.by_second, &[30]);

        let opts = parsed(&RawOptions::new(Frequency::Minutely, start));
        assert!(opts.by_hour.is_empty());
        assert!(opts.by_minute.is_empty());
        assert_eq!(&*opts.by_second, &[30]);

        let opts = parsed(&RawOptions::new(Frequency::Secondly, start));
        assert!(opts.by_hour.is_empty());
        assert!(opts.by_minute.is_empty());
        assert!(opts.by_second.is_empty());
    }

    #[test]
    fn numbered_weekdays_degrade_below_monthly() {
        let mut raw = RawOptions::new(Frequency::Monthly, start());
        raw.by_week_day = vec![
            ByWeekday::Numbered { nth: -1, weekday: Weekday::Friday },
            ByWeekday::Numbered { nth: 0, weekday: Weekday::Monday },
        ];
        insta::assert_snapshot!(weekdays(&parsed(&raw)), @"Mon,-1-Fri");

        raw.freq = Frequency::Weekly;
        insta::assert_snapshot!(weekdays(&parsed(&raw)), @"Mon,Fri");

        raw.freq = Frequency::Daily;
        raw.by_week_day.push(ByWeekday::Any(Weekday::Friday));
        insta::assert_snapshot!(weekdays(&parsed(&raw)), @"Mon,Fri");
    }

    #[test]
    fn instants_are_truncated_to_milliseconds() {
        let start = "2024-01-01T00:00:00.123456789Z".parse().unwrap();
        let mut raw = RawOptions::new(Frequency::Daily, start);
        raw.until = Some("2024-01-05T00:00:00.987654321Z".parse().unwrap());
        let opts = parsed(&raw);
        insta::assert_snapshot!(opts.start, @"2024-01-01T00:00:00.123Z");
        insta::assert_snapshot!(
            opts.until.unwrap(),
            @"2024-01-05T00:00:00.987Z",
        );
    }

    #[test]
    fn range_errors_name_the_option() {
        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_set_pos = vec![0];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid 'bysetpos' value `0` (values must be in range 1..=366 or -366..=-1)",
        );
        raw.by_set_pos = vec![-367];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid 'bysetpos' value `-367` (values must be in range 1..=366 or -366..=-1)",
        );

        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_month = vec![13];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid 'bymonth' value `13` (values must be in range 1..=12)",
        );

        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_month_day = vec![-32];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid 'bymonthday' value `-32` (values must be in range 1..=31 or -31..=-1)",
        );

        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_week = vec![54];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid 'byweekno' value `54` (values must be in range 1..=53 or -53..=-1)",
        );

        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_hour = vec![24];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid 'byhour' value `24` (values must be in range 0..=23)",
        );

        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_second = vec![60];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid 'bysecond' value `60` (values must be in range 0..=59)",
        );

        let mut raw = RawOptions::new(Frequency::Yearly, start());
        raw.by_week_day =
            vec![ByWeekday::Numbered { nth: 54, weekday: Weekday::Monday }];
        insta::assert_snapshot!(
            expect_err(&raw),
            @"invalid numbered 'byweekday' value `54-Mon` (values must be in range 1..=53 or -53..=-1)",
        );
    }

    #[test]
    fn solar_start_type_requires_parameters() {
        let mut raw = RawOptions::new(Frequency::Daily, start());
        raw.start_type = EventStartType::Sunset;
        insta::assert_snapshot!(
            expect_err(&raw),
            @"start type 'sunset' requires solar parameters",
        );
    }

    #[test]
    fn parse_instants() {
        insta::assert_snapshot!(
            parse_instant("1997-09-02T09:00:00-04:00").unwrap(),
            @"1997-09-02T13:00:00Z",
        );
        insta::assert_snapshot!(
            parse_instant("1997-09-02T09:00:00[America/New_York]").unwrap(),
            @"1997-09-02T13:00:00Z",
        );
        insta::assert_snapshot!(
            parse_instant("1997-09-02T09:00:00").unwrap(),
            @"1997-09-02T09:00:00Z",
        );
        let err = parse_instant("yesterday").unwrap_err().to_string();
        insta::assert_snapshot!(
            err,
            @"failed to parse `yesterday` as an RFC 3339 timestamp, an RFC 9557 zoned datetime or a civil datetime",
        );
    }
}
