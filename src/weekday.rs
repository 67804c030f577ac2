use std::{cmp::Ordering, ops::RangeInclusive};

use {anyhow::Context, jiff::civil::Weekday};

/// A type describing "day of week" constraints.
///
/// A weekday is either "any" weekday (every Monday, say) or a numbered
/// weekday (the third Monday, or the last Friday when `nth` is `-1`). The
/// period that a numbered weekday counts within is the year or the month,
/// depending on the rule's frequency and whether a month constraint is set.
///
/// This implements `Ord` even though the actual order of weekdays cannot be
/// determined unless the _start_ of the week is known. The ordering exists
/// only to make it easy to sort and de-duplicate collections containing a
/// `ByWeekday`. Occurrence generation never relies on it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ByWeekday {
    Any(Weekday),
    Numbered { nth: i8, weekday: Weekday },
}

impl ByWeekday {
    /// Returns the weekday, ignoring any occurrence number.
    pub fn weekday(&self) -> Weekday {
        match *self {
            ByWeekday::Any(weekday) => weekday,
            ByWeekday::Numbered { weekday, .. } => weekday,
        }
    }

    /// Returns the occurrence number, if this is a numbered weekday.
    pub fn nth(&self) -> Option<i8> {
        match *self {
            ByWeekday::Any(_) => None,
            ByWeekday::Numbered { nth, .. } => Some(nth),
        }
    }
}

impl Ord for ByWeekday {
    fn cmp(&self, rhs: &ByWeekday) -> Ordering {
        match (*self, *rhs) {
            (ByWeekday::Any(lhs), ByWeekday::Any(rhs)) => {
                lhs.to_monday_one_offset().cmp(&rhs.to_monday_one_offset())
            }
            (
                ByWeekday::Numbered { nth: lhs_nth, weekday: lhs_weekday },
                ByWeekday::Numbered { nth: rhs_nth, weekday: rhs_weekday },
            ) => {
                let lhs = (lhs_nth, lhs_weekday.to_monday_one_offset());
                let rhs = (rhs_nth, rhs_weekday.to_monday_one_offset());
                lhs.cmp(&rhs)
            }
            (ByWeekday::Any(_), ByWeekday::Numbered { .. }) => Ordering::Less,
            (ByWeekday::Numbered { .. }, ByWeekday::Any(_)) => {
                Ordering::Greater
            }
        }
    }
}

impl PartialOrd for ByWeekday {
    fn partial_cmp(&self, rhs: &ByWeekday) -> Option<Ordering> {
        Some(self.cmp(rhs))
    }
}

/// Parses a weekday constraint.
///
/// The following forms are recognized, case insensitively:
///
/// * A weekday name, like `monday`, `mon` or `mo`.
/// * A numbered weekday in the `nth-name` form, like `1-fri` or `-1-sun`.
/// * A numbered weekday in the RFC 5545 `BYDAY` form, like `+1FR` or `-2MO`.
impl std::str::FromStr for ByWeekday {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<ByWeekday> {
        let s = s.trim();
        if let Some((nth, name)) = s.rsplit_once("-") {
            if !nth.is_empty() {
                let nth = nth.parse().with_context(|| {
                    format!(
                        "failed to parse `{nth}` as integer weekday number"
                    )
                })?;
                let weekday = parse_weekday(name)?;
                return Ok(ByWeekday::Numbered { nth, weekday });
            }
        }
        let Some(split) = s.find(|ch: char| ch.is_ascii_alphabetic()) else {
            anyhow::bail!("unrecognized weekday: `{s}`")
        };
        let (nth, name) = s.split_at(split);
        let weekday = parse_weekday(name)?;
        if nth.is_empty() {
            return Ok(ByWeekday::Any(weekday));
        }
        let nth = nth.parse().with_context(|| {
            format!("failed to parse `{nth}` as integer weekday number")
        })?;
        Ok(ByWeekday::Numbered { nth, weekday })
    }
}

impl std::fmt::Display for ByWeekday {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        fn fmt_weekday(
            wd: Weekday,
            f: &mut std::fmt::Formatter,
        ) -> std::fmt::Result {
            match wd {
                Weekday::Sunday => write!(f, "Sun"),
                Weekday::Monday => write!(f, "Mon"),
                Weekday::Tuesday => write!(f, "Tue"),
                Weekday::Wednesday => write!(f, "Wed"),
                Weekday::Thursday => write!(f, "Thu"),
                Weekday::Friday => write!(f, "Fri"),
                Weekday::Saturday => write!(f, "Sat"),
            }
        }

        match *self {
            ByWeekday::Any(weekday) => fmt_weekday(weekday, f),
            ByWeekday::Numbered { nth, weekday } => {
                write!(f, "{nth}-")?;
                fmt_weekday(weekday, f)
            }
        }
    }
}

/// A weekday as it may appear in JSON options.
///
/// Tokens come in several shapes: an index where `0` is Monday and `6` is
/// Sunday, a string accepted by `ByWeekday`'s `FromStr` implementation, or
/// an object pairing a weekday with an occurrence number. Each token is
/// resolved to a `ByWeekday` exactly once, when options are normalized.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum WeekdayToken {
    Index(i64),
    Name(String),
    Nth { weekday: Box<WeekdayToken>, n: i8 },
}

impl WeekdayToken {
    /// Resolve this token into a weekday constraint.
    ///
    /// A numbered object with `n` equal to `0` resolves to "any" weekday.
    pub fn resolve(&self) -> anyhow::Result<ByWeekday> {
        match *self {
            WeekdayToken::Index(index) => {
                anyhow::ensure!(
                    0 <= index && index <= 6,
                    "invalid weekday index `{index}` \
                     (values must be in range 0..=6, where 0 is Monday)",
                );
                // OK because of the range check above.
                let offset = i8::try_from(index).unwrap();
                let weekday = Weekday::from_monday_zero_offset(offset)?;
                Ok(ByWeekday::Any(weekday))
            }
            WeekdayToken::Name(ref name) => name.parse(),
            WeekdayToken::Nth { ref weekday, n } => {
                let weekday = match weekday.resolve()? {
                    ByWeekday::Any(weekday) => weekday,
                    numbered @ ByWeekday::Numbered { .. } => anyhow::bail!(
                        "weekday `{numbered}` inside a numbered weekday \
                         object must not carry its own number",
                    ),
                };
                if n == 0 {
                    return Ok(ByWeekday::Any(weekday));
                }
                Ok(ByWeekday::Numbered { nth: n, weekday })
            }
        }
    }

    /// Resolve this token into a plain weekday, rejecting numbered ones.
    ///
    /// This is used for the week start option.
    pub fn resolve_plain(&self) -> anyhow::Result<Weekday> {
        match self.resolve()? {
            ByWeekday::Any(weekday) => Ok(weekday),
            numbered => anyhow::bail!(
                "expected a plain weekday, but got numbered weekday \
                 `{numbered}`",
            ),
        }
    }
}

/// A trait that permits flexibly specifying a sequence of weekdays.
///
/// Each weekday can just mean "any" weekday (e.g., `Weekday::Saturday`), or
/// it can mean a numbered weekday. For example, when the frequency for a
/// recurrence rule is yearly, then `(3, Weekday::Saturday)` corresponds to the
/// third Saturday of the year.
///
/// This trait is primarily used for the `RecurrenceRuleBuilder::by_week_day`
/// builder method. It permits callers to provide weekdays in a number of
/// flexible ways:
///
/// * Directly via `ByWeekday::Numbered { nth: 3, weekday: Weekday::Monday }`.
/// * As just any weekday via `Weekday::Monday`.
/// * As a range of weekdays via `Weekday::Monday..=Weekday::Wednesday`.
/// * As an array of weekdays via `[Weekday::Monday, Weekday::Friday]`.
/// * As an array of numbered weekdays via
/// `[(2, Weekday::Monday), (1, Weekday::Friday)]`.
pub trait IntoByWeekdayIter {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday>;
}

impl IntoByWeekdayIter for ByWeekday {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        std::iter::once(self)
    }
}

impl IntoByWeekdayIter for Weekday {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        std::iter::once(ByWeekday::Any(self))
    }
}

impl IntoByWeekdayIter for (i8, Weekday) {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        let (nth, weekday) = self;
        std::iter::once(ByWeekday::Numbered { nth, weekday })
    }
}

impl IntoByWeekdayIter for RangeInclusive<Weekday> {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        let (start, end) = (*self.start(), *self.end());
        // OK because `Weekday::until` guarantees `0..=6`.
        // And add `1` because this is an inclusive range.
        let count = 1 + usize::try_from(start.until(end)).unwrap();
        start.cycle_forward().take(count).map(ByWeekday::Any)
    }
}

impl<const N: usize> IntoByWeekdayIter for [ByWeekday; N] {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        self.into_iter()
    }
}

impl<const N: usize> IntoByWeekdayIter for [Weekday; N] {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        self.into_iter().flat_map(|any| any.into_by_weekday_iter())
    }
}

impl<const N: usize> IntoByWeekdayIter for [(i8, Weekday); N] {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        self.into_iter().flat_map(|numbered| numbered.into_by_weekday_iter())
    }
}

impl IntoByWeekdayIter for Vec<ByWeekday> {
    fn into_by_weekday_iter(self) -> impl Iterator<Item = ByWeekday> {
        self.into_iter()
    }
}

/// Parses a weekday name, case insensitively.
pub(crate) fn parse_weekday(s: &str) -> anyhow::Result<Weekday> {
    use jiff::civil::Weekday::*;

    let weekday = match &*s.to_ascii_lowercase() {
        "sunday" | "sun" | "su" => Sunday,
        "monday" | "mon" | "mo" => Monday,
        "tuesday" | "tues" | "tue" | "tu" => Tuesday,
        "wednesday" | "wed" | "we" => Wednesday,
        "thursday" | "thurs" | "thu" | "th" => Thursday,
        "friday" | "fri" | "fr" => Friday,
        "saturday" | "sat" | "sa" => Saturday,
        unk => anyhow::bail!("unrecognized weekday: `{unk}`"),
    };
    Ok(weekday)
}
