/*!
Recurrence rules in the style of RFC 5545, with occurrences that may be
anchored to solar events.

A [`RecurrenceRule`] expands a frequency, an interval and a collection of
`BY*` constraints into an ascending sequence of instants. Rules can be
built with [`RecurrenceRule::builder`] or from a JSON object of options with
[`RecurrenceRule::from_json`]. Instead of a fixed time of day, a rule may
use the time of sunrise, sunset, dawn or dusk on each day it selects. See
the [`sun`] module for the calculator behind this.

Several rules can be combined with explicit instants into a
[`RecurrenceSet`].

# Example

```
use sunrule::{Frequency, RecurrenceRule};

let start = "2024-01-31T09:00:00Z".parse()?;
let rule = RecurrenceRule::builder(Frequency::Monthly, start)
    .by_month_day(-1)
    .count(3)
    .build()?;
let dates: Vec<String> = rule.iter().map(|ts| ts.to_string()).collect();
assert_eq!(dates, vec![
    "2024-01-31T09:00:00Z",
    "2024-02-29T09:00:00Z",
    "2024-03-31T09:00:00Z",
]);

# Ok::<(), Box<dyn std::error::Error>>(())
```

# Floating time

Rules are evaluated on wall clock fields. Those fields are taken from the
start instant in UTC, and occurrences are produced the same way. When a rule
has a `tzid`, each occurrence is then "rezoned": it becomes the instant at
which its wall clock reading happens in the named time zone. The default
rezoner uses Jiff's bundled time zone database, and a custom one can be
given with [`RecurrenceRuleBuilder::rezone`].

# Logging

This crate logs through the [`log`] facade. Building a rule is logged at
the debug level and the reason each traversal stops is logged at the trace
level. Rezoning failures are logged as warnings.
*/

pub use crate::{
    iter::RecurrenceIter,
    options::{EventStartType, Frequency, OneOrMany, Options, ParsedOptions},
    rezone::{Rezone, ZoneRezone},
    rule::{IntoI8Iter, IntoI16Iter, RecurrenceRule, RecurrenceRuleBuilder},
    set::{RecurrenceSet, RecurrenceSetIter},
    sun::{SolarEvents, SolarParams},
    weekday::{ByWeekday, IntoByWeekdayIter, WeekdayToken},
};

mod calendar;
mod cursor;
mod dayset;
mod filter;
mod iter;
mod options;
mod rezone;
mod rule;
mod set;
mod setpos;
mod sink;
pub mod sun;
mod weekday;
