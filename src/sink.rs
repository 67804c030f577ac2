use std::ops::ControlFlow;

use jiff::Timestamp;

/// A consumer of occurrences that decides when a traversal should stop.
///
/// Every query over a rule or a set is a sink fed by [`drive`]. A sink sees
/// occurrences in ascending order and may stop the traversal after any one
/// of them.
pub(crate) trait Sink {
    type Output;

    fn accept(&mut self, ts: Timestamp) -> ControlFlow<()>;

    fn finish(self) -> Self::Output;
}

/// Feed occurrences into the given sink until either runs out.
pub(crate) fn drive<S: Sink>(
    occurrences: impl Iterator<Item = Timestamp>,
    mut sink: S,
) -> S::Output {
    for ts in occurrences {
        if sink.accept(ts).is_break() {
            log::trace!("query stopped at {ts}");
            break;
        }
    }
    sink.finish()
}

/// Returns a callback that never stops a traversal.
pub(crate) fn keep_all(_: Timestamp, _: usize) -> bool {
    true
}

/// Collects occurrences, consulting a callback before each one is kept.
///
/// The callback is given the occurrence and the number of occurrences
/// collected so far. When it returns false, the traversal stops and the
/// occurrence is not kept.
#[derive(Debug)]
pub(crate) struct Collector<F> {
    dates: Vec<Timestamp>,
    callback: F,
}

impl<F: FnMut(Timestamp, usize) -> bool> Collector<F> {
    pub(crate) fn new(callback: F) -> Collector<F> {
        Collector { dates: vec![], callback }
    }
}

impl<F: FnMut(Timestamp, usize) -> bool> Sink for Collector<F> {
    type Output = Vec<Timestamp>;

    fn accept(&mut self, ts: Timestamp) -> ControlFlow<()> {
        if !(self.callback)(ts, self.dates.len()) {
            return ControlFlow::Break(());
        }
        self.dates.push(ts);
        ControlFlow::Continue(())
    }

    fn finish(self) -> Vec<Timestamp> {
        self.dates
    }
}

/// Collects occurrences between two bounds.
#[derive(Debug)]
pub(crate) struct Between<F> {
    after: Timestamp,
    before: Timestamp,
    inclusive: bool,
    collector: Collector<F>,
}

impl<F: FnMut(Timestamp, usize) -> bool> Between<F> {
    pub(crate) fn new(
        after: Timestamp,
        before: Timestamp,
        inclusive: bool,
        callback: F,
    ) -> Between<F> {
        let collector = Collector::new(callback);
        Between { after, before, inclusive, collector }
    }
}

impl<F: FnMut(Timestamp, usize) -> bool> Sink for Between<F> {
    type Output = Vec<Timestamp>;

    fn accept(&mut self, ts: Timestamp) -> ControlFlow<()> {
        if is_past(ts, self.before, self.inclusive) {
            return ControlFlow::Break(());
        }
        if !reaches(ts, self.after, self.inclusive) {
            return ControlFlow::Continue(());
        }
        self.collector.accept(ts)
    }

    fn finish(self) -> Vec<Timestamp> {
        self.collector.finish()
    }
}

/// Finds the last occurrence before a bound.
#[derive(Debug)]
pub(crate) struct Before {
    bound: Timestamp,
    inclusive: bool,
    last: Option<Timestamp>,
}

impl Before {
    pub(crate) fn new(bound: Timestamp, inclusive: bool) -> Before {
        Before { bound, inclusive, last: None }
    }
}

impl Sink for Before {
    type Output = Option<Timestamp>;

    fn accept(&mut self, ts: Timestamp) -> ControlFlow<()> {
        if is_past(ts, self.bound, self.inclusive) {
            return ControlFlow::Break(());
        }
        self.last = Some(ts);
        ControlFlow::Continue(())
    }

    fn finish(self) -> Option<Timestamp> {
        self.last
    }
}

/// Finds the first occurrence after a bound.
#[derive(Debug)]
pub(crate) struct After {
    bound: Timestamp,
    inclusive: bool,
    first: Option<Timestamp>,
}

impl After {
    pub(crate) fn new(bound: Timestamp, inclusive: bool) -> After {
        After { bound, inclusive, first: None }
    }
}

impl Sink for After {
    type Output = Option<Timestamp>;

    fn accept(&mut self, ts: Timestamp) -> ControlFlow<()> {
        if !reaches(ts, self.bound, self.inclusive) {
            return ControlFlow::Continue(());
        }
        self.first = Some(ts);
        ControlFlow::Break(())
    }

    fn finish(self) -> Option<Timestamp> {
        self.first
    }
}

/// Returns true when `ts` lies beyond an upper bound.
fn is_past(ts: Timestamp, bound: Timestamp, inclusive: bool) -> bool {
    if inclusive { ts > bound } else { ts >= bound }
}

/// Returns true when `ts` satisfies a lower bound.
fn reaches(ts: Timestamp, bound: Timestamp, inclusive: bool) -> bool {
    if inclusive { ts >= bound } else { ts > bound }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(days: &[i64]) -> Vec<Timestamp> {
        days.iter()
            .map(|&d| Timestamp::from_second(d * 86_400).unwrap())
            .collect()
    }

    fn day(d: i64) -> Timestamp {
        Timestamp::from_second(d * 86_400).unwrap()
    }

    fn render(dates: &[Timestamp]) -> String {
        dates
            .iter()
            .map(|ts| ts.strftime("%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn collector_callback_stops_without_keeping() {
        let dates = days(&[0, 1, 2, 3]);
        let got = drive(dates.into_iter(), Collector::new(|_, n| n < 2));
        insta::assert_snapshot!(render(&got), @"01-01,01-02");
    }

    #[test]
    fn between_bounds() {
        let dates = days(&[0, 1, 2, 3, 4]);
        let got = drive(
            dates.clone().into_iter(),
            Between::new(day(1), day(3), false, keep_all),
        );
        insta::assert_snapshot!(render(&got), @"01-03");
        let got = drive(
            dates.into_iter(),
            Between::new(day(1), day(3), true, keep_all),
        );
        insta::assert_snapshot!(render(&got), @"01-02,01-03,01-04");
    }

    #[test]
    fn between_stops_past_upper_bound() {
        let mut seen = 0;
        let dates = days(&[0, 1, 2, 3, 4]).into_iter().inspect(|_| seen += 1);
        let got = drive(dates, Between::new(day(0), day(1), true, keep_all));
        insta::assert_snapshot!(render(&got), @"01-01,01-02");
        assert_eq!(seen, 3);
    }

    #[test]
    fn before_and_after() {
        let dates = days(&[0, 2, 4]);
        let before = |bound, inclusive| {
            let sink = Before::new(day(bound), inclusive);
            drive(dates.clone().into_iter(), sink)
        };
        let after = |bound, inclusive| {
            let sink = After::new(day(bound), inclusive);
            drive(dates.clone().into_iter(), sink)
        };
        assert_eq!(before(2, true), Some(day(2)));
        assert_eq!(before(2, false), Some(day(0)));
        assert_eq!(before(0, false), None);
        assert_eq!(before(9, false), Some(day(4)));
        assert_eq!(after(2, true), Some(day(2)));
        assert_eq!(after(2, false), Some(day(4)));
        assert_eq!(after(4, false), None);
        assert_eq!(after(3, false), Some(day(4)));
    }
}
