use std::{collections::BTreeSet, iter::Peekable};

use jiff::Timestamp;

use crate::{
    rule::RecurrenceRule,
    sink::{self, After, Before, Between, Collector},
};

/// A combination of recurrence rules and explicit instants.
///
/// The occurrences of a set are the occurrences of its inclusion rules and
/// its explicit inclusion instants, minus the occurrences of its exclusion
/// rules and its explicit exclusion instants. They are produced in
/// ascending order without duplicates.
///
/// Each rule is evaluated independently. Occurrences are compared as
/// instants, after any rezoning done by their rule.
#[derive(Clone, Debug, Default)]
pub struct RecurrenceSet {
    rrules: Vec<RecurrenceRule>,
    exrules: Vec<RecurrenceRule>,
    rdates: BTreeSet<Timestamp>,
    exdates: BTreeSet<Timestamp>,
}

impl RecurrenceSet {
    pub fn new() -> RecurrenceSet {
        RecurrenceSet::default()
    }

    /// Include the occurrences of the given rule.
    pub fn rrule(&mut self, rule: RecurrenceRule) -> &mut RecurrenceSet {
        self.rrules.push(rule);
        self
    }

    /// Exclude the occurrences of the given rule.
    pub fn exrule(&mut self, rule: RecurrenceRule) -> &mut RecurrenceSet {
        self.exrules.push(rule);
        self
    }

    /// Include the given instant.
    pub fn rdate(&mut self, ts: Timestamp) -> &mut RecurrenceSet {
        self.rdates.insert(ts);
        self
    }

    /// Exclude the given instant.
    pub fn exdate(&mut self, ts: Timestamp) -> &mut RecurrenceSet {
        self.exdates.insert(ts);
        self
    }

    /// Returns an iterator over every occurrence of this set.
    ///
    /// Exclusion rules are only evaluated as far as the inclusions require,
    /// so unbounded exclusion rules are fine. The iterator is unbounded when
    /// any inclusion rule is.
    pub fn iter(&self) -> RecurrenceSetIter<'_> {
        let mut includes: Vec<Stream<'_>> = self
            .rrules
            .iter()
            .map(|rule| stream(rule.iter()))
            .collect();
        includes.push(stream(self.rdates.iter().copied()));
        let mut excludes: Vec<Stream<'_>> = self
            .exrules
            .iter()
            .map(|rule| stream(rule.iter()))
            .collect();
        excludes.push(stream(self.exdates.iter().copied()));
        RecurrenceSetIter { includes, excludes }
    }

    /// Returns every occurrence of this set.
    ///
    /// This never returns when an inclusion rule is unbounded.
    pub fn all(&self) -> Vec<Timestamp> {
        sink::drive(self.iter(), Collector::new(sink::keep_all))
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
        let between = Between::new(after, before, inclusive, sink::keep_all);
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
}

impl<'s> IntoIterator for &'s RecurrenceSet {
    type IntoIter = RecurrenceSetIter<'s>;
    type Item = Timestamp;

    fn into_iter(self) -> RecurrenceSetIter<'s> {
        self.iter()
    }
}

type Stream<'s> = Peekable<Box<dyn Iterator<Item = Timestamp> + Send + 's>>;

fn stream<'s>(it: impl Iterator<Item = Timestamp> + Send + 's) -> Stream<'s> {
    let it: Box<dyn Iterator<Item = Timestamp> + Send + 's> = Box::new(it);
    it.peekable()
}

/// An iterator over the occurrences of a recurrence set, in ascending
/// order.
pub struct RecurrenceSetIter<'s> {
    includes: Vec<Stream<'s>>,
    excludes: Vec<Stream<'s>>,
}

impl<'s> RecurrenceSetIter<'s> {
    /// Returns true when `ts` is produced by any exclusion.
    ///
    /// Candidates are asked about in ascending order, so every exclusion
    /// before `ts` can be discarded.
    fn is_excluded(&mut self, ts: Timestamp) -> bool {
        let mut excluded = false;
        for exclude in self.excludes.iter_mut() {
            while exclude.next_if(|&x| x < ts).is_some() {}
            excluded = excluded || exclude.peek() == Some(&ts);
        }
        excluded
    }
}

impl<'s> Iterator for RecurrenceSetIter<'s> {
    type Item = Timestamp;

    fn next(&mut self) -> Option<Timestamp> {
        loop {
            let next = self
                .includes
                .iter_mut()
                .filter_map(|include| include.peek().copied())
                .min()?;
            for include in self.includes.iter_mut() {
                while include.next_if_eq(&next).is_some() {}
            }
            if self.is_excluded(next) {
                log::trace!("{next} is excluded");
                continue;
            }
            return Some(next);
        }
    }
}

impl<'s> std::iter::FusedIterator for RecurrenceSetIter<'s> {}

impl<'s> std::fmt::Debug for RecurrenceSetIter<'s> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RecurrenceSetIter")
            .field("includes", &self.includes.len())
            .field("excludes", &self.excludes.len())
            .finish()
    }
}
