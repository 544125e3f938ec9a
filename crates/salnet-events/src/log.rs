//! Generic append-only event log.
//!
//! Every fish and redd carries an [`EventLog`] recording what happened to
//! it and when. The log is strictly append-only: entries receive monotone
//! sequence numbers at insertion and no API exists to modify or remove
//! them. Reporting reconstructs an entity's past (for example the activity
//! in force at a given week) by scanning the log.

use serde::{Deserialize, Serialize};

/// A single recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<K> {
    /// Position of this event in its log, strictly increasing from zero.
    pub seq: u64,
    /// Absolute simulation week at which the event occurred.
    pub week: u64,
    /// What happened.
    pub kind: K,
}

/// An append-only log of typed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog<K> {
    events: Vec<Event<K>>,
}

impl<K> EventLog<K> {
    /// Create an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event, assigning it the next sequence number.
    pub fn append(&mut self, week: u64, kind: K) {
        let seq = u64::try_from(self.events.len()).unwrap_or(u64::MAX);
        self.events.push(Event { seq, week, kind });
    }

    /// Number of events recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The most recently appended event.
    #[must_use]
    pub fn last(&self) -> Option<&Event<K>> {
        self.events.last()
    }

    /// Iterate over events in append order.
    pub fn iter(&self) -> core::slice::Iter<'_, Event<K>> {
        self.events.iter()
    }
}

impl<K> Default for EventLog<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K> IntoIterator for &'a EventLog<K> {
    type Item = &'a Event<K>;
    type IntoIter = core::slice::Iter<'a, Event<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_monotone_sequence_numbers() {
        let mut log: EventLog<u32> = EventLog::new();
        log.append(0, 10);
        log.append(0, 20);
        log.append(3, 30);

        let seqs: Vec<u64> = log.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn iteration_preserves_append_order() {
        let mut log: EventLog<&str> = EventLog::new();
        log.append(1, "first");
        log.append(2, "second");

        let kinds: Vec<&str> = log.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec!["first", "second"]);
        assert_eq!(log.last().map(|e| e.kind), Some("second"));
    }

    #[test]
    fn empty_log_reports_empty() {
        let log: EventLog<u32> = EventLog::default();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(log.last().is_none());
    }

    #[test]
    fn events_carry_the_week_they_were_appended_with() {
        let mut log: EventLog<u32> = EventLog::new();
        log.append(17, 1);
        assert_eq!(log.last().map(|e| e.week), Some(17));
    }
}
