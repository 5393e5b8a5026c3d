// src/gate.rs
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Suppresses log history that predates the agent.
///
/// `tail` hands us the whole file on startup. Everything up to and including
/// the start second is dropped; the first record strictly after it opens the
/// gate for good, so out-of-order records seen later still pass.
#[derive(Debug, Clone)]
pub struct ReplayGate {
    start: NaiveDateTime,
    suppressing: bool,
}

impl ReplayGate {
    pub fn new(start: NaiveDateTime) -> Self {
        Self { start, suppressing: true }
    }

    /// A gate that admits everything from the first call.
    #[cfg(test)]
    pub fn open(start: NaiveDateTime) -> Self {
        Self { start, suppressing: false }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressing
    }

    /// Decide whether a record stamped `ts` should be reported.
    pub fn admit(&mut self, ts: &NaiveDateTime) -> bool {
        if !self.suppressing {
            return true;
        }

        let s = &self.start;
        if ts.day() != s.day()
            || ts.month() != s.month()
            || (ts.hour(), ts.minute(), ts.second()) <= (s.hour(), s.minute(), s.second())
        {
            return false;
        }

        self.suppressing = false;
        true
    }
}
