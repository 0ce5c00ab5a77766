//! The simulation clock.
//!
//! One monotonic current date drives the whole engine. Advancing to a later
//! date yields every skipped day so the caller can replay milestone updates
//! in order — jumping from day 1 to day 7 must leave the same state as
//! stepping 1→2→…→7. Dates never rewind; stamping an equal or earlier date
//! is a no-op.
//!
//! The clock also owns the organization phase cycle
//! (TESTING → DEVELOPING → DECIDING → …): every stamp checks whether the
//! phase has been running long enough to rotate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Organization lifecycle phases. Rotation is cyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Testing,
    Developing,
    Deciding,
}

impl Phase {
    /// The next phase in the cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Testing => Self::Developing,
            Self::Developing => Self::Deciding,
            Self::Deciding => Self::Testing,
        }
    }
}

/// Monotonic simulated wall clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimClock {
    current: Option<NaiveDate>,
    phase: Phase,
    phase_started: Option<NaiveDate>,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// A fresh clock with no date pinned yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: None,
            phase: Phase::Testing,
            phase_started: None,
        }
    }

    /// The pinned current date, if any command has stamped the clock yet.
    #[must_use]
    pub const fn current(&self) -> Option<NaiveDate> {
        self.current
    }

    /// The current organization phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Stamp the clock with a command timestamp.
    ///
    /// Returns the list of days the caller must replay, in order: every day
    /// strictly after the previous date up to and including `date`. The first
    /// stamp pins the date and replays nothing; an equal or earlier date
    /// replays nothing and leaves the clock unchanged.
    ///
    /// `phase_length_days` is the rotation threshold for the phase cycle,
    /// measured from the start of the current phase to `date`.
    pub fn stamp(&mut self, date: NaiveDate, phase_length_days: i64) -> Vec<NaiveDate> {
        let days = match self.current {
            None => {
                self.current = Some(date);
                Vec::new()
            }
            Some(current) if date > current => {
                let days: Vec<NaiveDate> = current
                    .iter_days()
                    .skip(1)
                    .take_while(|day| *day <= date)
                    .collect();
                trace!(from = %current, to = %date, skipped = days.len(), "advancing clock");
                self.current = Some(date);
                days
            }
            Some(_) => Vec::new(),
        };

        match self.phase_started {
            None => self.phase_started = Some(date),
            Some(started) => {
                if (date - started).num_days() >= phase_length_days {
                    self.phase = self.phase.next();
                    self.phase_started = Some(date);
                }
            }
        }

        days
    }
}

/// Parse a wire-format date. The wire format is fixed: `yyyy-MM-dd`.
pub fn parse_wire_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::{Phase, SimClock, parse_wire_date};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).expect("valid date")
    }

    #[test]
    fn first_stamp_pins_without_replay() {
        let mut clock = SimClock::new();
        assert!(clock.current().is_none());
        let days = clock.stamp(day(10), 12);
        assert!(days.is_empty());
        assert_eq!(clock.current(), Some(day(10)));
    }

    #[test]
    fn jump_yields_every_skipped_day_in_order() {
        let mut clock = SimClock::new();
        clock.stamp(day(1), 12);
        let days = clock.stamp(day(5), 12);
        assert_eq!(days, vec![day(2), day(3), day(4), day(5)]);
        assert_eq!(clock.current(), Some(day(5)));
    }

    #[test]
    fn clock_never_rewinds() {
        let mut clock = SimClock::new();
        clock.stamp(day(8), 12);
        assert!(clock.stamp(day(8), 12).is_empty());
        assert!(clock.stamp(day(3), 12).is_empty());
        assert_eq!(clock.current(), Some(day(8)));
    }

    #[test]
    fn phase_rotates_after_threshold() {
        let mut clock = SimClock::new();
        clock.stamp(day(1), 12);
        assert_eq!(clock.phase(), Phase::Testing);

        clock.stamp(day(12), 12);
        assert_eq!(clock.phase(), Phase::Testing);

        clock.stamp(day(13), 12);
        assert_eq!(clock.phase(), Phase::Developing);

        // Cycle wraps back around to TESTING.
        clock.stamp(day(25), 12);
        assert_eq!(clock.phase(), Phase::Deciding);
        let next = NaiveDate::from_ymd_opt(2024, 3, 8).expect("valid date");
        clock.stamp(next, 12);
        assert_eq!(clock.phase(), Phase::Testing);
    }

    #[test]
    fn wire_dates_use_the_fixed_format() {
        assert_eq!(parse_wire_date("2024-02-05").expect("parse"), day(5));
        assert_eq!(parse_wire_date(" 2024-02-05 ").expect("parse"), day(5));
        assert!(parse_wire_date("05/02/2024").is_err());
    }
}
