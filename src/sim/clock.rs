//! Trading-day clock over a fixed historical calendar.

use chrono::NaiveDate;

/// Ordered, de-duplicated trading dates with a current index.
///
/// The index is always valid: advancing past the end clamps to the last
/// date and reports exhaustion instead of erroring.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    dates: Vec<NaiveDate>,
    index: usize,
}

impl SimulationClock {
    /// Build a clock from a trading calendar. Returns `None` when the
    /// calendar is empty. Dates are sorted and de-duplicated.
    pub fn new(mut dates: Vec<NaiveDate>) -> Option<Self> {
        dates.sort();
        dates.dedup();
        if dates.is_empty() {
            return None;
        }
        Some(Self { dates, index: 0 })
    }

    pub fn current_date(&self) -> NaiveDate {
        self.dates[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of trading dates in the calendar (always at least 1).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Whether the clock sits on the final trading date.
    pub fn is_exhausted(&self) -> bool {
        self.index == self.dates.len() - 1
    }

    /// Move forward `days` trading days. Returns `false` when the step ran
    /// past the calendar and was clamped to the last date.
    pub fn advance(&mut self, days: usize) -> bool {
        let target = self.index + days;
        if target >= self.dates.len() {
            self.index = self.dates.len() - 1;
            return false;
        }
        self.index = target;
        true
    }

    /// Date `days` trading days ahead of the current index, clamped to the
    /// last available date. Does not move the clock.
    pub fn peek_forward(&self, days: usize) -> NaiveDate {
        let target = (self.index + days).min(self.dates.len() - 1);
        self.dates[target]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar(days: u64) -> Vec<NaiveDate> {
        (0..days)
            .map(|i| date(2024, 1, 1) + chrono::Days::new(i))
            .collect()
    }

    #[test]
    fn test_empty_calendar_rejected() {
        assert!(SimulationClock::new(vec![]).is_none());
    }

    #[test]
    fn test_sorts_and_dedups() {
        let clock = SimulationClock::new(vec![
            date(2024, 1, 3),
            date(2024, 1, 2),
            date(2024, 1, 3),
        ])
        .unwrap();
        assert_eq!(clock.len(), 2);
        assert_eq!(clock.current_date(), date(2024, 1, 2));
        assert_eq!(clock.last_date(), date(2024, 1, 3));
    }

    #[test]
    fn test_advance_within_calendar() {
        let mut clock = SimulationClock::new(calendar(10)).unwrap();
        assert!(clock.advance(3));
        assert_eq!(clock.current_date(), date(2024, 1, 4));
        assert!(clock.advance(6));
        assert!(clock.is_exhausted());
    }

    #[test]
    fn test_advance_past_end_clamps_repeatably() {
        let mut clock = SimulationClock::new(calendar(5)).unwrap();
        assert!(!clock.advance(10));
        assert_eq!(clock.current_date(), date(2024, 1, 5));
        // Further advances stay clamped and keep reporting exhaustion
        assert!(!clock.advance(1));
        assert_eq!(clock.current_date(), date(2024, 1, 5));
    }

    #[test]
    fn test_peek_forward_clamped() {
        let clock = SimulationClock::new(calendar(5)).unwrap();
        assert_eq!(clock.peek_forward(2), date(2024, 1, 3));
        assert_eq!(clock.peek_forward(30), date(2024, 1, 5));
    }
}
