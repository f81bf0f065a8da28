//! Statistics module for Focustimer
//!
//! Builds the report view (today / all-time totals, distractions, the
//! seven-day series and the per-category breakdown) from the session log.

mod report;

pub use report::{aggregate, aggregate_now, CategorySlice, DayPoint, FocusReport, SERIES_DAYS};

/// `MM:SS` clock text. Minutes keep counting past 59.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(3600), "60:00");
    }
}
