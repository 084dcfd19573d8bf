//! Timestamp utilities

use chrono::{Local, NaiveDateTime, Timelike};

/// Kiosk wall-clock display format, e.g. `Mar 04, 2025 09:15 AM`.
const WALL_TIME_FORMAT: &str = "%b %d, %Y %I:%M %p";

/// Current local timestamp, truncated to whole seconds (the stored
/// precision).
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Format a stored timestamp for kiosk display.
pub fn format_wall_time(timestamp: NaiveDateTime) -> String {
    timestamp.format(WALL_TIME_FORMAT).to_string()
}

/// Format an optional time-out; open records render as empty.
pub fn format_wall_time_opt(timestamp: Option<NaiveDateTime>) -> String {
    match timestamp {
        Some(t) => format_wall_time(t),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_now_local_returns_valid_timestamp() {
        let timestamp = now_local();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.and_utc().timestamp() > 946_684_800);
    }

    #[test]
    fn test_now_local_whole_seconds() {
        let timestamp = now_local();
        assert_eq!(timestamp.nanosecond(), 0);
    }

    #[test]
    fn test_format_morning() {
        assert_eq!(format_wall_time(ts(2025, 3, 4, 9, 15, 0)), "Mar 04, 2025 09:15 AM");
    }

    #[test]
    fn test_format_afternoon() {
        assert_eq!(format_wall_time(ts(2025, 12, 31, 23, 5, 59)), "Dec 31, 2025 11:05 PM");
    }

    #[test]
    fn test_format_noon_and_midnight() {
        assert_eq!(format_wall_time(ts(2025, 6, 1, 12, 0, 0)), "Jun 01, 2025 12:00 PM");
        assert_eq!(format_wall_time(ts(2025, 6, 1, 0, 0, 0)), "Jun 01, 2025 12:00 AM");
    }

    #[test]
    fn test_format_opt_open_record_is_empty() {
        assert_eq!(format_wall_time_opt(None), "");
        assert_eq!(
            format_wall_time_opt(Some(ts(2025, 3, 4, 17, 30, 0))),
            "Mar 04, 2025 05:30 PM"
        );
    }
}
