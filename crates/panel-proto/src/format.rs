//! Display formatting shared by every view.

use chrono::{DateTime, Local, Utc};

/// `m:ss` from milliseconds, floor semantics, no hour component.
///
/// ```
/// assert_eq!(panel_proto::format::format_time(61_000), "1:01");
/// ```
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Parse a seek target typed by the user: `m:ss`, `h:mm:ss` or plain
/// seconds.  Returns milliseconds.
pub fn parse_time(input: &str) -> Option<u64> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let mut secs = 0u64;
    for (i, part) in parts.iter().enumerate() {
        let n: u64 = part.parse().ok()?;
        if i > 0 && n >= 60 {
            return None;
        }
        secs = secs.checked_mul(60)?.checked_add(n)?;
    }
    secs.checked_mul(1000)
}

/// Progress bar percentage, clamped to `0.0..=100.0`.
/// Unknown (zero) duration gives 0.
pub fn progress_percent(position_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    (position_ms as f64 / duration_ms as f64 * 100.0).clamp(0.0, 100.0)
}

/// Local wall-clock rendering for history rows and message headers.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    let local: DateTime<Local> = ts.into();
    let today = Local::now().date_naive();
    if local.date_naive() == today {
        local.format("today %H:%M").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Rough "3h 12m" rendering of an uptime.
pub fn format_uptime(ms: u64) -> String {
    let mins = ms / 60_000;
    let (days, hours, mins) = (mins / 1440, (mins % 1440) / 60, mins % 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(61_000), "1:01");
        assert_eq!(format_time(3_599_000), "59:59");
    }

    #[test]
    fn test_format_time_floors() {
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(59_999), "0:59");
        // No hour component: an hour is sixty minutes.
        assert_eq!(format_time(3_600_000), "60:00");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("1:01"), Some(61_000));
        assert_eq!(parse_time(" 90 "), Some(90_000));
        assert_eq!(parse_time("1:00:05"), Some(3_605_000));
        assert_eq!(parse_time("1:75"), None);
        assert_eq!(parse_time("1:"), None);
        assert_eq!(parse_time("abc"), None);
    }

    #[test]
    fn test_parse_time_rejects_overflow() {
        assert_eq!(parse_time("99999999999999999"), None);
        assert_eq!(parse_time("99999999999999999:00"), None);
        assert_eq!(parse_time(&u64::MAX.to_string()), None);
        assert_eq!(parse_time("18446744073709551"), Some(18_446_744_073_709_551_000));
    }

    #[test]
    fn test_progress_percent_clamped() {
        assert_eq!(progress_percent(0, 0), 0.0);
        assert_eq!(progress_percent(500, 1000), 50.0);
        assert_eq!(progress_percent(1500, 1000), 100.0);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5 * 60_000), "5m");
        assert_eq!(format_uptime(3 * 3_600_000 + 12 * 60_000), "3h 12m");
        assert_eq!(format_uptime(2 * 86_400_000 + 3_600_000), "2d 1h");
    }
}
