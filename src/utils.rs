/// Countdown display, e.g. `24:59`. Minutes keep counting past an hour.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Study totals, e.g. `3h 5m`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn plural_days(n: u32) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(120 * 60), "120:00");
        assert_eq!(format_clock(-5), "00:00");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0h 0m");
        assert_eq!(format_minutes(59), "0h 59m");
        assert_eq!(format_minutes(185), "3h 5m");
    }

    #[test]
    fn test_plural_days() {
        assert_eq!(plural_days(1), "day");
        assert_eq!(plural_days(0), "days");
        assert_eq!(plural_days(7), "days");
    }
}
