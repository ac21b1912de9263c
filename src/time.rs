/// Formats a millisecond duration as `MM:SS`, or `HH:MM:SS` from one hour upward.
///
/// Every field is zero-padded to two digits; hours past 99 keep growing.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if ms >= 3_600_000 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::format_time;

    #[test]
    fn zero() {
        assert_eq!(format_time(0), "00:00");
    }

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format_time(61_000), "01:01");
        assert_eq!(format_time(59_999), "00:59");
        assert_eq!(format_time(3_599_999), "59:59");
    }

    #[test]
    fn hours() {
        assert_eq!(format_time(3_600_000), "01:00:00");
        assert_eq!(format_time(3_661_000), "01:01:01");
    }

    #[test]
    fn hundreds_of_hours_still_render() {
        assert_eq!(format_time(360_000_000), "100:00:00");
    }

    #[test]
    fn width_is_five_or_eight_below_a_hundred_hours() {
        for ms in [0, 999, 1_000, 600_000, 3_599_999, 3_600_000, 86_400_000, 359_999_999] {
            let len = format_time(ms).len();
            assert!(len == 5 || len == 8, "{ms} -> {len}");
        }
    }
}
