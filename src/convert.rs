use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{Duration, SystemTime};

const MICROS_PER_SECOND: u128 = 1_000_000;

/// Formats a duration as `d.hh:mm:ss.ffffff`.
pub(crate) fn duration_to_string(duration: Duration) -> String {
    let total_micros = duration.as_micros();
    let total_seconds = total_micros / MICROS_PER_SECOND;
    let (days, rest) = (total_seconds / 86_400, total_seconds % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    format!(
        "{days}.{hours:02}:{minutes:02}:{seconds:02}.{:06}",
        total_micros % MICROS_PER_SECOND
    )
}

/// RFC 3339 in UTC with millisecond precision.
pub(crate) fn time_to_string(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Duration::from_micros(123456789123), "1.10:17:36.789123" ; "days to micros")]
    #[test_case(Duration::from_millis(1500),         "0.00:00:01.500000" ; "sub minute")]
    #[test_case(Duration::from_secs(3 * 86_400 + 59), "3.00:00:59.000000" ; "whole days")]
    #[test_case(Duration::ZERO,                      "0.00:00:00.000000" ; "zero")]
    fn formats_duration(duration: Duration, expected: &str) {
        assert_eq!(expected, duration_to_string(duration));
    }

    #[test_case(SystemTime::UNIX_EPOCH,                                        "1970-01-01T00:00:00.000Z" ; "epoch")]
    #[test_case(SystemTime::UNIX_EPOCH + Duration::from_millis(1592736000123), "2020-06-21T10:40:00.123Z" ; "millis")]
    fn formats_time(time: SystemTime, expected: &str) {
        assert_eq!(expected, time_to_string(time));
    }
}
