//! Process-local wall clock helpers.
//!
//! All scheduling happens on naive local date-times truncated to whole
//! seconds, which is also the precision written to the announcement store.

use chrono::{Local, NaiveDateTime, SubsecRound, TimeZone, Utc};

/// Current local time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Unix timestamp of a local date-time.
///
/// Local times that do not exist (DST gaps) are read as UTC.
pub fn unix_timestamp(at: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&at)
        .earliest()
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| Utc.from_utc_datetime(&at).timestamp())
}

/// Discord full date-time markup (`<t:UNIX:F>`) for `at + offset`.
pub fn discord_timestamp(at: NaiveDateTime, offset: chrono::Duration) -> String {
    format!("<t:{}:F>", unix_timestamp(at + offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Timelike};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn test_discord_timestamp_zero_offset() {
        let expected = format!("<t:{}:F>", unix_timestamp(noon()));
        assert_eq!(discord_timestamp(noon(), Duration::zero()), expected);
    }

    #[test]
    fn test_discord_timestamp_with_offsets() {
        let base = unix_timestamp(noon());
        assert_eq!(
            discord_timestamp(noon(), Duration::minutes(15)),
            format!("<t:{}:F>", base + 900)
        );
        assert_eq!(
            discord_timestamp(noon(), Duration::minutes(-30)),
            format!("<t:{}:F>", base - 1800)
        );
        assert_eq!(
            discord_timestamp(noon(), Duration::seconds(30)),
            format!("<t:{}:F>", base + 30)
        );
    }
}
