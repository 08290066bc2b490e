//! Countdown to the end of an offer window.
//!
//! [`time_remaining`] is pure; callers tick it from their own scheduler.

use chrono::NaiveDateTime;

use crate::{Error, Result};

const MS_PER_SEC: i64 = 1_000;
const MS_PER_MIN: i64 = 60 * MS_PER_SEC;
const MS_PER_HOUR: i64 = 60 * MS_PER_MIN;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Timestamp format accepted for countdown targets, e.g. `2026-01-12T23:59:59`.
pub const TARGET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Whole days, hours, minutes and seconds left until a target instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub mins: i64,
    pub secs: i64,
}

impl TimeRemaining {
    pub const ZERO: Self = Self {
        days: 0,
        hours: 0,
        mins: 0,
        secs: 0,
    };

    pub fn is_expired(&self) -> bool {
        *self == Self::ZERO
    }
}

impl std::fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.mins, self.secs
        )
    }
}

/// Split the distance between `now` and `target` into calendar units.
///
/// Each unit is floored. Once `now` reaches `target` the result stays at
/// [`TimeRemaining::ZERO`].
pub fn time_remaining(target: NaiveDateTime, now: NaiveDateTime) -> TimeRemaining {
    let distance = (target - now).num_milliseconds();
    if distance <= 0 {
        return TimeRemaining::ZERO;
    }
    TimeRemaining {
        days: distance / MS_PER_DAY,
        hours: (distance % MS_PER_DAY) / MS_PER_HOUR,
        mins: (distance % MS_PER_HOUR) / MS_PER_MIN,
        secs: (distance % MS_PER_MIN) / MS_PER_SEC,
    }
}

/// Parse a countdown target in [`TARGET_FORMAT`].
pub fn parse_target(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input.trim(), TARGET_FORMAT).map_err(|source| {
        Error::InvalidTimestamp {
            input: input.to_string(),
            source,
        }
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::Duration, rstest::rstest};

    fn at(s: &str) -> NaiveDateTime {
        parse_target(s).unwrap()
    }

    #[rstest]
    #[case("2026-01-12T23:59:58", TimeRemaining { days: 0, hours: 0, mins: 0, secs: 1 })]
    #[case("2026-01-12T22:58:57", TimeRemaining { days: 0, hours: 1, mins: 1, secs: 2 })]
    #[case("2026-01-05T00:00:00", TimeRemaining { days: 7, hours: 23, mins: 59, secs: 59 })]
    fn splits_distance_into_units(#[case] now: &str, #[case] expected: TimeRemaining) {
        let target = at("2026-01-12T23:59:59");
        assert_eq!(time_remaining(target, at(now)), expected);
    }

    #[test]
    fn floors_partial_seconds() {
        let target = at("2026-01-12T23:59:59");
        let now = target - Duration::milliseconds(1_999);
        assert_eq!(time_remaining(target, now).secs, 1);
    }

    #[test]
    fn past_target_is_expired() {
        let target = at("2026-01-12T23:59:59");
        let remaining = time_remaining(target, at("2026-02-01T00:00:00"));
        assert!(remaining.is_expired());
        assert!(time_remaining(target, target).is_expired());
    }

    #[test]
    fn display_pads_units() {
        let r = TimeRemaining {
            days: 3,
            hours: 4,
            mins: 5,
            secs: 6,
        };
        assert_eq!(r.to_string(), "3d 04h 05m 06s");
    }

    #[test]
    fn rejects_malformed_target() {
        let err = parse_target("next tuesday").unwrap_err();
        assert!(err.to_string().contains("next tuesday"));
    }
}
