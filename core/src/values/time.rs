//! Timestamps and durations.

use core::fmt;

use chrono::{DateTime, Utc};

/// A point in time, with nanosecond precision, always in UTC.
pub type Timestamp = DateTime<Utc>;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// A signed span of time.
///
/// Always normalized: `nanos` lies in `-999_999_999..=999_999_999` and never
/// has the opposite sign of `seconds`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Duration {
    seconds: i64,
    nanos: i32,
}

impl Duration {
    pub const ZERO: Duration = Duration {
        seconds: 0,
        nanos: 0,
    };

    /// Build a duration from seconds plus an arbitrary nanosecond offset.
    ///
    /// Returns `None` when the result does not fit in `i64` seconds.
    pub fn new(seconds: i64, nanos: i64) -> Option<Self> {
        Self::from_nanos(i128::from(seconds) * NANOS_PER_SECOND + i128::from(nanos))
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis / 1000,
            nanos: ((millis % 1000) * 1_000_000) as i32,
        }
    }

    pub fn from_nanos(total: i128) -> Option<Self> {
        let seconds = i64::try_from(total / NANOS_PER_SECOND).ok()?;
        let nanos = (total % NANOS_PER_SECOND) as i32;
        Some(Self { seconds, nanos })
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    pub fn total_nanos(&self) -> i128 {
        i128::from(self.seconds) * NANOS_PER_SECOND + i128::from(self.nanos)
    }

    pub fn is_negative(&self) -> bool {
        self.seconds < 0 || self.nanos < 0
    }

    pub fn checked_add(self, other: Duration) -> Option<Duration> {
        Self::from_nanos(self.total_nanos() + other.total_nanos())
    }

    pub fn checked_sub(self, other: Duration) -> Option<Duration> {
        Self::from_nanos(self.total_nanos() - other.total_nanos())
    }

    pub fn checked_neg(self) -> Option<Duration> {
        Self::from_nanos(-self.total_nanos())
    }

    /// Whole hours, truncated toward zero.
    pub fn hours(&self) -> i64 {
        self.seconds / 3600
    }

    pub fn minutes(&self) -> i64 {
        self.seconds / 60
    }

    pub fn millis(&self) -> i64 {
        (self.total_nanos() / 1_000_000) as i64
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.total_nanos().cmp(&other.total_nanos())
    }
}

/// Renders as decimal seconds, e.g. `5s`, `1.5s`, `-0.000000001s`.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-")?;
        }
        let seconds = self.seconds.unsigned_abs();
        let nanos = self.nanos.unsigned_abs();
        if nanos == 0 {
            write!(f, "{}s", seconds)
        } else {
            let fraction = format!("{:09}", nanos);
            write!(f, "{}.{}s", seconds, fraction.trim_end_matches('0'))
        }
    }
}

/// Parse a duration string such as `"1h30m"`, `"1.5s"` or `"-250ms"`.
///
/// Accepted units are `h`, `m`, `s`, `ms`, `us` (or `µs`) and `ns`. A bare
/// `"0"` is also accepted.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration '{}'", text);

    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let frac_part = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                rest = &after_dot[frac_len..];
                &after_dot[..frac_len]
            }
            None => "",
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let unit = unit_nanos(&rest[..unit_len]).ok_or_else(invalid)?;
        rest = &rest[unit_len..];

        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut amount = whole.checked_mul(unit).ok_or_else(invalid)?;

        // Digits past 18 cannot change the result at nanosecond resolution.
        let frac_digits = &frac_part[..frac_part.len().min(18)];
        if !frac_digits.is_empty() {
            let numerator: i128 = frac_digits.parse().map_err(|_| invalid())?;
            let scale = 10i128.pow(frac_digits.len() as u32);
            let fraction = numerator.checked_mul(unit).ok_or_else(invalid)? / scale;
            amount = amount.checked_add(fraction).ok_or_else(invalid)?;
        }

        total = total.checked_add(amount).ok_or_else(invalid)?;
    }

    if negative {
        total = -total;
    }
    Duration::from_nanos(total).ok_or_else(invalid)
}

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "h" => Some(3600 * NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "s" => Some(NANOS_PER_SECOND),
        "ms" => Some(1_000_000),
        "us" | "µs" => Some(1_000),
        "ns" => Some(1),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp, normalizing any offset to UTC.
pub fn parse_timestamp(text: &str) -> Result<Timestamp, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", text, e))
}

fn timestamp_nanos(ts: &Timestamp) -> i128 {
    i128::from(ts.timestamp()) * NANOS_PER_SECOND + i128::from(ts.timestamp_subsec_nanos())
}

fn timestamp_from_nanos(total: i128) -> Option<Timestamp> {
    let seconds = i64::try_from(total.div_euclid(NANOS_PER_SECOND)).ok()?;
    let nanos = total.rem_euclid(NANOS_PER_SECOND) as u32;
    DateTime::from_timestamp(seconds, nanos)
}

/// `ts + d`, or `None` when the result leaves the representable range.
pub fn add_duration(ts: Timestamp, d: Duration) -> Option<Timestamp> {
    timestamp_from_nanos(timestamp_nanos(&ts) + d.total_nanos())
}

pub fn sub_duration(ts: Timestamp, d: Duration) -> Option<Timestamp> {
    timestamp_from_nanos(timestamp_nanos(&ts) - d.total_nanos())
}

/// `a - b` as a duration.
pub fn timestamp_difference(a: Timestamp, b: Timestamp) -> Option<Duration> {
    Duration::from_nanos(timestamp_nanos(&a) - timestamp_nanos(&b))
}
