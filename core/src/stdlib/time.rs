//! Timestamp and duration accessors.
//!
//! Timestamp accessors take an optional time zone argument: `"UTC"`, `"Z"`
//! or a fixed offset such as `"+05:30"`. Month and day-of-month are
//! zero-based, `getDate` is one-based, Sunday is day 0 of the week.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use crate::evaluator::ExecutionErrorKind;
use crate::stdlib::{Builtin, no_overload};
use crate::values::Value;

pub const BUILTINS: &[Builtin] = &[
    Builtin::ranged("getFullYear", 1, 2, get_full_year),
    Builtin::ranged("getMonth", 1, 2, get_month),
    Builtin::ranged("getDayOfMonth", 1, 2, get_day_of_month),
    Builtin::ranged("getDate", 1, 2, get_date),
    Builtin::ranged("getDayOfWeek", 1, 2, get_day_of_week),
    Builtin::ranged("getDayOfYear", 1, 2, get_day_of_year),
    Builtin::ranged("getHours", 1, 2, get_hours),
    Builtin::ranged("getMinutes", 1, 2, get_minutes),
    Builtin::ranged("getSeconds", 1, 2, get_seconds),
    Builtin::ranged("getMilliseconds", 1, 2, get_milliseconds),
];

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    if matches!(zone, "UTC" | "Z" | "z") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// The timestamp argument converted to the requested zone.
fn local_time(name: &str, args: &[Value]) -> Result<DateTime<FixedOffset>, ExecutionErrorKind> {
    let Value::Timestamp(ts) = &args[0] else {
        return Err(no_overload(name, args));
    };
    let offset = match args.get(1) {
        None => FixedOffset::east_opt(0),
        Some(Value::String(zone)) => parse_offset(zone),
        Some(_) => return Err(no_overload(name, args)),
    }
    .ok_or_else(|| {
        ExecutionErrorKind::invalid_argument(name, format!("unknown time zone '{}'", args[1]))
    })?;
    Ok(ts.with_timezone(&offset))
}

fn timestamp_only(
    name: &str,
    args: &[Value],
    field: fn(&DateTime<FixedOffset>) -> i64,
) -> Result<Value, ExecutionErrorKind> {
    local_time(name, args).map(|local| Value::Int(field(&local)))
}

// ============================================================================
// Calendar
// ============================================================================

fn get_full_year(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    timestamp_only("getFullYear", args, |t| i64::from(t.year()))
}

fn get_month(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    timestamp_only("getMonth", args, |t| i64::from(t.month0()))
}

fn get_day_of_month(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    timestamp_only("getDayOfMonth", args, |t| i64::from(t.day0()))
}

fn get_date(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    timestamp_only("getDate", args, |t| i64::from(t.day()))
}

fn get_day_of_week(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    timestamp_only("getDayOfWeek", args, |t| {
        i64::from(t.weekday().num_days_from_sunday())
    })
}

fn get_day_of_year(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    timestamp_only("getDayOfYear", args, |t| i64::from(t.ordinal0()))
}

// ============================================================================
// Clock
// ============================================================================
//
// On durations these return the whole duration in the unit, except
// `getMilliseconds` which returns the sub-second part.

fn clock(
    name: &str,
    args: &[Value],
    of_timestamp: fn(&DateTime<FixedOffset>) -> i64,
    of_duration: fn(&crate::values::Duration) -> i64,
) -> Result<Value, ExecutionErrorKind> {
    match args {
        [Value::Duration(d)] => Ok(Value::Int(of_duration(d))),
        _ => timestamp_only(name, args, of_timestamp),
    }
}

fn get_hours(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    clock("getHours", args, |t| i64::from(t.hour()), |d| d.hours())
}

fn get_minutes(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    clock("getMinutes", args, |t| i64::from(t.minute()), |d| d.minutes())
}

fn get_seconds(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    clock("getSeconds", args, |t| i64::from(t.second()), |d| d.seconds())
}

fn get_milliseconds(args: &[Value]) -> Result<Value, ExecutionErrorKind> {
    clock(
        "getMilliseconds",
        args,
        |t| i64::from(t.timestamp_subsec_millis()),
        |d| i64::from(d.nanos() / 1_000_000),
    )
}
