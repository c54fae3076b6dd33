use pretty_assertions::assert_eq;

use crate::values::{
    Duration, add_duration, parse_duration, parse_timestamp, sub_duration, timestamp_difference,
};

#[test]
fn test_duration_normalizes() {
    let d = Duration::new(1, 1_500_000_000).unwrap();
    assert_eq!((d.seconds(), d.nanos()), (2, 500_000_000));

    let d = Duration::new(1, -1_500_000_000).unwrap();
    assert_eq!((d.seconds(), d.nanos()), (0, -500_000_000));

    let d = Duration::new(-1, 500_000_000).unwrap();
    assert_eq!((d.seconds(), d.nanos()), (0, -500_000_000));
}

#[test]
fn test_duration_out_of_range() {
    assert_eq!(Duration::new(i64::MAX, 1_000_000_000), None);
    assert!(Duration::from_seconds(i64::MAX).checked_add(Duration::from_seconds(1)).is_none());
}

#[test]
fn test_duration_display() {
    assert_eq!(Duration::from_seconds(5).to_string(), "5s");
    assert_eq!(Duration::from_millis(1500).to_string(), "1.5s");
    assert_eq!(Duration::new(0, -1).unwrap().to_string(), "-0.000000001s");
    assert_eq!(Duration::from_seconds(-90).to_string(), "-90s");
}

#[test]
fn test_duration_ordering() {
    assert!(Duration::from_millis(-1) < Duration::ZERO);
    assert!(Duration::from_millis(1500) > Duration::from_seconds(1));
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("5s"), Ok(Duration::from_seconds(5)));
    assert_eq!(parse_duration("1h30m"), Ok(Duration::from_seconds(5400)));
    assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
    assert_eq!(parse_duration("-250ms"), Ok(Duration::from_millis(-250)));
    assert_eq!(parse_duration("10us"), Ok(Duration::new(0, 10_000).unwrap()));
    assert_eq!(parse_duration("7ns"), Ok(Duration::new(0, 7).unwrap()));
    assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
}

#[test]
fn test_parse_duration_rejects_garbage() {
    assert!(parse_duration("").is_err());
    assert!(parse_duration("5").is_err());
    assert!(parse_duration("5x").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("1h-").is_err());
}

#[test]
fn test_parse_duration_overflow() {
    let huge = "9".repeat(40);
    assert!(parse_duration(&format!("{}h", huge)).is_err());
    assert!(parse_duration(&format!("{}.99h", i128::MAX / 3_600_000_000_000)).is_err());
    assert!(parse_duration(&format!("{}s{}s", i64::MAX, i64::MAX)).is_err());
}

#[test]
fn test_timestamp_arithmetic() {
    let ts = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
    let later = add_duration(ts, Duration::from_seconds(5)).unwrap();
    assert_eq!(later, parse_timestamp("2024-01-01T00:00:05Z").unwrap());
    assert_eq!(sub_duration(later, Duration::from_seconds(5)), Some(ts));
    assert_eq!(
        timestamp_difference(later, ts),
        Some(Duration::from_seconds(5))
    );
    assert_eq!(
        timestamp_difference(ts, later),
        Some(Duration::from_seconds(-5))
    );
}

#[test]
fn test_timestamp_sub_second_borrow() {
    let ts = parse_timestamp("2024-01-01T00:00:00.25Z").unwrap();
    let earlier = sub_duration(ts, Duration::from_millis(500)).unwrap();
    assert_eq!(earlier, parse_timestamp("2023-12-31T23:59:59.75Z").unwrap());
}

#[test]
fn test_parse_timestamp_normalizes_offset() {
    let with_offset = parse_timestamp("2024-01-01T02:00:00+02:00").unwrap();
    let utc = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
    assert_eq!(with_offset, utc);
    assert!(parse_timestamp("yesterday").is_err());
}
