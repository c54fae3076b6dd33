//! Runtime values.

mod time;
mod value;

pub use time::{
    Duration, Timestamp, add_duration, parse_duration, parse_timestamp, sub_duration,
    timestamp_difference,
};
pub use value::{MapKey, Value, ValueMap};

#[cfg(test)]
mod time_test;
