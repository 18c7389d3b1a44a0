use crate::time::error::Error;
use core::str::FromStr;
use lazy_static::*;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref DURATION_REGEX: Regex =
        Regex::new(r"^\s*(?P<value>\d+)\s*(?P<unit>[a-z]*)\s*$").expect("Regex compilation error");
}

/// Duration written as `<value><unit>`, e.g. `250ms` or `10s`.
/// A bare number is read as seconds.
#[derive(Debug, PartialEq)]
pub struct DurationUnit {
    value: u64,
    unit: TimeUnit,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
}

impl TimeUnit {
    fn millis(self) -> u64 {
        match self {
            TimeUnit::Millisecond => 1,
            TimeUnit::Second => 1_000,
            TimeUnit::Minute => 60_000,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ms" | "millis" | "millisecond" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Second),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Minute),
            other => Err(Error::UnitNotSupported(other.to_owned())),
        }
    }
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_REGEX
            .captures(s)
            .ok_or_else(|| Error::Syntax(s.to_owned()))?;
        let value = caps["value"]
            .parse::<u64>()
            .map_err(|_| Error::Overflow(s.to_owned()))?;
        let unit = caps["unit"].parse::<TimeUnit>()?;
        value
            .checked_mul(unit.millis())
            .ok_or_else(|| Error::Overflow(s.to_owned()))?;
        Ok(Self { value, unit })
    }
}

impl From<DurationUnit> for Duration {
    fn from(duration: DurationUnit) -> Self {
        Duration::from_millis(duration.value * duration.unit.millis())
    }
}

/// Parses `value` straight into a [`Duration`].
pub fn parse_duration(value: &str) -> Result<Duration, Error> {
    value.parse::<DurationUnit>().map(Duration::from)
}
