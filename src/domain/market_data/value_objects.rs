use crate::domain::errors::ValidationError;
use derive_more::{Constructor, Deref, DerefMut, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, From, Into, Deref, DerefMut, Constructor, Serialize, Deserialize,
)]
pub struct Price(f64);

impl Price {
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

/// Candle open time in whole seconds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    Deref,
    Constructor,
    Serialize,
    Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Converts an exchange millisecond timestamp to seconds.
    pub fn from_millis(value: u64) -> Self {
        Self(value / 1000)
    }

    /// Floors the timestamp to the start of its bucket.
    pub fn bucket_start(&self, interval: TimeInterval) -> Self {
        let step = interval.seconds();
        Self(self.0 / step * step)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct OHLC {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
}

impl OHLC {
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

/// Trading pair identifier, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
#[serde(try_from = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: &str) -> Result<Self, ValidationError> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidSymbol("Symbol cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum IntervalUnit {
    #[strum(serialize = "s")]
    #[serde(rename = "s")]
    Second,
    #[strum(serialize = "m")]
    #[serde(rename = "m")]
    Minute,
    #[strum(serialize = "h")]
    #[serde(rename = "h")]
    Hour,
    #[strum(serialize = "d")]
    #[serde(rename = "d")]
    Day,
    #[strum(serialize = "w")]
    #[serde(rename = "w")]
    Week,
    #[strum(serialize = "M")]
    #[serde(rename = "M")]
    Month,
}

impl IntervalUnit {
    pub fn seconds(&self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 60 * 60,
            Self::Day => 24 * 60 * 60,
            Self::Week => 7 * 24 * 60 * 60,
            // Calendar months are approximated as 30 days
            Self::Month => 30 * 24 * 60 * 60,
        }
    }
}

/// Candle bucket length, e.g. `15m` or `4h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "{}{}", value, unit)]
#[serde(try_from = "String", into = "String")]
pub struct TimeInterval {
    value: u32,
    unit: IntervalUnit,
}

impl TimeInterval {
    pub fn new(value: u32, unit: IntervalUnit) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::InvalidTimeInterval(
                "Interval value must be positive".to_string(),
            ));
        }
        Ok(Self { value, unit })
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    pub fn seconds(&self) -> u64 {
        self.value as u64 * self.unit.seconds()
    }

    pub fn duration_ms(&self) -> u64 {
        self.seconds() * 1000
    }

    /// Favorites offered before the user customizes anything.
    pub fn default_favorites() -> Vec<TimeInterval> {
        [(1, IntervalUnit::Minute), (5, IntervalUnit::Minute), (15, IntervalUnit::Minute)]
            .into_iter()
            .chain([(1, IntervalUnit::Hour), (4, IntervalUnit::Hour), (1, IntervalUnit::Day)])
            .map(|(value, unit)| Self { value, unit })
            .collect()
    }
}

impl FromStr for TimeInterval {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let invalid = || {
            ValidationError::InvalidTimeInterval(format!(
                "'{}' is not a valid interval. Use a positive number followed by s, m, h, d, w or M",
                raw
            ))
        };

        let digits_end = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
        let (digits, unit) = raw.split_at(digits_end);
        if digits.is_empty() || digits.starts_with('0') {
            return Err(invalid());
        }
        let value: u32 = digits.parse().map_err(|_| invalid())?;
        let unit = match unit {
            "" => IntervalUnit::Minute,
            other => other.parse::<IntervalUnit>().map_err(|_| invalid())?,
        };
        Self::new(value, unit)
    }
}

impl TryFrom<String> for TimeInterval {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeInterval> for String {
    fn from(interval: TimeInterval) -> Self {
        interval.to_string()
    }
}
