use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Shown wherever a rating, average or note is missing.
pub const PLACEHOLDER: &str = "—";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rating {
    Bad = 1,
    NotBad = 2,
    Good = 3,
    VeryGood = 4,
    Excellent = 5,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::Bad,
        Rating::NotBad,
        Rating::Good,
        Rating::VeryGood,
        Rating::Excellent,
    ];

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Rating::Bad),
            2 => Some(Rating::NotBad),
            3 => Some(Rating::Good),
            4 => Some(Rating::VeryGood),
            5 => Some(Rating::Excellent),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Bad => "Bad",
            Rating::NotBad => "Not bad",
            Rating::Good => "Good",
            Rating::VeryGood => "Very Good",
            Rating::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value(), self.label())
    }
}

impl TryFrom<i64> for Rating {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rating::from_value(value)
            .ok_or_else(|| format!("rating {value} outside {MIN_RATING}..={MAX_RATING}"))
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Rating::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Coerces raw form input into the rating scale.
///
/// Numeric input is truncated toward zero and then clamped into `1..=5`, so
/// `6` becomes `5`, `0` becomes `1` and `4.9` becomes `4`. Missing input and
/// NaN carry no rating and yield `None`.
pub fn clamp_rating(input: Option<f64>) -> Option<Rating> {
    let value = input?;
    if value.is_nan() {
        return None;
    }
    let clamped = value
        .trunc()
        .clamp(f64::from(MIN_RATING), f64::from(MAX_RATING));
    Rating::from_value(clamped as i64)
}

/// Label for a single stored value. Out-of-scale numbers are echoed back
/// rather than rejected.
pub fn format_rating(value: Option<f64>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    if value.is_nan() {
        return PLACEHOLDER.to_string();
    }
    if value.fract() == 0.0 {
        if let Some(rating) = Rating::from_value(value as i64) {
            return rating.label().to_string();
        }
    }
    numeral(value)
}

/// Label for a backend average: rounded to the nearest rating, then labelled.
pub fn format_average(average: Option<f64>) -> String {
    match average {
        Some(avg) if !avg.is_nan() => {
            let rounded = avg
                .round()
                .clamp(f64::from(MIN_RATING), f64::from(MAX_RATING));
            format_rating(Some(rounded))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// The average itself with two decimals, e.g. `3.60`.
pub fn format_average_value(average: Option<f64>) -> String {
    match average {
        Some(avg) if avg.is_finite() => format!("{avg:.2}"),
        _ => PLACEHOLDER.to_string(),
    }
}

fn numeral(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}
