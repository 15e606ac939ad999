//! Integer fields filled in by the oracle.
//!
//! Function-calling models routinely emit `3.0` where a schema says integer,
//! so an integral float is accepted. Anything negative, fractional or over
//! the bound is rejected.

use serde::{Deserialize, Deserializer, de::Error};
use serde_json::Number;

pub(crate) const MAX_CONFIDENCE: u64 = 100;

fn bounded_whole(number: &Number, max: u64) -> Option<u64> {
    if let Some(n) = number.as_u64() {
        return (n <= max).then_some(n);
    }
    let f = number.as_f64()?;
    if f.fract() == 0.0 && f >= 0.0 && f <= max as f64 {
        Some(f as u64)
    } else {
        None
    }
}

pub(crate) fn whole_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let number = Number::deserialize(deserializer)?;
    bounded_whole(&number, u64::from(u32::MAX))
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative whole number of days, got {number}")))
}

pub(crate) fn confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let number = Number::deserialize(deserializer)?;
    bounded_whole(&number, MAX_CONFIDENCE)
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| D::Error::custom(format!("expected a confidence between 0 and 100, got {number}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: serde_json::Value) -> Number {
        match value {
            serde_json::Value::Number(n) => n,
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn test_bounded_whole() {
        assert_eq!(bounded_whole(&number(serde_json::json!(3)), 100), Some(3));
        assert_eq!(bounded_whole(&number(serde_json::json!(3.0)), 100), Some(3));
        assert_eq!(bounded_whole(&number(serde_json::json!(100)), 100), Some(100));
        assert_eq!(bounded_whole(&number(serde_json::json!(101)), 100), None);
        assert_eq!(bounded_whole(&number(serde_json::json!(-1)), 100), None);
        assert_eq!(bounded_whole(&number(serde_json::json!(2.5)), 100), None);
    }
}
