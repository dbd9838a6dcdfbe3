//! Lenient JSON codecs for backend amounts, rates, quantities and dates.
//!
//! The backend returns decimals as numbers or strings (`900`, `"900.00"`),
//! sends `""` for unset selects and appends a time to some dates. Amounts
//! follow the form's coercion rules: blank or null reads as zero.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::money::{parse_fixed, Money};
use crate::types::{Quantity, Rate};

// =============================================================================
// Fixed-point decimal visitor
// =============================================================================

struct DecimalVisitor<T> {
    decimals: u32,
    make: fn(i64) -> T,
    from_float: fn(f64) -> T,
}

impl<'de, T> Visitor<'de> for DecimalVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        let scaled = v
            .checked_mul(10_i64.pow(self.decimals))
            .ok_or_else(|| E::custom("number out of range"))?;
        Ok((self.make)(scaled))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        let v = i64::try_from(v).map_err(|_| E::custom("number out of range"))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<T, E> {
        Ok((self.from_float)(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        if v.trim().is_empty() {
            return Ok((self.make)(0));
        }
        parse_fixed(v, self.decimals)
            .map(self.make)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<T, E> {
        Ok((self.make)(0))
    }

    fn visit_none<E: de::Error>(self) -> Result<T, E> {
        Ok((self.make)(0))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<T, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor {
            decimals: 2,
            make: Money::from_cents,
            from_float: Money::from_major_f64,
        })
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major_f64())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor {
            decimals: 6,
            make: Rate::from_micros,
            from_float: Rate::from_f64,
        })
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor {
            decimals: 3,
            make: Quantity::from_millis,
            from_float: Quantity::from_f64,
        })
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

// =============================================================================
// Field helpers
// =============================================================================

/// `""` and `null` become `None`; anything else must parse.
pub(crate) fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time (`T…`), or blank.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default)]
        amount: Money,
        #[serde(default, deserialize_with = "lenient_date")]
        date: Option<NaiveDate>,
    }

    #[test]
    fn test_money_accepts_numbers_and_strings() {
        let cases = [
            (json!(900), 90_000),
            (json!(12.5), 1_250),
            (json!("1,250.50"), 125_050),
            (json!(""), 0),
            (json!(null), 0),
        ];
        for (value, cents) in cases {
            let money: Money = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(money.cents(), cents, "decoding {value}");
        }
    }

    #[test]
    fn test_money_rejects_garbage() {
        assert!(serde_json::from_value::<Money>(json!("12abc")).is_err());
    }

    #[test]
    fn test_money_serializes_major_units() {
        assert_eq!(serde_json::to_value(Money::from_cents(90_050)).unwrap(), json!(900.5));
    }

    #[test]
    fn test_missing_fields_default() {
        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert_eq!(row.amount, Money::zero());
        assert_eq!(row.date, None);

        let row: Row = serde_json::from_value(json!({"date": "2024-02-29 10:00:00"})).unwrap();
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 2, 29));
    }
}
