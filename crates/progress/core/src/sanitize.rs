//! Numeric coercion applied at every input boundary.
//!
//! Session results come from UI code and stats records come from a server
//! that may omit or mangle fields. Both funnel through these helpers so NaN,
//! infinities, negatives and fractions never reach level arithmetic.

/// Coerce a raw XP total: negative or non-finite values become 0.
pub fn coerce_xp(raw: f64) -> u64 {
    count(Some(raw)).unwrap_or(0)
}

/// A non-negative whole amount, or `None` when the input is missing,
/// non-finite or negative. Fractions are rounded to the nearest integer and
/// values beyond `u64::MAX` saturate.
pub fn count(raw: Option<f64>) -> Option<u64> {
    let value = raw?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    // `as` saturates on overflow
    Some(value.round() as u64)
}

/// Like [`count`], saturating into `u32`.
pub fn small_count(raw: Option<f64>) -> Option<u32> {
    count(raw).map(|value| u32::try_from(value).unwrap_or(u32::MAX))
}

/// A percentage in `0..=100`, or `None` when the input is missing or
/// non-finite. Out-of-range values are clamped.
pub fn percentage(raw: Option<f64>) -> Option<u8> {
    let value = raw?;
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, 100.0) as u8)
}

/// Lenient serde adapters for records produced by other systems.
///
/// A field that fails to parse becomes `None` instead of failing the whole
/// document, so a partially valid record is still usable.
#[cfg(feature = "serde")]
pub(crate) mod de {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberLike {
        Number(f64),
        Text(String),
        #[allow(dead_code)]
        Other(IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TimestampLike {
        Rfc3339(DateTime<Utc>),
        Millis(i64),
        #[allow(dead_code)]
        Other(IgnoredAny),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Maybe<T> {
        Valid(T),
        #[allow(dead_code)]
        Other(IgnoredAny),
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<NumberLike>::deserialize(deserializer)? {
            Some(NumberLike::Number(value)) => Some(value),
            Some(NumberLike::Text(text)) => text.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        number(deserializer).map(super::count)
    }

    pub fn small_count<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u32>, D::Error> {
        number(deserializer).map(super::small_count)
    }

    pub fn percentage<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u8>, D::Error> {
        number(deserializer).map(super::percentage)
    }

    /// RFC 3339 strings or epoch milliseconds.
    pub fn timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Option::<TimestampLike>::deserialize(deserializer)? {
            Some(TimestampLike::Rfc3339(at)) => Some(at),
            Some(TimestampLike::Millis(millis)) => Utc.timestamp_millis_opt(millis).single(),
            _ => None,
        })
    }

    pub fn maybe<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(match Option::<Maybe<T>>::deserialize(deserializer)? {
            Some(Maybe::Valid(value)) => Some(value),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_coercion_rejects_garbage() {
        assert_eq!(coerce_xp(-50.0), 0);
        assert_eq!(coerce_xp(f64::NAN), 0);
        assert_eq!(coerce_xp(f64::INFINITY), 0);
        assert_eq!(coerce_xp(42.4), 42);
        assert_eq!(coerce_xp(42.5), 43);
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        assert_eq!(count(Some(1e30)), Some(u64::MAX));
        assert_eq!(small_count(Some(1e12)), Some(u32::MAX));
        assert_eq!(count(None), None);
        assert_eq!(count(Some(-0.4)), None);
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(percentage(Some(140.0)), Some(100));
        assert_eq!(percentage(Some(-3.0)), Some(0));
        assert_eq!(percentage(Some(66.6)), Some(67));
        assert_eq!(percentage(Some(f64::NAN)), None);
    }
}
