//! Temporal destinations: `std::time::Duration` and `chrono::DateTime<Utc>`.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use super::{Bind, BindContext, Shape};
use crate::error::ConversionError;
use crate::value::{Number, Value};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

const UNITS: [(&str, u128); 8] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SECOND),
    ("m", 60 * NANOS_PER_SECOND),
    ("h", 3_600 * NANOS_PER_SECOND),
];

/// Parse an interval such as `300ms`, `1.5s`, or `2h45m`.
///
/// Each component is a decimal number followed by one of `ns`, `us` (`µs`),
/// `ms`, `s`, `m`, `h`. A bare `0` is also accepted. Negative intervals are
/// rejected.
///
/// # Errors
///
/// Returns a description of the first malformed component.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use confstore::bind::parse_duration;
///
/// assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5_400)));
/// assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1_500)));
/// assert!(parse_duration("30").is_err());
/// ```
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.starts_with('-') {
        return Err(format!("negative duration `{text}`"));
    }
    if unsigned == "0" {
        return Ok(Duration::ZERO);
    }
    if unsigned.is_empty() {
        return Err("empty duration".to_owned());
    }
    let overflow = || format!("duration `{text}` overflows");
    let mut rest = unsigned;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let whole_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (whole, after_whole) = rest.split_at_checked(whole_len).unwrap_or((rest, ""));
        let (fraction, after_number) = match after_whole.strip_prefix('.') {
            Some(tail) => {
                let len = tail.bytes().take_while(u8::is_ascii_digit).count();
                tail.split_at_checked(len).unwrap_or((tail, ""))
            }
            None => ("", after_whole),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(format!("invalid duration `{text}`"));
        }
        let (unit, scale) = UNITS
            .iter()
            .filter(|(unit, _)| after_number.starts_with(unit))
            .max_by_key(|(unit, _)| unit.len())
            .ok_or_else(|| format!("missing or unknown unit in duration `{text}`"))?;
        let whole_value = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| overflow())?
        };
        total = whole_value
            .checked_mul(*scale)
            .and_then(|nanos| total.checked_add(nanos))
            .ok_or_else(overflow)?;
        total = total
            .checked_add(fraction_nanos(fraction, *scale))
            .ok_or_else(overflow)?;
        rest = after_number.strip_prefix(unit).unwrap_or_default();
    }
    let seconds = total.checked_div(NANOS_PER_SECOND).unwrap_or_default();
    let nanos = total.checked_rem(NANOS_PER_SECOND).unwrap_or_default();
    Ok(Duration::new(
        u64::try_from(seconds).map_err(|_| overflow())?,
        u32::try_from(nanos).map_err(|_| overflow())?,
    ))
}

/// Nanoseconds contributed by the fractional digits of one component.
fn fraction_nanos(fraction: &str, scale: u128) -> u128 {
    let digits = fraction.get(..fraction.len().min(18)).unwrap_or_default();
    if digits.is_empty() {
        return 0;
    }
    let numerator = digits.parse::<u128>().unwrap_or_default();
    let denominator = 10_u128.pow(u32::try_from(digits.len()).unwrap_or_default());
    numerator
        .saturating_mul(scale)
        .checked_div(denominator)
        .unwrap_or_default()
}

/// Integers are nanoseconds; floats are seconds.
fn duration_from_number(number: &Number) -> Option<Duration> {
    if let Some(nanos) = number.as_u64() {
        return Some(Duration::from_nanos(nanos));
    }
    if number.is_i64() {
        return None;
    }
    number
        .as_f64()
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
}

impl Bind for Duration {
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        *self = match value {
            Value::Null => return Ok(()),
            Value::String(text) => parse_duration(text)
                .map_err(|detail| ctx.mismatch(value, Shape::Duration).with_detail(detail))?,
            Value::Number(number) => duration_from_number(number).ok_or_else(|| {
                ctx.mismatch(value, Shape::Duration)
                    .with_detail("duration must be non-negative and finite")
            })?,
            _ => return Err(ctx.mismatch(value, Shape::Duration)),
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Duration
    }
}

/// Naive layouts, interpreted as UTC, tried after the offset-aware ones.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Parse a timestamp, trying common layouts in order, then Unix seconds.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_rfc2822(trimmed))
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f %z"))
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NAIVE_FORMATS
                .iter()
                .find_map(|layout| NaiveDateTime::parse_from_str(trimmed, layout).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            trimmed
                .parse::<Number>()
                .ok()
                .and_then(|number| timestamp_from_number(&number))
        })
}

/// Unix seconds; a fractional part becomes sub-second precision.
fn timestamp_from_number(number: &Number) -> Option<DateTime<Utc>> {
    if let Some(seconds) = number.as_i64() {
        return DateTime::from_timestamp(seconds, 0);
    }
    let seconds = number.as_f64()?;
    let magnitude = Duration::try_from_secs_f64(seconds.abs()).ok()?;
    if seconds.is_sign_negative() {
        DateTime::<Utc>::default().checked_sub_signed(TimeDelta::from_std(magnitude).ok()?)
    } else {
        DateTime::from_timestamp(
            i64::try_from(magnitude.as_secs()).ok()?,
            magnitude.subsec_nanos(),
        )
    }
}

impl Bind for DateTime<Utc> {
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        *self = match value {
            Value::Null => return Ok(()),
            Value::String(text) => parse_timestamp(text).ok_or_else(|| {
                ctx.mismatch(value, Shape::Time)
                    .with_detail(format!("`{text}` matches no known timestamp layout"))
            })?,
            Value::Number(number) => timestamp_from_number(number).ok_or_else(|| {
                ctx.mismatch(value, Shape::Time)
                    .with_detail("timestamp out of range")
            })?,
            _ => return Err(ctx.mismatch(value, Shape::Time)),
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Time
    }
}
