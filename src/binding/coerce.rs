//! Conversion of raw parameter text into typed field values.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::num::IntErrorKind;
use std::time::Duration;

use super::slot::Target;

/// OpenAPI `type`/`format` pair reported for a parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSchema {
    pub ty: &'static str,
    pub format: Option<&'static str>,
}

impl ParamSchema {
    pub const STRING: ParamSchema = ParamSchema::string(None);

    #[must_use]
    pub const fn new(ty: &'static str, format: Option<&'static str>) -> Self {
        ParamSchema { ty, format }
    }

    #[must_use]
    pub const fn string(format: Option<&'static str>) -> Self {
        ParamSchema::new("string", format)
    }
}

/// Failure to convert one raw value into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoerceError {
    /// The field cannot be written, e.g. a borrowed `&str` field.
    Unaddressable { type_name: &'static str },
    UnsupportedType { type_name: &'static str },
    InvalidSyntax { value: String, type_name: &'static str },
    OutOfRange { value: String, type_name: &'static str },
    InvalidDuration { value: String },
    Count { expected: usize, got: usize },
    /// Verbatim message of a text parser.
    Text(String),
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoerceError::Unaddressable { type_name } => {
                write!(f, "unaddressable value of type {}", type_name)
            }
            CoerceError::UnsupportedType { type_name } => {
                write!(f, "unsupported parameter type: {}", type_name)
            }
            CoerceError::InvalidSyntax { value, type_name } => {
                write!(f, "parsing \"{}\" as {}: invalid syntax", value, type_name)
            }
            CoerceError::OutOfRange { value, type_name } => {
                write!(f, "parsing \"{}\" as {}: value out of range", value, type_name)
            }
            CoerceError::InvalidDuration { value } => write!(f, "invalid duration \"{}\"", value),
            CoerceError::Count { expected, got } => {
                write!(f, "parameter expect {} values, got {}", expected, got)
            }
            CoerceError::Text(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CoerceError {}

/// Types that can be parsed from a single query, path or header value.
///
/// Implement this for your own types to make them bindable; the schema hint
/// is what the OpenAPI generator reports for the parameter.
pub trait FromParam: Sized {
    const SCHEMA: ParamSchema;

    fn from_param(raw: &str) -> Result<Self, CoerceError>;
}

/// Convert `raw` and write it through `target`.
///
/// This is the single-value entry point shared by the binder and by callers
/// binding values by hand.
pub fn bind_string_value(raw: &str, target: &mut (dyn Target + '_)) -> Result<(), CoerceError> {
    let values = [raw.to_string()];
    target.assign(&values)
}

impl FromParam for String {
    const SCHEMA: ParamSchema = ParamSchema::STRING;

    fn from_param(raw: &str) -> Result<Self, CoerceError> {
        Ok(raw.to_string())
    }
}

macro_rules! from_param_int {
    ($($ty:ty => $format:expr),* $(,)?) => {$(
        impl FromParam for $ty {
            const SCHEMA: ParamSchema = ParamSchema::new("integer", Some($format));

            fn from_param(raw: &str) -> Result<Self, CoerceError> {
                raw.parse::<$ty>().map_err(|err| match err.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => CoerceError::OutOfRange {
                        value: raw.to_string(),
                        type_name: stringify!($ty),
                    },
                    _ => CoerceError::InvalidSyntax {
                        value: raw.to_string(),
                        type_name: stringify!($ty),
                    },
                })
            }
        }
    )*};
}

from_param_int!(
    i8 => "int32", i16 => "int32", i32 => "int32", i64 => "int64", isize => "int64",
    u8 => "int32", u16 => "int32", u32 => "int64", u64 => "int64", usize => "int64",
);

impl FromParam for bool {
    const SCHEMA: ParamSchema = ParamSchema::new("boolean", None);

    fn from_param(raw: &str) -> Result<Self, CoerceError> {
        match raw {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(CoerceError::InvalidSyntax {
                value: raw.to_string(),
                type_name: "bool",
            }),
        }
    }
}

fn parse_float(raw: &str, type_name: &'static str) -> Result<f64, CoerceError> {
    let value = raw.parse::<f64>().map_err(|_| CoerceError::InvalidSyntax {
        value: raw.to_string(),
        type_name,
    })?;
    // Rust saturates overflowing literals to infinity instead of failing.
    if value.is_infinite() && !raw.to_ascii_lowercase().contains("inf") {
        return Err(CoerceError::OutOfRange {
            value: raw.to_string(),
            type_name,
        });
    }
    Ok(value)
}

impl FromParam for f64 {
    const SCHEMA: ParamSchema = ParamSchema::new("number", Some("double"));

    fn from_param(raw: &str) -> Result<Self, CoerceError> {
        parse_float(raw, "f64")
    }
}

impl FromParam for f32 {
    const SCHEMA: ParamSchema = ParamSchema::new("number", Some("float"));

    fn from_param(raw: &str) -> Result<Self, CoerceError> {
        let value = parse_float(raw, "f32")?;
        if value.is_finite() && value.abs() > f64::from(f32::MAX) {
            return Err(CoerceError::OutOfRange {
                value: raw.to_string(),
                type_name: "f32",
            });
        }
        raw.parse::<f32>().map_err(|_| CoerceError::InvalidSyntax {
            value: raw.to_string(),
            type_name: "f32",
        })
    }
}

impl FromParam for Duration {
    const SCHEMA: ParamSchema = ParamSchema::string(Some("duration"));

    fn from_param(raw: &str) -> Result<Self, CoerceError> {
        parse_duration(raw)
    }
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    })
}

/// Parse a duration string such as `"1h30m"`, `"1.5s"` or `"250ms"`.
///
/// A bare `"0"` is accepted; every other number needs a unit. Negative
/// durations are rejected since [`Duration`] is unsigned.
pub fn parse_duration(raw: &str) -> Result<Duration, CoerceError> {
    let invalid = || CoerceError::InvalidDuration {
        value: raw.to_string(),
    };

    let mut rest = raw.strip_prefix('+').unwrap_or(raw);
    if let Some(negative) = rest.strip_prefix('-') {
        return if negative == "0" {
            Ok(Duration::ZERO)
        } else {
            Err(invalid())
        };
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_end);
        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(frac) => {
                let frac_end = frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
                frac.split_at(frac_end)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_end = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, remainder) = after_number.split_at(unit_end);
        let scale = unit_nanos(unit).ok_or_else(invalid)?;

        let whole = if int_part.is_empty() {
            0
        } else {
            int_part.parse::<u128>().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;
        if !frac_part.is_empty() {
            let fraction = format!("0.{}", frac_part).parse::<f64>().map_err(|_| invalid())?;
            nanos += (fraction * scale as f64).round() as u128;
        }
        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = remainder;
    }

    if total > i64::MAX as u128 {
        return Err(CoerceError::OutOfRange {
            value: raw.to_string(),
            type_name: "Duration",
        });
    }
    Ok(Duration::from_nanos(total as u64))
}

macro_rules! from_param_text {
    ($($ty:ty => $format:expr),* $(,)?) => {$(
        impl FromParam for $ty {
            const SCHEMA: ParamSchema = ParamSchema::string($format);

            fn from_param(raw: &str) -> Result<Self, CoerceError> {
                raw.parse::<$ty>().map_err(|err| CoerceError::Text(err.to_string()))
            }
        }
    )*};
}

from_param_text!(
    IpAddr => Some("ip"),
    Ipv4Addr => Some("ipv4"),
    Ipv6Addr => Some("ipv6"),
    SocketAddr => None,
    ulid::Ulid => Some("ulid"),
    url::Url => Some("uri"),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_width_is_checked() {
        assert_eq!(i8::from_param("120").unwrap(), 120);
        assert!(matches!(
            i8::from_param("300"),
            Err(CoerceError::OutOfRange { .. })
        ));
        assert!(matches!(
            i8::from_param("-129"),
            Err(CoerceError::OutOfRange { .. })
        ));
        assert_eq!(i64::from_param("-42").unwrap(), -42);
    }

    #[test]
    fn test_unsigned_rejects_sign_and_garbage() {
        assert_eq!(u16::from_param("65535").unwrap(), u16::MAX);
        assert!(u16::from_param("65536").is_err());
        assert!(matches!(
            u8::from_param("-1"),
            Err(CoerceError::InvalidSyntax { .. })
        ));
        assert!(u32::from_param("12a").is_err());
    }

    #[test]
    fn test_bool_vocabulary() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(bool::from_param(raw).unwrap(), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!bool::from_param(raw).unwrap(), "{raw}");
        }
        assert!(bool::from_param("yes").is_err());
        assert!(bool::from_param("tRuE").is_err());
    }

    #[test]
    fn test_float_ranges() {
        assert_eq!(f64::from_param("1.5").unwrap(), 1.5);
        assert_eq!(f32::from_param("0.25").unwrap(), 0.25);
        assert!(matches!(
            f32::from_param("1e39"),
            Err(CoerceError::OutOfRange { .. })
        ));
        assert!(matches!(
            f64::from_param("1e400"),
            Err(CoerceError::OutOfRange { .. })
        ));
        assert!(f64::from_param("inf").unwrap().is_infinite());
        assert!(f64::from_param("one").is_err());
    }

    #[test]
    fn test_duration_grammar() {
        assert_eq!(
            Duration::from_param("1h30m").unwrap(),
            Duration::from_secs(90 * 60)
        );
        assert_eq!(
            Duration::from_param("1.5s").unwrap(),
            Duration::from_millis(1500)
        );
        assert_eq!(
            Duration::from_param("250ms").unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(
            Duration::from_param("3µs").unwrap(),
            Duration::from_micros(3)
        );
        assert_eq!(Duration::from_param("0").unwrap(), Duration::ZERO);
        assert_eq!(Duration::from_param(".5m").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_durations() {
        for raw in ["", "10", "1x", "h", "1h30", "-1s", "1..5s"] {
            assert!(
                matches!(
                    Duration::from_param(raw),
                    Err(CoerceError::InvalidDuration { .. })
                ),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_text_types_keep_parser_message() {
        let ip = IpAddr::from_param("10.0.0.1").unwrap();
        assert_eq!(ip.to_string(), "10.0.0.1");
        let err = Ipv4Addr::from_param("10.0.0").unwrap_err();
        assert_eq!(err, CoerceError::Text("invalid IPv4 address syntax".to_string()));
        assert!(ulid::Ulid::from_param("01ARZ3NDEKTSV4RRFFQ69G5FAV").is_ok());
        assert!(url::Url::from_param("not a url").is_err());
    }
}
