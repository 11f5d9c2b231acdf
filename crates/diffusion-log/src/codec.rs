//! Delimited string codec for numeric vectors.
//!
//! State vectors cross two boundaries as flat delimited strings: the hand-off
//! files exchanged with the external inference process, and the step log.
//! Encoding and decoding live here so both sides agree on the format.

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// Errors from decoding a delimited string.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input string was empty.
    #[error("cannot parse an empty string")]
    Empty,
    /// A field failed to parse as a number.
    #[error("unparseable field {field:?} at position {position}")]
    BadField { field: String, position: usize },
}

/// Join a sequence of values into a single delimited string.
///
/// Integral floats render without a trailing `.0` (`1.0` becomes `"1"`),
/// matching the log format expectations.
pub fn to_delim_str<T: Display>(values: &[T], delim: &str) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(delim)
}

/// Parse a delimited string back into a vector of values.
///
/// The inverse of [`to_delim_str`]. Surrounding whitespace on the whole
/// string is ignored; empty input is an error rather than an empty vector.
pub fn parse_delim_str<T: FromStr>(input: &str, delim: &str) -> Result<Vec<T>, CodecError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CodecError::Empty);
    }
    trimmed
        .split(delim)
        .enumerate()
        .map(|(position, field)| {
            field.trim().parse::<T>().map_err(|_| CodecError::BadField {
                field: field.to_string(),
                position,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_ints() {
        assert_eq!(to_delim_str(&[1, 2, 3], ","), "1,2,3");
        assert_eq!(to_delim_str(&[1, 3, 5], " "), "1 3 5");
    }

    #[test]
    fn test_join_integral_floats_without_point() {
        assert_eq!(to_delim_str(&[1.0f64, 0.0, 1.0], " "), "1 0 1");
    }

    #[test]
    fn test_round_trip_ints_exact() {
        let original = vec![0i64, 1, 42, -7];
        let encoded = to_delim_str(&original, ",");
        let decoded: Vec<i64> = parse_delim_str(&encoded, ",").unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_floats_within_tolerance() {
        let original = vec![0.25f64, -1.5, 0.1, 3.75];
        let encoded = to_delim_str(&original, " ");
        let decoded: Vec<f64> = parse_delim_str(&encoded, " ").unwrap();
        assert_eq!(decoded.len(), original.len());
        for (d, o) in decoded.iter().zip(original.iter()) {
            assert!((d - o).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_string_rejected() {
        let result: Result<Vec<f64>, _> = parse_delim_str("", ",");
        assert!(matches!(result, Err(CodecError::Empty)));
        let result: Result<Vec<f64>, _> = parse_delim_str("   ", ",");
        assert!(matches!(result, Err(CodecError::Empty)));
    }

    #[test]
    fn test_bad_field_reports_position() {
        let result: Result<Vec<i64>, _> = parse_delim_str("1,x,3", ",");
        match result {
            Err(CodecError::BadField { field, position }) => {
                assert_eq!(field, "x");
                assert_eq!(position, 1);
            }
            other => panic!("expected BadField, got {:?}", other),
        }
    }
}
