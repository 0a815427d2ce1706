//! Coercion of parameter values to field types

use super::FieldType;
use crate::params::ParamValue;
use crate::resource::FieldValue;
use crate::{Error, Result};

const MAX_NAME_LEN: usize = 63;

/// Kubernetes quantity suffixes accepted after the integer part
const QUANTITY_SUFFIXES: &[&str] = &[
    "", "m", "k", "Ki", "M", "Mi", "G", "Gi", "T", "Ti", "P", "Pi", "E", "Ei",
];

/// Characters never valid in an image reference
const IMAGE_FORBIDDEN: &[char] = &[';', '|', '&', '$', '<', '>', '`', '\'', '"', '\\'];

impl FieldType {
    /// Description used as the `expected` side of a type mismatch
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Name => "DNS-1123 label (lowercase alphanumerics and '-', max 63)".to_string(),
            Self::Image => "container image reference".to_string(),
            Self::Count => "non-negative integer".to_string(),
            Self::Port => "port number (1-65535)".to_string(),
            Self::Bool => "boolean".to_string(),
            Self::Quantity => "positive integer quantity (e.g. 1Gi, 500m)".to_string(),
            Self::AbsolutePath => "absolute path".to_string(),
            Self::OneOf(values) => format!("one of [{}]", values.join(", ")),
            Self::StringMap => "string map".to_string(),
            Self::StringList => "string list".to_string(),
        }
    }

    /// Coerce a parameter value for the field at `field`
    pub fn coerce(&self, field: &str, value: &ParamValue) -> Result<FieldValue> {
        let mismatch = || Error::type_mismatch(field, self.describe(), value.describe());

        match self {
            Self::String => Ok(FieldValue::Str(value.to_string())),
            Self::Name => {
                let s = value.to_string();
                if is_dns_label(&s) {
                    Ok(FieldValue::Str(s))
                } else {
                    Err(mismatch())
                }
            }
            Self::Image => match value {
                ParamValue::Str(s) if is_image_reference(s) => Ok(FieldValue::Str(s.clone())),
                _ => Err(mismatch()),
            },
            Self::Count => match as_integer(value) {
                Some(i) if (0..=i64::from(i32::MAX)).contains(&i) => Ok(FieldValue::Int(i)),
                _ => Err(mismatch()),
            },
            Self::Port => match as_integer(value) {
                Some(i) if (1..=i64::from(u16::MAX)).contains(&i) => Ok(FieldValue::Int(i)),
                _ => Err(mismatch()),
            },
            Self::Bool => match value {
                ParamValue::Bool(b) => Ok(FieldValue::Bool(*b)),
                ParamValue::Str(s) if s == "true" => Ok(FieldValue::Bool(true)),
                ParamValue::Str(s) if s == "false" => Ok(FieldValue::Bool(false)),
                _ => Err(mismatch()),
            },
            Self::Quantity => match value {
                ParamValue::Int(i) if *i > 0 => Ok(FieldValue::Str(i.to_string())),
                ParamValue::Str(s) if is_positive_quantity(s) => Ok(FieldValue::Str(s.clone())),
                _ => Err(mismatch()),
            },
            Self::AbsolutePath => match value {
                ParamValue::Str(s) if s.starts_with('/') && !s.contains(char::is_whitespace) => {
                    Ok(FieldValue::Str(s.clone()))
                }
                _ => Err(mismatch()),
            },
            Self::OneOf(values) => match value {
                ParamValue::Str(s) if values.contains(&s.as_str()) => {
                    Ok(FieldValue::Str(s.clone()))
                }
                _ => Err(mismatch()),
            },
            Self::StringMap | Self::StringList => Err(mismatch()),
        }
    }
}

fn as_integer(value: &ParamValue) -> Option<i64> {
    match value {
        ParamValue::Int(i) => Some(*i),
        ParamValue::Str(s) => s.trim().parse().ok(),
        ParamValue::Bool(_) => None,
    }
}

fn is_dns_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    s.len() <= MAX_NAME_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

fn is_image_reference(s: &str) -> bool {
    !s.is_empty()
        && !s.contains(char::is_whitespace)
        && !s.contains(IMAGE_FORBIDDEN)
        && !s.starts_with(['-', ':', '/', '@'])
}

fn is_positive_quantity(s: &str) -> bool {
    let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, suffix) = s.split_at(digits_end);
    if number.is_empty() || !QUANTITY_SUFFIXES.contains(&suffix) {
        return false;
    }
    number.parse::<u64>().is_ok_and(|n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FIELD: &str = "spec.field";

    #[rstest]
    #[case::gibibytes("1Gi")]
    #[case::millicores("500m")]
    #[case::plain_bytes("1048576")]
    #[case::mebibytes("512Mi")]
    fn test_quantity_accepts(#[case] input: &str) {
        let value = FieldType::Quantity
            .coerce(FIELD, &ParamValue::from(input))
            .unwrap();
        assert_eq!(value, FieldValue::Str(input.to_string()));
    }

    #[rstest]
    #[case::zero("0Gi")]
    #[case::fractional("1.5Gi")]
    #[case::unknown_suffix("1GB")]
    #[case::suffix_only("Gi")]
    #[case::negative("-1Gi")]
    #[case::empty("")]
    fn test_quantity_rejects(#[case] input: &str) {
        let err = FieldType::Quantity
            .coerce(FIELD, &ParamValue::from(input))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref field, .. } if field == FIELD));
    }

    #[test]
    fn test_integer_quantity_renders_as_string() {
        assert_eq!(
            FieldType::Quantity.coerce(FIELD, &ParamValue::from(2)).unwrap(),
            FieldValue::Str("2".to_string())
        );
        assert!(FieldType::Quantity.coerce(FIELD, &ParamValue::from(0)).is_err());
    }

    #[rstest]
    #[case::int(ParamValue::from(3008), Some(3008))]
    #[case::numeric_string(ParamValue::from("5678"), Some(5678))]
    #[case::zero(ParamValue::from(0), None)]
    #[case::too_large(ParamValue::from(70000), None)]
    #[case::word(ParamValue::from("http"), None)]
    #[case::boolean(ParamValue::from(true), None)]
    fn test_port(#[case] input: ParamValue, #[case] expected: Option<i64>) {
        let result = FieldType::Port.coerce(FIELD, &input).ok();
        assert_eq!(result, expected.map(FieldValue::Int));
    }

    #[rstest]
    #[case::simple("n8n", true)]
    #[case::hyphenated("n8n-data", true)]
    #[case::uppercase("N8N", false)]
    #[case::leading_hyphen("-n8n", false)]
    #[case::trailing_hyphen("n8n-", false)]
    #[case::underscore("n8n_data", false)]
    #[case::empty("", false)]
    fn test_name(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(
            FieldType::Name.coerce(FIELD, &ParamValue::from(input)).is_ok(),
            ok
        );
    }

    #[test]
    fn test_name_length_limit() {
        let long = "a".repeat(64);
        assert!(FieldType::Name.coerce(FIELD, &ParamValue::from(long)).is_err());
        let max = "a".repeat(63);
        assert!(FieldType::Name.coerce(FIELD, &ParamValue::from(max)).is_ok());
    }

    #[rstest]
    #[case::registry("docker.n8n.io/n8nio/n8n:1.118.2", true)]
    #[case::digest("nginx@sha256:abc123", true)]
    #[case::whitespace("nginx latest", false)]
    #[case::shell("nginx;rm -rf /", false)]
    #[case::empty("", false)]
    fn test_image(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(
            FieldType::Image.coerce(FIELD, &ParamValue::from(input)).is_ok(),
            ok
        );
    }

    #[test]
    fn test_image_must_be_a_string() {
        assert!(FieldType::Image.coerce(FIELD, &ParamValue::from(42)).is_err());
    }

    #[test]
    fn test_string_renders_scalars_as_text() {
        assert_eq!(
            FieldType::String.coerce(FIELD, &ParamValue::from(3008)).unwrap(),
            FieldValue::Str("3008".to_string())
        );
        assert_eq!(
            FieldType::String.coerce(FIELD, &ParamValue::from(false)).unwrap(),
            FieldValue::Str("false".to_string())
        );
    }

    #[test]
    fn test_one_of_reports_allowed_values() {
        let ty = FieldType::OneOf(&["ClusterIP", "LoadBalancer"]);
        assert!(ty.coerce(FIELD, &ParamValue::from("LoadBalancer")).is_ok());
        let err = ty.coerce(FIELD, &ParamValue::from("Ingress")).unwrap_err();
        match err {
            Error::TypeMismatch { expected, got, .. } => {
                assert_eq!(expected, "one of [ClusterIP, LoadBalancer]");
                assert_eq!(got, "string \"Ingress\"");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_count_and_bool() {
        assert_eq!(
            FieldType::Count.coerce(FIELD, &ParamValue::from(0)).unwrap(),
            FieldValue::Int(0)
        );
        assert!(FieldType::Count.coerce(FIELD, &ParamValue::from(-1)).is_err());
        assert_eq!(
            FieldType::Bool.coerce(FIELD, &ParamValue::from("true")).unwrap(),
            FieldValue::Bool(true)
        );
        assert!(FieldType::Bool.coerce(FIELD, &ParamValue::from(1)).is_err());
    }

    #[test]
    fn test_absolute_path() {
        assert!(FieldType::AbsolutePath
            .coerce(FIELD, &ParamValue::from("/home/node/.n8n"))
            .is_ok());
        assert!(FieldType::AbsolutePath
            .coerce(FIELD, &ParamValue::from("data"))
            .is_err());
    }
}
