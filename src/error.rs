//! Error types for the estimate engine

use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RabError>;

#[derive(Debug, Error)]
pub enum RabError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed project document: {reason}")]
    MalformedDocument { reason: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: Decimal },

    #[error("{kind} id must not be empty")]
    EmptyId { kind: &'static str },

    #[error("failed to encode project document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} '{id}' already exists")]
    Duplicate { kind: &'static str, id: String },

    #[error("price list error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl RabError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RabError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        RabError::MalformedDocument {
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RabError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Reject negative amounts at the mutation boundary.
pub fn ensure_non_negative(field: &str, value: Decimal) -> Result<Decimal> {
    if !value.is_sign_negative() || value.is_zero() {
        Ok(value)
    } else {
        Err(RabError::InvalidValue {
            field: field.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_positive() {
        assert_eq!(ensure_non_negative("price", Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(
            ensure_non_negative("price", Decimal::new(125, 1)).unwrap(),
            Decimal::new(125, 1)
        );
    }

    #[test]
    fn rejects_negative() {
        assert!(matches!(
            ensure_non_negative("vol", Decimal::NEGATIVE_ONE),
            Err(RabError::InvalidValue { .. })
        ));
        assert!(ensure_non_negative("vol", Decimal::new(-1, 4)).is_err());
    }

    #[test]
    fn negative_zero_counts_as_zero() {
        let mut zero = Decimal::ZERO;
        zero.set_sign_negative(true);
        assert!(ensure_non_negative("vol", zero).is_ok());
    }

    #[test]
    fn messages_name_the_field() {
        let err = ensure_non_negative("tax_rate", Decimal::from(-3)).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for tax_rate: -3");
    }

    #[test]
    fn empty_id_is_not_a_document_error() {
        let err = RabError::EmptyId { kind: "resource" };
        assert_eq!(err.to_string(), "resource id must not be empty");
    }
}
