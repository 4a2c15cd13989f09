use std::{fmt::Display, io, num::ParseFloatError};

/// Custom Result type for relalg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for relalg
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Bad relation declaration in a schema file
    Schema(String),
    /// Attribute name does not resolve in the relation
    AttributeNotFound { relation: String, attribute: String },
    /// Attribute name resolves to more than one position
    AttributeAmbiguous { relation: String, attribute: String },
    /// Tuple degree differs from the relation's degree
    ArityMismatch { expected: usize, got: usize },
    /// Incompatible set operands, bad data value, or SUM/AVG over TEXT
    TypeMismatch(String),
    /// Predicate failed to parse or did not evaluate to a boolean
    InvalidExpression(String),
    /// Duplicate build key in a hash join
    UniquenessViolation(String),
    /// No aggregate function or attribute was given
    EmptyAggregationSpec,
    /// Relation is not declared in the catalog
    RelationNotFound(String),
    /// Schema or data file does not exist
    FileNotFound(String),
    /// Any other I/O failure
    Io(String),
}

impl Error {
    pub(crate) fn attribute_not_found(relation: Option<&str>, attribute: &str) -> Self {
        Error::AttributeNotFound {
            relation: relation.unwrap_or_default().to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub(crate) fn attribute_ambiguous(relation: Option<&str>, attribute: &str) -> Self {
        Error::AttributeAmbiguous {
            relation: relation.unwrap_or_default().to_string(),
            attribute: attribute.to_string(),
        }
    }
}

impl From<ParseFloatError> for Error {
    fn from(value: ParseFloatError) -> Self {
        Error::TypeMismatch(value.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound(value.to_string()),
            _ => Error::Io(value.to_string()),
        }
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Schema(err) => write!(f, "schema error {}", err),
            Error::AttributeNotFound { relation, attribute } => {
                write!(f, "attribute {} does not exist in relation {}", attribute, relation)
            }
            Error::AttributeAmbiguous { relation, attribute } => {
                write!(f, "attribute {} is ambiguous in relation {}", attribute, relation)
            }
            Error::ArityMismatch { expected, got } => {
                write!(f, "arity mismatch: expected {} values, got {}", expected, got)
            }
            Error::TypeMismatch(err) => write!(f, "type mismatch {}", err),
            Error::InvalidExpression(err) => write!(f, "invalid expression {}", err),
            Error::UniquenessViolation(err) => write!(f, "uniqueness violation {}", err),
            Error::EmptyAggregationSpec => write!(f, "no aggregation function specified"),
            Error::RelationNotFound(name) => write!(f, "relation {} does not exist", name),
            Error::FileNotFound(err) => write!(f, "file not found {}", err),
            Error::Io(err) => write!(f, "io error {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::Error;

    #[test]
    fn test_io_not_found_is_distinct() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "schema.txt").into();
        assert!(matches!(err, Error::FileNotFound(_)));

        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "schema.txt").into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_display() {
        let err = Error::attribute_ambiguous(Some("offices"), "code");
        assert_eq!(err.to_string(), "attribute code is ambiguous in relation offices");

        let err = Error::attribute_not_found(None, "city");
        assert!(err.to_string().contains("city"));
    }
}
