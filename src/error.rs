use thiserror::Error;

/// Errors raised while parsing manifest headers, filters and versions, or
/// while assembling resources from them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Malformed clause syntax: unterminated quote, bad state at end of
    /// input, duplicate key within a clause.
    #[error("unable to parse header '{header}': {message}")]
    HeaderSyntax { header: String, message: String },

    /// Well-formed input that violates a manifest rule.
    #[error("{0}")]
    SemanticValidation(String),

    #[error("invalid filter '{filter}': {message}")]
    FilterSyntax { filter: String, message: String },

    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    #[error("invalid version range '{0}'")]
    InvalidVersionRange(String),

    /// A typed attribute value could not be converted to its declared type.
    #[error("invalid value for attribute '{name}': {message}")]
    InvalidAttribute { name: String, message: String },
}

impl ResolveError {
    pub fn header(header: &str, message: impl Into<String>) -> Self {
        Self::HeaderSyntax {
            header: header.to_string(),
            message: message.into(),
        }
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::SemanticValidation(message.into())
    }

    pub fn filter(filter: &str, message: impl Into<String>) -> Self {
        Self::FilterSyntax {
            filter: filter.to_string(),
            message: message.into(),
        }
    }

    pub fn attribute(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
