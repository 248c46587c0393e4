use thiserror::Error;

/// Error types for decoding, encoding and validating ZIP demographics data
#[derive(Error, Debug)]
pub enum DemographicsError {
    /// Input is not syntactically valid JSON (or ends early)
    #[error("Malformed JSON: {0}")]
    Syntax(serde_json::Error),

    /// A present field holds a value that does not match its declared type
    #[error("Type mismatch while decoding: {0}")]
    TypeCoercion(serde_json::Error),

    /// Timestamp text matched none of the accepted patterns
    #[error("Unrecognised timestamp: {0:?}")]
    TimestampParse(String),

    /// Model could not be represented as JSON
    #[error("Failed to encode JSON: {0}")]
    Encode(serde_json::Error),

    /// Request parameters failed validation
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The API envelope reported an unsuccessful status
    #[error("API returned status {status:?}: {message}")]
    Api {
        status: String,
        message: String,
        code: Option<i64>,
    },
}

impl DemographicsError {
    /// Splits a decode failure into syntax and type-coercion errors.
    pub(crate) fn from_decode(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Data => DemographicsError::TypeCoercion(err),
            Category::Syntax | Category::Eof | Category::Io => DemographicsError::Syntax(err),
        }
    }
}
