//! Error types for schema generation.

use thiserror::Error;

/// Main error type for ingestion and generation.
#[derive(Error, Debug)]
pub enum GenError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A captured catalog dump contained no data at all.
    #[error("Catalog dump '{dump}' is empty")]
    EmptyDump { dump: &'static str },

    /// A captured catalog dump lacks columns required by the row contract.
    #[error("Catalog dump '{dump}' is missing required columns: {}", columns.join(", "))]
    MissingColumns {
        dump: &'static str,
        columns: Vec<String>,
    },

    /// A row in a catalog dump could not be interpreted.
    #[error("Malformed row {line} in catalog dump '{dump}': {message}")]
    MalformedRow {
        dump: &'static str,
        line: u64,
        message: String,
    },

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Catalog query failed in the live executor
    #[error("Catalog query failed: {message}\n  Context: {context}")]
    Catalog { message: String, context: String },

    /// No model has a primary key, so the builder document can't identify any model.
    #[error("Cannot generate the schema builder document: none of the {0} models has a primary key")]
    NoPrimaryKey(usize),

    /// Both table filters were supplied in the configuration type.
    #[error("Invalid table filter: 'include' and 'exclude' cannot both be specified")]
    ConflictingFilters,

    /// A table filter did not have the expected literal shape.
    #[error("Invalid table filter '{key}': {message}")]
    InvalidFilter { key: String, message: String },

    /// Enum values that are not legal schema identifiers.
    #[error("Enum {name} has values that are not valid identifiers: {}", values.join(", "))]
    InvalidEnumValues { name: String, values: Vec<String> },

    /// The previously generated document could not be parsed.
    #[error("Failed to parse existing schema document at line {line}: {message}")]
    IdlParse { line: usize, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenError {
    /// Create a Catalog error with context about where it occurred
    pub fn catalog(message: impl ToString, context: impl Into<String>) -> Self {
        GenError::Catalog {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a MalformedRow error
    pub fn malformed(dump: &'static str, line: u64, message: impl Into<String>) -> Self {
        GenError::MalformedRow {
            dump,
            line,
            message: message.into(),
        }
    }

    /// Create an IdlParse error
    pub fn idl(line: usize, message: impl Into<String>) -> Self {
        GenError::IdlParse {
            line,
            message: message.into(),
        }
    }

    /// Process exit code for the CLI.
    ///
    /// 1 = generation failure, 2 = bad input or configuration, 3 = IO/catalog access.
    pub fn exit_code(&self) -> u8 {
        match self {
            GenError::Config(_)
            | GenError::EmptyDump { .. }
            | GenError::MissingColumns { .. }
            | GenError::MalformedRow { .. }
            | GenError::Csv(_)
            | GenError::ConflictingFilters
            | GenError::InvalidFilter { .. }
            | GenError::IdlParse { .. }
            | GenError::Yaml(_)
            | GenError::Json(_) => 2,
            GenError::Io(_) | GenError::Catalog { .. } => 3,
            GenError::NoPrimaryKey(_) | GenError::InvalidEnumValues { .. } => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenError>;
