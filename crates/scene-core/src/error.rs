//! Error types for the Scene core library
//!
//! Every error here is a programmer or schema error: a malformed structure
//! tree, a hook that broke its contract, or an invalid scene catalog. None of
//! them are retried and a failure aborts the whole top-level `transform` call.
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Main error type for Scene operations
#[derive(Error, Debug)]
pub enum Error {
    /// A structure key or source field did not resolve to a string
    #[error("Invalid key in structure: expected a string, found {key} ({context})")]
    InvalidKey {
        key: String,
        context: String,
    },

    /// The single-record pre-processing hook returned a null or empty value
    #[error("Transformer '{transformer}' pre-process hook returned an empty value")]
    NullAfterPreprocess {
        transformer: String,
    },

    /// The collection pre-processing hook did not return an ordered collection
    #[error("Collection pre-process hook must return an ordered collection, found {found}")]
    InvalidCollectionHook {
        found: String,
    },

    /// A built-in value transformer could not convert its input
    #[error("Value transformation failed in {transformer}: {message}")]
    ValueTransform {
        transformer: String,
        message: String,
    },

    /// The inject hook asked for a service that was never registered
    #[error("Service not registered: {service}")]
    MissingService {
        service: String,
    },

    /// Scene catalog and structure configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Relation loader failures
    #[error("Failed to load relation '{relation}': {message}")]
    Relation {
        relation: String,
        message: String,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a configuration error without an underlying source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Build an invalid key error for a non-string JSON value
    pub fn invalid_key(key: &serde_json::Value, context: impl Into<String>) -> Self {
        Error::InvalidKey {
            key: describe_json(key),
            context: context.into(),
        }
    }
}

/// Short description of a JSON value used in error messages
pub(crate) fn describe_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => format!("boolean {}", b),
        serde_json::Value::Number(n) => format!("number {}", n),
        serde_json::Value::String(s) => format!("string \"{}\"", s),
        serde_json::Value::Array(items) => format!("array of {} items", items.len()),
        serde_json::Value::Object(map) => format!("object with {} keys", map.len()),
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
