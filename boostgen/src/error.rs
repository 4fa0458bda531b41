//! Error types for boostgen.
//!
//! Every error aborts generation: there is no partial or best-effort output.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for boostgen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading inputs, sealing declarations or generating code.
#[derive(Error, Debug)]
pub enum Error {
    /// No classification rule matched a C type. The field or function has to be
    /// excluded upstream (see [`crate::Filter`]) or declared differently.
    #[error("unknown type of `{name}`: `{c_type}`")]
    UnknownType { name: String, c_type: String },

    /// A declaration contradicts the header or another declaration.
    #[error("invalid declaration in {unit}: {message}")]
    Declaration { unit: String, message: String },

    /// A configured entity is not present in the header (or was filtered out).
    #[error("{kind} `{name}` not found in header")]
    MissingEntity { kind: &'static str, name: String },

    /// A unit references a struct or handle which is not generated with the
    /// required conversion direction.
    #[error("{unit} depends on `{dependency}`: {reason}")]
    MissingDependency {
        unit: String,
        dependency: String,
        reason: String,
    },

    /// Functions with more than one output are not implemented.
    #[error("function `{function}` has more than one output")]
    MultipleOutputs { function: String },

    /// The shape of a field or parameter is recognized but cannot be converted in the
    /// requested direction.
    #[error("unsupported in {unit}: {message}")]
    Unsupported { unit: String, message: String },

    /// A function type string is not of the form `<ReturnType> (<params>)`.
    #[error("invalid signature of function `{function}`: `{signature}`")]
    InvalidSignature { function: String, signature: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {source}", path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse binding config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn declaration(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Declaration {
            unit: unit.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Unsupported {
            unit: unit.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
