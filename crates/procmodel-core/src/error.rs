//! Error types for procmodel.

use thiserror::Error;

/// Result alias used throughout procmodel.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a `ProcedureExecutor`.
pub type ExecutionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for procmodel.
#[derive(Error, Debug)]
pub enum Error {
    /// A model declaration cannot be turned into a usable descriptor.
    #[error("configuration error on {model}.{field}: {message}")]
    Configuration {
        model: String,
        field: String,
        message: String,
    },

    /// A native type has no database type, or a database type name/code is unknown.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A required argument was missing, empty or whitespace.
    #[error("invalid argument `{name}`: {message}")]
    Argument { name: String, message: String },

    /// A raw database value could not be converted into a field's type.
    #[error("cannot convert {found} into {expected} for field `{field}`")]
    Conversion {
        field: String,
        expected: String,
        found: String,
    },

    /// A field name is not declared by the model.
    #[error("model {model} has no field `{field}`")]
    UnknownField { model: String, field: String },

    /// The procedure executor failed.
    #[error("procedure execution failed: {0}")]
    Execution(#[source] ExecutionError),
}

impl Error {
    /// Create a configuration error for a model field.
    pub fn configuration(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Configuration {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an argument error.
    pub fn argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Argument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::Conversion {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Wrap an executor failure.
    pub fn execution<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Execution(Box::new(err))
    }

    /// Attach a field name to a conversion error raised without one.
    #[must_use]
    pub fn for_field(self, name: &str) -> Self {
        match self {
            Error::Conversion {
                field,
                expected,
                found,
            } if field.is_empty() => Error::Conversion {
                field: name.to_string(),
                expected,
                found,
            },
            other => other,
        }
    }
}

/// Fail with [`Error::Argument`] when `value` is empty or whitespace.
pub fn check_argument(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::argument(
            name,
            "cannot be null, empty, or whitespace",
        ));
    }
    Ok(())
}
