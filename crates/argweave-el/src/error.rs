//! Expression language errors

use thiserror::Error;

/// Result alias for lexing, parsing and evaluation
pub type ElResult<T> = Result<T, ElError>;

/// Errors raised while lexing, parsing or evaluating an expression
#[derive(Debug, Error)]
pub enum ElError {
    /// Input that is not a token
    #[error("Unexpected input '{text}' at offset {offset}")]
    Lex {
        /// The unrecognized text
        text: String,
        /// Byte offset into the expression
        offset: usize,
    },

    /// Token stream that is not an expression
    #[error("Parse error at offset {offset}: {message}")]
    Parse {
        /// What was expected
        message: String,
        /// Byte offset into the expression
        offset: usize,
    },

    /// `#name` with no such variable in the context
    #[error("Variable '{name}' is not defined")]
    UnknownVariable {
        /// Variable name without the `#`
        name: String,
    },

    /// `@name` that the bean resolver does not know, or no resolver at all
    #[error("No bean resolver registered or bean '{name}' not found")]
    UnknownBean {
        /// Bean name without the `@`
        name: String,
    },

    /// `T(name)` with no such registered type
    #[error("Type '{name}' cannot be found")]
    UnknownType {
        /// Qualified type name
        name: String,
    },

    /// Property read on a value that has no such property
    #[error("Property '{property}' cannot be found on {type_name}")]
    NoSuchProperty {
        /// Property name
        property: String,
        /// Runtime type of the receiver
        type_name: String,
    },

    /// Method call on a value that has no such method
    #[error("Method {method}() with {arity} argument(s) cannot be found on {type_name}")]
    NoSuchMethod {
        /// Method name
        method: String,
        /// Number of arguments supplied
        arity: usize,
        /// Runtime type of the receiver
        type_name: String,
    },

    /// Operand of the wrong type
    #[error("Type error: {message}")]
    Type {
        /// Description of the mismatch
        message: String,
    },

    /// Index outside the bounds of a list or string
    #[error("Index {index} out of bounds for length {len}")]
    Index {
        /// Requested index
        index: i64,
        /// Length of the indexed value
        len: usize,
    },

    /// A host method invoked by the expression failed
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl ElError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        ElError::Type {
            message: message.into(),
        }
    }
}
