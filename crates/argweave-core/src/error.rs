//! Errors raised by the runtime model and the interchange codec

use thiserror::Error;

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors from type registration, lookup and payload coercion
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoreError {
    /// A type name was not registered
    #[error("Unknown type: {name}")]
    UnknownType {
        /// The requested type name
        name: String,
    },

    /// A type name was registered twice
    #[error("Type already registered: {name}")]
    DuplicateType {
        /// The conflicting type name
        name: String,
    },

    /// A string did not name a constant of the enum
    #[error("No enum constant {enum_type}.{name}")]
    InvalidEnumName {
        /// Enum type name
        enum_type: String,
        /// The offending constant name
        name: String,
    },

    /// Serializing a value or shaping interchange data into a type failed
    #[error("Cannot convert {source_type} to {target_type}: {message}")]
    Coercion {
        /// What was being converted
        source_type: String,
        /// What it was being converted into
        target_type: String,
        /// Underlying reason
        message: String,
    },
}
