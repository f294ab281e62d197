//! Adaptation errors

use argweave_core::CoreError;
use argweave_el::ElError;
use thiserror::Error;

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, AdaptError>;

/// Errors raised by argument binding, expression resolution, property
/// coercion and parameter adaptation
#[derive(Debug, Error)]
pub enum AdaptError {
    /// A required argument of the replacement's type is not in the argument list
    #[error("Can't find argument of type {type_name} in {method} for @{annotation}")]
    ArgumentBinding {
        /// Runtime type of the replacement value
        type_name: String,
        /// Intercepted method name
        method: String,
        /// Annotation that declared the binding
        annotation: String,
    },

    /// A `:Header` expression could not be resolved
    #[error("Cannot resolve header '{header}': {reason}")]
    MissingHeader {
        /// Header name (without the prefix)
        header: String,
        /// Why resolution failed
        reason: String,
    },

    /// A string did not name a constant of the field's enum type
    #[error("No enum constant {enum_type}.{name}")]
    InvalidEnumName {
        /// Enum type name
        enum_type: String,
        /// The offending constant name
        name: String,
    },

    /// Reshaping a payload through the interchange codec failed
    #[error("Cannot convert {source_type} to {target_type}: {message}")]
    PayloadCoercion {
        /// What was being converted
        source_type: String,
        /// What it was being converted into
        target_type: String,
        /// Underlying reason
        message: String,
    },

    /// Adaptation needed a wrapper but none were supplied
    #[error("Method {method} needs at least one wrapper to adapt")]
    MissingWrapper {
        /// Target method name
        method: String,
    },

    /// A type name is not registered
    #[error("Unknown type: {name}")]
    UnknownType {
        /// The requested type name
        name: String,
    },

    /// Engine options failed to load or validate
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The invoked method failed; its error is passed through unchanged
    #[error(transparent)]
    Invocation(anyhow::Error),

    /// The expression evaluator failed; its error is passed through unchanged
    #[error(transparent)]
    Expression(#[from] ElError),
}

impl From<CoreError> for AdaptError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownType { name } => AdaptError::UnknownType { name },
            CoreError::InvalidEnumName { enum_type, name } => {
                AdaptError::InvalidEnumName { enum_type, name }
            }
            CoreError::Coercion {
                source_type,
                target_type,
                message,
            } => AdaptError::PayloadCoercion {
                source_type,
                target_type,
                message,
            },
            CoreError::DuplicateType { name } => {
                AdaptError::InvalidOptions(format!("type {} registered twice", name))
            }
        }
    }
}
