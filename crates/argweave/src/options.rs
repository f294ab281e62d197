//! Engine options
//!
//! `WeaveOptions` is loaded from TOML. Every key is optional; the defaults
//! reproduce the engine's fixed behavior:
//!
//! ```toml
//! header_prefix = ":"
//! expression_prefixes = ["'", "@", "#", "T(", "args["]
//! cache_shapes = true
//! fail_on_unknown_properties = false
//! body_field = "body"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AdaptError, Result};

/// Options for expression resolution and parameter adaptation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeaveOptions {
    /// Prefix marking a request-header lookup
    pub header_prefix: String,

    /// Prefixes marking an expression-language snippet
    pub expression_prefixes: Vec<String>,

    /// Memoize parameter shapes per method
    pub cache_shapes: bool,

    /// Reject payload properties the target class does not declare
    pub fail_on_unknown_properties: bool,

    /// Wrapper field holding the payload, for `FieldBodyAccess`
    pub body_field: String,
}

impl Default for WeaveOptions {
    fn default() -> Self {
        Self {
            header_prefix: ":".to_string(),
            expression_prefixes: ["'", "@", "#", "T(", "args["]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cache_shapes: true,
            fail_on_unknown_properties: false,
            body_field: "body".to_string(),
        }
    }
}

impl WeaveOptions {
    /// Parse options from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdaptError::InvalidOptions(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse options from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let options: WeaveOptions = toml::from_str(content)
            .map_err(|e| AdaptError::InvalidOptions(format!("failed to parse options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.header_prefix.is_empty() {
            return Err(AdaptError::InvalidOptions(
                "header_prefix cannot be empty".to_string(),
            ));
        }
        if self.expression_prefixes.iter().any(String::is_empty) {
            return Err(AdaptError::InvalidOptions(
                "expression_prefixes cannot contain an empty prefix".to_string(),
            ));
        }
        if self.body_field.is_empty() {
            return Err(AdaptError::InvalidOptions(
                "body_field cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `expression` starts with an expression-language prefix
    pub fn is_expression(&self, expression: &str) -> bool {
        self.expression_prefixes
            .iter()
            .any(|prefix| expression.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let options = WeaveOptions::from_str("").unwrap();
        assert_eq!(options, WeaveOptions::default());
        assert!(options.cache_shapes);
        assert_eq!(options.header_prefix, ":");
    }

    #[test]
    fn test_partial_override() {
        let options = WeaveOptions::from_str(
            r#"
header_prefix = "$"
fail_on_unknown_properties = true
"#,
        )
        .unwrap();
        assert_eq!(options.header_prefix, "$");
        assert!(options.fail_on_unknown_properties);
        assert_eq!(options.body_field, "body");
    }

    #[test]
    fn test_expression_prefixes() {
        let options = WeaveOptions::default();
        assert!(options.is_expression("#p0.id"));
        assert!(options.is_expression("T(Level).HIGH"));
        assert!(options.is_expression("args[0]"));
        assert!(options.is_expression("'quoted'"));
        assert!(!options.is_expression("plain"));
        assert!(!options.is_expression("Tx"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let err = WeaveOptions::from_str("header_prefix = \"\"").unwrap_err();
        assert!(matches!(err, AdaptError::InvalidOptions(_)));

        let err = WeaveOptions::from_str("expression_prefixes = [\"#\", \"\"]").unwrap_err();
        assert!(matches!(err, AdaptError::InvalidOptions(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = WeaveOptions::from_str("cache_shapes = \"yes\"").unwrap_err();
        assert!(matches!(err, AdaptError::InvalidOptions(_)));
    }
}
