//! Expression resolution
//!
//! Annotation attributes carry short directives that resolve to a string:
//!
//! - `:Name` reads the request header `Name`
//! - `'..`, `@..`, `#..`, `T(..`, `args[..` are evaluated as expressions
//!   against the intercepted call
//! - anything else is returned unchanged
//!
//! The request context is passed in explicitly; there is no ambient
//! "current request".

use std::sync::Arc;

use argweave_core::{TypeRegistry, Value};
use argweave_el::{BeanResolver, ElEvaluator, ExpressionEvaluator};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::call::InterceptedCall;
use crate::error::{AdaptError, Result};
use crate::options::WeaveOptions;

/// Access to the request being served
pub trait RequestContext {
    /// Value of the header `name`, if present
    fn header(&self, name: &str) -> Option<String>;
}

/// Case-insensitive header map
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    headers: FxHashMap<String, String>,
}

impl HeaderMap {
    /// Create new empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any previous value
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Builder form of `insert`
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }
}

impl RequestContext for HeaderMap {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }
}

/// Resolves annotation directives against an intercepted call
pub struct ExpressionResolver {
    options: WeaveOptions,
    evaluator: Arc<dyn ExpressionEvaluator>,
    registry: Option<Arc<TypeRegistry>>,
    beans: Option<Arc<dyn BeanResolver>>,
}

impl ExpressionResolver {
    /// Create a resolver using the built-in expression language.
    ///
    /// Fails with `AdaptError::InvalidOptions` when the options do not validate.
    pub fn new(options: WeaveOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: WeaveOptions) -> Self {
        Self {
            options,
            evaluator: Arc::new(ElEvaluator),
            registry: None,
            beans: None,
        }
    }

    /// Use another expression evaluator
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Make registered types reachable through `T(..)`
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Make beans reachable through `@name`
    pub fn with_beans(mut self, beans: Arc<dyn BeanResolver>) -> Self {
        self.beans = Some(beans);
        self
    }

    /// Resolve `expression` to its string form
    pub fn resolve(
        &self,
        call: &InterceptedCall,
        request: Option<&dyn RequestContext>,
        expression: &str,
    ) -> Result<String> {
        if let Some(header) = expression.strip_prefix(self.options.header_prefix.as_str()) {
            return self.header(request, header);
        }
        if self.options.is_expression(expression) {
            return Ok(self.evaluate(call, expression)?.to_string());
        }
        Ok(expression.to_string())
    }

    /// Evaluate `expression` against the call, keeping the value's type
    pub fn evaluate(&self, call: &InterceptedCall, expression: &str) -> Result<Value> {
        let mut ctx = call.eval_context();
        if let Some(registry) = &self.registry {
            ctx = ctx.with_registry(registry);
        }
        if let Some(beans) = &self.beans {
            ctx = ctx.with_beans(beans.as_ref());
        }
        Ok(self.evaluator.evaluate(&ctx, expression)?)
    }

    fn header(&self, request: Option<&dyn RequestContext>, name: &str) -> Result<String> {
        let missing = |reason: &str| AdaptError::MissingHeader {
            header: name.to_string(),
            reason: reason.to_string(),
        };
        let request = request.ok_or_else(|| missing("no active request context"))?;
        if name.is_empty() {
            return Err(missing("header name is empty"));
        }
        let value = request.header(name).unwrap_or_default();
        debug!(header = name, found = !value.is_empty(), "header lookup");
        if value.is_empty() {
            return Err(missing("header is absent or empty"));
        }
        Ok(value)
    }
}

impl Default for ExpressionResolver {
    fn default() -> Self {
        Self::build(WeaveOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map_is_case_insensitive() {
        let headers = HeaderMap::new().with("X-Token", "abc");
        assert_eq!(headers.header("x-token"), Some("abc".to_string()));
        assert_eq!(headers.header("X-TOKEN"), Some("abc".to_string()));
        assert_eq!(headers.header("X-Other"), None);
    }
}
