//! Tests for directive resolution, argument binding and options files

use std::io::Write;
use std::sync::Arc;

use argweave::{AdaptError, ExpressionResolver, HeaderMap, InterceptedCall, WeaveOptions};
use argweave_core::{
    ClassDescriptor, EnumDescriptor, MethodDescriptor, ObjectRef, ParameterDescriptor, Primitive,
    TypeRef, TypeRegistry, Value,
};
use argweave_el::{BeanResolver, ElError, ElResult, EvalContext, ExpressionEvaluator};
use tempfile::{NamedTempFile, TempDir};

fn token_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Token")
        .field("value", TypeRef::String)
        .build()
}

/// `OrderService.place(long orderId, Token token)`
fn call() -> InterceptedCall {
    let class = ClassDescriptor::builder("OrderService")
        .method(MethodDescriptor::new(
            "place",
            vec![
                ParameterDescriptor::new("orderId", TypeRef::Primitive(Primitive::Long)),
                ParameterDescriptor::new("token", TypeRef::named("Token")),
            ],
            TypeRef::String,
            |_, args| {
                let token = args[1]
                    .as_object()
                    .and_then(|t| t.get("value"))
                    .unwrap_or_default();
                Ok(Value::Str(format!("{}:{}", args[0], token)))
            },
        ))
        .build();
    let method = class.find_method("place", None).unwrap().clone();
    let placeholder = ObjectRef::new(token_class());
    InterceptedCall::new(
        ObjectRef::new(class),
        method,
        vec![Value::Long(1001), Value::Object(placeholder)],
    )
}

fn registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    registry
        .register_enum(EnumDescriptor::new("Level", ["LOW", "HIGH"]))
        .unwrap();
    Arc::new(registry)
}

struct Beans;

impl BeanResolver for Beans {
    fn resolve(&self, name: &str) -> Option<Value> {
        match name {
            "region" => Some(Value::str("eu-west")),
            _ => None,
        }
    }
}

// ============================================================================
// Header Lookup
// ============================================================================

mod headers {
    use super::*;

    fn missing_reason(err: AdaptError) -> (String, String) {
        match err {
            AdaptError::MissingHeader { header, reason } => (header, reason),
            other => panic!("expected missing header, got {:?}", other),
        }
    }

    #[test]
    fn test_header_found() {
        let headers = HeaderMap::new().with("X-Token", "abc");
        let resolved = ExpressionResolver::default()
            .resolve(&call(), Some(&headers), ":X-Token")
            .unwrap();
        assert_eq!(resolved, "abc");
    }

    #[test]
    fn test_no_request_context() {
        let err = ExpressionResolver::default()
            .resolve(&call(), None, ":X-Token")
            .unwrap_err();
        let (header, reason) = missing_reason(err);
        assert_eq!(header, "X-Token");
        assert_eq!(reason, "no active request context");
    }

    #[test]
    fn test_absent_and_empty_header() {
        let headers = HeaderMap::new().with("X-Empty", "");
        let resolver = ExpressionResolver::default();

        let (_, reason) =
            missing_reason(resolver.resolve(&call(), Some(&headers), ":X-Empty").unwrap_err());
        assert_eq!(reason, "header is absent or empty");

        let (header, _) =
            missing_reason(resolver.resolve(&call(), Some(&headers), ":X-Gone").unwrap_err());
        assert_eq!(header, "X-Gone");
    }

    #[test]
    fn test_bare_prefix() {
        let headers = HeaderMap::new().with("X-Token", "abc");
        let err = ExpressionResolver::default()
            .resolve(&call(), Some(&headers), ":")
            .unwrap_err();
        let (header, reason) = missing_reason(err);
        assert_eq!(header, "");
        assert_eq!(reason, "header name is empty");
    }
}

// ============================================================================
// Expressions
// ============================================================================

mod expressions {
    use super::*;

    #[test]
    fn test_parameter_name_and_index() {
        let resolver = ExpressionResolver::default();
        let call = call();
        assert_eq!(resolver.resolve(&call, None, "#orderId").unwrap(), "1001");
        assert_eq!(resolver.resolve(&call, None, "#p0").unwrap(), "1001");
        assert_eq!(resolver.resolve(&call, None, "args[0]").unwrap(), "1001");
        assert_eq!(
            resolver.resolve(&call, None, "'order-' + #a0").unwrap(),
            "order-1001"
        );
    }

    #[test]
    fn test_evaluate_keeps_type() {
        let value = ExpressionResolver::default()
            .evaluate(&call(), "#orderId + 1")
            .unwrap();
        assert_eq!(value, Value::Long(1002));
    }

    #[test]
    fn test_type_reference() {
        let resolver = ExpressionResolver::default().with_registry(registry());
        assert_eq!(resolver.resolve(&call(), None, "T(Level).HIGH").unwrap(), "HIGH");
    }

    #[test]
    fn test_bean_reference() {
        let resolver = ExpressionResolver::default().with_beans(Arc::new(Beans));
        assert_eq!(resolver.resolve(&call(), None, "@region").unwrap(), "eu-west");

        let err = resolver.resolve(&call(), None, "@missing").unwrap_err();
        assert!(matches!(
            err,
            AdaptError::Expression(ElError::UnknownBean { ref name }) if name == "missing"
        ));
    }

    #[test]
    fn test_literal_passes_through() {
        let resolver = ExpressionResolver::default();
        assert_eq!(resolver.resolve(&call(), None, "orders").unwrap(), "orders");
        assert_eq!(resolver.resolve(&call(), None, "").unwrap(), "");
    }

    #[test]
    fn test_invalid_expression() {
        let err = ExpressionResolver::default()
            .resolve(&call(), None, "#orderId +")
            .unwrap_err();
        assert!(matches!(err, AdaptError::Expression(_)));
    }

    #[test]
    fn test_custom_prefixes() {
        let options = WeaveOptions {
            header_prefix: "header:".to_string(),
            expression_prefixes: vec!["=".to_string()],
            ..WeaveOptions::default()
        };
        let resolver = ExpressionResolver::new(options).unwrap();
        let headers = HeaderMap::new().with("X-Token", "abc");
        assert_eq!(
            resolver.resolve(&call(), Some(&headers), "header:X-Token").unwrap(),
            "abc"
        );
        assert_eq!(resolver.resolve(&call(), None, "#orderId").unwrap(), "#orderId");
        assert_eq!(resolver.resolve(&call(), None, ":X-Token").unwrap(), ":X-Token");
    }

    #[test]
    fn test_empty_header_prefix_rejected() {
        let options = WeaveOptions {
            header_prefix: String::new(),
            ..WeaveOptions::default()
        };
        let err = ExpressionResolver::new(options).err().unwrap();
        assert!(matches!(err, AdaptError::InvalidOptions(_)));
    }

    #[test]
    fn test_deeply_nested_snippet_fails_cleanly() {
        let snippet = format!("args[{}", "(".repeat(200_000));
        let err = ExpressionResolver::default()
            .resolve(&call(), None, &snippet)
            .unwrap_err();
        assert!(matches!(err, AdaptError::Expression(ElError::Parse { .. })));
    }

    #[test]
    fn test_custom_evaluator() {
        struct Echo;

        impl ExpressionEvaluator for Echo {
            fn evaluate(&self, _: &EvalContext<'_>, expression: &str) -> ElResult<Value> {
                Ok(Value::str(expression.to_uppercase()))
            }
        }

        let resolver = ExpressionResolver::default().with_evaluator(Arc::new(Echo));
        assert_eq!(resolver.resolve(&call(), None, "#orderId").unwrap(), "#ORDERID");
        assert_eq!(resolver.resolve(&call(), None, "plain").unwrap(), "plain");
    }
}

// ============================================================================
// Binding
// ============================================================================

mod binding {
    use super::*;

    #[test]
    fn test_resolved_header_bound_into_call() {
        let headers = HeaderMap::new().with("X-Token", "abc");
        let mut call = call();
        let token = ExpressionResolver::default()
            .resolve(&call, Some(&headers), ":X-Token")
            .unwrap();
        let replacement = ObjectRef::with_fields(token_class(), [("value", Value::Str(token))]);

        let index = call
            .inject(Value::Object(replacement), "TokenBinding", true)
            .unwrap();

        assert_eq!(index, Some(1));
        assert_eq!(call.proceed().unwrap(), Value::str("1001:abc"));
    }

    #[test]
    fn test_required_binding_without_slot() {
        let mut call = call();
        let err = call
            .inject(Value::Bool(true), "FlagBinding", true)
            .unwrap_err();
        assert!(matches!(
            err,
            AdaptError::ArgumentBinding { ref method, ref annotation, .. }
                if method == "place" && annotation == "FlagBinding"
        ));
        assert_eq!(call.inject(Value::Bool(true), "FlagBinding", false).unwrap(), None);
    }
}

// ============================================================================
// Options Files
// ============================================================================

mod options_files {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "header_prefix = \"$\"").unwrap();
        writeln!(file, "cache_shapes = false").unwrap();

        let options = WeaveOptions::from_file(file.path()).unwrap();
        assert_eq!(options.header_prefix, "$");
        assert!(!options.cache_shapes);
        assert_eq!(options.body_field, "body");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = WeaveOptions::from_file(&dir.path().join("weave.toml")).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidOptions(_)));
    }

    #[test]
    fn test_invalid_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weave.toml");
        std::fs::write(&path, "body_field = \"\"\n").unwrap();
        let err = WeaveOptions::from_file(&path).unwrap_err();
        assert!(matches!(err, AdaptError::InvalidOptions(_)));
    }
}
