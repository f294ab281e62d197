//! Typed argument binding
//!
//! Splices a replacement value into an intercepted argument list at the first
//! position holding a value of the replacement's runtime type.

use argweave_core::Value;
use tracing::trace;

use crate::error::{AdaptError, Result};

/// Where a binding was requested, for diagnostics
#[derive(Debug, Clone, Copy)]
pub struct BindingSite<'a> {
    /// Intercepted method name
    pub method: &'a str,
    /// Annotation that declared the binding
    pub annotation: &'a str,
}

/// Replace the first argument that is an instance of `replacement`'s type.
///
/// Returns the replaced position, or `None` when nothing matched and
/// `required` is false. With `required` set, no match is an
/// `AdaptError::ArgumentBinding`.
pub fn locate_and_replace(
    args: &mut [Value],
    replacement: Value,
    required: bool,
    site: BindingSite<'_>,
) -> Result<Option<usize>> {
    if let Some(index) = args
        .iter()
        .position(|arg| arg.is_instance_of_type_of(&replacement))
    {
        trace!(method = site.method, index, "binding argument");
        args[index] = replacement;
        return Ok(Some(index));
    }
    if required {
        return Err(AdaptError::ArgumentBinding {
            type_name: replacement.type_name(),
            method: site.method.to_string(),
            annotation: site.annotation.to_string(),
        });
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argweave_core::{ClassDescriptor, ObjectRef, TypeRef};

    const SITE: BindingSite<'static> = BindingSite {
        method: "save",
        annotation: "Lock",
    };

    #[test]
    fn test_replaces_first_match_only() {
        let mut args = vec![Value::str("a"), Value::Int(1), Value::Int(2)];
        let index = locate_and_replace(&mut args, Value::Int(9), true, SITE).unwrap();
        assert_eq!(index, Some(1));
        assert_eq!(args, vec![Value::str("a"), Value::Int(9), Value::Int(2)]);
    }

    #[test]
    fn test_null_argument_never_matches() {
        let mut args = vec![Value::Null, Value::str("x")];
        let index = locate_and_replace(&mut args, Value::str("y"), false, SITE).unwrap();
        assert_eq!(index, Some(1));
        assert!(args[0].is_null());
    }

    #[test]
    fn test_subclass_argument_matches() {
        let base = ClassDescriptor::builder("Lock").field("key", TypeRef::String).build();
        let special = ClassDescriptor::builder("FairLock").extends(&base).build();
        let mut args = vec![Value::Object(ObjectRef::new(special))];
        let replacement = Value::Object(ObjectRef::with_fields(base, [("key", Value::str("k"))]));
        locate_and_replace(&mut args, replacement, true, SITE).unwrap();
        assert_eq!(args[0].as_object().unwrap().class_name(), "Lock");
    }

    #[test]
    fn test_required_without_match_fails() {
        let mut args = vec![Value::str("a")];
        let err = locate_and_replace(&mut args, Value::Long(1), true, SITE).unwrap_err();
        match err {
            AdaptError::ArgumentBinding {
                type_name,
                method,
                annotation,
            } => {
                assert_eq!(type_name, "long");
                assert_eq!(method, "save");
                assert_eq!(annotation, "Lock");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_optional_without_match_leaves_args() {
        let mut args = vec![Value::str("a")];
        let index = locate_and_replace(&mut args, Value::Long(1), false, SITE).unwrap();
        assert_eq!(index, None);
        assert_eq!(args, vec![Value::str("a")]);
    }
}
