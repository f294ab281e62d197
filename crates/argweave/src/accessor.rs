//! Dynamic field and method access
//!
//! Low-level reflective primitives: dotted-path field reads and method
//! invocation by name and signature. Missing fields and methods are not
//! errors here; both return `Value::Null`.

use argweave_core::{TypeRef, Value};

use crate::error::{AdaptError, Result};

/// Walk `path` (e.g. `"order.customer.name"`) field by field from `target`.
///
/// Returns `Null` when `target` is null, `path` is empty, a segment names no
/// field, or an intermediate value is not an object.
pub fn read_path(target: &Value, path: &str) -> Value {
    if target.is_null() || path.is_empty() {
        return Value::Null;
    }
    let mut current = target.clone();
    for segment in path.split('.') {
        let next = match &current {
            Value::Object(obj) => obj.get(segment),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Value::Null,
        }
    }
    current
}

/// Invoke the method `name` on `target`'s class.
///
/// With `param_types` the method must match that erased signature; without,
/// the first method of that name is used. Returns `Null` when `target` is not
/// an object or has no such method. Failures of the method itself surface
/// as `AdaptError::Invocation`, unchanged.
pub fn invoke_named(
    target: &Value,
    name: &str,
    param_types: Option<&[TypeRef]>,
    args: &[Value],
) -> Result<Value> {
    let Value::Object(obj) = target else {
        return Ok(Value::Null);
    };
    match obj.class().find_method(name, param_types) {
        Some(method) => method.invoke(obj, args).map_err(AdaptError::Invocation),
        None => Ok(Value::Null),
    }
}
