//! Fallback return values
//!
//! When an interception aborts the real call, the caller still has to hand
//! something back. `default_for` maps a declared return type to its
//! zero-equivalent.

use argweave_core::{Primitive, TypeRef, Value};

/// Zero-equivalent value for a declared return type.
///
/// | Declared type | Value |
/// |---|---|
/// | `long` | `Long(-1)` |
/// | `short`, `int`, `float`, `double` | `Int(-1)` |
/// | `boolean` | `false` |
/// | `byte` | `Byte(0)` |
/// | `char` | `'\0'` |
/// | anything else | `Null` |
pub fn default_for(return_type: &TypeRef) -> Value {
    let TypeRef::Primitive(primitive) = return_type else {
        return Value::Null;
    };
    match primitive {
        Primitive::Long => Value::Long(-1),
        p if p.is_numeric() => Value::Int(-1),
        Primitive::Bool => Value::Bool(false),
        Primitive::Byte => Value::Byte(0),
        Primitive::Char => Value::Char('\0'),
        _ => Value::Null,
    }
}
