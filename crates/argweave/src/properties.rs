//! Configuring objects from property maps
//!
//! Loosely typed configuration (strings, numbers, nested maps) is assigned to
//! declared fields with a small fixed set of coercions:
//!
//! | Field type | Raw value | Result |
//! |---|---|---|
//! | enum | string | constant by name |
//! | `long` | byte or int | widened |
//! | list | map | the map's values, in order |
//! | anything else | anything | assigned as is |

use argweave_core::{ObjectRef, Primitive, TypeRef, TypeRegistry, Value};
use indexmap::IndexMap;
use tracing::{error, trace};

use crate::error::Result;

/// Assign `properties` to the fields of `target`.
///
/// Keys with no matching field are skipped. The first failing coercion aborts
/// the remaining keys; fields assigned before it keep their new values.
pub fn apply_properties(
    target: &ObjectRef,
    properties: &IndexMap<String, Value>,
    registry: &TypeRegistry,
) -> Result<()> {
    let class = target.class().clone();
    for (name, raw) in properties {
        let Some(field) = class.field(name) else {
            trace!(class = class.name(), property = %name, "skipping unknown property");
            continue;
        };
        let value = coerce(&field.ty, raw, registry)?;
        target.set_index(field.index, value);
    }
    Ok(())
}

fn coerce(ty: &TypeRef, raw: &Value, registry: &TypeRegistry) -> Result<Value> {
    let value = match (ty, raw) {
        (TypeRef::Named { name, .. }, Value::Str(constant)) if registry.enum_type(name).is_some() => {
            Value::Enum(registry.enum_constant(name, constant)?)
        }
        (TypeRef::Primitive(Primitive::Long), Value::Byte(_) | Value::Int(_)) => {
            Value::Long(raw.as_i64().unwrap_or_default())
        }
        (TypeRef::List(_), Value::Map(map)) => Value::List(map.values().cloned().collect()),
        _ => raw.clone(),
    };
    Ok(value)
}

/// Instantiate `class_name` and configure it from `properties`.
///
/// Failures are logged and returned.
pub fn configure_instance(
    registry: &TypeRegistry,
    class_name: &str,
    properties: &IndexMap<String, Value>,
) -> Result<ObjectRef> {
    let configure = || -> Result<ObjectRef> {
        let instance = registry.instantiate(class_name)?;
        apply_properties(&instance, properties, registry)?;
        Ok(instance)
    };
    configure().map_err(|err| {
        error!(class = class_name, error = %err, "failed to configure instance");
        err
    })
}
