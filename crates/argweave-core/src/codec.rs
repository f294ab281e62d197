//! Interchange codec
//!
//! Reshaping a payload into a declared type goes through a neutral
//! interchange form: the value is serialized to JSON text, then the JSON tree
//! is walked against the target `TypeRef` to build a value of that shape.
//! `Value` implements `serde::Serialize`; decoding is driven by the type
//! registry because the target shape is only known at runtime.

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::{CoreError, CoreResult};
use crate::object::Walk;
use crate::registry::{TypeDef, TypeRegistry};
use crate::ty::{Primitive, TypeRef};
use crate::value::Value;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Byte(b) => serializer.serialize_i8(*b),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::Int(i) => serializer.serialize_i32(*i),
            Value::Long(l) => serializer.serialize_i64(*l),
            Value::Double(d) if !d.is_finite() => {
                Err(S::Error::custom(format!("non-finite number {} is not representable", d)))
            }
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
            Value::Enum(e) => serializer.serialize_str(&e.constant),
            Value::Object(obj) => {
                let Some(_guard) = obj.enter(Walk::Serialize) else {
                    return Err(S::Error::custom(format!(
                        "cyclic object graph through {}",
                        obj.class_name()
                    )));
                };
                let entries = obj.entries();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, value) in &entries {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

/// The interchange serializer used to reshape payloads
pub trait Interchange: Send + Sync {
    /// Serialize a value into interchange text
    fn serialize(&self, value: &Value) -> CoreResult<String>;

    /// Build a value of type `target` from interchange text
    fn deserialize(&self, data: &str, target: &TypeRef, registry: &TypeRegistry) -> CoreResult<Value>;

    /// Serialize `value` and deserialize the result into `target`
    fn convert(&self, value: &Value, target: &TypeRef, registry: &TypeRegistry) -> CoreResult<Value> {
        let data = self.serialize(value)?;
        self.deserialize(&data, target, registry)
    }
}

/// JSON implementation of `Interchange`
#[derive(Debug, Clone, Default)]
pub struct JsonInterchange {
    fail_on_unknown_properties: bool,
}

impl JsonInterchange {
    /// Create a codec that ignores unknown JSON properties
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject JSON properties that the target class does not declare
    pub fn fail_on_unknown_properties(mut self, fail: bool) -> Self {
        self.fail_on_unknown_properties = fail;
        self
    }

    fn decode(&self, json: &Json, target: &TypeRef, registry: &TypeRegistry) -> CoreResult<Value> {
        if json.is_null() {
            return Ok(Value::Null);
        }
        match target {
            TypeRef::Void => Err(mismatch(json, target, "nothing decodes into void")),
            TypeRef::Any | TypeRef::Var(_) => Ok(natural(json)),
            TypeRef::Map => match json {
                Json::Object(_) => Ok(natural(json)),
                _ => Err(mismatch(json, target, "expected an object")),
            },
            TypeRef::String => match json {
                Json::String(s) => Ok(Value::Str(s.clone())),
                Json::Number(n) => Ok(Value::Str(n.to_string())),
                Json::Bool(b) => Ok(Value::Str(b.to_string())),
                _ => Err(mismatch(json, target, "expected a scalar")),
            },
            TypeRef::Primitive(p) => decode_primitive(json, *p, target),
            TypeRef::List(element) => match json {
                Json::Array(items) => {
                    let element = element.as_deref().unwrap_or(&TypeRef::Any);
                    items
                        .iter()
                        .map(|item| self.decode(item, element, registry))
                        .collect::<CoreResult<Vec<_>>>()
                        .map(Value::List)
                }
                _ => Err(mismatch(json, target, "expected an array")),
            },
            TypeRef::Named { name, args } => match registry.get(name) {
                Some(TypeDef::Enum(descriptor)) => {
                    let constant = match json {
                        Json::String(s) => descriptor.constant(s),
                        Json::Number(n) => n
                            .as_u64()
                            .and_then(|i| descriptor.constant_names().get(i as usize))
                            .and_then(|c| descriptor.constant(c)),
                        _ => None,
                    };
                    constant
                        .map(Value::Enum)
                        .ok_or_else(|| mismatch(json, target, "not a constant of the enum"))
                }
                Some(TypeDef::Class(class)) => {
                    let Json::Object(props) = json else {
                        return Err(mismatch(json, target, "expected an object"));
                    };
                    let obj = registry.instantiate(name)?;
                    for (key, prop) in props {
                        let Some(field) = class.field(key) else {
                            if self.fail_on_unknown_properties {
                                return Err(mismatch(
                                    json,
                                    target,
                                    &format!("unrecognized property '{}'", key),
                                ));
                            }
                            continue;
                        };
                        let field_ty = field.ty.substitute(class.type_params(), args);
                        let value = self.decode(prop, &field_ty, registry)?;
                        obj.set_index(field.index, value);
                    }
                    Ok(Value::Object(obj))
                }
                None => Err(CoreError::UnknownType { name: name.clone() }),
            },
        }
    }
}

impl Interchange for JsonInterchange {
    fn serialize(&self, value: &Value) -> CoreResult<String> {
        serde_json::to_string(value).map_err(|e| CoreError::Coercion {
            source_type: value.type_name(),
            target_type: "JSON".to_string(),
            message: e.to_string(),
        })
    }

    fn deserialize(&self, data: &str, target: &TypeRef, registry: &TypeRegistry) -> CoreResult<Value> {
        let json: Json = serde_json::from_str(data).map_err(|e| CoreError::Coercion {
            source_type: "JSON".to_string(),
            target_type: target.to_string(),
            message: e.to_string(),
        })?;
        self.decode(&json, target, registry)
    }
}

/// Convert a JSON tree into the closest untyped value
pub fn natural(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map(Value::Int).unwrap_or(Value::Long(i))
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(natural).collect()),
        Json::Object(props) => Value::Map(props.iter().map(|(k, v)| (k.clone(), natural(v))).collect()),
    }
}

fn decode_primitive(json: &Json, primitive: Primitive, target: &TypeRef) -> CoreResult<Value> {
    let integral = || -> Option<i64> {
        match json {
            Json::Number(n) => n.as_i64(),
            Json::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };
    let floating = || -> Option<f64> {
        match json {
            Json::Number(n) => n.as_f64(),
            Json::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };
    let decoded = match primitive {
        Primitive::Bool => match json {
            Json::Bool(b) => Some(Value::Bool(*b)),
            Json::String(s) => s.parse().ok().map(Value::Bool),
            _ => None,
        },
        Primitive::Byte => integral().and_then(|i| i8::try_from(i).ok()).map(Value::Byte),
        Primitive::Char => match json {
            Json::String(s) if s.chars().count() == 1 => s.chars().next().map(Value::Char),
            _ => None,
        },
        Primitive::Short => integral()
            .and_then(|i| i16::try_from(i).ok())
            .map(|i| Value::Int(i as i32)),
        Primitive::Int => integral().and_then(|i| i32::try_from(i).ok()).map(Value::Int),
        Primitive::Long => integral().map(Value::Long),
        Primitive::Float | Primitive::Double => floating().map(Value::Double),
    };
    decoded.ok_or_else(|| mismatch(json, target, "value out of range or malformed"))
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(json: &Json, target: &TypeRef, message: &str) -> CoreError {
    CoreError::Coercion {
        source_type: json_kind(json).to_string(),
        target_type: target.to_string(),
        message: message.to_string(),
    }
}
