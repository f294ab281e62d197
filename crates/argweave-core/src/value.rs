//! Dynamic values
//!
//! Every argument, field and payload handled by argweave is a `Value`.
//! `Value::Null` is the universal absent value.

use std::fmt;

use indexmap::IndexMap;

use crate::object::ObjectRef;
use crate::ty::{Primitive, TypeRef};

/// A resolved enum constant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Enum type name
    pub type_name: String,
    /// Constant name
    pub constant: String,
    /// Declaration position of the constant
    pub ordinal: usize,
}

/// A dynamically typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// The absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed byte
    Byte(i8),
    /// Character (`'\0'` is the null character)
    Char(char),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// Text
    Str(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// String-keyed map preserving insertion order
    Map(IndexMap<String, Value>),
    /// Enum constant
    Enum(EnumValue),
    /// Reflective object instance (shared identity)
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Build a map value from key/value pairs
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Check if this is the absent value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get any integral value widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(b) => Some(*b as i64),
            Value::Int(i) => Some(*i as i64),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Get any numeric value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as list if this is a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get as map if this is a map
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get as object reference if this is an object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short name of the runtime type, for diagnostics
    pub fn type_name(&self) -> String {
        match self.runtime_type() {
            Some(ty) => ty.to_string(),
            None => "null".to_string(),
        }
    }

    /// Runtime type of this value (`None` for the absent value)
    pub fn runtime_type(&self) -> Option<TypeRef> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => TypeRef::Primitive(Primitive::Bool),
            Value::Byte(_) => TypeRef::Primitive(Primitive::Byte),
            Value::Char(_) => TypeRef::Primitive(Primitive::Char),
            Value::Int(_) => TypeRef::Primitive(Primitive::Int),
            Value::Long(_) => TypeRef::Primitive(Primitive::Long),
            Value::Double(_) => TypeRef::Primitive(Primitive::Double),
            Value::Str(_) => TypeRef::String,
            Value::List(_) => TypeRef::raw_list(),
            Value::Map(_) => TypeRef::Map,
            Value::Enum(e) => TypeRef::named(e.type_name.clone()),
            Value::Object(obj) => TypeRef::named(obj.class_name().to_string()),
        };
        Some(ty)
    }

    /// Whether this value is an instance of `exemplar`'s runtime type.
    ///
    /// Objects match when their class is the exemplar's class or one of its
    /// subclasses. The absent value is never an instance of anything.
    pub fn is_instance_of_type_of(&self, exemplar: &Value) -> bool {
        match (self, exemplar) {
            (Value::Object(obj), Value::Object(ex)) => obj.class().is_subclass_of(ex.class_name()),
            (Value::Enum(a), Value::Enum(b)) => a.type_name == b.type_name,
            (Value::Null, _) | (_, Value::Null) => false,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.structurally_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Enum(e) => f.write_str(&e.constant),
            Value::Object(obj) => write!(f, "{}", obj),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i8> for Value {
    fn from(b: i8) -> Self {
        Value::Byte(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Long(l)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_widening() {
        assert_eq!(Value::Byte(7).as_i64(), Some(7));
        assert_eq!(Value::Int(-3).as_i64(), Some(-3));
        assert_eq!(Value::Long(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::Double(1.5).as_i64(), None);
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
    }

    #[test]
    fn test_instance_of_primitives() {
        assert!(Value::Int(1).is_instance_of_type_of(&Value::Int(2)));
        assert!(!Value::Long(1).is_instance_of_type_of(&Value::Int(2)));
        assert!(!Value::Null.is_instance_of_type_of(&Value::Null));
        assert!(Value::str("a").is_instance_of_type_of(&Value::str("b")));
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::str("abc").to_string(), "abc");
        assert_eq!(Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(), "[1, 2]");
        assert_eq!(Value::map([("a", Value::Int(1))]).to_string(), "{a=1}");
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let value = Value::map([("z", Value::Int(1)), ("a", Value::Int(2))]);
        let keys: Vec<&String> = value.as_map().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
