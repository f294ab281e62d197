//! Parameter shape classification
//!
//! How a wrapper payload is adapted depends only on the declared type of the
//! target method's first parameter. `classify` turns that declaration into a
//! `ParameterShape`; `ShapeTable` memoizes the result per method so the
//! declaration is inspected once per (owner, method, parameter types,
//! wrapper class).
//!
//! Generic nesting is resolved two levels deep: `List<Wrapper<T>>` looks at
//! `T`, but a wrapper nested in a wrapper (`Wrapper<Wrapper<T>>`) is simply a
//! concrete body of the wrapper class.

use std::sync::Arc;

use argweave_core::{MethodDescriptor, ParameterDescriptor, TypeRef};
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Declared body type of a wrapper parameter
#[derive(Debug, Clone, PartialEq)]
pub enum BodyType {
    /// Raw wrapper, or an unbound type argument
    Absent,
    /// `Wrapper<Map>`
    Map,
    /// `Wrapper<T>` for any other `T`
    Concrete(TypeRef),
}

/// Declared element type of a sequence parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceElement {
    /// Raw list, or an unbound type argument
    Absent,
    /// `List<Map>`
    Map,
    /// `List<Wrapper<..>>`
    Wrapper(BodyType),
    /// `List<T>` for any other `T`
    Concrete(TypeRef),
}

/// Classification of a method's first declared parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterShape {
    /// The method takes no parameters
    NoParameters,
    /// `Map`, `Object` or an unbound type variable
    MapOrAny,
    /// The wrapper type itself
    Wrapper(BodyType),
    /// A list
    Sequence(SequenceElement),
    /// Any other type
    Concrete(TypeRef),
}

/// Classify the first of `params` relative to `wrapper_class`
pub fn classify(params: &[ParameterDescriptor], wrapper_class: &str) -> ParameterShape {
    let Some(first) = params.first() else {
        return ParameterShape::NoParameters;
    };
    match &first.ty {
        TypeRef::Map | TypeRef::Any | TypeRef::Var(_) => ParameterShape::MapOrAny,
        ty if ty.is_named(wrapper_class) => ParameterShape::Wrapper(body_type(ty)),
        ty @ TypeRef::List(_) => ParameterShape::Sequence(sequence_element(ty, wrapper_class)),
        other => ParameterShape::Concrete(other.clone()),
    }
}

fn body_type(wrapper: &TypeRef) -> BodyType {
    let Some(argument) = wrapper.type_argument(0) else {
        return BodyType::Absent;
    };
    match argument.resolve() {
        None => BodyType::Absent,
        Some(TypeRef::Map) => BodyType::Map,
        Some(_) => BodyType::Concrete(argument.clone()),
    }
}

fn sequence_element(list: &TypeRef, wrapper_class: &str) -> SequenceElement {
    let Some(element) = list.type_argument(0) else {
        return SequenceElement::Absent;
    };
    match element.resolve() {
        None => SequenceElement::Absent,
        Some(TypeRef::Map) => SequenceElement::Map,
        Some(raw) if raw.is_named(wrapper_class) => SequenceElement::Wrapper(body_type(element)),
        Some(_) => SequenceElement::Concrete(element.clone()),
    }
}

// ============================================================================
// Shape Table
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShapeKey {
    owner: String,
    method: String,
    params: Vec<TypeRef>,
    wrapper_class: String,
}

static GLOBAL: Lazy<Arc<ShapeTable>> = Lazy::new(|| Arc::new(ShapeTable::new()));

/// Memoized parameter shapes
///
/// Entries are computed at most once per key, even under concurrent lookups,
/// and never change afterwards.
#[derive(Debug, Default)]
pub struct ShapeTable {
    shapes: DashMap<ShapeKey, ParameterShape>,
}

impl ShapeTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            shapes: DashMap::new(),
        }
    }

    /// The process-wide table
    pub fn global() -> Arc<ShapeTable> {
        GLOBAL.clone()
    }

    /// Shape of `method`'s first parameter relative to `wrapper_class`
    pub fn shape_of(&self, method: &MethodDescriptor, wrapper_class: &str) -> ParameterShape {
        let key = ShapeKey {
            owner: method.owner.clone(),
            method: method.name.clone(),
            params: method.param_types(),
            wrapper_class: wrapper_class.to_string(),
        };
        if let Some(shape) = self.shapes.get(&key) {
            return shape.value().clone();
        }
        self.shapes
            .entry(key)
            .or_insert_with(|| classify(&method.params, wrapper_class))
            .value()
            .clone()
    }

    /// Get the number of memoized shapes
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if no shape has been memoized
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Drop every memoized shape
    pub fn clear(&self) {
        self.shapes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argweave_core::{Primitive, Value};

    const WRAPPER: &str = "Envelope";

    fn param(ty: TypeRef) -> Vec<ParameterDescriptor> {
        vec![ParameterDescriptor::new("arg0", ty)]
    }

    fn envelope(arg: TypeRef) -> TypeRef {
        TypeRef::generic(WRAPPER, vec![arg])
    }

    #[test]
    fn test_no_parameters() {
        assert_eq!(classify(&[], WRAPPER), ParameterShape::NoParameters);
    }

    #[test]
    fn test_map_or_any() {
        assert_eq!(classify(&param(TypeRef::Map), WRAPPER), ParameterShape::MapOrAny);
        assert_eq!(classify(&param(TypeRef::Any), WRAPPER), ParameterShape::MapOrAny);
        assert_eq!(
            classify(&param(TypeRef::Var("T".to_string())), WRAPPER),
            ParameterShape::MapOrAny
        );
    }

    #[test]
    fn test_wrapper_bodies() {
        assert_eq!(
            classify(&param(TypeRef::named(WRAPPER)), WRAPPER),
            ParameterShape::Wrapper(BodyType::Absent)
        );
        assert_eq!(
            classify(&param(envelope(TypeRef::Map)), WRAPPER),
            ParameterShape::Wrapper(BodyType::Map)
        );
        assert_eq!(
            classify(&param(envelope(TypeRef::Var("T".to_string()))), WRAPPER),
            ParameterShape::Wrapper(BodyType::Absent)
        );
        let int = TypeRef::Primitive(Primitive::Int);
        assert_eq!(
            classify(&param(envelope(int.clone())), WRAPPER),
            ParameterShape::Wrapper(BodyType::Concrete(int))
        );
    }

    #[test]
    fn test_wrapper_in_wrapper_is_concrete_body() {
        let inner = envelope(TypeRef::named("User"));
        assert_eq!(
            classify(&param(envelope(inner.clone())), WRAPPER),
            ParameterShape::Wrapper(BodyType::Concrete(inner))
        );
    }

    #[test]
    fn test_sequence_elements() {
        assert_eq!(
            classify(&param(TypeRef::raw_list()), WRAPPER),
            ParameterShape::Sequence(SequenceElement::Absent)
        );
        assert_eq!(
            classify(&param(TypeRef::list_of(TypeRef::Map)), WRAPPER),
            ParameterShape::Sequence(SequenceElement::Map)
        );
        assert_eq!(
            classify(&param(TypeRef::list_of(TypeRef::named(WRAPPER))), WRAPPER),
            ParameterShape::Sequence(SequenceElement::Wrapper(BodyType::Absent))
        );
        assert_eq!(
            classify(&param(TypeRef::list_of(envelope(TypeRef::Map))), WRAPPER),
            ParameterShape::Sequence(SequenceElement::Wrapper(BodyType::Map))
        );
        assert_eq!(
            classify(&param(TypeRef::list_of(envelope(TypeRef::named("User")))), WRAPPER),
            ParameterShape::Sequence(SequenceElement::Wrapper(BodyType::Concrete(TypeRef::named(
                "User"
            ))))
        );
        assert_eq!(
            classify(&param(TypeRef::list_of(TypeRef::named("User"))), WRAPPER),
            ParameterShape::Sequence(SequenceElement::Concrete(TypeRef::named("User")))
        );
    }

    #[test]
    fn test_concrete_fallback() {
        assert_eq!(
            classify(&param(TypeRef::String), WRAPPER),
            ParameterShape::Concrete(TypeRef::String)
        );
        let page = TypeRef::generic("Page", vec![TypeRef::named("User")]);
        assert_eq!(classify(&param(page.clone()), WRAPPER), ParameterShape::Concrete(page));
    }

    #[test]
    fn test_only_first_parameter_counts() {
        let params = vec![
            ParameterDescriptor::new("a", TypeRef::Map),
            ParameterDescriptor::new("b", TypeRef::named(WRAPPER)),
        ];
        assert_eq!(classify(&params, WRAPPER), ParameterShape::MapOrAny);
    }

    #[test]
    fn test_table_memoizes_concurrently() {
        let table = ShapeTable::new();
        let method = MethodDescriptor::new(
            "handle",
            param(envelope(TypeRef::named("User"))),
            TypeRef::Void,
            |_, _| Ok(Value::Null),
        );

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        let shape = table.shape_of(&method, WRAPPER);
                        assert!(matches!(shape, ParameterShape::Wrapper(BodyType::Concrete(_))));
                    }
                });
            }
        });

        assert_eq!(table.len(), 1);
        table.shape_of(&method, "OtherWrapper");
        assert_eq!(table.len(), 2);
        table.clear();
        assert!(table.is_empty());
    }
}
