//! Declared (static) types
//!
//! `TypeRef` is what a field, parameter or return slot *declares*, as opposed
//! to the runtime type of the value that ends up in it. Generic arguments are
//! kept so that callers can ask for `List<Page<User>>`'s inner types the same
//! way a reflective runtime would.

use std::fmt;

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `boolean`
    Bool,
    /// Signed 8-bit integer
    Byte,
    /// A single character
    Char,
    /// Signed 16-bit integer
    Short,
    /// Signed 32-bit integer
    Int,
    /// Signed 64-bit integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
}

impl Primitive {
    /// Source-level name of the primitive
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Whether this is one of the numeric kinds (bytes and chars excluded)
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Primitive::Short | Primitive::Int | Primitive::Long | Primitive::Float | Primitive::Double
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value (method return only)
    Void,
    /// The universal object type
    Any,
    /// A primitive kind
    Primitive(Primitive),
    /// Text
    String,
    /// Generic key/value map; its parameterization never matters to adaptation
    Map,
    /// Ordered sequence with an optional element type (`None` for a raw list)
    List(Option<Box<TypeRef>>),
    /// A registered class or enum, possibly parameterized
    Named {
        /// Registered type name
        name: String,
        /// Type arguments in declaration order (empty for raw use)
        args: Vec<TypeRef>,
    },
    /// A type variable that was never bound (resolves to nothing)
    Var(String),
}

impl TypeRef {
    /// Shorthand for a raw named type
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Shorthand for a parameterized named type
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args,
        }
    }

    /// Shorthand for `List<element>`
    pub fn list_of(element: TypeRef) -> Self {
        TypeRef::List(Some(Box::new(element)))
    }

    /// Shorthand for a raw list
    pub fn raw_list() -> Self {
        TypeRef::List(None)
    }

    /// The raw type this declaration resolves to, or `None` for an unbound variable.
    ///
    /// Type arguments are dropped; `Page<User>` resolves to `Page`.
    pub fn resolve(&self) -> Option<TypeRef> {
        match self {
            TypeRef::Var(_) => None,
            other => Some(other.erasure()),
        }
    }

    /// Type argument at `index`, or `None` when the type is raw or has fewer arguments
    pub fn type_argument(&self, index: usize) -> Option<&TypeRef> {
        match self {
            TypeRef::List(Some(element)) if index == 0 => Some(element),
            TypeRef::Named { args, .. } => args.get(index),
            _ => None,
        }
    }

    /// Same type with all type arguments removed
    pub fn erasure(&self) -> TypeRef {
        match self {
            TypeRef::List(_) => TypeRef::List(None),
            TypeRef::Named { name, .. } => TypeRef::named(name.clone()),
            other => other.clone(),
        }
    }

    /// Replace bound type variables: `params[i]` becomes `args[i]`.
    ///
    /// Variables without a matching argument stay unbound.
    pub fn substitute(&self, params: &[String], args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::Var(name) => params
                .iter()
                .position(|p| p == name)
                .and_then(|i| args.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::List(Some(element)) => {
                TypeRef::List(Some(Box::new(element.substitute(params, args))))
            }
            TypeRef::Named { name, args: inner } => TypeRef::Named {
                name: name.clone(),
                args: inner.iter().map(|a| a.substitute(params, args)).collect(),
            },
            other => other.clone(),
        }
    }

    /// Name of a `Named` type
    pub fn type_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether the raw type is the named type `name`
    pub fn is_named(&self, name: &str) -> bool {
        self.type_name() == Some(name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Any => f.write_str("Object"),
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::String => f.write_str("String"),
            TypeRef::Map => f.write_str("Map"),
            TypeRef::List(None) => f.write_str("List"),
            TypeRef::List(Some(element)) => write!(f, "List<{}>", element),
            TypeRef::Named { name, args } if args.is_empty() => f.write_str(name),
            TypeRef::Named { name, args } => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            TypeRef::Var(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_drops_arguments() {
        let page = TypeRef::generic("Page", vec![TypeRef::named("User")]);
        assert_eq!(page.resolve(), Some(TypeRef::named("Page")));
        assert_eq!(TypeRef::Var("T".to_string()).resolve(), None);
    }

    #[test]
    fn test_type_argument_lookup() {
        let list = TypeRef::list_of(TypeRef::generic("Page", vec![TypeRef::Map]));
        let inner = list.type_argument(0).unwrap();
        assert!(inner.is_named("Page"));
        assert_eq!(inner.type_argument(0), Some(&TypeRef::Map));
        assert_eq!(inner.type_argument(1), None);
        assert_eq!(TypeRef::raw_list().type_argument(0), None);
    }

    #[test]
    fn test_unbound_argument_resolves_to_none() {
        let page = TypeRef::generic("Page", vec![TypeRef::Var("T".to_string())]);
        let argument = page.type_argument(0).unwrap();
        assert_eq!(argument.resolve(), None);
    }

    #[test]
    fn test_substitute_binds_variables() {
        let params = vec!["T".to_string()];
        let field = TypeRef::list_of(TypeRef::Var("T".to_string()));
        let bound = field.substitute(&params, &[TypeRef::named("User")]);
        assert_eq!(bound, TypeRef::list_of(TypeRef::named("User")));
        let unbound = field.substitute(&params, &[]);
        assert_eq!(unbound, field);
    }

    #[test]
    fn test_display() {
        let ty = TypeRef::list_of(TypeRef::generic("Page", vec![TypeRef::Primitive(Primitive::Int)]));
        assert_eq!(ty.to_string(), "List<Page<int>>");
        assert_eq!(TypeRef::Any.to_string(), "Object");
    }
}
