//! Class, method and enum descriptors
//!
//! Descriptors are the explicit stand-in for platform reflection: a class is
//! described once (fields with their declared types, invocable methods with
//! their declared parameters) and then shared behind an `Arc` by every
//! instance and every lookup.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::object::ObjectRef;
use crate::ty::{Primitive, TypeRef};
use crate::value::{EnumValue, Value};

/// Body of an instance method
pub type MethodFn = Arc<dyn Fn(&ObjectRef, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Body of a static method
pub type StaticFn = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

// ============================================================================
// Annotations
// ============================================================================

/// Marker metadata attached to a class or method
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Annotation name (e.g. "Cacheable")
    pub name: String,
    /// Named attributes
    pub attributes: IndexMap<String, Value>,
}

impl Annotation {
    /// Create an annotation without attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

// ============================================================================
// Fields
// ============================================================================

/// A declared instance field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Slot index within the instance
    pub index: usize,
}

impl FieldDescriptor {
    /// Value a fresh instance holds in this field
    pub fn initial_value(&self) -> Value {
        match &self.ty {
            TypeRef::Primitive(p) => zero_of(*p),
            _ => Value::Null,
        }
    }
}

fn zero_of(primitive: Primitive) -> Value {
    match primitive {
        Primitive::Bool => Value::Bool(false),
        Primitive::Byte => Value::Byte(0),
        Primitive::Char => Value::Char('\0'),
        Primitive::Short | Primitive::Int => Value::Int(0),
        Primitive::Long => Value::Long(0),
        Primitive::Float | Primitive::Double => Value::Double(0.0),
    }
}

// ============================================================================
// Methods
// ============================================================================

/// A declared method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name (may be synthetic, e.g. "arg0")
    pub name: String,
    /// Declared type, generics included
    pub ty: TypeRef,
}

impl ParameterDescriptor {
    /// Create a parameter descriptor
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An invocable instance method
#[derive(Clone)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Declaring class name (set when added to a class)
    pub owner: String,
    /// Declared parameters in order
    pub params: Vec<ParameterDescriptor>,
    /// Declared return type
    pub return_type: TypeRef,
    /// Method-level annotations
    pub annotations: Vec<Annotation>,
    body: MethodFn,
}

impl MethodDescriptor {
    /// Create a method descriptor
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParameterDescriptor>,
        return_type: TypeRef,
        body: impl Fn(&ObjectRef, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            owner: String::new(),
            params,
            return_type,
            annotations: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Attach an annotation
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Declared parameter types
    pub fn param_types(&self) -> Vec<TypeRef> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    /// Erased parameter types, used for signature matching
    pub fn signature(&self) -> Vec<TypeRef> {
        self.params.iter().map(|p| p.ty.erasure()).collect()
    }

    /// Whether `param_types` matches this method's erased signature
    pub fn matches_signature(&self, param_types: &[TypeRef]) -> bool {
        self.params.len() == param_types.len()
            && self
                .params
                .iter()
                .zip(param_types)
                .all(|(p, ty)| p.ty.erasure() == ty.erasure())
    }

    /// Look up a method-level annotation
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Run the method body. Errors from the body are returned unchanged.
    pub fn invoke(&self, target: &ObjectRef, args: &[Value]) -> anyhow::Result<Value> {
        (self.body)(target, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// A static (receiver-less) method, reachable through `T(Type)` expressions
#[derive(Clone)]
pub struct StaticMethod {
    /// Method name
    pub name: String,
    /// Declared parameters
    pub params: Vec<ParameterDescriptor>,
    /// Declared return type
    pub return_type: TypeRef,
    body: StaticFn,
}

impl StaticMethod {
    /// Create a static method
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParameterDescriptor>,
        return_type: TypeRef,
        body: impl Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            body: Arc::new(body),
        }
    }

    /// Run the method body
    pub fn invoke(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for StaticMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticMethod")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Reflection metadata for a single class
#[derive(Debug)]
pub struct ClassDescriptor {
    name: String,
    type_params: Vec<String>,
    /// Ancestor names, nearest parent first
    ancestors: Vec<String>,
    fields: Vec<FieldDescriptor>,
    field_indices: FxHashMap<String, usize>,
    methods: Vec<Arc<MethodDescriptor>>,
    static_methods: Vec<Arc<StaticMethod>>,
    annotations: Vec<Annotation>,
}

impl ClassDescriptor {
    /// Start describing a class
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            type_params: Vec::new(),
            ancestors: Vec::new(),
            fields: Vec::new(),
            field_indices: FxHashMap::default(),
            methods: Vec::new(),
            static_methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type parameter names
    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    /// Ancestor names, nearest parent first
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// All instance fields, inherited ones first
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name (nearest declaration wins)
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_indices.get(name).map(|&i| &self.fields[i])
    }

    /// All instance methods
    pub fn methods(&self) -> &[Arc<MethodDescriptor>] {
        &self.methods
    }

    /// Find a method by name, optionally constrained to an erased signature
    pub fn find_method(&self, name: &str, param_types: Option<&[TypeRef]>) -> Option<&Arc<MethodDescriptor>> {
        self.methods.iter().find(|m| {
            m.name == name && param_types.map_or(true, |types| m.matches_signature(types))
        })
    }

    /// Methods sharing a name, in declaration order
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Arc<MethodDescriptor>> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Find a static method by name and arity
    pub fn find_static(&self, name: &str, arity: usize) -> Option<&Arc<StaticMethod>> {
        self.static_methods
            .iter()
            .find(|m| m.name == name && m.params.len() == arity)
    }

    /// Class-level annotations
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Look up a class-level annotation
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Whether this class is `name` or inherits from it
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }
}

/// Builder for `ClassDescriptor`
pub struct ClassBuilder {
    name: String,
    type_params: Vec<String>,
    ancestors: Vec<String>,
    fields: Vec<FieldDescriptor>,
    field_indices: FxHashMap<String, usize>,
    methods: Vec<Arc<MethodDescriptor>>,
    static_methods: Vec<Arc<StaticMethod>>,
    annotations: Vec<Annotation>,
}

impl ClassBuilder {
    /// Declare a type parameter
    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    /// Inherit fields and methods from `parent`.
    ///
    /// Inherited fields take the first slots. Fields and methods the class
    /// declares itself shadow inherited ones of the same name (or signature),
    /// whether they were declared before or after this call.
    pub fn extends(mut self, parent: &ClassDescriptor) -> Self {
        self.ancestors.push(parent.name.clone());
        self.ancestors.extend(parent.ancestors.iter().cloned());

        let own_fields = std::mem::replace(&mut self.fields, parent.fields.clone());
        self.field_indices = parent.field_indices.clone();
        for field in own_fields {
            self.push_field(field.name, field.ty);
        }

        let own_methods = std::mem::replace(&mut self.methods, parent.methods.clone());
        for method in own_methods {
            self.push_method(method);
        }
        self
    }

    /// Declare a field; a field with an inherited name takes over the parent's slot
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.push_field(name.into(), ty);
        self
    }

    /// Declare a method; an inherited method with the same signature is overridden
    pub fn method(mut self, mut method: MethodDescriptor) -> Self {
        method.owner = self.name.clone();
        self.push_method(Arc::new(method));
        self
    }

    fn push_field(&mut self, name: String, ty: TypeRef) {
        match self.field_indices.get(&name) {
            Some(&index) => self.fields[index].ty = ty,
            None => {
                let index = self.fields.len();
                self.field_indices.insert(name.clone(), index);
                self.fields.push(FieldDescriptor { name, ty, index });
            }
        }
    }

    fn push_method(&mut self, method: Arc<MethodDescriptor>) {
        let signature = method.signature();
        self.methods
            .retain(|m| !(m.name == method.name && m.signature() == signature));
        self.methods.push(method);
    }

    /// Declare a static method
    pub fn static_method(mut self, method: StaticMethod) -> Self {
        self.static_methods.push(Arc::new(method));
        self
    }

    /// Attach a class-level annotation
    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Build the descriptor
    pub fn build(self) -> Arc<ClassDescriptor> {
        Arc::new(ClassDescriptor {
            name: self.name,
            type_params: self.type_params,
            ancestors: self.ancestors,
            fields: self.fields,
            field_indices: self.field_indices,
            methods: self.methods,
            static_methods: self.static_methods,
            annotations: self.annotations,
        })
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Reflection metadata for an enum type
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    name: String,
    constants: Vec<String>,
}

impl EnumDescriptor {
    /// Describe an enum with its constants in declaration order
    pub fn new<S: Into<String>>(name: impl Into<String>, constants: impl IntoIterator<Item = S>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            constants: constants.into_iter().map(Into::into).collect(),
        })
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constant names in declaration order
    pub fn constant_names(&self) -> &[String] {
        &self.constants
    }

    /// Resolve a constant by exact name
    pub fn constant(&self, name: &str) -> Option<EnumValue> {
        self.constants
            .iter()
            .position(|c| c == name)
            .map(|ordinal| EnumValue {
                type_name: self.name.clone(),
                constant: name.to_string(),
                ordinal,
            })
    }
}
