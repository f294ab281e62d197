//! Parameter adaptation and invocation
//!
//! `Adapter::invoke_with_adaptation` turns a list of wrapper objects into the
//! argument the target method declares, then invokes it. Only the first
//! declared parameter is adapted; any further parameters receive `Null`.
//!
//! | First parameter | Argument passed |
//! |---|---|
//! | none | nothing |
//! | `Map` / `Object` | body of the first wrapper |
//! | `Wrapper`, `Wrapper<Map>` | the first wrapper, untouched |
//! | `Wrapper<T>` | the first wrapper, body reshaped to `T` in place |
//! | `List`, `List<Map>` | bodies of all wrappers |
//! | `List<Wrapper>`, `List<Wrapper<Map>>` | all wrappers, untouched |
//! | `List<Wrapper<T>>` | all wrappers, each body reshaped to `T` in place |
//! | `List<T>` | bodies of all wrappers, each reshaped to `T` |
//! | `T` | body of the first wrapper reshaped to `T` |
//!
//! The engine only touches a wrapper's body, and only through `BodyAccess`.

use std::sync::Arc;

use argweave_core::{CoreError, Interchange, JsonInterchange, MethodDescriptor, ObjectRef, TypeRef, TypeRegistry, Value};
use tracing::debug;

use crate::error::{AdaptError, Result};
use crate::options::WeaveOptions;
use crate::shape::{classify, BodyType, ParameterShape, SequenceElement, ShapeTable};

// ============================================================================
// Body Access
// ============================================================================

/// Read and write access to a wrapper's body
pub trait BodyAccess {
    /// Class name of the wrapper type
    fn wrapper_class(&self) -> &str;

    /// Read the body out of a wrapper
    fn read_body(&self, wrapper: &ObjectRef) -> Value;

    /// Replace a wrapper's body
    fn write_body(&self, wrapper: &ObjectRef, body: Value);
}

/// Body stored in a named field of the wrapper
#[derive(Debug, Clone)]
pub struct FieldBodyAccess {
    wrapper_class: String,
    field: String,
}

impl FieldBodyAccess {
    /// Access the `body` field of `wrapper_class`
    pub fn new(wrapper_class: impl Into<String>) -> Self {
        Self {
            wrapper_class: wrapper_class.into(),
            field: "body".to_string(),
        }
    }

    /// Use another field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

impl BodyAccess for FieldBodyAccess {
    fn wrapper_class(&self) -> &str {
        &self.wrapper_class
    }

    fn read_body(&self, wrapper: &ObjectRef) -> Value {
        wrapper.get(&self.field).unwrap_or_default()
    }

    fn write_body(&self, wrapper: &ObjectRef, body: Value) {
        wrapper.set(&self.field, body);
    }
}

/// Body accessed through caller-supplied closures
pub struct FnBodyAccess<R, W> {
    wrapper_class: String,
    read: R,
    write: W,
}

impl<R, W> FnBodyAccess<R, W>
where
    R: Fn(&ObjectRef) -> Value,
    W: Fn(&ObjectRef, Value),
{
    /// Create an accessor from a reader and a writer
    pub fn new(wrapper_class: impl Into<String>, read: R, write: W) -> Self {
        Self {
            wrapper_class: wrapper_class.into(),
            read,
            write,
        }
    }
}

impl<R, W> BodyAccess for FnBodyAccess<R, W>
where
    R: Fn(&ObjectRef) -> Value,
    W: Fn(&ObjectRef, Value),
{
    fn wrapper_class(&self) -> &str {
        &self.wrapper_class
    }

    fn read_body(&self, wrapper: &ObjectRef) -> Value {
        (self.read)(wrapper)
    }

    fn write_body(&self, wrapper: &ObjectRef, body: Value) {
        (self.write)(wrapper, body)
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// The adaptation engine
pub struct Adapter {
    registry: Arc<TypeRegistry>,
    shapes: Option<Arc<ShapeTable>>,
    codec: Arc<dyn Interchange>,
    options: WeaveOptions,
}

impl Adapter {
    /// Create an adapter with default options and the process-wide shape table
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::build(registry, WeaveOptions::default())
    }

    /// Create an adapter with the given options.
    ///
    /// Fails with `AdaptError::InvalidOptions` when the options do not validate.
    pub fn with_options(registry: Arc<TypeRegistry>, options: WeaveOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(registry, options))
    }

    fn build(registry: Arc<TypeRegistry>, options: WeaveOptions) -> Self {
        let codec = JsonInterchange::new().fail_on_unknown_properties(options.fail_on_unknown_properties);
        let shapes = options.cache_shapes.then(ShapeTable::global);
        Self {
            registry,
            shapes,
            codec: Arc::new(codec),
            options,
        }
    }

    /// Memoize shapes in `table` instead of the process-wide table
    pub fn with_shape_table(mut self, table: Arc<ShapeTable>) -> Self {
        self.shapes = Some(table);
        self
    }

    /// Reshape payloads with another interchange codec
    pub fn with_codec(mut self, codec: Arc<dyn Interchange>) -> Self {
        self.codec = codec;
        self
    }

    /// The type registry payloads are reshaped against
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The adapter's options
    pub fn options(&self) -> &WeaveOptions {
        &self.options
    }

    /// Field accessor for `wrapper_class` using the configured body field
    pub fn field_access(&self, wrapper_class: impl Into<String>) -> FieldBodyAccess {
        FieldBodyAccess::new(wrapper_class).with_field(self.options.body_field.clone())
    }

    /// Shape of `method`'s first parameter, memoized unless caching is off
    pub fn shape_of(&self, method: &MethodDescriptor, wrapper_class: &str) -> ParameterShape {
        match &self.shapes {
            Some(table) => table.shape_of(method, wrapper_class),
            None => classify(&method.params, wrapper_class),
        }
    }

    /// Adapt `wrappers` to `method`'s first parameter and invoke it on `target`.
    ///
    /// Wrapper bodies reshaped into a concrete body type are rewritten in
    /// place, so the caller observes the new bodies after the call. Errors
    /// raised by the method are returned unchanged as
    /// `AdaptError::Invocation`.
    pub fn invoke_with_adaptation(
        &self,
        target: &ObjectRef,
        method: &MethodDescriptor,
        wrappers: &[ObjectRef],
        access: &dyn BodyAccess,
    ) -> Result<Value> {
        let shape = self.shape_of(method, access.wrapper_class());
        debug!(method = %method.name, ?shape, wrappers = wrappers.len(), "adapting call");

        let argument = match &shape {
            ParameterShape::NoParameters => return invoke(target, method, Vec::new()),
            ParameterShape::MapOrAny => access.read_body(first(wrappers, method)?),
            ParameterShape::Wrapper(body) => {
                let wrapper = first(wrappers, method)?;
                if let BodyType::Concrete(ty) = body {
                    self.reshape_in_place(wrapper, ty, access)?;
                }
                Value::Object(wrapper.clone())
            }
            ParameterShape::Sequence(element) => match element {
                SequenceElement::Absent | SequenceElement::Map => {
                    Value::List(wrappers.iter().map(|w| access.read_body(w)).collect())
                }
                SequenceElement::Wrapper(body) => {
                    if let BodyType::Concrete(ty) = body {
                        for wrapper in wrappers {
                            self.reshape_in_place(wrapper, ty, access)?;
                        }
                    }
                    Value::List(wrappers.iter().cloned().map(Value::Object).collect())
                }
                SequenceElement::Concrete(ty) => Value::List(
                    wrappers
                        .iter()
                        .map(|w| self.reshape(&access.read_body(w), ty))
                        .collect::<Result<Vec<_>>>()?,
                ),
            },
            ParameterShape::Concrete(ty) => {
                self.reshape(&access.read_body(first(wrappers, method)?), ty)?
            }
        };

        let mut args = Vec::with_capacity(method.params.len());
        args.push(argument);
        args.resize(method.params.len(), Value::Null);
        invoke(target, method, args)
    }

    fn reshape_in_place(&self, wrapper: &ObjectRef, ty: &TypeRef, access: &dyn BodyAccess) -> Result<()> {
        let body = self.reshape(&access.read_body(wrapper), ty)?;
        access.write_body(wrapper, body);
        Ok(())
    }

    /// Serialize `value` and deserialize it into `ty`
    pub fn reshape(&self, value: &Value, ty: &TypeRef) -> Result<Value> {
        self.codec
            .convert(value, ty, &self.registry)
            .map_err(|err| match err {
                CoreError::Coercion { .. } => AdaptError::from(err),
                other => AdaptError::PayloadCoercion {
                    source_type: value.type_name(),
                    target_type: ty.to_string(),
                    message: other.to_string(),
                },
            })
    }
}

fn first<'w>(wrappers: &'w [ObjectRef], method: &MethodDescriptor) -> Result<&'w ObjectRef> {
    wrappers.first().ok_or_else(|| AdaptError::MissingWrapper {
        method: method.name.clone(),
    })
}

fn invoke(target: &ObjectRef, method: &MethodDescriptor, args: Vec<Value>) -> Result<Value> {
    method.invoke(target, &args).map_err(AdaptError::Invocation)
}
