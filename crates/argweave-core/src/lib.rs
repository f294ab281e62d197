//! Argweave Core - runtime type model for argument adaptation
//!
//! This crate provides the explicit stand-in for platform reflection that the
//! adaptation engine works against: declared types (`TypeRef`), dynamic
//! values (`Value`), class/method/enum descriptors, shared object instances,
//! the `TypeRegistry`, and the JSON interchange codec used to reshape
//! payloads into declared types.

#![warn(missing_docs)]

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod object;
pub mod registry;
pub mod ty;
pub mod value;

pub use codec::{natural, Interchange, JsonInterchange};
pub use descriptor::{
    Annotation, ClassBuilder, ClassDescriptor, EnumDescriptor, FieldDescriptor, MethodDescriptor,
    MethodFn, ParameterDescriptor, StaticFn, StaticMethod,
};
pub use error::{CoreError, CoreResult};
pub use object::{ObjectRef, Walk, WalkGuard};
pub use registry::{TypeDef, TypeRegistry};
pub use ty::{Primitive, TypeRef};
pub use value::{EnumValue, Value};
