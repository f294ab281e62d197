//! Registry of described types
//!
//! The registry maps a type name to its class or enum descriptor. It is
//! populated up front and then shared read-only (usually behind an `Arc`).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::descriptor::{ClassDescriptor, EnumDescriptor};
use crate::error::{CoreError, CoreResult};
use crate::object::ObjectRef;
use crate::value::EnumValue;

/// A registered type definition
#[derive(Debug, Clone)]
pub enum TypeDef {
    /// A class
    Class(Arc<ClassDescriptor>),
    /// An enum
    Enum(Arc<EnumDescriptor>),
}

/// Registry of class and enum descriptors, indexed by name
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, TypeDef>,
}

impl TypeRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class
    pub fn register_class(&mut self, class: Arc<ClassDescriptor>) -> CoreResult<()> {
        self.insert(class.name().to_string(), TypeDef::Class(class))
    }

    /// Register an enum
    pub fn register_enum(&mut self, descriptor: Arc<EnumDescriptor>) -> CoreResult<()> {
        self.insert(descriptor.name().to_string(), TypeDef::Enum(descriptor))
    }

    fn insert(&mut self, name: String, def: TypeDef) -> CoreResult<()> {
        if self.types.contains_key(&name) {
            return Err(CoreError::DuplicateType { name });
        }
        self.types.insert(name, def);
        Ok(())
    }

    /// Look up any type by name
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        match self.types.get(name) {
            Some(TypeDef::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// Look up an enum by name
    pub fn enum_type(&self, name: &str) -> Option<&Arc<EnumDescriptor>> {
        match self.types.get(name) {
            Some(TypeDef::Enum(e)) => Some(e),
            _ => None,
        }
    }

    /// Look up a class, failing if it is not registered
    pub fn require_class(&self, name: &str) -> CoreResult<&Arc<ClassDescriptor>> {
        self.class(name).ok_or_else(|| CoreError::UnknownType {
            name: name.to_string(),
        })
    }

    /// Resolve an enum constant by its exact name
    pub fn enum_constant(&self, enum_type: &str, name: &str) -> CoreResult<EnumValue> {
        let descriptor = self.enum_type(enum_type).ok_or_else(|| CoreError::UnknownType {
            name: enum_type.to_string(),
        })?;
        descriptor
            .constant(name)
            .ok_or_else(|| CoreError::InvalidEnumName {
                enum_type: enum_type.to_string(),
                name: name.to_string(),
            })
    }

    /// Allocate a fresh instance of a registered class
    pub fn instantiate(&self, name: &str) -> CoreResult<ObjectRef> {
        Ok(ObjectRef::new(self.require_class(name)?.clone()))
    }

    /// Check if `sub` is `sup` or one of its subclasses
    pub fn is_subclass_of(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        self.class(sub).is_some_and(|c| c.is_subclass_of(sup))
    }

    /// Get number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
