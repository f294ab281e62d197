//! Argweave - argument binding and generic parameter adaptation
//!
//! The pieces an interception layer needs to rewrite a captured call before
//! it runs:
//!
//! - [`locator`] splices a value into the argument list by runtime type
//! - [`expression`] resolves annotation directives (`:Header`, `#p0.id`, literals)
//! - [`adapt`] reshapes wrapper payloads into the declared first parameter
//!   and invokes the method
//! - [`properties`] configures objects from loosely typed property maps
//! - [`defaults`] supplies fallback return values
//! - [`accessor`] reads dotted field paths and invokes methods by name
//!
//! # Example
//!
//! ```ignore
//! use argweave::{Adapter, FieldBodyAccess};
//!
//! let adapter = Adapter::new(registry.clone());
//! let access = FieldBodyAccess::new("Envelope");
//! let result = adapter.invoke_with_adaptation(&handler, &method, &wrappers, &access)?;
//! ```

#![warn(missing_docs)]

pub mod accessor;
pub mod adapt;
pub mod call;
pub mod defaults;
pub mod error;
pub mod expression;
pub mod locator;
pub mod options;
pub mod properties;
pub mod shape;

pub use accessor::{invoke_named, read_path};
pub use adapt::{Adapter, BodyAccess, FieldBodyAccess, FnBodyAccess};
pub use call::InterceptedCall;
pub use defaults::default_for;
pub use error::{AdaptError, Result};
pub use expression::{ExpressionResolver, HeaderMap, RequestContext};
pub use locator::{locate_and_replace, BindingSite};
pub use options::WeaveOptions;
pub use properties::{apply_properties, configure_instance};
pub use shape::{classify, BodyType, ParameterShape, SequenceElement, ShapeTable};
