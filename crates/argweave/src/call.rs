//! Intercepted calls

use std::sync::Arc;

use argweave_core::{Annotation, MethodDescriptor, ObjectRef, TypeRef, Value};
use argweave_el::EvalContext;

use crate::defaults::default_for;
use crate::error::{AdaptError, Result};
use crate::locator::{locate_and_replace, BindingSite};

/// A method call captured at an interception point
#[derive(Debug, Clone)]
pub struct InterceptedCall {
    /// Receiver of the call
    pub target: ObjectRef,
    /// The called method
    pub method: Arc<MethodDescriptor>,
    /// Actual arguments, in declaration order
    pub args: Vec<Value>,
}

impl InterceptedCall {
    /// Capture a call
    pub fn new(target: ObjectRef, method: Arc<MethodDescriptor>, args: Vec<Value>) -> Self {
        Self {
            target,
            method,
            args,
        }
    }

    /// Name of the called method
    pub fn method_name(&self) -> &str {
        &self.method.name
    }

    /// Annotation on the method, or else on the target's class
    pub fn find_annotation(&self, name: &str) -> Option<&Annotation> {
        self.method
            .annotation(name)
            .or_else(|| self.target.class().annotation(name))
    }

    /// Declared return type of the called method
    pub fn return_type(&self) -> &TypeRef {
        &self.method.return_type
    }

    /// Fallback value for an aborted call
    pub fn default_return(&self) -> Value {
        default_for(self.return_type())
    }

    /// Bind `replacement` into this call's arguments
    pub fn inject(&mut self, replacement: Value, annotation: &str, required: bool) -> Result<Option<usize>> {
        let site = BindingSite {
            method: &self.method.name,
            annotation,
        };
        locate_and_replace(&mut self.args, replacement, required, site)
    }

    /// Run the method with the current arguments
    pub fn proceed(&self) -> Result<Value> {
        self.method
            .invoke(&self.target, &self.args)
            .map_err(AdaptError::Invocation)
    }

    /// Expression context exposing the call.
    ///
    /// The root is a map of `target`, `args` and `method` (the method name).
    /// Variables: `#target`, `#args`, `#method`, `#p<i>` and `#a<i>` for each
    /// argument, and each declared parameter name.
    pub fn eval_context<'a>(&self) -> EvalContext<'a> {
        let target = Value::Object(self.target.clone());
        let args = Value::List(self.args.clone());
        let method = Value::Str(self.method.name.clone());
        let root = Value::map([
            ("target", target.clone()),
            ("args", args.clone()),
            ("method", method.clone()),
        ]);

        let mut ctx = EvalContext::new(root)
            .with_variable("target", target)
            .with_variable("args", args)
            .with_variable("method", method);
        for (i, arg) in self.args.iter().enumerate() {
            if let Some(param) = self.method.params.get(i) {
                ctx.set_variable(param.name.clone(), arg.clone());
            }
            ctx.set_variable(format!("p{}", i), arg.clone());
            ctx.set_variable(format!("a{}", i), arg.clone());
        }
        ctx
    }
}
