//! Expression evaluation
//!
//! Expressions are evaluated against an `EvalContext`: a root value that bare
//! identifiers read from, named variables (`#name`), an optional bean
//! resolver (`@name`) and an optional type registry for `T(...)` references
//! to enum constants and static methods.

use std::cmp::Ordering;

use argweave_core::{TypeRegistry, Value};
use rustc_hash::FxHashMap;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{ElError, ElResult};
use crate::parser::parse;

/// Lookup of named components for `@name` references
pub trait BeanResolver: Send + Sync {
    /// Resolve a bean by name
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// Evaluation context
#[derive(Default)]
pub struct EvalContext<'a> {
    root: Value,
    variables: FxHashMap<String, Value>,
    beans: Option<&'a dyn BeanResolver>,
    registry: Option<&'a TypeRegistry>,
}

impl<'a> EvalContext<'a> {
    /// Create a context with the given root value
    pub fn new(root: Value) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    /// Define a variable
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Define or replace a variable
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Attach a bean resolver
    pub fn with_beans(mut self, beans: &'a dyn BeanResolver) -> Self {
        self.beans = Some(beans);
        self
    }

    /// Attach a type registry for `T(...)` references
    pub fn with_registry(mut self, registry: &'a TypeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The root value
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up a variable; `root` and `this` name the root value
    pub fn variable(&self, name: &str) -> Option<&Value> {
        match self.variables.get(name) {
            Some(value) => Some(value),
            None if name == "root" || name == "this" => Some(&self.root),
            None => None,
        }
    }
}

/// Evaluates expression text against a context
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression` in `ctx`
    fn evaluate(&self, ctx: &EvalContext<'_>, expression: &str) -> ElResult<Value>;
}

/// The built-in expression language
#[derive(Debug, Clone, Copy, Default)]
pub struct ElEvaluator;

impl ExpressionEvaluator for ElEvaluator {
    fn evaluate(&self, ctx: &EvalContext<'_>, expression: &str) -> ElResult<Value> {
        let expr = parse(expression)?;
        eval(&expr, ctx)
    }
}

/// Evaluate a parsed expression
pub fn eval(expr: &Expr, ctx: &EvalContext<'_>) -> ElResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::This => Ok(ctx.root.clone()),
        Expr::Variable(name) => ctx
            .variable(name)
            .cloned()
            .ok_or_else(|| ElError::UnknownVariable { name: name.clone() }),
        Expr::Bean(name) => ctx
            .beans
            .and_then(|beans| beans.resolve(name))
            .ok_or_else(|| ElError::UnknownBean { name: name.clone() }),
        Expr::Type(name) => {
            require_type(ctx, name)?;
            Ok(Value::Str(name.clone()))
        }
        Expr::Property { target, name, safe } => {
            if let Expr::Type(type_name) = target.as_ref() {
                return static_property(ctx, type_name, name);
            }
            let receiver = eval(target, ctx)?;
            if receiver.is_null() && *safe {
                return Ok(Value::Null);
            }
            property(&receiver, name)
        }
        Expr::Index { target, index } => {
            let receiver = eval(target, ctx)?;
            let index = eval(index, ctx)?;
            index_into(&receiver, &index)
        }
        Expr::MethodCall {
            target,
            name,
            args,
            safe,
        } => {
            if let Expr::Type(type_name) = target.as_ref() {
                let args = eval_all(args, ctx)?;
                return static_call(ctx, type_name, name, &args);
            }
            let receiver = eval(target, ctx)?;
            if receiver.is_null() && *safe {
                return Ok(Value::Null);
            }
            let args = eval_all(args, ctx)?;
            call(&receiver, name, &args)
        }
        Expr::Unary { op, operand } => {
            let value = eval(operand, ctx)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value)?)),
                UnaryOp::Neg => match value {
                    Value::Byte(b) => Ok(Value::Int(-(b as i32))),
                    Value::Int(i) => Ok(i
                        .checked_neg()
                        .map(Value::Int)
                        .unwrap_or(Value::Long(-(i as i64)))),
                    Value::Long(l) => Ok(Value::Long(l.wrapping_neg())),
                    Value::Double(d) => Ok(Value::Double(-d)),
                    other => Err(ElError::type_error(format!(
                        "cannot negate {}",
                        other.type_name()
                    ))),
                },
            }
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::And => {
                if !truthy(&eval(left, ctx)?)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(truthy(&eval(right, ctx)?)?))
            }
            BinaryOp::Or => {
                if truthy(&eval(left, ctx)?)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(truthy(&eval(right, ctx)?)?))
            }
            _ => {
                let left = eval(left, ctx)?;
                let right = eval(right, ctx)?;
                binary(*op, &left, &right)
            }
        },
        Expr::Ternary {
            condition,
            then,
            otherwise,
        } => {
            if truthy(&eval(condition, ctx)?)? {
                eval(then, ctx)
            } else {
                eval(otherwise, ctx)
            }
        }
        Expr::Elvis { value, fallback } => {
            let value = eval(value, ctx)?;
            match &value {
                Value::Null => eval(fallback, ctx),
                Value::Str(s) if s.is_empty() => eval(fallback, ctx),
                _ => Ok(value),
            }
        }
    }
}

fn eval_all(args: &[Expr], ctx: &EvalContext<'_>) -> ElResult<Vec<Value>> {
    args.iter().map(|arg| eval(arg, ctx)).collect()
}

// ============================================================================
// Type references
// ============================================================================

fn require_type<'r>(ctx: &EvalContext<'r>, name: &str) -> ElResult<&'r TypeRegistry> {
    match ctx.registry {
        Some(registry) if registry.get(name).is_some() => Ok(registry),
        _ => Err(ElError::UnknownType {
            name: name.to_string(),
        }),
    }
}

fn static_property(ctx: &EvalContext<'_>, type_name: &str, name: &str) -> ElResult<Value> {
    let registry = require_type(ctx, type_name)?;
    registry
        .enum_type(type_name)
        .and_then(|e| e.constant(name))
        .map(Value::Enum)
        .ok_or_else(|| ElError::NoSuchProperty {
            property: name.to_string(),
            type_name: type_name.to_string(),
        })
}

fn static_call(ctx: &EvalContext<'_>, type_name: &str, name: &str, args: &[Value]) -> ElResult<Value> {
    let registry = require_type(ctx, type_name)?;
    let method = registry
        .class(type_name)
        .and_then(|class| class.find_static(name, args.len()))
        .ok_or_else(|| ElError::NoSuchMethod {
            method: name.to_string(),
            arity: args.len(),
            type_name: type_name.to_string(),
        })?;
    Ok(method.invoke(args)?)
}

// ============================================================================
// Property, index and method access
// ============================================================================

fn property(receiver: &Value, name: &str) -> ElResult<Value> {
    let found = match receiver {
        Value::Object(obj) => obj.get(name),
        Value::Map(map) => Some(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::List(items) if name == "size" => Some(Value::Int(items.len() as i32)),
        Value::Str(s) if name == "length" => Some(Value::Int(s.chars().count() as i32)),
        Value::Enum(e) if name == "name" => Some(Value::Str(e.constant.clone())),
        Value::Enum(e) if name == "ordinal" => Some(Value::Int(e.ordinal as i32)),
        _ => None,
    };
    found.ok_or_else(|| ElError::NoSuchProperty {
        property: name.to_string(),
        type_name: receiver.type_name(),
    })
}

fn index_into(receiver: &Value, index: &Value) -> ElResult<Value> {
    match (receiver, index) {
        (Value::List(items), _) => {
            let i = integer_index(index)?;
            usize::try_from(i)
                .ok()
                .and_then(|u| items.get(u))
                .cloned()
                .ok_or(ElError::Index {
                    index: i,
                    len: items.len(),
                })
        }
        (Value::Str(s), _) => {
            let i = integer_index(index)?;
            usize::try_from(i)
                .ok()
                .and_then(|u| s.chars().nth(u))
                .map(Value::Char)
                .ok_or(ElError::Index {
                    index: i,
                    len: s.chars().count(),
                })
        }
        (Value::Map(map), key) => Ok(map.get(&key.to_string()).cloned().unwrap_or(Value::Null)),
        (Value::Object(_), Value::Str(name)) => property(receiver, name),
        (other, _) => Err(ElError::type_error(format!(
            "cannot index into {}",
            other.type_name()
        ))),
    }
}

fn integer_index(index: &Value) -> ElResult<i64> {
    index
        .as_i64()
        .ok_or_else(|| ElError::type_error(format!("index must be an integer, got {}", index.type_name())))
}

fn call(receiver: &Value, name: &str, args: &[Value]) -> ElResult<Value> {
    if let Value::Object(obj) = receiver {
        if let Some(method) = obj
            .class()
            .methods_named(name)
            .find(|m| m.params.len() == args.len())
        {
            return Ok(method.invoke(obj, args)?);
        }
    }
    let result = match (receiver, name, args) {
        (_, "toString", []) => Some(Value::Str(receiver.to_string())),
        (_, "equals", [other]) => Some(Value::Bool(receiver == other)),
        (Value::Str(s), "length", []) => Some(Value::Int(s.chars().count() as i32)),
        (Value::Str(s), "isEmpty", []) => Some(Value::Bool(s.is_empty())),
        (Value::Str(s), "toUpperCase", []) => Some(Value::Str(s.to_uppercase())),
        (Value::Str(s), "toLowerCase", []) => Some(Value::Str(s.to_lowercase())),
        (Value::Str(s), "trim", []) => Some(Value::Str(s.trim().to_string())),
        (Value::Str(s), "contains", [Value::Str(p)]) => Some(Value::Bool(s.contains(p.as_str()))),
        (Value::Str(s), "startsWith", [Value::Str(p)]) => Some(Value::Bool(s.starts_with(p.as_str()))),
        (Value::Str(s), "endsWith", [Value::Str(p)]) => Some(Value::Bool(s.ends_with(p.as_str()))),
        (Value::Str(s), "substring", [start]) => {
            let start = integer_index(start)?;
            Some(Value::Str(substring(s, start, s.chars().count() as i64)?))
        }
        (Value::Str(s), "substring", [start, end]) => {
            let (start, end) = (integer_index(start)?, integer_index(end)?);
            Some(Value::Str(substring(s, start, end)?))
        }
        (Value::List(items), "size", []) => Some(Value::Int(items.len() as i32)),
        (Value::List(items), "isEmpty", []) => Some(Value::Bool(items.is_empty())),
        (Value::List(items), "contains", [item]) => Some(Value::Bool(items.contains(item))),
        (Value::List(_), "get", [index]) => Some(index_into(receiver, index)?),
        (Value::Map(map), "size", []) => Some(Value::Int(map.len() as i32)),
        (Value::Map(map), "isEmpty", []) => Some(Value::Bool(map.is_empty())),
        (Value::Map(map), "containsKey", [key]) => Some(Value::Bool(map.contains_key(&key.to_string()))),
        (Value::Map(_), "get", [key]) => Some(index_into(receiver, key)?),
        (Value::Enum(e), "name", []) => Some(Value::Str(e.constant.clone())),
        (Value::Enum(e), "ordinal", []) => Some(Value::Int(e.ordinal as i32)),
        _ => None,
    };
    result.ok_or_else(|| ElError::NoSuchMethod {
        method: name.to_string(),
        arity: args.len(),
        type_name: receiver.type_name(),
    })
}

fn substring(s: &str, start: i64, end: i64) -> ElResult<String> {
    let len = s.chars().count();
    if start < 0 || end < start || end as usize > len {
        return Err(ElError::Index {
            index: if start < 0 { start } else { end },
            len,
        });
    }
    Ok(s.chars().skip(start as usize).take((end - start) as usize).collect())
}

// ============================================================================
// Operators
// ============================================================================

fn truthy(value: &Value) -> ElResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| ElError::type_error(format!("expected a boolean, got {}", value.type_name())))
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> ElResult<Value> {
    match op {
        BinaryOp::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", left, right)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, left, right)
        }
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right).ok_or_else(|| {
                ElError::type_error(format!(
                    "cannot compare {} {} {}",
                    left.type_name(),
                    op.symbol(),
                    right.type_name()
                ))
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(truthy(left)? && truthy(right)?)),
    }
}

fn is_integral(value: &Value) -> bool {
    matches!(value, Value::Byte(_) | Value::Int(_) | Value::Long(_))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> ElResult<Value> {
    let mismatch = || {
        ElError::type_error(format!(
            "operator {} does not apply to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))
    };
    if is_integral(left) && is_integral(right) {
        let (a, b) = (left.as_i64().ok_or_else(mismatch)?, right.as_i64().ok_or_else(mismatch)?);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div | BinaryOp::Mod if b == 0 => {
                return Err(ElError::type_error("division by zero"))
            }
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        }
        .ok_or_else(|| ElError::type_error("integer overflow"))?;
        let wide = matches!(left, Value::Long(_)) || matches!(right, Value::Long(_));
        return Ok(match i32::try_from(result) {
            Ok(narrow) if !wide => Value::Int(narrow),
            _ => Value::Long(result),
        });
    }
    let (a, b) = (left.as_f64().ok_or_else(mismatch)?, right.as_f64().ok_or_else(mismatch)?);
    Ok(Value::Double(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }))
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) if a.type_name == b.type_name => Some(a.ordinal.cmp(&b.ordinal)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(expression: &str) -> ElResult<Value> {
        ElEvaluator.evaluate(&EvalContext::new(Value::Null), expression)
    }

    #[test]
    fn test_arithmetic_promotion() {
        assert_eq!(run("1 + 2 * 3").unwrap(), Value::Int(7));
        assert_eq!(run("7 / 2").unwrap(), Value::Int(3));
        assert_eq!(run("7 % 4").unwrap(), Value::Int(3));
        assert_eq!(run("1.5 + 1").unwrap(), Value::Double(2.5));
        assert_eq!(run("2147483647 + 1").unwrap(), Value::Long(2_147_483_648));
        assert_eq!(run("-3").unwrap(), Value::Int(-3));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(run("1 / 0"), Err(ElError::Type { .. })));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run("'a' + 1 + 2").unwrap(), Value::str("a12"));
        assert_eq!(run("'n=' + null").unwrap(), Value::str("n=null"));
    }

    #[test]
    fn test_logic_short_circuits() {
        assert_eq!(run("false and #missing").unwrap(), Value::Bool(false));
        assert_eq!(run("true || #missing").unwrap(), Value::Bool(true));
        assert!(matches!(run("1 and true"), Err(ElError::Type { .. })));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run("1 == 1.0").unwrap(), Value::Bool(true));
        assert_eq!(run("'a' < 'b'").unwrap(), Value::Bool(true));
        assert_eq!(run("3 >= 4").unwrap(), Value::Bool(false));
        assert_eq!(run("null == null").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(run("'Hello'.toUpperCase()").unwrap(), Value::str("HELLO"));
        assert_eq!(run("'Hello'.substring(1, 3)").unwrap(), Value::str("el"));
        assert_eq!(run("'Hello'.length()").unwrap(), Value::Int(5));
        assert!(matches!(run("'Hello'.substring(9)"), Err(ElError::Index { .. })));
        assert!(matches!(run("'x'.frobnicate()"), Err(ElError::NoSuchMethod { .. })));
    }

    #[test]
    fn test_variables() {
        let ctx = EvalContext::new(Value::str("root")).with_variable("name", Value::str("ann"));
        assert_eq!(ElEvaluator.evaluate(&ctx, "#name").unwrap(), Value::str("ann"));
        assert_eq!(ElEvaluator.evaluate(&ctx, "#root").unwrap(), Value::str("root"));
        assert!(matches!(
            ElEvaluator.evaluate(&ctx, "#other"),
            Err(ElError::UnknownVariable { .. })
        ));
    }

    #[test]
    fn test_elvis_treats_empty_string_as_missing() {
        assert_eq!(run("'' ?: 'x'").unwrap(), Value::str("x"));
        assert_eq!(run("null ?: 'x'").unwrap(), Value::str("x"));
        assert_eq!(run("'y' ?: 'x'").unwrap(), Value::str("y"));
    }

    #[test]
    fn test_safe_navigation() {
        assert_eq!(run("null?.name").unwrap(), Value::Null);
        assert!(matches!(run("null.name"), Err(ElError::NoSuchProperty { .. })));
    }
}
