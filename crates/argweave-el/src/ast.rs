//! Expression syntax tree

use argweave_core::Value;

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Value),
    /// The evaluation root's implicit receiver (bare identifiers read from it)
    This,
    /// `#name`
    Variable(String),
    /// `@name`
    Bean(String),
    /// `T(qualified.Name)`
    Type(String),
    /// `target.name` or `target?.name`
    Property {
        /// Receiver
        target: Box<Expr>,
        /// Property name
        name: String,
        /// `?.` yields null on a null receiver instead of failing
        safe: bool,
    },
    /// `target[index]`
    Index {
        /// Indexed value
        target: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
    },
    /// `target.name(args)` or `target?.name(args)`
    MethodCall {
        /// Receiver
        target: Box<Expr>,
        /// Method name
        name: String,
        /// Arguments
        args: Vec<Expr>,
        /// `?.` yields null on a null receiver instead of failing
        safe: bool,
    },
    /// Prefix operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Infix operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// `condition ? then : otherwise`
    Ternary {
        /// Boolean condition
        condition: Box<Expr>,
        /// Value when true
        then: Box<Expr>,
        /// Value when false
        otherwise: Box<Expr>,
    },
    /// `value ?: fallback`
    Elvis {
        /// Preferred value
        value: Box<Expr>,
        /// Used when the value is null or an empty string
        fallback: Box<Expr>,
    },
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation
    Not,
    /// Arithmetic negation
    Neg,
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+` (numeric addition or string concatenation)
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `and`
    And,
    /// `or`
    Or,
}

impl BinaryOp {
    /// Source form of the operator
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}
