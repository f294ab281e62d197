//! Lexer for the expression language.
//!
//! Built on logos. Keywords are matched as tokens ahead of the identifier
//! regex; variables (`#name`) and bean references (`@name`) are lexed as
//! single tokens carrying their bare name.

use std::ops::Range;

use logos::Logos;

use crate::error::{ElError, ElResult};

/// Byte range of a token in the source
pub type Span = Range<usize>;

/// Expression tokens
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Literals
    /// Single-quoted string; `''` is an escaped quote
    #[regex(r"'([^']|'')*'", parse_string)]
    Str(String),

    /// Integer literal
    #[regex(r"[0-9]+", parse_int)]
    Int(i64),

    /// Decimal literal
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    Float(f64),

    /// `true`
    #[token("true")]
    True,

    /// `false`
    #[token("false")]
    False,

    /// `null`
    #[token("null")]
    Null,

    // Keyword operators
    /// `and` / `&&`
    #[token("and")]
    #[token("&&")]
    And,

    /// `or` / `||`
    #[token("or")]
    #[token("||")]
    Or,

    /// `not` / `!`
    #[token("not")]
    #[token("!")]
    Not,

    // References
    /// `#name`
    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Variable(String),

    /// `@name`
    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Bean(String),

    /// Opening of a type reference, `T(`
    #[token("T(")]
    TypeStart,

    /// Identifier
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Punctuation
    /// `.`
    #[token(".")]
    Dot,

    /// `?.`
    #[token("?.")]
    SafeDot,

    /// `?:`
    #[token("?:")]
    Elvis,

    /// `?`
    #[token("?")]
    Question,

    /// `:`
    #[token(":")]
    Colon,

    /// `,`
    #[token(",")]
    Comma,

    /// `(`
    #[token("(")]
    LParen,

    /// `)`
    #[token(")")]
    RParen,

    /// `[`
    #[token("[")]
    LBracket,

    /// `]`
    #[token("]")]
    RBracket,

    // Arithmetic
    /// `+`
    #[token("+")]
    Plus,

    /// `-`
    #[token("-")]
    Minus,

    /// `*`
    #[token("*")]
    Star,

    /// `/`
    #[token("/")]
    Slash,

    /// `%`
    #[token("%")]
    Percent,

    // Comparison
    /// `==`
    #[token("==")]
    EqEq,

    /// `!=`
    #[token("!=")]
    NotEq,

    /// `<`
    #[token("<")]
    Lt,

    /// `<=`
    #[token("<=")]
    LtEq,

    /// `>`
    #[token(">")]
    Gt,

    /// `>=`
    #[token(">=")]
    GtEq,
}

fn parse_string(lex: &mut logos::Lexer<Token>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].replace("''", "'")
}

fn parse_int(lex: &mut logos::Lexer<Token>) -> Option<i64> {
    lex.slice().parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Split an expression into tokens with their spans
pub fn tokenize(source: &str) -> ElResult<Vec<(Token, Span)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(ElError::Lex {
                    text: lexer.slice().to_string(),
                    offset: lexer.span().start,
                })
            }
        }
    }
    Ok(tokens)
}
