//! Skip predicates.
//!
//! A skip predicate is a small boolean expression evaluated before a node
//! is written. When it holds the write is skipped.
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | "true" | "false"
//!          | ident [ ( "==" | "!=" ) string ]
//! ```
//!
//! `missing` and `exists` tell whether the node matched an existing row.
//! Other identifiers name node parameters (`resourceType`, `handle`, `name`,
//! ...); a bare parameter is true when it is set to anything but `false`.
//! Unknown parameters are empty.

use crate::error::{EngineError, EngineResult};
use std::collections::BTreeMap;

/// Values a skip predicate may refer to.
#[derive(Debug, Clone, Default)]
pub struct SkipEnv {
    exists: bool,
    params: BTreeMap<String, String>,
}

impl SkipEnv {
    /// Creates an environment for a node that does or does not match an
    /// existing row.
    pub fn new(exists: bool) -> Self {
        Self {
            exists,
            params: BTreeMap::new(),
        }
    }

    /// Adds a string parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or_default()
    }

    fn flag(&self, name: &str) -> bool {
        match name {
            "missing" => !self.exists,
            "exists" => self.exists,
            _ => {
                let v = self.param(name);
                !v.is_empty() && v != "false"
            }
        }
    }
}

/// Evaluates an optional skip predicate; an empty or absent one never skips.
pub fn should_skip(expr: Option<&str>, env: &SkipEnv) -> EngineResult<bool> {
    match expr.map(str::trim) {
        None | Some("") => Ok(false),
        Some(expr) => evaluate(expr, env),
    }
}

/// Parses and evaluates an expression.
pub fn evaluate(expr: &str, env: &SkipEnv) -> EngineResult<bool> {
    let fail = |reason: String| EngineError::SkipExpression {
        expr: expr.to_string(),
        reason,
    };

    let tokens = tokenize(expr).map_err(fail)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        env,
    };
    let value = parser.or().map_err(fail)?;
    if let Some(t) = parser.peek() {
        return Err(fail(format!("unexpected {t:?}")));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Or,
    And,
    Not,
    Eq,
    Ne,
    Open,
    Close,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut out = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                out.push(Token::Open);
            }
            ')' => {
                chars.next();
                out.push(Token::Close);
            }
            '|' | '&' | '=' => {
                chars.next();
                if chars.next() != Some(c) {
                    return Err(format!("expected {c}{c}"));
                }
                out.push(match c {
                    '|' => Token::Or,
                    '&' => Token::And,
                    _ => Token::Eq,
                });
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    out.push(Token::Ne);
                } else {
                    out.push(Token::Not);
                }
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        None => return Err("unterminated string".into()),
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(e) => s.push(e),
                            None => return Err("unterminated string".into()),
                        },
                        Some(c) => s.push(c),
                    }
                }
                out.push(Token::Str(s));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_' || c == '.') {
                        break;
                    }
                    s.push(c);
                    chars.next();
                }
                out.push(Token::Ident(s));
            }
            c => return Err(format!("unexpected character {c:?}")),
        }
    }

    Ok(out)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    env: &'a SkipEnv,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, t: &Token) -> bool {
        if self.peek() == Some(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    // Both operands are always parsed so syntax errors surface regardless of
    // the values involved.
    fn or(&mut self) -> Result<bool, String> {
        let mut v = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            v = v || rhs;
        }
        Ok(v)
    }

    fn and(&mut self) -> Result<bool, String> {
        let mut v = self.unary()?;
        while self.eat(&Token::And) {
            let rhs = self.unary()?;
            v = v && rhs;
        }
        Ok(v)
    }

    fn unary(&mut self) -> Result<bool, String> {
        if self.eat(&Token::Not) {
            return Ok(!self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<bool, String> {
        match self.bump() {
            Some(Token::Open) => {
                let v = self.or()?;
                if !self.eat(&Token::Close) {
                    return Err("expected )".into());
                }
                Ok(v)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => self.comparison(&name),
            },
            Some(t) => Err(format!("unexpected {t:?}")),
            None => Err("unexpected end of expression".into()),
        }
    }

    fn comparison(&mut self, name: &str) -> Result<bool, String> {
        let negate = match self.peek() {
            Some(Token::Eq) => false,
            Some(Token::Ne) => true,
            _ => return Ok(self.env.flag(name)),
        };
        self.pos += 1;

        match self.bump() {
            Some(Token::Str(lit)) => Ok((self.env.param(name) == lit) != negate),
            _ => Err(format!("expected string after {name}")),
        }
    }
}
