//! `when` conditions deciding whether a tour is offered.
//!
//! A small boolean language over the platform flags in [`WhenContext`]:
//!
//! ```text
//! expr  := and ("||" and)*
//! and   := cmp ("&&" cmp)*
//! cmp   := unary (("==" | "!=") unary)?
//! unary := "!" unary | atom
//! atom  := "(" expr ")" | "true" | "false" | string | identifier
//! ```
//!
//! Unknown identifiers are false, so a condition written for another host
//! hides the tour rather than failing discovery.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
};

/// Errors parsing a `when` condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WhenError {
    #[error("invalid condition {expression:?} at offset {offset}")]
    Syntax { expression: String, offset: usize },
}

/// Facts a condition can test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhenContext {
    pub is_linux: bool,
    pub is_mac: bool,
    pub is_windows: bool,
    pub is_web: bool,
}

impl WhenContext {
    /// The context of the running process.
    pub fn current() -> Self {
        Self {
            is_linux: cfg!(target_os = "linux"),
            is_mac: cfg!(target_os = "macos"),
            is_windows: cfg!(windows),
            is_web: false,
        }
    }

    fn lookup(&self, name: &str) -> Option<bool> {
        match name {
            "isLinux" => Some(self.is_linux),
            "isMac" => Some(self.is_mac),
            "isWindows" => Some(self.is_windows),
            "isWeb" => Some(self.is_web),
            _ => None,
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
}

/// A parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Bool(bool),
    Str(String),
    Var(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Op, Box<Expr>, Box<Expr>),
}

#[derive(Debug, PartialEq, Eq)]
enum Value<'a> {
    Bool(bool),
    Str(&'a str),
}

impl Value<'_> {
    fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
        }
    }
}

impl Expr {
    pub fn evaluate(&self, ctx: &WhenContext) -> bool {
        self.value(ctx).truthy()
    }

    fn value(&self, ctx: &WhenContext) -> Value<'_> {
        match self {
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Str(s) => Value::Str(s),
            Expr::Var(name) => Value::Bool(ctx.lookup(name).unwrap_or_else(|| {
                tracing::debug!(name, "unknown identifier in condition");
                false
            })),
            Expr::Not(inner) => Value::Bool(!inner.evaluate(ctx)),
            Expr::And(a, b) => Value::Bool(a.evaluate(ctx) && b.evaluate(ctx)),
            Expr::Or(a, b) => Value::Bool(a.evaluate(ctx) || b.evaluate(ctx)),
            Expr::Compare(op, a, b) => {
                let equal = a.value(ctx) == b.value(ctx);
                Value::Bool(match op {
                    Op::Eq => equal,
                    Op::Ne => !equal,
                })
            }
        }
    }
}

/// Parses a condition.
pub fn parse(expression: &str) -> Result<Expr, WhenError> {
    match all_consuming(ws(or_expr))(expression) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(WhenError::Syntax {
            expression: expression.to_string(),
            offset: expression.len() - e.input.len(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(WhenError::Syntax {
            expression: expression.to_string(),
            offset: expression.len(),
        }),
    }
}

/// Parses and evaluates a condition in one go.
pub fn evaluate(expression: &str, ctx: &WhenContext) -> Result<bool, WhenError> {
    parse(expression).map(|expr| expr.evaluate(ctx))
}

// ── Grammar ──

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = and_expr(input)?;
    fold_many0(
        preceded(ws(tag("||")), and_expr),
        move || first.clone(),
        |acc, next| Expr::Or(Box::new(acc), Box::new(next)),
    )(input)
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = comparison(input)?;
    fold_many0(
        preceded(ws(tag("&&")), comparison),
        move || first.clone(),
        |acc, next| Expr::And(Box::new(acc), Box::new(next)),
    )(input)
}

fn comparison(input: &str) -> IResult<&str, Expr> {
    let (input, left) = unary(input)?;
    let operator = alt((value(Op::Eq, tag("==")), value(Op::Ne, tag("!="))));
    let (input, rest) = opt(pair(ws(operator), unary))(input)?;
    let expr = match rest {
        Some((op, right)) => Expr::Compare(op, Box::new(left), Box::new(right)),
        None => left,
    };
    Ok((input, expr))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('!')), unary), |e| Expr::Not(Box::new(e))),
        atom,
    ))(input)
}

fn atom(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        delimited(char('('), or_expr, char(')')),
        map(string_literal, |s: &str| Expr::Str(s.to_string())),
        map(identifier, |name: &str| match name {
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            _ => Expr::Var(name.to_string()),
        }),
    )))(input)
}

fn string_literal(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
    ))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}
