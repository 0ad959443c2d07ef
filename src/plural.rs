//! Plural-Forms expressions from compiled gettext catalogs
//!
//! A catalog header carries a line such as
//! `Plural-Forms: nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 ? 1 : 2);`.
//! The expression is a tiny C-like language over a single variable `n`.
//! It is parsed here by a recursive-descent parser into a [`PluralExpr`]
//! tree and evaluated directly; nothing is ever handed to an interpreter.
//!
//! Precedence follows C, lowest first:
//!
//! | level | operators            | associativity |
//! |-------|----------------------|---------------|
//! | 1     | `?:`                 | right         |
//! | 2     | `\|\|`               | left          |
//! | 3     | `&&`                 | left          |
//! | 4     | `==` `!=`            | left          |
//! | 5     | `<` `>` `<=` `>=`    | left          |
//! | 6     | `+` `-`              | left          |
//! | 7     | `*` `/` `%`          | left          |
//! | 8     | unary `!` `-`        | right         |

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::{HummError, HummResult};

/// Nesting limit for parenthesised groups and ternaries
const MAX_DEPTH: usize = 64;

static PLURAL_FORMS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)plural-forms: (.*)").expect("valid regex"));

static PLURAL_FORMS_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*nplurals\s*=\s*(\d+)\s*;\s*plural=(.*)").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn apply(self, lhs: u64, rhs: u64) -> u64 {
        match self {
            BinaryOp::Or => u64::from(lhs != 0 || rhs != 0),
            BinaryOp::And => u64::from(lhs != 0 && rhs != 0),
            BinaryOp::Eq => u64::from(lhs == rhs),
            BinaryOp::Ne => u64::from(lhs != rhs),
            BinaryOp::Lt => u64::from(lhs < rhs),
            BinaryOp::Gt => u64::from(lhs > rhs),
            BinaryOp::Le => u64::from(lhs <= rhs),
            BinaryOp::Ge => u64::from(lhs >= rhs),
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
            // Division by zero yields zero rather than aborting the request
            BinaryOp::Div => lhs.checked_div(rhs).unwrap_or(0),
            BinaryOp::Rem => lhs.checked_rem(rhs).unwrap_or(0),
        }
    }
}

/// Parsed plural expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluralExpr {
    /// The count variable `n`
    Count,
    Literal(u64),
    Not(Box<PluralExpr>),
    Negate(Box<PluralExpr>),
    Binary(BinaryOp, Box<PluralExpr>, Box<PluralExpr>),
    Conditional(Box<PluralExpr>, Box<PluralExpr>, Box<PluralExpr>),
}

impl PluralExpr {
    /// Parse an expression such as `n != 1` or `n==1 ? 0 : 1`
    ///
    /// Whitespace and a trailing `;` are ignored. Anything outside the
    /// supported operator set is an error.
    pub fn parse(source: &str) -> HummResult<Self> {
        let tokens = tokenize(source)?;
        let mut parser = ExprParser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.conditional()?;
        if parser.pos != parser.tokens.len() {
            return Err(HummError::PluralExpression(format!(
                "unexpected token {:?} in '{}'",
                parser.tokens[parser.pos], source
            )));
        }
        Ok(expr)
    }

    /// Evaluate with C unsigned long semantics (wrapping arithmetic, booleans as 0/1)
    pub fn evaluate(&self, n: u64) -> u64 {
        match self {
            PluralExpr::Count => n,
            PluralExpr::Literal(value) => *value,
            PluralExpr::Not(inner) => u64::from(inner.evaluate(n) == 0),
            PluralExpr::Negate(inner) => inner.evaluate(n).wrapping_neg(),
            PluralExpr::Binary(op, lhs, rhs) => match op {
                // Short-circuit like C
                BinaryOp::Or => u64::from(lhs.evaluate(n) != 0 || rhs.evaluate(n) != 0),
                BinaryOp::And => u64::from(lhs.evaluate(n) != 0 && rhs.evaluate(n) != 0),
                _ => op.apply(lhs.evaluate(n), rhs.evaluate(n)),
            },
            PluralExpr::Conditional(cond, then, otherwise) => {
                if cond.evaluate(n) != 0 {
                    then.evaluate(n)
                } else {
                    otherwise.evaluate(n)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Count,
    Number(u64),
    Question,
    Colon,
    OrOr,
    AndAnd,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    LParen,
    RParen,
}

fn tokenize(source: &str) -> HummResult<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        let next = bytes.get(i + 1).copied();
        let (token, width) = match ch {
            b' ' | b'\t' | b'\r' | b'\n' | b';' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let value = source[start..i].parse::<u64>().map_err(|e| {
                    HummError::PluralExpression(format!("bad literal '{}': {}", &source[start..i], e))
                })?;
                tokens.push(Token::Number(value));
                continue;
            }
            b'n' => (Token::Count, 1),
            b'?' => (Token::Question, 1),
            b':' => (Token::Colon, 1),
            b'|' if next == Some(b'|') => (Token::OrOr, 2),
            b'&' if next == Some(b'&') => (Token::AndAnd, 2),
            b'=' if next == Some(b'=') => (Token::EqEq, 2),
            b'!' if next == Some(b'=') => (Token::NotEq, 2),
            b'<' if next == Some(b'=') => (Token::Le, 2),
            b'>' if next == Some(b'=') => (Token::Ge, 2),
            b'!' => (Token::Bang, 1),
            b'<' => (Token::Lt, 1),
            b'>' => (Token::Gt, 1),
            b'+' => (Token::Plus, 1),
            b'-' => (Token::Minus, 1),
            b'*' => (Token::Star, 1),
            b'/' => (Token::Slash, 1),
            b'%' => (Token::Percent, 1),
            b'(' => (Token::LParen, 1),
            b')' => (Token::RParen, 1),
            other => {
                return Err(HummError::PluralExpression(format!(
                    "unsupported character '{}' at offset {} in '{}'",
                    other as char, i, source
                )));
            }
        };
        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> HummResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(HummError::PluralExpression(format!(
                "expected {:?}, found {:?}",
                token,
                self.peek()
            )))
        }
    }

    fn enter(&mut self) -> HummResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(HummError::PluralExpression(
                "expression nested too deeply".to_string(),
            ));
        }
        Ok(())
    }

    fn conditional(&mut self) -> HummResult<PluralExpr> {
        self.enter()?;
        let cond = self.logical_or()?;
        let expr = if self.eat(Token::Question) {
            let then = self.conditional()?;
            self.expect(Token::Colon)?;
            let otherwise = self.conditional()?;
            PluralExpr::Conditional(Box::new(cond), Box::new(then), Box::new(otherwise))
        } else {
            cond
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> HummResult<PluralExpr>,
        ops: &[(Token, BinaryOp)],
    ) -> HummResult<PluralExpr> {
        let mut lhs = next(self)?;
        'outer: loop {
            for &(token, op) in ops {
                if self.eat(token) {
                    let rhs = next(self)?;
                    lhs = PluralExpr::Binary(op, Box::new(lhs), Box::new(rhs));
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn logical_or(&mut self) -> HummResult<PluralExpr> {
        self.binary_level(Self::logical_and, &[(Token::OrOr, BinaryOp::Or)])
    }

    fn logical_and(&mut self) -> HummResult<PluralExpr> {
        self.binary_level(Self::equality, &[(Token::AndAnd, BinaryOp::And)])
    }

    fn equality(&mut self) -> HummResult<PluralExpr> {
        self.binary_level(
            Self::relational,
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::Ne)],
        )
    }

    fn relational(&mut self) -> HummResult<PluralExpr> {
        self.binary_level(
            Self::additive,
            &[
                (Token::Le, BinaryOp::Le),
                (Token::Ge, BinaryOp::Ge),
                (Token::Lt, BinaryOp::Lt),
                (Token::Gt, BinaryOp::Gt),
            ],
        )
    }

    fn additive(&mut self) -> HummResult<PluralExpr> {
        self.binary_level(
            Self::multiplicative,
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
        )
    }

    fn multiplicative(&mut self) -> HummResult<PluralExpr> {
        self.binary_level(
            Self::unary,
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
        )
    }

    fn unary(&mut self) -> HummResult<PluralExpr> {
        if self.eat(Token::Bang) {
            self.enter()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(PluralExpr::Not(Box::new(inner)));
        }
        if self.eat(Token::Minus) {
            self.enter()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(PluralExpr::Negate(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> HummResult<PluralExpr> {
        match self.peek() {
            Some(Token::Count) => {
                self.pos += 1;
                Ok(PluralExpr::Count)
            }
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(PluralExpr::Literal(value))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.conditional()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(HummError::PluralExpression(format!(
                "expected operand, found {:?}",
                other
            ))),
        }
    }
}

/// Maps a count to a zero-based plural form index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralSelector {
    nplurals: usize,
    expr: Option<PluralExpr>,
}

impl Default for PluralSelector {
    /// Two forms: index 0 for exactly one, index 1 otherwise
    fn default() -> Self {
        PluralSelector {
            nplurals: 2,
            expr: None,
        }
    }
}

impl PluralSelector {
    pub fn new(nplurals: usize, expr: PluralExpr) -> Self {
        PluralSelector {
            nplurals,
            expr: Some(expr),
        }
    }

    /// Build the selector declared by a catalog metadata header
    ///
    /// Falls back to [`PluralSelector::default`] when the header has no
    /// `Plural-Forms` line or its expression cannot be parsed.
    pub fn from_header(header: &str) -> Self {
        let Some((nplurals, source)) = match_plural_forms(header) else {
            return PluralSelector::default();
        };

        match PluralExpr::parse(&sanitize_expression(&source)) {
            Ok(expr) => PluralSelector::new(nplurals, expr),
            Err(e) => {
                warn!(expression = %source, error = %e, "Ignoring unusable Plural-Forms expression");
                PluralSelector::default()
            }
        }
    }

    pub fn nplurals(&self) -> usize {
        self.nplurals
    }

    /// Plural form index for `n`, never greater than `nplurals - 1`
    pub fn select(&self, n: u64) -> usize {
        let plural = match &self.expr {
            Some(expr) => expr.evaluate(n),
            None => u64::from(n != 1),
        };
        let last = self.nplurals.saturating_sub(1);
        usize::try_from(plural).map_or(last, |index| index.min(last))
    }
}

/// Extract `(nplurals, expression)` from a catalog header
pub fn match_plural_forms(header: &str) -> Option<(usize, String)> {
    let line = PLURAL_FORMS_LINE.captures(header)?.get(1)?.as_str();
    let body = PLURAL_FORMS_BODY.captures(line)?;
    let nplurals = body.get(1)?.as_str().parse::<usize>().ok()?;
    Some((nplurals, body.get(2)?.as_str().to_string()))
}

/// Drop every character outside the expression alphabet
///
/// This also removes the trailing `;` terminator and any whitespace.
fn sanitize_expression(source: &str) -> String {
    source
        .chars()
        .filter(|c| c.is_ascii_digit() || "n:()?|&=!<>+*/%-".contains(*c))
        .collect()
}
