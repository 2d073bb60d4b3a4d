//! Operator-precedence expression builder.
//!
//! Operators are registered on an [`OperatorTable`] with a precedence number
//! (higher binds tighter) and a [`Fixity`]. [`OperatorTable::build`] consumes
//! the table and wraps the operand parser level by level, tightest first.
//!
//! ```
//! use plait_core::{binary, OperatorTable, Parser, Reply};
//!
//! fn sym(c: char) -> Parser<[char], char> {
//!     Parser::new(c.to_string(), move |state, _| match state.peek() {
//!         Some(&x) if x == c => {
//!             state.advance(1);
//!             Reply::Ok(c, None)
//!         }
//!         _ => Reply::Err(Some(state.unexpected_here())),
//!     })
//! }
//!
//! let digit = Parser::<[char], i64>::new("digit", |state, _| {
//!     match state.peek().and_then(|c| c.to_digit(10)) {
//!         Some(d) => {
//!             state.advance(1);
//!             Reply::Ok(i64::from(d), None)
//!         }
//!         None => Reply::Err(Some(state.expecting("digit"))),
//!     }
//! });
//!
//! let expr = OperatorTable::new()
//!     .infixl(sym('+').map(|_| binary(|a: i64, b: i64| a + b)), 10)
//!     .infixl(sym('*').map(|_| binary(|a: i64, b: i64| a * b)), 20)
//!     .build(digit);
//! assert_eq!(plait_core::run("1+2*3", &expr, "demo").unwrap(), 7);
//! ```

use tracing::debug;

use crate::combinators::{choice, infixl, infixn, infixr, postfix, prefix, BinaryOp, UnaryOp};
use crate::parser::Parser;
use crate::state::Source;

/// How an operator attaches to its operands.
///
/// The declaration order is the tie-break within one precedence level:
/// earlier variants are applied closer to the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fixity {
    Prefix,
    Postfix,
    InfixLeft,
    InfixRight,
    InfixNone,
}

enum OperatorParser<S: ?Sized, T> {
    Unary(Parser<S, UnaryOp<T>>),
    Binary(Parser<S, BinaryOp<T>>),
}

struct Operator<S: ?Sized, T> {
    precedence: i32,
    fixity: Fixity,
    parser: OperatorParser<S, T>,
}

/// Registration side of the expression builder.
pub struct OperatorTable<S: ?Sized, T> {
    operators: Vec<Operator<S, T>>,
}

impl<S: ?Sized, T> Default for OperatorTable<S, T> {
    fn default() -> Self {
        Self {
            operators: Vec::new(),
        }
    }
}

impl<S, T> OperatorTable<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, precedence: i32, fixity: Fixity, parser: OperatorParser<S, T>) -> Self {
        self.operators.push(Operator {
            precedence,
            fixity,
            parser,
        });
        self
    }

    pub fn prefix(self, op: Parser<S, UnaryOp<T>>, precedence: i32) -> Self {
        self.push(precedence, Fixity::Prefix, OperatorParser::Unary(op))
    }

    pub fn postfix(self, op: Parser<S, UnaryOp<T>>, precedence: i32) -> Self {
        self.push(precedence, Fixity::Postfix, OperatorParser::Unary(op))
    }

    pub fn infixl(self, op: Parser<S, BinaryOp<T>>, precedence: i32) -> Self {
        self.push(precedence, Fixity::InfixLeft, OperatorParser::Binary(op))
    }

    pub fn infixr(self, op: Parser<S, BinaryOp<T>>, precedence: i32) -> Self {
        self.push(precedence, Fixity::InfixRight, OperatorParser::Binary(op))
    }

    /// A non-associative operator: chaining two at this level is an error.
    pub fn infixn(self, op: Parser<S, BinaryOp<T>>, precedence: i32) -> Self {
        self.push(precedence, Fixity::InfixNone, OperatorParser::Binary(op))
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Compile the table around `operand` into one expression parser.
    ///
    /// Operators sharing a precedence and fixity become one level, tried as a
    /// choice in registration order.
    pub fn build(self, operand: Parser<S, T>) -> Parser<S, T> {
        let mut operators = self.operators;
        operators.sort_by(|a, b| {
            b.precedence
                .cmp(&a.precedence)
                .then(a.fixity.cmp(&b.fixity))
        });

        let mut expr = operand;
        let mut levels = 0usize;
        let mut pending = operators.into_iter().peekable();
        while let Some(head) = pending.next() {
            let (precedence, fixity) = (head.precedence, head.fixity);
            let mut level = vec![head.parser];
            while let Some(next) =
                pending.next_if(|op| op.precedence == precedence && op.fixity == fixity)
            {
                level.push(next.parser);
            }
            expr = wrap_level(fixity, level, expr);
            levels += 1;
        }
        debug!(levels, "operator table compiled");
        expr
    }
}

fn wrap_level<S, T>(
    fixity: Fixity,
    level: Vec<OperatorParser<S, T>>,
    operand: Parser<S, T>,
) -> Parser<S, T>
where
    S: Source + ?Sized + 'static,
    T: 'static,
{
    let unary = || {
        choice(level.iter().filter_map(|op| match op {
            OperatorParser::Unary(p) => Some(p.clone()),
            OperatorParser::Binary(_) => None,
        }))
    };
    let binary = || {
        choice(level.iter().filter_map(|op| match op {
            OperatorParser::Binary(p) => Some(p.clone()),
            OperatorParser::Unary(_) => None,
        }))
    };
    match fixity {
        Fixity::Prefix => prefix(unary(), operand),
        Fixity::Postfix => postfix(unary(), operand),
        Fixity::InfixLeft => infixl(binary(), operand),
        Fixity::InfixRight => infixr(binary(), operand),
        Fixity::InfixNone => infixn(binary(), operand),
    }
}
