//! plait core
//!
//! A backtracking parser-combinator engine. Parsers are immutable values
//! composed from primitives; a run threads one [`ParseState`] through them.
//! Choice points backtrack only while a failed branch stays within its
//! lookahead budget, and failures carry mergeable [`ParseError`]s that keep
//! the most informative diagnosis. [`OperatorTable`] compiles operator
//! declarations into an expression parser.
//!
//! # Example
//!
//! ```
//! use plait_core::{eof, Parser, Reply};
//!
//! let digit = Parser::<[char], u32>::new("digit", |state, _| {
//!     match state.peek().and_then(|c| c.to_digit(10)) {
//!         Some(d) => {
//!             state.advance(1);
//!             Reply::Ok(d, None)
//!         }
//!         None => Reply::Err(Some(state.expecting("digit"))),
//!     }
//! });
//! let number = digit.many1().followed_by(eof("EOF"));
//!
//! assert_eq!(plait_core::run("123", &number, "demo").unwrap(), vec![1, 2, 3]);
//! let err = plait_core::run("12x", &number, "demo").unwrap_err();
//! assert_eq!(err.column(), 3);
//! ```

pub mod combinators;
pub mod error;
pub mod operator;
pub mod parser;
pub mod position;
pub mod run;
pub mod state;
pub mod token;

pub use combinators::{
    action, binary, choice, choice_with_lookahead, eof, expect, fail, index, infixl, infixn,
    infixr, longest, map2, map3, postfix, prefix, raise, seq, sequence, shortest, succeed,
    unary, unexpected, zero, BinaryOp, UnaryOp,
};
pub use error::{ParseError, RenderedError};
pub use operator::{Fixity, OperatorTable};
pub use parser::{Forward, Parser, Reply, DEFAULT_LOOKAHEAD};
pub use position::{DefaultPositionMap, Pos, PositionMap};
pub use run::{run, run_tokens, run_with_config, run_with_map, RunConfig};
pub use state::{ParseState, Snapshot, Source};
pub use token::{any_token, is_token, token, Token, TokenRenderer, TokenStream};

/// A run that did not produce a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    /// The grammar did not match.
    #[error("{module}: parse error at {position}: {message}")]
    Syntax {
        module: String,
        position: Pos,
        message: String,
        error: RenderedError,
    },
    /// A parser raised an abnormal condition.
    #[error("{module}: aborted at {position}: {payload}")]
    Aborted {
        module: String,
        position: Pos,
        index: usize,
        payload: String,
    },
}

impl ParseFailure {
    pub fn module(&self) -> &str {
        match self {
            ParseFailure::Syntax { module, .. } | ParseFailure::Aborted { module, .. } => module,
        }
    }

    pub fn position(&self) -> Pos {
        match self {
            ParseFailure::Syntax { position, .. } | ParseFailure::Aborted { position, .. } => {
                *position
            }
        }
    }

    pub fn line(&self) -> usize {
        self.position().line
    }

    pub fn column(&self) -> usize {
        self.position().column
    }

    /// The rendered diagnosis, or the raised payload.
    pub fn message(&self) -> &str {
        match self {
            ParseFailure::Syntax { message, .. } => message,
            ParseFailure::Aborted { payload, .. } => payload,
        }
    }
}
