//! plait calc
//!
//! Evaluates arithmetic expressions such as `max(1, 2) * sin(pi / 2)`.
//! Input is lexed into [`CalcToken`]s, then parsed and evaluated in one
//! pass by an operator-precedence grammar over the tokens.
//!
//! Logical and comparison operators yield `1` or `0`. Function arguments
//! are separated by `,` or `#`.
//!
//! ```
//! use plait_calc::Calculator;
//!
//! let calc = Calculator::default();
//! assert_eq!(calc.evaluate("2 ** 3 ** 2").unwrap(), 512.0);
//! assert_eq!(calc.evaluate("1 < 2 && !0").unwrap(), 1.0);
//! ```

pub mod functions;
pub mod grammar;
pub mod token;

use plait_core::{run_with_config, ParseFailure, Parser, Pos, RunConfig};
use plait_lexer::{parse_tokens_with, TokenConfig};
use tracing::debug;

pub use functions::{AngleMode, FunctionTable, Unresolved};
pub use token::CalcToken;

/// Calculator error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    /// The expression is malformed.
    #[error(transparent)]
    Parse(#[from] ParseFailure),
    /// A name matched no constant or function.
    #[error("{module}: at {position}: {message}")]
    Unresolved {
        module: String,
        position: Pos,
        message: String,
    },
}

impl CalcError {
    pub fn position(&self) -> Pos {
        match self {
            CalcError::Parse(failure) => failure.position(),
            CalcError::Unresolved { position, .. } => *position,
        }
    }
}

/// Settings for a [`Calculator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcConfig {
    pub angle_mode: AngleMode,
    /// Name reported in errors.
    pub module: String,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            angle_mode: AngleMode::default(),
            module: "calculator".to_string(),
        }
    }
}

impl CalcConfig {
    pub fn with_angle_mode(mut self, angle_mode: AngleMode) -> Self {
        self.angle_mode = angle_mode;
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }
}

/// A compiled expression evaluator. Build once, evaluate many times.
#[derive(Debug, Clone)]
pub struct Calculator {
    parser: Parser<[char], f64>,
    run_config: RunConfig,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::with_config(CalcConfig::default())
    }
}

impl Calculator {
    pub fn new(angle_mode: AngleMode) -> Self {
        Self::with_config(CalcConfig::default().with_angle_mode(angle_mode))
    }

    pub fn with_config(config: CalcConfig) -> Self {
        let tokens = TokenConfig::new()
            .with_renderer(|t: &CalcToken| t.to_string())
            .with_eof_label("end of expression");
        let parser = parse_tokens_with(
            tokens,
            token::lexer(),
            grammar::expression(FunctionTable::new(config.angle_mode)),
        );
        Self {
            parser,
            run_config: RunConfig::default().with_module(config.module),
        }
    }

    /// Evaluate `expression`.
    pub fn evaluate(&self, expression: &str) -> Result<f64, CalcError> {
        let value = run_with_config(expression, &self.parser, &self.run_config).map_err(
            |failure| match failure {
                ParseFailure::Aborted {
                    module,
                    position,
                    payload,
                    ..
                } => CalcError::Unresolved {
                    module,
                    position,
                    message: payload,
                },
                other => CalcError::from(other),
            },
        )?;
        debug!(expression, value, "evaluated");
        Ok(value)
    }

    /// Check that `expression` parses and every name resolves.
    pub fn check(&self, expression: &str) -> Result<(), CalcError> {
        self.evaluate(expression).map(|_| ())
    }
}
