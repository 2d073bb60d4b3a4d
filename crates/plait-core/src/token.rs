//! Tokens and token-level primitives.

use std::fmt;
use std::sync::Arc;

use crate::parser::{Parser, Reply};
use crate::state::Source;

/// A lexed value together with the character range it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<V> {
    pub index: usize,
    pub length: usize,
    pub value: V,
}

impl<V> Token<V> {
    pub fn new(index: usize, length: usize, value: V) -> Self {
        Self {
            index,
            length,
            value,
        }
    }

    /// Character index just past this token.
    pub fn end(&self) -> usize {
        self.index + self.length
    }
}

/// Renders a token value inside an error message.
pub type TokenRenderer<V> = Arc<dyn Fn(&V) -> String + Send + Sync>;

/// A token array ready for token-level parsing.
///
/// `end_index` is the character index reported for errors at end of input.
pub struct TokenStream<V> {
    tokens: Vec<Token<V>>,
    end_index: usize,
    eof_label: String,
    renderer: TokenRenderer<V>,
}

impl<V: fmt::Debug + 'static> TokenStream<V> {
    /// A stream rendering tokens with their `Debug` form and EOF as `EOF`.
    pub fn new(tokens: Vec<Token<V>>, end_index: usize) -> Self {
        Self::with_parts(tokens, end_index, "EOF", Arc::new(|v: &V| format!("{v:?}")))
    }
}

impl<V> TokenStream<V> {
    pub fn with_parts(
        tokens: Vec<Token<V>>,
        end_index: usize,
        eof_label: impl Into<String>,
        renderer: TokenRenderer<V>,
    ) -> Self {
        Self {
            tokens,
            end_index,
            eof_label: eof_label.into(),
            renderer,
        }
    }

    pub fn tokens(&self) -> &[Token<V>] {
        &self.tokens
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    pub fn eof_label(&self) -> &str {
        &self.eof_label
    }
}

impl<V> fmt::Debug for TokenStream<V>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStream")
            .field("tokens", &self.tokens)
            .field("end_index", &self.end_index)
            .field("eof_label", &self.eof_label)
            .finish_non_exhaustive()
    }
}

impl<V> Source for TokenStream<V> {
    type Item = Token<V>;

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn get(&self, at: usize) -> Option<&Token<V>> {
        self.tokens.get(at)
    }

    fn index_at(&self, at: usize) -> usize {
        self.tokens.get(at).map_or(self.end_index, |t| t.index)
    }

    fn describe_at(&self, at: usize) -> String {
        match self.tokens.get(at) {
            Some(t) => (self.renderer)(&t.value),
            None => self.eof_label.clone(),
        }
    }
}

// =============================================================================
// Token-level primitives
// =============================================================================

/// Consume one token whose value `recognize` maps to `Some`.
///
/// At end of input or on a refusal, fails with the system mismatch for the
/// token under the cursor.
pub fn token<V, R>(
    recognize: impl Fn(&V) -> Option<R> + Send + Sync + 'static,
) -> Parser<TokenStream<V>, R>
where
    V: 'static,
    R: 'static,
{
    Parser::<TokenStream<V>, R>::new("token", move |state, _| {
        match state.peek().and_then(|t| recognize(&t.value)) {
            Some(r) => {
                state.advance(1);
                Reply::Ok(r, None)
            }
            None => Reply::Err(Some(state.unexpected_here())),
        }
    })
}

/// Consume one token equal to `expected`.
pub fn is_token<V>(expected: V) -> Parser<TokenStream<V>, V>
where
    V: PartialEq + Clone + fmt::Debug + Send + Sync + 'static,
{
    let name = format!("{expected:?}");
    token(move |v: &V| (*v == expected).then(|| v.clone())).named(name)
}

/// Consume any one token.
pub fn any_token<V>() -> Parser<TokenStream<V>, Token<V>>
where
    V: Clone + 'static,
{
    Parser::<TokenStream<V>, Token<V>>::new("any_token", |state, _| match state.peek() {
        Some(t) => {
            let t = t.clone();
            state.advance(1);
            Reply::Ok(t, None)
        }
        None => Reply::Err(Some(state.unexpected_here())),
    })
}
