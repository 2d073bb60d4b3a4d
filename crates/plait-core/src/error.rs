//! Mergeable parse errors.
//!
//! A [`ParseError`] is an immutable, cheaply clonable value. Alternatives that
//! fail hand their errors to [`ParseError::merge`], which keeps the error that
//! got furthest into the input, then the one with the higher precedence, and
//! only combines the two when neither wins. Rendering into messages happens
//! once, at the top of a run, through [`ParseError::render`].

use std::fmt;
use std::sync::Arc;

/// Precedence of a bare mismatch ("x encountered").
pub const PRECEDENCE_BARE: u8 = 1;
/// Precedence of an annotated error (expecting, unexpected, or raw message).
pub const PRECEDENCE_ANNOTATED: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    node: Arc<Node>,
}

#[derive(Debug, PartialEq)]
enum Node {
    Leaf(Leaf),
    Expecting { cause: ParseError, label: String },
    Merged { first: ParseError, second: ParseError },
}

#[derive(Debug, Default, PartialEq)]
struct Leaf {
    index: usize,
    precedence: u8,
    no_merge: bool,
    unexpected: Option<String>,
    expecting: Option<String>,
    raw: Option<String>,
    encountered: Option<String>,
    abnormal: Option<Arc<str>>,
}

impl Leaf {
    fn into_error(mut self) -> ParseError {
        if self.precedence == 0 {
            let annotated =
                self.unexpected.is_some() || self.expecting.is_some() || self.raw.is_some();
            self.precedence = if annotated {
                PRECEDENCE_ANNOTATED
            } else {
                PRECEDENCE_BARE
            };
        }
        ParseError {
            node: Arc::new(Node::Leaf(self)),
        }
    }
}

impl ParseError {
    // --- Constructors ---

    /// "expecting `label`" at `index`.
    pub fn expecting(index: usize, label: impl Into<String>) -> Self {
        Leaf {
            index,
            expecting: Some(label.into()),
            ..Leaf::default()
        }
        .into_error()
    }

    /// "unexpected `label`" at `index`.
    pub fn unexpected(index: usize, label: impl Into<String>) -> Self {
        Leaf {
            index,
            unexpected: Some(label.into()),
            ..Leaf::default()
        }
        .into_error()
    }

    /// A free-form message at `index`.
    pub fn raw(index: usize, message: impl Into<String>) -> Self {
        Leaf {
            index,
            raw: Some(message.into()),
            ..Leaf::default()
        }
        .into_error()
    }

    /// The mismatch reported by input primitives: "`encountered` encountered".
    ///
    /// Never combined with another system mismatch at the same index.
    pub fn system_unexpected(index: usize, encountered: impl Into<String>) -> Self {
        Leaf {
            index,
            precedence: PRECEDENCE_BARE,
            no_merge: true,
            encountered: Some(encountered.into()),
            ..Leaf::default()
        }
        .into_error()
    }

    /// A user-raised condition that aborts the whole run.
    pub fn abnormal(index: usize, payload: impl Into<String>) -> Self {
        let payload: String = payload.into();
        Leaf {
            index,
            precedence: PRECEDENCE_ANNOTATED,
            no_merge: true,
            abnormal: Some(Arc::from(payload)),
            ..Leaf::default()
        }
        .into_error()
    }

    // --- Accessors ---

    pub fn index(&self) -> usize {
        match &*self.node {
            Node::Leaf(leaf) => leaf.index,
            Node::Expecting { cause, .. } => cause.index(),
            Node::Merged { first, .. } => first.index(),
        }
    }

    pub fn precedence(&self) -> u8 {
        match &*self.node {
            Node::Leaf(leaf) => leaf.precedence,
            Node::Expecting { cause, .. } => cause.precedence().max(PRECEDENCE_ANNOTATED),
            Node::Merged { first, .. } => first.precedence(),
        }
    }

    fn no_merge(&self) -> bool {
        matches!(&*self.node, Node::Leaf(leaf) if leaf.no_merge)
    }

    pub fn is_abnormal(&self) -> bool {
        self.abnormal_payload().is_some()
    }

    /// The payload given to [`ParseError::abnormal`], if this is one.
    pub fn abnormal_payload(&self) -> Option<&str> {
        match &*self.node {
            Node::Leaf(leaf) => leaf.abnormal.as_deref(),
            _ => None,
        }
    }

    // --- Algebra ---

    /// Combine the errors of two failed attempts.
    ///
    /// `None` is the identity. An abnormal error always survives unchanged,
    /// the first one if both are abnormal.
    pub fn merge(first: Option<ParseError>, second: Option<ParseError>) -> Option<ParseError> {
        match (first, second) {
            (None, e) | (e, None) => e,
            (Some(a), Some(b)) => Some(a.merge_with(b)),
        }
    }

    fn merge_with(self, other: ParseError) -> ParseError {
        if Arc::ptr_eq(&self.node, &other.node) || self.is_abnormal() {
            return self;
        }
        if other.is_abnormal() {
            return other;
        }
        let (i1, i2) = (self.index(), other.index());
        if i1 != i2 {
            return if i1 > i2 { self } else { other };
        }
        let (p1, p2) = (self.precedence(), other.precedence());
        if p1 != p2 {
            return if p1 > p2 { self } else { other };
        }
        if self.no_merge() && other.no_merge() {
            return self;
        }
        ParseError {
            node: Arc::new(Node::Merged {
                first: self,
                second: other,
            }),
        }
    }

    /// Replace what this error says it was expecting with `label`, keeping
    /// the rest of the cause.
    pub fn set_expecting(self, label: impl Into<String>) -> ParseError {
        if self.is_abnormal() {
            return self;
        }
        ParseError {
            node: Arc::new(Node::Expecting {
                cause: self,
                label: label.into(),
            }),
        }
    }

    // --- Rendering ---

    pub fn render(&self) -> RenderedError {
        let mut rendered = RenderedError::empty(self.index());
        self.render_into(&mut rendered);
        dedup(&mut rendered.unexpected);
        dedup(&mut rendered.expecting);
        dedup(&mut rendered.messages);
        rendered
    }

    fn render_into(&self, out: &mut RenderedError) {
        match &*self.node {
            Node::Leaf(leaf) => {
                out.unexpected.extend(leaf.unexpected.iter().cloned());
                out.expecting.extend(leaf.expecting.iter().cloned());
                out.messages.extend(leaf.raw.iter().cloned());
                if out.encountered.is_none() {
                    out.encountered = leaf.encountered.clone();
                }
                if out.abnormal.is_none() {
                    out.abnormal = leaf.abnormal.as_deref().map(str::to_string);
                }
            }
            Node::Expecting { cause, label } => {
                let mut inner = RenderedError::empty(cause.index());
                cause.render_into(&mut inner);
                inner.expecting = vec![label.clone()];
                out.absorb(inner);
            }
            Node::Merged { first, second } => {
                first.render_into(out);
                second.render_into(out);
            }
        }
    }
}

fn dedup(items: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(items.len());
    items.retain(|item| {
        if seen.contains(item) {
            false
        } else {
            seen.push(item.clone());
            true
        }
    });
}

/// The flattened, human-facing form of a [`ParseError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedError {
    pub index: usize,
    pub encountered: Option<String>,
    pub unexpected: Vec<String>,
    pub expecting: Vec<String>,
    pub messages: Vec<String>,
    pub abnormal: Option<String>,
}

impl RenderedError {
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    fn absorb(&mut self, other: RenderedError) {
        self.unexpected.extend(other.unexpected);
        self.expecting.extend(other.expecting);
        self.messages.extend(other.messages);
        if self.encountered.is_none() {
            self.encountered = other.encountered;
        }
        if self.abnormal.is_none() {
            self.abnormal = other.abnormal;
        }
    }
}

fn join_alternatives(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

impl fmt::Display for RenderedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(payload) = &self.abnormal {
            return write!(f, "aborted: {payload}");
        }
        let mut parts = Vec::new();
        if !self.unexpected.is_empty() {
            parts.push(format!("unexpected {}", join_alternatives(&self.unexpected)));
        }
        if !self.expecting.is_empty() {
            parts.push(format!("expecting {}", join_alternatives(&self.expecting)));
        }
        parts.extend(self.messages.iter().cloned());
        if let Some(encountered) = &self.encountered {
            parts.push(format!("{encountered} encountered"));
        }
        if parts.is_empty() {
            f.write_str("syntax error")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
