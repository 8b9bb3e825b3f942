//! Grammar verification over annotated token sequences.
//!
//! A verifier is a table-driven finite-state acceptor running over token
//! classes (and, where a transition pins one, exact token text). The parser
//! guarantees identifier-level validity; a verifier checks the sequence
//! shape on top of that, e.g. that an observable's expression is a linear
//! combination of references.
//!
//! [`ExpressionVerifier`] is the generic engine; [`LinearExpressionVerifier`]
//! instantiates it with the linear-combination grammar and a numeric
//! pre-check.

use thiserror::Error;
use tracing::trace;

use crate::parser::{ExprToken, TokenClass};

/// Acceptor state label, also used in error messages
pub type StateId = &'static str;

/// One acceptor transition. `value` of `None` matches any token of the
/// class; `Some(text)` additionally pins the token's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub class: TokenClass,
    pub value: Option<&'static str>,
    pub to: StateId,
}

impl Transition {
    const fn new(from: StateId, class: TokenClass, value: Option<&'static str>, to: StateId) -> Self {
        Self {
            from,
            class,
            value,
            to,
        }
    }

    fn matches(&self, state: StateId, token: &ExprToken) -> bool {
        self.from == state
            && self.class == token.class()
            && self.value.is_none_or(|value| value == token.text())
    }
}

/// A sequence failed grammar verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("expression cannot be empty")]
    Empty,

    /// No transition out of the current state matched the token
    #[error("token {index} ('{text}') is invalid in state '{state}'")]
    UnexpectedToken {
        index: usize,
        text: String,
        state: StateId,
    },

    /// The sequence ran out of tokens outside the accepting state
    #[error("expression ends in non-accepting state '{state}'")]
    Incomplete { state: StateId },

    /// A numeric literal the grammar requires to be float-valued is not
    #[error("number '{text}' is not a valid float")]
    NonFloatNumber { text: String },
}

/// Table-driven finite-state acceptor over annotated tokens.
///
/// Deterministic by construction: the first transition matching the current
/// state and token is taken, so tables should not contain overlapping
/// transitions.
#[derive(Debug, Clone)]
pub struct ExpressionVerifier {
    start: StateId,
    accept: StateId,
    transitions: Vec<Transition>,
    empty_is_valid: bool,
}

impl ExpressionVerifier {
    pub fn new(
        start: StateId,
        accept: StateId,
        transitions: Vec<Transition>,
        empty_is_valid: bool,
    ) -> Self {
        Self {
            start,
            accept,
            transitions,
            empty_is_valid,
        }
    }

    /// Run the acceptor over a token sequence
    pub fn validate(&self, tokens: &[ExprToken]) -> Result<(), GrammarError> {
        if tokens.is_empty() {
            return if self.empty_is_valid {
                Ok(())
            } else {
                Err(GrammarError::Empty)
            };
        }

        let mut state = self.start;
        for (index, token) in tokens.iter().enumerate() {
            let Some(transition) = self
                .transitions
                .iter()
                .find(|transition| transition.matches(state, token))
            else {
                return Err(GrammarError::UnexpectedToken {
                    index,
                    text: token.text().to_string(),
                    state,
                });
            };
            trace!(
                "[VERIFY] {} --'{}'--> {}",
                state,
                token.text(),
                transition.to
            );
            state = transition.to;
        }

        if state == self.accept {
            Ok(())
        } else {
            Err(GrammarError::Incomplete { state })
        }
    }
}

/// Acceptor for linear combinations of object references:
/// `[+|-] [coeff *] ref ((+|-) [coeff *] ref)*`, with float coefficients.
///
/// The empty expression is linear (the zero combination). A leading sign is
/// legal only directly before a bare reference.
#[derive(Debug, Clone)]
pub struct LinearExpressionVerifier {
    inner: ExpressionVerifier,
}

impl Default for LinearExpressionVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearExpressionVerifier {
    pub fn new() -> Self {
        use TokenClass::{Number, ObjRef, Operator};
        let transitions = vec![
            // an optional leading sign, only before a bare reference
            Transition::new("start", Operator, Some("+"), "sign"),
            Transition::new("start", Operator, Some("-"), "sign"),
            Transition::new("start", Number, None, "coefficient"),
            Transition::new("start", ObjRef, None, "accept"),
            Transition::new("sign", ObjRef, None, "accept"),
            // a coefficient must be followed by '*' and a reference
            Transition::new("coefficient", Operator, Some("*"), "scale"),
            Transition::new("scale", ObjRef, None, "accept"),
            // each further term restarts at an optional coefficient
            Transition::new("accept", Operator, Some("+"), "term"),
            Transition::new("accept", Operator, Some("-"), "term"),
            Transition::new("term", Number, None, "coefficient"),
            Transition::new("term", ObjRef, None, "accept"),
        ];
        Self {
            inner: ExpressionVerifier::new("start", "accept", transitions, true),
        }
    }

    /// Validate a token sequence as a linear combination.
    ///
    /// Numeric literals are checked to parse as floats before the acceptor
    /// runs, so `3j`-style literals fail with a numeric error rather than a
    /// state error.
    pub fn validate(&self, tokens: &[ExprToken]) -> Result<(), GrammarError> {
        for token in tokens {
            if let ExprToken::Number { text } = token
                && text.parse::<f64>().is_err()
            {
                return Err(GrammarError::NonFloatNumber {
                    text: text.to_string(),
                });
            }
        }
        self.inner.validate(tokens)
    }
}
