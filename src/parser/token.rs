//! Annotated expression tokens, the parser's primary output unit.

use smol_str::SmolStr;

use crate::model::{EntityId, EntityKind};

/// Category of an annotated token, used by the grammar verifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Number,
    Operator,
    Other,
    MathFun,
    ObjRef,
}

/// One annotated token of a successfully scanned expression.
///
/// Concatenating every token's source text, in order, reconstructs the
/// stripped expression modulo whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprToken {
    /// Numeric literal, kept as source text until evaluation
    Number { text: SmolStr },
    /// Operator or punctuation
    Op { text: SmolStr },
    /// Escape hatch for callers that stage token sequences by hand; the
    /// tokenizer driver never emits this variant
    Other { text: SmolStr },
    /// A legal math-function name in call position
    MathFun { name: SmolStr },
    /// A resolved reference to a model object
    ObjRef {
        /// Verbatim source substring, e.g. `Parameter.K_CAT`
        text: SmolStr,
        kind: EntityKind,
        /// Canonical stored identifier, e.g. `k_cat`
        id: SmolStr,
        entity: EntityId,
    },
}

impl ExprToken {
    pub fn number(text: &str) -> Self {
        Self::Number {
            text: SmolStr::new(text),
        }
    }

    pub fn op(text: &str) -> Self {
        Self::Op {
            text: SmolStr::new(text),
        }
    }

    pub fn other(text: &str) -> Self {
        Self::Other {
            text: SmolStr::new(text),
        }
    }

    pub fn math_fun(name: &str) -> Self {
        Self::MathFun {
            name: SmolStr::new(name),
        }
    }

    pub fn class(&self) -> TokenClass {
        match self {
            Self::Number { .. } => TokenClass::Number,
            Self::Op { .. } => TokenClass::Operator,
            Self::Other { .. } => TokenClass::Other,
            Self::MathFun { .. } => TokenClass::MathFun,
            Self::ObjRef { .. } => TokenClass::ObjRef,
        }
    }

    /// The token's source text (the verbatim substring for object
    /// references, the name for math functions)
    pub fn text(&self) -> &str {
        match self {
            Self::Number { text } | Self::Op { text } | Self::Other { text } => text,
            Self::MathFun { name } => name,
            Self::ObjRef { text, .. } => text,
        }
    }
}
