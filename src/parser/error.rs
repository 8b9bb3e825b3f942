//! Parse error taxonomy.
//!
//! Lexical, identifier, disambiguation, and function errors are collected
//! during one tokenizer pass and returned together as a [`ParseErrors`]
//! aggregate, so one parse reports every independent problem. Each message
//! names the offending substring and the expression it came from.

use smol_str::SmolStr;
use thiserror::Error;

use crate::model::EntityKind;

/// One problem found while tokenizing an expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Token(s) outside the allowed set; aggregated over the expression
    #[error("'{expr}' contains bad token(s): {}", quote_join(.tokens))]
    BadTokens { expr: String, tokens: Vec<SmolStr> },

    /// Structurally unparseable text (unbalanced brackets etc.)
    #[error("parsing '{expr}' creates a syntax error: {detail}")]
    Malformed { expr: String, detail: String },

    /// Identifier matches no registered object of any kind
    #[error(
        "'{expr}' contains the identifier(s) {}, which aren't the id(s) of an object",
        quote_join(.ids)
    )]
    UnresolvedIds { expr: String, ids: Vec<SmolStr> },

    /// Identifier resolves in more than one kind and no disambiguation was
    /// given; candidates are listed in namespace declaration order
    #[error(
        "'{expr}' contains multiple model object id matches: {}",
        ambiguity_list(.id, .kinds)
    )]
    AmbiguousId {
        expr: String,
        id: SmolStr,
        kinds: Vec<EntityKind>,
    },

    /// Call syntax `Type.id()` used with a prefix type that is not
    /// referenced as a callable
    #[error(
        "'{expr}' contains '{matched}', which doesn't use '{kind}' as a disambiguation model type"
    )]
    WrongCallPrefix {
        expr: String,
        matched: SmolStr,
        /// The kind whose convention requires call syntax
        kind: EntityKind,
    },

    /// Dotted syntax `Type.id` used where the target kind requires call
    /// syntax `Type.id()`
    #[error(
        "'{expr}' contains '{matched}', which uses '{kind}' as a disambiguation model type \
         but doesn't use {kind} syntax"
    )]
    MissingCallSyntax {
        expr: String,
        matched: SmolStr,
        kind: EntityKind,
    },

    /// `Type.` prefix names no kind referenceable by the owning context
    #[error(
        "'{expr}' contains '{matched}', but the disambiguation model type '{type_name}' \
         cannot be referenced by '{context}' expressions"
    )]
    InvalidDisambiguationType {
        expr: String,
        matched: SmolStr,
        type_name: SmolStr,
        context: String,
    },

    /// Disambiguated identifier does not exist in the named kind
    #[error("'{expr}' contains '{matched}', but '{id}' is not the id of a '{kind}'")]
    NotAnId {
        expr: String,
        matched: SmolStr,
        id: SmolStr,
        kind: EntityKind,
    },

    /// `Function.id()` where `id` names no registered function entity
    #[error("'{expr}' contains '{matched}', which doesn't refer to a {kind}")]
    NotACallableId {
        expr: String,
        matched: SmolStr,
        kind: EntityKind,
    },

    /// Call syntax with a name outside the owning context's declared
    /// function set
    #[error(
        "'{expr}' contains the func name '{name}', but it isn't in the valid functions of {context}"
    )]
    UnknownFunction {
        expr: String,
        name: SmolStr,
        context: String,
    },

    /// Call syntax in a context that declares no function set at all;
    /// distinct from [`ParseError::UnknownFunction`]
    #[error(
        "'{expr}' contains the func name '{name}', but {context} doesn't declare valid functions"
    )]
    NoFunctionsDeclared {
        expr: String,
        name: SmolStr,
        context: String,
    },
}

/// Every problem one parse found, in scan order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(Vec<ParseError>);

impl ParseErrors {
    pub(crate) fn new(errors: Vec<ParseError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }
}

impl From<Vec<ParseError>> for ParseErrors {
    fn from(errors: Vec<ParseError>) -> Self {
        Self::new(errors)
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for ParseErrors {
    type Output = ParseError;

    fn index(&self, index: usize) -> &ParseError {
        &self.0[index]
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

fn quote_join(items: &[SmolStr]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn ambiguity_list(id: &SmolStr, kinds: &[EntityKind]) -> String {
    kinds
        .iter()
        .map(|kind| format!("'{id}' as a {kind} id"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguity_message_lists_kinds_in_order() {
        let error = ParseError::AmbiguousId {
            expr: "dup".to_string(),
            id: SmolStr::new("dup"),
            kinds: vec![EntityKind::Observable, EntityKind::Parameter],
        };
        assert_eq!(
            error.to_string(),
            "'dup' contains multiple model object id matches: \
             'dup' as a Observable id, 'dup' as a Parameter id"
        );
    }

    #[test]
    fn test_bad_token_message_quotes_each_token() {
        let error = ParseError::BadTokens {
            expr: "a : b".to_string(),
            tokens: vec![SmolStr::new(":")],
        };
        assert_eq!(error.to_string(), "'a : b' contains bad token(s): ':'");
    }

    #[test]
    fn test_missing_call_syntax_message() {
        let error = ParseError::MissingCallSyntax {
            expr: "Function.fun_1".to_string(),
            matched: SmolStr::new("Function.fun_1"),
            kind: EntityKind::Function,
        };
        assert_eq!(
            error.to_string(),
            "'Function.fun_1' contains 'Function.fun_1', which uses 'Function' as a \
             disambiguation model type but doesn't use Function syntax"
        );
    }
}
