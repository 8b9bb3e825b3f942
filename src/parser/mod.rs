//! Expression parsing: lexing, lexical matching, identifier resolution.
//!
//! [`parse_expression`] is the entry point. It strips the input, lexes it
//! against the allowed token set, then drives the three lexical matchers over
//! the raw tokens to produce a [`ParsedExpression`] whose identifier tokens
//! are resolved against the model's [`ObjectNamespace`].
//!
//! [`ObjectNamespace`]: crate::model::ObjectNamespace

mod error;
pub(crate) mod lexer;
mod token;
mod tokenizer;

pub use error::{ParseError, ParseErrors};
pub use lexer::{RawKind, RawToken};
pub use token::{ExprToken, TokenClass};
pub use tokenizer::{ParsedExpression, parse_expression};
