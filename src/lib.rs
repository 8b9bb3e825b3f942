//! # cellang-base
//!
//! Core library for whole-cell model expression parsing, resolution, and
//! evaluation.
//!
//! A whole-cell model is a graph of typed entities (compartments, species,
//! parameters, observables, functions, reactions). Modelers attach textual
//! mathematical expressions to some of those entities: rate laws, observable
//! definitions, objective functions. This crate turns such an expression into
//! a validated token sequence whose identifier tokens are resolved against
//! the model's object namespace, and can verify the sequence against a
//! context grammar and evaluate it numerically.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! eval      → typed expression tree and recursive evaluator
//!   ↓
//! verify    → finite-state acceptors (general + linear grammar)
//!   ↓
//! parser    → Logos lexer, lexical matchers, tokenizer driver
//!   ↓
//! model     → entity-kind descriptors, contexts, object namespace
//! ```
//!
//! (`parser::lexer` is a leaf with no model knowledge; `model` references
//! only its raw token kinds.)

/// Entity-kind descriptors, math functions, expression contexts, namespace
pub mod model;

/// Parser: Logos lexer, lexical matchers, tokenizer driver
pub mod parser;

/// Grammar verification: table-driven and linear finite-state acceptors
pub mod verify;

/// Evaluation: typed expression tree built from annotated tokens
pub mod eval;

// Re-export commonly needed items
pub use model::{
    CaseMatching, Entity, EntityId, EntityKind, ExprContext, MathFun, ObjectNamespace, ResolvedId,
};
pub use parser::{ExprToken, ParseError, ParseErrors, ParsedExpression, TokenClass, parse_expression};

pub use eval::{EvalError, FixedValues, ObjectValues};
pub use verify::{ExpressionVerifier, GrammarError, LinearExpressionVerifier, Transition};
