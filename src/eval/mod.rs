//! Numeric evaluation of parsed expressions.
//!
//! A [`ParsedExpression`] evaluates by building a typed expression tree from
//! its annotated tokens and folding it recursively. Object references pull
//! their values from an [`ObjectValues`] source supplied by the caller, so
//! the same parsed expression can be evaluated against changing model state.
//!
//! The token sequence has already passed identifier resolution, but not
//! necessarily a grammar check, so tree building reports malformed shapes
//! as evaluation-time syntax errors rather than panicking.

use smol_str::SmolStr;
use thiserror::Error;
use tracing::trace;

use crate::model::{EntityId, MathFun};
use crate::parser::{ExprToken, ParsedExpression};

/// Source of numeric values for referenced objects during evaluation
pub trait ObjectValues {
    fn value_of(&self, entity: EntityId) -> Option<f64>;
}

/// Assigns one fixed value to every referenced object; the standard smoke
/// test for a freshly parsed expression
#[derive(Debug, Clone, Copy)]
pub struct FixedValues(pub f64);

impl ObjectValues for FixedValues {
    fn value_of(&self, _entity: EntityId) -> Option<f64> {
        Some(self.0)
    }
}

/// Evaluation failure, tagged with the owning entity it was evaluated for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The token sequence is not a well-formed arithmetic expression
    #[error("syntax error evaluating '{expression}' for {context} '{owner}': {detail}")]
    Syntax {
        expression: String,
        context: String,
        owner: String,
        detail: String,
    },

    /// A call-position name does not denote a known math function
    #[error("name error evaluating '{expression}' for {context} '{owner}': '{name}' is not a function")]
    Name {
        expression: String,
        context: String,
        owner: String,
        name: String,
    },

    /// The tree is well-formed but a value is missing or a call is invalid
    #[error("evaluation of '{expression}' for {context} '{owner}' failed: {detail}")]
    Evaluation {
        expression: String,
        context: String,
        owner: String,
        detail: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        }
    }
}

/// Typed expression tree built from annotated tokens
#[derive(Debug, Clone, PartialEq)]
enum ExprNode {
    Number(f64),
    Ref { entity: EntityId, id: SmolStr },
    Call(MathFun, Vec<ExprNode>),
    Neg(Box<ExprNode>),
    Binary(BinOp, Box<ExprNode>, Box<ExprNode>),
}

/// Builder/evaluator problem, before it is tagged with the owning entity
enum Problem {
    Syntax(String),
    Name(String),
    Eval(String),
}

impl ParsedExpression {
    /// Evaluate the expression for the named owning entity, reading
    /// referenced-object values from `values`.
    ///
    /// The tree is rebuilt per call; the parse itself is the cacheable
    /// artifact.
    pub fn evaluate(&self, owner: &str, values: &dyn ObjectValues) -> Result<f64, EvalError> {
        let result = TreeBuilder::new(self.tokens())
            .build()
            .and_then(|tree| eval(&tree, values));
        match result {
            Ok(value) => {
                trace!("[EVAL] '{}' for '{}' = {}", self.expression(), owner, value);
                Ok(value)
            }
            Err(problem) => Err(self.tag(owner, problem)),
        }
    }

    /// Smoke-test evaluation: every referenced object takes the same value
    pub fn test_eval(&self, owner: &str, value: f64) -> Result<f64, EvalError> {
        self.evaluate(owner, &FixedValues(value))
    }

    fn tag(&self, owner: &str, problem: Problem) -> EvalError {
        let expression = self.expression().to_string();
        let context = self.context().to_string();
        let owner = owner.to_string();
        match problem {
            Problem::Syntax(detail) => EvalError::Syntax {
                expression,
                context,
                owner,
                detail,
            },
            Problem::Name(name) => EvalError::Name {
                expression,
                context,
                owner,
                name,
            },
            Problem::Eval(detail) => EvalError::Evaluation {
                expression,
                context,
                owner,
                detail,
            },
        }
    }
}

fn eval(node: &ExprNode, values: &dyn ObjectValues) -> Result<f64, Problem> {
    match node {
        ExprNode::Number(value) => Ok(*value),
        ExprNode::Ref { entity, id } => values
            .value_of(*entity)
            .ok_or_else(|| Problem::Eval(format!("no value for object '{id}'"))),
        ExprNode::Call(fun, args) => {
            let args = args
                .iter()
                .map(|arg| eval(arg, values))
                .collect::<Result<Vec<_>, _>>()?;
            fun.apply(&args).map_err(|e| Problem::Eval(e.to_string()))
        }
        ExprNode::Neg(inner) => Ok(-eval(inner, values)?),
        ExprNode::Binary(op, lhs, rhs) => Ok(op.apply(eval(lhs, values)?, eval(rhs, values)?)),
    }
}

/// Recursive-descent builder over annotated tokens.
///
/// Grammar: `expr := term (('+'|'-') term)*`, `term := unary (('*'|'/')
/// unary)*`, `unary := ('+'|'-') unary | primary`, with primaries being
/// numbers, object references (optionally called with `()`), math-function
/// calls, and parenthesized subexpressions.
struct TreeBuilder<'a> {
    tokens: &'a [ExprToken],
    pos: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(tokens: &'a [ExprToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn build(mut self) -> Result<ExprNode, Problem> {
        if self.tokens.is_empty() {
            return Err(Problem::Syntax("expression is empty".to_string()));
        }
        let tree = self.expr()?;
        match self.peek() {
            None => Ok(tree),
            Some(token) => Err(Problem::Syntax(format!(
                "unexpected '{}' after the expression",
                token.text()
            ))),
        }
    }

    fn peek(&self) -> Option<&'a ExprToken> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a ExprToken> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn eat_op(&mut self, text: &str) -> bool {
        if let Some(ExprToken::Op { text: t }) = self.peek()
            && t == text
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect_op(&mut self, text: &str) -> Result<(), Problem> {
        if self.eat_op(text) {
            Ok(())
        } else {
            Err(Problem::Syntax(format!("expected '{text}'")))
        }
    }

    fn expr(&mut self) -> Result<ExprNode, Problem> {
        let mut node = self.term()?;
        loop {
            let op = if self.eat_op("+") {
                BinOp::Add
            } else if self.eat_op("-") {
                BinOp::Sub
            } else {
                return Ok(node);
            };
            node = ExprNode::Binary(op, Box::new(node), Box::new(self.term()?));
        }
    }

    fn term(&mut self) -> Result<ExprNode, Problem> {
        let mut node = self.unary()?;
        loop {
            let op = if self.eat_op("*") {
                BinOp::Mul
            } else if self.eat_op("/") {
                BinOp::Div
            } else {
                return Ok(node);
            };
            node = ExprNode::Binary(op, Box::new(node), Box::new(self.unary()?));
        }
    }

    fn unary(&mut self) -> Result<ExprNode, Problem> {
        if self.eat_op("-") {
            return Ok(ExprNode::Neg(Box::new(self.unary()?)));
        }
        if self.eat_op("+") {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<ExprNode, Problem> {
        let Some(token) = self.bump() else {
            return Err(Problem::Syntax("expression ends early".to_string()));
        };
        match token {
            ExprToken::Number { text } => text
                .parse::<f64>()
                .map(ExprNode::Number)
                .map_err(|_| Problem::Syntax(format!("'{text}' is not a number"))),
            ExprToken::ObjRef { id, entity, .. } => {
                let node = ExprNode::Ref {
                    entity: *entity,
                    id: id.clone(),
                };
                // a function entity call carries no arguments; the call is
                // notation, the value is the entity's
                if self.eat_op("(") {
                    self.expect_op(")")?;
                }
                Ok(node)
            }
            ExprToken::MathFun { name } => {
                let Some(fun) = MathFun::from_name(name) else {
                    return Err(Problem::Name(name.to_string()));
                };
                self.expect_op("(")?;
                let mut args = Vec::new();
                // an empty argument list is syntactically fine; the
                // function's own arity check rejects it
                if !self.eat_op(")") {
                    args.push(self.expr()?);
                    while self.eat_op(",") {
                        args.push(self.expr()?);
                    }
                    self.expect_op(")")?;
                }
                Ok(ExprNode::Call(fun, args))
            }
            ExprToken::Op { text } if text == "(" => {
                let node = self.expr()?;
                self.expect_op(")")?;
                Ok(node)
            }
            token => Err(Problem::Syntax(format!(
                "unexpected '{}' where an operand was expected",
                token.text()
            ))),
        }
    }
}
