//! Math functions callable from model expressions.
//!
//! Which of these a given expression may use is declared per owning entity
//! type in its [`ExprContext`](super::ExprContext); the set itself is closed.

use thiserror::Error;

/// A math function registered for use in model expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathFun {
    Ceil,
    Floor,
    Exp,
    Pow,
    Log,
    Log10,
    Min,
    Max,
}

/// Wrong number of arguments in a math-function call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{fun}() expects {expected} argument(s), got {got}")]
pub struct FunctionArityError {
    pub fun: &'static str,
    pub expected: &'static str,
    pub got: usize,
}

impl MathFun {
    pub const ALL: [Self; 8] = [
        Self::Ceil,
        Self::Floor,
        Self::Exp,
        Self::Pow,
        Self::Log,
        Self::Log10,
        Self::Min,
        Self::Max,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::Exp => "exp",
            Self::Pow => "pow",
            Self::Log => "log",
            Self::Log10 => "log10",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// Look a function up by its source-text name (always exact case)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|fun| fun.name() == name)
    }

    /// Apply the function to already-evaluated arguments
    pub fn apply(self, args: &[f64]) -> Result<f64, FunctionArityError> {
        let arity_error = |expected: &'static str| FunctionArityError {
            fun: self.name(),
            expected,
            got: args.len(),
        };
        match self {
            Self::Ceil | Self::Floor | Self::Exp | Self::Log | Self::Log10 => {
                let [x] = args else {
                    return Err(arity_error("1"));
                };
                Ok(match self {
                    Self::Ceil => x.ceil(),
                    Self::Floor => x.floor(),
                    Self::Exp => x.exp(),
                    Self::Log => x.ln(),
                    Self::Log10 => x.log10(),
                    // unary arms only
                    Self::Pow | Self::Min | Self::Max => unreachable!(),
                })
            }
            Self::Pow => {
                let [base, exponent] = args else {
                    return Err(arity_error("2"));
                };
                Ok(base.powf(*exponent))
            }
            Self::Min | Self::Max => {
                let (first, rest) = args.split_first().ok_or_else(|| arity_error("at least 1"))?;
                Ok(rest.iter().fold(*first, |acc, &x| match self {
                    Self::Min => acc.min(x),
                    _ => acc.max(x),
                }))
            }
        }
    }
}

impl std::fmt::Display for MathFun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
