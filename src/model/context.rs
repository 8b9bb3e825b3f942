//! Expression contexts: per owning-entity-type parsing metadata.
//!
//! Each entity type that carries a textual expression declares which entity
//! kinds that expression may reference and, optionally, which math functions
//! it may call. A context with `valid_functions: None` rejects all function
//! call syntax with a distinct error (it never declared any functions, as
//! opposed to not including a particular one).

use super::{EntityKind, MathFun};

/// Parsing metadata for one owning entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprContext {
    /// Display name of the owning entity type, used in error messages
    pub name: &'static str,
    /// Entity kinds whose instances this context's expressions may reference
    pub valid_models: &'static [EntityKind],
    /// Math functions legal in this context, or `None` if the context does
    /// not declare any
    pub valid_functions: Option<&'static [MathFun]>,
    /// Whether expressions in this context must be linear combinations;
    /// enforced by the linear grammar verifier after parsing
    pub linear: bool,
}

impl ExprContext {
    pub fn can_reference(&self, kind: EntityKind) -> bool {
        self.valid_models.contains(&kind)
    }

    /// Whether this context declares a function allow-list at all.
    /// Contexts without one reject call syntax with a distinct error.
    pub fn declares_functions(&self) -> bool {
        self.valid_functions.is_some()
    }

    /// Look up a declared function by source-text name (always exact case)
    pub fn function_named(&self, name: &str) -> Option<MathFun> {
        self.valid_functions?
            .iter()
            .copied()
            .find(|fun| fun.name() == name)
    }
}

const GENERAL_FUNCTIONS: &[MathFun] = &[
    MathFun::Ceil,
    MathFun::Floor,
    MathFun::Exp,
    MathFun::Pow,
    MathFun::Log,
    MathFun::Log10,
    MathFun::Min,
    MathFun::Max,
];

const OBJECTIVE_FUNCTIONS: &[MathFun] =
    &[MathFun::Exp, MathFun::Pow, MathFun::Log, MathFun::Log10];

/// Rate law expressions: general arithmetic over the reaction's environment
pub const RATE_LAW_EXPRESSION: ExprContext = ExprContext {
    name: "RateLawExpression",
    valid_models: &[
        EntityKind::Compartment,
        EntityKind::Species,
        EntityKind::Parameter,
        EntityKind::Observable,
        EntityKind::Function,
    ],
    valid_functions: Some(GENERAL_FUNCTIONS),
    linear: false,
};

/// Model-level function definitions
pub const FUNCTION_EXPRESSION: ExprContext = ExprContext {
    name: "FunctionExpression",
    valid_models: &[
        EntityKind::Species,
        EntityKind::Parameter,
        EntityKind::Observable,
        EntityKind::Function,
    ],
    valid_functions: Some(GENERAL_FUNCTIONS),
    linear: false,
};

/// Simulation stop conditions
pub const STOP_CONDITION_EXPRESSION: ExprContext = ExprContext {
    name: "StopConditionExpression",
    valid_models: &[
        EntityKind::Species,
        EntityKind::Parameter,
        EntityKind::Observable,
        EntityKind::Function,
    ],
    valid_functions: Some(GENERAL_FUNCTIONS),
    linear: false,
};

/// Observables: linear combinations of species and other observables
pub const OBSERVABLE_EXPRESSION: ExprContext = ExprContext {
    name: "ObservableExpression",
    valid_models: &[EntityKind::Species, EntityKind::Observable],
    valid_functions: None,
    linear: true,
};

/// dFBA objective functions over reaction fluxes
pub const OBJECTIVE_FUNCTION: ExprContext = ExprContext {
    name: "ObjectiveFunction",
    valid_models: &[EntityKind::Reaction],
    valid_functions: Some(OBJECTIVE_FUNCTIONS),
    linear: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_reference() {
        assert!(RATE_LAW_EXPRESSION.can_reference(EntityKind::Parameter));
        assert!(!RATE_LAW_EXPRESSION.can_reference(EntityKind::Reaction));
        assert!(OBJECTIVE_FUNCTION.can_reference(EntityKind::Reaction));
    }

    #[test]
    fn test_function_named() {
        assert_eq!(RATE_LAW_EXPRESSION.function_named("pow"), Some(MathFun::Pow));
        assert_eq!(RATE_LAW_EXPRESSION.function_named("foo"), None);
        // min/max are not legal in objective functions
        assert_eq!(OBJECTIVE_FUNCTION.function_named("min"), None);
        // observables declare no functions at all
        assert!(!OBSERVABLE_EXPRESSION.declares_functions());
        assert_eq!(OBSERVABLE_EXPRESSION.function_named("pow"), None);
    }

    #[test]
    fn test_linearity_requirements() {
        assert!(OBSERVABLE_EXPRESSION.linear);
        assert!(OBJECTIVE_FUNCTION.linear);
        assert!(!RATE_LAW_EXPRESSION.linear);
        assert!(!FUNCTION_EXPRESSION.linear);
    }
}
