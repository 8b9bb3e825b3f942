//! Evaluation Tests
//!
//! Evaluation of parsed expressions against per-entity value sources, plus
//! the failure taxonomy: evaluation errors are always tagged with the owning
//! entity's type and identifier.

use rstest::rstest;

use cellang::model::{OBJECTIVE_FUNCTION, RATE_LAW_EXPRESSION};
use cellang::{
    CaseMatching, EntityId, EntityKind, EvalError, ObjectNamespace, ObjectValues, ParsedExpression,
    parse_expression,
};

fn namespace() -> ObjectNamespace {
    let mut ns = ObjectNamespace::new();
    ns.insert(EntityKind::SpeciesType, "atp");
    ns.insert(EntityKind::Compartment, "c");
    ns.insert(EntityKind::Parameter, "k_cat");
    ns.insert(EntityKind::Observable, "obs_1");
    ns.insert(EntityKind::Function, "fun_1");
    ns
}

fn parse(expr: &str) -> (ParsedExpression, ObjectNamespace) {
    let mut ns = namespace();
    let parsed =
        parse_expression(&RATE_LAW_EXPRESSION, expr, &mut ns, CaseMatching::Sensitive).unwrap();
    (parsed, ns)
}

/// Values keyed by entity handle; anything unlisted is missing
struct Values(Vec<(EntityId, f64)>);

impl ObjectValues for Values {
    fn value_of(&self, entity: EntityId) -> Option<f64> {
        self.0.iter().find(|(e, _)| *e == entity).map(|(_, v)| *v)
    }
}

// ============================================================================
// Successful Evaluation
// ============================================================================

#[rstest]
#[case("1 + 2 * 3", 7.0)]
#[case("(1 + 2) * 3", 9.0)]
#[case("8 / 4 / 2", 1.0)]
#[case("-3 + 5", 2.0)]
#[case("pow(2, 10)", 1024.0)]
#[case("max(1, min(4, 2), 3)", 3.0)]
#[case("exp(0) + ceil(0.2) + floor(1.8)", 3.0)]
fn test_constant_expressions(#[case] expr: &str, #[case] expected: f64) {
    let (parsed, _) = parse(expr);
    assert_eq!(parsed.test_eval("rl_1", 0.0).unwrap(), expected, "{expr}");
}

#[test]
fn test_references_read_from_the_value_source() {
    let (parsed, ns) = parse("k_cat * atp[c] + obs_1 + fun_1()");
    let values = Values(vec![
        (ns.get(EntityKind::Parameter, "k_cat").unwrap(), 0.5),
        (ns.get(EntityKind::Species, "atp[c]").unwrap(), 100.0),
        (ns.get(EntityKind::Observable, "obs_1").unwrap(), 7.0),
        (ns.get(EntityKind::Function, "fun_1").unwrap(), 3.0),
    ]);
    assert_eq!(parsed.evaluate("rl_1", &values).unwrap(), 60.0);
}

#[test]
fn test_test_eval_substitutes_one_value_for_every_reference() {
    let (parsed, _) = parse("k_cat + 2 * obs_1");
    assert_eq!(parsed.test_eval("rl_1", 10.0).unwrap(), 30.0);
}

#[test]
fn test_objective_function_context() {
    let mut ns = ObjectNamespace::new();
    ns.insert(EntityKind::Reaction, "rxn_1");
    let parsed = parse_expression(
        &OBJECTIVE_FUNCTION,
        "log10(rxn_1)",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap();
    assert_eq!(parsed.test_eval("obj_1", 1000.0).unwrap(), 3.0);
}

// ============================================================================
// Failure Taxonomy
// ============================================================================

#[test]
fn test_missing_value_names_owner_and_reference() {
    let (parsed, ns) = parse("k_cat + obs_1");
    let values = Values(vec![(ns.get(EntityKind::Parameter, "k_cat").unwrap(), 1.0)]);
    let error = parsed.evaluate("rl_1", &values).unwrap_err();
    assert_eq!(
        error.to_string(),
        "evaluation of 'k_cat + obs_1' for RateLawExpression 'rl_1' failed: \
         no value for object 'obs_1'"
    );
}

#[rstest]
#[case("pow(2)", "pow() expects 2 argument(s), got 1")]
#[case("ceil(1, 2)", "ceil() expects 1 argument(s), got 2")]
#[case("min()", "min() expects at least 1 argument(s), got 0")]
fn test_wrong_arity_is_an_evaluation_error(#[case] expr: &str, #[case] detail: &str) {
    let (parsed, _) = parse(expr);
    let error = parsed.test_eval("rl_1", 0.0).unwrap_err();
    assert!(
        matches!(&error, EvalError::Evaluation { detail: d, .. } if d.contains(detail)),
        "{expr}: {error}"
    );
}

#[test]
fn test_division_by_zero_is_infinite_not_an_error() {
    let (parsed, _) = parse("1 / 0");
    assert_eq!(parsed.test_eval("rl_1", 0.0).unwrap(), f64::INFINITY);
}

#[test]
fn test_error_is_tagged_with_the_owning_context() {
    let (parsed, _) = parse("pow(2)");
    let error = parsed.test_eval("rate_law_7", 0.0).unwrap_err();
    let message = error.to_string();
    assert!(message.contains("RateLawExpression"), "{message}");
    assert!(message.contains("'rate_law_7'"), "{message}");
}
