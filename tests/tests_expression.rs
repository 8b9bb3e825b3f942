//! Expression Parsing Tests
//!
//! End-to-end coverage of the tokenizer: identifier resolution across kinds,
//! disambiguation, longest-match behavior, case folding, species synthesis,
//! error aggregation, and reconstruction.

use rstest::rstest;

use cellang::{
    CaseMatching, EntityKind, ExprToken, ObjectNamespace, parse_expression,
};
use cellang::model::{OBSERVABLE_EXPRESSION, RATE_LAW_EXPRESSION};

/// A namespace with the fixtures most tests share
fn namespace() -> ObjectNamespace {
    let mut ns = ObjectNamespace::new();
    ns.insert(EntityKind::Compartment, "c1");
    ns.insert(EntityKind::SpeciesType, "sp1");
    ns.insert(EntityKind::Species, "sp1[c1]");
    ns.insert(EntityKind::Parameter, "sp1");
    ns.insert(EntityKind::Parameter, "param_id");
    ns.insert(EntityKind::Parameter, "dup");
    ns.insert(EntityKind::Observable, "obs_id");
    ns.insert(EntityKind::Observable, "dup");
    ns.insert(EntityKind::Function, "fun_2");
    ns
}

// ============================================================================
// Resolution
// ============================================================================

#[rstest]
#[case("param_id", EntityKind::Parameter, "param_id")]
#[case("obs_id", EntityKind::Observable, "obs_id")]
#[case("sp1[c1]", EntityKind::Species, "sp1[c1]")]
#[case("Parameter.dup", EntityKind::Parameter, "dup")]
#[case("Observable.dup", EntityKind::Observable, "dup")]
#[case("Function.fun_2()", EntityKind::Function, "fun_2")]
fn test_single_reference_resolves(
    #[case] expr: &str,
    #[case] kind: EntityKind,
    #[case] id: &str,
) {
    let mut ns = namespace();
    let parsed =
        parse_expression(&RATE_LAW_EXPRESSION, expr, &mut ns, CaseMatching::Sensitive).unwrap();
    assert_eq!(parsed.tokens().len(), 1);
    let ids: Vec<_> = parsed.referenced_ids(kind).collect();
    assert_eq!(ids, vec![id], "{expr}");
}

#[test]
fn test_longest_match_prefers_species_over_parameter() {
    // 'sp1' alone is a Parameter; adjacent '[c1]' makes it the species
    let mut ns = namespace();
    let parsed = parse_expression(
        &RATE_LAW_EXPRESSION,
        "sp1[c1] + sp1",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap();
    let species: Vec<_> = parsed.referenced_ids(EntityKind::Species).collect();
    assert_eq!(species, vec!["sp1[c1]"]);
    let params: Vec<_> = parsed.referenced_ids(EntityKind::Parameter).collect();
    assert_eq!(params, vec!["sp1"]);
}

#[test]
fn test_case_fold_returns_canonical_ids() {
    let mut ns = namespace();
    let parsed = parse_expression(
        &RATE_LAW_EXPRESSION,
        "PARAM_ID + Param_Id + param_id + parameter.DUP",
        &mut ns,
        CaseMatching::Fold,
    )
    .unwrap();
    // all case forms deduplicate onto the canonical stored key
    let params: Vec<_> = parsed.referenced_ids(EntityKind::Parameter).collect();
    assert_eq!(params, vec!["param_id", "dup"]);

    // and each one resolves to the same entity
    let entity = ns.get(EntityKind::Parameter, "param_id").unwrap();
    let resolved: Vec<_> = parsed
        .tokens()
        .iter()
        .filter_map(|token| match token {
            ExprToken::ObjRef { id, entity, .. } if id.as_str() == "param_id" => Some(*entity),
            _ => None,
        })
        .collect();
    assert_eq!(resolved, vec![entity, entity, entity]);
}

#[test]
fn test_case_sensitive_rejects_folded_candidates() {
    let mut ns = namespace();
    let errors = parse_expression(
        &RATE_LAW_EXPRESSION,
        "PARAM_ID",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap_err();
    assert!(errors[0].to_string().contains("aren't the id(s) of an object"));
}

// ============================================================================
// Species Synthesis
// ============================================================================

#[test]
fn test_species_synthesis_is_idempotent_across_parses() {
    let mut ns = ObjectNamespace::new();
    ns.insert(EntityKind::SpeciesType, "atp");
    ns.insert(EntityKind::Compartment, "m");

    let first = parse_expression(
        &RATE_LAW_EXPRESSION,
        "2 * atp[m]",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap();
    let entity = ns.get(EntityKind::Species, "atp[m]").unwrap();

    let second = parse_expression(
        &RATE_LAW_EXPRESSION,
        "2 * atp[m]",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap();
    assert_eq!(first, second);

    // both parses reference the one synthesized entity
    let ExprToken::ObjRef { entity: referenced, .. } = &second.tokens()[2] else {
        panic!("expected an object reference");
    };
    assert_eq!(*referenced, entity);
}

// ============================================================================
// Ambiguity and Error Aggregation
// ============================================================================

#[test]
fn test_ambiguous_id_names_candidates_in_declaration_order() {
    let mut ns = namespace();
    let errors = parse_expression(
        &RATE_LAW_EXPRESSION,
        "dup",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "'dup' contains multiple model object id matches: \
         'dup' as a Parameter id, 'dup' as a Observable id"
    );
}

#[test]
fn test_ambiguity_candidate_order_follows_declaration_order() {
    // same duplicate, opposite declaration order
    let mut ns = ObjectNamespace::new();
    ns.insert(EntityKind::Observable, "dup");
    ns.insert(EntityKind::Parameter, "dup");
    let errors =
        parse_expression(&RATE_LAW_EXPRESSION, "dup", &mut ns, CaseMatching::Sensitive)
            .unwrap_err();
    assert!(
        errors[0]
            .to_string()
            .contains("'dup' as a Observable id, 'dup' as a Parameter id"),
        "{errors}"
    );
}

#[test]
fn test_disambiguation_silences_ambiguity() {
    let mut ns = namespace();
    let parsed = parse_expression(
        &RATE_LAW_EXPRESSION,
        "Observable.dup - Parameter.dup",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap();
    let obs: Vec<_> = parsed.referenced_ids(EntityKind::Observable).collect();
    let params: Vec<_> = parsed.referenced_ids(EntityKind::Parameter).collect();
    assert_eq!((obs, params), (vec!["dup"], vec!["dup"]));
}

#[rstest]
#[case("a : b", "contains bad token(s): ':'")]
#[case("x ** 2", "contains bad token(s): '**'")]
#[case("param_id[", "creates a syntax error")]
#[case("(param_id", "creates a syntax error")]
fn test_lexical_errors(#[case] expr: &str, #[case] expected: &str) {
    let mut ns = namespace();
    let errors =
        parse_expression(&RATE_LAW_EXPRESSION, expr, &mut ns, CaseMatching::Sensitive).unwrap_err();
    assert!(
        errors.iter().any(|error| error.to_string().contains(expected)),
        "{expr}: {errors}"
    );
}

#[test]
fn test_one_pass_reports_every_problem() {
    let mut ns = namespace();
    let errors = parse_expression(
        &RATE_LAW_EXPRESSION,
        "no_1 + no_2 + dup",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap_err();
    assert_eq!(errors.len(), 3, "{errors}");
}

#[test]
fn test_context_restricts_referenceable_kinds() {
    // observables may not reference parameters, even unambiguously
    let mut ns = namespace();
    let errors = parse_expression(
        &OBSERVABLE_EXPRESSION,
        "param_id",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap_err();
    assert!(
        errors[0].to_string().contains("aren't the id(s) of an object"),
        "{errors}"
    );
}

// ============================================================================
// Reconstruction and Referenced Groups
// ============================================================================

#[test]
fn test_reconstruct_normalizes_whitespace() {
    let mut ns = namespace();
    let parsed = parse_expression(
        &RATE_LAW_EXPRESSION,
        "  4 *  param_id\t+ pow(2,  obs_id) ",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap();
    assert_eq!(parsed.reconstruct(), "4 * param_id + pow(2, obs_id)");
}

#[test]
fn test_end_to_end_rate_law() {
    let mut ns = namespace();
    let parsed = parse_expression(
        &RATE_LAW_EXPRESSION,
        "4 * param_id + pow(2, obs_id) + Function.fun_2()",
        &mut ns,
        CaseMatching::Sensitive,
    )
    .unwrap();

    let params: Vec<_> = parsed.referenced_ids(EntityKind::Parameter).collect();
    let obs: Vec<_> = parsed.referenced_ids(EntityKind::Observable).collect();
    let funs: Vec<_> = parsed.referenced_ids(EntityKind::Function).collect();
    assert_eq!(params, vec!["param_id"]);
    assert_eq!(obs, vec!["obs_id"]);
    assert_eq!(funs, vec!["fun_2"]);

    // every declared kind appears in the grouping, referenced or not
    assert!(parsed.referenced().contains_key(&EntityKind::Compartment));

    // with every reference at 1: 4*1 + pow(2, 1) + 1
    assert_eq!(parsed.test_eval("rl_1", 1.0).unwrap(), 7.0);
    // with every reference at 3: 4*3 + pow(2, 3) + 3
    assert_eq!(parsed.test_eval("rl_1", 3.0).unwrap(), 23.0);
}
