// tests/macro_expansion_tests.rs

use dl::{
    ast::{Ast, Span},
    config::{DuplicatePolicy, FrontendConfig},
    diagnostics::ErrorType,
    macros::expand,
    pipeline::Pipeline,
    syntax::{parse_program, parse_with_config},
    DlError,
};

fn expand_str(source: &str) -> Result<String, DlError> {
    expand_with(source, FrontendConfig::default())
}

fn expand_with(source: &str, config: FrontendConfig) -> Result<String, DlError> {
    let unit = Pipeline::new(config).compile_str("test.dl", source)?;
    Ok(unit.expanded.pretty())
}

fn reject() -> FrontendConfig {
    FrontendConfig {
        duplicate_macros: DuplicatePolicy::Reject,
        ..FrontendConfig::default()
    }
}

// ---
// Definition and application
// ---

#[test]
fn single_formal_template_returns_the_argument_tree() {
    let (_, registry) = parse_program("macro id (x) stop (x) x end").unwrap();
    let (argument, _) = parse_program("[1, {|a| a.b}]").unwrap();
    let argument = argument.children()[0].clone();

    let expansion = registry
        .get("id")
        .unwrap()
        .apply(vec![argument.clone()], Span::default())
        .unwrap();
    assert_eq!(expansion, argument);
}

#[test]
fn prefix_use_site_is_replaced() {
    assert_eq!(
        expand_str("macro twice (x) stop (x) [x, x] end twice(1 + 2)").unwrap(),
        "(program (vector (add 1 2) (add 1 2)))"
    );
}

#[test]
fn infix_use_site_is_replaced() {
    assert_eq!(
        expand_str("macro plus (a b) stop (a b) a + b end (1 plus 2)").unwrap(),
        "(program (add 1 2))"
    );
}

#[test]
fn sigil_use_site_is_replaced() {
    assert_eq!(
        expand_str("macro twice (x) stop (x) [x, x] end %twice(y)").unwrap(),
        "(program (vector y y))"
    );
}

#[test]
fn zero_parameter_macro() {
    assert_eq!(
        expand_str("macro answer () stop () 42 end answer()").unwrap(),
        "(program 42)"
    );
}

#[test]
fn ordinary_applications_are_left_alone() {
    assert_eq!(
        expand_str("f(1) (a op b)").unwrap(),
        "(program (apply f (exp_list 1)) (apply op (exp_list a b)))"
    );
}

#[test]
fn nested_expansion_reaches_a_fixed_point() {
    let unit = Pipeline::default()
        .compile_str(
            "nested.dl",
            "macro twice (x) stop (x) [x, x] end \
             macro quad (y) stop (y) twice(twice(y)) end \
             quad(1)",
        )
        .unwrap();
    assert_eq!(
        unit.expanded.pretty(),
        "(program (vector (vector 1 1) (vector 1 1)))"
    );

    let steps: Vec<_> = unit
        .trace
        .iter()
        .map(|s| (s.macro_name.as_str(), s.depth))
        .collect();
    assert_eq!(steps, vec![("twice", 1), ("twice", 1), ("quad", 0)]);
}

#[test]
fn arguments_are_expanded_before_the_site() {
    assert_eq!(
        expand_str("macro twice (x) stop (x) [x, x] end twice(twice(0))").unwrap(),
        "(program (vector (vector 0 0) (vector 0 0)))"
    );
}

#[test]
fn substitution_is_not_hygienic() {
    // The formals are renamed to whatever the use site passes, even when
    // those names collide with the template's own identifiers.
    assert_eq!(
        expand_str("macro swap (a b) stop (a b) [b, a] end swap(b, a)").unwrap(),
        "(program (vector a b))"
    );
    assert_eq!(
        expand_str("macro capture (v) stop (v) tmp + v end capture(tmp)").unwrap(),
        "(program (add tmp tmp))"
    );
}

#[test]
fn definitions_inside_blocks_are_stripped() {
    assert_eq!(
        expand_str("{ macro inc (x) stop (x) x + 1 end inc(2) }").unwrap(),
        "(program (function (params) (block (add 2 1))))"
    );
}

#[test]
fn definitions_can_be_kept() {
    let config = FrontendConfig {
        strip_definitions: false,
        ..FrontendConfig::default()
    };
    assert_eq!(
        expand_with("macro k () stop () 1 end k()", config).unwrap(),
        "(program (macro k (id_list) stop (transform (pattern) 1)) 1)"
    );
}

#[test]
fn first_transform_rule_is_the_template() {
    let (_, registry) = parse_program("macro m (x) stop (x) [x] (x) (x, x) end").unwrap();
    let m = registry.get("m").unwrap();
    assert_eq!(m.rules().len(), 2);
    assert_eq!(m.template().pretty(), "(vector x)");
    assert_eq!(m.terminator(), "stop");
}

// ---
// Errors
// ---

#[test]
fn too_few_actuals_is_an_arity_error_and_leaves_the_macro_intact() {
    let (_, registry) = parse_program("macro pair (a b) stop (a b) [a, b] end").unwrap();
    let before = registry.get("pair").unwrap().clone();

    let one = Ast::leaf(dl::Kind::Num, "1", Span::default());
    let err = registry
        .get("pair")
        .unwrap()
        .apply(vec![one], Span::default())
        .unwrap_err();
    assert_eq!(err.code_str(), "dl::macro::arity");
    assert_eq!(
        err.to_string(),
        "Macro error at unknown location: 'pair' expects 2 argument(s) but 1 were supplied"
    );
    assert_eq!(registry.get("pair"), Some(&before));
}

#[test]
fn arity_errors_surface_from_the_pipeline() {
    let err = expand_str("macro pair (a b) stop (a b) [a, b] end pair(1, 2, 3)").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Macro);
    assert!(err.to_string().contains("expects 2 argument(s) but 3"), "{err}");
}

#[test]
fn unknown_sigil_macro_is_an_error() {
    let err = expand_str("%nothing(1)").unwrap_err();
    assert_eq!(err.code_str(), "dl::macro::unknown");
    assert_eq!(err.to_string(), "Macro error at line 1, column 1: unknown macro 'nothing'");
}

#[test]
fn self_recursive_macro_hits_the_depth_limit() {
    let config = FrontendConfig {
        max_expansion_depth: 8,
        ..FrontendConfig::default()
    };
    let err = expand_with("macro forever (x) stop (x) forever(x) end forever(1)", config)
        .unwrap_err();
    assert_eq!(err.code_str(), "dl::macro::recursion_limit");
    assert!(err.to_string().contains("depth limit of 8"), "{err}");
}

#[test]
fn default_depth_limit_applies() {
    let err = expand_str("macro forever (x) stop (x) [forever(x)] end forever(1)").unwrap_err();
    assert!(err.to_string().contains("depth limit of 128"), "{err}");
}

#[test]
fn malformed_definitions() {
    let err = parse_program("macro m (x) stop end").unwrap_err();
    assert_eq!(err.code_str(), "dl::macro::malformed");
    assert!(err.to_string().contains("macro 'm' has no transform rule"), "{err}");

    let err = parse_program("macro m (x x) stop (x) x end").unwrap_err();
    assert!(err.to_string().contains("duplicate parameter 'x' in macro 'm'"), "{err}");
}

// ---
// Registry policy
// ---

#[test]
fn later_definition_wins_by_default() {
    assert_eq!(
        expand_str("macro m (x) stop (x) [x] end macro m (x) stop (x) (x, x) end m(1)").unwrap(),
        "(program (list 1 1))"
    );
}

#[test]
fn duplicate_definition_can_be_rejected() {
    let err = parse_with_config(
        "macro m (x) stop (x) [x] end macro m (x) stop (x) (x, x) end",
        &reject(),
    )
    .unwrap_err();
    assert_eq!(err.code_str(), "dl::macro::duplicate");
    let message = err.to_string();
    assert!(message.starts_with("Macro error at line 1, column "), "{message}");
    assert!(message.ends_with("'m' is already defined"), "{message}");
}

#[test]
fn grouped_definition_is_registered_once() {
    assert_eq!(
        expand_with("(macro m (x) stop (x) x end) m(5)", reject()).unwrap(),
        "(program 5)"
    );
}

#[test]
fn expand_works_on_a_parsed_tree() {
    let (mut program, registry) = parse_program("macro neg (x) stop (x) -x end neg(3)").unwrap();
    expand(&mut program, &registry, &FrontendConfig::default()).unwrap();
    assert_eq!(program.pretty(), "(program (sub 3))");
}
