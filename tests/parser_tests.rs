// tests/parser_tests.rs

use dl::{
    ast::{Ast, Kind},
    diagnostics::ErrorType,
    syntax::parse_program,
    traverse::{post_order_kinds, post_order_names},
};

fn parse(source: &str) -> Ast {
    parse_program(source).unwrap().0
}

fn kinds(source: &str) -> String {
    post_order_names(&parse(source))
}

fn pretty(source: &str) -> String {
    parse(source).pretty()
}

// ---
// Post-order kind sequences
// ---

#[test]
fn empty_program_is_a_lone_program_node() {
    assert_eq!(post_order_kinds(&parse("")), vec![Kind::Program]);
    assert_eq!(kinds("   # only a comment\n"), "program");
}

#[test]
fn test_vectors() {
    assert_eq!(kinds("[]"), "vector program");
    assert_eq!(kinds("[1,2,3]"), "num num num vector program");
}

#[test]
fn test_lists() {
    assert_eq!(kinds("(1,2)"), "num num list program");
    assert_eq!(kinds("()"), "list program");
}

#[test]
fn test_block_with_params() {
    assert_eq!(
        kinds("{|a,b| a + b}"),
        "id id params id id add block function program"
    );
}

#[test]
fn test_map_with_symbol_key() {
    assert_eq!(kinds("@{ $foo : 42 }"), "symbol num sep map program");
}

#[test]
fn test_member_access_chain() {
    assert_eq!(kinds("foo.bar.baz"), "id id id memb memb program");
    assert_eq!(pretty("foo.bar.baz"), "(program (memb baz (memb bar foo)))");
}

// ---
// Separators and grouping
// ---

#[test]
fn trailing_commas_are_accepted() {
    assert_eq!(pretty("[1,]"), pretty("[1]"));
    assert_eq!(pretty("(1,)"), pretty("`(1)"));
    assert_eq!(pretty("(1,)"), "(program (list 1))");
    assert_eq!(pretty("@{ $a : 1, }"), pretty("@{ $a : 1 }"));
}

#[test]
fn commas_between_items_are_optional() {
    assert_eq!(pretty("[1 2 3]"), pretty("[1, 2, 3]"));
    assert_eq!(pretty("@{ $a : 1 $b : 2 }"), "(program (map (sep $a 1) (sep $b 2)))");
}

#[test]
fn single_parenthesized_expression_is_a_grouping() {
    assert_eq!(pretty("(1)"), "(program 1)");
    assert_eq!(pretty("(1 + 2) * 3"), "(program (mul (add 1 2) 3))");
}

#[test]
fn quoted_lists() {
    assert_eq!(pretty("`()"), "(program (list))");
    assert_eq!(pretty("`(1 'c' \"s\")"), "(program (list 1 'c' \"s\"))");
}

// ---
// Literals and operators
// ---

#[test]
fn test_literals() {
    assert_eq!(
        pretty("'a' \"hi\" 3.5 $s x"),
        "(program 'a' \"hi\" 3.5 $s x)"
    );
}

#[test]
fn binary_operators_follow_precedence() {
    assert_eq!(pretty("1 + 2 * 3"), "(program (add 1 (mul 2 3)))");
    assert_eq!(pretty("1 - 2 - 3"), "(program (sub (sub 1 2) 3))");
    assert_eq!(pretty("a || b && c"), "(program (or a (and b c)))");
    assert_eq!(pretty("a < b == c >= d"), "(program (eq (lt a b) (gte c d)))");
}

#[test]
fn unary_operators() {
    assert_eq!(pretty("-x"), "(program (sub x))");
    assert_eq!(pretty("!a && b"), "(program (and (not a) b))");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(pretty("x = y = 3"), "(program (assign x (assign y 3)))");
}

// ---
// Applications
// ---

#[test]
fn prefix_application() {
    assert_eq!(pretty("f(1, 2)"), "(program (apply f (exp_list 1 2)))");
    assert_eq!(pretty("f()"), "(program (apply f (exp_list)))");
    assert_eq!(kinds("f(g(x))"), "id id id exp_list apply exp_list apply program");
}

#[test]
fn infix_application_with_identifier_operator() {
    assert_eq!(pretty("(a plus b)"), "(program (apply plus (exp_list a b)))");
    assert_eq!(
        pretty("(1 max (2 min 3))"),
        "(program (apply max (exp_list 1 (apply min (exp_list 2 3)))))"
    );
}

#[test]
fn macro_sigil_application() {
    assert_eq!(pretty("%m(1)"), "(program (macro_apply m (exp_list 1)))");
}

// ---
// Core forms
// ---

#[test]
fn test_core_forms() {
    assert_eq!(pretty("define x 1 end"), "(program (define x 1))");
    assert_eq!(pretty("set! x 2 end"), "(program (assign x 2))");
    assert_eq!(
        pretty("lambda (a b) a + b end"),
        "(program (lambda (id_list a b) (exp_list (add a b))))"
    );
    assert_eq!(pretty("begin 1 2 end"), "(program (begin (exp_list 1 2)))");
    assert_eq!(pretty("if a b end"), "(program (if a b))");
    assert_eq!(pretty("if a b c end"), "(program (if a b c))");
}

#[test]
fn block_parameter_forms() {
    assert_eq!(pretty("{1}"), "(program (function (params) (block 1)))");
    assert_eq!(pretty("{|| 1}"), "(program (function (params) (block 1)))");
    assert_eq!(pretty("{|a,| a}"), "(program (function (params a) (block a)))");
}

#[test]
fn macro_definition_tree() {
    assert_eq!(
        kinds("macro m (x) stop (x) [x] end"),
        "id id id_list id id pattern id vector transform macro program"
    );
}

// ---
// Errors
// ---

#[test]
fn unterminated_vector_reports_expected_token() {
    let err = parse_program("[1, 2").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Syntax);
    assert_eq!(
        err.to_string(),
        "Syntax error at line 1, column 6: expected ']', found end of input"
    );
}

#[test]
fn map_entry_needs_separator() {
    let err = parse_program("@{ $a 1 }").unwrap_err();
    assert_eq!(err.code_str(), "dl::syntax");
    assert!(err.to_string().contains("expected ':'"), "{err}");
}

#[test]
fn lexical_errors_surface_from_the_parser() {
    let err = parse_program("[1.]").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Lex);
    assert!(err.to_string().contains("missing fractional portion"));
}

#[test]
fn missing_end_names_the_open_form() {
    let err = parse_program("begin 1 2").unwrap_err();
    assert!(err.to_string().contains("expected 'end'"), "{err}");
    assert!(err.help_text().unwrap_or_default().contains("`begin` form"));
}

// ---
// Tree ownership
// ---

#[test]
fn clone_is_deep_and_independent() {
    let original = parse("[1, [2, 3]]");
    let mut copy = original.clone();
    assert_eq!(copy, original);

    copy.children_mut()[0].children_mut().clear();
    assert_eq!(original.pretty(), "(program (vector 1 (vector 2 3)))");
    assert_eq!(copy.pretty(), "(program (vector))");
}

// ---
// Nesting bound
// ---

#[test]
fn deeply_nested_input_fails_instead_of_overflowing() {
    let depth = 10_000;
    for source in [
        format!("{}1{}", "[".repeat(depth), "]".repeat(depth)),
        format!("{}1{}", "(".repeat(depth), ")".repeat(depth)),
        format!("{}1{}", "{".repeat(depth), "}".repeat(depth)),
    ] {
        let err = parse_program(&source).unwrap_err();
        assert_eq!(err.code_str(), "dl::syntax");
        assert!(err.to_string().contains("expression nested too deeply"), "{err}");
    }
}

#[test]
fn moderate_nesting_is_accepted() {
    let source = format!("{}1{}", "[".repeat(20), "]".repeat(20));
    assert_eq!(kinds(&source).split(' ').filter(|k| *k == "vector").count(), 20);
}
