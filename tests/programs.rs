use pretty_assertions::assert_eq;

use midas::common::Source;
use midas::{run, MidasError};

fn run_program(src: &str) -> Result<String, MidasError> {
    let source = Source::in_memory(src);
    let mut out = Vec::new();
    run(source, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn arithmetic_promotion() {
    assert_eq!(run_program("print 1 + 2.0;").unwrap(), "3.000000\n");
}

#[test]
fn scoping() {
    assert_eq!(
        run_program("var x = 1; do var x = 2; print x; end print x;").unwrap(),
        "2\n1\n"
    );
}

#[test]
fn while_loop_with_break() {
    assert_eq!(
        run_program(
            "var i = 0; while (i < 5) do if (i == 3) break; print i; i = i + 1; end print i;"
        )
        .unwrap(),
        "0\n1\n2\n3\n"
    );
}

#[test]
fn function_with_return() {
    assert_eq!(
        run_program("fun add(a, b) do return a + b; end print add(2, 3);").unwrap(),
        "5\n"
    );
}

#[test]
fn short_circuit_logical_operators() {
    assert_eq!(
        run_program("var x = 0; true or (x = 1); print x; false and (x = 2); print x;").unwrap(),
        "0\n0\n"
    );
}

#[test]
fn undeclared_reference_is_a_fatal_error() {
    let err = run_program("print y;").unwrap_err();
    match err {
        MidasError::Undeclared { name, .. } => assert_eq!(name, "y"),
        other => panic!("expected Undeclared, got {:?}", other),
    }
}

#[test]
fn for_loop_desugars_to_a_while_loop() {
    assert_eq!(
        run_program("for (var i = 0; i < 3; i = i + 1) do print i; end").unwrap(),
        "0\n1\n2\n"
    );
}

#[test]
fn for_loop_with_all_clauses_omitted_runs_forever_unless_broken() {
    assert_eq!(
        run_program("var i = 0; for (;;) do if (i == 2) break; print i; i = i + 1; end").unwrap(),
        "0\n1\n"
    );
}

#[test]
fn recursive_function_calls() {
    assert_eq!(
        run_program(
            "fun fact(n) do if (n == 0) return 1; return n * fact(n - 1); end print fact(5);"
        )
        .unwrap(),
        "120\n"
    );
}

#[test]
fn redeclaring_a_name_in_the_same_scope_is_an_error() {
    let err = run_program("var x = 1; var x = 2;").unwrap_err();
    assert!(matches!(err, MidasError::AlreadyDeclared { .. }));
}

#[test]
fn calling_a_non_function_is_a_type_mismatch() {
    let err = run_program("var x = 1; x();").unwrap_err();
    assert!(matches!(err, MidasError::TypeMismatch { .. }));
}

#[test]
fn wrong_arity_is_reported() {
    let err = run_program("fun f(a, b) do return a; end f(1);").unwrap_err();
    assert!(matches!(err, MidasError::ArityMismatch { .. }));
}

#[test]
fn integer_division_by_zero_is_an_error() {
    let err = run_program("print 1 // 0;").unwrap_err();
    assert!(matches!(err, MidasError::DivideByZero { .. }));
}

#[test]
fn true_division_by_zero_follows_ieee_754() {
    assert_eq!(run_program("print 1 / 0;").unwrap(), "inf\n");
}

#[test]
fn invalid_assignment_target_is_rejected_at_parse_time() {
    let err = run_program("1 = 2;").unwrap_err();
    assert!(matches!(err, MidasError::InvalidAssignmentTarget { .. }));
}

#[test]
fn break_outside_a_loop_is_a_syntax_error() {
    let err = run_program("break;").unwrap_err();
    assert!(matches!(err, MidasError::SyntaxError { .. }));
}

#[test]
fn return_outside_a_function_is_a_syntax_error() {
    let err = run_program("return;").unwrap_err();
    assert!(matches!(err, MidasError::SyntaxError { .. }));
}

#[test]
fn break_inside_a_function_nested_in_a_loop_is_still_rejected() {
    let err = run_program(
        "while (true) do fun f() do break; end f(); break; end",
    )
    .unwrap_err();
    assert!(matches!(err, MidasError::SyntaxError { .. }));
}

#[test]
fn break_inside_a_loop_that_is_itself_inside_a_function_is_allowed() {
    assert_eq!(
        run_program(
            "fun f() do var i = 0; while (i < 3) do if (i == 1) break; print i; i = i + 1; end end f();"
        )
        .unwrap(),
        "0\n"
    );
}

#[test]
fn string_literals_print_verbatim() {
    assert_eq!(
        run_program(r#"print "hello, world";"#).unwrap(),
        "hello, world\n"
    );
}
