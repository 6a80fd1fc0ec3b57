use std::path::Path;

use test_utils::{check_compiles, check_fails_with};

#[test]
fn compiles_hello_sum() {
    check_compiles(Path::new("tests/fixtures/ok_hello_sum.aaa")).unwrap();
}

#[test]
fn compiles_generic_vec_usage() {
    check_compiles(Path::new("tests/fixtures/ok_generic_vec.aaa")).unwrap();
}

#[test]
fn rejects_mismatched_branch_stacks() {
    check_fails_with(
        Path::new("tests/fixtures/err_branch_mismatch.aaa"),
        "branches leave different stacks",
    )
    .unwrap();
}

#[test]
fn rejects_colliding_declarations() {
    check_fails_with(
        Path::new("tests/fixtures/err_name_collision.aaa"),
        "found name collision",
    )
    .unwrap();
}

#[test]
fn rejects_indirect_imports() {
    check_fails_with(
        Path::new("tests/fixtures/err_indirect_import_a.aaa"),
        "indirect imports are forbidden",
    )
    .unwrap();
}

#[test]
fn rejects_non_exhaustive_match() {
    check_fails_with(
        Path::new("tests/fixtures/err_match_exhaustive.aaa"),
        "match is not exhaustive",
    )
    .unwrap();
}

#[test]
fn rejects_use_binding_colliding_with_argument() {
    check_fails_with(
        Path::new("tests/fixtures/err_use_collides_with_argument.aaa"),
        "found name collision",
    )
    .unwrap();
}

#[test]
fn rejects_assignment_to_undeclared_variable() {
    check_fails_with(
        Path::new("tests/fixtures/err_assign_undeclared.aaa"),
        "no such variable is in scope",
    )
    .unwrap();
}

#[test]
fn rejects_unhandled_top_level_token() {
    check_fails_with(
        Path::new("tests/fixtures/err_unhandled_top_level.aaa"),
        "unhandled top-level token",
    )
    .unwrap();
}
