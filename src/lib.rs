//! Compiler front-end for the aaa stack language: tokenizer, parser,
//! cross-referencer and type checker. No backend lives here — see
//! [`codegen`] for the handoff contract a downstream emitter consumes.

pub mod ast;
pub mod codegen;
pub mod crossref;
pub mod diagnostics;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod typechecker;

use std::path::Path;

use codegen::CheckedProgram;
use crossref::SymbolKey;
use diagnostics::DiagnosticBag;

/// Runs the full front-end pipeline against `entry_path`, augmented by the
/// declarations in `builtins_path`. Each stage only hands off to the next
/// once it is itself free of diagnostics: a program with parse errors is
/// never cross-referenced, and one with cross-reference errors is never
/// type-checked, since both would otherwise cascade into noise unrelated
/// to the actual problem.
pub fn compile(entry_path: &Path, builtins_path: &Path) -> (DiagnosticBag, Option<CheckedProgram>) {
    let mut diagnostics = DiagnosticBag::new();

    let program = driver::load_program(entry_path, builtins_path);
    diagnostics.extend(program.diagnostics.clone());
    if !diagnostics.is_empty() {
        return (diagnostics, None);
    }

    let cross_referenced = crossref::cross_reference(&program);
    diagnostics.extend(cross_referenced.diagnostics.clone());
    if !diagnostics.is_empty() {
        return (diagnostics, None);
    }

    let type_errors = typechecker::type_check(&cross_referenced);
    diagnostics.extend(type_errors);
    if !diagnostics.is_empty() {
        return (diagnostics, None);
    }

    let entry_point = cross_referenced
        .identifiables
        .lookup(&SymbolKey::new(program.entry_path.clone(), "main".to_string()))
        .and_then(|id| cross_referenced.identifiables.resolve_through_imports(id));

    let Some(entry_point) = entry_point else {
        diagnostics.push(diagnostics::Diagnostic::without_position(
            "entry file does not define a main function".to_string(),
        ));
        return (diagnostics, None);
    };

    let checked = CheckedProgram {
        identifiables: cross_referenced.identifiables,
        entry_point,
    };
    (diagnostics, Some(checked))
}
