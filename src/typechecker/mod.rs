//! Type checker: one abstract-stack walk per function body, using the
//! signatures and types the cross-referencer already resolved. Every
//! function is checked independently and to completion; one function's
//! errors never stop another's from being reported.

mod check;
mod errors;
mod unify;

pub use errors::TypeCheckError;

use std::path::Path;

use log::{debug, warn};

use crate::crossref::{CrossReferenceOutput, Identifiable, SymbolKey, TypeKind, VariableType};
use crate::diagnostics::Diagnostic;

/// The three primitive types every other declaration in a program is built
/// from. Resolved once per run directly out of the builtins file.
pub struct BuiltinTypes {
    pub int: VariableType,
    pub str_: VariableType,
    pub bool_: VariableType,
}

fn resolve_builtin_type(
    output: &CrossReferenceOutput,
    builtins_path: &Path,
    name: &str,
) -> Option<VariableType> {
    let key = SymbolKey::new(builtins_path.to_path_buf(), name.to_string());
    let id = output.identifiables.lookup(&key)?;
    let Identifiable::Type(t) = output.identifiables.get(id) else {
        return None;
    };
    if !matches!(t.kind, TypeKind::Builtin { .. }) {
        return None;
    }
    Some(VariableType::Type {
        type_id: id,
        name: name.to_string(),
        params: vec![],
        is_const: false,
    })
}

pub fn type_check(output: &CrossReferenceOutput) -> Vec<Diagnostic> {
    let builtins_path = output.builtins_path.as_path();
    let (int, str_, bool_) = match (
        resolve_builtin_type(output, builtins_path, "int"),
        resolve_builtin_type(output, builtins_path, "str"),
        resolve_builtin_type(output, builtins_path, "bool"),
    ) {
        (Some(int), Some(str_), Some(bool_)) => (int, str_, bool_),
        _ => {
            warn!("builtins file is missing one of int, str, bool; skipping type checking");
            return vec![Diagnostic::without_position(
                "builtins file must declare primitive types int, str and bool".to_string(),
            )]
        }
    };
    let builtins = BuiltinTypes { int, str_, bool_ };

    let mut errors = Vec::new();
    for (id, item) in output.identifiables.iter() {
        let Identifiable::Function(f) = item else { continue };
        if f.is_builtin {
            continue;
        }
        let (Some(body), Some(args), Some(return_types)) =
            (f.body.resolved(), f.args.resolved(), f.return_types.resolved())
        else {
            continue;
        };
        let label = match &f.struct_name {
            Some(struct_name) => format!("{struct_name}:{}", f.name),
            None => f.name.clone(),
        };
        debug!("type checking function '{label}'");
        let before = errors.len();
        check::check_function(
            id,
            f.struct_name.as_deref(),
            &f.name,
            args,
            return_types,
            body,
            &output.identifiables,
            &builtins,
            &mut errors,
        );
        if errors.len() > before {
            warn!("function '{label}' failed type checking with {} error(s)", errors.len() - before);
        }
    }

    errors.into_iter().map(Diagnostic::from).collect()
}
