//! Cross-referencer: turns many per-file ASTs into one program-wide symbol
//! table in which every identifier use points at its definition and every
//! type literal is resolved to a [`VariableType`].
//!
//! Three phases, each tolerant of errors in the others: harvest (§ Phase
//! A), resolve declarations (§ Phase B: imports, struct fields, enum
//! variants, function signatures), then resolve function bodies (§ Phase
//! C). See `resolve.rs` for B and C.

mod errors;
mod resolve;
mod resolved_body;
mod symbols;
mod variable_type;

pub use errors::CrossRefError;
pub use resolved_body::{IdentifierKind, ResolvedBody, ResolvedCall, ResolvedItem, ResolvedMatchCase};
pub use symbols::{
    FunctionArgument, FunctionSymbol, Identifiable, Identifiables, ImportSymbol, SymbolId,
    SymbolKey, TypeId, TypeKind, TypeSymbol,
};
pub use variable_type::{ReturnTypeSet, Unresolved, VariableType};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::debug;

use crate::ast::{EnumDecl, FunctionDecl, StructDecl, TopLevelItem};
use crate::diagnostics::Diagnostic;
use crate::driver::{resolve_import_path, ParsedProgram};

pub struct CrossReferenceOutput {
    pub identifiables: Identifiables,
    pub builtins_path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Declaration ASTs tied to the [`SymbolId`] harvest bound them to, so the
/// later resolution phases can revisit the declaration without re-deriving
/// it from a name lookup (a colliding second declaration only ever gets one
/// of these entries: the first, which is the one harvest actually bound).
#[derive(Default)]
struct Harvested {
    structs: Vec<(SymbolId, PathBuf, StructDecl)>,
    enums: Vec<(SymbolId, PathBuf, EnumDecl)>,
    functions: Vec<(SymbolId, PathBuf, FunctionDecl)>,
    imports: Vec<(SymbolId, PathBuf, String)>,
}

pub fn cross_reference(program: &ParsedProgram) -> CrossReferenceOutput {
    let mut identifiables = Identifiables::new();
    let mut errors: Vec<CrossRefError> = Vec::new();

    debug!("harvesting declarations from {} file(s)", program.file_order.len());
    let harvested = harvest(program, &mut identifiables, &mut errors);

    debug!("checking import graph for cycles");
    let dependency_errors = detect_import_cycles(program);
    errors.extend(dependency_errors);

    debug!("resolving {} import(s)", harvested.imports.len());
    resolve::resolve_imports(&harvested.imports, &mut identifiables, &mut errors);
    debug!("resolving {} struct declaration(s)", harvested.structs.len());
    resolve::resolve_struct_fields(
        &harvested.structs,
        &program.builtins_path,
        &mut identifiables,
        &mut errors,
    );
    debug!("resolving {} enum declaration(s)", harvested.enums.len());
    resolve::resolve_enum_variants(
        &harvested.enums,
        &program.builtins_path,
        &mut identifiables,
        &mut errors,
    );
    debug!("resolving {} function signature(s)", harvested.functions.len());
    resolve::resolve_function_signatures(
        &harvested.functions,
        &program.builtins_path,
        &mut identifiables,
        &mut errors,
    );
    debug!("resolving {} function body/bodies", harvested.functions.len());
    resolve::resolve_function_bodies(
        &harvested.functions,
        &program.builtins_path,
        &mut identifiables,
        &mut errors,
    );

    CrossReferenceOutput {
        identifiables,
        builtins_path: program.builtins_path.clone(),
        diagnostics: errors.into_iter().map(Diagnostic::from).collect(),
    }
}

/// Phase A: one [`Identifiable`] per top-level declaration (and per
/// imported item), inserted in source order. A second declaration at the
/// same `(file, name)` key is reported as [`CrossRefError::CollidingIdentifier`]
/// and left unbound so later lookups resolve to the first.
fn harvest(
    program: &ParsedProgram,
    identifiables: &mut Identifiables,
    errors: &mut Vec<CrossRefError>,
) -> Harvested {
    let mut harvested = Harvested::default();

    for file in &program.file_order {
        let Some(source_file) = program.files.get(file) else {
            continue;
        };
        for item in &source_file.items {
            match item {
                TopLevelItem::Struct(s) => {
                    let kind = if s.is_builtin {
                        TypeKind::Builtin {
                            type_params: s.type_params.clone(),
                        }
                    } else {
                        TypeKind::Struct {
                            type_params: s.type_params.clone(),
                            fields: s
                                .fields
                                .iter()
                                .map(|f| (f.name.clone(), Unresolved::Unresolved))
                                .collect(),
                        }
                    };
                    let symbol = Identifiable::Type(TypeSymbol {
                        name: s.name.clone(),
                        kind,
                        position: s.position.clone(),
                    });
                    if let Some(id) = bind(identifiables, errors, file, &s.name, symbol) {
                        harvested.structs.push((id, file.clone(), s.clone()));
                    }
                }
                TopLevelItem::Enum(e) => {
                    let symbol = Identifiable::Type(TypeSymbol {
                        name: e.name.clone(),
                        kind: TypeKind::Enum {
                            variants: e
                                .variants
                                .iter()
                                .map(|v| (v.name.clone(), Unresolved::Unresolved))
                                .collect(),
                        },
                        position: e.position.clone(),
                    });
                    if let Some(id) = bind(identifiables, errors, file, &e.name, symbol) {
                        harvested.enums.push((id, file.clone(), e.clone()));
                    }
                }
                TopLevelItem::Function(f) => {
                    let key = f.symbol_name();
                    let symbol = Identifiable::Function(FunctionSymbol {
                        struct_name: f.struct_name.clone(),
                        name: f.name.clone(),
                        generic_params: f.generic_params.clone(),
                        args: Unresolved::Unresolved,
                        return_types: Unresolved::Unresolved,
                        body: Unresolved::Unresolved,
                        is_builtin: f.is_builtin,
                        position: f.position.clone(),
                    });
                    if let Some(id) = bind(identifiables, errors, file, &key, symbol) {
                        harvested.functions.push((id, file.clone(), f.clone()));
                    }
                }
                TopLevelItem::Import(import) => {
                    let source_file = resolve_import_path(file, &import.source);
                    for item in &import.items {
                        let symbol = Identifiable::Import(ImportSymbol {
                            name: item.imported.clone(),
                            source_file: source_file.clone(),
                            source_name: item.original.clone(),
                            position: item.position.clone(),
                            target: Unresolved::Unresolved,
                        });
                        if let Some(id) = bind(identifiables, errors, file, &item.imported, symbol)
                        {
                            harvested.imports.push((id, source_file.clone(), item.original.clone()));
                        }
                    }
                }
            }
        }
    }

    harvested
}

/// Returns the freshly bound id, or `None` if `name` already existed in
/// this file's scope (the collision is reported and the new declaration is
/// inserted but left unbound, so lookups keep resolving to the first one).
fn bind(
    identifiables: &mut Identifiables,
    errors: &mut Vec<CrossRefError>,
    file: &Path,
    name: &str,
    symbol: Identifiable,
) -> Option<SymbolId> {
    let key = SymbolKey::new(file.to_path_buf(), name.to_string());
    if let Some(existing_id) = identifiables.lookup(&key) {
        let existing = identifiables.get(existing_id);
        errors.push(CrossRefError::colliding(
            (existing.position(), &existing.describe()),
            (symbol.position(), &symbol.describe()),
        ));
        identifiables.insert(symbol);
        return None;
    }
    let id = identifiables.insert(symbol);
    identifiables.bind(key, id);
    Some(id)
}

/// Builds the file-level import dependency graph and reports one
/// [`CrossRefError::CircularDependencyError`] per cycle found by DFS.
fn detect_import_cycles(program: &ParsedProgram) -> Vec<CrossRefError> {
    let mut edges: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    for file in &program.file_order {
        let Some(source_file) = program.files.get(file) else {
            continue;
        };
        let targets = edges.entry(file.clone()).or_default();
        for import in source_file.imports() {
            targets.push(resolve_import_path(file, &import.source));
        }
    }

    #[derive(PartialEq, Eq, Clone, Copy)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut color: HashMap<PathBuf, Color> = program
        .file_order
        .iter()
        .map(|f| (f.clone(), Color::White))
        .collect();
    let mut stack: Vec<PathBuf> = Vec::new();
    let mut reported: HashSet<Vec<PathBuf>> = HashSet::new();
    let mut errors = Vec::new();

    fn dfs(
        node: &Path,
        edges: &HashMap<PathBuf, Vec<PathBuf>>,
        color: &mut HashMap<PathBuf, Color>,
        stack: &mut Vec<PathBuf>,
        reported: &mut HashSet<Vec<PathBuf>>,
        errors: &mut Vec<CrossRefError>,
    ) {
        color.insert(node.to_path_buf(), Color::Gray);
        stack.push(node.to_path_buf());

        if let Some(targets) = edges.get(node) {
            for target in targets {
                match color.get(target).copied().unwrap_or(Color::Black) {
                    Color::White => dfs(target, edges, color, stack, reported, errors),
                    Color::Gray => {
                        let start = stack.iter().position(|p| p == target).unwrap_or(0);
                        let mut cycle: Vec<PathBuf> = stack[start..].to_vec();
                        cycle.push(target.clone());
                        let mut dedup_key = cycle.clone();
                        dedup_key.sort();
                        if reported.insert(dedup_key) {
                            errors.push(CrossRefError::CircularDependencyError { files: cycle });
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        stack.pop();
        color.insert(node.to_path_buf(), Color::Black);
    }

    for file in &program.file_order {
        if color.get(file).copied() == Some(Color::White) {
            dfs(file, &edges, &mut color, &mut stack, &mut reported, &mut errors);
        }
    }

    errors
}

/// Look up `name` within `file`'s scope, checking the builtins file
/// *first* (mirroring the reference implementation, where a builtin of the
/// same name always wins), then the file's own declarations. Follows an
/// `Import` to its target. Never reports [`CrossRefError::IndirectImportException`]
/// itself — that is only checked while resolving the import.
pub(crate) fn lookup_identifier(
    identifiables: &Identifiables,
    builtins_path: &Path,
    file: &Path,
    name: &str,
) -> Option<SymbolId> {
    let builtins_key = SymbolKey::new(builtins_path.to_path_buf(), name.to_string());
    let local_key = SymbolKey::new(file.to_path_buf(), name.to_string());

    let id = identifiables
        .lookup(&builtins_key)
        .or_else(|| identifiables.lookup(&local_key))?;

    identifiables.resolve_through_imports(id)
}
