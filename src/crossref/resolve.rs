//! Phases B (imports, struct fields, enum variants, function signatures)
//! and C (function bodies) of cross-referencing. Phase A (harvest) and
//! import-cycle detection live in `mod.rs`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ast::{BodyItem, FunctionBody, FunctionCall, TypeOrFnPtr};

use super::errors::CrossRefError;
use super::lookup_identifier;
use super::resolved_body::{IdentifierKind, ResolvedBody, ResolvedCall, ResolvedItem, ResolvedMatchCase};
use super::symbols::{FunctionArgument, Identifiable, Identifiables, SymbolId, SymbolKey, TypeKind};
use super::variable_type::{ReturnTypeSet, Unresolved, VariableType};
use crate::ast::{EnumDecl, FunctionDecl, StructDecl};
use crate::position::Position;

/// Resolves every `Import`'s direct `(source_file, source_name)` target.
/// Never chains: the reference implementation guarantees an import's
/// target is itself never an import (re-exporting is not supported), so a
/// single pass over the harvested imports is enough.
pub(super) fn resolve_imports(
    imports: &[(SymbolId, PathBuf, String)],
    identifiables: &mut Identifiables,
    errors: &mut Vec<CrossRefError>,
) {
    for (id, source_file, source_name) in imports {
        let position = match identifiables.get(*id) {
            Identifiable::Import(import) => import.position.clone(),
            _ => unreachable!("harvested import id must be an Import"),
        };

        let key = SymbolKey::new(source_file.clone(), source_name.clone());
        let Some(target_id) = identifiables.lookup(&key) else {
            errors.push(CrossRefError::ImportedItemNotFound {
                position,
                source_file: source_file.clone(),
                source_name: source_name.clone(),
            });
            continue;
        };

        if matches!(identifiables.get(target_id), Identifiable::Import(_)) {
            errors.push(CrossRefError::IndirectImportException { position });
            continue;
        }

        if let Identifiable::Import(import) = identifiables.get_mut(*id) {
            import.target = Unresolved::Resolved(target_id);
        }
    }
}

/// Resolves a type literal to a [`VariableType`], checking `scope_params`
/// (the struct's or function's own generic parameter names) before falling
/// back to a symbol lookup. `scope_params` entries shadow any type of the
/// same name: a struct `Box[int]` cannot have a field typed `int` refer to
/// the placeholder even if a type named `int` is also in scope, because a
/// bare placeholder reference never carries type arguments.
fn resolve_type(
    identifiables: &mut Identifiables,
    builtins_path: &Path,
    file: &Path,
    scope_params: &[String],
    literal: &TypeOrFnPtr,
    errors: &mut Vec<CrossRefError>,
) -> Option<VariableType> {
    match literal {
        TypeOrFnPtr::Named(named) => {
            if named.params.is_empty() && scope_params.iter().any(|p| p == &named.name) {
                return Some(VariableType::Placeholder {
                    name: named.name.clone(),
                    is_const: named.is_const,
                });
            }

            let Some(found_id) = lookup_identifier(identifiables, builtins_path, file, &named.name)
            else {
                errors.push(CrossRefError::UnknownIdentifier {
                    position: named.position.clone(),
                    name: named.name.clone(),
                });
                return None;
            };

            let Some(type_symbol) = identifiables.get(found_id).as_type() else {
                errors.push(CrossRefError::invalid_type(
                    named.position.clone(),
                    identifiables.get(found_id),
                ));
                return None;
            };

            let expected = type_symbol.kind.type_param_count();
            if named.params.len() != expected {
                errors.push(CrossRefError::UnexpectedTypeParameterCount {
                    position: named.position.clone(),
                    expected,
                    found: named.params.len(),
                });
                return None;
            }

            let mut params = Vec::with_capacity(named.params.len());
            for param in &named.params {
                params.push(resolve_type(
                    identifiables,
                    builtins_path,
                    file,
                    scope_params,
                    param,
                    errors,
                )?);
            }

            Some(VariableType::Type {
                type_id: found_id,
                name: named.name.clone(),
                params,
                is_const: named.is_const,
            })
        }
        TypeOrFnPtr::FunctionPointer(fn_ptr) => {
            let mut arg_types = Vec::with_capacity(fn_ptr.arg_types.len());
            for arg in &fn_ptr.arg_types {
                arg_types.push(resolve_type(
                    identifiables,
                    builtins_path,
                    file,
                    scope_params,
                    arg,
                    errors,
                )?);
            }
            let return_types = resolve_return_types(
                identifiables,
                builtins_path,
                file,
                scope_params,
                &fn_ptr.return_types,
                errors,
            )?;
            Some(VariableType::FunctionPointer {
                arg_types,
                return_types,
            })
        }
    }
}

fn resolve_return_types(
    identifiables: &mut Identifiables,
    builtins_path: &Path,
    file: &Path,
    scope_params: &[String],
    return_types: &crate::ast::ReturnTypes,
    errors: &mut Vec<CrossRefError>,
) -> Option<ReturnTypeSet> {
    match return_types {
        crate::ast::ReturnTypes::Never => Some(ReturnTypeSet::Never),
        crate::ast::ReturnTypes::Types(types) => {
            let mut resolved = Vec::with_capacity(types.len());
            for t in types {
                resolved.push(resolve_type(
                    identifiables,
                    builtins_path,
                    file,
                    scope_params,
                    t,
                    errors,
                )?);
            }
            Some(ReturnTypeSet::Types(resolved))
        }
    }
}

pub(super) fn resolve_struct_fields(
    structs: &[(SymbolId, PathBuf, StructDecl)],
    builtins_path: &Path,
    identifiables: &mut Identifiables,
    errors: &mut Vec<CrossRefError>,
) {
    for (id, file, decl) in structs {
        if decl.is_builtin {
            continue;
        }
        let mut resolved_fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let resolved = resolve_type(
                identifiables,
                builtins_path,
                file,
                &decl.type_params,
                &field.type_,
                errors,
            );
            resolved_fields.push((field.name.clone(), resolved));
        }

        if let Identifiable::Type(symbol) = identifiables.get_mut(*id) {
            if let TypeKind::Struct { fields, .. } = &mut symbol.kind {
                for (slot, (name, resolved)) in fields.iter_mut().zip(resolved_fields) {
                    debug_assert_eq!(slot.0, name);
                    if let Some(resolved) = resolved {
                        slot.1 = Unresolved::Resolved(resolved);
                    }
                }
            }
        }
    }
}

pub(super) fn resolve_enum_variants(
    enums: &[(SymbolId, PathBuf, EnumDecl)],
    builtins_path: &Path,
    identifiables: &mut Identifiables,
    errors: &mut Vec<CrossRefError>,
) {
    for (id, file, decl) in enums {
        let mut seen: HashMap<String, Position> = HashMap::new();
        let mut resolved_variants = Vec::with_capacity(decl.variants.len());

        for variant in &decl.variants {
            if let Some(first) = seen.get(&variant.name) {
                errors.push(CrossRefError::CollidingEnumVariant {
                    enum_name: decl.name.clone(),
                    first: first.clone(),
                    second: variant.position.clone(),
                    variant_name: variant.name.clone(),
                });
            } else {
                seen.insert(variant.name.clone(), variant.position.clone());
            }

            let mut data = Vec::with_capacity(variant.data.len());
            let mut ok = true;
            for d in &variant.data {
                match resolve_type(identifiables, builtins_path, file, &[], d, errors) {
                    Some(resolved) => data.push(resolved),
                    None => ok = false,
                }
            }
            resolved_variants.push((variant.name.clone(), ok.then_some(data)));
        }

        if let Identifiable::Type(symbol) = identifiables.get_mut(*id) {
            if let TypeKind::Enum { variants } = &mut symbol.kind {
                for (slot, (name, resolved)) in variants.iter_mut().zip(resolved_variants) {
                    if slot.0 == name {
                        if let Some(resolved) = resolved {
                            slot.1 = Unresolved::Resolved(resolved);
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn resolve_function_signatures(
    functions: &[(SymbolId, PathBuf, FunctionDecl)],
    builtins_path: &Path,
    identifiables: &mut Identifiables,
    errors: &mut Vec<CrossRefError>,
) {
    for (id, file, decl) in functions {
        let mut seen_names: HashMap<&str, Position> = HashMap::new();
        let mut args = Vec::with_capacity(decl.args.len());

        for arg in &decl.args {
            if let Some(first) = seen_names.get(arg.name.as_str()) {
                errors.push(CrossRefError::colliding(
                    (first, &format!("argument {}", arg.name)),
                    (&arg.position, &format!("argument {}", arg.name)),
                ));
                continue;
            }
            seen_names.insert(&arg.name, arg.position.clone());

            let Some(type_) = resolve_type(
                identifiables,
                builtins_path,
                file,
                &decl.generic_params,
                &arg.type_,
                errors,
            ) else {
                continue;
            };
            args.push(FunctionArgument {
                name: arg.name.clone(),
                type_,
                position: arg.position.clone(),
            });
        }

        let return_types = resolve_return_types(
            identifiables,
            builtins_path,
            file,
            &decl.generic_params,
            &decl.return_types,
            errors,
        );

        if let Identifiable::Function(symbol) = identifiables.get_mut(*id) {
            symbol.args = Unresolved::Resolved(args);
            if let Some(return_types) = return_types {
                symbol.return_types = Unresolved::Resolved(return_types);
            }
        }
    }
}

/// A stack of lexical scopes introduced by `use` and `<-` blocks, searched
/// innermost-first, with the function's own arguments as the outermost
/// scope.
struct Scope<'a> {
    arguments: &'a [FunctionArgument],
    generics: &'a [String],
    locals: Vec<Vec<(String, Position)>>,
}

impl<'a> Scope<'a> {
    fn new(arguments: &'a [FunctionArgument], generics: &'a [String]) -> Self {
        Self {
            arguments,
            generics,
            locals: Vec::new(),
        }
    }

    fn find_local(&self, name: &str) -> bool {
        self.locals.iter().rev().any(|frame| frame.iter().any(|(v, _)| v == name))
    }

    /// The position of the nearest enclosing `use`/`<-` binding of `name`,
    /// if any, innermost frame first.
    fn find_local_position(&self, name: &str) -> Option<&Position> {
        self.locals
            .iter()
            .rev()
            .find_map(|frame| frame.iter().find(|(v, _)| v == name).map(|(_, p)| p))
    }

    fn find_argument(&self, name: &str) -> Option<&FunctionArgument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    fn push(&mut self, names: Vec<String>, position: &Position) {
        self.locals
            .push(names.into_iter().map(|n| (n, position.clone())).collect());
    }

    fn pop(&mut self) {
        self.locals.pop();
    }
}

/// Checks a `use`/`<-` block's newly bound names against the function's
/// arguments, this file's own top-level symbols, and every still-open
/// `use`/`<-` scope, raising [`CrossRefError::CollidingIdentifier`] for each
/// collision. Grounded on the reference implementation's variable-collision
/// check (`examples/original_source/lang/typing/checker.py:521-540`), which
/// checks exactly these three name sets before binding a local.
fn check_local_collisions(
    identifiables: &Identifiables,
    file: &Path,
    scope: &Scope,
    names: &[String],
    position: &Position,
    errors: &mut Vec<CrossRefError>,
) {
    for name in names {
        if let Some(arg) = scope.find_argument(name) {
            errors.push(CrossRefError::colliding(
                (&arg.position, &format!("argument {name}")),
                (position, &format!("local variable {name}")),
            ));
            continue;
        }

        if let Some(earlier) = scope.find_local_position(name) {
            errors.push(CrossRefError::colliding(
                (earlier, &format!("local variable {name}")),
                (position, &format!("local variable {name}")),
            ));
            continue;
        }

        let key = SymbolKey::new(file.to_path_buf(), name.clone());
        if let Some(existing_id) = identifiables.lookup(&key) {
            let existing = identifiables.get(existing_id);
            errors.push(CrossRefError::colliding(
                (existing.position(), &existing.describe()),
                (position, &format!("local variable {name}")),
            ));
        }
    }
}

pub(super) fn resolve_function_bodies(
    functions: &[(SymbolId, PathBuf, FunctionDecl)],
    builtins_path: &Path,
    identifiables: &mut Identifiables,
    errors: &mut Vec<CrossRefError>,
) {
    for (id, file, decl) in functions {
        let Some(body) = &decl.body else { continue };

        let args = match identifiables.get(*id) {
            Identifiable::Function(f) => f.args.resolved().cloned().unwrap_or_default(),
            _ => continue,
        };

        let mut scope = Scope::new(&args, &decl.generic_params);
        let resolved = resolve_body(identifiables, builtins_path, file, &mut scope, body, errors);

        if let Identifiable::Function(symbol) = identifiables.get_mut(*id) {
            symbol.body = Unresolved::Resolved(resolved);
        }
    }
}

fn resolve_body(
    identifiables: &mut Identifiables,
    builtins_path: &Path,
    file: &Path,
    scope: &mut Scope,
    body: &FunctionBody,
    errors: &mut Vec<CrossRefError>,
) -> ResolvedBody {
    let mut items = Vec::with_capacity(body.items.len());
    for item in &body.items {
        if let Some(resolved) = resolve_body_item(identifiables, builtins_path, file, scope, item, errors) {
            items.push(resolved);
        }
    }
    ResolvedBody::new(items)
}

fn resolve_body_item(
    identifiables: &mut Identifiables,
    builtins_path: &Path,
    file: &Path,
    scope: &mut Scope,
    item: &BodyItem,
    errors: &mut Vec<CrossRefError>,
) -> Option<ResolvedItem> {
    Some(match item {
        BodyItem::IntegerLiteral { value, position } => ResolvedItem::IntegerLiteral {
            value: *value,
            position: position.clone(),
        },
        BodyItem::StringLiteral { value, position } => ResolvedItem::StringLiteral {
            value: value.clone(),
            position: position.clone(),
        },
        BodyItem::BooleanLiteral { value, position } => ResolvedItem::BooleanLiteral {
            value: *value,
            position: position.clone(),
        },
        BodyItem::Call(call) => {
            ResolvedItem::Call(resolve_call(identifiables, builtins_path, file, scope, call, errors)?)
        }
        BodyItem::GetFunctionPointer { name, position } => {
            let target = lookup_identifier(identifiables, builtins_path, file, name);
            match target {
                Some(target) if identifiables.get(target).as_function().is_some() => {
                    ResolvedItem::GetFunctionPointer {
                        target,
                        position: position.clone(),
                    }
                }
                _ => {
                    errors.push(CrossRefError::UnknownIdentifier {
                        position: position.clone(),
                        name: name.clone(),
                    });
                    return None;
                }
            }
        }
        BodyItem::FieldQuery { field, position } => ResolvedItem::FieldQuery {
            field: field.clone(),
            position: position.clone(),
        },
        BodyItem::FieldUpdate {
            field,
            body,
            position,
        } => ResolvedItem::FieldUpdate {
            field: field.clone(),
            body: resolve_body(identifiables, builtins_path, file, scope, body, errors),
            position: position.clone(),
        },
        BodyItem::Return { position } => ResolvedItem::Return {
            position: position.clone(),
        },
        BodyItem::IndirectCall { position } => ResolvedItem::IndirectCall {
            position: position.clone(),
        },
        BodyItem::If {
            condition,
            if_body,
            else_body,
            position,
        } => ResolvedItem::If {
            condition: resolve_body(identifiables, builtins_path, file, scope, condition, errors),
            if_body: resolve_body(identifiables, builtins_path, file, scope, if_body, errors),
            else_body: else_body
                .as_ref()
                .map(|b| resolve_body(identifiables, builtins_path, file, scope, b, errors)),
            position: position.clone(),
        },
        BodyItem::While {
            condition,
            body,
            position,
        } => ResolvedItem::While {
            condition: resolve_body(identifiables, builtins_path, file, scope, condition, errors),
            body: resolve_body(identifiables, builtins_path, file, scope, body, errors),
            position: position.clone(),
        },
        BodyItem::Foreach { body, position } => ResolvedItem::Foreach {
            body: resolve_body(identifiables, builtins_path, file, scope, body, errors),
            position: position.clone(),
        },
        BodyItem::Match {
            cases,
            default,
            position,
        } => {
            let mut resolved_cases = Vec::with_capacity(cases.len());
            for case in cases {
                let Some(enum_id) = lookup_identifier(identifiables, builtins_path, file, &case.enum_name)
                else {
                    errors.push(CrossRefError::UnknownIdentifier {
                        position: case.position.clone(),
                        name: case.enum_name.clone(),
                    });
                    continue;
                };
                let variant_exists = match identifiables.get(enum_id) {
                    Identifiable::Type(t) => match &t.kind {
                        TypeKind::Enum { variants } => {
                            variants.iter().any(|(name, _)| name == &case.variant)
                        }
                        _ => {
                            errors.push(CrossRefError::InvalidEnumType {
                                position: case.position.clone(),
                                description: identifiables.get(enum_id).describe(),
                            });
                            continue;
                        }
                    },
                    other => {
                        errors.push(CrossRefError::InvalidEnumType {
                            position: case.position.clone(),
                            description: other.describe(),
                        });
                        continue;
                    }
                };
                if !variant_exists {
                    errors.push(CrossRefError::InvalidEnumVariant {
                        position: case.position.clone(),
                        enum_name: case.enum_name.clone(),
                        variant_name: case.variant.clone(),
                    });
                    continue;
                }

                // Binding-count-vs-variant-arity is a stack-shape concern,
                // checked by the type checker rather than here.
                scope.push(case.bindings.clone(), &case.position);
                let body = resolve_body(identifiables, builtins_path, file, scope, &case.body, errors);
                scope.pop();

                resolved_cases.push(ResolvedMatchCase {
                    enum_type: enum_id,
                    variant: case.variant.clone(),
                    bindings: case.bindings.clone(),
                    body,
                    position: case.position.clone(),
                });
            }
            ResolvedItem::Match {
                cases: resolved_cases,
                default: default
                    .as_ref()
                    .map(|b| resolve_body(identifiables, builtins_path, file, scope, b, errors)),
                position: position.clone(),
            }
        }
        BodyItem::Use {
            variables,
            body,
            position,
        } => {
            check_local_collisions(identifiables, file, scope, variables, position, errors);
            scope.push(variables.clone(), position);
            let resolved = resolve_body(identifiables, builtins_path, file, scope, body, errors);
            scope.pop();
            ResolvedItem::Use {
                variables: variables.clone(),
                body: resolved,
                position: position.clone(),
            }
        }
        BodyItem::Assign {
            variables,
            body,
            position,
        } => {
            // A `<-` target may legitimately already be bound (it is a
            // reassignment of an existing local, not a fresh declaration);
            // only names that introduce a genuinely new binding are checked.
            let fresh: Vec<String> = variables
                .iter()
                .filter(|v| scope.find_argument(v).is_none() && !scope.find_local(v))
                .cloned()
                .collect();
            check_local_collisions(identifiables, file, scope, &fresh, position, errors);
            scope.push(variables.clone(), position);
            let resolved = resolve_body(identifiables, builtins_path, file, scope, body, errors);
            scope.pop();
            ResolvedItem::Assign {
                variables: variables.clone(),
                body: resolved,
                position: position.clone(),
            }
        }
    })
}

fn resolve_call(
    identifiables: &mut Identifiables,
    builtins_path: &Path,
    file: &Path,
    scope: &mut Scope,
    call: &FunctionCall,
    errors: &mut Vec<CrossRefError>,
) -> Option<ResolvedCall> {
    if let Some(qualifier) = &call.qualifier {
        // `Enum:variant` or `Type:member_fn` — try the enum constructor
        // reading first, since it needs no symbol-table entry of its own.
        if let Some(enum_id) = lookup_identifier(identifiables, builtins_path, file, qualifier) {
            if let Identifiable::Type(t) = identifiables.get(enum_id) {
                if let TypeKind::Enum { variants } = &t.kind {
                    if variants.iter().any(|(name, _)| name == &call.name) {
                        return Some(ResolvedCall {
                            kind: IdentifierKind::CallEnumConstructor(enum_id, call.name.clone()),
                            position: call.position.clone(),
                        });
                    }
                }
            }
        }

        let key = format!("{qualifier}:{}", call.name);
        return match lookup_identifier(identifiables, builtins_path, file, &key) {
            Some(found) => Some(ResolvedCall {
                kind: IdentifierKind::CallFunction(found),
                position: call.position.clone(),
            }),
            None => {
                errors.push(CrossRefError::UnknownIdentifier {
                    position: call.position.clone(),
                    name: key,
                });
                None
            }
        };
    }

    if scope.find_local(&call.name) {
        return Some(ResolvedCall {
            kind: IdentifierKind::CallLocalVariable(call.name.clone()),
            position: call.position.clone(),
        });
    }
    if scope.find_argument(&call.name).is_some() {
        return Some(ResolvedCall {
            kind: IdentifierKind::CallArgument(call.name.clone()),
            position: call.position.clone(),
        });
    }

    let Some(found) = lookup_identifier(identifiables, builtins_path, file, &call.name) else {
        errors.push(CrossRefError::UnknownIdentifier {
            position: call.position.clone(),
            name: call.name.clone(),
        });
        return None;
    };

    match identifiables.get(found) {
        Identifiable::Function(_) => Some(ResolvedCall {
            kind: IdentifierKind::CallFunction(found),
            position: call.position.clone(),
        }),
        Identifiable::Type(_) => {
            let mut params = Vec::with_capacity(call.type_params.len());
            for p in &call.type_params {
                params.push(resolve_type(
                    identifiables,
                    builtins_path,
                    file,
                    scope.generics,
                    p,
                    errors,
                )?);
            }
            Some(ResolvedCall {
                kind: IdentifierKind::CallType(found, params),
                position: call.position.clone(),
            })
        }
        Identifiable::Import(_) => unreachable!("lookup_identifier never returns an unresolved import"),
    }
}
