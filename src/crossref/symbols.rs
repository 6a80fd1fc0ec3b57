//! Program-wide symbol table.
//!
//! Resolved identifiers are referenced from many places at once (call
//! sites, import targets, member-function lookups on a struct), which in a
//! naive tree of owned nodes would force reference cycles (a struct
//! references a member function which takes the struct as its first
//! argument). Definitions instead live in one arena, keyed by a stable
//! integer id; everything else holds ids.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::ast::ReturnTypes as AstReturnTypes;
use crate::position::Position;

use super::resolved_body::ResolvedBody;
use super::variable_type::{ReturnTypeSet, Unresolved, VariableType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

pub type TypeId = SymbolId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    pub file: PathBuf,
    pub name: String,
}

impl SymbolKey {
    pub fn new(file: PathBuf, name: impl Into<String>) -> Self {
        Self {
            file,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Struct {
        type_params: Vec<String>,
        fields: Vec<(String, Unresolved<VariableType>)>,
    },
    Enum {
        variants: Vec<(String, Unresolved<Vec<VariableType>>)>,
    },
    /// A builtin primitive such as `int`, `str`, `vec`; declared with
    /// `builtin struct Name[params] {}` (no fields) in the builtins file.
    Builtin { type_params: Vec<String> },
}

impl TypeKind {
    pub fn type_param_count(&self) -> usize {
        match self {
            TypeKind::Struct { type_params, .. } => type_params.len(),
            TypeKind::Enum { .. } => 0,
            TypeKind::Builtin { type_params } => type_params.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    pub name: String,
    pub kind: TypeKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionArgument {
    pub name: String,
    pub type_: VariableType,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub struct_name: Option<String>,
    pub name: String,
    pub generic_params: Vec<String>,
    pub args: Unresolved<Vec<FunctionArgument>>,
    pub return_types: Unresolved<ReturnTypeSet>,
    pub body: Unresolved<ResolvedBody>,
    pub is_builtin: bool,
    pub position: Position,
}

impl FunctionSymbol {
    pub fn symbol_name(&self) -> String {
        match &self.struct_name {
            Some(owner) => format!("{owner}:{name}", name = self.name),
            None => self.name.clone(),
        }
    }

    /// Converts a parsed `never`/list return annotation into the AST shape
    /// the signature-resolution error messages want. Only used before the
    /// return types are resolved.
    pub fn declared_return_arity(ast_return_types: &AstReturnTypes) -> Option<usize> {
        match ast_return_types {
            AstReturnTypes::Never => None,
            AstReturnTypes::Types(types) => Some(types.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSymbol {
    pub name: String,
    pub source_file: PathBuf,
    pub source_name: String,
    pub position: Position,
    /// Filled in cross-reference phase B.1. Never points at another
    /// `Import`: the resolver follows import chains until it reaches a
    /// `Type` or `Function`.
    pub target: Unresolved<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifiable {
    Type(TypeSymbol),
    Function(FunctionSymbol),
    Import(ImportSymbol),
}

impl Identifiable {
    pub fn position(&self) -> &Position {
        match self {
            Identifiable::Type(t) => &t.position,
            Identifiable::Function(f) => &f.position,
            Identifiable::Import(i) => &i.position,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Identifiable::Type(t) => format!("type {}", t.name),
            Identifiable::Function(f) => format!("function {}", f.symbol_name()),
            Identifiable::Import(i) => format!("imported identifier {}", i.name),
        }
    }

    pub fn as_type(&self) -> Option<&TypeSymbol> {
        match self {
            Identifiable::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match self {
            Identifiable::Function(f) => Some(f),
            _ => None,
        }
    }
}

/// Owns every declaration in the program and the `(file, name) ->
/// SymbolId` index into it. Insertion order within a file matches source
/// declaration order, which later stages rely on for deterministic
/// diagnostics.
#[derive(Debug, Default)]
pub struct Identifiables {
    arena: Vec<Identifiable>,
    by_key: HashMap<SymbolKey, SymbolId>,
}

impl Identifiables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: Identifiable) -> SymbolId {
        let id = SymbolId(self.arena.len());
        self.arena.push(item);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Identifiable {
        &self.arena[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Identifiable {
        &mut self.arena[id.0]
    }

    pub fn lookup(&self, key: &SymbolKey) -> Option<SymbolId> {
        self.by_key.get(key).copied()
    }

    pub fn bind(&mut self, key: SymbolKey, id: SymbolId) {
        self.by_key.insert(key, id);
    }

    pub fn is_bound(&self, key: &SymbolKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Identifiable)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(idx, item)| (SymbolId(idx), item))
    }

    /// Follows an `Import` to the `Type`/`Function` it ultimately targets.
    /// Returns the id unchanged if it is not an import. Per the program
    /// invariant an `Import`'s target is never itself an `Import`, so this
    /// never recurses more than once.
    pub fn resolve_through_imports(&self, id: SymbolId) -> Option<SymbolId> {
        match self.get(id) {
            Identifiable::Import(import) => import.target.resolved().copied(),
            _ => Some(id),
        }
    }
}
