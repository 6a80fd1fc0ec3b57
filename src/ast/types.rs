//! Type literals as written in source, before cross-referencing resolves
//! them to [`crate::crossref::VariableType`]s.

use crate::position::Position;

/// `["const"] IDENT ("[" TypeList "]")?`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLiteral {
    pub name: String,
    pub params: Vec<TypeOrFnPtr>,
    pub is_const: bool,
    pub position: Position,
}

/// `"fn" "[" TypeList? "]" "[" ("never" | TypeList)? "]"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPointerTypeLiteral {
    pub arg_types: Vec<TypeOrFnPtr>,
    pub return_types: ReturnTypes,
    pub position: Position,
}

/// A parsed type, either a named (possibly generic) type or a function
/// pointer type. Corresponds to the grammar's `TypeOrFnPtr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrFnPtr {
    Named(TypeLiteral),
    FunctionPointer(FunctionPointerTypeLiteral),
}

impl TypeOrFnPtr {
    pub fn position(&self) -> &Position {
        match self {
            TypeOrFnPtr::Named(t) => &t.position,
            TypeOrFnPtr::FunctionPointer(t) => &t.position,
        }
    }
}

/// A function or member function's declared return types: either an
/// ordinary list, or the distinguished `never` marker meaning the function
/// does not return control to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnTypes {
    Never,
    Types(Vec<TypeOrFnPtr>),
}
