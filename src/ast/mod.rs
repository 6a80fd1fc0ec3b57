//! Per-file abstract syntax tree produced by the parser.
//!
//! Nothing here is mutated after construction; the cross-referencer builds
//! a parallel, resolved tree rather than editing these nodes in place.

mod body;
mod types;

pub use body::{BodyItem, FunctionBody, FunctionCall, MatchCase};
pub use types::{FunctionPointerTypeLiteral, ReturnTypes, TypeLiteral, TypeOrFnPtr};

use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub original: String,
    pub imported: String,
    pub position: Position,
}

/// `"from" STRING "import" ImportItems`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub source: String,
    pub items: Vec<ImportItem>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub name: String,
    pub type_: TypeOrFnPtr,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<StructField>,
    pub is_builtin: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: String,
    pub data: Vec<TypeOrFnPtr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: String,
    pub type_: TypeOrFnPtr,
    pub position: Position,
}

/// `["builtin"] "fn" FnName ("args" ArgList)? ("return" ...)? Body?`
///
/// `struct_name` is `Some` for a member function (`FnName := FlatTypeLit
/// ":" IDENT`); `body` is `None` for a `builtin` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub struct_name: Option<String>,
    pub name: String,
    pub generic_params: Vec<String>,
    pub args: Vec<Arg>,
    pub return_types: ReturnTypes,
    pub body: Option<FunctionBody>,
    pub is_builtin: bool,
    pub position: Position,
}

impl FunctionDecl {
    /// The symbol-table key for this function: `name` for a free function,
    /// `Type:name` for a member function.
    pub fn symbol_name(&self) -> String {
        match &self.struct_name {
            Some(owner) => format!("{owner}:{name}", name = self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevelItem {
    Import(Import),
    Struct(StructDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
}

/// `SourceFile := (Import | Struct | Enum | Function)*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub items: Vec<TopLevelItem>,
}

impl SourceFile {
    pub fn new(items: Vec<TopLevelItem>) -> Self {
        Self { items }
    }

    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.items.iter().filter_map(|i| match i {
            TopLevelItem::Import(import) => Some(import),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.items.iter().filter_map(|i| match i {
            TopLevelItem::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDecl> {
        self.items.iter().filter_map(|i| match i {
            TopLevelItem::Enum(e) => Some(e),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|i| match i {
            TopLevelItem::Function(f) => Some(f),
            _ => None,
        })
    }
}
