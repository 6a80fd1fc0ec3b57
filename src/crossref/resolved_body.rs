//! The resolved counterpart of [`crate::ast::FunctionBody`]: every
//! identifier now carries a discriminated `kind` pointing at its
//! definition, and every type literal has become a [`VariableType`].

use crate::position::Position;

use super::symbols::SymbolId;
use super::variable_type::VariableType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierKind {
    CallFunction(SymbolId),
    /// A bare type name used as a zero-value constructor, with its
    /// resolved type parameters.
    CallType(SymbolId, Vec<VariableType>),
    CallArgument(String),
    CallLocalVariable(String),
    /// `Enum:variant`, resolved to the owning enum type and the variant's
    /// name.
    CallEnumConstructor(SymbolId, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCall {
    pub kind: IdentifierKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMatchCase {
    pub enum_type: SymbolId,
    pub variant: String,
    pub bindings: Vec<String>,
    pub body: ResolvedBody,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedItem {
    IntegerLiteral {
        value: i64,
        position: Position,
    },
    StringLiteral {
        value: String,
        position: Position,
    },
    BooleanLiteral {
        value: bool,
        position: Position,
    },
    Call(ResolvedCall),
    GetFunctionPointer {
        target: SymbolId,
        position: Position,
    },
    FieldQuery {
        field: String,
        position: Position,
    },
    FieldUpdate {
        field: String,
        body: ResolvedBody,
        position: Position,
    },
    Return {
        position: Position,
    },
    IndirectCall {
        position: Position,
    },
    If {
        condition: ResolvedBody,
        if_body: ResolvedBody,
        else_body: Option<ResolvedBody>,
        position: Position,
    },
    While {
        condition: ResolvedBody,
        body: ResolvedBody,
        position: Position,
    },
    Foreach {
        body: ResolvedBody,
        position: Position,
    },
    Match {
        cases: Vec<ResolvedMatchCase>,
        default: Option<ResolvedBody>,
        position: Position,
    },
    Use {
        variables: Vec<String>,
        body: ResolvedBody,
        position: Position,
    },
    Assign {
        variables: Vec<String>,
        body: ResolvedBody,
        position: Position,
    },
}

impl ResolvedItem {
    pub fn position(&self) -> &Position {
        match self {
            ResolvedItem::IntegerLiteral { position, .. }
            | ResolvedItem::StringLiteral { position, .. }
            | ResolvedItem::BooleanLiteral { position, .. }
            | ResolvedItem::GetFunctionPointer { position, .. }
            | ResolvedItem::FieldQuery { position, .. }
            | ResolvedItem::FieldUpdate { position, .. }
            | ResolvedItem::Return { position }
            | ResolvedItem::IndirectCall { position }
            | ResolvedItem::If { position, .. }
            | ResolvedItem::While { position, .. }
            | ResolvedItem::Foreach { position, .. }
            | ResolvedItem::Match { position, .. }
            | ResolvedItem::Use { position, .. }
            | ResolvedItem::Assign { position, .. } => position,
            ResolvedItem::Call(call) => &call.position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedBody {
    pub items: Vec<ResolvedItem>,
}

impl ResolvedBody {
    pub fn new(items: Vec<ResolvedItem>) -> Self {
        Self { items }
    }
}
