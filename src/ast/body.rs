//! Function body AST: the sequence of stack operations, control-flow
//! blocks and variable bindings that make up a function's implementation.

use super::types::TypeOrFnPtr;
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBody {
    pub items: Vec<BodyItem>,
}

impl FunctionBody {
    pub fn new(items: Vec<BodyItem>) -> Self {
        Self { items }
    }
}

/// `IDENT (":" IDENT)? ("[" TypeList "]")?`
///
/// Covers a bare call, a generic call (`name[T, ...]`), a member call
/// (`Type:name`) and a generic member call uniformly: the grammar does not
/// distinguish them until cross-referencing resolves the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub qualifier: Option<String>,
    pub name: String,
    pub type_params: Vec<TypeOrFnPtr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCase {
    pub enum_name: String,
    pub variant: String,
    pub bindings: Vec<String>,
    pub body: FunctionBody,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
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
    Call(FunctionCall),
    /// `"name" fn` — push a function pointer to the named function without
    /// calling it.
    GetFunctionPointer {
        name: String,
        position: Position,
    },
    /// `"field" ?`
    FieldQuery {
        field: String,
        position: Position,
    },
    /// `"field" { body } !`
    FieldUpdate {
        field: String,
        body: FunctionBody,
        position: Position,
    },
    Return {
        position: Position,
    },
    /// The `call` keyword: pop a function pointer and invoke it.
    IndirectCall {
        position: Position,
    },
    If {
        condition: FunctionBody,
        if_body: FunctionBody,
        else_body: Option<FunctionBody>,
        position: Position,
    },
    While {
        condition: FunctionBody,
        body: FunctionBody,
        position: Position,
    },
    Foreach {
        body: FunctionBody,
        position: Position,
    },
    Match {
        cases: Vec<MatchCase>,
        default: Option<FunctionBody>,
        position: Position,
    },
    /// `"use" IDENT ("," IDENT)* "{" body "}"`
    Use {
        variables: Vec<String>,
        body: FunctionBody,
        position: Position,
    },
    /// `IDENT ("," IDENT)* "<-" "{" body "}"`
    Assign {
        variables: Vec<String>,
        body: FunctionBody,
        position: Position,
    },
}

impl BodyItem {
    pub fn position(&self) -> &Position {
        match self {
            BodyItem::IntegerLiteral { position, .. }
            | BodyItem::StringLiteral { position, .. }
            | BodyItem::BooleanLiteral { position, .. }
            | BodyItem::GetFunctionPointer { position, .. }
            | BodyItem::FieldQuery { position, .. }
            | BodyItem::FieldUpdate { position, .. }
            | BodyItem::Return { position }
            | BodyItem::IndirectCall { position }
            | BodyItem::If { position, .. }
            | BodyItem::While { position, .. }
            | BodyItem::Foreach { position, .. }
            | BodyItem::Match { position, .. }
            | BodyItem::Use { position, .. }
            | BodyItem::Assign { position, .. } => position,
            BodyItem::Call(call) => &call.position,
        }
    }
}
