//! Code-generation consumer contract.
//!
//! No backend lives in this crate. [`CheckedProgram`] is the handoff point:
//! a downstream emitter walks `identifiables`, starting from `entry_point`
//! (the `main` function's id), to produce whatever target it targets. The
//! type checker guarantees every function reachable this way has a fully
//! resolved signature and body, and that the program as a whole is free of
//! diagnostics.

use crate::crossref::{Identifiables, SymbolId};

pub struct CheckedProgram {
    pub identifiables: Identifiables,
    pub entry_point: SymbolId,
}
