//! Host model for the schema evaluation engine.
//!
//! The engine in `tsn-schema` never parses or type-checks source code itself.
//! It consumes three collaborators through the traits in [`oracle`]:
//!
//! - **`TypeOracle`**: nominal types of nodes and symbols, properties, index
//!   infos, call signatures, display strings
//! - **`DeclarationResolver`**: reference node → symbol + declaration
//! - **`SymbolTable`**: symbol → every syntactic reference to it
//!
//! This crate defines those seams together with the data they speak in
//! (`NodeArena`/`NodeIndex` for syntax, `TypeData`/`TypeId` for types), and
//! ships [`HostProgram`], an in-memory implementation built with
//! [`ProgramBuilder`] and bound by a small lexical-scope binder.

pub mod arena;
mod binder;
pub mod node;
pub mod oracle;
pub mod program;
pub mod types;

pub use arena::NodeArena;
pub use binder::{BinderResult, SymbolInfo};
pub use node::{
    BinaryOperator, FunctionData, FunctionFlags, Node, NodeData, NodeIndex, TemplateSpan,
    UnaryOperator, VariableKind,
};
pub use oracle::{DeclarationResolver, Host, ResolvedSymbol, SymbolId, SymbolTable, TypeOracle};
pub use program::{HostProgram, ProgramBuilder};
pub use types::{
    IndexInfo, IntrinsicKind, LiteralValue, ObjectShape, ParamInfo, PropertyInfo, Signature,
    TemplateTypeSpan, TupleElement, TypeData, TypeId, TypeTable,
};
