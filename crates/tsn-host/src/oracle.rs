//! Collaborator traits consumed by the schema evaluator.
//!
//! These are the decoupling seam between the engine and whatever front end
//! produced the syntax tree and type information. A host implements all
//! three and hands them to the engine bundled in a [`Host`].

use crate::arena::NodeArena;
use crate::node::NodeIndex;
use crate::types::{IndexInfo, PropertyInfo, Signature, TypeData, TypeId};
use serde::{Deserialize, Serialize};

/// Identifier of a declared symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Result of resolving a reference node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSymbol {
    pub symbol: SymbolId,
    pub declaration: NodeIndex,
}

// =============================================================================
// TypeOracle
// =============================================================================

/// Type-checking oracle: nominal type information for nodes and symbols.
///
/// Only [`lookup`](Self::lookup), [`type_of_node`](Self::type_of_node) and
/// [`type_to_string`](Self::type_to_string) are required; the structural
/// queries default to reading the `TypeData` behind an id.
pub trait TypeOracle {
    fn lookup(&self, ty: TypeId) -> Option<&TypeData>;

    fn type_of_node(&self, node: NodeIndex) -> Option<TypeId>;

    fn type_to_string(&self, ty: TypeId) -> String;

    fn type_of_symbol(&self, _symbol: SymbolId) -> Option<TypeId> {
        None
    }

    /// Own properties, flattened through intersections.
    fn properties_of_type(&self, ty: TypeId) -> Vec<PropertyInfo> {
        match self.lookup(ty) {
            Some(TypeData::Object(shape)) => shape.properties.clone(),
            Some(TypeData::Application { body, .. }) => self.properties_of_type(*body),
            Some(TypeData::Intersection(members)) => members
                .iter()
                .flat_map(|&member| self.properties_of_type(member))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn index_infos_of_type(&self, ty: TypeId) -> Vec<IndexInfo> {
        match self.lookup(ty) {
            Some(TypeData::Object(shape)) => shape.index_infos.clone(),
            Some(TypeData::Application { body, .. }) => self.index_infos_of_type(*body),
            _ => Vec::new(),
        }
    }

    fn call_signatures(&self, ty: TypeId) -> Vec<Signature> {
        match self.lookup(ty) {
            Some(TypeData::Object(shape)) => shape.call_signatures.clone(),
            Some(TypeData::Application { body, .. }) => self.call_signatures(*body),
            _ => Vec::new(),
        }
    }

    /// Signature chosen by overload resolution for a call node.
    fn resolved_signature(&self, _call: NodeIndex) -> Option<Signature> {
        None
    }

    /// Type whose members are visible on `ty` (constraints for type parameters).
    fn apparent_type(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            Some(TypeData::TypeParameter { constraint, .. }) => {
                constraint.map_or(TypeId::UNKNOWN, |c| self.apparent_type(c))
            }
            _ => ty,
        }
    }

    fn is_array_type(&self, ty: TypeId) -> bool {
        matches!(self.lookup(ty), Some(TypeData::Array(_)))
    }

    fn is_tuple_type(&self, ty: TypeId) -> bool {
        matches!(self.lookup(ty), Some(TypeData::Tuple(_)))
    }
}

// =============================================================================
// DeclarationResolver / SymbolTable
// =============================================================================

/// Maps reference nodes to the symbol and declaration they denote.
pub trait DeclarationResolver {
    fn resolve(&self, reference: NodeIndex) -> Option<ResolvedSymbol>;

    fn symbol_of_declaration(&self, declaration: NodeIndex) -> Option<SymbolId>;

    fn declaration_of_symbol(&self, symbol: SymbolId) -> Option<NodeIndex>;
}

/// Symbol → syntactic references, used to enumerate call sites.
pub trait SymbolTable {
    /// Every reference node that resolves to `symbol`, in source order.
    fn references(&self, symbol: SymbolId) -> &[NodeIndex];

    /// Look up a symbol by file name and dotted display path (`outer.inner`).
    fn lookup(&self, file: &str, path: &str) -> Option<SymbolId>;
}

// =============================================================================
// Host
// =============================================================================

/// Bundle of the syntax tree and the three collaborators.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    pub arena: &'a NodeArena,
    pub oracle: &'a dyn TypeOracle,
    pub resolver: &'a dyn DeclarationResolver,
    pub symbols: &'a dyn SymbolTable,
}

impl<'a> Host<'a> {
    pub fn new(
        arena: &'a NodeArena,
        oracle: &'a dyn TypeOracle,
        resolver: &'a dyn DeclarationResolver,
        symbols: &'a dyn SymbolTable,
    ) -> Self {
        Self {
            arena,
            oracle,
            resolver,
            symbols,
        }
    }
}
