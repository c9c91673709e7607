//! Lexical-scope binder for the in-memory host.
//!
//! Declares functions, variables and parameters per container, then resolves
//! every identifier in value position against the scope chain. The result
//! backs both `DeclarationResolver` and `SymbolTable` for `HostProgram`.

use crate::arena::NodeArena;
use crate::node::{NodeData, NodeIndex};
use crate::oracle::SymbolId;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

#[derive(Clone, Debug)]
pub struct SymbolInfo {
    pub name: String,
    pub declaration: NodeIndex,
    /// Dotted path of enclosing named functions plus the symbol name.
    pub path: String,
    pub file: String,
}

#[derive(Clone, Debug, Default)]
pub struct BinderResult {
    pub symbols: Vec<SymbolInfo>,
    /// Reference identifier → symbol.
    pub node_symbols: FxHashMap<NodeIndex, SymbolId>,
    /// Declaration node → symbol.
    pub declaration_symbols: FxHashMap<NodeIndex, SymbolId>,
    pub references: FxHashMap<SymbolId, Vec<NodeIndex>>,
    pub paths: FxHashMap<(String, String), SymbolId>,
}

impl BinderResult {
    pub fn symbol(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(id.0 as usize)
    }
}

pub(crate) struct BinderState<'a> {
    arena: &'a NodeArena,
    scopes: Vec<FxHashMap<String, SymbolId>>,
    path: Vec<String>,
    file: String,
    result: BinderResult,
}

impl<'a> BinderState<'a> {
    pub(crate) fn new(arena: &'a NodeArena) -> Self {
        Self {
            arena,
            scopes: Vec::new(),
            path: Vec::new(),
            file: String::new(),
            result: BinderResult::default(),
        }
    }

    pub(crate) fn bind_source_files(mut self, files: &[NodeIndex]) -> BinderResult {
        for &file in files {
            self.bind_node(file);
        }
        debug!(
            symbols = self.result.symbols.len(),
            references = self.result.node_symbols.len(),
            "binding complete"
        );
        self.result
    }

    fn declare_symbol(&mut self, name: &str, declaration: NodeIndex) -> SymbolId {
        let id = SymbolId(self.result.symbols.len() as u32);
        let mut path = self.path.join(".");
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(name);
        trace!(name, %declaration, path = %path, "declare symbol");
        self.result
            .paths
            .entry((self.file.clone(), path.clone()))
            .or_insert(id);
        self.result.symbols.push(SymbolInfo {
            name: name.to_string(),
            declaration,
            path,
            file: self.file.clone(),
        });
        self.result.declaration_symbols.insert(declaration, id);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
        id
    }

    fn resolve_name(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Declare function and variable names of a statement list up front so
    /// that references before the declaration resolve (hoisting).
    fn hoist(&mut self, statements: &[NodeIndex]) {
        let arena = self.arena;
        for &stmt in statements {
            match arena.data(stmt) {
                Some(NodeData::FunctionDeclaration(func)) => {
                    if let Some(name) = func.name.and_then(|n| arena.identifier_text(n)) {
                        self.declare_symbol(name, stmt);
                    }
                }
                Some(NodeData::VariableStatement { declarations }) => {
                    for &decl in declarations {
                        if let Some(name) = arena.declaration_name(decl) {
                            self.declare_symbol(name, decl);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn bind_statements(&mut self, statements: &[NodeIndex]) {
        self.hoist(statements);
        for &stmt in statements {
            self.bind_node(stmt);
        }
    }

    fn bind_function(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(func) = arena.function_data(idx) else {
            return;
        };
        let pushed_path = match arena.data(idx) {
            Some(NodeData::FunctionDeclaration(_)) | Some(NodeData::FunctionExpression(_)) => func
                .name
                .and_then(|n| arena.identifier_text(n))
                .map(str::to_string),
            _ => None,
        };
        if let Some(name) = &pushed_path {
            self.path.push(name.clone());
        }
        self.scopes.push(FxHashMap::default());
        for &param in &func.parameters {
            if let Some(name) = arena.declaration_name(param) {
                self.declare_symbol(name, param);
            }
            if let Some(NodeData::Parameter {
                initializer: Some(init),
                ..
            }) = arena.data(param)
            {
                self.bind_node(*init);
            }
        }
        if let Some(body) = func.body {
            match arena.data(body) {
                Some(NodeData::Block { statements }) => self.bind_statements(statements),
                _ => self.bind_node(body),
            }
        }
        self.scopes.pop();
        if pushed_path.is_some() {
            self.path.pop();
        }
    }

    fn bind_node(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(data) = arena.data(idx) else {
            return;
        };
        match data {
            NodeData::SourceFile {
                file_name,
                statements,
            } => {
                self.file = file_name.clone();
                self.scopes.push(FxHashMap::default());
                self.bind_statements(statements);
                self.scopes.pop();
            }
            NodeData::Block { statements } => {
                self.scopes.push(FxHashMap::default());
                self.bind_statements(statements);
                self.scopes.pop();
            }
            NodeData::VariableDeclaration { initializer, .. } => {
                if let Some(init) = *initializer {
                    self.bind_node(init);
                }
            }
            NodeData::FunctionDeclaration(_)
            | NodeData::FunctionExpression(_)
            | NodeData::ArrowFunction(_)
            | NodeData::MethodDeclaration(_) => self.bind_function(idx),
            NodeData::Identifier { text } => {
                if let Some(symbol) = self.resolve_name(text) {
                    trace!(name = %text, reference = %idx, "resolved reference");
                    self.result.node_symbols.insert(idx, symbol);
                    self.result.references.entry(symbol).or_default().push(idx);
                }
            }
            NodeData::PropertyAccess { expression, .. } => self.bind_node(*expression),
            NodeData::PropertyAssignment { name, initializer } => {
                if matches!(
                    arena.data(*name),
                    Some(NodeData::ComputedPropertyName { .. })
                ) {
                    self.bind_node(*name);
                }
                self.bind_node(*initializer);
            }
            _ => {
                for child in arena.children(idx) {
                    self.bind_node(child);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/binder_tests.rs"]
mod binder_tests;
