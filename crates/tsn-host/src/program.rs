//! In-memory reference host.
//!
//! `ProgramBuilder` assembles a syntax tree bottom-up, records node types,
//! and [`finish`](ProgramBuilder::finish)es into a bound `HostProgram`, which
//! implements every collaborator trait the engine consumes.
//!
//! ```ignore
//! let mut b = ProgramBuilder::new();
//! let a = b.param("a");
//! let (x, one) = (b.ident("a"), b.num(1.0));
//! let body = b.binary(BinaryOperator::Add, x, one);
//! let ret = b.ret(Some(body));
//! let f = b.function_decl("inc", vec![a], vec![ret]);
//! b.source_file("main.ts", vec![f]);
//! let program = b.finish();
//! let host = program.host();
//! ```

use crate::arena::NodeArena;
use crate::binder::{BinderResult, BinderState};
use crate::node::{
    BinaryOperator, FunctionData, FunctionFlags, NodeData, NodeIndex, TemplateSpan,
    UnaryOperator, VariableKind,
};
use crate::oracle::{DeclarationResolver, Host, ResolvedSymbol, SymbolId, SymbolTable, TypeOracle};
use crate::types::{Signature, TypeData, TypeId, TypeTable};
use rustc_hash::FxHashMap;
use tsn_common::Span;

#[derive(Default)]
pub struct ProgramBuilder {
    arena: NodeArena,
    types: TypeTable,
    node_types: FxHashMap<NodeIndex, TypeId>,
    signatures: FxHashMap<NodeIndex, Signature>,
    files: Vec<NodeIndex>,
    pos: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type storage for building types to attach with [`set_type`](Self::set_type).
    pub fn types(&mut self) -> &mut TypeTable {
        &mut self.types
    }

    /// Record the nominal type the oracle reports for `node`.
    pub fn set_type(&mut self, node: NodeIndex, ty: TypeId) {
        self.node_types.insert(node, ty);
    }

    /// Record the signature overload resolution picks for a call node.
    pub fn set_resolved_signature(&mut self, call: NodeIndex, signature: Signature) {
        self.signatures.insert(call, signature);
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Nodes receive increasing positions in creation order; a parent's span
    /// covers its children. Creation order therefore doubles as source order.
    fn add(&mut self, data: NodeData) -> NodeIndex {
        let start = self.pos;
        self.pos += 1;
        self.arena.add(data, Span::new(start, start + 1))
    }

    // -------------------------------------------------------------------------
    // Literals and names
    // -------------------------------------------------------------------------

    pub fn ident(&mut self, text: &str) -> NodeIndex {
        self.add(NodeData::Identifier {
            text: text.to_string(),
        })
    }

    pub fn num(&mut self, value: f64) -> NodeIndex {
        self.add(NodeData::NumericLiteral { value })
    }

    pub fn string(&mut self, value: &str) -> NodeIndex {
        self.add(NodeData::StringLiteral {
            value: value.to_string(),
        })
    }

    pub fn bigint(&mut self, digits: &str) -> NodeIndex {
        self.add(NodeData::BigIntLiteral {
            text: digits.to_string(),
        })
    }

    pub fn boolean(&mut self, value: bool) -> NodeIndex {
        self.add(if value {
            NodeData::TrueKeyword
        } else {
            NodeData::FalseKeyword
        })
    }

    pub fn null(&mut self) -> NodeIndex {
        self.add(NodeData::NullKeyword)
    }

    pub fn template(&mut self, head: &str, spans: Vec<(NodeIndex, &str)>) -> NodeIndex {
        let spans = spans
            .into_iter()
            .map(|(expression, literal)| TemplateSpan {
                expression,
                literal: literal.to_string(),
            })
            .collect();
        self.add(NodeData::TemplateExpression {
            head: head.to_string(),
            spans,
        })
    }

    // -------------------------------------------------------------------------
    // Objects and arrays
    // -------------------------------------------------------------------------

    pub fn object(&mut self, properties: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeData::ObjectLiteral { properties })
    }

    pub fn prop(&mut self, name: &str, initializer: NodeIndex) -> NodeIndex {
        let name = self.ident(name);
        self.add(NodeData::PropertyAssignment { name, initializer })
    }

    pub fn computed_name(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::ComputedPropertyName { expression })
    }

    pub fn prop_computed(&mut self, key: NodeIndex, initializer: NodeIndex) -> NodeIndex {
        let name = self.computed_name(key);
        self.add(NodeData::PropertyAssignment { name, initializer })
    }

    pub fn shorthand(&mut self, name: &str) -> NodeIndex {
        let name = self.ident(name);
        self.add(NodeData::ShorthandPropertyAssignment { name })
    }

    pub fn spread_assignment(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::SpreadAssignment { expression })
    }

    pub fn method(&mut self, name: &str, parameters: Vec<NodeIndex>, body: Vec<NodeIndex>) -> NodeIndex {
        let name = self.ident(name);
        let body = self.block(body);
        self.add(NodeData::MethodDeclaration(FunctionData {
            name: Some(name),
            parameters,
            body: Some(body),
            flags: FunctionFlags::empty(),
        }))
    }

    pub fn array(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeData::ArrayLiteral { elements })
    }

    pub fn spread(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::SpreadElement { expression })
    }

    pub fn omitted(&mut self) -> NodeIndex {
        self.add(NodeData::OmittedExpression)
    }

    // -------------------------------------------------------------------------
    // Operators
    // -------------------------------------------------------------------------

    pub fn binary(&mut self, operator: BinaryOperator, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.add(NodeData::Binary {
            operator,
            left,
            right,
        })
    }

    pub fn prefix(&mut self, operator: UnaryOperator, operand: NodeIndex) -> NodeIndex {
        self.add(NodeData::PrefixUnary { operator, operand })
    }

    pub fn postfix(&mut self, operator: UnaryOperator, operand: NodeIndex) -> NodeIndex {
        self.add(NodeData::PostfixUnary { operator, operand })
    }

    pub fn conditional(&mut self, condition: NodeIndex, when_true: NodeIndex, when_false: NodeIndex) -> NodeIndex {
        self.add(NodeData::Conditional {
            condition,
            when_true,
            when_false,
        })
    }

    pub fn paren(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::Parenthesized { expression })
    }

    pub fn assertion(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::TypeAssertion { expression })
    }

    pub fn await_expr(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::Await { expression })
    }

    // -------------------------------------------------------------------------
    // Access and calls
    // -------------------------------------------------------------------------

    pub fn call(&mut self, callee: NodeIndex, arguments: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeData::Call { callee, arguments })
    }

    /// `callee(args)` with the callee given by name.
    pub fn call_named(&mut self, callee: &str, arguments: Vec<NodeIndex>) -> NodeIndex {
        let callee = self.ident(callee);
        self.call(callee, arguments)
    }

    pub fn member(&mut self, expression: NodeIndex, name: &str) -> NodeIndex {
        let name = self.ident(name);
        self.add(NodeData::PropertyAccess { expression, name })
    }

    pub fn element(&mut self, expression: NodeIndex, argument: NodeIndex) -> NodeIndex {
        self.add(NodeData::ElementAccess {
            expression,
            argument,
        })
    }

    // -------------------------------------------------------------------------
    // Functions
    // -------------------------------------------------------------------------

    pub fn param(&mut self, name: &str) -> NodeIndex {
        self.param_with(name, None, false)
    }

    pub fn param_with(&mut self, name: &str, initializer: Option<NodeIndex>, rest: bool) -> NodeIndex {
        let name = self.ident(name);
        self.add(NodeData::Parameter {
            name,
            initializer,
            rest,
        })
    }

    pub fn function_decl(&mut self, name: &str, parameters: Vec<NodeIndex>, body: Vec<NodeIndex>) -> NodeIndex {
        self.function_decl_with(name, parameters, body, FunctionFlags::empty())
    }

    pub fn function_decl_with(
        &mut self,
        name: &str,
        parameters: Vec<NodeIndex>,
        body: Vec<NodeIndex>,
        flags: FunctionFlags,
    ) -> NodeIndex {
        let name = self.ident(name);
        let body = self.block(body);
        self.add(NodeData::FunctionDeclaration(FunctionData {
            name: Some(name),
            parameters,
            body: Some(body),
            flags,
        }))
    }

    pub fn function_expr(&mut self, parameters: Vec<NodeIndex>, body: Vec<NodeIndex>, flags: FunctionFlags) -> NodeIndex {
        let body = self.block(body);
        self.add(NodeData::FunctionExpression(FunctionData {
            name: None,
            parameters,
            body: Some(body),
            flags,
        }))
    }

    /// Arrow function with a concise expression body.
    pub fn arrow(&mut self, parameters: Vec<NodeIndex>, body: NodeIndex) -> NodeIndex {
        self.arrow_with(parameters, body, FunctionFlags::empty())
    }

    pub fn arrow_with(&mut self, parameters: Vec<NodeIndex>, body: NodeIndex, flags: FunctionFlags) -> NodeIndex {
        self.add(NodeData::ArrowFunction(FunctionData {
            name: None,
            parameters,
            body: Some(body),
            flags,
        }))
    }

    // -------------------------------------------------------------------------
    // Statements
    // -------------------------------------------------------------------------

    pub fn block(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeData::Block { statements })
    }

    pub fn ret(&mut self, expression: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeData::ReturnStatement { expression })
    }

    pub fn expr_stmt(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::ExpressionStatement { expression })
    }

    pub fn if_stmt(&mut self, condition: NodeIndex, then_statement: NodeIndex, else_statement: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeData::IfStatement {
            condition,
            then_statement,
            else_statement,
        })
    }

    /// A variable statement with a single declaration; returns the statement.
    pub fn var(&mut self, kind: VariableKind, name: &str, initializer: Option<NodeIndex>) -> NodeIndex {
        let decl = self.var_decl(kind, name, initializer);
        self.add(NodeData::VariableStatement {
            declarations: vec![decl],
        })
    }

    /// A bare variable declaration (wrap in a statement with [`var_statement`](Self::var_statement)).
    pub fn var_decl(&mut self, kind: VariableKind, name: &str, initializer: Option<NodeIndex>) -> NodeIndex {
        let name = self.ident(name);
        self.add(NodeData::VariableDeclaration {
            name,
            initializer,
            kind,
        })
    }

    pub fn var_statement(&mut self, declarations: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeData::VariableStatement { declarations })
    }

    pub fn source_file(&mut self, file_name: &str, statements: Vec<NodeIndex>) -> NodeIndex {
        let idx = self.add(NodeData::SourceFile {
            file_name: file_name.to_string(),
            statements,
        });
        self.files.push(idx);
        idx
    }

    // -------------------------------------------------------------------------
    // JSX
    // -------------------------------------------------------------------------

    pub fn jsx_element(&mut self, tag_name: &str, attributes: Vec<NodeIndex>, children: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeData::JsxElement {
            tag_name: tag_name.to_string(),
            attributes,
            children,
        })
    }

    pub fn jsx_fragment(&mut self, children: Vec<NodeIndex>) -> NodeIndex {
        self.add(NodeData::JsxFragment { children })
    }

    pub fn jsx_attr(&mut self, name: &str, initializer: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeData::JsxAttribute {
            name: name.to_string(),
            initializer,
        })
    }

    pub fn jsx_spread(&mut self, expression: NodeIndex) -> NodeIndex {
        self.add(NodeData::JsxSpreadAttribute { expression })
    }

    pub fn jsx_text(&mut self, text: &str) -> NodeIndex {
        self.add(NodeData::JsxText {
            text: text.to_string(),
        })
    }

    pub fn jsx_expr(&mut self, expression: Option<NodeIndex>) -> NodeIndex {
        self.add(NodeData::JsxExpression { expression })
    }

    // -------------------------------------------------------------------------
    // Finish
    // -------------------------------------------------------------------------

    /// Bind the source files and assign default types: literal types for
    /// literal nodes, `any` for unannotated parameters.
    pub fn finish(mut self) -> HostProgram {
        for i in 0..self.arena.len() {
            let idx = NodeIndex(i as u32);
            if self.node_types.contains_key(&idx) {
                continue;
            }
            let ty = match self.arena.data(idx) {
                Some(NodeData::NumericLiteral { value }) => Some(self.types.literal_number(*value)),
                Some(NodeData::StringLiteral { value }) => {
                    let value = value.clone();
                    Some(self.types.literal_string(value))
                }
                Some(NodeData::BigIntLiteral { text }) => {
                    let text = text.clone();
                    Some(self.types.literal_bigint(text))
                }
                Some(NodeData::TrueKeyword) => Some(self.types.literal_boolean(true)),
                Some(NodeData::FalseKeyword) => Some(self.types.literal_boolean(false)),
                Some(NodeData::NullKeyword) => Some(TypeId::NULL),
                Some(NodeData::TemplateExpression { .. }) => Some(TypeId::STRING),
                Some(NodeData::Parameter { .. }) => Some(TypeId::ANY),
                _ => None,
            };
            if let Some(ty) = ty {
                self.node_types.insert(idx, ty);
            }
        }
        let binding = BinderState::new(&self.arena).bind_source_files(&self.files);
        HostProgram {
            arena: self.arena,
            types: self.types,
            node_types: self.node_types,
            signatures: self.signatures,
            files: self.files,
            binding,
        }
    }
}

/// A bound in-memory program. Implements all collaborator traits.
pub struct HostProgram {
    arena: NodeArena,
    types: TypeTable,
    node_types: FxHashMap<NodeIndex, TypeId>,
    signatures: FxHashMap<NodeIndex, Signature>,
    files: Vec<NodeIndex>,
    binding: BinderResult,
}

impl HostProgram {
    pub fn host(&self) -> Host<'_> {
        Host::new(&self.arena, self, self, self)
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn files(&self) -> &[NodeIndex] {
        &self.files
    }

    pub fn binding(&self) -> &BinderResult {
        &self.binding
    }

    /// Symbol declared at `path` in the first source file that has it.
    pub fn symbol_named(&self, path: &str) -> Option<SymbolId> {
        self.binding
            .symbols
            .iter()
            .position(|symbol| symbol.path == path)
            .map(|i| SymbolId(i as u32))
    }
}

impl TypeOracle for HostProgram {
    fn lookup(&self, ty: TypeId) -> Option<&TypeData> {
        self.types.lookup(ty)
    }

    fn type_of_node(&self, node: NodeIndex) -> Option<TypeId> {
        self.node_types.get(&node).copied()
    }

    fn type_to_string(&self, ty: TypeId) -> String {
        self.types.display(ty)
    }

    fn type_of_symbol(&self, symbol: SymbolId) -> Option<TypeId> {
        let declaration = self.binding.symbol(symbol)?.declaration;
        self.type_of_node(declaration)
    }

    fn resolved_signature(&self, call: NodeIndex) -> Option<Signature> {
        self.signatures.get(&call).cloned()
    }
}

impl DeclarationResolver for HostProgram {
    fn resolve(&self, reference: NodeIndex) -> Option<ResolvedSymbol> {
        let symbol = *self.binding.node_symbols.get(&reference)?;
        let declaration = self.binding.symbol(symbol)?.declaration;
        Some(ResolvedSymbol {
            symbol,
            declaration,
        })
    }

    fn symbol_of_declaration(&self, declaration: NodeIndex) -> Option<SymbolId> {
        self.binding.declaration_symbols.get(&declaration).copied()
    }

    fn declaration_of_symbol(&self, symbol: SymbolId) -> Option<NodeIndex> {
        self.binding.symbol(symbol).map(|info| info.declaration)
    }
}

impl SymbolTable for HostProgram {
    fn references(&self, symbol: SymbolId) -> &[NodeIndex] {
        self.binding
            .references
            .get(&symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn lookup(&self, file: &str, path: &str) -> Option<SymbolId> {
        self.binding
            .paths
            .get(&(file.to_string(), path.to_string()))
            .copied()
    }
}

#[cfg(test)]
#[path = "../tests/program_tests.rs"]
mod program_tests;
