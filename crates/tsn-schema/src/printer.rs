//! Type-syntax printer.
//!
//! Renders schemas as TypeScript type text:
//!
//! ```text
//! { id: "a" | "b"; tags: string[]; run: (n: number) => Promise<void> }
//! ```
//!
//! Symbolic nodes print as the type they evaluate to: a `binary-expression`
//! prints its result primitive, an `error` prints `unknown` with the reason
//! in a comment.

use crate::literal_ops::number_to_string;
use crate::schema::{ElementFlag, PrimitiveKind, Schema, SchemaLiteral, SchemaNode};
use std::fmt::Write;
use tsn_host::BinaryOperator;

/// Render one schema as type text.
pub fn print_type(node: &SchemaNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

/// Render a schema with its definitions, one `type` alias per definition
/// followed by the root.
pub fn print_schema(schema: &Schema) -> String {
    let mut out = String::new();
    for (stable_id, body) in &schema.defs {
        let _ = writeln!(out, "type {stable_id} = {};", print_type(body));
    }
    write_node(&mut out, &schema.root);
    out
}

/// Primitive a symbolic binary expression evaluates to.
pub(crate) fn binary_result_kind(op: BinaryOperator, left: &SchemaNode, right: &SchemaNode) -> Option<PrimitiveKind> {
    use BinaryOperator as B;
    if op.is_relational() {
        return Some(PrimitiveKind::Boolean);
    }
    if op.is_logical() {
        return None;
    }
    if op == B::Add && (is_string_like(left) || is_string_like(right)) {
        return Some(PrimitiveKind::String);
    }
    if op != B::UnsignedRightShift && (is_bigint_like(left) || is_bigint_like(right)) {
        return Some(PrimitiveKind::BigInt);
    }
    Some(PrimitiveKind::Number)
}

fn is_string_like(node: &SchemaNode) -> bool {
    match node {
        SchemaNode::Primitive { name, .. } => *name == PrimitiveKind::String,
        SchemaNode::Literal { value } => matches!(value, SchemaLiteral::String(_)),
        SchemaNode::TemplateLiteral { .. } => true,
        SchemaNode::Union { items } => items.iter().any(is_string_like),
        SchemaNode::BinaryExpression {
            operator,
            left,
            right,
        } => binary_result_kind(*operator, left, right) == Some(PrimitiveKind::String),
        _ => false,
    }
}

fn is_bigint_like(node: &SchemaNode) -> bool {
    match node {
        SchemaNode::Primitive { name, .. } => *name == PrimitiveKind::BigInt,
        SchemaNode::Literal { value } => matches!(value, SchemaLiteral::BigInt(_)),
        SchemaNode::Union { items } => items.iter().all(is_bigint_like),
        SchemaNode::BinaryExpression {
            operator,
            left,
            right,
        } => binary_result_kind(*operator, left, right) == Some(PrimitiveKind::BigInt),
        _ => false,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

fn write_property_name(out: &mut String, name: &str) {
    if is_identifier(name) {
        out.push_str(name);
    } else {
        out.push_str(&quote(name));
    }
}

/// Wrap operands that would otherwise bind loosely (`(A | B)[]`).
fn write_operand(out: &mut String, node: &SchemaNode) {
    let needs_parens = matches!(
        node,
        SchemaNode::Union { .. } | SchemaNode::Intersection { .. } | SchemaNode::Function { .. }
    );
    if needs_parens {
        out.push('(');
        write_node(out, node);
        out.push(')');
    } else {
        write_node(out, node);
    }
}

fn write_literal(out: &mut String, value: &SchemaLiteral) {
    match value {
        SchemaLiteral::String(s) => out.push_str(&quote(s)),
        SchemaLiteral::Number(n) if !n.is_finite() => out.push_str("number"),
        SchemaLiteral::Number(n) => out.push_str(&number_to_string(*n)),
        SchemaLiteral::BigInt(digits) => {
            out.push_str(digits);
            out.push('n');
        }
        SchemaLiteral::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        SchemaLiteral::Null => out.push_str("null"),
        SchemaLiteral::Undefined => out.push_str("undefined"),
    }
}

fn write_joined(out: &mut String, items: &[SchemaNode], separator: &str) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        write_operand(out, item);
    }
}

fn write_node(out: &mut String, node: &SchemaNode) {
    match node {
        SchemaNode::Primitive { name, .. } => out.push_str(name.as_str()),
        SchemaNode::Literal { value } => write_literal(out, value),
        SchemaNode::Union { items } => write_joined(out, items, " | "),
        SchemaNode::Intersection { items } => write_joined(out, items, " & "),
        SchemaNode::Tuple {
            items,
            element_flags,
        } => {
            out.push('[');
            for (i, (item, flag)) in items.iter().zip(element_flags).enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match flag {
                    ElementFlag::Required => write_node(out, item),
                    ElementFlag::Optional => {
                        write_operand(out, item);
                        out.push('?');
                    }
                    ElementFlag::Rest => {
                        out.push_str("...");
                        write_operand(out, item);
                        out.push_str("[]");
                    }
                }
            }
            out.push(']');
        }
        SchemaNode::Array { items } => {
            write_operand(out, items);
            out.push_str("[]");
        }
        SchemaNode::Object {
            properties,
            abstract_index_keys,
        } => {
            if properties.is_empty() && abstract_index_keys.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            let mut first = true;
            for (name, value) in properties {
                if !first {
                    out.push_str("; ");
                }
                first = false;
                write_property_name(out, name);
                out.push_str(": ");
                write_node(out, value);
            }
            for (key, value) in abstract_index_keys {
                if !first {
                    out.push_str("; ");
                }
                first = false;
                out.push_str("[key: ");
                write_node(out, key);
                out.push_str("]: ");
                write_node(out, value);
            }
            out.push_str(" }");
        }
        SchemaNode::Function {
            parameters,
            return_type,
        } => {
            out.push('(');
            for (i, (name, param)) in parameters.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                write_node(out, param);
            }
            out.push_str(") => ");
            write_node(out, return_type);
        }
        SchemaNode::BinaryExpression {
            operator,
            left,
            right,
        } => match binary_result_kind(*operator, left, right) {
            Some(kind) => out.push_str(kind.as_str()),
            None if *operator == BinaryOperator::Comma => write_node(out, right),
            None => {
                write_operand(out, left);
                out.push_str(" | ");
                write_operand(out, right);
            }
        },
        SchemaNode::TemplateLiteral { items } => {
            out.push('`');
            for item in items {
                match item.as_literal() {
                    Some(SchemaLiteral::String(text)) => {
                        for c in text.chars() {
                            if matches!(c, '`' | '\\' | '$') {
                                out.push('\\');
                            }
                            out.push(c);
                        }
                    }
                    _ => {
                        out.push_str("${");
                        write_node(out, item);
                        out.push('}');
                    }
                }
            }
            out.push('`');
        }
        SchemaNode::Index { of, .. } => {
            out.push_str("keyof ");
            write_operand(out, of);
        }
        SchemaNode::IndexAccess { object, index, .. } => {
            write_operand(out, object);
            out.push('[');
            write_node(out, index);
            out.push(']');
        }
        SchemaNode::Reference {
            name, type_args, ..
        } => {
            out.push_str(name);
            if !type_args.is_empty() {
                out.push('<');
                for (i, arg) in type_args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_node(out, arg);
                }
                out.push('>');
            }
        }
        SchemaNode::Error { reason, .. } => {
            let _ = write!(out, "unknown /* {} */", reason.replace("*/", "* /"));
        }
    }
}

#[cfg(test)]
#[path = "../tests/printer_tests.rs"]
mod printer_tests;
