//! JSX elements and fragments.
//!
//! `<Tag a="x" b {...rest}>child</Tag>` evaluates to
//! `{ type: "Tag", props: { a: "x", b: true, ...rest, children: "child" } }`.

use super::SchemaEvaluator;
use super::objects::ObjectBuilder;
use crate::algebra::union;
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::schema::SchemaNode;
use tsn_host::{NodeData, NodeIndex};

impl<'a> SchemaEvaluator<'a> {
    pub(super) fn evaluate_jsx(
        &self,
        tag: SchemaNode,
        attributes: &[NodeIndex],
        children: &[NodeIndex],
        ctx: &EvaluationContext,
    ) -> Result<SchemaNode> {
        let arena = self.host.arena;
        let mut props = vec![ObjectBuilder::default()];
        for &attribute in attributes {
            match arena.data(attribute) {
                Some(NodeData::JsxAttribute { name, .. }) => {
                    let value = self.schema_of_node(attribute, ctx)?;
                    for builder in &mut props {
                        builder.set(name.clone(), value.clone());
                    }
                }
                Some(NodeData::JsxSpreadAttribute { expression }) => {
                    let source = self.schema_of_node(*expression, ctx)?;
                    props = self.apply_spread(props, &source, ctx)?;
                }
                _ => {}
            }
        }

        let mut child_schemas = Vec::with_capacity(children.len());
        for &child in children {
            match arena.data(child) {
                Some(NodeData::JsxText { text }) if text.trim().is_empty() => {}
                Some(NodeData::JsxExpression { expression: None }) => {}
                _ => child_schemas.push(self.schema_of_node(child, ctx)?),
            }
        }
        let children = match child_schemas.len() {
            0 => None,
            1 => child_schemas.pop(),
            _ => Some(SchemaNode::tuple(child_schemas)),
        };
        if let Some(children) = children {
            for builder in &mut props {
                builder.set("children".to_string(), children.clone());
            }
        }

        Ok(union(props.into_iter().map(|builder| {
            SchemaNode::object_from([("type", tag.clone()), ("props", builder.build())])
        })))
    }
}
