use std::collections::HashSet;

use md5::{Digest, Md5};
use tracing::debug;
use uuid::{Builder, Uuid};
use winnow::prelude::*;
use winnow::combinator::alt;

use crate::diagram_ast::*;
use crate::graph_ast::*;
use crate::rich_text::split_lines;

const CIRCLE_STYLE_PREFIX: &str = "ellipse;";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub prefix_ignore: Option<String>,
    pub prefix_mark: Option<String>,
    pub allow_only_circle_nodes: bool,
    pub auto_label: Option<String>,
    pub auto_uuid_prop: Option<AutoUuidProp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoUuidProp {
    pub prop_name: String,
    pub global_context: String,
}

impl AutoUuidProp {
    pub fn new(prop_name: impl Into<String>, global_context: impl Into<String>) -> Self {
        Self {
            prop_name: prop_name.into(),
            global_context: global_context.into(),
        }
    }

    /// Name-based (MD5, version 3) UUID of `global_context + local_context`,
    /// hashed without a namespace.
    pub fn uuid_for(&self, local_context: &str) -> Uuid {
        let mut hasher = Md5::new();
        hasher.update(self.global_context.as_bytes());
        hasher.update(local_context.as_bytes());
        Builder::from_md5_bytes(hasher.finalize().into()).into_uuid()
    }
}

enum Heading<'a> {
    Ignored,
    Marked(&'a str),
    Plain(&'a str),
}

impl TransformOptions {
    fn heading<'a>(&self, first_line: &'a str) -> Heading<'a> {
        if self
            .prefix_ignore
            .as_deref()
            .is_some_and(|prefix| first_line.starts_with(prefix))
        {
            return Heading::Ignored;
        }
        match self
            .prefix_mark
            .as_deref()
            .and_then(|prefix| first_line.strip_prefix(prefix))
        {
            Some(rest) => Heading::Marked(rest),
            None => Heading::Plain(first_line),
        }
    }
}

pub fn transform(diagram: &DiagramData, options: &TransformOptions) -> Graph {
    let nodes: Vec<GraphNode> = diagram
        .vertexes
        .iter()
        .filter_map(|vertex| transform_vertex(vertex, options))
        .collect();

    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let rels: Vec<GraphRel> = diagram
        .edges
        .iter()
        .filter_map(|edge| transform_edge(edge, options))
        .filter(|rel| {
            let connected = node_ids.contains(rel.source_id.as_str())
                && node_ids.contains(rel.target_id.as_str());
            if !connected {
                debug!(
                    source = %rel.source_id,
                    target = %rel.target_id,
                    "dropping relationship with a missing endpoint"
                );
            }
            connected
        })
        .collect();

    debug!(nodes = nodes.len(), rels = rels.len(), "built graph");
    Graph { nodes, rels }
}

fn transform_vertex(vertex: &DiagramVertex, options: &TransformOptions) -> Option<GraphNode> {
    if options.allow_only_circle_nodes && !vertex.style.starts_with(CIRCLE_STYLE_PREFIX) {
        debug!(id = %vertex.id, "skipping vertex that is not a circle");
        return None;
    }

    let lines = split_lines(&vertex.text);
    let Some((first_line, prop_lines)) = lines.split_first() else {
        debug!(id = %vertex.id, "skipping vertex without text");
        return None;
    };

    let (marked, labels_text) = match options.heading(first_line) {
        Heading::Ignored => {
            debug!(id = %vertex.id, "skipping ignored vertex");
            return None;
        }
        Heading::Marked(rest) => (true, rest),
        Heading::Plain(text) => (false, text),
    };

    let mut labels: Vec<String> = labels_text
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_owned)
        .collect();
    if let Some(auto_label) = options.auto_label.as_ref().filter(|_| !marked) {
        labels.push(auto_label.clone());
    }
    dedup_in_order(&mut labels);

    Some(GraphNode {
        id: vertex.id.clone(),
        labels,
        props: parse_props(prop_lines, &vertex.id, marked, options),
        marked,
    })
}

fn transform_edge(edge: &DiagramEdge, options: &TransformOptions) -> Option<GraphRel> {
    let lines = split_lines(&edge.text);
    let Some((first_line, prop_lines)) = lines.split_first() else {
        debug!(id = %edge.id, "skipping edge without text");
        return None;
    };

    let (marked, rel_type) = match options.heading(first_line) {
        Heading::Ignored => {
            debug!(id = %edge.id, "skipping ignored edge");
            return None;
        }
        Heading::Marked(rest) => (true, rest),
        Heading::Plain(text) => (false, text),
    };
    if rel_type.is_empty() {
        debug!(id = %edge.id, "skipping edge without relationship type");
        return None;
    }

    Some(GraphRel {
        rel_type: rel_type.to_owned(),
        source_id: edge.source_id.clone(),
        target_id: edge.target_id.clone(),
        props: parse_props(prop_lines, &edge.id, marked, options),
        marked,
    })
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

fn parse_props(
    lines: &[String],
    local_context: &str,
    marked: bool,
    options: &TransformOptions,
) -> Vec<GraphProperty> {
    let mut props: Vec<GraphProperty> = lines.iter().filter_map(|l| parse_property(l)).collect();
    if marked {
        return props;
    }

    if let Some(auto) = options
        .auto_uuid_prop
        .as_ref()
        .filter(|auto| !props.iter().any(|p| p.name == auto.prop_name))
    {
        props.push(GraphProperty {
            name: auto.prop_name.clone(),
            value: format!("\"{}\"", auto.uuid_for(local_context)),
        });
    }
    props
}

fn parse_property(line: &str) -> Option<GraphProperty> {
    let mut input = line;
    bullet.parse_next(&mut input).ok()?;
    let (name, value) = input.trim().split_once(':')?;
    Some(GraphProperty {
        name: name.to_owned(),
        value: value.trim_start().to_owned(),
    })
}

fn bullet<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    alt(("- ", "+ ", "* ")).parse_next(input)
}
