#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub rels: Vec<GraphRel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub labels: Vec<String>,
    pub props: Vec<GraphProperty>,
    pub marked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRel {
    pub rel_type: String,
    pub source_id: String,
    pub target_id: String,
    pub props: Vec<GraphProperty>,
    pub marked: bool,
}

/// A `name: value` pair; `value` is a Cypher literal passed through as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphProperty {
    pub name: String,
    pub value: String,
}
