use tracing::debug;

use crate::graph_ast::*;

#[derive(Debug, Default)]
struct Subgraph<'g> {
    nodes: Vec<&'g GraphNode>,
    rels: Vec<&'g GraphRel>,
}

impl<'g> Subgraph<'g> {
    fn whole(graph: &'g Graph) -> Self {
        Self {
            nodes: graph.nodes.iter().collect(),
            rels: graph.rels.iter().collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.rels.is_empty()
    }

    fn patterns(&self) -> String {
        self.nodes
            .iter()
            .map(|node| render_node(node))
            .chain(self.rels.iter().map(|rel| render_rel(rel)))
            .collect::<Vec<_>>()
            .join(",\n")
    }
}

pub fn render_match(graph: &Graph) -> String {
    render_match_subgraph(&Subgraph::whole(graph))
}

/// `CREATE` the unmarked part of the graph, matching its marked part first.
///
/// Marked nodes are matched. A marked relationship is matched only when both
/// of its endpoints are marked; any other relationship is created. Without
/// marked nodes there is nothing to match against, so marked relationships are
/// dropped. If nothing is left to create the result is a plain `MATCH`.
pub fn render_create(graph: &Graph) -> String {
    let (to_match, to_create) = partition(graph);
    debug!(
        match_nodes = to_match.nodes.len(),
        match_rels = to_match.rels.len(),
        create_nodes = to_create.nodes.len(),
        create_rels = to_create.rels.len(),
        "partitioned graph"
    );

    if to_create.is_empty() {
        return render_match_subgraph(&to_match);
    }

    format!(
        "{}CREATE\n{}\nRETURN *\n",
        match_clause(&to_match),
        to_create.patterns()
    )
}

fn partition(graph: &Graph) -> (Subgraph<'_>, Subgraph<'_>) {
    let (marked_nodes, unmarked_nodes): (Vec<&GraphNode>, Vec<&GraphNode>) =
        graph.nodes.iter().partition(|node| node.marked);

    if marked_nodes.is_empty() {
        let to_create = Subgraph {
            nodes: unmarked_nodes,
            rels: graph.rels.iter().filter(|rel| !rel.marked).collect(),
        };
        return (Subgraph::default(), to_create);
    }

    let is_marked_node = |id: &str| marked_nodes.iter().any(|node| node.id == id);
    let (matched_rels, created_rels): (Vec<&GraphRel>, Vec<&GraphRel>) =
        graph.rels.iter().partition(|rel| {
            rel.marked
                && is_marked_node(rel.source_id.as_str())
                && is_marked_node(rel.target_id.as_str())
        });

    (
        Subgraph {
            nodes: marked_nodes,
            rels: matched_rels,
        },
        Subgraph {
            nodes: unmarked_nodes,
            rels: created_rels,
        },
    )
}

fn render_match_subgraph(subgraph: &Subgraph<'_>) -> String {
    let clause = match_clause(subgraph);
    if clause.is_empty() {
        return clause;
    }
    format!("{clause}RETURN *\n")
}

fn match_clause(subgraph: &Subgraph<'_>) -> String {
    if subgraph.nodes.is_empty() {
        return String::new();
    }
    format!("MATCH\n{}\n", subgraph.patterns())
}

pub fn render_node(node: &GraphNode) -> String {
    let mut details = render_node_id(&node.id);
    for label in &node.labels {
        details.push_str(&render_label(label));
    }
    if !node.props.is_empty() {
        details.push(' ');
        details.push_str(&render_props(&node.props));
    }
    format!("({details})")
}

pub fn render_rel(rel: &GraphRel) -> String {
    let mut details = render_label(&rel.rel_type);
    if !rel.props.is_empty() {
        details.push(' ');
        details.push_str(&render_props(&rel.props));
    }
    format!(
        "({})-[{details}]->({})",
        render_node_id(&rel.source_id),
        render_node_id(&rel.target_id)
    )
}

/// Quote a node id as a Cypher identifier, doubling embedded backticks.
pub fn render_node_id(id: &str) -> String {
    format!("`{}`", id.replace('`', "``"))
}

pub fn render_label(label: &str) -> String {
    format!(":{label}")
}

fn render_props(props: &[GraphProperty]) -> String {
    let body = props
        .iter()
        .map(|p| format!("{}: {}", p.name, p.value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}
