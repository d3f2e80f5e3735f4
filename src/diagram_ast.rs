#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagramData {
    pub vertexes: Vec<DiagramVertex>,
    pub edges: Vec<DiagramEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramVertex {
    pub id: String,
    pub text: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub text: String,
}
