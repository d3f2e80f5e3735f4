pub mod cypher_renderer;
pub mod diagram_ast;
pub mod diagram_parser;
pub mod error;
pub mod graph_ast;
pub mod rich_text;
pub mod transformer;

pub use error::{Error, Result};
pub use transformer::{AutoUuidProp, TransformOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Match,
    Create,
}

/// Convert a draw.io XML document into a Cypher statement.
pub fn generate(input: &str, mode: Mode, options: &TransformOptions) -> Result<String> {
    let diagram = diagram_parser::parse_diagram(input)?;
    let graph = transformer::transform(&diagram, options);
    Ok(match mode {
        Mode::Match => cypher_renderer::render_match(&graph),
        Mode::Create => cypher_renderer::render_create(&graph),
    })
}
