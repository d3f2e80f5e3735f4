use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use tracing::debug;

use crate::diagram_ast::*;
use crate::error::{Error, Result};

const CELL: &str = "mxCell";
const GRAPH_MODEL: &str = "mxGraphModel";
const ROOT: &str = "root";

/// Extract vertex and edge cells from a draw.io XML document.
///
/// Only `mxCell` elements sitting directly under `mxGraphModel/root` are
/// considered. A cell whose `vertex` attribute contains `1` becomes a vertex,
/// one whose `edge` attribute contains `1` becomes an edge. Cells missing a
/// required attribute are skipped.
pub fn parse_diagram(input: &str) -> Result<DiagramData> {
    let mut reader = Reader::from_str(input);
    let mut path: Vec<String> = Vec::new();
    let mut seen_root = false;
    let mut data = DiagramData::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                open_element(&e, &path, &mut seen_root)?;
                collect_cell(&e, &path, &mut data)?;
                path.push(element_name(&e));
            }
            Event::Empty(e) => {
                open_element(&e, &path, &mut seen_root)?;
                collect_cell(&e, &path, &mut data)?;
            }
            Event::End(e) => {
                if path.pop().is_none() {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(Error::Structure(format!("unexpected closing tag </{name}>")));
                }
            }
            Event::Text(t) if path.is_empty() => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(Error::Structure("text outside of the root element".into()));
                }
            }
            Event::CData(_) if path.is_empty() => {
                return Err(Error::Structure("CDATA outside of the root element".into()));
            }
            Event::GeneralRef(r) => check_reference(&r, &path)?,
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = path.last() {
        return Err(Error::Structure(format!("element <{open}> is not closed")));
    }
    if !seen_root {
        return Err(Error::Structure("no root element found".into()));
    }

    debug!(
        vertexes = data.vertexes.len(),
        edges = data.edges.len(),
        "extracted diagram cells"
    );
    Ok(data)
}

fn open_element(e: &BytesStart<'_>, path: &[String], seen_root: &mut bool) -> Result<()> {
    for attr in e.attributes() {
        attr?.unescape_value()?;
    }
    if path.is_empty() {
        if *seen_root {
            return Err(Error::Structure(format!(
                "second root element <{}>",
                element_name(e)
            )));
        }
        *seen_root = true;
    }
    Ok(())
}

fn check_reference(r: &BytesRef<'_>, path: &[String]) -> Result<()> {
    let name = String::from_utf8_lossy(r).into_owned();
    if path.is_empty() {
        return Err(Error::Structure(format!(
            "entity reference &{name}; outside of the root element"
        )));
    }
    if r.resolve_char_ref()?.is_none() && resolve_xml_entity(&name).is_none() {
        return Err(Error::Structure(format!("undefined entity reference &{name};")));
    }
    Ok(())
}

fn collect_cell(e: &BytesStart<'_>, path: &[String], data: &mut DiagramData) -> Result<()> {
    if e.name().as_ref() != CELL.as_bytes() || !is_under_graph_root(path) {
        return Ok(());
    }

    if flag_is_set(e, "vertex")? {
        match parse_vertex(e)? {
            Some(vertex) => data.vertexes.push(vertex),
            None => debug!("skipping vertex cell without id"),
        }
    }
    if flag_is_set(e, "edge")? {
        match parse_edge(e)? {
            Some(edge) => data.edges.push(edge),
            None => debug!("skipping edge cell without id, source or target"),
        }
    }
    Ok(())
}

fn is_under_graph_root(path: &[String]) -> bool {
    matches!(path, [.., model, root] if model == GRAPH_MODEL && root == ROOT)
}

fn flag_is_set(e: &BytesStart<'_>, key: &str) -> Result<bool> {
    Ok(attribute(e, key)?.is_some_and(|v| v.contains('1')))
}

fn parse_vertex(e: &BytesStart<'_>) -> Result<Option<DiagramVertex>> {
    let Some(id) = attribute(e, "id")? else {
        return Ok(None);
    };
    Ok(Some(DiagramVertex {
        id,
        text: attribute(e, "value")?.unwrap_or_default(),
        style: attribute(e, "style")?.unwrap_or_default(),
    }))
}

fn parse_edge(e: &BytesStart<'_>) -> Result<Option<DiagramEdge>> {
    let (Some(id), Some(source_id), Some(target_id)) = (
        attribute(e, "id")?,
        attribute(e, "source")?,
        attribute(e, "target")?,
    ) else {
        return Ok(None);
    };
    Ok(Some(DiagramEdge {
        id,
        source_id,
        target_id,
        text: attribute(e, "value")?.unwrap_or_default(),
    }))
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}
