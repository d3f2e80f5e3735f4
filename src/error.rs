#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed diagram XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed diagram XML attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("malformed diagram XML: {0}")]
    Structure(String),
}

pub type Result<T> = std::result::Result<T, Error>;
