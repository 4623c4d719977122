//! Map element sources
//!
//! The importer reads a source twice: once to classify nodes and once to build the
//! graph. A source must therefore be able to start a fresh pass on every call to
//! [`ElementSource::elements`], yielding elements in document order (nodes before the
//! ways that reference them).

mod pbf;
mod xml;

pub use pbf::PbfSource;
pub use xml::{XmlElements, XmlSource};

use thiserror::Error;

/// A node element
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
}

/// A way element with its node references in order
#[derive(Debug, Clone, PartialEq)]
pub struct WayRecord {
    pub id: i64,
    pub refs: Vec<i64>,
    pub tags: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(NodeRecord),
    Way(WayRecord),
}

/// Problems with a single element, reported in-stream.
/// Whether one is fatal is decided by the consumer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("cannot get id from node: {raw}")]
    MalformedId { raw: String },

    #[error("cannot handle lat/lon of node {id}: {lat},{lon}")]
    MalformedCoordinate { id: i64, lat: String, lon: String },

    #[error("malformed way: {raw}")]
    MalformedWay { raw: String },

    #[error("unreadable map data: {0}")]
    Unreadable(String),
}

pub type ElementResult = Result<Element, ElementError>;

/// Finite and inside the WGS84 range
pub(crate) fn valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0
}

/// Something that can stream map elements, once per call
pub trait ElementSource {
    type Iter<'a>: Iterator<Item = ElementResult> + 'a
    where
        Self: 'a;

    /// Start a new pass over the source
    fn elements(&self) -> Result<Self::Iter<'_>, ElementError>;
}

/// Source backed by an in-memory list, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    elements: Vec<ElementResult>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, id: i64, lat: f64, lon: f64) -> Self {
        self.elements.push(Ok(Element::Node(NodeRecord {
            id,
            lat,
            lon,
            ele: None,
        })));
        self
    }

    pub fn way(mut self, id: i64, refs: &[i64], tags: &[(&str, &str)]) -> Self {
        self.elements.push(Ok(Element::Way(WayRecord {
            id,
            refs: refs.to_vec(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })));
        self
    }

    /// Push an in-stream error at the current position
    pub fn error(mut self, error: ElementError) -> Self {
        self.elements.push(Err(error));
        self
    }

    pub fn push(&mut self, element: ElementResult) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<ElementResult> for MemorySource {
    fn from_iter<I: IntoIterator<Item = ElementResult>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl ElementSource for MemorySource {
    type Iter<'a> = std::iter::Cloned<std::slice::Iter<'a, ElementResult>>;

    fn elements(&self) -> Result<Self::Iter<'_>, ElementError> {
        Ok(self.elements.iter().cloned())
    }
}
