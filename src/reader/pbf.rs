//! OSM PBF element source

use std::path::{Path, PathBuf};

use osmpbf::{Blob, BlobDecode, BlobReader};

use super::{
    valid_coordinate, Element, ElementError, ElementResult, ElementSource, NodeRecord, WayRecord,
};

/// Streams nodes and ways from an `.osm.pbf` file, block by block
#[derive(Debug, Clone)]
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ElementSource for PbfSource {
    type Iter<'a> = Box<dyn Iterator<Item = ElementResult> + 'a>;

    fn elements(&self) -> Result<Self::Iter<'_>, ElementError> {
        let reader = BlobReader::from_path(&self.path).map_err(|e| {
            ElementError::Unreadable(format!("Failed to open PBF file {}: {e}", self.path.display()))
        })?;

        Ok(Box::new(reader.flat_map(decode_blob)))
    }
}

/// Decode one blob into owned elements. Header and unknown blobs yield nothing.
fn decode_blob(blob: Result<Blob, osmpbf::Error>) -> Vec<ElementResult> {
    let blob = match blob {
        Ok(blob) => blob,
        Err(e) => return vec![Err(ElementError::Unreadable(e.to_string()))],
    };

    match blob.decode() {
        Ok(BlobDecode::OsmData(block)) => block.elements().filter_map(convert).collect(),
        Ok(_) => Vec::new(),
        Err(e) => vec![Err(ElementError::Unreadable(e.to_string()))],
    }
}

fn convert(element: osmpbf::Element<'_>) -> Option<ElementResult> {
    match element {
        osmpbf::Element::Node(node) => Some(node_record(node.id(), node.lat(), node.lon(), node.tags())),
        osmpbf::Element::DenseNode(node) => {
            Some(node_record(node.id(), node.lat(), node.lon(), node.tags()))
        }
        osmpbf::Element::Way(way) => Some(Ok(Element::Way(WayRecord {
            id: way.id(),
            refs: way.refs().collect(),
            tags: way
                .tags()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }))),
        osmpbf::Element::Relation(_) => None,
    }
}

fn node_record<'a>(
    id: i64,
    lat: f64,
    lon: f64,
    mut tags: impl Iterator<Item = (&'a str, &'a str)>,
) -> ElementResult {
    if !valid_coordinate(lat, lon) {
        return Err(ElementError::MalformedCoordinate {
            id,
            lat: lat.to_string(),
            lon: lon.to_string(),
        });
    }

    let ele = tags
        .find(|(k, _)| *k == "ele")
        .and_then(|(_, v)| v.trim().parse::<f64>().ok());

    Ok(Element::Node(NodeRecord { id, lat, lon, ele }))
}
