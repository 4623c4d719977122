//! OSM XML element source, plain or gzip compressed

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{
    valid_coordinate, Element, ElementError, ElementResult, ElementSource, NodeRecord, WayRecord,
};

#[derive(Debug, Clone)]
enum Input {
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Streams nodes and ways from an `.osm` or `.osm.gz` document
#[derive(Debug, Clone)]
pub struct XmlSource {
    input: Input,
}

impl XmlSource {
    /// Read from a file; a `.gz` extension selects gzip decompression
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            input: Input::File(path.as_ref().to_path_buf()),
        }
    }

    /// Read from a document held in memory
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            input: Input::Memory(bytes.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.input {
            Input::File(path) => Some(path),
            Input::Memory(_) => None,
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

impl ElementSource for XmlSource {
    type Iter<'a> = XmlElements<Box<dyn BufRead + 'a>>;

    fn elements(&self) -> Result<Self::Iter<'_>, ElementError> {
        let input: Box<dyn BufRead + '_> = match &self.input {
            Input::File(path) => {
                let file = File::open(path).map_err(|e| {
                    ElementError::Unreadable(format!(
                        "Failed to open OSM file {}: {e}",
                        path.display()
                    ))
                })?;
                if is_gzip(path) {
                    Box::new(BufReader::new(GzDecoder::new(file)))
                } else {
                    Box::new(BufReader::new(file))
                }
            }
            Input::Memory(bytes) => Box::new(bytes.as_slice()),
        };
        Ok(XmlElements::new(input))
    }
}

/// Element being assembled from its child `tag` and `nd` entries
enum Pending {
    Node(NodeRecord),
    Way {
        way: WayRecord,
        /// First unparsable `nd` reference
        bad_ref: Option<String>,
    },
}

impl Pending {
    fn finish(self) -> ElementResult {
        match self {
            Pending::Node(node) => Ok(Element::Node(node)),
            Pending::Way { way, bad_ref: None } => Ok(Element::Way(way)),
            Pending::Way {
                way,
                bad_ref: Some(raw),
            } => Err(ElementError::MalformedWay {
                raw: format!("way {} has node reference '{raw}'", way.id),
            }),
        }
    }
}

/// Pull iterator over the elements of one XML document. Relations are skipped.
pub struct XmlElements<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: Option<Pending>,
    done: bool,
}

impl<R: BufRead> XmlElements<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            pending: None,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for XmlElements<R> {
    type Item = ElementResult;

    fn next(&mut self) -> Option<ElementResult> {
        while !self.done {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ElementError::Unreadable(format!(
                        "XML error at byte {}: {e}",
                        self.reader.buffer_position()
                    ))));
                }
            };

            let emitted = match event {
                Event::Start(tag) => open(&mut self.pending, &tag, false),
                Event::Empty(tag) => open(&mut self.pending, &tag, true),
                Event::End(tag) => match tag.name().as_ref() {
                    b"node" | b"way" => self.pending.take().map(Pending::finish),
                    _ => None,
                },
                Event::Eof => {
                    self.done = true;
                    None
                }
                _ => None,
            };
            if emitted.is_some() {
                return emitted;
            }
        }
        None
    }
}

/// Handle an opening tag. Returns an element once it is complete.
fn open(pending: &mut Option<Pending>, tag: &BytesStart<'_>, empty: bool) -> Option<ElementResult> {
    match tag.name().as_ref() {
        b"node" => {
            *pending = None;
            match parse_node(tag) {
                Ok(node) if empty => Some(Ok(Element::Node(node))),
                Ok(node) => {
                    *pending = Some(Pending::Node(node));
                    None
                }
                Err(e) => Some(Err(e)),
            }
        }
        b"way" => {
            *pending = None;
            let raw = attribute(tag, b"id").unwrap_or_default();
            let parsed = raw.trim().parse::<i64>();
            let Ok(id) = parsed else {
                return Some(Err(ElementError::MalformedWay {
                    raw: format!("way id '{raw}'"),
                }));
            };
            let way = Pending::Way {
                way: WayRecord {
                    id,
                    refs: Vec::new(),
                    tags: Vec::new(),
                },
                bad_ref: None,
            };
            if empty {
                return Some(way.finish());
            }
            *pending = Some(way);
            None
        }
        b"nd" => {
            if let Some(Pending::Way { way, bad_ref }) = pending {
                let raw = attribute(tag, b"ref").unwrap_or_default();
                match raw.trim().parse::<i64>() {
                    Ok(node) => way.refs.push(node),
                    Err(_) => {
                        bad_ref.get_or_insert(raw);
                    }
                }
            }
            None
        }
        b"tag" => {
            let (Some(key), Some(value)) = (attribute(tag, b"k"), attribute(tag, b"v")) else {
                return None;
            };
            match pending {
                Some(Pending::Node(node)) if key == "ele" => {
                    node.ele = value.trim().parse::<f64>().ok();
                }
                Some(Pending::Way { way, .. }) => way.tags.push((key, value)),
                _ => {}
            }
            None
        }
        _ => None,
    }
}

fn parse_node(tag: &BytesStart<'_>) -> Result<NodeRecord, ElementError> {
    let raw_id = attribute(tag, b"id").unwrap_or_default();
    let parsed = raw_id.trim().parse::<i64>();
    let id = match parsed {
        Ok(id) => id,
        Err(_) => return Err(ElementError::MalformedId { raw: raw_id }),
    };

    let lat = attribute(tag, b"lat").unwrap_or_default();
    let lon = attribute(tag, b"lon").unwrap_or_default();
    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(la), Ok(lo)) if valid_coordinate(la, lo) => Ok(NodeRecord {
            id,
            lat: la,
            lon: lo,
            ele: None,
        }),
        _ => Err(ElementError::MalformedCoordinate { id, lat, lon }),
    }
}

/// Unescaped value of the attribute `name`
fn attribute(tag: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}
