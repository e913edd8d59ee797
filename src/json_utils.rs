use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

// Model output is treated as mixed content: prose around one or more JSON values.

/// Type of a JSON node found by the structure scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Object,
    Array,
}

/// Coordinates of a JSON structure within a larger text, including nested children.
#[derive(Debug, Clone)]
pub struct ObjCoords {
    pub start: usize,
    pub end: usize, // inclusive index of the closing bracket/brace
    pub kind: NodeType,
    pub children: Vec<ObjCoords>,
}

impl ObjCoords {
    pub fn new(start: usize, end: usize, kind: NodeType, children: Vec<ObjCoords>) -> Self {
        Self { start, end, kind, children }
    }

    /// The text covered by this node.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

#[derive(Debug)]
struct Frame {
    start: usize,
    kind: NodeType,
    children: Vec<ObjCoords>,
}

/// Find all JSON object/array structures in the given text. Coordinates are byte indices.
#[instrument(target = "quiz_forge::json", skip(text), fields(text_len = text.len()))]
pub fn find_json_structures(text: &str) -> Vec<ObjCoords> {
    let bytes = text.as_bytes();
    let mut results: Vec<ObjCoords> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let closing = match b {
            b'"' => {
                in_string = true;
                continue;
            }
            b'{' => {
                stack.push(Frame { start: i, kind: NodeType::Object, children: Vec::new() });
                continue;
            }
            b'[' => {
                stack.push(Frame { start: i, kind: NodeType::Array, children: Vec::new() });
                continue;
            }
            b'}' => NodeType::Object,
            b']' => NodeType::Array,
            _ => continue,
        };

        // Unbalanced closers drop the open frame
        if let Some(frame) = stack.pop() {
            if frame.kind == closing {
                let node = ObjCoords::new(frame.start, i, closing, frame.children);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => results.push(node),
                }
            }
        }
    }

    debug!(target: "quiz_forge::json", count = results.len(), "found root structures");
    results
}

/// Why no `T` could be pulled out of a text.
#[derive(Debug)]
pub enum ExtractFailure {
    /// The text holds no JSON object at all.
    NoJson,
    /// Objects were found but none matched `T`; carries the error of the first root object.
    Mismatch(serde_json::Error),
}

/// Attempt to deserialize an object node; if it fails, recursively try its object children.
fn descend_first<T: DeserializeOwned>(text: &str, node: &ObjCoords) -> Option<T> {
    if node.kind == NodeType::Object {
        if let Ok(parsed) = serde_json::from_str::<T>(node.slice(text)) {
            return Some(parsed);
        }
    }
    node.children.iter().find_map(|child| descend_first(text, child))
}

/// Extract the first JSON object in `text` (searching roots in order, then their
/// nested objects) that deserializes into `T`.
#[instrument(target = "quiz_forge::json", skip(text), fields(text_len = text.len()))]
pub fn extract_first<T: DeserializeOwned>(text: &str) -> Result<T, ExtractFailure> {
    let roots = find_json_structures(text);

    if let Some(found) = roots.iter().find_map(|root| descend_first::<T>(text, root)) {
        return Ok(found);
    }

    let first_object = roots.iter().find(|root| root.kind == NodeType::Object)
        .or_else(|| roots.first());
    match first_object {
        None => Err(ExtractFailure::NoJson),
        Some(root) => match serde_json::from_str::<T>(root.slice(text)) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                debug!(target: "quiz_forge::json", error = %e, "no root matched the requested type");
                Err(ExtractFailure::Mismatch(e))
            }
        },
    }
}
