//! Shared fixtures for the test modules: annotated sequences described as JSON literals.

use crate::{AnnotatedSequence, DepEdge, MatchStream};
use serde_json::Value;

/// Build an [AnnotatedSequence] from a JSON description:
///
/// ```json
/// {
///   "text": "Rita bought an apple",
///   "layers": { "pos": ["NNP", "VBD", "DT", "NN"] },
///   "edges": [[1, 0, "nsubj"], [1, 3, "obj"]]
/// }
/// ```
///
/// A layer entry may be a single tag, an array of tags, or the empty string for none.
pub(crate) fn sequence(description: &str) -> AnnotatedSequence {
    let value: Value = serde_json::from_str(description).unwrap();
    let text = value["text"].as_str().unwrap();
    let mut seq = AnnotatedSequence::from_text(text);
    if let Some(layers) = value["layers"].as_object() {
        for (name, entries) in layers {
            let tags: Vec<Vec<String>> = entries
                .as_array()
                .unwrap()
                .iter()
                .map(|entry| match entry {
                    Value::String(tag) if tag.is_empty() => Vec::new(),
                    Value::String(tag) => vec![tag.clone()],
                    Value::Array(tags) => tags
                        .iter()
                        .map(|tag| tag.as_str().unwrap().to_string())
                        .collect(),
                    _ => Vec::new(),
                })
                .collect();
            seq = seq.with_layer(name, tags).unwrap();
        }
    }
    if let Some(edges) = value["edges"].as_array() {
        let edges: Vec<DepEdge> = edges
            .iter()
            .map(|edge| DepEdge {
                parent: edge[0].as_u64().unwrap() as usize,
                child: edge[1].as_u64().unwrap() as usize,
                label: edge[2].as_str().unwrap().to_string(),
            })
            .collect();
        seq = seq.with_edges(edges).unwrap();
    }
    seq
}

/// Normalized extents of a stream, in stream order.
pub(crate) fn extents(stream: MatchStream) -> Vec<(usize, usize)> {
    stream.map(|m| m.extent()).collect()
}

/// Raw `(begin, end)` endpoint pairs of a stream, in stream order.
pub(crate) fn endpoints(stream: MatchStream) -> Vec<(usize, usize)> {
    stream.map(|m| (m.begin, m.end)).collect()
}
