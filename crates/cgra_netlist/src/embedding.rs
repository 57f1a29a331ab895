//! Reader for metapath2vec embedding files.
//!
//! The upstream clustering flow trains an embedding whose records are
//! `<id> <f1> <f2> … <fD>`, whitespace-separated, preceded by two header
//! lines. Hyperedge records (IDs starting with `e`) can be filtered out,
//! leaving only block vectors.

use crate::error::NetlistError;
use std::collections::BTreeMap;
use std::path::Path;

/// A parsed embedding: the vector dimension plus one vector per record ID.
///
/// Record IDs stay textual here because hyperedge IDs are not block IDs;
/// callers that want typed blocks parse the keys after filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// Dimension of every vector, established by the first record.
    pub dimension: usize,
    /// Vectors keyed by record ID.
    pub vectors: BTreeMap<String, Vec<f64>>,
}

/// Reads and parses an embedding file.
pub fn parse_embedding(path: &Path, filter_hyperedges: bool) -> Result<Embedding, NetlistError> {
    let content = std::fs::read_to_string(path)?;
    parse_embedding_str(&content, filter_hyperedges)
}

/// Parses embedding text.
///
/// The first two lines are headers and ignored; blank lines are skipped.
/// Every record must carry the same number of values as the first one.
pub fn parse_embedding_str(
    content: &str,
    filter_hyperedges: bool,
) -> Result<Embedding, NetlistError> {
    let mut dimension = 0usize;
    let mut vectors = BTreeMap::new();
    for line in content.lines().skip(2) {
        let mut fields = line.split_whitespace();
        let id = match fields.next() {
            Some(id) => id,
            None => continue,
        };
        let values: Vec<&str> = fields.collect();
        if dimension == 0 {
            dimension = values.len();
        } else if values.len() != dimension {
            return Err(NetlistError::DimensionMismatch {
                id: id.to_string(),
                found: values.len(),
                expected: dimension,
            });
        }
        if filter_hyperedges && id.starts_with('e') {
            continue;
        }
        let parsed: Result<Vec<f64>, _> = values
            .iter()
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| NetlistError::MalformedValue(v.to_string()))
            })
            .collect();
        vectors.insert(id.to_string(), parsed?);
    }
    Ok(Embedding { dimension, vectors })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
5 4
header ignored
p0 0.5 1.0 -0.25 2.0
p1 1.5 0.0 0.75 -1.0
e0 9.0 9.0 9.0 9.0
r0 0.0 0.0 0.0 1.0
";

    #[test]
    fn parses_records_and_dimension() {
        let emb = parse_embedding_str(SAMPLE, false).unwrap();
        assert_eq!(emb.dimension, 4);
        assert_eq!(emb.vectors.len(), 4);
        assert_eq!(emb.vectors["p0"], vec![0.5, 1.0, -0.25, 2.0]);
    }

    #[test]
    fn hyperedges_filtered_on_request() {
        let emb = parse_embedding_str(SAMPLE, true).unwrap();
        assert!(!emb.vectors.contains_key("e0"));
        assert_eq!(emb.vectors.len(), 3);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let bad = "h1\nh2\np0 1.0 2.0\np1 1.0 2.0 3.0\n";
        let err = parse_embedding_str(bad, true).unwrap_err();
        assert!(matches!(err, NetlistError::DimensionMismatch { .. }));
    }

    #[test]
    fn malformed_value_rejected() {
        let bad = "h1\nh2\np0 1.0 abc\n";
        let err = parse_embedding_str(bad, true).unwrap_err();
        assert!(matches!(err, NetlistError::MalformedValue(_)));
    }

    #[test]
    fn short_file_is_empty() {
        let emb = parse_embedding_str("only one line\n", true).unwrap();
        assert_eq!(emb.dimension, 0);
        assert!(emb.vectors.is_empty());
    }

    #[test]
    fn blank_lines_skipped() {
        let text = "h1\nh2\n\np0 1.0\n\n";
        let emb = parse_embedding_str(text, true).unwrap();
        assert_eq!(emb.vectors.len(), 1);
    }
}
