//! Error types for netlist construction and embedding parsing.

use crate::ids::{BlockId, NetId};

/// Errors that can occur while building a netlist or reading an
/// embedding file.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// A textual block identifier did not match `<tag><index>`.
    #[error("invalid block id '{0}'")]
    InvalidBlockId(String),

    /// The same block appeared twice in one net.
    #[error("block {block} appears more than once in net {net}")]
    DuplicateBlock {
        /// The net containing the duplicate.
        net: NetId,
        /// The duplicated block.
        block: BlockId,
    },

    /// An embedding record's dimension disagreed with the first record.
    #[error("embedding record '{id}' has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        /// The offending record's identifier.
        id: String,
        /// Number of values found in the record.
        found: usize,
        /// Dimension established by the first record.
        expected: usize,
    },

    /// An embedding value could not be parsed as a float.
    #[error("malformed embedding value '{0}'")]
    MalformedValue(String),

    /// An I/O error occurred while reading an embedding file.
    #[error("failed to read embedding: {0}")]
    Io(#[from] std::io::Error),
}
