//! Typed identifiers for netlist entities.
//!
//! [`BlockId`] carries its architectural class as a tagged variant rather
//! than a string prefix; the textual form (`p12`, `r3`, `x0`, …) exists
//! only at the serialization boundary. [`NetId`] and [`ClusterId`] are
//! thin `u32` wrappers.

use crate::error::NetlistError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a net in the netlist.
    NetId
);

define_id!(
    /// Opaque, copyable ID for a block cluster.
    ClusterId
);

/// The architectural class of a block.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum BlockClass {
    /// A processing element (`p` prefix).
    Pe,
    /// A register (`r` prefix).
    Reg,
    /// A memory tile (`m` prefix).
    Memory,
    /// An I/O block (`i` prefix).
    Io,
    /// A reserved block class (`u` prefix).
    Reserved,
    /// A synthesized cluster-centroid pseudo-block (`x` prefix).
    Centroid,
}

impl BlockClass {
    /// Returns the single-character tag used in the textual form.
    pub fn tag(self) -> char {
        match self {
            BlockClass::Pe => 'p',
            BlockClass::Reg => 'r',
            BlockClass::Memory => 'm',
            BlockClass::Io => 'i',
            BlockClass::Reserved => 'u',
            BlockClass::Centroid => 'x',
        }
    }

    /// Parses a single-character tag. Hyperedge tags (`e`) are not block
    /// classes and return `None`; they are filtered by the embedding
    /// parser before blocks are constructed.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'p' => Some(BlockClass::Pe),
            'r' => Some(BlockClass::Reg),
            'm' => Some(BlockClass::Memory),
            'i' => Some(BlockClass::Io),
            'u' => Some(BlockClass::Reserved),
            'x' => Some(BlockClass::Centroid),
            _ => None,
        }
    }
}

/// A typed block identifier: architectural class plus index.
///
/// Serializes as its textual form (`"p12"`) so that placement maps keyed
/// by block render as ordinary JSON objects.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BlockId {
    class: BlockClass,
    index: u32,
}

impl BlockId {
    /// Creates a block ID from class and index.
    pub fn new(class: BlockClass, index: u32) -> Self {
        Self { class, index }
    }

    /// Creates a processing-element block ID.
    pub fn pe(index: u32) -> Self {
        Self::new(BlockClass::Pe, index)
    }

    /// Creates a register block ID.
    pub fn reg(index: u32) -> Self {
        Self::new(BlockClass::Reg, index)
    }

    /// Creates a memory block ID.
    pub fn memory(index: u32) -> Self {
        Self::new(BlockClass::Memory, index)
    }

    /// Creates an I/O block ID.
    pub fn io(index: u32) -> Self {
        Self::new(BlockClass::Io, index)
    }

    /// Creates the centroid pseudo-block for a cluster.
    pub fn centroid(cluster: ClusterId) -> Self {
        Self::new(BlockClass::Centroid, cluster.as_raw())
    }

    /// Returns the architectural class of this block.
    pub fn class(self) -> BlockClass {
        self.class
    }

    /// Returns the index within the class.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns whether this is a processing element.
    pub fn is_pe(self) -> bool {
        self.class == BlockClass::Pe
    }

    /// Returns whether this is a register.
    pub fn is_reg(self) -> bool {
        self.class == BlockClass::Reg
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.class.tag(), self.index)
    }
}

impl FromStr for BlockId {
    type Err = NetlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let tag = chars
            .next()
            .ok_or_else(|| NetlistError::InvalidBlockId(s.to_string()))?;
        let class =
            BlockClass::from_tag(tag).ok_or_else(|| NetlistError::InvalidBlockId(s.to_string()))?;
        let index: u32 = chars
            .as_str()
            .parse()
            .map_err(|_| NetlistError::InvalidBlockId(s.to_string()))?;
        Ok(Self { class, index })
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn parse_and_display_roundtrip() {
        for text in ["p0", "r17", "m2", "i9", "u1", "x4"] {
            let id: BlockId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn hyperedge_is_not_a_block() {
        assert!("e5".parse::<BlockId>().is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!("".parse::<BlockId>().is_err());
        assert!("p".parse::<BlockId>().is_err());
        assert!("q12".parse::<BlockId>().is_err());
        assert!("p1x".parse::<BlockId>().is_err());
    }

    #[test]
    fn class_predicates() {
        assert!(BlockId::pe(0).is_pe());
        assert!(!BlockId::pe(0).is_reg());
        assert!(BlockId::reg(0).is_reg());
        assert_eq!(BlockId::centroid(ClusterId::from_raw(3)).class(), BlockClass::Centroid);
    }

    #[test]
    fn ordering_is_deterministic() {
        let mut set = BTreeSet::new();
        set.insert(BlockId::reg(1));
        set.insert(BlockId::pe(2));
        set.insert(BlockId::pe(1));
        let order: Vec<_> = set.into_iter().collect();
        assert_eq!(order, vec![BlockId::pe(1), BlockId::pe(2), BlockId::reg(1)]);
    }

    #[test]
    fn block_id_serializes_as_string() {
        let id = BlockId::pe(12);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p12\"");
        let restored: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }

    #[test]
    fn block_id_works_as_json_map_key() {
        use cgra_common::Pos;
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(BlockId::pe(0), Pos::new(1, 2));
        let json = serde_json::to_string(&map).unwrap();
        let restored: BTreeMap<BlockId, Pos> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored[&BlockId::pe(0)], Pos::new(1, 2));
    }

    #[test]
    fn net_and_cluster_ids() {
        let n = NetId::from_raw(7);
        assert_eq!(n.as_raw(), 7);
        assert_eq!(format!("{n}"), "7");
        let c = ClusterId::from_raw(3);
        assert_eq!(format!("{c}"), "3");
    }
}
