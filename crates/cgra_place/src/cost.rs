//! Energy evaluation shared by the placers.

use crate::error::PlaceError;
use cgra_common::Pos;
use cgra_netlist::{total_hpwl, BlockId, Netlist};
use std::collections::BTreeMap;

/// Merges pinned positions with a movable assignment into a scratch map.
///
/// The pinned map is never mutated; every energy evaluation works on its
/// own copy so prefixed positions stay immutable for the whole run.
pub(crate) fn merged_positions(
    pinned: &BTreeMap<BlockId, Pos>,
    movable: impl IntoIterator<Item = (BlockId, Pos)>,
) -> BTreeMap<BlockId, Pos> {
    let mut merged = pinned.clone();
    for (block, pos) in movable {
        merged.insert(block, pos);
    }
    merged
}

/// Sums the HPWL of every net as an annealing energy.
///
/// Placer constructors validate that every net member is either movable
/// or pinned, so a missing position here is a programming error and
/// fails fast.
pub(crate) fn wirelength(netlist: &Netlist, positions: &BTreeMap<BlockId, Pos>) -> f64 {
    match total_hpwl(netlist, positions) {
        Ok(total) => total as f64,
        Err(err) => panic!("{err}"),
    }
}

/// Checks that every net member satisfies `known`, returning the first
/// offender as [`PlaceError::MissingBlock`].
pub(crate) fn check_coverage(
    netlist: &Netlist,
    known: impl Fn(BlockId) -> bool,
) -> Result<(), PlaceError> {
    for (_net, members) in netlist.iter() {
        for &block in members {
            if !known(block) {
                return Err(PlaceError::MissingBlock(block));
            }
        }
    }
    Ok(())
}
