//! Orientation normalization for the two sides of a lane
//!
//! Lane flow follows the `left`-role way. The other side is reversed when the
//! first segments of both sides point in opposite directions (negative dot
//! product). Only a working copy of the node ids is reversed; the stored way
//! is untouched.

use crate::diagnostics::{Diagnostics, Issue, Owner};
use crate::lanes::resolver::LaneGroup;
use crate::model::{Coord, Role};
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Both sides already advance together
    Aligned,
    /// The non-reference side was reversed
    Reversed,
    /// A first-segment node is missing; input order kept
    Unresolved,
}

/// Which side the flow direction is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLane {
    pub group: LaneGroup,
    pub left_nodes: Vec<i64>,
    pub right_nodes: Vec<i64>,
    pub orientation: Orientation,
}

impl NormalizedLane {
    /// Flow arrows walk both sides in lock-step, which needs matching node counts
    pub fn sides_match(&self) -> bool {
        self.left_nodes.len() == self.right_nodes.len()
    }

    pub fn heads(&self) -> Option<(i64, i64)> {
        Some((*self.left_nodes.first()?, *self.right_nodes.first()?))
    }

    pub fn tails(&self) -> Option<(i64, i64)> {
        Some((*self.left_nodes.last()?, *self.right_nodes.last()?))
    }
}

/// The positional second member is the reference only for a `right, left` relation
pub fn reference_side(group: &LaneGroup) -> ReferenceSide {
    match (&group.left.role, &group.right.role) {
        (Role::Right, Role::Left) => ReferenceSide::Right,
        _ => ReferenceSide::Left,
    }
}

/// Direction of the first segment; a missing node is returned as the error
fn first_direction(store: &EntityStore, nodes: &[i64]) -> Result<Coord, i64> {
    let (a, b) = match nodes {
        [a, b, ..] => (*a, *b),
        // Resolver guarantees two nodes; treat anything shorter as zero-length
        _ => return Ok(Coord::new(0.0, 0.0)),
    };
    let pa = store.coord(a).ok_or(a)?;
    let pb = store.coord(b).ok_or(b)?;
    Ok(pa.to(pb))
}

/// True when `other` runs against `reference`.
///
/// Zero-length first segments give a zero dot product and count as aligned.
pub fn runs_against(store: &EntityStore, reference: &[i64], other: &[i64]) -> Result<bool, i64> {
    let r = first_direction(store, reference)?;
    let o = first_direction(store, other)?;
    Ok(r.dot(o) < 0.0)
}

/// Normalize a single lane. Returns `None` only if a side's way vanished.
pub fn normalize_lane(
    store: &EntityStore,
    group: &LaneGroup,
    diag: &mut Diagnostics,
) -> Option<NormalizedLane> {
    let mut sides = Vec::with_capacity(2);
    for way_id in [group.left.way_id, group.right.way_id] {
        match store.way(way_id) {
            Some(way) => sides.push(way.node_ids.clone()),
            None => {
                diag.report(Issue::MissingReference {
                    owner: Owner::Relation(group.group_id),
                    missing: Owner::Way(way_id),
                });
                return None;
            }
        }
    }
    let mut right_nodes = sides.pop()?;
    let mut left_nodes = sides.pop()?;

    let (reference, other) = match reference_side(group) {
        ReferenceSide::Left => (&left_nodes, &mut right_nodes),
        ReferenceSide::Right => (&right_nodes, &mut left_nodes),
    };

    let orientation = match runs_against(store, reference, other) {
        Ok(true) => {
            other.reverse();
            Orientation::Reversed
        }
        Ok(false) => Orientation::Aligned,
        Err(node_id) => {
            diag.report(Issue::MissingReference {
                owner: Owner::Relation(group.group_id),
                missing: Owner::Node(node_id),
            });
            Orientation::Unresolved
        }
    };

    Some(NormalizedLane {
        group: group.clone(),
        left_nodes,
        right_nodes,
        orientation,
    })
}

/// Normalize all lane groups, preserving their order
pub fn normalize_lanes(
    store: &EntityStore,
    groups: &[LaneGroup],
    diag: &mut Diagnostics,
) -> Vec<NormalizedLane> {
    groups
        .iter()
        .filter_map(|g| normalize_lane(store, g, diag))
        .collect()
}
