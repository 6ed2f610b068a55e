//! Lane connectivity by endpoint coincidence
//!
//! Lane A connects to lane B when A's left side ends at the node where B's
//! left side starts and the same holds on the right side, and both lanes
//! carry the same `left`/`right` role layout. Lanes are indexed by their head
//! node pair so each lane does one lookup instead of scanning every other
//! lane; candidates are visited in input order, so the edge list matches a
//! full pairwise scan exactly.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::diagnostics::{Diagnostics, Issue, Owner};
use crate::lanes::NormalizedLane;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityEdge {
    pub from_lane_id: i64,
    pub to_lane_id: i64,
    pub flow_type: String,
    pub from_turn_direction: Option<String>,
    pub to_turn_direction: Option<String>,
}

/// Lanes keyed by `(head(left), head(right))`, values in input order
type HeadIndex = FxHashMap<(i64, i64), Vec<usize>>;

fn roles_match(a: &NormalizedLane, b: &NormalizedLane) -> bool {
    a.group.left.role == b.group.left.role && a.group.right.role == b.group.right.role
}

fn build_head_index(lanes: &[NormalizedLane]) -> HeadIndex {
    let mut index = HeadIndex::default();
    for (i, lane) in lanes.iter().enumerate() {
        if !lane.group.has_side_roles() {
            continue;
        }
        if let Some(heads) = lane.heads() {
            index.entry(heads).or_default().push(i);
        }
    }
    index
}

fn edges_from(a: &NormalizedLane, lanes: &[NormalizedLane], index: &HeadIndex) -> Vec<ConnectivityEdge> {
    if !a.group.has_side_roles() {
        return Vec::new();
    }
    let Some(tails) = a.tails() else {
        return Vec::new();
    };
    let Some(candidates) = index.get(&tails) else {
        return Vec::new();
    };

    candidates
        .iter()
        .map(|&j| &lanes[j])
        .filter(|b| b.group.group_id != a.group.group_id && roles_match(a, b))
        .map(|b| ConnectivityEdge {
            from_lane_id: a.group.group_id,
            to_lane_id: b.group.group_id,
            flow_type: a.group.flow_type(),
            from_turn_direction: a.group.turn_direction.clone(),
            to_turn_direction: b.group.turn_direction.clone(),
        })
        .collect()
}

/// Build the directed lane adjacency.
///
/// With `parallel` the per-lane lookups run on the rayon pool; the result is
/// identical to the sequential path.
pub fn match_lanes(
    lanes: &[NormalizedLane],
    parallel: bool,
    diag: &mut Diagnostics,
) -> Vec<ConnectivityEdge> {
    for lane in lanes.iter().filter(|l| !l.group.has_side_roles()) {
        diag.report(Issue::StructuralInconsistency {
            owner: Owner::Relation(lane.group.group_id),
            detail: format!("roles '{}' never connect", lane.group.flow_type()),
        });
    }

    let index = build_head_index(lanes);

    let per_lane: Vec<Vec<ConnectivityEdge>> = if parallel {
        lanes
            .par_iter()
            .map(|a| edges_from(a, lanes, &index))
            .collect()
    } else {
        lanes.iter().map(|a| edges_from(a, lanes, &index)).collect()
    };

    per_lane.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::IssueKind;
    use crate::lanes::{LaneGroup, LaneSide, Orientation};
    use crate::model::Role;

    fn lane(id: i64, left: &[i64], right: &[i64]) -> NormalizedLane {
        NormalizedLane {
            group: LaneGroup {
                group_id: id,
                left: LaneSide {
                    way_id: id * 10,
                    role: Role::Left,
                },
                right: LaneSide {
                    way_id: id * 10 + 1,
                    role: Role::Right,
                },
                turn_direction: None,
                subtype: Some("road".to_string()),
            },
            left_nodes: left.to_vec(),
            right_nodes: right.to_vec(),
            orientation: Orientation::Aligned,
        }
    }

    /// Plain pairwise scan used as the reference for the indexed matcher
    fn pairwise(lanes: &[NormalizedLane]) -> Vec<(i64, i64)> {
        let mut out = Vec::new();
        for a in lanes {
            for b in lanes {
                if a.group.group_id == b.group.group_id
                    || !a.group.has_side_roles()
                    || !b.group.has_side_roles()
                    || !roles_match(a, b)
                {
                    continue;
                }
                if a.left_nodes.last() == b.left_nodes.first()
                    && a.right_nodes.last() == b.right_nodes.first()
                {
                    out.push((a.group.group_id, b.group.group_id));
                }
            }
        }
        out
    }

    fn ids(edges: &[ConnectivityEdge]) -> Vec<(i64, i64)> {
        edges.iter().map(|e| (e.from_lane_id, e.to_lane_id)).collect()
    }

    #[test]
    fn test_single_directed_edge() {
        let mut x = lane(1, &[1, 2], &[3, 4]);
        x.group.turn_direction = Some("straight".to_string());
        let y = lane(2, &[2, 5], &[4, 6]);
        let mut diag = Diagnostics::new();

        let edges = match_lanes(&[x, y], false, &mut diag);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_lane_id, 1);
        assert_eq!(edges[0].to_lane_id, 2);
        assert_eq!(edges[0].flow_type, "left&right");
        assert_eq!(edges[0].from_turn_direction.as_deref(), Some("straight"));
        assert_eq!(edges[0].to_turn_direction, None);
    }

    #[test]
    fn test_one_side_coincidence_is_not_enough() {
        let x = lane(1, &[1, 2], &[3, 4]);
        let y = lane(2, &[2, 5], &[9, 6]);
        let mut diag = Diagnostics::new();
        assert!(match_lanes(&[x, y], false, &mut diag).is_empty());
    }

    #[test]
    fn test_no_self_loops() {
        // closed lane whose tails equal its own heads
        let ring = lane(1, &[1, 2, 1], &[3, 4, 3]);
        let mut diag = Diagnostics::new();
        assert!(match_lanes(&[ring], false, &mut diag).is_empty());
    }

    #[test]
    fn test_role_layout_must_agree() {
        let x = lane(1, &[1, 2], &[3, 4]);
        let mut y = lane(2, &[2, 5], &[4, 6]);
        y.group.left.role = Role::Right;
        y.group.right.role = Role::Left;
        let mut diag = Diagnostics::new();
        assert!(match_lanes(&[x, y], false, &mut diag).is_empty());
    }

    #[test]
    fn test_unrecognized_roles_never_match() {
        let mut x = lane(1, &[1, 2], &[3, 4]);
        x.group.left.role = Role::Other("through".to_string());
        let mut y = lane(2, &[2, 5], &[4, 6]);
        y.group.left.role = Role::Other("through".to_string());
        let mut diag = Diagnostics::new();

        assert!(match_lanes(&[x, y], false, &mut diag).is_empty());
        assert_eq!(diag.count(IssueKind::StructuralInconsistency), 2);
    }

    #[test]
    fn test_matches_pairwise_scan_in_both_modes() {
        // fan-out, fan-in, a duplicate head pair and a disconnected lane
        let lanes = vec![
            lane(1, &[1, 2], &[3, 4]),
            lane(2, &[2, 5], &[4, 6]),
            lane(3, &[2, 7], &[4, 8]),
            lane(4, &[5, 9], &[6, 10]),
            lane(5, &[7, 9], &[8, 10]),
            lane(6, &[9, 1], &[10, 3]),
            lane(7, &[50, 51], &[52, 53]),
        ];
        let expected = pairwise(&lanes);
        assert_eq!(
            expected,
            vec![(1, 2), (1, 3), (2, 4), (3, 5), (4, 6), (5, 6), (6, 1)]
        );

        let mut diag = Diagnostics::new();
        assert_eq!(ids(&match_lanes(&lanes, false, &mut diag)), expected);
        assert_eq!(ids(&match_lanes(&lanes, true, &mut diag)), expected);
        assert!(diag.is_empty());
    }
}
