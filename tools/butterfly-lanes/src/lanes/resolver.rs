//! Lane group extraction from lane relations

use crate::diagnostics::{Diagnostics, Issue, Owner};
use crate::model::{Relation, Role, ROAD_SUBTYPE, SUBTYPE_TAG, TURN_DIRECTION_TAG};
use crate::store::EntityStore;

/// One boundary of a lane: the way and the role it was given in the relation
#[derive(Debug, Clone, PartialEq)]
pub struct LaneSide {
    pub way_id: i64,
    pub role: Role,
}

/// A lane bounded by two ways, taken from the first two way members of a relation
#[derive(Debug, Clone, PartialEq)]
pub struct LaneGroup {
    pub group_id: i64,
    pub left: LaneSide,
    pub right: LaneSide,
    pub turn_direction: Option<String>,
    pub subtype: Option<String>,
}

impl LaneGroup {
    /// Member roles joined with `&`, e.g. `left&right`
    pub fn flow_type(&self) -> String {
        format!("{}&{}", self.left.role, self.right.role)
    }

    /// Both roles are `left`/`right`; anything else never connects
    pub fn has_side_roles(&self) -> bool {
        self.left.role.is_side() && self.right.role.is_side()
    }
}

/// Resolve every relation of the store, in input order
pub fn resolve_lane_groups(store: &EntityStore, diag: &mut Diagnostics) -> Vec<LaneGroup> {
    store
        .relations()
        .iter()
        .filter_map(|rel| match resolve_relation(store, rel) {
            Ok(group) => Some(group),
            Err(issue) => {
                diag.report(issue);
                None
            }
        })
        .collect()
}

fn resolve_relation(store: &EntityStore, rel: &Relation) -> Result<LaneGroup, Issue> {
    let subtype = rel.tag(SUBTYPE_TAG);
    if let Some(subtype) = subtype {
        if subtype != ROAD_SUBTYPE {
            return Err(Issue::MalformedGroup {
                relation_id: rel.id,
                reason: format!("subtype '{subtype}'"),
            });
        }
    }

    let mut ways = rel.way_members();
    let (first, second) = match (ways.next(), ways.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(Issue::MalformedGroup {
                relation_id: rel.id,
                reason: "fewer than two way members".to_string(),
            })
        }
    };

    if first.ref_id == second.ref_id {
        return Err(Issue::StructuralInconsistency {
            owner: Owner::Relation(rel.id),
            detail: format!("both lane sides reference way {}", first.ref_id),
        });
    }

    for member in [first, second] {
        let way = store.way(member.ref_id).ok_or(Issue::MissingReference {
            owner: Owner::Relation(rel.id),
            missing: Owner::Way(member.ref_id),
        })?;
        if !way.has_geometry() {
            return Err(Issue::DegenerateGeometry {
                owner: Owner::Relation(rel.id),
                reason: format!("way {} has {} node(s)", way.id, way.node_ids.len()),
            });
        }
    }

    Ok(LaneGroup {
        group_id: rel.id,
        left: LaneSide {
            way_id: first.ref_id,
            role: first.role.clone(),
        },
        right: LaneSide {
            way_id: second.ref_id,
            role: second.role.clone(),
        },
        turn_direction: rel.tag(TURN_DIRECTION_TAG).map(str::to_string),
        subtype: subtype.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::IssueKind;
    use crate::model::{Member, MemberKind};
    use crate::store::fixtures::*;

    fn store_with(relations: Vec<Relation>) -> (EntityStore, Diagnostics) {
        let mut diag = Diagnostics::new();
        let store = EntityStore::new(
            vec![
                point(1, 0.0, 0.0),
                point(2, 10.0, 0.0),
                point(3, 0.0, 5.0),
                point(4, 10.0, 5.0),
            ],
            vec![way(10, &[1, 2]), way(11, &[3, 4]), way(12, &[1])],
            relations,
            &mut diag,
        );
        (store, diag)
    }

    #[test]
    fn test_resolves_left_right_pair() {
        let mut rel = lane(100, 10, 11);
        rel.tags
            .insert("turn_direction".to_string(), "left".to_string());
        let (store, mut diag) = store_with(vec![rel]);

        let groups = resolve_lane_groups(&store, &mut diag);
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!((g.left.way_id, g.right.way_id), (10, 11));
        assert_eq!(g.flow_type(), "left&right");
        assert_eq!(g.turn_direction.as_deref(), Some("left"));
        assert_eq!(g.subtype.as_deref(), Some("road"));
        assert!(diag.is_empty());
    }

    #[test]
    fn test_missing_turn_direction_is_not_an_issue() {
        let (store, mut diag) = store_with(vec![lane(100, 10, 11)]);
        let groups = resolve_lane_groups(&store, &mut diag);
        assert_eq!(groups[0].turn_direction, None);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_single_way_member_is_rejected() {
        let mut rel = lane(100, 10, 11);
        rel.members.truncate(1);
        let (store, mut diag) = store_with(vec![rel]);

        assert!(resolve_lane_groups(&store, &mut diag).is_empty());
        assert_eq!(diag.count(IssueKind::MalformedGroup), 1);
    }

    #[test]
    fn test_non_road_subtype_is_rejected() {
        let mut rel = lane(100, 10, 11);
        rel.tags
            .insert("subtype".to_string(), "crosswalk".to_string());
        let (store, mut diag) = store_with(vec![rel]);

        assert!(resolve_lane_groups(&store, &mut diag).is_empty());
        assert_eq!(diag.count(IssueKind::MalformedGroup), 1);
    }

    #[test]
    fn test_absent_subtype_is_accepted() {
        let mut rel = lane(100, 10, 11);
        rel.tags.clear();
        let (store, mut diag) = store_with(vec![rel]);
        let groups = resolve_lane_groups(&store, &mut diag);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].subtype, None);
    }

    #[test]
    fn test_non_way_members_are_skipped_positionally() {
        let mut rel = lane(100, 10, 11);
        rel.members.insert(
            0,
            Member {
                kind: MemberKind::Node,
                ref_id: 1,
                role: Role::Other("regulatory".to_string()),
            },
        );
        let (store, mut diag) = store_with(vec![rel]);
        let groups = resolve_lane_groups(&store, &mut diag);
        assert_eq!(groups[0].left.way_id, 10);
        assert_eq!(groups[0].right.way_id, 11);
    }

    #[test]
    fn test_missing_or_short_ways_are_rejected() {
        let (store, mut diag) = store_with(vec![lane(100, 10, 99), lane(101, 10, 12)]);
        assert!(resolve_lane_groups(&store, &mut diag).is_empty());
        assert_eq!(diag.count(IssueKind::MissingReference), 1);
        assert_eq!(diag.count(IssueKind::DegenerateGeometry), 1);
    }

    #[test]
    fn test_same_way_on_both_sides_is_rejected() {
        let (store, mut diag) = store_with(vec![lane(100, 10, 10)]);
        assert!(resolve_lane_groups(&store, &mut diag).is_empty());
        assert_eq!(diag.count(IssueKind::StructuralInconsistency), 1);
    }
}
