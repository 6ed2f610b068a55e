//! Read-only indexed view over the map entities
//!
//! Built once per run. Deleted entities are dropped in a single filtering
//! pass before anything is indexed, so no downstream component can see them.

use rustc_hash::FxHashMap;

use crate::diagnostics::{Diagnostics, Issue, Owner};
use crate::model::{Coord, Point, Relation, Way};

#[derive(Debug, Default)]
pub struct EntityStore {
    points: Vec<Point>,
    ways: Vec<Way>,
    relations: Vec<Relation>,
    point_index: FxHashMap<i64, usize>,
    way_index: FxHashMap<i64, usize>,
    relation_index: FxHashMap<i64, usize>,
}

/// Keep the first entity for each id, report later duplicates
fn index_unique<T>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> i64,
    owner_of: impl Fn(i64) -> Owner,
    diag: &mut Diagnostics,
) -> (Vec<T>, FxHashMap<i64, usize>) {
    let mut kept = Vec::with_capacity(items.len());
    let mut index = FxHashMap::with_capacity_and_hasher(items.len(), Default::default());

    for item in items {
        let id = id_of(&item);
        if index.contains_key(&id) {
            diag.report(Issue::StructuralInconsistency {
                owner: owner_of(id),
                detail: "duplicate id, keeping the first occurrence".to_string(),
            });
            continue;
        }
        index.insert(id, kept.len());
        kept.push(item);
    }

    (kept, index)
}

impl EntityStore {
    pub fn new(
        points: Vec<Point>,
        ways: Vec<Way>,
        relations: Vec<Relation>,
        diag: &mut Diagnostics,
    ) -> Self {
        let points: Vec<Point> = points.into_iter().filter(|p| !p.action.is_delete()).collect();
        let ways: Vec<Way> = ways.into_iter().filter(|w| !w.action.is_delete()).collect();
        let relations: Vec<Relation> = relations
            .into_iter()
            .filter(|r| !r.action.is_delete())
            .collect();

        let (points, point_index) = index_unique(points, |p| p.id, Owner::Node, diag);
        let (ways, way_index) = index_unique(ways, |w| w.id, Owner::Way, diag);
        let (relations, relation_index) =
            index_unique(relations, |r| r.id, Owner::Relation, diag);

        Self {
            points,
            ways,
            relations,
            point_index,
            way_index,
            relation_index,
        }
    }

    pub fn point(&self, id: i64) -> Option<&Point> {
        self.point_index.get(&id).map(|&i| &self.points[i])
    }

    pub fn way(&self, id: i64) -> Option<&Way> {
        self.way_index.get(&id).map(|&i| &self.ways[i])
    }

    pub fn relation(&self, id: i64) -> Option<&Relation> {
        self.relation_index.get(&id).map(|&i| &self.relations[i])
    }

    pub fn coord(&self, node_id: i64) -> Option<Coord> {
        self.point(node_id).map(|p| p.coord)
    }

    /// Points in input order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Ways in input order
    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    /// Relations in input order
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::{Action, Coord, Member, MemberKind, Point, Relation, Role, Tags, Way};

    pub fn point(id: i64, x: f64, y: f64) -> Point {
        Point {
            id,
            coord: Coord::new(x, y),
            tags: Tags::new(),
            action: Action::None,
        }
    }

    pub fn way(id: i64, node_ids: &[i64]) -> Way {
        Way {
            id,
            node_ids: node_ids.to_vec(),
            tags: Tags::new(),
            action: Action::None,
            visible: Some(true),
            version: Some(1),
        }
    }

    pub fn lane(id: i64, left: i64, right: i64) -> Relation {
        let mut tags = Tags::new();
        tags.insert("subtype".to_string(), "road".to_string());
        Relation {
            id,
            members: vec![
                Member {
                    kind: MemberKind::Way,
                    ref_id: left,
                    role: Role::Left,
                },
                Member {
                    kind: MemberKind::Way,
                    ref_id: right,
                    role: Role::Right,
                },
            ],
            tags,
            action: Action::None,
        }
    }
}
