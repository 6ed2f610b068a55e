//! JSON entity snapshot reader
//!
//! The snapshot is an already-materialized dump of the map entities (nodes,
//! ways, relations) as produced by the map editor export. Members may be
//! given as objects or in the delimited `type/ref/role` form.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use butterfly_common::{suggest_correction, Error, Result};
use serde::Deserialize;

use crate::diagnostics::{Diagnostics, Issue, Owner};
use crate::model::{Action, Coord, Member, MemberKind, Point, Relation, Role, Tags, Way};
use crate::store::EntityStore;

/// Tags carrying editor-local coordinates when `x`/`y` are absent
const LOCAL_X_TAG: &str = "local_x";
const LOCAL_Y_TAG: &str = "local_y";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub nodes: Vec<NodeRecord>,
    pub ways: Vec<WayRecord>,
    pub relations: Vec<RelationRecord>,
}

#[derive(Debug, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct WayRecord {
    pub id: i64,
    #[serde(default)]
    pub nodes: Vec<i64>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub version: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RelationRecord {
    pub id: i64,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MemberRecord {
    Encoded(String),
    Structured {
        #[serde(rename = "type")]
        kind: String,
        #[serde(rename = "ref")]
        ref_id: i64,
        #[serde(default)]
        role: String,
    },
}

fn parse_action(raw: &str, owner: Owner) -> Result<Action> {
    Action::parse(raw)
        .ok_or_else(|| Error::InvalidInput(format!("{owner}: unknown action '{raw}'")))
}

fn tag_coord(tags: &Tags, key: &str) -> Option<f64> {
    tags.get(key).and_then(|v| v.trim().parse::<f64>().ok())
}

impl Snapshot {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| Error::ParseError(format!("snapshot: {e}")))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::ParseError(format!("snapshot: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Convert into model entities and build the store.
    ///
    /// Unknown `action` values are fatal; everything else that cannot be used
    /// is reported and dropped.
    pub fn into_store(self, diag: &mut Diagnostics) -> Result<EntityStore> {
        let mut points = Vec::with_capacity(self.nodes.len());
        for rec in self.nodes {
            let action = parse_action(&rec.action, Owner::Node(rec.id))?;
            let x = rec.x.or_else(|| tag_coord(&rec.tags, LOCAL_X_TAG));
            let y = rec.y.or_else(|| tag_coord(&rec.tags, LOCAL_Y_TAG));
            let (Some(x), Some(y)) = (x, y) else {
                if !action.is_delete() {
                    diag.report(Issue::DegenerateGeometry {
                        owner: Owner::Node(rec.id),
                        reason: "no coordinates".to_string(),
                    });
                }
                continue;
            };
            points.push(Point {
                id: rec.id,
                coord: Coord::new(x, y),
                tags: rec.tags,
                action,
            });
        }

        let mut ways = Vec::with_capacity(self.ways.len());
        for rec in self.ways {
            ways.push(Way {
                id: rec.id,
                action: parse_action(&rec.action, Owner::Way(rec.id))?,
                node_ids: rec.nodes,
                tags: rec.tags,
                visible: rec.visible,
                version: rec.version,
            });
        }

        let mut relations = Vec::with_capacity(self.relations.len());
        for rec in self.relations {
            let owner = Owner::Relation(rec.id);
            let action = parse_action(&rec.action, owner)?;
            let members = rec
                .members
                .into_iter()
                .filter_map(|m| decode_member(m, owner, diag))
                .collect();
            relations.push(Relation {
                id: rec.id,
                members,
                tags: rec.tags,
                action,
            });
        }

        Ok(EntityStore::new(points, ways, relations, diag))
    }
}

fn decode_member(record: MemberRecord, owner: Owner, diag: &mut Diagnostics) -> Option<Member> {
    let member = match record {
        MemberRecord::Encoded(raw) => match raw.parse::<Member>() {
            Ok(member) => member,
            Err(e) => {
                diag.report(Issue::StructuralInconsistency {
                    owner,
                    detail: e.to_string(),
                });
                return None;
            }
        },
        MemberRecord::Structured { kind, ref_id, role } => {
            let Some(kind) = MemberKind::parse(&kind) else {
                diag.report(Issue::StructuralInconsistency {
                    owner,
                    detail: format!("unknown member type '{kind}'"),
                });
                return None;
            };
            Member {
                kind,
                ref_id,
                role: Role::parse(&role),
            }
        }
    };

    if member.kind == MemberKind::Way {
        if let Role::Other(role) = &member.role {
            if let Some(suggestion) = suggest_correction(role, &Role::KNOWN) {
                diag.report(Issue::StructuralInconsistency {
                    owner,
                    detail: format!("way {} has role '{role}', did you mean '{suggestion}'?", member.ref_id),
                });
            }
        }
    }

    Some(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::IssueKind;

    const SNAPSHOT: &str = r#"{
        "nodes": [
            {"id": 1, "x": 0.0, "y": 0.0},
            {"id": 2, "tags": {"local_x": "10.5", "local_y": "0"}, "action": "modify"},
            {"id": 3, "x": 1.0, "y": 1.0, "action": "delete"},
            {"id": 4}
        ],
        "ways": [
            {"id": 10, "nodes": [1, 2], "visible": true, "version": 2},
            {"id": 11, "nodes": [2, 1], "action": "delete"}
        ],
        "relations": [
            {"id": 100,
             "members": [{"type": "way", "ref": 10, "role": "left"}, "way/11/rigth", "node/1/stop", "bogus"],
             "tags": {"subtype": "road", "turn_direction": "straight"}}
        ]
    }"#;

    #[test]
    fn test_snapshot_into_store() {
        let mut diag = Diagnostics::new();
        let store = Snapshot::from_json_str(SNAPSHOT)
            .unwrap()
            .into_store(&mut diag)
            .unwrap();

        assert_eq!(store.coord(2), Some(Coord::new(10.5, 0.0)));
        assert!(store.point(3).is_none());
        assert!(store.point(4).is_none());
        assert!(store.way(11).is_none());
        assert_eq!(store.way(10).and_then(|w| w.version), Some(2));

        let rel = store.relation(100).unwrap();
        assert_eq!(rel.members.len(), 3);
        assert_eq!(rel.members[1].role, Role::Other("rigth".to_string()));
        assert_eq!(rel.tag("turn_direction"), Some("straight"));

        // node 4 without coordinates, the role typo and the bogus member
        assert_eq!(diag.count(IssueKind::DegenerateGeometry), 1);
        assert_eq!(diag.count(IssueKind::StructuralInconsistency), 2);
    }

    #[test]
    fn test_unknown_action_is_fatal() {
        let snapshot = Snapshot::from_json_str(r#"{"nodes": [{"id": 1, "x": 0, "y": 0, "action": "purge"}]}"#)
            .unwrap();
        let mut diag = Diagnostics::new();
        assert!(matches!(
            snapshot.into_store(&mut diag),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            Snapshot::from_json_str("{\"nodes\": 3}"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_empty_document() {
        let mut diag = Diagnostics::new();
        let store = Snapshot::from_json_str("{}")
            .unwrap()
            .into_store(&mut diag)
            .unwrap();
        assert!(store.points().is_empty());
        assert!(diag.is_empty());
    }
}
