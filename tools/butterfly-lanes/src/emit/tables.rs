//! CSV tables: lane groups, links and the entity dumps

use std::io::Write;

use butterfly_common::{Error, Result};
use serde::Serialize;

use crate::connectivity::ConnectivityEdge;
use crate::lanes::LaneGroup;
use crate::model::{SUBTYPE_TAG, TURN_DIRECTION_TAG};
use crate::store::EntityStore;

#[derive(Serialize)]
struct LaneGroupRow<'a> {
    group_id: i64,
    left_way_ref: i64,
    right_way_ref: i64,
    turn_direction: Option<&'a str>,
    subtype: Option<&'a str>,
}

#[derive(Serialize)]
struct NodeRow<'a> {
    id: i64,
    action: &'a str,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct WayRow<'a> {
    id: i64,
    action: &'a str,
    visible: Option<bool>,
    version: Option<u32>,
    node_refs: String,
    node_count: usize,
}

#[derive(Serialize)]
struct RelationRow<'a> {
    id: i64,
    action: &'a str,
    members: String,
    subtype: Option<&'a str>,
    turn_direction: Option<&'a str>,
}

fn csv_err(e: csv::Error) -> Error {
    Error::OutputFailed(format!("csv: {e}"))
}

fn write_rows<W: Write, T: Serialize>(out: W, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut n = 0;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
        n += 1;
    }
    writer.flush()?;
    Ok(n)
}

pub fn write_lane_groups<W: Write>(out: W, groups: &[LaneGroup]) -> Result<usize> {
    write_rows(
        out,
        groups.iter().map(|g| LaneGroupRow {
            group_id: g.group_id,
            left_way_ref: g.left.way_id,
            right_way_ref: g.right.way_id,
            turn_direction: g.turn_direction.as_deref(),
            subtype: g.subtype.as_deref(),
        }),
    )
}

pub fn write_links<W: Write>(out: W, edges: &[ConnectivityEdge]) -> Result<usize> {
    write_rows(out, edges)
}

pub fn write_nodes<W: Write>(out: W, store: &EntityStore) -> Result<usize> {
    write_rows(
        out,
        store.points().iter().map(|p| NodeRow {
            id: p.id,
            action: p.action.as_str(),
            x: p.coord.x,
            y: p.coord.y,
        }),
    )
}

pub fn write_ways<W: Write>(out: W, store: &EntityStore) -> Result<usize> {
    write_rows(
        out,
        store.ways().iter().map(|w| WayRow {
            id: w.id,
            action: w.action.as_str(),
            visible: w.visible,
            version: w.version,
            node_refs: w
                .node_ids
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(","),
            node_count: w.node_ids.len(),
        }),
    )
}

pub fn write_relations<W: Write>(out: W, store: &EntityStore) -> Result<usize> {
    write_rows(
        out,
        store.relations().iter().map(|r| RelationRow {
            id: r.id,
            action: r.action.as_str(),
            members: r.encoded_members(),
            subtype: r.tag(SUBTYPE_TAG),
            turn_direction: r.tag(TURN_DIRECTION_TAG),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::lanes::LaneSide;
    use crate::model::Role;
    use crate::store::fixtures::*;

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_lane_group_table() {
        let groups = vec![LaneGroup {
            group_id: 100,
            left: LaneSide {
                way_id: 10,
                role: Role::Left,
            },
            right: LaneSide {
                way_id: 11,
                role: Role::Right,
            },
            turn_direction: None,
            subtype: Some("road".to_string()),
        }];
        let mut buf = Vec::new();
        assert_eq!(write_lane_groups(&mut buf, &groups).unwrap(), 1);
        assert_eq!(
            to_string(buf),
            "group_id,left_way_ref,right_way_ref,turn_direction,subtype\n100,10,11,,road\n"
        );
    }

    #[test]
    fn test_links_table() {
        let edges = vec![ConnectivityEdge {
            from_lane_id: 1,
            to_lane_id: 2,
            flow_type: "left&right".to_string(),
            from_turn_direction: Some("straight".to_string()),
            to_turn_direction: None,
        }];
        let mut buf = Vec::new();
        write_links(&mut buf, &edges).unwrap();
        assert_eq!(
            to_string(buf),
            "from_lane_id,to_lane_id,flow_type,from_turn_direction,to_turn_direction\n\
             1,2,left&right,straight,\n"
        );
    }

    #[test]
    fn test_entity_dumps() {
        let mut diag = Diagnostics::new();
        let store = EntityStore::new(
            vec![point(1, 0.0, 0.0), point(2, 2.5, 1.0)],
            vec![way(10, &[1, 2])],
            vec![lane(100, 10, 11)],
            &mut diag,
        );

        let mut ways = Vec::new();
        write_ways(&mut ways, &store).unwrap();
        assert_eq!(
            to_string(ways),
            "id,action,visible,version,node_refs,node_count\n10,,true,1,\"1,2\",2\n"
        );

        let mut relations = Vec::new();
        write_relations(&mut relations, &store).unwrap();
        assert_eq!(
            to_string(relations),
            "id,action,members,subtype,turn_direction\n100,,way/10/left;way/11/right,road,\n"
        );

        let mut nodes = Vec::new();
        assert_eq!(write_nodes(&mut nodes, &store).unwrap(), 2);
        assert!(to_string(nodes).ends_with("2,,2.5,1.0\n"));
    }
}
