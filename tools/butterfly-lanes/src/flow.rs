//! Flow-direction arrow geometry
//!
//! Angles are polar angles in degrees, counter-clockwise from +x, the
//! convention CAD `@len<angle` commands use. Every emitted angle is in
//! `[0, 360)` and rounded to two decimals.

use serde::Serialize;

use crate::config::FlowConfig;
use crate::diagnostics::{Diagnostics, Issue, Owner};
use crate::lanes::orientation::{reference_side, ReferenceSide};
use crate::lanes::{NormalizedLane, Orientation};
use crate::model::{Coord, Way};
use crate::store::EntityStore;

/// Drawing layer a primitive belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    Point,
    Way,
    Flow,
}

impl ColorClass {
    /// AutoCAD color index used by the script exports
    pub fn cad_color(self) -> u8 {
        match self {
            ColorClass::Point => 5,
            ColorClass::Way => 7,
            ColorClass::Flow => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorClass::Point => "point",
            ColorClass::Way => "way",
            ColorClass::Flow => "flow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Primitive {
    Line {
        from: Coord,
        to: Coord,
        class: ColorClass,
    },
    Ray {
        anchor: Coord,
        angle_deg: f64,
        length: f64,
        class: ColorClass,
    },
}

impl Primitive {
    pub fn class(&self) -> ColorClass {
        match self {
            Primitive::Line { class, .. } | Primitive::Ray { class, .. } => *class,
        }
    }

    /// Start and end point; rays are materialized from angle and length
    pub fn endpoints(&self) -> (Coord, Coord) {
        match *self {
            Primitive::Line { from, to, .. } => (from, to),
            Primitive::Ray {
                anchor,
                angle_deg,
                length,
                ..
            } => {
                let rad = angle_deg.to_radians();
                let end = Coord::new(anchor.x + length * rad.cos(), anchor.y + length * rad.sin());
                (anchor, end)
            }
        }
    }
}

/// Wrap into `[0, 360)` and round to 2 decimals; rounding can land on 360
pub fn normalize_angle(deg: f64) -> f64 {
    let rounded = (deg.rem_euclid(360.0) * 100.0).round() / 100.0;
    if rounded >= 360.0 {
        rounded - 360.0
    } else {
        rounded
    }
}

/// Angle pointing from `to` back to `from`, unrounded
fn raw_reverse_bearing(from: Coord, to: Coord) -> f64 {
    let d = from.to(to);
    d.y.atan2(d.x).to_degrees() + 180.0
}

pub fn reverse_bearing(from: Coord, to: Coord) -> f64 {
    normalize_angle(raw_reverse_bearing(from, to))
}

/// The two arrowhead rays for segment `from -> to`: reverse bearing ± alpha
pub fn arrow_angles(from: Coord, to: Coord, alpha_deg: f64) -> (f64, f64) {
    let r = raw_reverse_bearing(from, to);
    (normalize_angle(r + alpha_deg), normalize_angle(r - alpha_deg))
}

fn degenerate(from: Coord, to: Coord) -> bool {
    from.distance(to) == 0.0
}

fn ray(anchor: Coord, angle_deg: f64, config: &FlowConfig, class: ColorClass) -> Primitive {
    Primitive::Ray {
        anchor,
        angle_deg,
        length: config.arrow_length,
        class,
    }
}

/// Resolve node coordinates, reporting each missing node once
fn resolve_coords(
    store: &EntityStore,
    owner: Owner,
    node_ids: &[i64],
    diag: &mut Diagnostics,
) -> Vec<Option<Coord>> {
    node_ids
        .iter()
        .map(|&id| {
            let coord = store.coord(id);
            if coord.is_none() {
                diag.report(Issue::MissingReference {
                    owner,
                    missing: Owner::Node(id),
                });
            }
            coord
        })
        .collect()
}

/// Segment lines of one way plus the arrowhead at its last segment
pub fn way_geometry(
    store: &EntityStore,
    way: &Way,
    config: &FlowConfig,
    diag: &mut Diagnostics,
) -> Vec<Primitive> {
    if !way.has_geometry() {
        tracing::debug!(way_id = way.id, nodes = way.node_ids.len(), "way has no segment");
        return Vec::new();
    }

    let owner = Owner::Way(way.id);
    let coords = resolve_coords(store, owner, &way.node_ids, diag);
    let mut out = Vec::with_capacity(coords.len() + 1);

    for pair in coords.windows(2) {
        if let (Some(from), Some(to)) = (pair[0], pair[1]) {
            out.push(Primitive::Line {
                from,
                to,
                class: ColorClass::Way,
            });
        }
    }

    let n = coords.len();
    if let (Some(from), Some(to)) = (coords[n - 2], coords[n - 1]) {
        if degenerate(from, to) {
            diag.report(Issue::DegenerateGeometry {
                owner,
                reason: "zero-length final segment".to_string(),
            });
        } else {
            let (a1, a2) = arrow_angles(from, to, config.alpha_deg);
            out.push(ray(to, a1, config, ColorClass::Way));
            out.push(ray(to, a2, config, ColorClass::Way));
        }
    }

    out
}

/// Arrows placed along a lane every `arrow_gap` of travelled centerline.
///
/// Interior points only: the lane ends already carry terminal arrows. The
/// cross segment runs from the `left`-role side to the `right`-role side,
/// whatever their position in the relation.
pub fn lane_flow_arrows(
    store: &EntityStore,
    lane: &NormalizedLane,
    config: &FlowConfig,
    diag: &mut Diagnostics,
) -> Vec<Primitive> {
    let owner = Owner::Relation(lane.group.group_id);

    if lane.orientation == Orientation::Unresolved {
        return Vec::new();
    }
    if !lane.sides_match() {
        diag.report(Issue::DegenerateGeometry {
            owner,
            reason: format!(
                "side node counts differ ({} vs {})",
                lane.left_nodes.len(),
                lane.right_nodes.len()
            ),
        });
        return Vec::new();
    }

    let left: Option<Vec<Coord>> = resolve_coords(store, owner, &lane.left_nodes, diag)
        .into_iter()
        .collect();
    let right: Option<Vec<Coord>> = resolve_coords(store, owner, &lane.right_nodes, diag)
        .into_iter()
        .collect();
    let (Some(left), Some(right)) = (left, right) else {
        return Vec::new();
    };
    let (left, right) = match reference_side(&lane.group) {
        ReferenceSide::Left => (left, right),
        ReferenceSide::Right => (right, left),
    };

    let n = left.len();
    let mut out = Vec::new();
    let mut travelled = 0.0;
    let mut prev_mid = left[0].midpoint(right[0]);

    for i in 1..n.saturating_sub(1) {
        let mid = left[i].midpoint(right[i]);
        travelled += prev_mid.distance(mid);
        prev_mid = mid;

        if travelled <= config.arrow_gap {
            continue;
        }
        travelled = 0.0;

        if degenerate(left[i], right[i]) {
            diag.report(Issue::DegenerateGeometry {
                owner,
                reason: format!("lane sides touch at index {i}"),
            });
            continue;
        }
        let r = raw_reverse_bearing(left[i], right[i]) + 90.0;
        out.push(ray(mid, normalize_angle(r + config.alpha_deg), config, ColorClass::Flow));
        out.push(ray(mid, normalize_angle(r - config.alpha_deg), config, ColorClass::Flow));
    }

    out
}

/// All drawable geometry of a pass, in input order: ways first, then lanes
pub fn synthesize(
    store: &EntityStore,
    lanes: &[NormalizedLane],
    config: &FlowConfig,
    diag: &mut Diagnostics,
) -> Vec<Primitive> {
    let mut out = Vec::new();
    for way in store.ways() {
        out.extend(way_geometry(store, way, config, diag));
    }
    for lane in lanes {
        out.extend(lane_flow_arrows(store, lane, config, diag));
    }
    out
}
