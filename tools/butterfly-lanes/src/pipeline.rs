//! One complete analysis pass over an entity store

use std::time::Instant;

use crate::config::FlowConfig;
use crate::connectivity::{match_lanes, ConnectivityEdge};
use crate::diagnostics::Diagnostics;
use crate::flow::{synthesize, Primitive};
use crate::lanes::{normalize_lanes, resolve_lane_groups, LaneGroup, NormalizedLane};
use crate::store::EntityStore;

/// Everything derived from one store. Recomputed from scratch on every run.
#[derive(Debug)]
pub struct Analysis {
    pub lane_groups: Vec<LaneGroup>,
    pub lanes: Vec<NormalizedLane>,
    pub edges: Vec<ConnectivityEdge>,
    pub primitives: Vec<Primitive>,
    pub diagnostics: Diagnostics,
}

/// Lane groups, normalization and connectivity only
pub fn analyze_topology(
    store: &EntityStore,
    config: &FlowConfig,
    diag: &mut Diagnostics,
) -> (Vec<LaneGroup>, Vec<NormalizedLane>, Vec<ConnectivityEdge>) {
    let lane_groups = resolve_lane_groups(store, diag);
    let lanes = normalize_lanes(store, &lane_groups, diag);
    let edges = match_lanes(&lanes, config.parallel, diag);
    (lane_groups, lanes, edges)
}

pub fn analyze(store: &EntityStore, config: &FlowConfig) -> Analysis {
    let start = Instant::now();
    let mut diagnostics = Diagnostics::new();

    let (lane_groups, lanes, edges) = analyze_topology(store, config, &mut diagnostics);
    let primitives = synthesize(store, &lanes, config, &mut diagnostics);

    tracing::info!(
        lane_groups = lane_groups.len(),
        edges = edges.len(),
        primitives = primitives.len(),
        issues = diagnostics.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );

    Analysis {
        lane_groups,
        lanes,
        edges,
        primitives,
        diagnostics,
    }
}
