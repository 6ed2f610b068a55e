//! Invariant checks on a finished analysis
//!
//! Fast-fail report over the derived data:
//! - lane groups reference two distinct ways with a segment each
//! - normalized lanes no longer run against their reference side
//! - connectivity is irreflexive and independent of the matcher mode
//! - no output references an entity missing from the store (deleted or absent)
//! - arrow angles are in range and paired symmetrically

use crate::config::FlowConfig;
use crate::connectivity::match_lanes;
use crate::diagnostics::Diagnostics;
use crate::flow::{ColorClass, Primitive};
use crate::lanes::orientation::{reference_side, runs_against, ReferenceSide};
use crate::lanes::Orientation;
use crate::pipeline::Analysis;
use crate::store::EntityStore;

/// Tolerance for angle comparisons; emitted angles are rounded to 0.01
const ANGLE_EPSILON: f64 = 0.02;

/// Invariant check results
#[derive(Debug, Default)]
pub struct InvariantResult {
    pub passed: bool,
    pub checks_run: usize,
    pub checks_passed: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl InvariantResult {
    fn new() -> Self {
        Self {
            passed: true,
            ..Default::default()
        }
    }

    fn warn(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    /// Count one check; it passes when no errors were collected for it
    fn finish_check(&mut self, name: &str, errors: Vec<String>) {
        self.checks_run += 1;
        if errors.is_empty() {
            self.checks_passed += 1;
            println!("  ✓ {name}");
        } else {
            println!("  ❌ {name}: {} violation(s)", errors.len());
            self.passed = false;
            self.errors.extend(errors);
        }
    }
}

/// Run all invariant checks and print the report
pub fn validate_analysis(
    store: &EntityStore,
    analysis: &Analysis,
    config: &FlowConfig,
) -> InvariantResult {
    let mut result = InvariantResult::new();

    println!("\n🔍 Lane invariant validation");

    println!("\n1. Checking lane groups...");
    check_lane_groups(store, analysis, &mut result);

    println!("\n2. Checking normalization...");
    check_normalization(store, analysis, &mut result);

    println!("\n3. Checking connectivity...");
    check_connectivity(analysis, &mut result);

    println!("\n4. Checking entity references...");
    check_references(store, analysis, &mut result);

    println!("\n5. Checking arrow angles...");
    check_angles(&analysis.primitives, config, &mut result);

    println!("\n=== INVARIANT CHECK SUMMARY ===");
    println!("  Checks run:    {}", result.checks_run);
    println!("  Checks passed: {}", result.checks_passed);
    println!("  Errors:        {}", result.errors.len());
    println!("  Warnings:      {}", result.warnings.len());

    if !result.errors.is_empty() {
        println!("\n  Errors:");
        for (i, e) in result.errors.iter().enumerate() {
            println!("    {}. {}", i + 1, e);
        }
    }
    if !result.warnings.is_empty() {
        println!("\n  Warnings:");
        for (i, w) in result.warnings.iter().enumerate() {
            println!("    {}. {}", i + 1, w);
        }
    }

    if result.passed {
        println!("\n✅ All invariant checks passed!");
    } else {
        println!("\n❌ Invariant checks failed!");
    }

    result
}

fn check_lane_groups(store: &EntityStore, analysis: &Analysis, result: &mut InvariantResult) {
    let mut errors = Vec::new();
    for g in &analysis.lane_groups {
        if g.left.way_id == g.right.way_id {
            errors.push(format!("lane {} uses way {} on both sides", g.group_id, g.left.way_id));
        }
        for way_id in [g.left.way_id, g.right.way_id] {
            match store.way(way_id) {
                Some(w) if w.has_geometry() => {}
                Some(w) => errors.push(format!(
                    "lane {}: way {} has {} node(s)",
                    g.group_id,
                    way_id,
                    w.node_ids.len()
                )),
                None => errors.push(format!("lane {}: way {} not in store", g.group_id, way_id)),
            }
        }
    }
    result.finish_check("two distinct ways with a segment each", errors);
}

fn check_normalization(store: &EntityStore, analysis: &Analysis, result: &mut InvariantResult) {
    let mut errors = Vec::new();
    let mut unresolved = 0usize;

    for lane in &analysis.lanes {
        if lane.orientation == Orientation::Unresolved {
            unresolved += 1;
            continue;
        }
        let (reference, other) = match reference_side(&lane.group) {
            ReferenceSide::Left => (&lane.left_nodes, &lane.right_nodes),
            ReferenceSide::Right => (&lane.right_nodes, &lane.left_nodes),
        };
        match runs_against(store, reference, other) {
            Ok(false) => {}
            // the reversed side now starts where it used to end; a curved
            // side can disagree at its new head without being wrong
            Ok(true) if lane.orientation == Orientation::Reversed => result.warn(format!(
                "lane {}: reversed side still diverges at its head",
                lane.group.group_id
            )),
            Ok(true) => errors.push(format!(
                "lane {}: aligned side runs against its reference",
                lane.group.group_id
            )),
            Err(node_id) => errors.push(format!(
                "lane {}: node {} vanished after normalization",
                lane.group.group_id, node_id
            )),
        }
    }

    if unresolved > 0 {
        result.warn(format!("{unresolved} lane(s) left unresolved"));
    }
    result.finish_check("normalization is stable", errors);
}

fn check_connectivity(analysis: &Analysis, result: &mut InvariantResult) {
    let errors: Vec<String> = analysis
        .edges
        .iter()
        .filter(|e| e.from_lane_id == e.to_lane_id)
        .map(|e| format!("lane {} links to itself", e.from_lane_id))
        .collect();
    result.finish_check("no self links", errors);

    let mut scratch = Diagnostics::new();
    let sequential = match_lanes(&analysis.lanes, false, &mut scratch);
    let parallel = match_lanes(&analysis.lanes, true, &mut scratch);
    let mut errors = Vec::new();
    if sequential != analysis.edges || parallel != analysis.edges {
        errors.push(format!(
            "edge lists differ: analysis {}, sequential {}, parallel {}",
            analysis.edges.len(),
            sequential.len(),
            parallel.len()
        ));
    }
    result.finish_check("sequential and parallel matching agree", errors);
}

fn check_references(store: &EntityStore, analysis: &Analysis, result: &mut InvariantResult) {
    let mut errors = Vec::new();
    for g in &analysis.lane_groups {
        if store.relation(g.group_id).is_none() {
            errors.push(format!("lane group {} not in store", g.group_id));
        }
    }
    for e in &analysis.edges {
        for id in [e.from_lane_id, e.to_lane_id] {
            if store.relation(id).is_none() {
                errors.push(format!("edge {} -> {} references relation {}", e.from_lane_id, e.to_lane_id, id));
            }
        }
    }
    result.finish_check("outputs reference live entities only", errors);
}

fn check_angles(primitives: &[Primitive], config: &FlowConfig, result: &mut InvariantResult) {
    let mut errors = Vec::new();
    let rays: Vec<(ColorClass, f64)> = primitives
        .iter()
        .filter_map(|p| match p {
            Primitive::Ray {
                angle_deg, class, ..
            } => Some((*class, *angle_deg)),
            Primitive::Line { .. } => None,
        })
        .collect();

    for (_, angle) in &rays {
        if !(0.0..360.0).contains(angle) {
            errors.push(format!("angle {angle} out of range"));
        }
    }
    result.finish_check("angles in [0, 360)", errors);

    // Rays are always emitted in (+alpha, -alpha) pairs
    let mut errors = Vec::new();
    if rays.len() % 2 != 0 {
        errors.push(format!("odd number of rays ({})", rays.len()));
    }
    for pair in rays.chunks_exact(2) {
        let (class, a1) = pair[0];
        let (_, a2) = pair[1];
        let spread = (a1 - a2).rem_euclid(360.0);
        if (spread - 2.0 * config.alpha_deg).abs() > ANGLE_EPSILON {
            errors.push(format!(
                "{} arrow {a1}/{a2} is not symmetric by {}",
                class.as_str(),
                config.alpha_deg
            ));
        }
    }
    result.finish_check("arrow pairs symmetric", errors);
}
