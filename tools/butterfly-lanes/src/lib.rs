//! Lane topology and flow-direction analysis
//!
//! Builds lane groups from `left`/`right` way pairs, aligns both sides of
//! each lane, links lanes end to head, and derives the arrow geometry that
//! shows travel direction. Results are written as CSV, CAD scripts or
//! GeoJSON.

pub mod cli;
pub mod config;
pub mod connectivity;
pub mod diagnostics;
pub mod emit;
pub mod flow;
pub mod lanes;
pub mod model;
pub mod pipeline;
pub mod snapshot;
pub mod store;
pub mod validate;

pub use config::FlowConfig;
pub use connectivity::{match_lanes, ConnectivityEdge};
pub use diagnostics::{Diagnostics, Issue, IssueKind};
pub use emit::{write_all, OutputFormat};
pub use flow::{synthesize, ColorClass, Primitive};
pub use lanes::{normalize_lanes, resolve_lane_groups, LaneGroup, NormalizedLane, Orientation};
pub use pipeline::{analyze, Analysis};
pub use snapshot::Snapshot;
pub use store::EntityStore;
