//! Lane groups: extraction from relations and orientation normalization

pub mod orientation;
pub mod resolver;

pub use orientation::{normalize_lanes, NormalizedLane, Orientation};
pub use resolver::{resolve_lane_groups, LaneGroup, LaneSide};
