//! Entity model: points ("nodes"), polylines ("ways") and grouping relations

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub const SUBTYPE_TAG: &str = "subtype";
pub const TURN_DIRECTION_TAG: &str = "turn_direction";
pub const ROAD_SUBTYPE: &str = "road";

/// Tags keep a stable key order so every output derived from them is deterministic
pub type Tags = BTreeMap<String, String>;

/// Editing lifecycle marker carried by every entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    Create,
    Modify,
    Delete,
}

impl Action {
    /// Empty string means "untouched", same as an absent attribute
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" | "none" => Some(Action::None),
            "create" => Some(Action::Create),
            "modify" => Some(Action::Modify),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::None => "",
            Action::Create => "create",
            Action::Modify => "modify",
            Action::Delete => "delete",
        }
    }

    pub fn is_delete(self) -> bool {
        self == Action::Delete
    }
}

/// Planar coordinate in the map's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `self` to `other`
    pub fn to(self, other: Coord) -> Coord {
        Coord::new(other.x - self.x, other.y - self.y)
    }

    pub fn dot(self, other: Coord) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(self, other: Coord) -> f64 {
        let d = self.to(other);
        d.dot(d).sqrt()
    }

    pub fn midpoint(self, other: Coord) -> Coord {
        Coord::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: i64,
    pub coord: Coord,
    pub tags: Tags,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub node_ids: Vec<i64>,
    pub tags: Tags,
    pub action: Action,
    pub visible: Option<bool>,
    pub version: Option<u32>,
}

impl Way {
    /// Geometry and connectivity passes need at least one segment
    pub fn has_geometry(&self) -> bool {
        self.node_ids.len() >= 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Node = 0,
    Way = 1,
    Relation = 2,
}

impl MemberKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "node" => Some(MemberKind::Node),
            "way" => Some(MemberKind::Way),
            "relation" => Some(MemberKind::Relation),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Node => "node",
            MemberKind::Way => "way",
            MemberKind::Relation => "relation",
        }
    }
}

/// Role a member plays inside a lane relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Left,
    Right,
    Other(String),
}

impl Role {
    pub const KNOWN: [&'static str; 2] = ["left", "right"];

    pub fn parse(s: &str) -> Self {
        match s {
            "left" => Role::Left,
            "right" => Role::Right,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Left => "left",
            Role::Right => "right",
            Role::Other(s) => s,
        }
    }

    pub fn is_side(&self) -> bool {
        !matches!(self, Role::Other(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub kind: MemberKind,
    pub ref_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed member encoding '{0}' (expected type/ref/role)")]
pub struct MemberParseError(pub String);

/// Parses the delimited `type/ref/role` form used by the table exports
impl FromStr for Member {
    type Err = MemberParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MemberParseError(s.to_string());
        let mut parts = s.splitn(3, '/');
        let kind = parts.next().and_then(MemberKind::parse).ok_or_else(err)?;
        let ref_id = parts
            .next()
            .and_then(|r| r.trim().parse::<i64>().ok())
            .ok_or_else(err)?;
        let role = parts.next().map(Role::parse).ok_or_else(err)?;
        Ok(Member { kind, ref_id, role })
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind.as_str(), self.ref_id, self.role)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub members: Vec<Member>,
    pub tags: Tags,
    pub action: Action,
}

impl Relation {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Way-typed members in input order
    pub fn way_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.kind == MemberKind::Way)
    }

    /// Members joined in the `type/ref/role;...` export form
    pub fn encoded_members(&self) -> String {
        self.members
            .iter()
            .map(Member::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}
