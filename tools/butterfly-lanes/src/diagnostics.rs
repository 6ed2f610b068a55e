//! Recoverable issues collected during a pass
//!
//! Nothing in the lane engine is fatal. Every skipped item is reported here
//! and logged where it was detected; callers only see the aggregate.

use std::fmt;

/// Which entity an issue is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Node(i64),
    Way(i64),
    Relation(i64),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Node(id) => write!(f, "node {id}"),
            Owner::Way(id) => write!(f, "way {id}"),
            Owner::Relation(id) => write!(f, "relation {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Issue {
    #[error("{owner} references missing {missing}")]
    MissingReference { owner: Owner, missing: Owner },

    #[error("relation {relation_id} is not a lane group: {reason}")]
    MalformedGroup { relation_id: i64, reason: String },

    #[error("{owner}: degenerate geometry ({reason})")]
    DegenerateGeometry { owner: Owner, reason: String },

    #[error("{owner}: structural inconsistency ({detail})")]
    StructuralInconsistency { owner: Owner, detail: String },
}

impl Issue {
    pub fn kind(&self) -> IssueKind {
        match self {
            Issue::MissingReference { .. } => IssueKind::MissingReference,
            Issue::MalformedGroup { .. } => IssueKind::MalformedGroup,
            Issue::DegenerateGeometry { .. } => IssueKind::DegenerateGeometry,
            Issue::StructuralInconsistency { .. } => IssueKind::StructuralInconsistency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    MissingReference,
    MalformedGroup,
    DegenerateGeometry,
    StructuralInconsistency,
}

impl IssueKind {
    pub const ALL: [IssueKind; 4] = [
        IssueKind::MissingReference,
        IssueKind::MalformedGroup,
        IssueKind::DegenerateGeometry,
        IssueKind::StructuralInconsistency,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IssueKind::MissingReference => "missing references",
            IssueKind::MalformedGroup => "non-lane groups",
            IssueKind::DegenerateGeometry => "degenerate geometry",
            IssueKind::StructuralInconsistency => "structural inconsistencies",
        }
    }
}

/// Issues in detection order
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    issues: Vec<Issue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue and log it. Malformed groups are an expected filter and
    /// only show up at debug level.
    pub fn report(&mut self, issue: Issue) {
        match &issue {
            Issue::MalformedGroup { relation_id, reason } => {
                tracing::debug!(relation_id, reason = reason.as_str(), "skipping relation");
            }
            other => tracing::warn!("{other}"),
        }
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind() == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Per-kind counts, skipping kinds that never occurred
    pub fn summary(&self) -> Vec<(IssueKind, usize)> {
        IssueKind::ALL
            .iter()
            .map(|&k| (k, self.count(k)))
            .filter(|&(_, n)| n > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind() {
        let mut diag = Diagnostics::new();
        diag.report(Issue::MissingReference {
            owner: Owner::Way(1),
            missing: Owner::Node(2),
        });
        diag.report(Issue::MalformedGroup {
            relation_id: 5,
            reason: "one way member".to_string(),
        });
        diag.report(Issue::MissingReference {
            owner: Owner::Relation(3),
            missing: Owner::Way(4),
        });

        assert_eq!(diag.len(), 3);
        assert_eq!(diag.count(IssueKind::MissingReference), 2);
        assert_eq!(diag.count(IssueKind::DegenerateGeometry), 0);
        assert_eq!(
            diag.summary(),
            vec![
                (IssueKind::MissingReference, 2),
                (IssueKind::MalformedGroup, 1)
            ]
        );
    }

    #[test]
    fn test_issue_messages() {
        let issue = Issue::MissingReference {
            owner: Owner::Way(10),
            missing: Owner::Node(99),
        };
        assert_eq!(issue.to_string(), "way 10 references missing node 99");
    }
}
