//! Which component types may link to which.
//!
//! The table is directed: an entry `A -> [B, C]` lets `A` act as the source
//! of an edge to `B` or `C`. Nothing is implied in the other direction, and a
//! type without an entry may not start any edge.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use thiserror::Error;

/// Modeling guidance for agents editing diagrams. Shared by MCP instructions and `get_rules`.
pub const RULES: &str = "\
1. Arrow direction = dependency. The edge points from the resource that initiates or depends on \
the relationship toward the one it uses (e.g. \"EC2 Instance\" -> \"RDS Database\").\n\
2. Connections are checked against a fixed directed table. A rejected edge is never stored; \
if you need the reverse relationship, try the edge the other way round.\n\
3. One edge per relationship. Adding a second edge between the same source and target is rejected.\n\
4. Placement follows network boundaries. VPCs contain subnets, gateways and security groups; \
subnets hold instances, databases, caches and load balancers.\n\
5. Property validation is advisory. Violations are reported alongside the update and never block \
a save. Fix them when the information is known; leave fields empty when it is not.\n\
6. Keep names meaningful. The `name` field is what the canvas shows; rename components after \
their role (\"Orders DB\") rather than leaving the type name.\n\
7. Save deliberately. Each explicit save appends one version to the history; autosave appends \
its own versions while an already-saved diagram is being edited.";

/// The directed connection table shipped with the AWS palette.
pub const AWS_CONNECTIONS: &[(&str, &[&str])] = &[
    (
        "EC2 Instance",
        &[
            "RDS Database",
            "DynamoDB Table",
            "ElastiCache Cluster",
            "S3 Bucket",
            "EFS File System",
            "Security Group",
            "Load Balancer",
            "SQS Queue",
            "SNS Topic",
            "Lambda Function",
            "API Gateway",
            "Internet Gateway",
        ],
    ),
    (
        "Auto Scaling Group",
        &["Load Balancer", "Security Group", "SNS Topic", "EC2 Instance"],
    ),
    (
        "Lambda Function",
        &[
            "DynamoDB Table",
            "S3 Bucket",
            "SQS Queue",
            "SNS Topic",
            "API Gateway",
            "Security Group",
            "KMS Key",
        ],
    ),
    ("RDS Database", &["Security Group", "KMS Key", "Subnet"]),
    ("DynamoDB Table", &["Lambda Function", "EC2 Instance", "KMS Key"]),
    ("ElastiCache Cluster", &["Security Group", "Subnet"]),
    (
        "VPC",
        &[
            "Subnet",
            "Internet Gateway",
            "Security Group",
            "EC2 Instance",
            "RDS Database",
            "ElastiCache Cluster",
            "Load Balancer",
        ],
    ),
    (
        "Subnet",
        &[
            "EC2 Instance",
            "RDS Database",
            "ElastiCache Cluster",
            "Load Balancer",
            "VPC",
        ],
    ),
    ("Route 53", &["Load Balancer", "API Gateway", "S3 Bucket"]),
    (
        "Load Balancer",
        &["EC2 Instance", "Auto Scaling Group", "Security Group", "Subnet"],
    ),
    (
        "Security Group",
        &[
            "EC2 Instance",
            "RDS Database",
            "ElastiCache Cluster",
            "Lambda Function",
            "Load Balancer",
        ],
    ),
    ("IAM Role", &["EC2 Instance", "Lambda Function", "API Gateway"]),
    (
        "KMS Key",
        &[
            "S3 Bucket",
            "RDS Database",
            "DynamoDB Table",
            "SQS Queue",
            "SNS Topic",
            "EFS File System",
        ],
    ),
    ("S3 Bucket", &["EC2 Instance", "Lambda Function", "KMS Key"]),
    ("EFS File System", &["EC2 Instance", "Lambda Function", "KMS Key"]),
    (
        "SQS Queue",
        &["EC2 Instance", "Lambda Function", "SNS Topic", "KMS Key"],
    ),
    ("SNS Topic", &["Lambda Function", "SQS Queue", "EC2 Instance"]),
    ("Internet Gateway", &["VPC", "EC2 Instance"]),
    ("API Gateway", &["Lambda Function", "EC2 Instance", "IAM Role"]),
];

/// An edge the table does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_type} cannot be directly connected to {target_type}")]
pub struct ConnectionRejected {
    pub source_type: String,
    pub target_type: String,
}

/// Directed adjacency map from source type name to allowed target type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRules {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl ConnectionRules {
    /// A table that rejects everything.
    pub fn empty() -> Self {
        Self {
            adjacency: BTreeMap::new(),
        }
    }

    /// The built-in AWS table.
    pub fn aws() -> Self {
        Self::from_table(AWS_CONNECTIONS)
    }

    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        let mut rules = Self::empty();
        for (source, targets) in table {
            for target in *targets {
                rules.allow(source, target);
            }
        }
        rules
    }

    /// Permit `source_type -> target_type`. The reverse stays as it was.
    pub fn allow(&mut self, source_type: &str, target_type: &str) {
        self.adjacency
            .entry(source_type.to_string())
            .or_default()
            .insert(target_type.to_string());
    }

    pub fn can_connect(&self, source_type: &str, target_type: &str) -> bool {
        self.adjacency
            .get(source_type)
            .is_some_and(|targets| targets.contains(target_type))
    }

    pub fn check(&self, source_type: &str, target_type: &str) -> Result<(), ConnectionRejected> {
        if self.can_connect(source_type, target_type) {
            Ok(())
        } else {
            Err(ConnectionRejected {
                source_type: source_type.to_string(),
                target_type: target_type.to_string(),
            })
        }
    }

    /// Types that `source_type` may connect to, in name order.
    pub fn targets(&self, source_type: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(source_type)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Types that may connect to `target_type`, in name order.
    pub fn sources<'a>(&'a self, target_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.adjacency
            .iter()
            .filter(move |(_, targets)| targets.contains(target_type))
            .map(|(source, _)| source.as_str())
    }

    /// Every `(source, target)` pair, sorted.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |target| (source.as_str(), target.as_str()))
        })
    }
}

impl Default for ConnectionRules {
    fn default() -> Self {
        Self::aws()
    }
}

fn builtin() -> &'static ConnectionRules {
    static RULES_TABLE: OnceLock<ConnectionRules> = OnceLock::new();
    RULES_TABLE.get_or_init(ConnectionRules::aws)
}

/// Check an edge against the built-in table.
pub fn can_connect(source_type: &str, target_type: &str) -> bool {
    builtin().can_connect(source_type, target_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ComponentKind;

    #[test]
    fn table_only_names_catalog_types() {
        for (source, target) in ConnectionRules::aws().pairs() {
            assert!(ComponentKind::from_name(source).is_some(), "{source}");
            assert!(ComponentKind::from_name(target).is_some(), "{target}");
        }
    }

    #[test]
    fn every_catalog_type_has_an_entry() {
        let rules = ConnectionRules::aws();
        for kind in ComponentKind::ALL {
            assert!(rules.targets(kind.name()).next().is_some(), "{kind}");
        }
    }

    #[test]
    fn direction_matters() {
        assert!(can_connect("VPC", "EC2 Instance"));
        assert!(!can_connect("EC2 Instance", "VPC"));
        assert!(can_connect("EC2 Instance", "RDS Database"));
        assert!(!can_connect("RDS Database", "EC2 Instance"));
    }

    #[test]
    fn listed_both_ways_is_symmetric() {
        assert!(can_connect("VPC", "Subnet"));
        assert!(can_connect("Subnet", "VPC"));
        assert!(can_connect("Internet Gateway", "VPC"));
        assert!(can_connect("VPC", "Internet Gateway"));
    }

    #[test]
    fn unknown_source_is_fail_closed() {
        assert!(!can_connect("Mainframe", "EC2 Instance"));
        assert!(!can_connect("EC2 Instance", "Mainframe"));
        assert!(!ConnectionRules::empty().can_connect("VPC", "Subnet"));
    }

    #[test]
    fn rejection_names_both_types() {
        let err = ConnectionRules::aws()
            .check("EC2 Instance", "VPC")
            .unwrap_err();
        assert_eq!(err.to_string(), "EC2 Instance cannot be directly connected to VPC");
    }

    #[test]
    fn allow_extends_one_direction_only() {
        let mut rules = ConnectionRules::empty();
        rules.allow("Queue", "Worker");
        assert!(rules.can_connect("Queue", "Worker"));
        assert!(!rules.can_connect("Worker", "Queue"));
        assert_eq!(rules.sources("Worker").collect::<Vec<_>>(), ["Queue"]);
    }

    #[test]
    fn sources_of_kms_key() {
        let rules = ConnectionRules::aws();
        let sources: Vec<_> = rules.sources("KMS Key").collect();
        assert_eq!(
            sources,
            [
                "DynamoDB Table",
                "EFS File System",
                "Lambda Function",
                "RDS Database",
                "S3 Bucket",
                "SQS Queue"
            ]
        );
    }
}
