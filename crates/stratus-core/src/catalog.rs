//! Component catalog: the known cloud resource types, their categories and
//! default configuration records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::properties::Properties;

/// Palette grouping. The icon lookup keys off this tag; the core never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Compute,
    Database,
    Networking,
    Security,
    Storage,
    Integration,
    Gateway,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Compute => "Compute",
            Category::Database => "Database",
            Category::Networking => "Networking",
            Category::Security => "Security",
            Category::Storage => "Storage",
            Category::Integration => "Integration",
            Category::Gateway => "Gateway",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Ec2Instance,
    AutoScalingGroup,
    LambdaFunction,
    RdsDatabase,
    DynamoDbTable,
    ElastiCacheCluster,
    Vpc,
    Subnet,
    Route53,
    LoadBalancer,
    SecurityGroup,
    IamRole,
    KmsKey,
    S3Bucket,
    EfsFileSystem,
    SqsQueue,
    SnsTopic,
    InternetGateway,
    ApiGateway,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 19] = [
        ComponentKind::Ec2Instance,
        ComponentKind::AutoScalingGroup,
        ComponentKind::LambdaFunction,
        ComponentKind::RdsDatabase,
        ComponentKind::DynamoDbTable,
        ComponentKind::ElastiCacheCluster,
        ComponentKind::Vpc,
        ComponentKind::Subnet,
        ComponentKind::Route53,
        ComponentKind::LoadBalancer,
        ComponentKind::SecurityGroup,
        ComponentKind::IamRole,
        ComponentKind::KmsKey,
        ComponentKind::S3Bucket,
        ComponentKind::EfsFileSystem,
        ComponentKind::SqsQueue,
        ComponentKind::SnsTopic,
        ComponentKind::InternetGateway,
        ComponentKind::ApiGateway,
    ];

    /// The type name stored on components and used by the connection table.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Ec2Instance => "EC2 Instance",
            ComponentKind::AutoScalingGroup => "Auto Scaling Group",
            ComponentKind::LambdaFunction => "Lambda Function",
            ComponentKind::RdsDatabase => "RDS Database",
            ComponentKind::DynamoDbTable => "DynamoDB Table",
            ComponentKind::ElastiCacheCluster => "ElastiCache Cluster",
            ComponentKind::Vpc => "VPC",
            ComponentKind::Subnet => "Subnet",
            ComponentKind::Route53 => "Route 53",
            ComponentKind::LoadBalancer => "Load Balancer",
            ComponentKind::SecurityGroup => "Security Group",
            ComponentKind::IamRole => "IAM Role",
            ComponentKind::KmsKey => "KMS Key",
            ComponentKind::S3Bucket => "S3 Bucket",
            ComponentKind::EfsFileSystem => "EFS File System",
            ComponentKind::SqsQueue => "SQS Queue",
            ComponentKind::SnsTopic => "SNS Topic",
            ComponentKind::InternetGateway => "Internet Gateway",
            ComponentKind::ApiGateway => "API Gateway",
        }
    }

    /// Exact, case-sensitive lookup by type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn category(self) -> Category {
        match self {
            ComponentKind::Ec2Instance
            | ComponentKind::AutoScalingGroup
            | ComponentKind::LambdaFunction => Category::Compute,
            ComponentKind::RdsDatabase
            | ComponentKind::DynamoDbTable
            | ComponentKind::ElastiCacheCluster => Category::Database,
            ComponentKind::Vpc
            | ComponentKind::Subnet
            | ComponentKind::Route53
            | ComponentKind::LoadBalancer => Category::Networking,
            ComponentKind::SecurityGroup | ComponentKind::IamRole | ComponentKind::KmsKey => {
                Category::Security
            }
            ComponentKind::S3Bucket | ComponentKind::EfsFileSystem => Category::Storage,
            ComponentKind::SqsQueue | ComponentKind::SnsTopic => Category::Integration,
            ComponentKind::InternetGateway | ComponentKind::ApiGateway => Category::Gateway,
        }
    }

    /// Default record for a freshly placed component of this kind.
    pub fn default_properties(self) -> Properties {
        let base = Properties::named(self.name());
        match self {
            ComponentKind::Ec2Instance => base
                .with("instanceType", "t2.micro")
                .with("operatingSystem", "Amazon Linux 2"),
            ComponentKind::AutoScalingGroup => base
                .with("minSize", 1)
                .with("maxSize", 3)
                .with("desiredCapacity", 2)
                .with("instanceType", "t2.micro"),
            ComponentKind::LambdaFunction => base
                .with("runtime", "nodejs18.x")
                .with("memorySize", 128)
                .with("timeout", 30),
            ComponentKind::RdsDatabase => base
                .with("engine", "MySQL")
                .with("version", "8.0")
                .with("port", 3306),
            ComponentKind::DynamoDbTable => base.with("readCapacity", 5).with("writeCapacity", 5),
            ComponentKind::ElastiCacheCluster => base
                .with("engine", "redis")
                .with("nodeType", "cache.t3.micro")
                .with("numNodes", 1)
                .with("port", 6379),
            ComponentKind::Vpc => base.with("cidrBlock", "10.0.0.0/16"),
            ComponentKind::Subnet => base
                .with("cidrBlock", "10.0.0.0/24")
                .with("isPublic", false),
            ComponentKind::Route53 => base.with("ttl", 300),
            ComponentKind::LoadBalancer => base
                .with("type", "application")
                .with("scheme", "internet-facing"),
            ComponentKind::SecurityGroup => base
                .with("inboundRules", Vec::<String>::new())
                .with("outboundRules", Vec::<String>::new()),
            ComponentKind::IamRole => base.with("policies", Vec::<String>::new()),
            ComponentKind::KmsKey => base
                .with("keyUsage", "ENCRYPT_DECRYPT")
                .with("rotation", true),
            ComponentKind::S3Bucket => base
                .with("versioning", false)
                .with("encryption", true)
                .with("accessControl", "private"),
            ComponentKind::EfsFileSystem => base
                .with("performanceMode", "generalPurpose")
                .with("throughputMode", "bursting"),
            ComponentKind::SqsQueue => base
                .with("queueType", "standard")
                .with("delaySeconds", 0)
                .with("retentionPeriod", 345_600)
                .with("visibilityTimeout", 30),
            ComponentKind::SnsTopic => base
                .with("protocol", "email")
                .with("subscribers", Vec::<String>::new()),
            ComponentKind::InternetGateway => base.with("attachedVPCs", Vec::<String>::new()),
            ComponentKind::ApiGateway => base
                .with("endpointType", "edge")
                .with("apiType", "rest")
                .with("stages", vec!["dev", "prod"]),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default record for any type name.
///
/// Unknown names get a record holding only `name`, so documents written by a
/// newer catalog still load.
pub fn default_properties(type_name: &str) -> Properties {
    ComponentKind::from_name(type_name)
        .map(ComponentKind::default_properties)
        .unwrap_or_else(|| Properties::named(type_name))
}

pub fn category_of(type_name: &str) -> Option<Category> {
    ComponentKind::from_name(type_name).map(ComponentKind::category)
}
