//! Advisory validation of component configuration records.
//!
//! [`validate`] never fails and never blocks an edit. Only fields that are
//! present are checked; a missing field (or an empty text field) means the
//! user has not filled it in yet.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::catalog::ComponentKind;
use crate::properties::{Properties, PropertyValue};

/// A violated constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path, e.g. `ipAddress` or `inboundRules[0].port`.
    pub field: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Run the checks for `type_name` against `config`.
///
/// Unknown type names have no checks.
pub fn validate(type_name: &str, config: &Properties) -> Vec<Violation> {
    let Some(kind) = ComponentKind::from_name(type_name) else {
        return Vec::new();
    };

    let mut check = Checker::new(config);
    match kind {
        ComponentKind::Ec2Instance => {
            check.text("ipAddress", is_valid_ipv4, "Invalid IP address");
            check.text("hostname", is_valid_hostname, "Invalid hostname");
            check.text("ami", is_valid_ami, "Invalid AMI ID format");
        }
        ComponentKind::AutoScalingGroup => check.scaling_bounds(),
        ComponentKind::LambdaFunction => {
            check.range(
                "memorySize",
                128.0,
                10_240.0,
                "Memory size must be between 128MB and 10240MB",
            );
            check.range("timeout", 1.0, 900.0, "Timeout must be between 1 and 900 seconds");
        }
        ComponentKind::Vpc | ComponentKind::Subnet => {
            check.text("cidrBlock", is_valid_cidr, "Invalid CIDR block");
        }
        ComponentKind::Route53 => {
            check.text("domainName", is_valid_hostname, "Invalid domain name");
            check.at_least("ttl", 0.0, "TTL cannot be negative");
        }
        ComponentKind::RdsDatabase => {
            check.port("port");
            check.text("databaseName", is_valid_database_name, "Invalid database name");
        }
        ComponentKind::DynamoDbTable => {
            check.at_least("readCapacity", 0.0, "Read capacity cannot be negative");
            check.at_least("writeCapacity", 0.0, "Write capacity cannot be negative");
        }
        ComponentKind::ElastiCacheCluster => {
            check.port("port");
            check.at_least("numNodes", 1.0, "Number of nodes must be at least 1");
        }
        ComponentKind::S3Bucket => {
            check.text("bucketName", is_valid_bucket_name, "Invalid bucket name");
        }
        ComponentKind::EfsFileSystem => {
            check.at_least(
                "provisionedThroughput",
                0.0,
                "Provisioned throughput cannot be negative",
            );
        }
        ComponentKind::SqsQueue => {
            check.range("delaySeconds", 0.0, 900.0, "Delay seconds must be between 0 and 900");
            check.range(
                "retentionPeriod",
                60.0,
                1_209_600.0,
                "Retention period must be between 60 seconds and 14 days",
            );
            check.range(
                "visibilityTimeout",
                0.0,
                43_200.0,
                "Visibility timeout must be between 0 and 12 hours",
            );
        }
        ComponentKind::SnsTopic => {
            check.text("topicName", is_valid_topic_name, "Invalid topic name");
        }
        ComponentKind::ApiGateway => {
            check.text_list("stages", is_valid_stage_name, "Invalid stage name");
        }
        ComponentKind::SecurityGroup => {
            check.rules("inboundRules");
            check.rules("outboundRules");
        }
        ComponentKind::LoadBalancer
        | ComponentKind::IamRole
        | ComponentKind::KmsKey
        | ComponentKind::InternetGateway => {}
    }
    check.finish()
}

struct Checker<'a> {
    config: &'a Properties,
    violations: Vec<Violation>,
}

impl<'a> Checker<'a> {
    fn new(config: &'a Properties) -> Self {
        Self {
            config,
            violations: Vec::new(),
        }
    }

    fn finish(self) -> Vec<Violation> {
        self.violations
    }

    fn report(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    fn present(&self, field: &str) -> Option<&'a PropertyValue> {
        self.config.get(field).filter(|value| !value.is_blank())
    }

    fn number(&mut self, field: &str) -> Option<f64> {
        let value = self.present(field)?;
        let number = value.as_f64();
        if number.is_none() {
            self.report(field, "Must be a number");
        }
        number
    }

    fn text(&mut self, field: &str, valid: fn(&str) -> bool, message: &str) {
        let Some(value) = self.present(field) else {
            return;
        };
        match value.as_str() {
            Some(s) if !valid(s) => self.report(field, message),
            Some(_) => {}
            None => self.report(field, "Must be text"),
        }
    }

    fn text_list(&mut self, field: &str, valid: fn(&str) -> bool, message: &str) {
        let Some(value) = self.present(field) else {
            return;
        };
        let Some(items) = value.as_list() else {
            self.report(field, "Must be a list");
            return;
        };
        if items.iter().any(|item| !item.as_str().is_some_and(valid)) {
            self.report(field, message);
        }
    }

    fn range(&mut self, field: &str, min: f64, max: f64, message: &str) {
        if let Some(n) = self.number(field) {
            if n < min || n > max {
                self.report(field, message);
            }
        }
    }

    fn at_least(&mut self, field: &str, min: f64, message: &str) {
        if let Some(n) = self.number(field) {
            if n < min {
                self.report(field, message);
            }
        }
    }

    fn port(&mut self, field: &str) {
        if let Some(n) = self.number(field) {
            if !is_valid_port(n) {
                self.report(field, "Invalid port number");
            }
        }
    }

    /// min ≥ 0 and min ≤ desired ≤ max, each bound checked only when present.
    fn scaling_bounds(&mut self) {
        let min = self.number("minSize");
        let max = self.number("maxSize");
        let desired = self.number("desiredCapacity");

        if min.is_some_and(|min| min < 0.0) {
            self.report("minSize", "Minimum size cannot be negative");
        }
        if let (Some(min), Some(max)) = (min, max) {
            if max < min {
                self.report(
                    "maxSize",
                    "Maximum size must be greater than or equal to minimum size",
                );
            }
        }
        if let Some(desired) = desired {
            if min.is_some_and(|min| desired < min) || max.is_some_and(|max| desired > max) {
                self.report(
                    "desiredCapacity",
                    "Desired capacity must be between minimum and maximum size",
                );
            }
        }
    }

    fn rules(&mut self, field: &str) {
        let Some(value) = self.present(field) else {
            return;
        };
        let Some(rules) = value.as_list() else {
            self.report(field, "Must be a list of rules");
            return;
        };
        for (i, rule) in rules.iter().enumerate() {
            match rule.as_object() {
                Some(rule) => {
                    for (part, message) in rule_problems(rule) {
                        self.report(format!("{field}[{i}].{part}"), message);
                    }
                }
                None => self.report(format!("{field}[{i}]"), "Must be a rule object"),
            }
        }
    }
}

// --- Format checks ---

/// Dotted quad, each octet 0-255.
pub fn is_valid_ipv4(ip: &str) -> bool {
    let octets: Vec<&str> = ip.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            (1..=3).contains(&octet.len())
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().is_ok_and(|n| n <= 255)
        })
}

/// IPv4 address plus a /0-/32 prefix.
pub fn is_valid_cidr(cidr: &str) -> bool {
    let Some((ip, prefix)) = cidr.split_once('/') else {
        return false;
    };
    is_valid_ipv4(ip)
        && (1..=2).contains(&prefix.len())
        && prefix.bytes().all(|b| b.is_ascii_digit())
        && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
}

pub fn is_valid_port(port: f64) -> bool {
    port.fract() == 0.0 && (0.0..=65_535.0).contains(&port)
}

/// DNS hostname: dot-separated labels of 1-63 alphanumerics and inner hyphens.
pub fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty() && hostname.len() <= 255 && hostname.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            bytes.len() <= 63
                && first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

/// `ami-` followed by 8-17 lowercase hex digits.
pub fn is_valid_ami(ami: &str) -> bool {
    ami.strip_prefix("ami-").is_some_and(|hex| {
        (8..=17).contains(&hex.len()) && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

pub fn is_valid_bucket_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let edge_ok = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    (3..=63).contains(&bytes.len())
        && bytes.first().is_some_and(edge_ok)
        && bytes.last().is_some_and(edge_ok)
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'.' || *b == b'-')
        && !name.contains("..")
        && !name.contains(".-")
        && !name.contains("-.")
}

/// Starts with a letter, then letters, digits or underscores; at most 64 chars.
pub fn is_valid_database_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn is_valid_topic_name(name: &str) -> bool {
    is_token(name, 256)
}

pub fn is_valid_stage_name(name: &str) -> bool {
    is_token(name, 128)
}

fn is_token(name: &str, max_len: usize) -> bool {
    (1..=max_len).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// `sg-` followed by 8-17 lowercase hex digits.
pub fn is_valid_security_group_id(id: &str) -> bool {
    id.strip_prefix("sg-").is_some_and(|hex| {
        (8..=17).contains(&hex.len()) && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

// --- Security group rules ---

const RULE_PROTOCOLS: [&str; 5] = ["tcp", "udp", "icmp", "all", "-1"];

/// Problems with one security-group rule, as `(part, message)` pairs.
///
/// Parts that are absent are skipped like any other unspecified field.
pub fn rule_problems(rule: &BTreeMap<String, PropertyValue>) -> Vec<(&'static str, &'static str)> {
    let mut problems = Vec::new();
    let present = |key: &str| rule.get(key).filter(|v| !v.is_blank());

    if let Some(protocol) = present("protocol") {
        if !protocol.as_str().is_some_and(|p| RULE_PROTOCOLS.contains(&p)) {
            problems.push(("protocol", "Protocol must be tcp, udp, icmp or all"));
        }
    }
    if let Some(port) = present("port") {
        if !is_valid_port_spec(port) {
            problems.push(("port", "Port must be 0-65535 or a low-high range"));
        }
    }
    if let Some(source) = present("source") {
        let valid = source
            .as_str()
            .is_some_and(|s| is_valid_cidr(s) || is_valid_security_group_id(s));
        if !valid {
            problems.push(("source", "Source must be a CIDR block or security group ID"));
        }
    }
    if let Some(description) = present("description") {
        if !description.as_str().is_some_and(|d| d.chars().count() <= 255) {
            problems.push(("description", "Description must be at most 255 characters"));
        }
    }
    problems
}

/// A single port, or a `low-high` range with both ends in range and low ≤ high.
pub fn is_valid_port_spec(port: &PropertyValue) -> bool {
    if let Some(n) = port.as_f64() {
        return is_valid_port(n);
    }
    let Some(spec) = port.as_str() else {
        return false;
    };
    let parse = |s: &str| -> Option<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok().filter(|n| *n <= 65_535)
    };
    match spec.split_once('-') {
        Some((low, high)) => matches!((parse(low), parse(high)), (Some(low), Some(high)) if low <= high),
        None => parse(spec).is_some(),
    }
}
