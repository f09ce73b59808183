pub mod autosave;
pub mod catalog;
pub mod config;
pub mod diagram;
pub mod interchange;
pub mod persist;
pub mod properties;
pub mod rules;
pub mod session;
pub mod store;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

pub use catalog::{category_of, default_properties, Category, ComponentKind};
pub use diagram::{ConnectionRequest, ModelError};
pub use interchange::ImportError;
pub use persist::{DiagramManager, PersistError};
pub use properties::{Properties, PropertyValue};
pub use rules::{can_connect, ConnectionRejected, ConnectionRules};
pub use session::{EditorSession, SessionError};
pub use store::{FileStore, MemoryStore, Store, StoreError, StoreKey};
pub use validate::{validate, Violation};

// --- Types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A placed cloud resource. Matches the node the canvas draws.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    /// Catalog type name, e.g. "EC2 Instance".
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub position: Position,
    /// Empty when a legacy document omitted it; loaders backfill from the catalog.
    #[serde(default, alias = "properties")]
    pub config: Properties,
}

/// Optional link attributes shown on the edge inspector.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<String>,
}

/// A directed edge. `source` is the side that initiated the relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ConnectionProperties>,
}

impl Connection {
    /// True if the component is either endpoint.
    pub fn involves(&self, component_id: &str) -> bool {
        self.source == component_id || self.target == component_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default, alias = "isAutosaved", skip_serializing_if = "is_false")]
    pub autosaved: bool,
}

fn first_version() -> u32 {
    1
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Immutable snapshot of a diagram's contents at one version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagramVersion {
    pub version: u32,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DiagramVersion {
    pub fn of(diagram: &Diagram, description: Option<&str>) -> Self {
        Self {
            version: diagram.version,
            components: diagram.components.clone(),
            connections: diagram.connections.clone(),
            timestamp: diagram.updated_at,
            description: description.map(str::to_string),
        }
    }
}

/// Index entry used to list diagrams without reading their bodies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagramMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_version: u32,
}

impl From<&Diagram> for DiagramMetadata {
    fn from(diagram: &Diagram) -> Self {
        Self {
            id: diagram.id.clone(),
            name: diagram.name.clone(),
            description: diagram.description.clone(),
            created_at: diagram.created_at,
            updated_at: diagram.updated_at,
            current_version: diagram.version,
        }
    }
}

/// Mint a fresh opaque identifier. Never reused.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// --- Storage ---

/// Resolve the default data directory (~/.stratus/).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stratus")
}
