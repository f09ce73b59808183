//! Export and import of self-contained diagram documents.
//!
//! A document is the diagram body as JSON. On import its `id`, timestamps and
//! `version` are ignored: the result is always a fresh diagram at version 1.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::{Component, Connection, Diagram};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid diagram document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid diagram document: component id {0} appears more than once")]
    DuplicateComponent(String),
    #[error("invalid diagram document: connection {connection} references missing component {endpoint}")]
    DanglingConnection { connection: String, endpoint: String },
}

/// The parts of a document that survive import.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiagramDocument {
    name: String,
    #[serde(default)]
    description: Option<String>,
    components: Vec<Component>,
    #[serde(default)]
    connections: Vec<Connection>,
}

pub fn export(diagram: &Diagram) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(diagram)
}

/// Parse a document into a new diagram with a fresh id.
///
/// Components whose config is missing get their type's defaults.
pub fn import(json: &str) -> Result<Diagram, ImportError> {
    let document: DiagramDocument = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    for component in &document.components {
        if !seen.insert(component.id.as_str()) {
            return Err(ImportError::DuplicateComponent(component.id.clone()));
        }
    }
    for connection in &document.connections {
        for endpoint in [&connection.source, &connection.target] {
            if !seen.contains(endpoint.as_str()) {
                return Err(ImportError::DanglingConnection {
                    connection: connection.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
    }

    let mut diagram = Diagram::new(&document.name, document.description.as_deref());
    diagram.components = document.components;
    diagram.connections = document.connections;
    diagram.backfill_missing_config();
    Ok(diagram)
}

/// Suggested download name: lower-cased, whitespace runs as `-`, `.json` suffix.
pub fn file_name(diagram_name: &str) -> String {
    let slug = diagram_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{slug}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_properties;
    use crate::rules::ConnectionRules;
    use crate::{ConnectionRequest, Position};

    fn sample() -> Diagram {
        let mut diagram = Diagram::new("Prod Network", Some("main account"));
        let vpc = diagram.add_component("VPC", Position::new(10.0, 20.0));
        let subnet = diagram.add_component("Subnet", Position::new(30.0, 40.0));
        diagram
            .add_connection(
                &ConnectionRules::aws(),
                ConnectionRequest::new(&vpc, &subnet).label("contains"),
            )
            .unwrap();
        diagram.version = 7;
        diagram
    }

    #[test]
    fn round_trip_keeps_contents_and_resets_identity() {
        let original = sample();
        let imported = import(&export(&original).unwrap()).unwrap();

        assert_ne!(imported.id, original.id);
        assert_eq!(imported.version, 1);
        assert!(!imported.autosaved);
        assert_eq!(imported.name, original.name);
        assert_eq!(imported.description, original.description);
        assert_eq!(imported.components, original.components);
        assert_eq!(imported.connections, original.connections);
    }

    #[test]
    fn export_uses_interchange_field_names() {
        let json = export(&sample()).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"type\": \"VPC\""));
        assert!(json.contains("\"config\""));
    }

    #[test]
    fn missing_config_is_backfilled() {
        let json = r#"{
            "id": "old",
            "name": "Legacy",
            "components": [{"id": "c1", "type": "RDS Database", "position": {"x": 0, "y": 0}}],
            "connections": [],
            "createdAt": "2023-01-01T00:00:00Z",
            "updatedAt": "2023-01-01T00:00:00Z",
            "version": 4
        }"#;
        let diagram = import(json).unwrap();
        assert_eq!(diagram.components[0].config, default_properties("RDS Database"));
        assert_ne!(diagram.id, "old");
    }

    #[test]
    fn null_configs_and_fields_do_not_reject_the_document() {
        let json = r#"{"name":"Nulls","components":[
            {"id":"a","type":"SQS Queue","config":null},
            {"id":"b","type":"EC2 Instance","config":{"name":"EC2 Instance","ipAddress":null,"instanceType":"t3.micro"}}
        ]}"#;
        let diagram = import(json).unwrap();
        assert_eq!(diagram.components[0].config, default_properties("SQS Queue"));
        let config = &diagram.components[1].config;
        assert!(!config.contains_key("ipAddress"));
        assert_eq!(config.get("instanceType").and_then(|v| v.as_str()), Some("t3.micro"));
    }

    #[test]
    fn legacy_properties_key_is_accepted() {
        let json = r#"{"name":"L","components":[{"id":"a","type":"VPC","properties":{"name":"VPC","cidrBlock":"10.1.0.0/16"}}]}"#;
        let diagram = import(json).unwrap();
        assert_eq!(
            diagram.components[0].config.get("cidrBlock").and_then(|v| v.as_str()),
            Some("10.1.0.0/16")
        );
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(import("not json"), Err(ImportError::Malformed(_))));
        assert!(matches!(import(r#"{"name":"x"}"#), Err(ImportError::Malformed(_))));
    }

    #[test]
    fn dangling_and_duplicate_ids_are_rejected() {
        let dangling = r#"{"name":"x","components":[{"id":"a","type":"VPC"}],
            "connections":[{"id":"e","source":"a","target":"b"}]}"#;
        assert!(matches!(
            import(dangling),
            Err(ImportError::DanglingConnection { endpoint, .. }) if endpoint == "b"
        ));

        let duplicate = r#"{"name":"x","components":[{"id":"a","type":"VPC"},{"id":"a","type":"Subnet"}]}"#;
        assert!(matches!(import(duplicate), Err(ImportError::DuplicateComponent(id)) if id == "a"));
    }

    #[test]
    fn file_names_are_slugged() {
        assert_eq!(file_name("Prod  Network\tEU"), "prod-network-eu.json");
        assert_eq!(file_name("api"), "api.json");
    }
}
