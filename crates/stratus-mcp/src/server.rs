use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Deserialize;
use stratus_core::interchange::{export, file_name};
use stratus_core::rules::RULES;
use stratus_core::{
    Category, ComponentKind, ConnectionProperties, ConnectionRequest, EditorSession, FileStore,
    Position, Properties, Violation,
};

const INSTRUCTIONS: &str = r#"Stratus edits cloud architecture diagrams built from AWS components.

One diagram is open at a time. Call `create_diagram` or `open_diagram` first; every editing tool works on the open diagram.

Workflow:
1. `list_component_types` shows the palette and which types each type may connect to.
2. `add_components` places components; each starts with its type's default properties.
3. `add_connections` links them. The connection table is directed and rejections say which two types are incompatible.
4. `update_component` replaces a component's properties and reports validation problems. Problems are advisory.
5. `save_diagram` writes a new version. While a saved diagram is being edited it is also autosaved after a quiet period."#;

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct CreateDiagramRequest {
    /// Display name of the new diagram
    name: String,
    /// Optional free-text description
    description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DiagramIdRequest {
    /// ID of a saved diagram (see list_diagrams)
    id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct OptionalDiagramIdRequest {
    /// ID of a saved diagram. Omit to use the open diagram.
    id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddComponentItem {
    /// Component type name exactly as listed by list_component_types, e.g. "EC2 Instance"
    #[serde(rename = "type")]
    component_type: String,
    /// X position on canvas. Default: auto-grid.
    x: Option<f64>,
    /// Y position on canvas. Default: auto-grid.
    y: Option<f64>,
    /// Properties as a JSON object string. Replaces the type defaults when given.
    properties: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddComponentsRequest {
    /// Components to place on the open diagram
    components: Vec<AddComponentItem>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateComponentRequest {
    /// ID of the component to update
    component_id: String,
    /// Complete properties as a JSON object string, e.g. {"name":"web","instanceType":"t3.small"}. Replaces the existing record.
    properties: Option<String>,
    /// New X position
    x: Option<f64>,
    /// New Y position
    y: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ComponentIdsRequest {
    /// IDs of the components to delete. Their connections are deleted too.
    component_ids: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ComponentIdRequest {
    /// ID of the component
    component_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddConnectionItem {
    /// ID of the source component (the side that depends on the target)
    source: String,
    /// ID of the target component
    target: String,
    /// Optional edge label
    label: Option<String>,
    /// Optional link attributes: protocol, port, encrypted, bandwidth
    properties: Option<ConnectionProperties>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddConnectionsRequest {
    /// Connections to add to the open diagram
    connections: Vec<AddConnectionItem>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ConnectionIdsRequest {
    /// IDs of the connections to delete
    connection_ids: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SaveDiagramRequest {
    /// Optional note stored with the new version
    description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ImportDiagramRequest {
    /// The interchange document as a JSON string (the output of export_diagram)
    document: String,
}

// --- Server ---

type SharedSession = Arc<Mutex<EditorSession<FileStore>>>;

#[derive(Clone)]
pub struct StratusServer {
    session: SharedSession,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl StratusServer {
    pub fn new(session: EditorSession<FileStore>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    /// Handle for the autosave ticker.
    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    fn lock(&self) -> Result<MutexGuard<'_, EditorSession<FileStore>>, McpError> {
        self.session
            .lock()
            .map_err(|_| McpError::internal_error("editor session lock poisoned", None))
    }

    #[tool(description = "List the component types that can be placed, grouped by category, with the types each may connect to")]
    fn list_component_types(&self) -> Result<CallToolResult, McpError> {
        let session = self.lock()?;
        let rules = session.rules();
        let mut lines = Vec::new();
        for category in CATEGORIES {
            lines.push(format!("## {category}"));
            for kind in ComponentKind::ALL.iter().filter(|k| k.category() == category) {
                let targets: Vec<&str> = rules.targets(kind.name()).collect();
                lines.push(format!("- {} -> {}", kind.name(), targets.join(", ")));
            }
        }
        Ok(CallToolResult::success(vec![Content::text(lines.join("\n"))]))
    }

    #[tool(description = "List all saved diagrams with their current version")]
    fn list_diagrams(&self) -> Result<CallToolResult, McpError> {
        let session = self.lock()?;
        match session.manager().list() {
            Ok(diagrams) if diagrams.is_empty() => Ok(CallToolResult::success(vec![Content::text(
                "No diagrams found. Use create_diagram to start one.",
            )])),
            Ok(diagrams) => {
                let lines: Vec<String> = diagrams
                    .iter()
                    .map(|d| {
                        format!(
                            "{} ({}) v{} updated {}",
                            d.name,
                            d.id,
                            d.current_version,
                            d.updated_at.to_rfc3339()
                        )
                    })
                    .collect();
                Ok(CallToolResult::success(vec![Content::text(lines.join("\n"))]))
            }
            Err(e) => Ok(failure(e)),
        }
    }

    #[tool(description = "Create a new empty diagram and make it the open diagram. It is not saved until save_diagram is called; the previously open diagram is not saved.")]
    fn create_diagram(
        &self,
        Parameters(req): Parameters<CreateDiagramRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.lock()?;
        let diagram = session.create_diagram(&req.name, req.description.as_deref());
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Created diagram '{}' ({})",
            diagram.name, diagram.id
        ))]))
    }

    #[tool(description = "Open a saved diagram by ID")]
    fn open_diagram(
        &self,
        Parameters(req): Parameters<DiagramIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.lock()?;
        match session.open(&req.id) {
            Ok(diagram) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Opened '{}' at version {} ({} components, {} connections)",
                diagram.name,
                diagram.version,
                diagram.components.len(),
                diagram.connections.len()
            ))])),
            Err(e) => Ok(failure(e)),
        }
    }

    #[tool(
        description = "Get the open diagram as JSON: {id, name, description?, components: [{id, type, position, config}], connections: [{id, source, target, label?, properties?}], createdAt, updatedAt, version}"
    )]
    fn get_diagram(&self) -> Result<CallToolResult, McpError> {
        let session = self.lock()?;
        let Some(diagram) = session.active() else {
            return Ok(no_diagram());
        };
        match serde_json::to_string_pretty(diagram) {
            Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
            Err(e) => Ok(failure(format!("Serialization error: {e}"))),
        }
    }

    #[tool(description = "Add one or more components to the open diagram. Each starts with its type's default properties unless properties are given.")]
    fn add_components(
        &self,
        Parameters(req): Parameters<AddComponentsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut parsed = Vec::with_capacity(req.components.len());
        for item in req.components {
            let properties = item.properties.as_deref().map(parse_properties).transpose()?;
            parsed.push((item.component_type, item.x, item.y, properties));
        }

        let mut session = self.lock()?;
        let Some(existing) = session.active().map(|d| d.components.len()) else {
            return Ok(no_diagram());
        };

        let mut lines = Vec::new();
        for (i, (component_type, x, y, properties)) in parsed.into_iter().enumerate() {
            let (gx, gy) = grid_position(existing + i);
            let position = Position::new(x.unwrap_or(gx), y.unwrap_or(gy));
            let id = match session.add_component(&component_type, position) {
                Ok(id) => id,
                Err(e) => return Ok(failure(e)),
            };
            if ComponentKind::from_name(&component_type).is_none() {
                lines.push(format!("{id}: {component_type} (unknown type, no defaults)"));
            } else {
                lines.push(format!("{id}: {component_type}"));
            }
            if let Some(properties) = properties {
                match session.update_component_properties(&id, properties) {
                    Ok(violations) => lines.extend(violation_lines(&violations)),
                    Err(e) => return Ok(failure(e)),
                }
            }
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Added {} component(s)\n{}",
            lines.iter().filter(|l| !l.starts_with("  ")).count(),
            lines.join("\n")
        ))]))
    }

    #[tool(description = "Replace a component's properties and/or move it. Validation problems are reported but do not block the update.")]
    fn update_component(
        &self,
        Parameters(req): Parameters<UpdateComponentRequest>,
    ) -> Result<CallToolResult, McpError> {
        let properties = req.properties.as_deref().map(parse_properties).transpose()?;
        let mut session = self.lock()?;

        if req.x.is_some() || req.y.is_some() {
            let current = session
                .active()
                .and_then(|d| d.component(&req.component_id))
                .map(|c| c.position)
                .unwrap_or_default();
            let position = Position::new(req.x.unwrap_or(current.x), req.y.unwrap_or(current.y));
            if let Err(e) = session.move_component(&req.component_id, position) {
                return Ok(failure(e));
            }
        }

        let violations = match properties {
            Some(properties) => {
                match session.update_component_properties(&req.component_id, properties) {
                    Ok(violations) => violations,
                    Err(e) => return Ok(failure(e)),
                }
            }
            None => match session.validate_component(&req.component_id) {
                Ok(violations) => violations,
                Err(e) => return Ok(failure(e)),
            },
        };

        let mut text = format!("Updated {}", req.component_id);
        for line in violation_lines(&violations) {
            text.push('\n');
            text.push_str(&line);
        }
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Delete one or more components. Connections touching them are deleted too. If any ID is unknown, nothing is deleted.")]
    fn delete_components(
        &self,
        Parameters(req): Parameters<ComponentIdsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.lock()?;
        let Some(diagram) = session.active() else {
            return Ok(no_diagram());
        };
        // All or nothing: check every ID before deleting any.
        let missing = unknown_ids(&req.component_ids, |id| diagram.component(id).is_some());
        if !missing.is_empty() {
            return Ok(failure(format!(
                "Component(s) not found: {}. Nothing was deleted.",
                missing.join(", ")
            )));
        }

        let mut removed = 0;
        for id in dedup(&req.component_ids) {
            if let Err(e) = session.remove_component(id) {
                return Ok(failure(e));
            }
            removed += 1;
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Deleted {removed} component(s)"
        ))]))
    }

    #[tool(description = "Add one or more directed connections. Each is checked against the connection table; rejected ones are reported and skipped.")]
    fn add_connections(
        &self,
        Parameters(req): Parameters<AddConnectionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.lock()?;
        if session.active().is_none() {
            return Ok(no_diagram());
        }

        let mut added = 0;
        let mut lines = Vec::new();
        for item in req.connections {
            let mut request = ConnectionRequest::new(&item.source, &item.target);
            if let Some(label) = item.label {
                request = request.label(label);
            }
            if let Some(properties) = item.properties {
                request = request.properties(properties);
            }
            match session.add_connection(request) {
                Ok(id) => {
                    added += 1;
                    lines.push(format!("{id}: {} -> {}", item.source, item.target));
                }
                Err(e) => lines.push(format!("rejected {} -> {}: {e}", item.source, item.target)),
            }
        }

        let text = format!("Added {added} connection(s)\n{}", lines.join("\n"));
        if added == 0 && !lines.is_empty() {
            Ok(failure(text))
        } else {
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
    }

    #[tool(description = "Delete one or more connections by ID. If any ID is unknown, nothing is deleted.")]
    fn delete_connections(
        &self,
        Parameters(req): Parameters<ConnectionIdsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.lock()?;
        let Some(diagram) = session.active() else {
            return Ok(no_diagram());
        };
        let missing = unknown_ids(&req.connection_ids, |id| diagram.connection(id).is_some());
        if !missing.is_empty() {
            return Ok(failure(format!(
                "Connection(s) not found: {}. Nothing was deleted.",
                missing.join(", ")
            )));
        }

        let mut removed = 0;
        for id in dedup(&req.connection_ids) {
            if let Err(e) = session.remove_connection(id) {
                return Ok(failure(e));
            }
            removed += 1;
        }
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Deleted {removed} connection(s)"
        ))]))
    }

    #[tool(description = "Check a component's properties against its type's constraints")]
    fn validate_component(
        &self,
        Parameters(req): Parameters<ComponentIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let session = self.lock()?;
        match session.validate_component(&req.component_id) {
            Ok(violations) if violations.is_empty() => Ok(CallToolResult::success(vec![
                Content::text("No problems found"),
            ])),
            Ok(violations) => Ok(CallToolResult::success(vec![Content::text(
                violation_lines(&violations).join("\n"),
            )])),
            Err(e) => Ok(failure(e)),
        }
    }

    #[tool(description = "Save the open diagram as a new version")]
    fn save_diagram(
        &self,
        Parameters(req): Parameters<SaveDiagramRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.lock()?;
        match session.save(req.description.as_deref()) {
            Ok(version) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Saved version {version}"
            ))])),
            Err(e) => Ok(failure(format!("Save failed, the diagram is still open: {e}"))),
        }
    }

    #[tool(description = "List the version history of a saved diagram")]
    fn list_versions(
        &self,
        Parameters(req): Parameters<OptionalDiagramIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let session = self.lock()?;
        let id = match (req.id, session.active()) {
            (Some(id), _) => id,
            (None, Some(diagram)) => diagram.id.clone(),
            (None, None) => return Ok(no_diagram()),
        };
        match session.manager().versions(&id) {
            Ok(versions) => {
                let lines: Vec<String> = versions
                    .iter()
                    .map(|v| {
                        format!(
                            "v{} {} {} components, {} connections{}",
                            v.version,
                            v.timestamp.to_rfc3339(),
                            v.components.len(),
                            v.connections.len(),
                            v.description
                                .as_deref()
                                .map(|d| format!(" ({d})"))
                                .unwrap_or_default()
                        )
                    })
                    .collect();
                Ok(CallToolResult::success(vec![Content::text(lines.join("\n"))]))
            }
            Err(e) => Ok(failure(e)),
        }
    }

    #[tool(description = "Export a diagram as a JSON interchange document. Omit id to export the open diagram, including unsaved edits.")]
    fn export_diagram(
        &self,
        Parameters(req): Parameters<OptionalDiagramIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let session = self.lock()?;
        let exported = match req.id {
            Some(id) => session.manager().load(&id).map_err(|e| e.to_string()).and_then(|d| {
                export(&d)
                    .map(|json| (d.name, json))
                    .map_err(|e| e.to_string())
            }),
            None => match session.active() {
                Some(diagram) => session
                    .export()
                    .map(|json| (diagram.name.clone(), json))
                    .map_err(|e| e.to_string()),
                None => return Ok(no_diagram()),
            },
        };
        match exported {
            Ok((name, json)) => Ok(CallToolResult::success(vec![
                Content::text(format!("File name: {}", file_name(&name))),
                Content::text(json),
            ])),
            Err(e) => Ok(failure(e)),
        }
    }

    #[tool(description = "Import a JSON interchange document as a new saved diagram with a fresh ID. The open diagram does not change.")]
    fn import_diagram(
        &self,
        Parameters(req): Parameters<ImportDiagramRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut session = self.lock()?;
        match session.import(&req.document) {
            Ok(diagram) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Imported '{}' as {} ({} components, {} connections)",
                diagram.name,
                diagram.id,
                diagram.components.len(),
                diagram.connections.len()
            ))])),
            Err(e) => Ok(failure(e)),
        }
    }

    #[tool(description = "Get the modeling rules that govern how diagrams should be structured")]
    fn get_rules(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(RULES)]))
    }
}

#[tool_handler]
impl ServerHandler for StratusServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!("{}\n\n## Modeling Rules\n{}", INSTRUCTIONS, RULES);
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// --- Helpers ---

const CATEGORIES: [Category; 7] = [
    Category::Compute,
    Category::Database,
    Category::Networking,
    Category::Security,
    Category::Storage,
    Category::Integration,
    Category::Gateway,
];

fn failure(e: impl Display) -> CallToolResult {
    CallToolResult::error(vec![Content::text(e.to_string())])
}

fn no_diagram() -> CallToolResult {
    failure("No diagram is open. Use create_diagram or open_diagram first.")
}

fn parse_properties(json: &str) -> Result<Properties, McpError> {
    serde_json::from_str(json)
        .map_err(|e| McpError::invalid_params(format!("properties must be a JSON object: {e}"), None))
}

fn unknown_ids(ids: &[String], exists: impl Fn(&str) -> bool) -> Vec<&str> {
    ids.iter().map(String::as_str).filter(|id| !exists(id)).collect()
}

/// IDs in request order with repeats dropped.
fn dedup(ids: &[String]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}

fn violation_lines(violations: &[Violation]) -> Vec<String> {
    violations.iter().map(|v| format!("  warning: {v}")).collect()
}

/// Four columns, 200px apart, for components placed without coordinates.
fn grid_position(index: usize) -> (f64, f64) {
    let col = (index % 4) as f64;
    let row = (index / 4) as f64;
    (100.0 + col * 200.0, 100.0 + row * 150.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn server() -> (tempfile::TempDir, StratusServer) {
        let dir = tempfile::tempdir().unwrap();
        let session = EditorSession::new(FileStore::new(dir.path()));
        (dir, StratusServer::new(session))
    }

    fn outcome(result: Result<CallToolResult, McpError>) -> (bool, String) {
        let value = serde_json::to_value(result.unwrap()).unwrap();
        let is_error = value.get("isError").and_then(Value::as_bool).unwrap_or(false);
        let text = value["content"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");
        (is_error, text)
    }

    fn component_ids(server: &StratusServer) -> Vec<String> {
        let session = server.lock().unwrap();
        session
            .active()
            .unwrap()
            .components
            .iter()
            .map(|c| c.id.clone())
            .collect()
    }

    #[test]
    fn editing_requires_an_open_diagram() {
        let (_dir, server) = server();
        let (is_error, text) = outcome(server.get_diagram());
        assert!(is_error);
        assert!(text.contains("No diagram is open"));
    }

    #[test]
    fn rejected_connection_is_reported_and_not_added() {
        let (_dir, server) = server();
        outcome(server.create_diagram(Parameters(CreateDiagramRequest {
            name: "Net".into(),
            description: None,
        })));
        outcome(server.add_components(Parameters(AddComponentsRequest {
            components: vec![
                AddComponentItem {
                    component_type: "VPC".into(),
                    x: None,
                    y: None,
                    properties: None,
                },
                AddComponentItem {
                    component_type: "EC2 Instance".into(),
                    x: None,
                    y: None,
                    properties: None,
                },
            ],
        })));
        let ids = component_ids(&server);

        let (is_error, text) = outcome(server.add_connections(Parameters(AddConnectionsRequest {
            connections: vec![
                AddConnectionItem {
                    source: ids[0].clone(),
                    target: ids[1].clone(),
                    label: None,
                    properties: None,
                },
                AddConnectionItem {
                    source: ids[1].clone(),
                    target: ids[0].clone(),
                    label: None,
                    properties: None,
                },
            ],
        })));

        assert!(!is_error);
        assert!(text.starts_with("Added 1 connection(s)"));
        assert!(text.contains("EC2 Instance cannot be directly connected to VPC"));
        let session = server.lock().unwrap();
        assert_eq!(session.active().unwrap().connections.len(), 1);
    }

    #[test]
    fn update_reports_violations_as_warnings() {
        let (_dir, server) = server();
        outcome(server.create_diagram(Parameters(CreateDiagramRequest {
            name: "Net".into(),
            description: None,
        })));
        outcome(server.add_components(Parameters(AddComponentsRequest {
            components: vec![AddComponentItem {
                component_type: "EC2 Instance".into(),
                x: Some(10.0),
                y: Some(10.0),
                properties: None,
            }],
        })));
        let id = component_ids(&server).remove(0);

        let (is_error, text) = outcome(server.update_component(Parameters(UpdateComponentRequest {
            component_id: id,
            properties: Some(r#"{"name":"web","ipAddress":"10.0.0.999"}"#.into()),
            x: None,
            y: None,
        })));
        assert!(!is_error);
        assert!(text.contains("warning: ipAddress: Invalid IP address"));
    }

    #[test]
    fn malformed_properties_are_invalid_params() {
        let (_dir, server) = server();
        let result = server.update_component(Parameters(UpdateComponentRequest {
            component_id: "x".into(),
            properties: Some("[1, 2".into()),
            x: None,
            y: None,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn save_then_export_and_import() {
        let (_dir, server) = server();
        outcome(server.create_diagram(Parameters(CreateDiagramRequest {
            name: "Prod Net".into(),
            description: None,
        })));
        let (_, saved) = outcome(server.save_diagram(Parameters(SaveDiagramRequest {
            description: None,
        })));
        assert_eq!(saved, "Saved version 1");

        let (is_error, exported) = outcome(server.export_diagram(Parameters(
            OptionalDiagramIdRequest { id: None },
        )));
        assert!(!is_error);
        let (header, document) = exported.split_once('\n').unwrap();
        assert_eq!(header, "File name: prod-net.json");

        let (is_error, imported) = outcome(server.import_diagram(Parameters(ImportDiagramRequest {
            document: document.to_string(),
        })));
        assert!(!is_error, "{imported}");
        let (_, listed) = outcome(server.list_diagrams());
        assert_eq!(listed.lines().count(), 2);
    }

    #[test]
    fn palette_lists_every_type() {
        let (_dir, server) = server();
        let (_, text) = outcome(server.list_component_types());
        for kind in ComponentKind::ALL {
            assert!(text.contains(&format!("- {} ->", kind.name())), "{kind}");
        }
    }

    #[test]
    fn delete_with_an_unknown_id_deletes_nothing() {
        let (_dir, server) = server();
        outcome(server.create_diagram(Parameters(CreateDiagramRequest {
            name: "Net".into(),
            description: None,
        })));
        outcome(server.add_components(Parameters(AddComponentsRequest {
            components: vec![
                AddComponentItem {
                    component_type: "VPC".into(),
                    x: None,
                    y: None,
                    properties: None,
                },
                AddComponentItem {
                    component_type: "Subnet".into(),
                    x: None,
                    y: None,
                    properties: None,
                },
            ],
        })));
        let ids = component_ids(&server);

        let (is_error, text) = outcome(server.delete_components(Parameters(ComponentIdsRequest {
            component_ids: vec![ids[0].clone(), "ghost".into()],
        })));
        assert!(is_error);
        assert!(text.contains("ghost"));
        assert_eq!(component_ids(&server), ids);

        let (is_error, text) = outcome(server.delete_components(Parameters(ComponentIdsRequest {
            component_ids: vec![ids[0].clone(), ids[0].clone()],
        })));
        assert!(!is_error, "{text}");
        assert_eq!(text, "Deleted 1 component(s)");
        assert_eq!(component_ids(&server), [ids[1].clone()]);
    }

    #[test]
    fn grid_wraps_after_four() {
        assert_eq!(grid_position(0), (100.0, 100.0));
        assert_eq!(grid_position(5), (300.0, 250.0));
    }
}
