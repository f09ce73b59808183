//! In-memory graph operations on [`Diagram`].
//!
//! Every mutation either applies completely or leaves the diagram untouched.
//! Removing a component also removes each connection that references it, so
//! a diagram never holds an edge with a missing endpoint.

use chrono::Utc;
use log::{debug, warn};
use thiserror::Error;

use crate::catalog::default_properties;
use crate::properties::Properties;
use crate::rules::{ConnectionRejected, ConnectionRules};
use crate::validate::{validate, Violation};
use crate::{new_id, Component, Connection, ConnectionProperties, Diagram, Position};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("component not found: {0}")]
    ComponentNotFound(String),
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),
    #[error(transparent)]
    Rejected(#[from] ConnectionRejected),
    #[error("a connection from {source_id} to {target_id} already exists")]
    DuplicateConnection { source_id: String, target_id: String },
}

/// A user-drawn edge waiting to be checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionRequest {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub properties: Option<ConnectionProperties>,
}

impl ConnectionRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn properties(mut self, properties: ConnectionProperties) -> Self {
        self.properties = Some(properties);
        self
    }
}

impl Diagram {
    /// An empty, unsaved diagram at version 1.
    pub fn new(name: &str, description: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.to_string(),
            description: description.map(str::to_string),
            components: Vec::new(),
            connections: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
            autosaved: false,
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    fn component_mut(&mut self, id: &str) -> Result<&mut Component, ModelError> {
        self.components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ModelError::ComponentNotFound(id.to_string()))
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Connections with `component_id` at either end.
    pub fn connections_of<'a>(&'a self, component_id: &'a str) -> impl Iterator<Item = &'a Connection> {
        self.connections.iter().filter(move |c| c.involves(component_id))
    }

    /// Place a new component seeded with its type's default record.
    ///
    /// Unknown type names are accepted and get a name-only record.
    pub fn add_component(&mut self, component_type: &str, position: Position) -> String {
        let id = new_id();
        self.components.push(Component {
            id: id.clone(),
            component_type: component_type.to_string(),
            position,
            config: default_properties(component_type),
        });
        self.touch();
        debug!(diagram = self.id.as_str(), component = id.as_str(), kind = component_type; "component added");
        id
    }

    /// Replace a component's record wholesale.
    pub fn update_component_properties(
        &mut self,
        id: &str,
        config: Properties,
    ) -> Result<(), ModelError> {
        self.component_mut(id)?.config = config;
        self.touch();
        Ok(())
    }

    pub fn move_component(&mut self, id: &str, position: Position) -> Result<(), ModelError> {
        self.component_mut(id)?.position = position;
        self.touch();
        Ok(())
    }

    /// Remove a component and every connection that references it.
    pub fn remove_component(&mut self, id: &str) -> Result<Component, ModelError> {
        let index = self
            .components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ModelError::ComponentNotFound(id.to_string()))?;
        let removed = self.components.remove(index);

        let before = self.connections.len();
        self.connections.retain(|c| !c.involves(id));
        let dropped = before - self.connections.len();

        self.touch();
        debug!(diagram = self.id.as_str(), component = id, connections = dropped; "component removed");
        Ok(removed)
    }

    /// Add an edge if both endpoints exist, the rule table allows it and no
    /// edge already joins the same source and target.
    pub fn add_connection(
        &mut self,
        rules: &ConnectionRules,
        request: ConnectionRequest,
    ) -> Result<String, ModelError> {
        let source = self
            .component(&request.source)
            .ok_or_else(|| ModelError::ComponentNotFound(request.source.clone()))?;
        let target = self
            .component(&request.target)
            .ok_or_else(|| ModelError::ComponentNotFound(request.target.clone()))?;

        if let Err(rejected) = rules.check(&source.component_type, &target.component_type) {
            warn!(diagram = self.id.as_str(); "{rejected}");
            return Err(rejected.into());
        }

        if self
            .connections
            .iter()
            .any(|c| c.source == request.source && c.target == request.target)
        {
            return Err(ModelError::DuplicateConnection {
                source_id: request.source,
                target_id: request.target,
            });
        }

        let id = new_id();
        self.connections.push(Connection {
            id: id.clone(),
            source: request.source,
            target: request.target,
            label: request.label,
            kind: None,
            properties: request.properties,
        });
        self.touch();
        Ok(id)
    }

    pub fn remove_connection(&mut self, id: &str) -> Result<Connection, ModelError> {
        let index = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ModelError::ConnectionNotFound(id.to_string()))?;
        let removed = self.connections.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn validate_component(&self, id: &str) -> Result<Vec<Violation>, ModelError> {
        let component = self
            .component(id)
            .ok_or_else(|| ModelError::ComponentNotFound(id.to_string()))?;
        Ok(validate(&component.component_type, &component.config))
    }

    /// Paste a copied record onto a component.
    ///
    /// Applies only when the copied record's `name` equals the target's type
    /// name; the target keeps its own `name`. Returns whether anything changed.
    pub fn paste_properties(&mut self, id: &str, copied: &Properties) -> Result<bool, ModelError> {
        let component = self.component_mut(id)?;
        if copied.name() != Some(component.component_type.as_str()) {
            return Ok(false);
        }

        let mut config = copied.clone();
        match component.config.get("name").cloned() {
            Some(name) => {
                config.insert("name", name);
            }
            None => {
                config.remove("name");
            }
        }
        component.config = config;
        self.touch();
        Ok(true)
    }

    /// Seed empty records from the catalog. Returns how many were filled.
    pub fn backfill_missing_config(&mut self) -> usize {
        let mut filled = 0;
        for component in self.components.iter_mut().filter(|c| c.config.is_empty()) {
            component.config = default_properties(&component.component_type);
            filled += 1;
        }
        filled
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
