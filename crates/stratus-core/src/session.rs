//! The active editing session: one open diagram plus its autosave timer.

use std::time::Instant;

use log::{debug, info, warn};
use thiserror::Error;

use crate::autosave::Debouncer;
use crate::config::AutosaveConfig;
use crate::diagram::{ConnectionRequest, ModelError};
use crate::persist::{DiagramManager, PersistError};
use crate::properties::Properties;
use crate::rules::ConnectionRules;
use crate::store::Store;
use crate::validate::Violation;
use crate::{interchange, Component, Connection, Diagram, Position};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no diagram is open")]
    NoActiveDiagram,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub struct EditorSession<S> {
    manager: DiagramManager<S>,
    rules: ConnectionRules,
    active: Option<Diagram>,
    autosave: Debouncer,
    autosave_enabled: bool,
}

impl<S: Store> EditorSession<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &AutosaveConfig::default())
    }

    pub fn with_config(store: S, config: &AutosaveConfig) -> Self {
        Self {
            manager: DiagramManager::new(store),
            rules: ConnectionRules::aws(),
            active: None,
            autosave: Debouncer::new(config.interval()),
            autosave_enabled: config.enabled,
        }
    }

    pub fn with_rules(mut self, rules: ConnectionRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn manager(&self) -> &DiagramManager<S> {
        &self.manager
    }

    pub fn rules(&self) -> &ConnectionRules {
        &self.rules
    }

    pub fn active(&self) -> Option<&Diagram> {
        self.active.as_ref()
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_armed()
    }

    fn diagram(&self) -> Result<&Diagram, SessionError> {
        self.active.as_ref().ok_or(SessionError::NoActiveDiagram)
    }

    fn diagram_mut(&mut self) -> Result<&mut Diagram, SessionError> {
        self.active.as_mut().ok_or(SessionError::NoActiveDiagram)
    }

    fn edited(&mut self) {
        if self.autosave_enabled {
            self.autosave.arm(Instant::now());
        }
    }

    // --- Switching ---

    /// Start a new unsaved diagram. The previous one is dropped unsaved.
    pub fn create_diagram(&mut self, name: &str, description: Option<&str>) -> &Diagram {
        self.autosave.cancel();
        let diagram = Diagram::new(name, description);
        info!(diagram_id = diagram.id.as_str(), name; "Created diagram");
        self.active.insert(diagram)
    }

    /// Make a stored diagram active. On failure the current one stays open.
    pub fn open(&mut self, id: &str) -> Result<&Diagram, SessionError> {
        let diagram = self.manager.load(id)?;
        self.autosave.cancel();
        Ok(&*self.active.insert(diagram))
    }

    pub fn close(&mut self) -> Option<Diagram> {
        self.autosave.cancel();
        self.active.take()
    }

    // --- Mutations ---

    pub fn add_component(&mut self, component_type: &str, position: Position) -> Result<String, SessionError> {
        let id = self.diagram_mut()?.add_component(component_type, position);
        self.edited();
        Ok(id)
    }

    /// Replace a component's record and return its advisory violations.
    pub fn update_component_properties(
        &mut self,
        id: &str,
        config: Properties,
    ) -> Result<Vec<Violation>, SessionError> {
        let diagram = self.diagram_mut()?;
        diagram.update_component_properties(id, config)?;
        let violations = diagram.validate_component(id)?;
        if !violations.is_empty() {
            debug!(component = id, violations = violations.len(); "Component has validation violations");
        }
        self.edited();
        Ok(violations)
    }

    pub fn move_component(&mut self, id: &str, position: Position) -> Result<(), SessionError> {
        self.diagram_mut()?.move_component(id, position)?;
        self.edited();
        Ok(())
    }

    pub fn remove_component(&mut self, id: &str) -> Result<Component, SessionError> {
        let removed = self.diagram_mut()?.remove_component(id)?;
        self.edited();
        Ok(removed)
    }

    pub fn add_connection(&mut self, request: ConnectionRequest) -> Result<String, SessionError> {
        let diagram = self.active.as_mut().ok_or(SessionError::NoActiveDiagram)?;
        let id = diagram.add_connection(&self.rules, request)?;
        self.edited();
        Ok(id)
    }

    pub fn remove_connection(&mut self, id: &str) -> Result<Connection, SessionError> {
        let removed = self.diagram_mut()?.remove_connection(id)?;
        self.edited();
        Ok(removed)
    }

    /// Paste a copied record; see [`Diagram::paste_properties`].
    pub fn paste_properties(&mut self, id: &str, copied: &Properties) -> Result<bool, SessionError> {
        let applied = self.diagram_mut()?.paste_properties(id, copied)?;
        if applied {
            self.edited();
        }
        Ok(applied)
    }

    pub fn validate_component(&self, id: &str) -> Result<Vec<Violation>, SessionError> {
        Ok(self.diagram()?.validate_component(id)?)
    }

    // --- Persistence ---

    /// Explicit save. Clears any pending autosave once it succeeds.
    pub fn save(&mut self, description: Option<&str>) -> Result<u32, SessionError> {
        let diagram = self.active.as_mut().ok_or(SessionError::NoActiveDiagram)?;
        let version = self.manager.save(diagram, description)?;
        self.autosave.cancel();
        Ok(version)
    }

    /// Poll the autosave timer. Returns the new version if one was written.
    ///
    /// Unsaved drafts are never autosaved. A failed autosave is logged and
    /// returned; the timer stays disarmed until the next edit.
    pub fn tick(&mut self, now: Instant) -> Result<Option<u32>, SessionError> {
        if !self.autosave.fire(now) {
            return Ok(None);
        }
        let Some(diagram) = self.active.as_mut() else {
            return Ok(None);
        };
        if !self.manager.contains(&diagram.id)? {
            debug!(diagram_id = diagram.id.as_str(); "Skipping autosave of unsaved draft");
            return Ok(None);
        }

        match self.manager.autosave(diagram) {
            Ok(version) => Ok(Some(version)),
            Err(err) => {
                warn!(diagram_id = diagram.id.as_str(), error:% = err; "Autosave failed");
                Err(err.into())
            }
        }
    }

    /// Interchange document for the open diagram.
    pub fn export(&self) -> Result<String, SessionError> {
        interchange::export(self.diagram()?)
            .map_err(|e| SessionError::Persist(PersistError::Encode(e)))
    }

    /// Store a document as a new diagram. The open diagram is unchanged.
    pub fn import(&mut self, json: &str) -> Result<Diagram, SessionError> {
        Ok(self.manager.import(json)?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::MemoryStore;

    fn session() -> EditorSession<MemoryStore> {
        EditorSession::new(MemoryStore::new())
    }

    #[test]
    fn mutations_need_an_open_diagram() {
        let mut session = session();
        assert!(matches!(
            session.add_component("VPC", Position::default()),
            Err(SessionError::NoActiveDiagram)
        ));
        assert!(matches!(session.save(None), Err(SessionError::NoActiveDiagram)));
    }

    #[test]
    fn scenario_net() {
        let mut session = session();
        session.create_diagram("Net", None);
        let v1 = session.add_component("VPC", Position::default()).unwrap();
        let e1 = session.add_component("EC2 Instance", Position::default()).unwrap();

        session.add_connection(ConnectionRequest::new(&v1, &e1)).unwrap();
        let err = session
            .add_connection(ConnectionRequest::new(&e1, &v1))
            .unwrap_err();

        assert!(matches!(err, SessionError::Model(ModelError::Rejected(_))));
        assert_eq!(session.active().unwrap().connections.len(), 1);
    }

    #[test]
    fn update_reports_violations_without_blocking() {
        let mut session = session();
        session.create_diagram("Net", None);
        let asg = session
            .add_component("Auto Scaling Group", Position::default())
            .unwrap();
        let record = Properties::named("Auto Scaling Group")
            .with("minSize", 5)
            .with("maxSize", 2);

        let violations = session.update_component_properties(&asg, record.clone()).unwrap();

        assert!(violations.iter().any(|v| v.field == "maxSize"));
        assert_eq!(
            session.active().unwrap().component(&asg).unwrap().config,
            record
        );
        assert_eq!(session.save(None).unwrap(), 1);
    }

    #[test]
    fn autosave_fires_once_per_quiet_period() {
        let mut session = session();
        session.create_diagram("Net", None);
        session.save(None).unwrap();
        assert!(!session.autosave_pending());

        session.add_component("S3 Bucket", Position::default()).unwrap();
        assert!(session.autosave_pending());
        assert_eq!(session.tick(Instant::now()).unwrap(), None);

        let later = Instant::now() + AutosaveConfig::default().interval();
        assert_eq!(session.tick(later).unwrap(), Some(2));
        assert_eq!(session.tick(later + Duration::from_secs(60)).unwrap(), None);

        let id = session.active().unwrap().id.clone();
        let versions = session.manager().versions(&id).unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].description.as_deref(), Some("Autosaved"));
    }

    #[test]
    fn drafts_never_autosave() {
        let mut session = session();
        session.create_diagram("Draft", None);
        session.add_component("VPC", Position::default()).unwrap();

        let later = Instant::now() + AutosaveConfig::default().interval();
        assert_eq!(session.tick(later).unwrap(), None);
        assert!(session.manager().list().unwrap().is_empty());
    }

    #[test]
    fn switching_diagrams_cancels_the_timer() {
        let mut session = session();
        session.create_diagram("First", None);
        session.save(None).unwrap();
        let first = session.active().unwrap().id.clone();
        session.add_component("VPC", Position::default()).unwrap();

        session.create_diagram("Second", None);
        assert!(!session.autosave_pending());

        session.open(&first).unwrap();
        let later = Instant::now() + AutosaveConfig::default().interval();
        assert_eq!(session.tick(later).unwrap(), None);
        assert_eq!(session.manager().list().unwrap()[0].current_version, 1);
    }

    #[test]
    fn closing_cancels_the_timer() {
        let mut session = session();
        session.create_diagram("Net", None);
        session.save(None).unwrap();
        session.add_component("VPC", Position::default()).unwrap();
        assert!(session.autosave_pending());

        let closed = session.close().unwrap();
        assert_eq!(closed.components.len(), 1);
        assert!(!session.autosave_pending());
        assert!(session.active().is_none());

        let later = Instant::now() + AutosaveConfig::default().interval();
        assert_eq!(session.tick(later).unwrap(), None);
        assert_eq!(session.manager().list().unwrap()[0].current_version, 1);
    }

    #[test]
    fn huge_interval_never_fires_and_edits_keep_working() {
        let config = AutosaveConfig {
            interval_secs: u64::MAX,
            ..Default::default()
        };
        let mut session = EditorSession::with_config(MemoryStore::new(), &config);
        session.create_diagram("Net", None);
        session.save(None).unwrap();

        session.add_component("VPC", Position::default()).unwrap();
        session.add_component("Subnet", Position::default()).unwrap();
        assert!(!session.autosave_pending());
        assert_eq!(session.tick(Instant::now() + Duration::from_secs(3600)).unwrap(), None);
        assert_eq!(session.active().unwrap().components.len(), 2);
    }

    #[test]
    fn explicit_save_cancels_pending_autosave() {
        let mut session = session();
        session.create_diagram("Net", None);
        session.save(None).unwrap();
        session.add_component("VPC", Position::default()).unwrap();
        assert_eq!(session.save(Some("manual")).unwrap(), 2);
        assert!(!session.autosave_pending());
    }

    #[test]
    fn disabled_autosave_never_arms() {
        let config = AutosaveConfig {
            enabled: false,
            ..Default::default()
        };
        let mut session = EditorSession::with_config(MemoryStore::new(), &config);
        session.create_diagram("Net", None);
        session.add_component("VPC", Position::default()).unwrap();
        assert!(!session.autosave_pending());
    }

    #[test]
    fn failed_open_keeps_the_current_diagram() {
        let mut session = session();
        let id = session.create_diagram("Keep", None).id.clone();
        assert!(session.open("missing").is_err());
        assert_eq!(session.active().unwrap().id, id);
    }

    #[test]
    fn import_leaves_the_open_diagram_alone() {
        let mut session = session();
        session.create_diagram("Open", None);
        session.add_component("SNS Topic", Position::default()).unwrap();
        let json = session.export().unwrap();

        let imported = session.import(&json).unwrap();
        assert_eq!(session.active().unwrap().name, "Open");
        assert_eq!(imported.components.len(), 1);
        assert!(session.manager().contains(&imported.id).unwrap());
    }
}
