//! End-to-end editing against an on-disk store.

use std::time::{Duration, Instant};

use stratus_core::config::AutosaveConfig;
use stratus_core::{
    can_connect, default_properties, ConnectionRequest, EditorSession, FileStore, ModelError,
    Position, Properties, SessionError, Store, StoreKey,
};

fn session_in(dir: &tempfile::TempDir) -> EditorSession<FileStore> {
    let config = AutosaveConfig {
        interval_secs: 2,
        ..Default::default()
    };
    EditorSession::with_config(FileStore::new(dir.path()), &config)
}

#[test]
fn net_scenario_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    session.create_diagram("Net", None);
    let v1 = session.add_component("VPC", Position::new(0.0, 0.0)).unwrap();
    let e1 = session
        .add_component("EC2 Instance", Position::new(200.0, 0.0))
        .unwrap();

    assert!(can_connect("VPC", "EC2 Instance"));
    session.add_connection(ConnectionRequest::new(&v1, &e1)).unwrap();

    assert!(!can_connect("EC2 Instance", "VPC"));
    let err = session
        .add_connection(ConnectionRequest::new(&e1, &v1))
        .unwrap_err();
    assert!(matches!(err, SessionError::Model(ModelError::Rejected(_))));

    session.save(Some("first cut")).unwrap();
    let id = session.active().unwrap().id.clone();
    drop(session);

    let mut reopened = session_in(&dir);
    let diagram = reopened.open(&id).unwrap();
    assert_eq!(diagram.name, "Net");
    assert_eq!(diagram.components.len(), 2);
    assert_eq!(diagram.connections.len(), 1);
}

#[test]
fn autosave_writes_one_version_per_quiet_period() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);
    session.create_diagram("Auto", None);
    session.save(None).unwrap();
    let id = session.active().unwrap().id.clone();

    session
        .add_component("DynamoDB Table", Position::default())
        .unwrap();
    session.add_component("Lambda Function", Position::default()).unwrap();

    let due = Instant::now() + Duration::from_secs(2);
    assert_eq!(session.tick(due).unwrap(), Some(2));
    assert_eq!(session.tick(due + Duration::from_secs(2)).unwrap(), None);

    let versions = session.manager().versions(&id).unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1].components.len(), 2);
    assert!(session.manager().load(&id).unwrap().autosaved);
}

#[test]
fn imported_legacy_document_is_backfilled_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);

    let document = r#"{
        "id": "design-1700000000000",
        "name": "Legacy Export",
        "components": [
            {"id": "n1", "type": "ElastiCache Cluster", "position": {"x": 10, "y": 20}},
            {"id": "n2", "type": "Security Group", "position": {"x": 40, "y": 20},
             "config": {"name": "Security Group", "inboundRules": [{"protocol": "-1", "port": "0-65535", "source": "sg-0a1b2c3d"}]}}
        ],
        "connections": [{"id": "e1", "source": "n2", "target": "n1"}],
        "createdAt": "2023-05-01T12:00:00.000Z",
        "updatedAt": "2023-05-02T12:00:00.000Z",
        "version": 9,
        "isAutosaved": true
    }"#;

    let imported = session.import(document).unwrap();
    assert_ne!(imported.id, "design-1700000000000");
    assert_eq!(imported.version, 1);
    assert!(!imported.autosaved);
    assert_eq!(
        imported.component("n1").unwrap().config,
        default_properties("ElastiCache Cluster")
    );
    assert!(imported.validate_component("n2").unwrap().is_empty());

    let store = FileStore::new(dir.path());
    assert!(store.get(&StoreKey::diagram(&imported.id)).unwrap().is_some());
    assert!(store.get(&StoreKey::version(&imported.id, 1)).unwrap().is_some());
    assert!(session.active().is_none());
}

#[test]
fn malformed_import_leaves_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);
    assert!(session.import(r#"{"name": "broken", "components": "nope"}"#).is_err());
    assert!(!dir.path().join("cloud-architecture-designs.json").exists());
}

#[test]
fn validation_never_blocks_saving() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);
    session.create_diagram("Loose", None);
    let bucket = session.add_component("S3 Bucket", Position::default()).unwrap();

    let violations = session
        .update_component_properties(&bucket, Properties::named("S3 Bucket").with("bucketName", "No_Caps"))
        .unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(session.save(None).unwrap(), 1);
}

#[test]
fn stored_index_tracks_every_diagram() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(&dir);
    for name in ["one", "two", "three"] {
        session.create_diagram(name, None);
        session.save(None).unwrap();
    }
    session.save(None).unwrap();

    let listed = session.manager().list().unwrap();
    let names: Vec<_> = listed.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["one", "two", "three"]);
    assert_eq!(listed[2].current_version, 2);
}
