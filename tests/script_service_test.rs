//! Integration tests for ScriptService

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use planscene::application::services::{Script, ScriptService, ScriptStep};
use planscene::application::ApplicationError;
use planscene::commands::{CommandArgs, CommandError, Session};
use planscene::config::Settings;
use planscene::domain::NodeKind;
use planscene::history::NoopRebuildHook;
use planscene::infrastructure::di::ServiceContainer;
use planscene::infrastructure::traits::RealFileSystem;

fn container() -> ServiceContainer {
    ServiceContainer::with_deps(
        Settings::default(),
        Arc::new(RealFileSystem),
        Arc::new(NoopRebuildHook),
    )
}

fn started(container: &ServiceContainer) -> Session {
    let mut session = container.session();
    session.dispatch("newFile", &CommandArgs::new()).unwrap();
    session
}

fn top_level_len(session: &Session) -> usize {
    let ws = session.workspace();
    ws.arena.children(ws.scene_root().unwrap()).len()
}

// ============================================================
// Parsing
// ============================================================

#[test]
fn given_bare_list_when_parsing_then_steps_read_in_order() {
    let script = ScriptService::parse(
        r#"[
            {"dispatch": {"command": "createOneWall"}},
            "undo",
            "redo",
            {"save": {"path": "out/plan.json"}}
        ]"#,
    )
    .unwrap();

    assert_eq!(script.steps.len(), 4);
    assert!(!script.continue_on_error);
    assert!(matches!(&script.steps[0], ScriptStep::Dispatch { command, args } if command == "createOneWall" && args.is_null()));
    assert_eq!(script.steps[1], ScriptStep::Undo);
    assert_eq!(script.steps[3].to_string(), "save out/plan.json");
}

#[test]
fn given_object_form_when_parsing_then_flags_read() {
    let script = ScriptService::parse(r#"{"continue_on_error": true, "steps": ["undo"]}"#).unwrap();

    assert!(script.continue_on_error);
    assert_eq!(script.steps, vec![ScriptStep::Undo]);
}

#[test]
fn given_unknown_step_when_parsing_then_script_error() {
    let err = ScriptService::parse(r#"["explode"]"#).unwrap_err();

    assert!(matches!(err, ApplicationError::Script { .. }));
}

// ============================================================
// Running
// ============================================================

#[test]
fn given_script_when_running_then_history_reported() {
    // Arrange
    let container = container();
    let service = container.script_service();
    let mut session = started(&container);
    let script = ScriptService::parse(
        r#"[
            {"dispatch": {"command": "createOneWall"}},
            {"dispatch": {"command": "createGround", "args": {"width": 2000.0, "depth": 2000.0}}},
            "undo"
        ]"#,
    )
    .unwrap();

    // Act
    let report = service.run(&mut session, &script, Path::new(".")).unwrap();

    // Assert
    assert_eq!(report.failures(), 0);
    assert_eq!(report.undo_len, 1);
    assert_eq!(report.redo_len, 1);
    assert_eq!(report.outcomes[2].output["label"], "createGround");
    assert_eq!(top_level_len(&session), 1);
}

#[test]
fn given_failing_step_when_running_then_aborts_with_step_index() {
    let container = container();
    let service = container.script_service();
    let mut session = started(&container);
    let script = Script {
        steps: vec![
            ScriptStep::Dispatch {
                command: "createOneWall".into(),
                args: json!({}),
            },
            ScriptStep::Dispatch {
                command: "noSuchCommand".into(),
                args: json!({}),
            },
            ScriptStep::Undo,
        ],
        continue_on_error: false,
    };

    let err = service.run(&mut session, &script, Path::new(".")).unwrap_err();

    match err {
        ApplicationError::Step { index, source, .. } => {
            assert_eq!(index, 1);
            assert!(matches!(
                *source,
                ApplicationError::Command(CommandError::NotFound(_))
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(top_level_len(&session), 1, "undo step never ran");
}

#[test]
fn given_continue_on_error_when_step_fails_then_remaining_steps_run() {
    let container = container();
    let service = container.script_service();
    let mut session = started(&container);
    let script = Script {
        steps: vec![
            ScriptStep::Dispatch {
                command: "createOneWall".into(),
                args: json!({ "thickness": -1.0 }),
            },
            ScriptStep::Dispatch {
                command: "createOneWall".into(),
                args: json!({}),
            },
        ],
        continue_on_error: true,
    };

    let report = service.run(&mut session, &script, Path::new(".")).unwrap();

    assert_eq!(report.failures(), 1);
    assert!(!report.outcomes[0].is_ok());
    assert!(report.outcomes[1].is_ok());
    assert_eq!(report.undo_len, 1);
}

// ============================================================
// Scene files
// ============================================================

#[test]
fn given_scene_when_saved_and_opened_then_same_objects() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("plan.json");
    let container = container();
    let service = container.script_service();
    let mut session = started(&container);
    session
        .dispatch("createRectangularRoom", &CommandArgs::new())
        .unwrap();

    // Act
    service.save(&mut session, &path).unwrap();
    let mut reopened = container.session();
    service.open(&mut reopened, &path).unwrap();

    // Assert
    assert!(path.exists());
    assert_eq!(top_level_len(&reopened), 5);
    assert_eq!(
        reopened.workspace().snapshot().unwrap(),
        session.workspace().snapshot().unwrap()
    );
    let root = reopened.workspace().scene_root().unwrap();
    assert_eq!(
        reopened.workspace().arena.get(root).map(|n| n.kind),
        Some(NodeKind::Scene)
    );
}

#[test]
fn given_no_scene_when_saving_then_no_scene_error() {
    let dir = TempDir::new().unwrap();
    let container = container();
    let mut session = container.session();

    let err = container
        .script_service()
        .save(&mut session, &dir.path().join("plan.json"))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::NoScene));
}

#[test]
fn given_script_file_with_relative_save_when_running_then_written_next_to_script() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let script_path = dir.path().join("build.json");
    fs::write(
        &script_path,
        r#"{"steps": [
            {"dispatch": {"command": "createOneWall"}},
            {"save": {"path": "plan.json"}},
            {"dispatch": {"command": "newFile"}},
            {"open": {"path": "plan.json"}}
        ]}"#,
    )
    .unwrap();
    let container = container();
    let service = container.script_service();
    let mut session = started(&container);

    // Act
    let report = service.run_file(&mut session, &script_path).unwrap();

    // Assert
    assert_eq!(report.failures(), 0);
    assert!(dir.path().join("plan.json").exists());
    assert_eq!(top_level_len(&session), 1);
    assert_eq!(report.undo_len, 0, "opening a scene resets history");
}

#[test]
fn given_missing_script_file_when_loading_then_operation_failed() {
    let dir = TempDir::new().unwrap();
    let service = container().script_service();

    let err = service.load(&dir.path().join("missing.json")).unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
}
