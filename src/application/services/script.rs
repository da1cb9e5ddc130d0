//! Script service
//!
//! Runs a scripted editing session: a JSON list of dispatches, undos and
//! redos, plus scene file import/export, against one [`Session`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, instrument, warn};

use crate::application::error_ext::{IoResultExt, JsonResultExt};
use crate::application::{ApplicationError, ApplicationResult};
use crate::commands::{CommandArgs, Session};
use crate::history::ReplayReport;
use crate::infrastructure::traits::FileSystem;

/// One scripted action.
///
/// Unit steps are plain strings (`"undo"`), the others single-key objects
/// (`{"dispatch": {"command": "createOneWall", "args": {}}}`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Dispatch {
        command: String,
        #[serde(default)]
        args: JsonValue,
    },
    Undo,
    Redo,
    /// Export the scene to a file
    Save { path: PathBuf },
    /// Replace the scene with the contents of a file
    Open { path: PathBuf },
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStep::Dispatch { command, .. } => write!(f, "dispatch {command}"),
            ScriptStep::Undo => f.write_str("undo"),
            ScriptStep::Redo => f.write_str("redo"),
            ScriptStep::Save { path } => write!(f, "save {}", path.display()),
            ScriptStep::Open { path } => write!(f, "open {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
    /// Record failing steps and keep going instead of aborting
    pub continue_on_error: bool,
}

/// What happened for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub index: usize,
    pub step: String,
    pub output: JsonValue,
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptReport {
    pub outcomes: Vec<StepOutcome>,
    pub undo_len: usize,
    pub redo_len: usize,
}

impl ScriptReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }
}

/// Service for running scripted sessions.
pub struct ScriptService {
    fs: Arc<dyn FileSystem>,
}

impl ScriptService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Parse a script file.
    ///
    /// Accepts either `{"steps": [...]}` or a bare list of steps.
    pub fn load(&self, path: &Path) -> ApplicationResult<Script> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read script", path)?;
        Self::parse(&content).map_err(|e| match e {
            ApplicationError::Script { message, .. } => ApplicationError::Script {
                context: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> ApplicationResult<Script> {
        let json: JsonValue =
            serde_json::from_str(content).with_json_context(Path::new("<script>"))?;
        let script = match json {
            JsonValue::Array(_) => Script {
                steps: serde_json::from_value(json).with_json_context(Path::new("<script>"))?,
                continue_on_error: false,
            },
            other => serde_json::from_value(other).with_json_context(Path::new("<script>"))?,
        };
        Ok(script)
    }

    /// Run `script` step by step; relative paths resolve against `base_dir`.
    #[instrument(level = "debug", skip(self, session, script))]
    pub fn run(
        &self,
        session: &mut Session,
        script: &Script,
        base_dir: &Path,
    ) -> ApplicationResult<ScriptReport> {
        let mut report = ScriptReport::default();
        for (index, step) in script.steps.iter().enumerate() {
            debug!("step {}: {}", index, step);
            match self.run_step(session, step, base_dir) {
                Ok(output) => report.outcomes.push(StepOutcome {
                    index,
                    step: step.to_string(),
                    output,
                    error: None,
                }),
                Err(e) if script.continue_on_error => {
                    warn!("step {} ({}) failed: {}", index, step, e);
                    report.outcomes.push(StepOutcome {
                        index,
                        step: step.to_string(),
                        output: JsonValue::Null,
                        error: Some(e.to_string()),
                    });
                }
                Err(e) => {
                    return Err(ApplicationError::Step {
                        index,
                        step: step.to_string(),
                        source: Box::new(e),
                    })
                }
            }
        }
        let history = &session.workspace().history;
        report.undo_len = history.undo_len();
        report.redo_len = history.redo_len();
        info!(
            "script finished: {} steps, {} failed",
            report.outcomes.len(),
            report.failures()
        );
        Ok(report)
    }

    /// Load and run a script file; paths resolve against its directory.
    pub fn run_file(&self, session: &mut Session, path: &Path) -> ApplicationResult<ScriptReport> {
        let script = self.load(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        self.run(session, &script, base_dir)
    }

    fn run_step(
        &self,
        session: &mut Session,
        step: &ScriptStep,
        base_dir: &Path,
    ) -> ApplicationResult<JsonValue> {
        match step {
            ScriptStep::Dispatch { command, args } => {
                let args = CommandArgs::from_json(args.clone())?;
                Ok(session.dispatch(command, &args)?)
            }
            ScriptStep::Undo => Ok(replay_json(session.undo()?)),
            ScriptStep::Redo => Ok(replay_json(session.redo()?)),
            ScriptStep::Save { path } => {
                let path = base_dir.join(path);
                self.save(session, &path)?;
                Ok(json!({ "saved": path.display().to_string() }))
            }
            ScriptStep::Open { path } => self.open(session, &base_dir.join(path)),
        }
    }

    /// Write the current scene as JSON.
    pub fn save(&self, session: &mut Session, path: &Path) -> ApplicationResult<()> {
        let scene = session.dispatch("saveSceneToLocal", &CommandArgs::new())?;
        if scene.is_null() {
            return Err(ApplicationError::NoScene);
        }
        let content = serde_json::to_string_pretty(&scene).with_json_context(path)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create parent", path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write scene", path)?;
        info!("scene saved to {}", path.display());
        Ok(())
    }

    /// Replace the session's scene with a saved one.
    pub fn open(&self, session: &mut Session, path: &Path) -> ApplicationResult<JsonValue> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read scene", path)?;
        let scene: JsonValue = serde_json::from_str(&content).with_json_context(path)?;
        let args = CommandArgs::new().with("scene", scene);
        Ok(session.dispatch("openScene", &args)?)
    }
}

fn replay_json(report: Option<ReplayReport>) -> JsonValue {
    match report {
        Some(r) => json!({ "label": r.label, "records": r.records, "rebuilt": r.rebuilt }),
        None => JsonValue::Null,
    }
}
