//! CLI command execution

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::ScriptReport;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::commands::CommandArgs;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute(cli: &Cli) -> CliResult<()> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?,
    };
    let settings = Settings::load(Some(&project_dir))?;
    let container = ServiceContainer::new(settings);

    match &cli.command {
        Some(Commands::Run {
            script,
            scene,
            output,
            tree,
            keep_going,
        }) => run_script(
            &container,
            script,
            scene.as_deref(),
            output.as_deref(),
            *tree,
            *keep_going,
        ),
        Some(Commands::Commands) => list_commands(&container),
        Some(Commands::Config { command }) => config(&container, &project_dir, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "planscene", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::InvalidArgs(
            "no command given, see --help".to_string(),
        )),
    }
}

/// Script path as given, else relative to the configured script_dir.
fn resolve_script(container: &ServiceContainer, script: &Path) -> PathBuf {
    if script.is_absolute() || container.fs.exists(script) {
        return script.to_path_buf();
    }
    match &container.settings.script_dir {
        Some(dir) => dir.join(script),
        None => script.to_path_buf(),
    }
}

#[instrument(level = "debug", skip(container))]
fn run_script(
    container: &ServiceContainer,
    script: &Path,
    scene: Option<&Path>,
    output_path: Option<&Path>,
    tree: bool,
    keep_going: bool,
) -> CliResult<()> {
    let service = container.script_service();
    let mut session = container.session();

    match scene {
        Some(path) => {
            service.open(&mut session, path)?;
        }
        None => {
            session
                .dispatch("newFile", &CommandArgs::new())
                .map_err(ApplicationError::from)?;
        }
    }

    let script_path = resolve_script(container, script);
    debug!("running {}", script_path.display());
    let mut parsed = service.load(&script_path)?;
    parsed.continue_on_error |= keep_going;
    let base_dir = script_path.parent().unwrap_or(Path::new("."));
    let report = service.run(&mut session, &parsed, base_dir)?;
    print_report(&report);

    if let Some(path) = output_path {
        service.save(&mut session, path)?;
        output::action("saved", &path.display());
    }
    if tree {
        let snapshot = session
            .workspace()
            .snapshot()
            .map_err(ApplicationError::from)?;
        if let Some(snapshot) = snapshot {
            output::info(&output::scene_tree(&snapshot));
        }
    }

    match report.failures() {
        0 => Ok(()),
        n => Err(CliError::StepsFailed(n)),
    }
}

fn print_report(report: &ScriptReport) {
    output::header("Steps");
    for outcome in &report.outcomes {
        match &outcome.error {
            None if outcome.output.is_null() => output::success_detail(&outcome.step),
            None => output::success_detail(&format!("{} -> {}", outcome.step, outcome.output)),
            Some(err) => output::failure(&format!("{}: {}", outcome.step, err)),
        }
    }
    output::action(
        "history",
        &format!("{} undo, {} redo", report.undo_len, report.redo_len),
    );
}

fn list_commands(container: &ServiceContainer) -> CliResult<()> {
    let session = container.session();
    let registry = session.registry();
    output::header("Commands");
    for name in registry.names() {
        let command = registry.instantiate(name).map_err(ApplicationError::from)?;
        let mode = if command.should_record_undo() {
            "undoable"
        } else {
            "not recorded"
        };
        output::detail(&format!("{name:<24} {mode}"));
    }
    Ok(())
}

fn config(container: &ServiceContainer, project_dir: &Path, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory on this platform"),
            }
            output::action("local", &local_config_path(project_dir).display());
        }
        ConfigCommands::Template { write: false } => {
            output::info(&Settings::template());
        }
        ConfigCommands::Template { write: true } => {
            let path = local_config_path(project_dir);
            if container.fs.exists(&path) {
                return Err(CliError::InvalidArgs(format!(
                    "{} already exists",
                    path.display()
                )));
            }
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}
