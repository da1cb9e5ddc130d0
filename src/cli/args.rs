//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Scripted scene editing with transactional undo/redo
#[derive(Parser, Debug)]
#[command(name = "planscene")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Project directory holding .planscene.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an editing script against a fresh session
    Run {
        /// Script file (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,

        /// Scene to open before the first step
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        scene: Option<PathBuf>,

        /// Write the final scene to this file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,

        /// Print the final scene hierarchy
        #[arg(short, long)]
        tree: bool,

        /// Keep going when a step fails
        #[arg(short = 'k', long)]
        keep_going: bool,
    },

    /// List registered commands
    Commands,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config file locations
    Path,

    /// Print a config template
    Template {
        /// Write it to the project's .planscene.toml instead
        #[arg(short, long)]
        write: bool,
    },
}
