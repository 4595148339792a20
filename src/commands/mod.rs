//! Command-line surface
//!
//! `decomp-rename [--config PATH] [--server URL] [--model NAME] <command>`.
//! Flags and their environment variables override the settings file for one
//! run only; `config set` is the way to persist a change.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ai::EntityKind;
use crate::config::{config_path, load_settings_or_default};

pub mod config;
pub mod refactor;
pub mod review;

pub use config::{run_config_path, run_config_set, run_config_show};
pub use refactor::{run_analyze, run_render, run_suggest, SessionOptions};

#[derive(Parser)]
#[command(name = "decomp-rename")]
#[command(about = "Local-LLM rename suggestions for decompiled .NET code")]
#[command(version)]
pub struct Cli {
    /// Settings file (default: <config dir>/decomp-rename/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ollama server URL for this run
    #[arg(long, global = true, env = "DECOMP_RENAME_SERVER")]
    pub server: Option<String>,

    /// Model tag for this run
    #[arg(long, global = true, env = "DECOMP_RENAME_MODEL")]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask for better names for entities of one kind
    Suggest {
        /// Program model file (JSON)
        file: PathBuf,

        /// Entity kind: class, method, property, field, parameter, variable
        #[arg(short, long, default_value = "method", value_parser = parse_kind)]
        kind: EntityKind,

        /// Only entities currently carrying this name
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        session: SessionOptions,
    },

    /// Review the naming of a whole module and apply selected renames
    Analyze {
        /// Program model file (JSON)
        file: PathBuf,

        #[command(flatten)]
        session: SessionOptions,
    },

    /// Print the decompiled view of a program model
    Render {
        /// Program model file (JSON)
        file: PathBuf,
    },

    /// Show or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Persist one setting, e.g. `config set temperature 0.5`
    Set {
        /// ollamaServer, model, autoSaveChanges, createBackup or temperature
        key: String,
        value: String,
    },
    /// Print the settings file location
    Path,
}

fn parse_kind(tag: &str) -> Result<EntityKind, String> {
    EntityKind::parse(tag).ok_or_else(|| {
        let known: Vec<&str> = EntityKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown kind '{}' (expected one of: {})", tag, known.join(", "))
    })
}

/// Run one parsed command line
pub async fn execute(cli: Cli) -> Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => config_path()?,
    };

    let settings = || {
        load_settings_or_default(&path).with_overrides(cli.server.clone(), cli.model.clone())
    };

    match cli.command {
        Commands::Suggest {
            file,
            kind,
            name,
            session,
        } => run_suggest(settings(), &file, kind, name.as_deref(), session).await,
        Commands::Analyze { file, session } => run_analyze(settings(), &file, session).await,
        Commands::Render { file } => run_render(&file),
        Commands::Config { action } => match action {
            ConfigAction::Show => run_config_show(&path, &settings()),
            ConfigAction::Set { key, value } => run_config_set(&path, &key, &value),
            ConfigAction::Path => run_config_path(&path),
        },
    }
}
