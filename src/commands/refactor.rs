//! `suggest`, `analyze` and `render`

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::review::{Announce, PromptReviewer};
use crate::ai::{EntityKind, OllamaClient};
use crate::config::{Settings, SharedSettings};
use crate::model::{Assembly, EntityRef, ProgramHost};
use crate::refactor::{RefactoringService, RenameRequest, SkipReason};
use crate::session::{run_session, AcceptAll, EventHandler, Reviewer, SessionReport, Worker};

/// Flags shared by the commands that change the model
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct SessionOptions {
    /// Accept every suggestion without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Save the model even when autoSaveChanges is off
    #[arg(long)]
    pub save: bool,
}

impl SessionOptions {
    fn reviewer(&self) -> Box<dyn Reviewer> {
        if self.yes {
            Box::new(Announce::new(AcceptAll))
        } else {
            Box::new(Announce::new(PromptReviewer))
        }
    }
}

pub async fn run_suggest(
    settings: Settings,
    file: &Path,
    kind: EntityKind,
    name: Option<&str>,
    options: SessionOptions,
) -> Result<()> {
    let mut assembly = load(file)?;

    let targets: Vec<EntityRef> = assembly
        .entities(kind)
        .into_iter()
        .filter(|e| name.map_or(true, |n| assembly.name(*e) == Some(n)))
        .collect();
    if targets.is_empty() {
        match name {
            Some(name) => bail!("No {} named '{}' in {}", kind, name, file.display()),
            None => bail!("No {} entities in {}", kind, file.display()),
        }
    }

    let (worker, mut events) = start(&settings)?;
    for entity in &targets {
        let request = RenameRequest::build(&assembly, *entity)?;
        worker.spawn_plan(request);
    }
    info!("Requested {} rename suggestion(s)", targets.len());

    let mut reviewer = options.reviewer();
    let report = run_session(&mut assembly, &mut events, targets.len(), reviewer.as_mut()).await;
    finish(&assembly, file, &settings, &report, options)
}

pub async fn run_analyze(settings: Settings, file: &Path, options: SessionOptions) -> Result<()> {
    let mut assembly = load(file)?;

    let (worker, mut events) = start(&settings)?;
    worker.spawn_analysis(assembly.decompile_module());

    let mut reviewer = options.reviewer();
    let report = run_session(&mut assembly, &mut events, 1, reviewer.as_mut()).await;
    finish(&assembly, file, &settings, &report, options)
}

pub fn run_render(file: &Path) -> Result<()> {
    let assembly = load(file)?;
    print!("{}", assembly.decompile_module());
    Ok(())
}

fn load(file: &Path) -> Result<Assembly> {
    Assembly::load(file).with_context(|| format!("Failed to load {}", file.display()))
}

fn start(settings: &Settings) -> Result<(Worker, EventHandler)> {
    let client = OllamaClient::new(SharedSettings::new(settings.clone()))?;
    let service = RefactoringService::new(Arc::new(client));
    let events = EventHandler::new();
    Ok((Worker::new(service, events.sender()), events))
}

fn finish(
    assembly: &Assembly,
    file: &Path,
    settings: &Settings,
    report: &SessionReport,
    options: SessionOptions,
) -> Result<()> {
    for message in &report.messages {
        println!("{}", message);
    }
    for skipped in &report.outcome.skipped {
        let why = match &skipped.reason {
            SkipReason::NotActionable => "no change".to_string(),
            SkipReason::UnsupportedKind => "kind cannot be looked up by name".to_string(),
            SkipReason::NotFound => "not found".to_string(),
            SkipReason::Rejected(e) => e.clone(),
        };
        println!("Skipped {}: {}", skipped.suggestion.describe(), why);
    }

    if !report.has_changes() {
        return Ok(());
    }

    if settings.auto_save_changes || options.save {
        assembly
            .save(file, settings.create_backup)
            .with_context(|| format!("Failed to save {}", file.display()))?;
        println!("Saved {}", file.display());
    } else {
        println!("Changes not saved (pass --save or enable autoSaveChanges)");
    }
    Ok(())
}
