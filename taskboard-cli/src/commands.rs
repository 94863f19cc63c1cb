//! Command handlers

use crate::cli::{Cli, Commands, OutputFormat};
use crate::display;
use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use taskboard_kanban::{
    BoardConfig, FileGateway, MutationOutcome, NewTask, PendingMutation, TaskId, TaskPatch,
    TaskStore,
};

/// How a command ended, when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    /// The remote rejected the change; the board was reloaded
    RolledBack,
}

pub async fn run(cli: Cli) -> Result<Completion> {
    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let config = BoardConfig::load(&project_dir).context("invalid board configuration")?;
    let gateway = FileGateway::new(config.data_path(&project_dir));
    let format = cli.format.unwrap_or_default();

    match cli.command {
        Commands::Init => init(&gateway).await,
        command => {
            let store = open(gateway, &config).await?;
            execute(&store, command, format).await
        }
    }
}

async fn init(gateway: &FileGateway) -> Result<Completion> {
    if gateway.is_initialized() {
        println!("Board already exists at {}", gateway.root().display());
        return Ok(Completion::Done);
    }
    gateway
        .create_directories()
        .await
        .with_context(|| format!("cannot create {}", gateway.root().display()))?;
    tracing::info!(root = %gateway.root().display(), "board initialized");
    println!("Initialized board at {}", gateway.root().display());
    Ok(Completion::Done)
}

async fn open(gateway: FileGateway, config: &BoardConfig) -> Result<TaskStore> {
    if !gateway.is_initialized() {
        bail!(
            "no board at {}; run `taskboard init` first",
            gateway.root().display()
        );
    }
    let store = TaskStore::with_config(Arc::new(gateway), config);
    store.load().await.context("cannot read the board")?;
    Ok(store)
}

async fn execute(store: &TaskStore, command: Commands, format: OutputFormat) -> Result<Completion> {
    match command {
        // Handled before the store is opened
        Commands::Init => Ok(Completion::Done),
        Commands::Add {
            title,
            description,
            lane,
        } => {
            let mut input = NewTask::new(title).in_lane(lane);
            if let Some(description) = description {
                input = input.with_description(description);
            }
            let id = store.create(input).await?;
            let task = store
                .get(&id)
                .ok_or_else(|| anyhow!("task {id} vanished after creation"))?;
            display::print_task(&task, format)?;
            Ok(Completion::Done)
        }
        Commands::List { lane } => {
            display::print_board(&store.snapshot(), lane, format)?;
            Ok(Completion::Done)
        }
        Commands::Move { id, lane, index } => {
            let id = resolve(store, &id)?;
            let index = match index {
                Some(index) => index,
                None => store.lane(lane).iter().filter(|t| t.id != id).count(),
            };
            match store.move_task(&id, lane, index)? {
                Some(pending) => settle(pending).await,
                None => {
                    println!("{id} is already there");
                    Ok(Completion::Done)
                }
            }
        }
        Commands::Edit {
            id,
            title,
            description,
        } => {
            let id = resolve(store, &id)?;
            let mut patch = TaskPatch::new();
            if let Some(title) = title {
                patch = patch.with_title(title);
            }
            if let Some(description) = description {
                patch = patch.with_description(description);
            }
            if patch.is_empty() {
                bail!("nothing to change; pass --title or --description");
            }
            settle(store.update(&id, patch)?).await
        }
        Commands::Archive { id } => {
            let id = resolve(store, &id)?;
            settle(store.update(&id, TaskPatch::new().with_archived(true))?).await
        }
        Commands::Delete { id } => {
            let id = resolve(store, &id)?;
            settle(store.delete(&id)?).await
        }
        Commands::Resort { lane, by } => match store.resort_lane(lane, by.into())? {
            Some(pending) => settle(pending).await,
            None => {
                println!("{lane} is already in that order");
                Ok(Completion::Done)
            }
        },
    }
}

/// Wait for the remote write and report a rollback
async fn settle(pending: PendingMutation) -> Result<Completion> {
    let kind = pending.kind();
    let id = pending.task_id().clone();
    match pending.settled().await {
        MutationOutcome::Confirmed => {
            tracing::debug!(%kind, %id, "confirmed");
            Ok(Completion::Done)
        }
        MutationOutcome::RolledBack { error, resynced } => {
            eprintln!("Could not {kind} {id}: {error}");
            if !resynced {
                eprintln!("The board could not be reloaded; run `taskboard list` to check it");
            }
            Ok(Completion::RolledBack)
        }
        MutationOutcome::Aborted { message } => Err(anyhow!("{kind} {id} aborted: {message}")),
    }
}

/// Exact id, or the single task whose id starts with `raw`
fn resolve(store: &TaskStore, raw: &str) -> Result<TaskId> {
    let exact = TaskId::from(raw);
    if store.get(&exact).is_some() {
        return Ok(exact);
    }

    let needle = raw.to_ascii_uppercase();
    let matches: Vec<TaskId> = store
        .tasks()
        .into_iter()
        .map(|t| t.id)
        .filter(|id| id.as_str().to_ascii_uppercase().starts_with(&needle))
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.clone()),
        [] => bail!("no task matches '{raw}'"),
        many => bail!("'{raw}' matches {} tasks; use more characters", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_kanban::{Lane, MemoryGateway, Task};

    async fn store() -> TaskStore {
        let gateway = MemoryGateway::with_tasks([
            Task::new("One", Lane::Todo).with_id("01HVAAAA"),
            Task::new("Two", Lane::Todo).with_id("01HVBBBB"),
        ]);
        let store = TaskStore::new(Arc::new(gateway));
        store.load().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_resolve_prefix() {
        let store = store().await;
        assert_eq!(resolve(&store, "01hva").unwrap(), TaskId::from("01HVAAAA"));
        assert_eq!(resolve(&store, "01HVBBBB").unwrap(), TaskId::from("01HVBBBB"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_ambiguous_and_unknown() {
        let store = store().await;
        let err = resolve(&store, "01HV").unwrap_err();
        assert!(err.to_string().contains("matches 2 tasks"));
        assert!(resolve(&store, "zzz").is_err());
    }
}
