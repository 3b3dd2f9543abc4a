//! Command handlers.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use recipebox_core::store::FileBackend;
use recipebox_core::utils::format_millis;
use recipebox_core::worker::{
    CacheStorage, FileCacheStorage, HttpNetwork, OfflineWorker, Request, Response,
};
use recipebox_core::{
    CollectionKind, MergePolicy, RecordDraft, RecordPatch, RecordStore, StorageBackend,
};
use tracing::debug;

use crate::cli::{Cli, Command, WorkerCommand};
use crate::config::Config;

/// Largest response body echoed to the terminal
const MAX_PRINTED_BODY: usize = 2048;

pub async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let mut out = io::stdout().lock();
    match &cli.command {
        Command::Config { save } => show_config(config, *save, &mut out),
        Command::Worker { command } => run_worker(command, config, &mut out).await,
        command => {
            let policy = match command {
                Command::Import { newer_wins: true, .. } => MergePolicy::NewerWins,
                _ => config.merge_policy,
            };
            let backend = FileBackend::new(config.collections_dir()?)?;
            let mut store = RecordStore::open(backend, cli.storage_key()).with_policy(policy);
            if let Some(e) = store.load_error() {
                eprintln!("Warning: saved {} could not be read ({}); starting empty", cli.kind(), e);
            }
            run_store(&mut store, command, cli.kind(), &mut out)
        }
    }
}

fn show_config(config: &Config, save: bool, out: &mut impl Write) -> Result<()> {
    if save {
        config.save().context("Failed to save config")?;
    }
    writeln!(out, "# {}", Config::config_path()?.display())?;
    writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
    Ok(())
}

/// Run a collection command against `store`, writing user output to `out`.
pub fn run_store<B: StorageBackend>(
    store: &mut RecordStore<B>,
    command: &Command,
    kind: CollectionKind,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::List { query } => {
            let records = store.list(query.as_deref().unwrap_or(""));
            if records.is_empty() {
                writeln!(out, "No {} yet. Use `add` to create one.", kind)?;
            }
            for record in &records {
                writeln!(
                    out,
                    "{}  {}  ({})",
                    record.id,
                    record.display_title(),
                    format_millis(record.updated_at)
                )?;
                if !record.body.is_empty() {
                    writeln!(out, "    {}", record.preview())?;
                }
            }
            writeln!(out, "Local · {} {}", store.len(), kind)?;
        }
        Command::Add { title, body } => {
            let record = store.create(RecordDraft::new(title.as_str(), body.as_str()));
            writeln!(out, "Added {}", record.id)?;
        }
        Command::Edit { id, title, body } => {
            let patch = RecordPatch {
                title: title.clone(),
                body: body.clone(),
            };
            if patch.is_empty() {
                bail!("Nothing to change: pass --title and/or --body");
            }
            let record = store.update(id, patch)?;
            writeln!(out, "Updated {}", record.id)?;
        }
        Command::Rm { id } => match store.remove(id) {
            Some(record) => writeln!(out, "Deleted {}", record.id)?,
            None => writeln!(out, "No record with id {}", id)?,
        },
        Command::Export { path } => {
            let path = path
                .clone()
                .unwrap_or_else(|| PathBuf::from(kind.export_file_name()));
            store.export_to(&path)?;
            writeln!(out, "Exported {} {} to {}", store.len(), kind, path.display())?;
        }
        Command::Import { path, .. } => {
            let count = store
                .import_from(path)
                .with_context(|| format!("Failed to import {}", kind))?;
            writeln!(out, "Imported {} {} ({} total)", count, kind, store.len())?;
        }
        Command::Config { .. } | Command::Worker { .. } => bail!("Not a collection command"),
    }

    if let Some(e) = store.last_persist_error() {
        eprintln!("Warning: changes are not saved: {}", e);
    }
    Ok(())
}

async fn run_worker(command: &WorkerCommand, config: &Config, out: &mut impl Write) -> Result<()> {
    let caches = FileCacheStorage::new(config.cache_dir()?)?;
    let cache_name = config.worker.cache_name.clone();

    match command {
        WorkerCommand::Install => {
            let network = HttpNetwork::new(&config.worker.origin)?;
            let mut worker = OfflineWorker::new(config.worker.clone(), caches, network);
            worker
                .install()
                .await
                .with_context(|| format!("Failed to install worker from {}", config.worker.origin))?;
            let deleted = worker.activate().await?;

            let cached = worker.caches().entries(&cache_name).await?;
            writeln!(out, "Installed {} ({} entries)", cache_name, cached.len())?;
            for name in deleted {
                writeln!(out, "Deleted stale cache {}", name)?;
            }
        }
        WorkerCommand::Fetch { url, navigate, image } => {
            if !caches.keys().await?.contains(&cache_name) {
                bail!("Worker is not installed; run `recipebox worker install` first");
            }
            let request = if *navigate {
                Request::navigate(url.as_str())
            } else if *image {
                Request::image(url.as_str())
            } else {
                Request::get(url.as_str())
            };
            let network = HttpNetwork::new(&config.worker.origin)?;
            let worker = OfflineWorker::resume(config.worker.clone(), caches, network);

            let response = worker.handle_fetch(&request).await;
            debug!(url = %url, status = response.status, "Handled fetch");
            print_response(&response, out)?;
        }
        WorkerCommand::Caches => list_caches(&caches, &cache_name, out).await?,
    }
    Ok(())
}

fn print_response(response: &Response, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} {} ({:?})", response.status, response.status_text, response.kind)?;
    if let Some(ref content_type) = response.content_type {
        writeln!(out, "content-type: {}", content_type)?;
    }
    writeln!(out, "{} bytes", response.body.len())?;
    match std::str::from_utf8(&response.body) {
        Ok(text) if !text.is_empty() && text.len() <= MAX_PRINTED_BODY => {
            writeln!(out)?;
            writeln!(out, "{}", text)?;
        }
        _ => {}
    }
    Ok(())
}

/// Print every cache, marking the current version, and its entries.
pub async fn list_caches<C: CacheStorage>(
    caches: &C,
    current: &str,
    out: &mut impl Write,
) -> Result<()> {
    let names = caches.keys().await?;
    if names.is_empty() {
        writeln!(out, "No caches")?;
    }
    for name in names {
        let marker = if name == current { " (current)" } else { "" };
        writeln!(out, "{}{}", name, marker)?;
        for url in caches.entries(&name).await? {
            writeln!(out, "  {}", url)?;
        }
    }
    Ok(())
}
