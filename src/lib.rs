// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod sync;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::validate::validate_endpoint;
use crate::config::{resolve_config, ConfigFile};
use crate::errors::TreesyncError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::sync::{sync_queue, HttpRemoteStore, SyncWorker};
use crate::watch::{
    DispatchOptions, EventDispatcher, IgnoreFilter, NotifyWatchSource, RegistrationReport,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the initial directory scan
/// - the dispatcher thread (watch source -> sync queue)
/// - the sync worker task (sync queue -> remote store)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(args.config.as_deref())?;

    let endpoint = match &args.endpoint {
        Some(endpoint) => {
            validate_endpoint(endpoint)?;
            endpoint.clone()
        }
        None => cfg.remote().endpoint.clone(),
    };
    let options = DispatchOptions {
        recursive: cfg.watch().recursive && !args.no_recursive,
    };

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let root = resolve_root(fs.as_ref(), &args.root)?;
    let filter = IgnoreFilter::from_config(cfg.ignore());

    let (queue_tx, queue_rx) = sync_queue();

    let source = NotifyWatchSource::new()?;
    let mut dispatcher = EventDispatcher::new(source, filter, Arc::clone(&fs), queue_tx, options);
    let report = dispatcher.scan(&root)?;

    if args.dry_run {
        print_dry_run(&cfg, &root, &endpoint, options, &report);
        return Ok(());
    }

    let store = HttpRemoteStore::new(cfg.remote())?;
    let worker = SyncWorker::new(root.clone(), endpoint, store, Arc::clone(&fs), queue_rx);
    let worker_task = tokio::spawn(worker.run());

    // The dispatcher blocks on the watch source, so it gets its own thread.
    // Dropping it (when `run` returns) closes the queue and lets the worker
    // finish.
    let (done_tx, done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("dispatcher".to_string())
        .spawn(move || {
            let outcome = dispatcher.run();
            drop(dispatcher);
            let _ = done_tx.send(outcome);
        })
        .context("spawning dispatcher thread")?;

    tokio::select! {
        res = done_rx => {
            let outcome = res.context("dispatcher thread ended without reporting")??;
            info!(?outcome, "dispatcher finished; draining sync queue");
            let stats = worker_task.await?;
            info!(?stats, "sync worker finished");
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                eprintln!("failed to listen for Ctrl+C: {e}");
            }
            info!("interrupted; exiting");
        }
    }

    Ok(())
}

/// Canonicalize the watched root and make sure it is a directory.
fn resolve_root(fs: &dyn FileSystem, root: &Path) -> std::result::Result<PathBuf, TreesyncError> {
    let root = fs
        .canonicalize(root)
        .map_err(|_| TreesyncError::RootNotFound(root.to_path_buf()))?;
    if !fs.is_dir(&root) {
        return Err(TreesyncError::RootNotFound(root));
    }
    Ok(root)
}

/// Print the effective settings and the directories that would be watched.
fn print_dry_run(
    cfg: &ConfigFile,
    root: &Path,
    endpoint: &str,
    options: DispatchOptions,
    report: &RegistrationReport,
) {
    println!("treesync dry-run");
    println!("  root = {}", root.display());
    println!("  endpoint = {endpoint}");
    println!("  recursive = {}", options.recursive);
    println!("  timeout_secs = {}", cfg.remote().timeout_secs);
    if let Some(user) = &cfg.remote().username {
        println!("  username = {user}");
    }
    println!("  ignore.patterns = {:?}", cfg.ignore().patterns);
    println!("  ignore.sync_created = {}", cfg.ignore().sync_created);
    println!();

    println!("watched directories ({}):", report.registered.len());
    for dir in &report.registered {
        println!("  - {}", dir.display());
    }
    if !report.skipped.is_empty() {
        println!("skipped directories ({}):", report.skipped.len());
        for dir in &report.skipped {
            println!("  - {}", dir.display());
        }
    }

    debug!("dry-run complete (nothing synced)");
}
