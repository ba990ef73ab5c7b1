// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Branchtrail CLI entrypoint.
//!
//! `serve` runs the JSON API, `layout` prints the layout of a stored tree and `demo` prints a
//! built-in tree with its layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use branchtrail::config::{Config, GeneratorBackend, StoreBackend};
use branchtrail::layout::layout_tree;
use branchtrail::model::fixtures::demo_session;
use branchtrail::model::BranchNode;
use branchtrail::server::{serve, AppState};
use branchtrail::service::BranchService;

#[derive(Debug, Parser)]
#[command(name = "branchtrail")]
#[command(about = "Branching idea trees with generated options")]
#[command(version)]
struct Cli {
    /// Config file (default: branchtrail.toml in the current dir, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the JSON API
    Serve {
        /// Port to listen on (0 = ephemeral)
        #[arg(long)]
        port: Option<u16>,

        /// Persist sessions as JSON files under this directory
        #[arg(long)]
        store_dir: Option<PathBuf>,

        /// fsync session files and their directory on every write
        #[arg(long)]
        durable_writes: bool,

        /// Use the offline generator even when an API key is configured
        #[arg(long)]
        mock: bool,
    },

    /// Print the layout of a session file as JSON
    Layout {
        /// A stored session record, a session response or a bare tree
        session: PathBuf,
    },

    /// Print the demo tree and its layout as JSON
    Demo,
}

/// Folds serve flags over the loaded config.
fn apply_serve_flags(
    config: &mut Config,
    port: Option<u16>,
    store_dir: Option<PathBuf>,
    durable_writes: bool,
    mock: bool,
) {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = store_dir {
        config.store.backend = StoreBackend::Folder;
        config.store.dir = Some(dir);
    }
    if durable_writes {
        config.store.durable_writes = true;
    }
    if mock {
        config.generator.backend = GeneratorBackend::Mock;
    }
}

/// Accepts a folder-store record (`tree_json`), an API session (`root`, possibly wrapped
/// in `session`) or a bare tree.
fn tree_from_json(value: Value) -> Result<BranchNode> {
    let value = match value {
        Value::Object(mut map) => {
            if let Some(session) = map.remove("session") {
                return tree_from_json(session);
            }
            match map.remove("tree_json").or_else(|| map.remove("root")) {
                Some(tree) => tree,
                None => Value::Object(map),
            }
        }
        other => other,
    };
    serde_json::from_value(value).context("not a branch tree")
}

fn read_tree(path: &Path) -> Result<BranchNode> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    tree_from_json(value).with_context(|| format!("loading tree from {}", path.display()))
}

async fn run_serve(config: Config) -> Result<()> {
    let store = config.build_store()?;
    let generator = config.build_generator()?;
    let state = AppState::new(BranchService::new(store, generator), config.default_owner()?);

    let listener = tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port))
        .await
        .with_context(|| format!("binding {}:{}", config.server.bind, config.server.port))?;
    serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await
    .context("http server failed")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    branchtrail::logging::init(&config.logging);

    match cli.command {
        Commands::Serve { port, store_dir, durable_writes, mock } => {
            apply_serve_flags(&mut config, port, store_dir, durable_writes, mock);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            runtime.block_on(run_serve(config))
        }
        Commands::Layout { session } => {
            let tree = read_tree(&session)?;
            let layout = layout_tree(&tree, &config.layout);
            println!("{}", serde_json::to_string_pretty(&layout)?);
            Ok(())
        }
        Commands::Demo => {
            let session = demo_session();
            let layout = layout_tree(session.root(), &config.layout);
            let out = serde_json::json!({
                "title": session.title(),
                "tree": session.root(),
                "layout": layout,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
    }
}
