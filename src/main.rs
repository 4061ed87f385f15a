//! # aldb
//!
//! Activity directory binary: serves the navigation tree over HTTP, imports
//! JSON activity files into SQLite, and prints trees for inspection.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aldb_server::{NavNode, NavView, NavigationPresenter, ServerConfig};
use aldb_settings::{AldbSettings, DirectorySettings, SourceKind};
use aldb_store::{
    ActivityDirectory, ActivitySource, Database, DirectoryIndex, JsonFileSource, SqliteSource,
    StaticSource,
};
use aldb_telemetry::{init_telemetry, TelemetryConfig};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

/// Activity directory server and tools.
#[derive(Parser, Debug)]
#[command(name = "aldb", about = "Activity directory server and tools")]
struct Cli {
    /// Settings file (defaults to `~/.aldb/settings.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the directory over HTTP.
    Serve {
        /// Host to bind.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (0 for auto-assign).
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Copy activities from a JSON file into a SQLite database.
    Import {
        /// JSON file: one activity, an array, or `{"root", "activities"}`.
        #[arg(long)]
        from: PathBuf,

        /// SQLite database to write to; created if missing.
        #[arg(long)]
        db: PathBuf,

        /// Mark this id as the main activity instead of the file's root. It
        /// may name an activity stored by an earlier import.
        #[arg(long)]
        root: Option<String>,
    },
    /// Print the navigation tree.
    Tree {
        /// Label locale (defaults to the configured one).
        #[arg(long)]
        locale: Option<String>,

        /// Deepest level to print.
        #[arg(long)]
        depth: Option<usize>,

        /// Emit the view as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Where activities come from: sample, json or sqlite.
    #[arg(long)]
    source: Option<SourceKind>,

    /// File backing a json or sqlite source.
    #[arg(long)]
    source_path: Option<String>,

    /// Main activity id, overriding the source's choice.
    #[arg(long)]
    root: Option<String>,
}

impl SourceArgs {
    fn apply(self, settings: &mut DirectorySettings) {
        if let Some(kind) = self.source {
            settings.source = kind;
        }
        if let Some(path) = self.source_path {
            settings.path = Some(path);
        }
        if let Some(root) = self.root {
            settings.root_activity = Some(root);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_file = cli.config.clone().unwrap_or_else(aldb_settings::settings_path);
    let mut settings = aldb_settings::load_settings_from_path(&settings_file)
        .with_context(|| format!("Failed to load settings from {}", settings_file.display()))?;

    let _ = init_telemetry(&TelemetryConfig::from_settings(&settings.logging));

    match cli.command {
        Command::Serve { host, port, source } => {
            source.apply(&mut settings.directory);
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            serve(settings).await
        }
        Command::Import { from, db, root } => import(&from, &db, root).await,
        Command::Tree {
            locale,
            depth,
            json,
            source,
        } => {
            source.apply(&mut settings.directory);
            tree(settings, locale.as_deref(), depth, json).await
        }
    }
}

async fn serve(settings: AldbSettings) -> Result<()> {
    settings.validate().context("Invalid settings")?;
    let presenter = build_presenter(&settings)?;

    let config = ServerConfig {
        host: settings.server.host.clone(),
        port: settings.server.port,
    };
    let handle = aldb_server::start(config, presenter)
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                settings.server.host, settings.server.port
            )
        })?;

    tracing::info!(
        port = handle.port,
        source = %settings.directory.source,
        "aldb ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl+c")?;

    tracing::info!("Shutting down");
    handle.shutdown().await;
    Ok(())
}

async fn import(from: &Path, db_path: &Path, root: Option<String>) -> Result<()> {
    let snapshot = JsonFileSource::new(from)
        .load()
        .await
        .with_context(|| format!("Failed to read {}", from.display()))?;

    // Reject the batch before touching the database.
    let index = DirectoryIndex::build(snapshot.clone())
        .with_context(|| format!("{} holds invalid activities", from.display()))?;
    for issue in index.issues() {
        tracing::warn!(issue = %issue, "importing inconsistent link");
    }

    let db = Database::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let sqlite = SqliteSource::new(db);
    let written = sqlite.import(snapshot).await.context("Import failed")?;
    if let Some(root) = root.as_deref() {
        sqlite
            .set_root(root)
            .await
            .with_context(|| format!("Failed to mark {root} as the main activity"))?;
    }
    let total = sqlite.count().await.context("Failed to count stored activities")?;

    tracing::info!(records = written, total, db = %db_path.display(), "import finished");
    println!(
        "imported {written} activities into {} ({total} stored)",
        db_path.display()
    );
    Ok(())
}

async fn tree(
    settings: AldbSettings,
    locale: Option<&str>,
    depth: Option<usize>,
    json: bool,
) -> Result<()> {
    settings.validate().context("Invalid settings")?;
    let presenter = build_presenter(&settings)?;

    let view = presenter.view(locale, depth).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }
    match view {
        NavView::Ready { tree } => {
            print_node(&tree, 0);
            Ok(())
        }
        NavView::Error { code, message, .. } => bail!("{code}: {message}"),
    }
}

fn print_node(node: &NavNode, level: usize) {
    let marker = if node.cycle {
        " (cycle)"
    } else if node.repeated {
        " (see above)"
    } else if node.truncated {
        " (...)"
    } else {
        ""
    };
    println!("{}{} [{}]{marker}", "  ".repeat(level), node.label, node.id);
    for child in &node.children {
        print_node(child, level + 1);
    }
}

fn build_presenter(settings: &AldbSettings) -> Result<Arc<NavigationPresenter>> {
    let source = build_source(&settings.directory)?;
    tracing::debug!(source = %source.describe(), "activity source configured");

    let mut directory = ActivityDirectory::new(source);
    if let Some(root) = settings.directory.root_activity.as_deref() {
        directory = directory.with_root(root);
    }
    Ok(Arc::new(NavigationPresenter::new(
        Arc::new(directory),
        settings.presenter.default_locale.clone(),
        settings.presenter.max_depth,
    )))
}

fn build_source(settings: &DirectorySettings) -> Result<Arc<dyn ActivitySource>> {
    let path = settings.path.as_deref();
    match settings.source {
        SourceKind::Sample => Ok(Arc::new(StaticSource::sample())),
        SourceKind::Json => {
            let path = path.context("json source needs a path")?;
            Ok(Arc::new(JsonFileSource::new(path)))
        }
        SourceKind::Sqlite => {
            let path = path.context("sqlite source needs a path")?;
            let db = Database::open(Path::new(path))
                .with_context(|| format!("Failed to open database {path}"))?;
            Ok(Arc::new(SqliteSource::new(db)))
        }
    }
}
