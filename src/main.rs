use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use sarvail::api::ApiClient;
use sarvail::app::{App, AppEvent};
use sarvail::config::Config;
use sarvail::feed::{CategoryKey, CategorySelection, FeedStore, FetchOutcome};
use sarvail::session::SessionStore;
use sarvail::storage::{Database, DatabaseError};
use sarvail::theme::ThemeVariant;
use sarvail::ui;

/// Get the config directory path (~/.config/sarvail/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("sarvail");
    Ok(config_dir)
}

fn parse_category(s: &str) -> Result<CategoryKey, String> {
    CategoryKey::from_slug(s).ok_or_else(|| {
        let known: Vec<&str> = CategoryKey::ALL.iter().map(|k| k.slug()).collect();
        format!("unknown category '{}' (expected one of: {})", s, known.join(", "))
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "sarvail",
    version,
    about = "Terminal client for the Sarvail alumni community"
)]
struct Args {
    /// API base URL (overrides config.toml)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Config file to read instead of ~/.config/sarvail/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Forget the stored user and start signed out
    #[arg(long)]
    reset_session: bool,

    /// Print the news feed to stdout and exit
    #[arg(long)]
    list: bool,

    /// Only list posts in this category (repeatable, with --list)
    #[arg(long = "category", value_name = "SLUG", value_parser = parse_category)]
    categories: Vec<CategoryKey>,

    /// Only list posts whose title contains this text (with --list)
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,
}

/// Create the config directory with user-only permissions.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        if let Err(e) = std::fs::set_permissions(config_dir, perms) {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }
    Ok(())
}

/// Route tracing output. The TUI owns the terminal, so it logs to a file;
/// headless runs log to stderr.
fn init_logging(config_dir: &Path, to_file: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sarvail=info"));

    if to_file {
        let log_path = config_dir.join("sarvail.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

/// Headless mode: fetch once, filter, print.
async fn list_feed(client: &ApiClient, config: &Config, args: &Args) -> Result<()> {
    let selection: CategorySelection = args.categories.iter().copied().collect();
    let mut store = FeedStore::with_selection(config.per_page, selection);
    if let Some(query) = &args.search {
        store.set_query(query.as_str());
    }

    match store.fetch_feed(client).await {
        FetchOutcome::Applied => {}
        FetchOutcome::Failed | FetchOutcome::Superseded => {
            anyhow::bail!(
                "Failed to fetch posts: {}",
                store.error().unwrap_or("unknown error")
            );
        }
    }

    if store.displayed().is_empty() {
        println!("No posts found.");
        return Ok(());
    }

    for post in store.displayed() {
        let date = post.formatted_date().unwrap_or_default();
        let category = post.primary_category().unwrap_or("");
        println!(
            "{:>7}  {:<18}  {:<20}  {}",
            post.id,
            date,
            category,
            sarvail::util::strip_control_chars(post.title_or_blank())
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;
    init_logging(&config_dir, !args.list)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }

    let client = ApiClient::new(&config.base_url, config.request_timeout())
        .with_context(|| format!("Invalid base URL '{}'", config.base_url))?;

    if args.list {
        return list_feed(&client, &config, &args).await;
    }

    let db_path = config_dir.join("sarvail.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of sarvail appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let sessions = SessionStore::new(db.clone());
    if args.reset_session {
        sessions
            .clear()
            .await
            .context("Failed to reset session")?;
        println!("Session reset.");
    }
    let session = sessions.load().await.context("Failed to load session")?;

    let theme = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
        tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
        ThemeVariant::Dark
    });

    let mut app = App::new(config, client, sessions, session);
    app.set_theme(theme);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    ui::run(&mut app, event_tx, event_rx).await?;

    db.close().await;
    println!("Goodbye!");
    Ok(())
}
