//! Prospector CLI - inspect the client session and preferences from a shell.
//!
//! Wires the core engines to the real backend and prints what the web shell
//! would gate its rendering on.

use std::io;

use anyhow::{bail, Context, Result};
use prospector_core::{
    ApiClient, AuthSessionManager, Config, Document, MemoryDocument, Preference,
    PreferencesEngine, SessionState,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: prospector <command>

Commands:
  status                   Check the current session
  navigate <path>          Simulate arriving at a route, then check the session
  prefs                    Load preferences and show the styled document
  prefs set <key> <value>  Change one preference and save it";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config() -> Config {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    config.with_env_overrides()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let config = load_config();
    info!(base_url = %config.base_url, "Prospector starting");
    let api = ApiClient::from_config(&config).context("Failed to create API client")?;

    match args.as_slice() {
        ["status"] => {
            let mut auth = AuthSessionManager::new(api, config.auth.clone());
            print_session(&auth.mount().await);
        }
        ["navigate", path] => {
            let mut auth = AuthSessionManager::new(api, config.auth.clone());
            auth.mount().await;
            print_session(&auth.navigate(path).await);
        }
        ["prefs"] => {
            let mut engine = PreferencesEngine::new(api, MemoryDocument::new());
            if let Err(e) = engine.load().await {
                eprintln!("Could not load preferences ({}), showing defaults", e);
            }
            print_preferences(&engine)?;
        }
        ["prefs", "set", key, value] => {
            let change = Preference::parse(key, value)?;
            let mut engine = PreferencesEngine::new(api, MemoryDocument::new());
            // A failed load must not overwrite the stored record with defaults
            engine
                .load()
                .await
                .context("Failed to load preferences before saving")?;
            engine.update(change);
            engine
                .save_current()
                .await
                .context("Failed to save preferences")?;
            print_preferences(&engine)?;
        }
        _ => {
            eprintln!("{}", USAGE);
            bail!("unrecognized command");
        }
    }

    Ok(())
}

fn print_session(state: &SessionState) {
    println!("phase:            {:?}", state.phase);
    println!("authenticated:    {}", state.is_authenticated);
    println!("logged out:       {}", state.is_logged_out);
    if let Some(ref user) = state.user {
        println!("user:             {} <{}>", user.display_name(), user.email);
    }
    if let Some(ref error) = state.error {
        println!("last error:       {}", error);
    }
}

fn print_preferences(engine: &PreferencesEngine<ApiClient, MemoryDocument>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(engine.preferences())?);

    let doc = engine.document();
    let markers: Vec<&str> = doc.markers().collect();
    println!();
    println!("document markers: {}", markers.join(" "));
    if let Some(size) = doc.font_size() {
        println!("font size:        {}px", size);
    }
    let styles: Vec<&str> = doc.style_ids().collect();
    if !styles.is_empty() {
        println!("style overrides:  {}", styles.join(" "));
    }
    Ok(())
}
