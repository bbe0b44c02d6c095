//! savekeep Steam library scan entry point.
//!
//! Loads the tracked games and configured Steam libraries, reconciles
//! installed titles into the registry and prints what was found.

use savekeep_games::GameRegistry;
use savekeep_library::LibraryManager;
use savekeep_library::manager::{SETTINGS_SECTION, UPDATE_NAMES_KEY};
use savekeep_settings::{AppDirs, JsonSettings, SettingsStore};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting savekeep scan");

    let dirs = AppDirs::new()?;
    dirs.ensure()?;

    let settings = JsonSettings::open(dirs.settings_path())?;
    let update_names = settings.flag(SETTINGS_SECTION, UPDATE_NAMES_KEY);

    let mut registry = GameRegistry::open(dirs.games_dir())?;
    tracing::info!(games = registry.len(), "game registry loaded");

    let mut libraries = LibraryManager::load(Box::new(settings), &dirs.state_dir())?;
    if libraries.libraries().is_empty() {
        match libraries.add_detected_libraries() {
            Ok(added) => tracing::info!(added, "detected steam libraries"),
            Err(e) => tracing::warn!(error = %e, "no steam installation detected"),
        }
    }

    let report = libraries.reconcile(&mut registry, update_names);
    tracing::info!(
        updated = report.updated.len(),
        failed = report.failed.len(),
        mismatches = report.mismatches.len(),
        "reconciled steam libraries"
    );

    println!("Registered:");
    for (appid, app) in libraries.registered_apps(&registry) {
        let id = registry
            .by_steam_appid(appid)
            .map(|game| game.id())
            .unwrap_or_default();
        println!(
            "  {appid:>8}  {id}  ({})",
            app.install_path().display()
        );
    }

    println!("Unregistered:");
    for (appid, app) in libraries.unregistered_apps(&registry) {
        println!(
            "  {appid:>8}  {}",
            app.manifest.name().unwrap_or_default()
        );
    }

    let ignored = libraries.ignore_list();
    if !ignored.is_empty() {
        println!("Ignored: {}", ignored.len());
    }

    Ok(())
}
