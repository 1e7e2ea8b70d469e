//! resx-lens library - Show the resolved text of string resources next to
//! the code that references them
//!
//! This library exposes the engine, watcher and terminal rendering behind
//! the `resx-lens` binary for testing and embedding purposes. The
//! resource model, resolution and layout live in [`resx_lens_core`].

pub mod config;
pub mod daemon;
pub mod logging;
pub mod output;

use config::Config;
use eyre::Result;
use resx_lens_core::{FsLoader, ResourceStore, WalkResources};
use std::path::Path;

/// Load the config for a project root.
///
/// An explicitly given path must exist and parse. The default location may
/// be missing or broken, in which case the defaults apply.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Ok(config::load_or_default(&config::default_config_path(root)).0),
    }
}

/// Apply command-line overrides on top of a loaded config
pub fn apply_overrides(mut config: Config, culture: Option<String>) -> Config {
    if let Some(culture) = culture {
        config.preferred_culture = Some(culture);
    }
    config
}

/// Discover and load every resource file under `root` once, without
/// watching. Used by the one-shot commands.
pub fn load_store(root: &Path, config: &Config) -> Result<ResourceStore> {
    let paths = WalkResources::new(root)
        .extension(&config.extension)
        .exclude(config.exclude.iter().cloned())
        .discover()?;
    let mut store = ResourceStore::default();
    store.load_all(&paths, root, config.preferred_culture.as_deref(), &FsLoader);
    Ok(store)
}
