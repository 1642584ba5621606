//! plugcalc: an interactive calculator whose commands can be extended by plugins.
//!
//! Layout:
//!   ops/       Operation trait, OpError, built-in arithmetic
//!   registry   name -> operation table (last writer wins)
//!   plugin/    discovery: bundled entry points + shared-library units
//!   shell      line-oriented dispatcher (menu / exit / <name> args...)
//!   config     config file + CLI/env/file settings resolution
//!   format     terminal coloring
//!   utils      logging macros, panic helpers
//!
//! Plugin authors depend on this crate and use [`export_plugin!`] from a
//! `cdylib`; see [`plugin::abi`].

pub mod config;
pub mod format;
pub mod ops;
pub mod plugin;
pub mod registry;
pub mod shell;
pub mod utils;

pub use ops::{OpError, Operation, Outcome};
pub use registry::Registry;

use config::Settings;
use plugin::{BundledPlugins, DiscoveryReport, PluginDirectory, PluginSource, discover};

/// Build the startup registry: built-ins, then bundled plugins (if enabled),
/// then the plugin directory. Never fails; see the returned report.
pub fn startup_registry(settings: &Settings) -> (Registry, DiscoveryReport) {
    let mut registry = Registry::with_builtins();
    let bundled = BundledPlugins::shipped();
    let directory = PluginDirectory::new(&settings.plugin_dir);

    let mut sources: Vec<&dyn PluginSource> = Vec::with_capacity(2);
    if settings.bundled_plugins {
        sources.push(&bundled);
    }
    sources.push(&directory);

    let report = discover(&mut registry, &sources);
    crate::log_info!("{}", report.summary());
    (registry, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_with_missing_plugin_dir() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            plugin_dir: dir.path().join("plugins"),
            ..Settings::default()
        };
        let (registry, report) = startup_registry(&settings);
        assert_eq!(
            registry.names(),
            ["add", "divide", "modulus", "multiply", "subtract"]
        );
        assert_eq!(report.missing_locations().len(), 1);
    }

    #[test]
    fn startup_without_bundled_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            plugin_dir: dir.path().to_path_buf(),
            bundled_plugins: false,
            ..Settings::default()
        };
        let (registry, report) = startup_registry(&settings);
        assert_eq!(registry.names(), ["add", "divide", "multiply", "subtract"]);
        assert!(!report.has_failures());
        assert!(report.loaded.is_empty());
    }
}
