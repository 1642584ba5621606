/*!
Plugin discovery.

A `PluginSource` enumerates `PluginUnit`s; each unit is loaded on its own and
its commands are merged into the `Registry`. Faults stay local:

  - source location missing / unreadable -> diagnostic, source contributes nothing
  - unit fails to load or panics while registering -> diagnostic, unit skipped
  - unit exports no usable declaration -> treated as "no commands exposed"
  - a single command with an invalid name -> that entry skipped

Units stage their commands in a `CommandSet` first, so a unit that faults
half-way through registration leaves the registry untouched.

Sources:
  bundled.rs  BundledPlugins  (entry points compiled into the binary)
  native.rs   PluginDirectory (shared libraries, see abi.rs)
*/

pub mod abi;
pub mod bundled;
pub mod native;

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;

use libloading::Library;
use thiserror::Error;

use crate::ops::Operation;
use crate::registry::{Registry, RegistryError};
use crate::utils::panic_message;
use crate::{log_debug, log_info, log_warn};

pub use abi::{CORE_VERSION, CommandRegistrar, PLUGIN_ABI_VERSION, PluginDeclaration};
pub use bundled::BundledPlugins;
pub use native::PluginDirectory;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin location '{}' not found", .0.display())]
    LocationMissing(PathBuf),

    #[error("cannot read plugin location '{}': {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load plugin '{unit}': {source}")]
    Load {
        unit: String,
        #[source]
        source: libloading::Error,
    },

    #[error("plugin '{unit}' panicked while registering commands: {message}")]
    Panicked { unit: String, message: String },
}

impl PluginError {
    /// Unit the error belongs to, if it is unit-scoped.
    pub fn unit(&self) -> Option<&str> {
        match self {
            PluginError::Load { unit, .. } | PluginError::Panicked { unit, .. } => Some(unit),
            PluginError::LocationMissing(_) | PluginError::Unreadable { .. } => None,
        }
    }
}

/// Somewhere plugin units live.
pub trait PluginSource {
    /// Human-readable location for diagnostics.
    fn location(&self) -> String;

    /// Enumerate loadable units. Does not load them.
    fn units(&self) -> Result<Vec<Box<dyn PluginUnit>>, PluginError>;
}

/// One independently loadable bundle of commands.
pub trait PluginUnit {
    fn id(&self) -> &str;

    fn load(self: Box<Self>) -> Result<UnitLoad, PluginError>;
}

/// Outcome of successfully loading a unit.
pub enum UnitLoad {
    Exposed {
        commands: CommandSet,
        /// Library backing the operations; must outlive them.
        library: Option<Library>,
    },
    NothingExposed { reason: String },
}

/// Commands staged by one unit, in registration order.
#[derive(Default)]
pub struct CommandSet {
    entries: Vec<(String, Box<dyn Operation>)>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CommandRegistrar for CommandSet {
    fn register_command(&mut self, name: &str, operation: Box<dyn Operation>) {
        self.entries.push((name.to_string(), operation));
    }
}

impl IntoIterator for CommandSet {
    type Item = (String, Box<dyn Operation>);
    type IntoIter = std::vec::IntoIter<(String, Box<dyn Operation>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Run a declaration's `register` into a fresh `CommandSet`, containing panics.
pub(crate) fn stage_commands(
    declaration: &PluginDeclaration,
    unit: &str,
) -> Result<CommandSet, PluginError> {
    let mut staged = CommandSet::new();
    let result = catch_unwind(AssertUnwindSafe(|| (declaration.register)(&mut staged)));
    match result {
        Ok(()) => Ok(staged),
        Err(payload) => {
            // Payload and partial set are dropped here, while the unit's
            // code is still mapped.
            let message = panic_message(payload.as_ref());
            drop(payload);
            drop(staged);
            Err(PluginError::Panicked {
                unit: unit.to_string(),
                message,
            })
        }
    }
}

/// A unit whose commands made it into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPlugin {
    pub unit: String,
    pub commands: Vec<String>,
}

/// A command entry the registry refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCommand {
    pub unit: String,
    pub error: RegistryError,
}

/// What a discovery pass did.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub loaded: Vec<LoadedPlugin>,
    /// Units that loaded but exposed nothing, with the reason.
    pub empty: Vec<(String, String)>,
    pub rejected: Vec<RejectedCommand>,
    /// Registered names that replaced an earlier registration.
    pub overridden: Vec<String>,
    pub failures: Vec<PluginError>,
}

impl DiscoveryReport {
    /// Every command name registered by plugins, in merge order.
    pub fn command_names(&self) -> Vec<&str> {
        self.loaded
            .iter()
            .flat_map(|p| p.commands.iter().map(String::as_str))
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn missing_locations(&self) -> Vec<&PathBuf> {
        self.failures
            .iter()
            .filter_map(|f| match f {
                PluginError::LocationMissing(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} plugin unit(s) loaded, {} command(s) registered, {} failure(s)",
            self.loaded.len(),
            self.command_names().len(),
            self.failures.len()
        )
    }
}

/// Load every unit of every source into `registry`, in order.
///
/// Later sources and later units override earlier registrations of the same
/// name. Never fails: problems are logged and collected in the report.
pub fn discover(registry: &mut Registry, sources: &[&dyn PluginSource]) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for source in sources {
        let units = match source.units() {
            Ok(units) => units,
            Err(err) => {
                log_warn!("{err}; continuing without plugins from this location");
                report.failures.push(err);
                continue;
            }
        };
        log_debug!("{} unit(s) found in {}", units.len(), source.location());

        for unit in units {
            let id = unit.id().to_string();
            match unit.load() {
                Ok(UnitLoad::Exposed { commands, library }) => {
                    let loaded = merge_unit(registry, &id, commands, &mut report);
                    if let Some(library) = library {
                        registry.retain_library(library);
                    }
                    log_info!(
                        "loaded plugin '{id}': {}",
                        if loaded.commands.is_empty() {
                            "(no commands)".to_string()
                        } else {
                            loaded.commands.join(", ")
                        }
                    );
                    report.loaded.push(loaded);
                }
                Ok(UnitLoad::NothingExposed { reason }) => {
                    log_warn!("plugin '{id}' exposes no commands: {reason}");
                    report.empty.push((id, reason));
                }
                Err(err) => {
                    log_warn!("{err}; skipping");
                    report.failures.push(err);
                }
            }
        }
    }

    log_debug!("{}", report.summary());
    report
}

fn merge_unit(
    registry: &mut Registry,
    unit: &str,
    commands: CommandSet,
    report: &mut DiscoveryReport,
) -> LoadedPlugin {
    let mut registered = Vec::with_capacity(commands.len());
    for (name, operation) in commands {
        match registry.register(name.clone(), operation) {
            Ok(previous) => {
                if previous.is_some() {
                    log_info!("plugin '{unit}' overrides command '{name}'");
                    report.overridden.push(name.clone());
                }
                registered.push(name);
            }
            Err(error) => {
                log_warn!("plugin '{unit}': {error}; command skipped");
                report.rejected.push(RejectedCommand {
                    unit: unit.to_string(),
                    error,
                });
            }
        }
    }
    LoadedPlugin {
        unit: unit.to_string(),
        commands: registered,
    }
}
