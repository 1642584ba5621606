//! Shared-library plugins loaded from a directory at startup.

use std::fs;
use std::path::{Path, PathBuf};

use libloading::Library;

use super::abi::{DECLARATION_SYMBOL, PluginDeclaration, check_abi_version};
use super::{PluginError, PluginSource, PluginUnit, UnitLoad, stage_commands};
use crate::{log_debug, log_warn};

/// Every `*.so` / `*.dylib` / `*.dll` file (per platform) in `dir` is a unit.
#[derive(Debug, Clone)]
pub struct PluginDirectory {
    dir: PathBuf,
}

impl PluginDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

fn is_library(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext == std::env::consts::DLL_EXTENSION)
}

impl PluginSource for PluginDirectory {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    fn units(&self) -> Result<Vec<Box<dyn PluginUnit>>, PluginError> {
        if !self.dir.is_dir() {
            return Err(PluginError::LocationMissing(self.dir.clone()));
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| PluginError::Unreadable {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if is_library(&path) {
                        paths.push(path);
                    } else {
                        log_debug!("ignoring non-plugin file {}", path.display());
                    }
                }
                Err(err) => log_warn!("skipping unreadable entry in {}: {err}", self.location()),
            }
        }
        // Name order makes overrides between units reproducible.
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| Box::new(NativeUnit::new(path)) as Box<dyn PluginUnit>)
            .collect())
    }
}

/// One shared library on disk.
#[derive(Debug)]
pub struct NativeUnit {
    id: String,
    path: PathBuf,
}

impl NativeUnit {
    pub fn new(path: PathBuf) -> Self {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { id, path }
    }
}

impl PluginUnit for NativeUnit {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(self: Box<Self>) -> Result<UnitLoad, PluginError> {
        // SAFETY: loading runs the library's initialisers. Plugins are trusted
        // code placed in the plugin directory by the user.
        let library = unsafe { Library::new(&self.path) }.map_err(|source| PluginError::Load {
            unit: self.id.clone(),
            source,
        })?;

        // SAFETY: `PLUGCALC_PLUGIN` is the address of the exported static.
        let symbol = unsafe { library.get::<*const PluginDeclaration>(DECLARATION_SYMBOL) };
        let pointer = match symbol {
            Ok(symbol) => *symbol,
            Err(err) => {
                return Ok(UnitLoad::NothingExposed {
                    reason: format!("no plugin declaration exported ({err})"),
                });
            }
        };

        // SAFETY: the pointer comes from the library's symbol table and the
        // library is still loaded.
        let declaration = match unsafe { read_declaration(pointer) } {
            Ok(declaration) => declaration,
            Err(reason) => return Ok(UnitLoad::NothingExposed { reason }),
        };

        let commands = stage_commands(&declaration, &self.id)?;
        Ok(UnitLoad::Exposed {
            commands,
            library: Some(library),
        })
    }
}

/// Copy a declaration out of a plugin, reading only its leading
/// `abi_version` until that matches the host.
///
/// # Safety
/// `pointer` must be valid for reads of at least a `u32`, and of a whole
/// `PluginDeclaration` whenever that `u32` equals `PLUGIN_ABI_VERSION`.
unsafe fn read_declaration(
    pointer: *const PluginDeclaration,
) -> Result<PluginDeclaration, String> {
    let version = unsafe { pointer.cast::<u32>().read() };
    check_abi_version(version)?;
    let declaration = unsafe { pointer.read() };
    declaration.check_compatible()?;
    Ok(declaration)
}
