//! Plugin ABI contract.
//!
//! A plugin unit exposes one `PluginDeclaration` under the exported symbol
//! `PLUGCALC_PLUGIN`. The host reads the declaration, checks the versions and
//! calls `register` with a registrar that stages the unit's commands.
//!
//! ```ignore
//! use plugcalc::ops::{Outcome, parse_numbers};
//! use plugcalc::plugin::CommandRegistrar;
//!
//! fn register(registrar: &mut dyn CommandRegistrar) {
//!     registrar.register_command("double", Box::new(|args: &[&str]| -> Outcome {
//!         Ok(parse_numbers(args)?.iter().map(|n| n * 2.0).sum())
//!     }));
//! }
//!
//! plugcalc::export_plugin!("doubler", register);
//! ```
//!
//! The declaration is `#[repr(C)]` with `abi_version: u32` at offset 0, so a
//! host can always read the version of any plugin, however old. The remaining
//! fields hold Rust types (`&str`, `fn(&mut dyn ..)`) and are only read once
//! the version matches; a native plugin must also be built with the same
//! toolchain and the same `plugcalc` version as the host.

use std::fmt;

use crate::ops::Operation;

/// Bumped whenever `PluginDeclaration` or `CommandRegistrar` change shape.
pub const PLUGIN_ABI_VERSION: u32 = 1;

/// Version of the crate the host (or plugin) was compiled against.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exported symbol name, NUL-terminated for `libloading`.
pub const DECLARATION_SYMBOL: &[u8] = b"PLUGCALC_PLUGIN\0";

/// Sink that a plugin's `register` function hands its commands to.
pub trait CommandRegistrar {
    fn register_command(&mut self, name: &str, operation: Box<dyn Operation>);
}

/// What a plugin unit exports.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PluginDeclaration {
    /// Must stay the first field in every ABI version.
    pub abi_version: u32,
    pub core_version: &'static str,
    /// Human-readable plugin name used in diagnostics.
    pub name: &'static str,
    pub register: fn(&mut dyn CommandRegistrar),
}

impl PluginDeclaration {
    /// Declaration stamped with this crate's ABI and core versions.
    pub const fn new(name: &'static str, register: fn(&mut dyn CommandRegistrar)) -> Self {
        Self {
            abi_version: PLUGIN_ABI_VERSION,
            core_version: CORE_VERSION,
            name,
            register,
        }
    }

    /// `Err` describes why the host cannot call into this declaration.
    pub fn check_compatible(&self) -> Result<(), String> {
        check_abi_version(self.abi_version)?;
        if self.core_version != CORE_VERSION {
            return Err(format!(
                "built against plugcalc {} (host is {})",
                self.core_version, CORE_VERSION
            ));
        }
        Ok(())
    }
}

/// Version gate applied before anything past `abi_version` is read.
pub fn check_abi_version(version: u32) -> Result<(), String> {
    if version != PLUGIN_ABI_VERSION {
        return Err(format!(
            "plugin ABI version {version} (host expects {PLUGIN_ABI_VERSION})"
        ));
    }
    Ok(())
}

impl fmt::Debug for PluginDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDeclaration")
            .field("name", &self.name)
            .field("abi_version", &self.abi_version)
            .field("core_version", &self.core_version)
            .finish()
    }
}

/// Export a `PluginDeclaration` from a `cdylib` plugin crate.
///
/// `$name` is the plugin's display name, `$register` a
/// `fn(&mut dyn CommandRegistrar)`.
#[macro_export]
macro_rules! export_plugin {
    ($name:expr, $register:expr) => {
        #[unsafe(no_mangle)]
        pub static PLUGCALC_PLUGIN: $crate::plugin::PluginDeclaration =
            $crate::plugin::PluginDeclaration::new($name, $register);
    };
}
