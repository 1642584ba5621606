/*!
Command registry: name -> operation.

Lifecycle:
  1. `Registry::with_builtins()` at startup
  2. plugin discovery calls `register` / `retain_library`
  3. the registry is moved into the shell, which only reads from it

Registration is last-writer-wins: a later `register` with an existing name
replaces the earlier operation and hands it back to the caller.
*/

use std::collections::BTreeMap;
use std::fmt;

use libloading::Library;
use thiserror::Error;

use crate::ops::Operation;
use crate::ops::builtin::builtins;

/// Shell control command that lists registered names.
pub const MENU_COMMAND: &str = "menu";
/// Shell control command that ends the session.
pub const EXIT_COMMAND: &str = "exit";

/// Names the shell intercepts before consulting the registry.
pub const RESERVED_NAMES: &[&str] = &[MENU_COMMAND, EXIT_COMMAND];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command name must not be empty")]
    EmptyName,

    #[error("command name '{0}' contains whitespace")]
    Whitespace(String),

    #[error("command name '{0}' is reserved by the shell")]
    Reserved(String),
}

/// Check that `name` could be typed as the first token of a command line.
pub fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(RegistryError::Whitespace(name.to_string()));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(RegistryError::Reserved(name.to_string()));
    }
    Ok(())
}

#[derive(Default)]
pub struct Registry {
    commands: BTreeMap<String, Box<dyn Operation>>,
    // Declared after `commands`: plugin operations must drop before the
    // code backing them is unmapped.
    libraries: Vec<Library>,
}

impl Registry {
    /// Empty registry (no built-ins).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with add / subtract / multiply / divide.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, op) in builtins() {
            registry.commands.insert(name.to_string(), op);
        }
        registry
    }

    /// Insert or overwrite `name`. Returns the operation it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        operation: Box<dyn Operation>,
    ) -> Result<Option<Box<dyn Operation>>, RegistryError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(self.commands.insert(name, operation))
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Operation> {
        self.commands.get(name).map(|op| op.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Keep a plugin library mapped for as long as the registry lives.
    pub fn retain_library(&mut self, library: Library) {
        self.libraries.push(library);
    }

    pub fn library_count(&self) -> usize {
        self.libraries.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("commands", &self.names())
            .field("libraries", &self.libraries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{OpError, Outcome};

    fn constant(value: f64) -> Box<dyn Operation> {
        Box::new(move |_: &[&str]| -> Outcome { Ok(value) })
    }

    #[test]
    fn builtins_are_registered() {
        let registry = Registry::with_builtins();
        assert_eq!(
            registry.names(),
            ["add", "divide", "multiply", "subtract"],
            "names are sorted"
        );
        let add = registry.lookup("add").unwrap();
        assert_eq!(add.execute(&["2", "3"]), Ok(5.0));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = Registry::with_builtins();
        assert!(registry.lookup("ADD").is_none());
        assert!(!registry.contains("Add"));
    }

    #[test]
    fn last_writer_wins() {
        let mut registry = Registry::with_builtins();
        let replaced = registry.register("add", constant(42.0)).unwrap();
        assert!(replaced.is_some(), "previous operation handed back");
        assert_eq!(registry.lookup("add").unwrap().execute(&["1"]), Ok(42.0));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn register_new_name() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        let replaced = registry.register("half", constant(0.5)).unwrap();
        assert!(replaced.is_none());
        assert_eq!(registry.names(), ["half"]);
    }

    #[test]
    fn invalid_names_rejected() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.register("", constant(1.0)).err(),
            Some(RegistryError::EmptyName)
        );
        assert_eq!(
            registry.register("two words", constant(1.0)).err(),
            Some(RegistryError::Whitespace("two words".into()))
        );
        assert_eq!(
            registry.register("exit", constant(1.0)).err(),
            Some(RegistryError::Reserved("exit".into()))
        );
        assert!(registry.register("menu", constant(1.0)).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn operation_errors_pass_through_lookup() {
        let registry = Registry::with_builtins();
        let divide = registry.lookup("divide").unwrap();
        assert_eq!(divide.execute(&["1", "0"]), Err(OpError::DivisionByZero));
    }

    #[test]
    fn debug_lists_names() {
        let registry = Registry::with_builtins();
        let dbg = format!("{registry:?}");
        assert!(dbg.contains("subtract"));
        assert_eq!(registry.library_count(), 0);
    }
}
