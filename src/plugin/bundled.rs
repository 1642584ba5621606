//! Plugins compiled into the binary.
//!
//! Bundled units go through the same declaration / staging path as native
//! libraries, so they can be switched off and overridden like any plugin.

use super::abi::{CommandRegistrar, PluginDeclaration};
use super::{PluginError, PluginSource, PluginUnit, UnitLoad, stage_commands};
use crate::ops::{Arity, OpError, Operation, Outcome, parse_numbers, require_args};

/// Floored modulo: the result takes the sign of the divisor (`7 % -3 == -2`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Modulus;

impl Operation for Modulus {
    fn execute(&self, args: &[&str]) -> Outcome {
        require_args(args, Arity::Exactly(2))?;
        let numbers = parse_numbers(args)?;
        let (dividend, divisor) = (numbers[0], numbers[1]);
        if divisor == 0.0 {
            return Err(OpError::DivisionByZero);
        }
        let rem = dividend % divisor;
        if rem != 0.0 && (rem < 0.0) != (divisor < 0.0) {
            Ok(rem + divisor)
        } else {
            Ok(rem)
        }
    }
}

fn register_modulus(registrar: &mut dyn CommandRegistrar) {
    registrar.register_command("modulus", Box::new(Modulus));
}

pub static MODULUS_PLUGIN: PluginDeclaration = PluginDeclaration::new("modulus", register_modulus);

/// Build-time list of plugin entry points.
#[derive(Debug, Clone)]
pub struct BundledPlugins {
    declarations: Vec<PluginDeclaration>,
}

impl BundledPlugins {
    pub fn new(declarations: impl IntoIterator<Item = PluginDeclaration>) -> Self {
        Self {
            declarations: declarations.into_iter().collect(),
        }
    }

    /// The plugins shipped with the calculator.
    pub fn shipped() -> Self {
        Self::new([MODULUS_PLUGIN])
    }
}

impl PluginSource for BundledPlugins {
    fn location(&self) -> String {
        "bundled".to_string()
    }

    fn units(&self) -> Result<Vec<Box<dyn PluginUnit>>, PluginError> {
        Ok(self
            .declarations
            .iter()
            .map(|decl| {
                Box::new(StaticUnit {
                    id: format!("bundled:{}", decl.name),
                    declaration: *decl,
                }) as Box<dyn PluginUnit>
            })
            .collect())
    }
}

/// A unit whose declaration is already linked in.
struct StaticUnit {
    id: String,
    declaration: PluginDeclaration,
}

impl PluginUnit for StaticUnit {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(self: Box<Self>) -> Result<UnitLoad, PluginError> {
        if let Err(reason) = self.declaration.check_compatible() {
            return Ok(UnitLoad::NothingExposed { reason });
        }
        let commands = stage_commands(&self.declaration, &self.id)?;
        Ok(UnitLoad::Exposed {
            commands,
            library: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulus_basic() {
        assert_eq!(Modulus.execute(&["10", "3"]), Ok(1.0));
        assert_eq!(Modulus.execute(&["7.5", "2"]), Ok(1.5));
        assert_eq!(Modulus.execute(&["9", "3"]), Ok(0.0));
    }

    #[test]
    fn modulus_takes_sign_of_divisor() {
        assert_eq!(Modulus.execute(&["7", "-3"]), Ok(-2.0));
        assert_eq!(Modulus.execute(&["-7", "3"]), Ok(2.0));
        assert_eq!(Modulus.execute(&["-7", "-3"]), Ok(-1.0));
    }

    #[test]
    fn modulus_errors() {
        assert_eq!(Modulus.execute(&["1", "0"]), Err(OpError::DivisionByZero));
        assert!(matches!(
            Modulus.execute(&["1"]),
            Err(OpError::Arity {
                expected: Arity::Exactly(2),
                got: 1
            })
        ));
        assert!(matches!(
            Modulus.execute(&["1", "2", "3"]),
            Err(OpError::Arity { got: 3, .. })
        ));
        assert!(matches!(
            Modulus.execute(&["a", "2"]),
            Err(OpError::InvalidInput { .. })
        ));
    }

    #[test]
    fn shipped_units_expose_modulus() {
        let units = BundledPlugins::shipped().units().unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id(), "bundled:modulus");

        let unit = units.into_iter().next().unwrap();
        match unit.load().unwrap() {
            UnitLoad::Exposed { commands, library } => {
                assert_eq!(commands.names(), ["modulus"]);
                assert!(library.is_none());
            }
            UnitLoad::NothingExposed { reason } => panic!("unexpected: {reason}"),
        }
    }

    #[test]
    fn incompatible_declaration_exposes_nothing() {
        let stale = PluginDeclaration {
            abi_version: 0,
            ..MODULUS_PLUGIN
        };
        let unit = BundledPlugins::new([stale]).units().unwrap().remove(0);
        assert!(matches!(
            unit.load().unwrap(),
            UnitLoad::NothingExposed { .. }
        ));
    }
}
