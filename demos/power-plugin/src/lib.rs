//! Example native plugin: `power <base> <exponent>` and `sqrt <x>`.

use plugcalc::ops::{Arity, OpError, Outcome, parse_numbers, require_args};
use plugcalc::plugin::CommandRegistrar;

fn power(args: &[&str]) -> Outcome {
    require_args(args, Arity::Exactly(2))?;
    let n = parse_numbers(args)?;
    Ok(n[0].powf(n[1]))
}

fn sqrt(args: &[&str]) -> Outcome {
    require_args(args, Arity::Exactly(1))?;
    let x = parse_numbers(args)?[0];
    if x < 0.0 {
        return Err(OpError::Failed(format!("cannot take the square root of {x}")));
    }
    Ok(x.sqrt())
}

fn register(registrar: &mut dyn CommandRegistrar) {
    registrar.register_command("power", Box::new(power));
    registrar.register_command("sqrt", Box::new(sqrt));
}

plugcalc::export_plugin!("power", register);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_and_sqrt() {
        assert_eq!(power(&["2", "10"]), Ok(1024.0));
        assert_eq!(sqrt(&["9"]), Ok(3.0));
        assert!(matches!(sqrt(&["-1"]), Err(OpError::Failed(_))));
        assert!(matches!(power(&["2"]), Err(OpError::Arity { .. })));
    }

    #[test]
    fn declaration_is_compatible_with_host() {
        assert!(PLUGCALC_PLUGIN.check_compatible().is_ok());
        assert_eq!(PLUGCALC_PLUGIN.name, "power");
    }
}
