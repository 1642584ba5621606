/*!
Operation abstraction shared by built-ins and plugins.

An `Operation` takes the argument tokens of one command line and returns an
`Outcome`: either a number or an `OpError`. Operations never let a parse
failure or an arity problem escape as a panic; they convert it into an
`OpError` value that the shell prints.

Items:
  - Operation        (the single-method capability)
  - Outcome / OpError / Arity
  - parse_numbers / require_args (argument helpers for implementors)
  - format_number    (result rendering used by the shell)
*/

pub mod builtin;

use std::fmt;

use thiserror::Error;

/// Result of executing an operation.
pub type Outcome = Result<f64, OpError>;

/// Expected argument count of an operation, used in arity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    AtLeast(usize),
    Exactly(usize),
}

impl Arity {
    pub fn accepts(&self, got: usize) -> bool {
        match *self {
            Arity::AtLeast(n) => got >= n,
            Arity::Exactly(n) => got == n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, n) = match *self {
            Arity::AtLeast(n) => ("at least ", n),
            Arity::Exactly(n) => ("", n),
        };
        let noun = if n == 1 { "argument" } else { "arguments" };
        write!(f, "{prefix}{n} {noun}")
    }
}

/// Recoverable failure reported by an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    /// An argument token is not a number.
    #[error("Invalid input '{token}': not a number")]
    InvalidInput { token: String },

    #[error("Division by zero")]
    DivisionByZero,

    /// Too few (or too many) arguments for the operation.
    #[error("expected {expected}, got {got}")]
    Arity { expected: Arity, got: usize },

    /// Free-form failure for plugin operations with their own rules.
    #[error("{0}")]
    Failed(String),
}

/// A named, stateless unit of computation.
///
/// Implementations must be reusable: the registry holds one instance per
/// command name and calls it for every matching line.
pub trait Operation: Send + Sync {
    fn execute(&self, args: &[&str]) -> Outcome;
}

/// Plain functions work as operations, which keeps small plugins terse.
impl<F> Operation for F
where
    F: Fn(&[&str]) -> Outcome + Send + Sync,
{
    fn execute(&self, args: &[&str]) -> Outcome {
        self(args)
    }
}

/// Parse every token as `f64`, failing on the first one that isn't numeric.
pub fn parse_numbers(args: &[&str]) -> Result<Vec<f64>, OpError> {
    args.iter()
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| OpError::InvalidInput {
                    token: (*raw).to_string(),
                })
        })
        .collect()
}

/// Fail with `OpError::Arity` unless `args` satisfies `expected`.
pub fn require_args(args: &[&str], expected: Arity) -> Result<(), OpError> {
    if expected.accepts(args.len()) {
        Ok(())
    } else {
        Err(OpError::Arity {
            expected,
            got: args.len(),
        })
    }
}

/// Render a result the way the calculator prints it.
///
/// Integral values keep one decimal (`15.0`) so results always read as
/// floating point; everything else uses the shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
