//! Built-in arithmetic operations: add, subtract, multiply, divide.

use super::{Arity, OpError, Operation, Outcome, parse_numbers, require_args};

/// Sum of all arguments. No arguments yields `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

/// First argument minus the sum of the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Subtract;

/// Product of all arguments. No arguments yields `1.0`, the neutral element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multiply;

/// First argument divided by each of the rest, left to right.
#[derive(Debug, Clone, Copy, Default)]
pub struct Divide;

impl Operation for Add {
    fn execute(&self, args: &[&str]) -> Outcome {
        Ok(parse_numbers(args)?.into_iter().sum())
    }
}

impl Operation for Subtract {
    fn execute(&self, args: &[&str]) -> Outcome {
        require_args(args, Arity::AtLeast(1))?;
        let numbers = parse_numbers(args)?;
        let (first, rest) = split_head(&numbers)?;
        Ok(first - rest.iter().sum::<f64>())
    }
}

impl Operation for Multiply {
    fn execute(&self, args: &[&str]) -> Outcome {
        Ok(parse_numbers(args)?.into_iter().fold(1.0, |acc, n| acc * n))
    }
}

impl Operation for Divide {
    fn execute(&self, args: &[&str]) -> Outcome {
        require_args(args, Arity::AtLeast(1))?;
        let numbers = parse_numbers(args)?;
        let (first, rest) = split_head(&numbers)?;
        rest.iter().try_fold(first, |acc, &divisor| {
            if divisor == 0.0 {
                Err(OpError::DivisionByZero)
            } else {
                Ok(acc / divisor)
            }
        })
    }
}

fn split_head(numbers: &[f64]) -> Result<(f64, &[f64]), OpError> {
    match numbers.split_first() {
        Some((first, rest)) => Ok((*first, rest)),
        None => Err(OpError::Arity {
            expected: Arity::AtLeast(1),
            got: 0,
        }),
    }
}

/// Names and instances of the built-in operations, in menu order.
pub fn builtins() -> Vec<(&'static str, Box<dyn Operation>)> {
    vec![
        ("add", Box::new(Add)),
        ("subtract", Box::new(Subtract)),
        ("multiply", Box::new(Multiply)),
        ("divide", Box::new(Divide)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sums_arguments() {
        assert_eq!(Add.execute(&["5", "10"]), Ok(15.0));
        assert_eq!(Add.execute(&["1.5", "-0.5", "2"]), Ok(3.0));
        assert_eq!(Add.execute(&[]), Ok(0.0));
    }

    #[test]
    fn subtract_first_minus_rest() {
        assert_eq!(Subtract.execute(&["10", "3"]), Ok(7.0));
        assert_eq!(Subtract.execute(&["10", "3", "2"]), Ok(5.0));
        assert_eq!(Subtract.execute(&["4"]), Ok(4.0));
    }

    #[test]
    fn subtract_without_arguments_is_arity_error() {
        assert_eq!(
            Subtract.execute(&[]),
            Err(OpError::Arity {
                expected: Arity::AtLeast(1),
                got: 0
            })
        );
    }

    #[test]
    fn multiply_product_and_identity() {
        assert_eq!(Multiply.execute(&["2", "4"]), Ok(8.0));
        assert_eq!(Multiply.execute(&["2", "4", "0.5"]), Ok(4.0));
        assert_eq!(Multiply.execute(&[]), Ok(1.0));
    }

    #[test]
    fn divide_sequentially() {
        assert_eq!(Divide.execute(&["8", "2"]), Ok(4.0));
        assert_eq!(Divide.execute(&["100", "5", "4"]), Ok(5.0));
        assert_eq!(Divide.execute(&["9"]), Ok(9.0));
    }

    #[test]
    fn divide_by_zero_is_a_result_not_a_fault() {
        assert_eq!(Divide.execute(&["10", "0"]), Err(OpError::DivisionByZero));
        assert_eq!(
            Divide.execute(&["10", "2", "-0"]),
            Err(OpError::DivisionByZero),
            "negative zero is still zero"
        );
    }

    #[test]
    fn divide_without_arguments_is_arity_error() {
        assert!(matches!(
            Divide.execute(&[]),
            Err(OpError::Arity { got: 0, .. })
        ));
    }

    #[test]
    fn invalid_tokens_become_invalid_input() {
        let cases: Vec<(&dyn Operation, &[&str])> = vec![
            (&Add as &dyn Operation, &["a", "b"][..]),
            (&Subtract as &dyn Operation, &["x", "5"][..]),
            (&Multiply as &dyn Operation, &["@", "#"][..]),
            (&Divide as &dyn Operation, &["8", "zero"][..]),
        ];
        for (op, args) in cases {
            assert!(
                matches!(op.execute(args), Err(OpError::InvalidInput { .. })),
                "args {args:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_token_reported_before_zero_divisor() {
        assert_eq!(
            Divide.execute(&["8", "0", "q"]),
            Err(OpError::InvalidInput { token: "q".into() })
        );
    }

    #[test]
    fn builtin_names() {
        let names: Vec<_> = builtins().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["add", "subtract", "multiply", "divide"]);
    }
}
