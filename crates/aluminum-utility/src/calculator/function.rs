//! Built-in math functions

use crate::error::UtilityError;
use crate::Result;

/// Largest n whose factorial fits in an f64
const MAX_FACTORIAL: f64 = 170.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    /// `log(base, x)`
    Log,
    Log10,
    Exp,
    Sqrt,
    Abs,
    Ceil,
    Floor,
    Round,
    Factorial,
    Degrees,
    Radians,
}

impl Function {
    pub const ALL: [Function; 20] = [
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Asin,
        Function::Acos,
        Function::Atan,
        Function::Sinh,
        Function::Cosh,
        Function::Tanh,
        Function::Log,
        Function::Log10,
        Function::Exp,
        Function::Sqrt,
        Function::Abs,
        Function::Ceil,
        Function::Floor,
        Function::Round,
        Function::Factorial,
        Function::Degrees,
        Function::Radians,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Log => "log",
            Function::Log10 => "log10",
            Function::Exp => "exp",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Ceil => "ceil",
            Function::Floor => "floor",
            Function::Round => "round",
            Function::Factorial => "factorial",
            Function::Degrees => "degrees",
            Function::Radians => "radians",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Log => 2,
            _ => 1,
        }
    }

    /// Apply to `args`, which holds exactly `arity()` values in call order
    pub fn apply(&self, args: &[f64]) -> Result<f64> {
        let x = args[0];
        let result = match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Log => {
                let (base, value) = (x, args[1]);
                if base <= 0.0 || base == 1.0 {
                    return Err(self.domain("base must be positive and not 1"));
                }
                value.log(base)
            }
            Function::Log10 => x.log10(),
            Function::Exp => x.exp(),
            Function::Sqrt => x.sqrt(),
            Function::Abs => x.abs(),
            Function::Ceil => x.ceil(),
            Function::Floor => x.floor(),
            Function::Round => x.round_ties_even(),
            Function::Factorial => factorial(x).map_err(|reason| self.domain(reason))?,
            Function::Degrees => x.to_degrees(),
            Function::Radians => x.to_radians(),
        };

        if result.is_finite() {
            Ok(result)
        } else {
            Err(self.domain("math domain error"))
        }
    }

    fn domain(&self, reason: &str) -> UtilityError {
        UtilityError::Domain {
            function: self.name(),
            reason: reason.to_string(),
        }
    }
}

fn factorial(x: f64) -> std::result::Result<f64, &'static str> {
    if x < 0.0 || x.fract() != 0.0 {
        return Err("factorial() only accepts non-negative integral values");
    }
    if x > MAX_FACTORIAL {
        return Err("factorial() result too large");
    }
    Ok((2..=x as u64).fold(1.0, |acc, n| acc * n as f64))
}
