//! Expression calculator
//!
//! Expressions are tokenized, converted to RPN with the shunting-yard
//! algorithm, then evaluated on a stack. Constant names are resolved while
//! evaluating, so `e` never rewrites the inside of `exp` or `sec`.

mod function;
mod rpn;
mod solvers;
mod token;
mod units;

use std::collections::BTreeMap;

pub use function::Function;
pub use solvers::{
    percentage, solve_quadratic, statistics, Complex, PercentageBreakdown, QuadraticSolution,
    RootNature, Statistics,
};
pub use units::{convert as convert_units, supported_units};

use crate::error::UtilityError;
use crate::Result;

pub const BUILTIN_CONSTANTS: [(&str, f64); 5] = [
    ("pi", std::f64::consts::PI),
    ("e", std::f64::consts::E),
    // golden ratio
    ("phi", 1.618_033_988_749_895),
    // speed of light, m/s
    ("c", 299_792_458.0),
    // standard gravity, m/s^2
    ("g", 9.806_65),
];

#[derive(Debug, Clone)]
pub struct Calculator {
    memory: f64,
    history: Vec<String>,
    constants: BTreeMap<String, f64>,
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            memory: 0.0,
            history: Vec::new(),
            constants: BUILTIN_CONSTANTS
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }

    /// Evaluate `expr`; successful results are appended to the history
    pub fn evaluate(&mut self, expr: &str) -> Result<f64> {
        let tokens = token::tokenize(expr)?;
        let rpn = rpn::to_rpn(&tokens)?;
        let value = rpn::evaluate(&rpn, |name| self.constants.get(name).copied())?;

        self.history.push(format!("{} = {}", expr.trim(), value));
        tracing::debug!(expression = %expr, value, "Evaluated expression");
        Ok(value)
    }

    pub fn memory_store(&mut self, value: f64) {
        self.memory = value;
    }

    pub fn memory_recall(&self) -> f64 {
        self.memory
    }

    pub fn memory_clear(&mut self) {
        self.memory = 0.0;
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Register a custom constant. Names are alphabetic and case-insensitive.
    pub fn add_constant(&mut self, name: &str, value: f64) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(UtilityError::InvalidConstantName(name.to_string()));
        }
        let key = name.to_ascii_lowercase();
        if self.constants.contains_key(&key) || Function::from_name(&key).is_some() {
            return Err(UtilityError::ConstantExists(key));
        }

        self.constants.insert(key, value);
        Ok(())
    }

    pub fn remove_constant(&mut self, name: &str) -> Result<()> {
        let key = name.to_ascii_lowercase();
        if BUILTIN_CONSTANTS.iter().any(|(builtin, _)| *builtin == key) {
            return Err(UtilityError::BuiltinConstant(key));
        }
        self.constants
            .remove(&key)
            .map(|_| ())
            .ok_or(UtilityError::ConstantNotFound(key))
    }

    pub fn constants(&self) -> &BTreeMap<String, f64> {
        &self.constants
    }

    pub fn convert_units(&self, value: f64, from: &str, to: &str) -> Result<f64> {
        units::convert(value, from, to)
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}
