//! Utility error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtilityError {
    #[error("Invalid character in expression: {0:?}")]
    InvalidCharacter(char),

    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Mismatched parentheses")]
    MismatchedParentheses,

    #[error("Invalid expression: {0}")]
    Malformed(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Error in function {function}: {reason}")]
    Domain {
        function: &'static str,
        reason: String,
    },

    #[error("Result is not a finite number")]
    NonFinite,

    #[error("Constant name must contain only alphabetic characters: {0}")]
    InvalidConstantName(String),

    #[error("Constant '{0}' already exists")]
    ConstantExists(String),

    #[error("Constant '{0}' does not exist")]
    ConstantNotFound(String),

    #[error("Cannot remove built-in constant '{0}'")]
    BuiltinConstant(String),

    #[error("Unsupported or incompatible units: {from} -> {to}")]
    IncompatibleUnits { from: String, to: String },

    #[error("Coefficient 'a' must be non-zero for a quadratic equation")]
    NotQuadratic,
}
