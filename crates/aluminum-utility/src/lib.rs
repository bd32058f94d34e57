//! Aluminum Utilities
//!
//! - `calculator`: expression evaluator (tokenizer, shunting-yard, RPN
//!   evaluation) with memory, history, constants, unit conversion and a few
//!   solvers
//! - `coder`: lightweight source code analysis helpers

pub mod calculator;
pub mod coder;
mod error;

pub use calculator::Calculator;
pub use coder::CodingUtility;
pub use error::UtilityError;

pub type Result<T> = std::result::Result<T, UtilityError>;
