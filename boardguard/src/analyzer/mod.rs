//! Validation engine.
//!
//! [`validate`] runs the fourteen default checks in their fixed order and
//! returns every finding. It never stops at the first problem and never
//! mutates the board, so calling it twice yields identical output.

pub mod connectivity;
pub mod rules;

pub use connectivity::{ConnectivityGraph, CopperNode};
pub use rules::{Rule, RuleContext, RulesEngine};

use crate::errors::ValidationError;
use crate::parser::schema::Board;

/// Run every default check against `board`.
pub fn validate(board: &Board) -> Vec<ValidationError> {
    RulesEngine::with_default_rules().validate(board)
}

/// Ids of the default checks, in execution order.
pub fn check_names() -> Vec<String> {
    RulesEngine::with_default_rules().rule_ids()
}
