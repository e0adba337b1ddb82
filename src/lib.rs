//! A Mamdani fuzzy inference engine driven by a plain text document of
//! fuzzy sets, rule bases and crisp measurements.
//!
//! ```text
//! #FuzzySets
//! Temp
//! Cold(0,10,5,5)
//! Hot(20,35,5,5)
//! Fan
//! Slow(0,20,5,5)
//! Fast(40,60,5,5)
//! #Rulebase
//! Cooling
//! Rule1: if Temp is Hot then Fan is Fast
//! #Measurements
//! Temp = 30
//! ```

mod document;
mod dsl;
mod engine;
mod error;
mod inference;
mod inputs;
mod linspace;
mod math;
mod membership;
mod ops;
mod outputs;
mod parser;
mod rules;
mod validate;
mod variable;

pub use document::{Document, Section};
pub use dsl::{Connective, Expr, Proposition};
pub use engine::{Engine, EngineConfig, Report, RuleBaseOutput};
pub use error::{Error, ValidationErrors};
pub use inference::Mamdani;
pub use inputs::{Inputs, Measurements};
pub use membership::{Shape, ShapeError, Status, TupleNotation};
pub use outputs::Outputs;
pub use parser::{parse_rule, parse_rule_bases, ParsedRule, RuleBaseDef};
pub use rules::{Rule, Rules, Term};
pub use validate::{validate, ValidationIssue};
pub use variable::{
    parse_fuzzy_sets, LinguisticVariable, Role, StatusKey, Universe, VariableDef, VariableKey, Variables,
};
