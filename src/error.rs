//! Error kinds produced while reading, compiling and evaluating rule bases.
//!
//! Most of these are collected as diagnostics and never abort a run. Only the
//! kinds reported by [`Error::is_fatal`] stop processing before inference.

use std::fmt;

use thiserror::Error;

use crate::document::Section;
use crate::dsl::Connective;
use crate::membership::ShapeError;
use crate::validate::ValidationIssue;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("the '#{0}' section header is required but was not found")]
    MissingSection(Section),
    #[error("malformed fuzzy set '{line}': {source}")]
    MalformedFuzzySet {
        line: String,
        #[source]
        source: ShapeError,
    },
    #[error("malformed rule '{rule}': {reason}")]
    MalformedRule { rule: String, reason: String },
    #[error("negative consequents are not supported, skipping rule '{rule}'")]
    NegatedConsequent { rule: String, variable: String },
    #[error("rule '{rule}' mixes 'and' with 'or'; every connective is read as '{used}'")]
    MixedConnectives { rule: String, used: Connective },
    #[error("could not resolve '{term}' in rule '{rule}', skipping rule")]
    UnresolvedTerm { rule: String, term: String },
    #[error("no measurement for '{variable}' used by rule '{rule}', skipping rule")]
    MissingMeasurement { rule: String, variable: String },
    #[error("malformed measurement '{line}': {reason}")]
    MalformedMeasurement { line: String, reason: String },
    #[error("no fuzzy set is declared for variable '{name}'")]
    UnknownVariable { name: String },
    #[error("the universe of '{variable}' from {lower} to {upper} needs more than {limit} samples at step {step}")]
    UniverseTooLarge {
        variable: String,
        lower: f64,
        upper: f64,
        step: f64,
        limit: usize,
    },
    #[error("universe sampling step must be finite and positive, got {0}")]
    InvalidStep(f64),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("rule base '{rule_base}' has no valid rules")]
    NoValidRules { rule_base: String },
    #[error("no rule fired for '{consequent}', its output is undefined")]
    UndefinedDefuzzification { consequent: String },
}

impl Error {
    /// Whether this error stops the whole run instead of being collected.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingSection(_) | Self::Validation(_) | Self::InvalidStep(_))
    }

    /// Prefixes the rule text of a rule-level error with its `Rule<n>` label.
    pub(crate) fn labeled(mut self, label: &str) -> Self {
        match &mut self {
            Self::MalformedRule { rule, .. } | Self::NegatedConsequent { rule, .. } => {
                *rule = format!("{label}: {rule}");
            },
            _ => {},
        }

        self
    }
}

/// Every structural problem found by [`crate::validate::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the input data is not valid")?;

        for issue in &self.0 {
            write!(f, "\n  - {issue}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[test]
fn test_fatal_kinds() {
    assert!(Error::MissingSection(Section::Rulebase).is_fatal());
    assert!(Error::InvalidStep(0.).is_fatal());
    assert!(Error::Validation(ValidationErrors(vec![ValidationIssue::NoRules])).is_fatal());
    assert!(!Error::UndefinedDefuzzification {
        consequent: "fan".into()
    }
    .is_fatal());
    assert!(!Error::UnresolvedTerm {
        rule: "if a is b then c is d".into(),
        term: "a is b".into()
    }
    .is_fatal());
}

#[test]
fn test_validation_display_lists_every_issue() {
    let err = Error::from(ValidationErrors(vec![ValidationIssue::NoFuzzySets, ValidationIssue::NoMeasurements]));
    let text = err.to_string();

    assert!(text.starts_with("the input data is not valid"));
    assert_eq!(text.lines().count(), 3);
}
