//! Cross-checks the parsed sections before any inference runs.

use crate::error::{Error, ValidationErrors};
use crate::inputs::Measurements;
use crate::parser::RuleBaseDef;
use crate::variable::VariableDef;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("couldn't find any valid fuzzy sets")]
    NoFuzzySets,
    #[error("couldn't find any valid rules")]
    NoRules,
    #[error("couldn't find any valid measurements")]
    NoMeasurements,
    #[error("rule base '{rule_base}' infers '{consequent}', which has no fuzzy sets")]
    MissingConsequent { rule_base: String, consequent: String },
    #[error(
        "{variables} variable(s) declared for {measurements} measurement(s); every variable needs fuzzy sets, \
         including consequents, which take no measurement"
    )]
    TooManyMeasurements { variables: usize, measurements: usize },
}

/// Runs every check and reports all of the issues found, not just the first.
pub fn validate(defs: &[VariableDef], rule_bases: &[RuleBaseDef], measurements: &Measurements) -> Result<(), Error> {
    let mut issues = Vec::new();

    if defs.iter().all(|def| def.statuses.is_empty()) {
        issues.push(ValidationIssue::NoFuzzySets);
    }

    if rule_bases.iter().all(|rb| rb.rules.is_empty()) {
        issues.push(ValidationIssue::NoRules);
    }

    if measurements.is_empty() {
        issues.push(ValidationIssue::NoMeasurements);
    }

    for rule_base in rule_bases {
        let declared = defs
            .iter()
            .any(|def| def.name.eq_ignore_ascii_case(&rule_base.consequent) && !def.statuses.is_empty());

        if !declared {
            issues.push(ValidationIssue::MissingConsequent {
                rule_base: rule_base.name.clone(),
                consequent: rule_base.consequent.clone(),
            });
        }
    }

    // Only variables with at least one status count as declared
    let declared = defs.iter().filter(|def| !def.statuses.is_empty()).count();

    if declared <= measurements.len() {
        issues.push(ValidationIssue::TooManyMeasurements {
            variables: declared,
            measurements: measurements.len(),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(issues).into())
    }
}

#[cfg(test)]
fn sample() -> (Vec<VariableDef>, Vec<RuleBaseDef>, Measurements) {
    use crate::membership::Shape;
    use crate::parser::parse_rule_bases;

    let defs = vec![
        VariableDef::new("temp").with_status("hot", Shape::Triangle([20., 30., 40.])),
        VariableDef::new("fan").with_status("fast", Shape::Triangle([40., 50., 60.])),
    ];
    let (rule_bases, _) = parse_rule_bases(&["cooling", "rule1: if temp is hot then fan is fast"]);
    let measurements = Measurements::from_iter([("temp", 30.)]);

    (defs, rule_bases, measurements)
}

#[test]
fn test_valid_input() {
    let (defs, rule_bases, measurements) = sample();

    assert_eq!(validate(&defs, &rule_bases, &measurements), Ok(()));
}

#[test]
fn test_collects_every_issue() {
    let Error::Validation(errors) = validate(&[], &[], &Measurements::new()).unwrap_err() else {
        panic!("expected a validation error");
    };

    assert_eq!(
        errors.issues(),
        &[
            ValidationIssue::NoFuzzySets,
            ValidationIssue::NoRules,
            ValidationIssue::NoMeasurements,
            ValidationIssue::TooManyMeasurements {
                variables: 0,
                measurements: 0
            },
        ]
    );
}

#[test]
fn test_only_rejected_rules() {
    use crate::parser::parse_rule_bases;

    let (defs, _, measurements) = sample();
    let (rule_bases, _) = parse_rule_bases(&["cooling", "rule1: if temp is hot then fan is not fast"]);
    let Err(Error::Validation(errors)) = validate(&defs, &rule_bases, &measurements) else {
        panic!("expected a validation error");
    };

    assert_eq!(errors.issues(), &[ValidationIssue::NoRules]);
}

#[test]
fn test_missing_consequent() {
    use crate::membership::Shape;

    let (mut defs, rule_bases, measurements) = sample();

    defs[1] = VariableDef::new("fan");
    defs.push(VariableDef::new("humidity").with_status("high", Shape::Triangle([50., 80., 100.])));

    let Err(Error::Validation(errors)) = validate(&defs, &rule_bases, &measurements) else {
        panic!("expected a validation error");
    };

    assert_eq!(
        errors.issues(),
        &[ValidationIssue::MissingConsequent {
            rule_base: "cooling".into(),
            consequent: "fan".into()
        }]
    );
}

#[test]
fn test_consequent_must_not_be_measured() {
    let (defs, rule_bases, _) = sample();
    let measurements = Measurements::from_iter([("temp", 30.), ("fan", 45.)]);

    let Err(Error::Validation(errors)) = validate(&defs, &rule_bases, &measurements) else {
        panic!("expected a validation error");
    };

    assert_eq!(
        errors.issues(),
        &[ValidationIssue::TooManyMeasurements {
            variables: 2,
            measurements: 2
        }]
    );
}

#[test]
fn test_variables_without_statuses_are_not_counted() {
    let (mut defs, rule_bases, _) = sample();
    let measurements = Measurements::from_iter([("temp", 30.), ("pressure", 3.)]);

    defs.push(VariableDef::new("pressure"));

    let Err(Error::Validation(errors)) = validate(&defs, &rule_bases, &measurements) else {
        panic!("expected a validation error");
    };

    assert_eq!(
        errors.issues(),
        &[ValidationIssue::TooManyMeasurements {
            variables: 2,
            measurements: 2
        }]
    );
}
