use std::collections::HashMap;

use tracing::debug;

use crate::error::Error;
use crate::inputs::Inputs;
use crate::ops;
use crate::outputs::Outputs;
use crate::rules::{Rules, Term};
use crate::variable::{StatusKey, VariableKey, Variables};

/// Mamdani inference: `and` as minimum, `or` as maximum, implication by
/// clipping, aggregation by maximum and center of gravity defuzzification.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mamdani;

impl Mamdani {
    pub fn new() -> Self {
        Mamdani
    }

    pub fn eval(&self, vars: &Variables, rules: &Rules, inputs: &Inputs) -> Result<Outputs, Error> {
        let consequent = &vars[vars.consequent()];

        // Fuzzificate facts
        // Every (variable, status) pair used by a premise is evaluated once
        let mut fact_memberships: HashMap<(VariableKey, StatusKey), f64> = HashMap::new();

        for rule in rules.iter() {
            for term in rule.premise.propositions() {
                if fact_memberships.contains_key(&(term.variable, term.status)) {
                    continue;
                }

                let var = &vars[term.variable];
                let value = inputs.get(term.variable).ok_or_else(|| Error::MissingMeasurement {
                    rule: rule.text.clone(),
                    variable: var.name().to_owned(),
                })?;

                let status = var.status(term.status).ok_or_else(|| Error::UnresolvedTerm {
                    rule: rule.text.clone(),
                    term: var.name().to_owned(),
                })?;

                fact_memberships.insert((term.variable, term.status), status.membership(value));
            }
        }

        // Compute rule strengths
        let strengths: Vec<f64> = rules
            .iter()
            .map(|rule| {
                rule.premise.eval(&mut |term: &Term| {
                    let membership = fact_memberships[&(term.variable, term.status)];

                    if term.negated {
                        ops::not(membership)
                    } else {
                        membership
                    }
                })
            })
            .collect();

        // Implication and aggregation
        let universe = consequent.universe().samples();
        let mut aggregated = vec![0.; universe.len()];

        for (rule, &strength) in rules.iter().zip(&strengths) {
            debug!(rule = %rule.text, strength, "rule strength");

            if strength <= 0. {
                continue;
            }

            ops::aggregate_into(
                &mut aggregated,
                ops::clip(consequent.sampled(rule.consequence.status), strength),
            );
        }

        // Defuzzificate
        let value = ops::centroid(universe, &aggregated).ok_or_else(|| Error::UndefinedDefuzzification {
            consequent: consequent.name().to_owned(),
        })?;

        debug!(consequent = consequent.name(), value, "defuzzified");

        let aggregated = universe.iter().copied().zip(aggregated).collect();

        Ok(Outputs::new(consequent.name().to_owned(), value, strengths, aggregated))
    }
}

#[cfg(test)]
fn compile(
    defs: &[crate::variable::VariableDef],
    consequent: &str,
    rules: &[&str],
    inputs: &[(&str, f64)],
) -> (Variables, Rules, Inputs) {
    use crate::inputs::Measurements;
    use crate::parser::parse_rule;

    let vars = Variables::build(defs, consequent, 1.).unwrap();
    let inputs = Inputs::resolve(&Measurements::from_iter(inputs.iter().copied()), &vars);
    let parsed: Vec<_> = rules.iter().map(|rule| parse_rule(rule).unwrap()).collect();
    let (rules, errors) = Rules::compile(&parsed, &vars, &inputs);

    assert!(errors.is_empty(), "{errors:?}");

    (vars, rules, inputs)
}

#[cfg(test)]
fn level_and_valve() -> Vec<crate::variable::VariableDef> {
    use crate::membership::Shape;
    use crate::variable::VariableDef;

    vec![
        VariableDef::new("level")
            .with_status("low", Shape::Trapezoid([0., 0., 20., 60.]))
            .with_status("high", Shape::Trapezoid([40., 80., 100., 100.])),
        VariableDef::new("pressure")
            .with_status("low", Shape::Triangle([0., 0., 10.]))
            .with_status("high", Shape::Triangle([0., 10., 10.])),
        VariableDef::new("valve")
            .with_status("closed", Shape::Triangle([0., 10., 20.]))
            .with_status("open", Shape::Triangle([20., 30., 40.])),
    ]
}

#[test]
fn test_symmetric_triangle_centroid_is_its_center() {
    use approx::assert_relative_eq;

    let (vars, rules, inputs) = compile(
        &level_and_valve(),
        "valve",
        &["if level is high then valve is open"],
        &[("level", 90.)],
    );
    let outputs = Mamdani::new().eval(&vars, &rules, &inputs).unwrap();

    assert_eq!(outputs.strengths(), &[1.]);
    assert_relative_eq!(outputs.value(), 30., epsilon = 1e-9);
    assert_eq!(outputs.consequent(), "valve");
}

#[test]
fn test_equal_strengths_balance_in_the_middle() {
    use approx::assert_relative_eq;

    // level 50 is 0.25 low and 0.25 high
    let (vars, rules, inputs) = compile(
        &level_and_valve(),
        "valve",
        &["if level is low then valve is closed", "if level is high then valve is open"],
        &[("level", 50.)],
    );
    let outputs = Mamdani::new().eval(&vars, &rules, &inputs).unwrap();

    assert_relative_eq!(outputs.strengths()[0], 0.25);
    assert_relative_eq!(outputs.strengths()[1], 0.25);
    assert_relative_eq!(outputs.value(), 20., epsilon = 1e-9);
    assert_eq!(outputs.fired(), 2);
}

#[test]
fn test_and_or_not_strengths() {
    use approx::assert_relative_eq;

    // level 50: low 0.25, high 0.25; pressure 3: low 0.7, high 0.3
    let (vars, rules, inputs) = compile(
        &level_and_valve(),
        "valve",
        &[
            "if level is low and pressure is low then valve is closed",
            "if level is low or pressure is low then valve is closed",
            "if level is not high and pressure is not high then valve is open",
            "if level is high or pressure is not low then valve is open",
        ],
        &[("level", 50.), ("pressure", 3.)],
    );
    let outputs = Mamdani::new().eval(&vars, &rules, &inputs).unwrap();
    let strengths = outputs.strengths();

    assert_relative_eq!(strengths[0], 0.25);
    assert_relative_eq!(strengths[1], 0.7);
    assert_relative_eq!(strengths[2], 0.7);
    assert_relative_eq!(strengths[3], 0.3);
    assert_relative_eq!(outputs.peak_strength(), 0.7);
}

#[test]
fn test_zero_strength_rule_changes_nothing() {
    let defs = level_and_valve();
    let rules = ["if level is high then valve is open"];
    let (vars, base_rules, inputs) = compile(&defs, "valve", &rules, &[("level", 70.)]);
    let base = Mamdani::new().eval(&vars, &base_rules, &inputs).unwrap();

    // level 70 is not low at all
    let (vars, more_rules, inputs) = compile(
        &defs,
        "valve",
        &[rules[0], "if level is low then valve is closed"],
        &[("level", 70.)],
    );
    let more = Mamdani::new().eval(&vars, &more_rules, &inputs).unwrap();

    assert_eq!(more.strengths()[1], 0.);
    assert_eq!(more.aggregated(), base.aggregated());
    assert_eq!(more.value(), base.value());
    assert_eq!(more.fired(), 1);
}

#[test]
fn test_no_rule_fired_is_undefined() {
    let (vars, rules, inputs) = compile(
        &level_and_valve(),
        "valve",
        &["if level is high then valve is open"],
        &[("level", 10.)],
    );

    assert_eq!(
        Mamdani::new().eval(&vars, &rules, &inputs),
        Err(Error::UndefinedDefuzzification {
            consequent: "valve".into()
        })
    );
    assert!(Mamdani::new().eval(&vars, &Rules::new(), &inputs).is_err());
}
