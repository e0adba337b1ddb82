use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, info_span, warn};

use crate::document::Document;
use crate::error::Error;
use crate::inference::Mamdani;
use crate::inputs::{Inputs, Measurements};
use crate::membership::TupleNotation;
use crate::outputs::Outputs;
use crate::parser::{parse_rule_bases, RuleBaseDef};
use crate::rules::Rules;
use crate::validate::validate;
use crate::variable::{parse_fuzzy_sets, VariableDef, Variables};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Distance between two samples of a universe
    pub step: f64,
    pub notation: TupleNotation,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step: 1.,
            notation: TupleNotation::default(),
        }
    }
}

/// What one rule base inferred, or why it could not.
#[derive(Clone, Debug)]
pub struct RuleBaseOutput {
    pub name: String,
    pub consequent: String,
    pub result: Result<Outputs, Error>,
    /// The variables the rule base was evaluated over, when they could be built
    pub variables: Option<Arc<Variables>>,
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    /// One entry per rule base, in document order
    pub outputs: Vec<RuleBaseOutput>,
    /// Every non-fatal problem found along the way
    pub diagnostics: Vec<Error>,
}

impl Report {
    pub fn output(&self, rule_base: &str, consequent: &str) -> Option<&RuleBaseOutput> {
        self.outputs
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(rule_base) && o.consequent.eq_ignore_ascii_case(consequent))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    inference: Mamdani,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            inference: Mamdani::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run_text(&self, text: &str) -> Result<Report, Error> {
        self.run(&Document::parse(text)?)
    }

    pub fn run(&self, document: &Document) -> Result<Report, Error> {
        let (defs, mut diagnostics) = parse_fuzzy_sets(&document.fuzzy_sets, self.config.notation);
        let (rule_bases, errors) = parse_rule_bases(&document.rulebase);

        diagnostics.extend(errors);

        let (measurements, errors) = Measurements::parse(&document.measurements);

        diagnostics.extend(errors);

        let mut report = self.evaluate(&defs, &rule_bases, &measurements)?;

        diagnostics.append(&mut report.diagnostics);
        report.diagnostics = diagnostics;

        Ok(report)
    }

    /// Validates the parsed sections, then infers every rule base.
    ///
    /// Universes are derived once per consequent variable and shared by the
    /// rule bases inferring it. Rule bases are evaluated in parallel.
    pub fn evaluate(
        &self,
        defs: &[VariableDef],
        rule_bases: &[RuleBaseDef],
        measurements: &Measurements,
    ) -> Result<Report, Error> {
        if !self.config.step.is_finite() || self.config.step <= 0. {
            return Err(Error::InvalidStep(self.config.step));
        }

        validate(defs, rule_bases, measurements)?;

        let mut universes: HashMap<&str, Result<Arc<Variables>, Error>> = HashMap::new();

        for rule_base in rule_bases {
            universes
                .entry(rule_base.consequent.as_str())
                .or_insert_with(|| Variables::build(defs, &rule_base.consequent, self.config.step).map(Arc::new));
        }

        let evaluated: Vec<_> = rule_bases
            .par_iter()
            .map(|rule_base| {
                let vars = &universes[rule_base.consequent.as_str()];

                self.evaluate_rule_base(rule_base, vars, measurements)
            })
            .collect();

        let mut report = Report::default();

        for (output, errors) in evaluated {
            report.outputs.push(output);
            report.diagnostics.extend(errors);
        }

        Ok(report)
    }

    fn evaluate_rule_base(
        &self,
        rule_base: &RuleBaseDef,
        vars: &Result<Arc<Variables>, Error>,
        measurements: &Measurements,
    ) -> (RuleBaseOutput, Vec<Error>) {
        let span = info_span!("rule_base", name = %rule_base.name, consequent = %rule_base.consequent);
        let _enter = span.enter();

        let mut output = RuleBaseOutput {
            name: rule_base.name.clone(),
            consequent: rule_base.consequent.clone(),
            result: Err(Error::NoValidRules {
                rule_base: rule_base.name.clone(),
            }),
            variables: None,
        };

        let vars = match vars {
            Ok(vars) => Arc::clone(vars),
            Err(err) => {
                warn!("{err}");
                output.result = Err(err.clone());
                return (output, Vec::new());
            },
        };

        let inputs = Inputs::resolve(measurements, &vars);
        let (rules, errors) = Rules::compile(&rule_base.rules, &vars, &inputs);

        if !rules.is_empty() {
            output.result = self.inference.eval(&vars, &rules, &inputs);
        }

        match &output.result {
            Ok(outputs) => info!(
                value = outputs.value(),
                fired = outputs.fired(),
                rules = rules.len(),
                "inferred crisp output"
            ),
            Err(err) => warn!("{err}"),
        }

        output.variables = Some(vars);

        (output, errors)
    }
}

#[cfg(test)]
const COOLING: &str = "\
#FuzzySets
Temp
Cold(0,10,5,5)
Hot(20,35,5,5)
Fan
Slow(0,20,5,5)
Fast(40,60,5,5)

#Rulebase
Cooling
Rule1: if Temp is Hot then Fan is Fast

#Measurements
Temp = 30
";

#[test]
fn test_hot_room_runs_fan_fast() {
    use approx::assert_relative_eq;

    let report = Engine::default().run_text(COOLING).unwrap();
    let output = report.output("cooling", "fan").unwrap();
    let outputs = output.result.as_ref().unwrap();

    assert!(report.diagnostics.is_empty());
    assert!(outputs.value() > 0.);
    // Fast plateau is 40..=60
    assert_relative_eq!(outputs.value(), 50., epsilon = 1e-9);

    let vars = output.variables.as_ref().unwrap();

    assert_eq!(vars[vars.consequent()].universe().lower(), -5.);
    assert_eq!(vars[vars.consequent()].universe().upper(), 65.);
}

#[test]
fn test_finer_step() {
    use approx::assert_relative_eq;

    let engine = Engine::new(EngineConfig {
        step: 0.25,
        ..EngineConfig::default()
    });
    let report = engine.run_text(COOLING).unwrap();
    let outputs = report.outputs[0].result.as_ref().unwrap();

    assert_eq!(outputs.aggregated().len(), 281);
    assert_relative_eq!(outputs.value(), 50., epsilon = 1e-9);
}

#[test]
fn test_invalid_step_is_fatal() {
    let engine = Engine::new(EngineConfig {
        step: -1.,
        ..EngineConfig::default()
    });

    assert_eq!(engine.run_text(COOLING).unwrap_err(), Error::InvalidStep(-1.));
}

#[test]
fn test_universes_are_shared_per_consequent() {
    let text = COOLING.replace(
        "#Measurements",
        "Backup\nRule1: if Temp is Cold then Fan is Slow\n#Measurements",
    );
    let report = Engine::default().run_text(&text).unwrap();

    assert_eq!(report.outputs.len(), 2);

    let first = report.outputs[0].variables.as_ref().unwrap();
    let second = report.outputs[1].variables.as_ref().unwrap();

    assert!(Arc::ptr_eq(first, second));
    assert!(report.outputs[0].result.is_ok());
    assert_eq!(
        report.outputs[1].result,
        Err(Error::UndefinedDefuzzification {
            consequent: "fan".into()
        })
    );
}
