use tracing::warn;

use crate::dsl::{Expr, Proposition};
use crate::error::Error;
use crate::inputs::Inputs;
use crate::parser::ParsedRule;
use crate::variable::{StatusKey, VariableKey, Variables};

/// A proposition resolved against a rule base's variables.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Term {
    pub variable: VariableKey,
    pub status: StatusKey,
    pub negated: bool,
}

impl Term {
    fn resolve(prop: &Proposition, vars: &Variables, rule: &str) -> Result<Self, Error> {
        let (variable, status) = vars.resolve(&prop.variable, &prop.status).ok_or_else(|| Error::UnresolvedTerm {
            rule: rule.to_owned(),
            term: prop.to_string(),
        })?;

        Ok(Term {
            variable,
            status,
            negated: prop.negated,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub text: String,
    pub premise: Expr<Term>,
    pub consequence: Term,
}

#[derive(Debug, Default)]
pub struct Rules(pub(crate) Vec<Rule>);

impl Rules {
    pub fn new() -> Self {
        Rules(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Rules(Vec::with_capacity(capacity))
    }

    pub fn add(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    /// Resolves parsed rules against the variables of their rule base.
    ///
    /// A rule naming an unknown variable or status, inferring a variable other
    /// than the rule base's consequent, or depending on a variable without a
    /// measurement is reported and left out.
    pub fn compile(parsed: &[ParsedRule], vars: &Variables, inputs: &Inputs) -> (Self, Vec<Error>) {
        let mut rules = Rules::with_capacity(parsed.len());
        let mut errors = Vec::new();

        for rule in parsed {
            match Self::compile_rule(rule, vars, inputs) {
                Ok(compiled) => rules.add(compiled),
                Err(err) => {
                    warn!("{err}");
                    errors.push(err);
                },
            }
        }

        (rules, errors)
    }

    fn compile_rule(rule: &ParsedRule, vars: &Variables, inputs: &Inputs) -> Result<Rule, Error> {
        // Labeled, so diagnostics and logs point at the `Rule<n>` line
        let text = rule.to_string();
        let consequence = Term::resolve(&rule.consequence, vars, &text)?;

        if consequence.variable != vars.consequent() {
            return Err(Error::UnresolvedTerm {
                rule: text,
                term: rule.consequence.to_string(),
            });
        }

        let premise = rule.premise.try_map(&mut |prop: &Proposition| {
            let term = Term::resolve(prop, vars, &text)?;

            if inputs.get(term.variable).is_none() {
                return Err(Error::MissingMeasurement {
                    rule: text.clone(),
                    variable: prop.variable.clone(),
                });
            }

            Ok(term)
        })?;

        Ok(Rule {
            text,
            premise,
            consequence,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }
}

#[cfg(test)]
fn climate() -> Variables {
    use crate::membership::Shape;
    use crate::variable::VariableDef;

    let defs = [
        VariableDef::new("temp")
            .with_status("cold", Shape::Trapezoid([-5., 0., 10., 15.]))
            .with_status("hot", Shape::Trapezoid([15., 20., 35., 40.])),
        VariableDef::new("humidity").with_status("high", Shape::Triangle([50., 80., 100.])),
        VariableDef::new("fan")
            .with_status("slow", Shape::Trapezoid([-5., 0., 20., 25.]))
            .with_status("fast", Shape::Trapezoid([35., 40., 60., 65.])),
    ];

    Variables::build(&defs, "fan", 1.).unwrap()
}

#[test]
fn test_compile_resolves_terms() {
    use crate::inputs::Measurements;
    use crate::parser::parse_rule;

    let vars = climate();
    let inputs = Inputs::resolve(&Measurements::from_iter([("temp", 30.), ("humidity", 60.)]), &vars);
    let parsed = [parse_rule("if temp is hot and humidity is not high then fan is fast").unwrap()];
    let (rules, errors) = Rules::compile(&parsed, &vars, &inputs);

    assert!(errors.is_empty());
    assert_eq!(rules.len(), 1);

    let rule = &rules.0[0];
    let terms = rule.premise.propositions();

    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].variable, vars.key("temp").unwrap());
    assert!(!terms[0].negated);
    assert!(terms[1].negated);
    assert_eq!(rule.consequence.variable, vars.consequent());
    assert_eq!(
        vars[rule.consequence.variable]
            .status(rule.consequence.status)
            .map(|status| status.name()),
        Some("fast")
    );
}

#[test]
fn test_compile_skips_bad_rules() {
    use crate::inputs::Measurements;
    use crate::parser::parse_rule;

    let vars = climate();
    let inputs = Inputs::resolve(&Measurements::from_iter([("temp", 30.)]), &vars);
    let parsed: Vec<_> = [
        "if temp is warm then fan is fast",
        "if pressure is low then fan is fast",
        "if temp is hot then fan is medium",
        "if temp is hot then temp is cold",
        "if humidity is high then fan is slow",
        "if temp is cold then fan is slow",
    ]
    .into_iter()
    .map(|rule| parse_rule(rule).unwrap())
    .collect();
    let (rules, errors) = Rules::compile(&parsed, &vars, &inputs);

    assert_eq!(rules.len(), 1);
    assert_eq!(rules.0[0].text, "if temp is cold then fan is slow");
    assert_eq!(errors.len(), 5);
    assert!(errors[..4].iter().all(|e| matches!(e, Error::UnresolvedTerm { .. })));
    assert_eq!(
        errors[4],
        Error::MissingMeasurement {
            rule: "if humidity is high then fan is slow".into(),
            variable: "humidity".into()
        }
    );
}

#[test]
fn test_diagnostics_name_the_rule_label() {
    use crate::inputs::Measurements;
    use crate::parser::parse_rule_bases;

    let vars = climate();
    let inputs = Inputs::resolve(&Measurements::from_iter([("temp", 30.)]), &vars);
    let (rule_bases, _) = parse_rule_bases(&[
        "cooling",
        "rule1: if temp is hot then fan is fast",
        "rule2: if temp is warm then fan is fast",
    ]);
    let (rules, errors) = Rules::compile(&rule_bases[0].rules, &vars, &inputs);

    assert_eq!(rules.0[0].text, "rule1: if temp is hot then fan is fast");
    assert_eq!(
        errors,
        vec![Error::UnresolvedTerm {
            rule: "rule2: if temp is warm then fan is fast".into(),
            term: "temp is warm".into()
        }]
    );
}
