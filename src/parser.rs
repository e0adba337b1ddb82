//! Parses rule lines of the form
//!
//! ```text
//! if <var> is [not] <status> [(and|or) <var> is [not] <status>]* then <var> is <status>
//! ```
//!
//! There is no precedence between `and` and `or`. Propositions are folded left
//! to right with the first connective of the rule; a rule mixing both is kept
//! but flagged.

use std::fmt;

use tracing::warn;

use crate::dsl::{Connective, Expr, Proposition};
use crate::error::Error;

const KEYWORDS: [&str; 6] = ["if", "then", "is", "not", "and", "or"];

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRule {
    /// The `Rule<n>` prefix, if the rule had one
    pub label: Option<String>,
    pub text: String,
    pub premise: Expr<Proposition>,
    pub consequence: Proposition,
    /// `None` for a single-proposition premise
    pub connective: Option<Connective>,
    pub mixed_connectives: bool,
}

/// Parses the body of one rule (anything after its `Rule<n>:` label).
pub fn parse_rule(text: &str) -> Result<ParsedRule, Error> {
    let text = text.trim().to_lowercase();
    let malformed = |reason: String| Error::MalformedRule {
        rule: text.clone(),
        reason,
    };
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let then = match tokens.iter().filter(|t| **t == "then").count() {
        0 => return Err(malformed("couldn't find a consequent, expected a 'then' clause".into())),
        1 => tokens.iter().position(|t| *t == "then").unwrap_or_default(),
        _ => return Err(malformed("expected a single 'then' clause".into())),
    };
    let (premise_tokens, consequence_tokens) = (&tokens[..then], &tokens[then + 1..]);

    let consequence = match take_proposition(consequence_tokens) {
        Some((prop, [])) if prop.negated => {
            return Err(Error::NegatedConsequent {
                rule: text.clone(),
                variable: prop.variable,
            })
        },
        Some((prop, [])) => prop,
        _ => return Err(malformed("expected 'then <variable> is <status>'".into())),
    };

    let Some((&"if", rest)) = premise_tokens.split_first() else {
        return Err(malformed("a rule must start with 'if'".into()));
    };
    let (first, mut rest) = take_proposition(rest)
        .ok_or_else(|| malformed("expected '<variable> is [not] <status>' after 'if'".into()))?;

    let mut propositions = vec![first];
    let mut connectives = Vec::new();

    while let Some((word, after)) = rest.split_first() {
        let connective =
            Connective::from_word(word).ok_or_else(|| malformed(format!("expected 'and' or 'or', found '{word}'")))?;
        let (prop, after) = take_proposition(after)
            .ok_or_else(|| malformed(format!("expected '<variable> is [not] <status>' after '{connective}'")))?;

        propositions.push(prop);
        connectives.push(connective);
        rest = after;
    }

    let connective = connectives.first().copied();
    let mixed_connectives = connectives.iter().any(|c| Some(*c) != connective);
    let fold_with = connective.unwrap_or(Connective::And);
    let mut propositions = propositions.into_iter().map(Expr::Is);
    let premise = propositions
        .next()
        .map(|first| propositions.fold(first, |lhs, rhs| fold_with.join(lhs, rhs)))
        .ok_or_else(|| malformed("empty premise".into()))?;

    Ok(ParsedRule {
        label: None,
        text,
        premise,
        consequence,
        connective,
        mixed_connectives,
    })
}

impl fmt::Display for ParsedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label}: {}", self.text),
            None => f.write_str(&self.text),
        }
    }
}

fn take_proposition<'t>(tokens: &'t [&'t str]) -> Option<(Proposition, &'t [&'t str])> {
    let (variable, status, negated, rest) = match tokens {
        [variable, "is", "not", status, rest @ ..] => (variable, status, true, rest),
        ["not", variable, "is", status, rest @ ..] => (variable, status, true, rest),
        [variable, "is", status, rest @ ..] => (variable, status, false, rest),
        _ => return None,
    };

    if KEYWORDS.contains(variable) || KEYWORDS.contains(status) {
        return None;
    }

    Some((Proposition::new(*variable, *status, negated), rest))
}

/// The rules inferring one consequent variable.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleBaseDef {
    pub name: String,
    pub consequent: String,
    pub rules: Vec<ParsedRule>,
}

/// Reads the rulebase section: bare rule base names, each followed by its
/// `Rule<n>: if ... then ...` lines.
///
/// Rules are grouped by rule base name and consequent variable, in the order
/// they are first seen. Rules that fail to parse are reported and skipped.
pub fn parse_rule_bases<S: AsRef<str>>(lines: &[S]) -> (Vec<RuleBaseDef>, Vec<Error>) {
    let mut rule_bases: Vec<RuleBaseDef> = Vec::new();
    let mut errors = Vec::new();
    let mut name = String::new();

    for line in lines {
        let line = line.as_ref().trim();

        if line.is_empty() {
            continue;
        }

        let Some((label, body)) = line.split_once(':') else {
            name = line.to_lowercase();
            continue;
        };

        let label = label.trim().to_lowercase();

        match parse_rule(body).map_err(|err| err.labeled(&label)) {
            Ok(mut rule) => {
                rule.label = Some(label);

                if rule.mixed_connectives {
                    let err = Error::MixedConnectives {
                        rule: rule.to_string(),
                        used: rule.connective.unwrap_or(Connective::And),
                    };

                    warn!("{err}");
                    errors.push(err);
                }

                let i = group(&mut rule_bases, &name, &rule.consequence.variable);
                rule_bases[i].rules.push(rule);
            },
            Err(err) => {
                // Keeps the rule base visible even if all of its rules are rejected
                if let Error::NegatedConsequent { variable, .. } = &err {
                    group(&mut rule_bases, &name, variable);
                }

                warn!("{err}");
                errors.push(err);
            },
        }
    }

    (rule_bases, errors)
}

fn group(rule_bases: &mut Vec<RuleBaseDef>, name: &str, consequent: &str) -> usize {
    match rule_bases
        .iter()
        .position(|rb| rb.name == name && rb.consequent == consequent)
    {
        Some(i) => i,
        None => {
            rule_bases.push(RuleBaseDef {
                name: name.to_owned(),
                consequent: consequent.to_owned(),
                rules: Vec::new(),
            });
            rule_bases.len() - 1
        },
    }
}

#[test]
fn test_parse_and_rule() {
    let rule = parse_rule("if A is Low and B is High then C is Mid").unwrap();

    assert_eq!(
        rule.premise,
        Expr::Is(Proposition::new("a", "low", false)).and(Expr::Is(Proposition::new("b", "high", false)))
    );
    assert_eq!(rule.consequence, Proposition::new("c", "mid", false));
    assert_eq!(rule.connective, Some(Connective::And));
    assert!(!rule.mixed_connectives);
}

#[test]
fn test_parse_negated_or_rule() {
    let rule = parse_rule("if temp is not cold or humidity is high or wind is strong then fan is fast").unwrap();

    assert_eq!(
        rule.premise,
        Expr::Is(Proposition::new("temp", "cold", true))
            .or(Expr::Is(Proposition::new("humidity", "high", false)))
            .or(Expr::Is(Proposition::new("wind", "strong", false)))
    );
    assert_eq!(rule.connective, Some(Connective::Or));
}

#[test]
fn test_single_proposition() {
    let rule = parse_rule("if temp is hot then fan is fast").unwrap();

    assert_eq!(rule.premise, Expr::Is(Proposition::new("temp", "hot", false)));
    assert_eq!(rule.connective, None);
}

#[test]
fn test_leading_not() {
    let rule = parse_rule("if not temp is hot then fan is slow").unwrap();

    assert_eq!(rule.premise, Expr::Is(Proposition::new("temp", "hot", true)));
}

#[test]
fn test_mixed_connectives_use_the_first() {
    let rule = parse_rule("if a is x or b is y and c is z then d is w").unwrap();

    assert!(rule.mixed_connectives);
    assert_eq!(rule.connective, Some(Connective::Or));
    assert!(matches!(rule.premise, Expr::Or(ref lhs, _) if matches!(**lhs, Expr::Or(..))));
}

#[test]
fn test_negated_consequent_rejected() {
    assert_eq!(
        parse_rule("if temp is hot then fan is not fast"),
        Err(Error::NegatedConsequent {
            rule: "if temp is hot then fan is not fast".into(),
            variable: "fan".into()
        })
    );
}

#[test]
fn test_malformed_rules() {
    for rule in [
        "if temp is hot",
        "temp is hot then fan is fast",
        "if temp is hot then fan is fast then fan is slow",
        "if temp is hot and then fan is fast",
        "if temp is hot xor wind is low then fan is fast",
        "if temp is then fan is fast",
        "if temp is hot then fan fast",
        "if temp is hot then fan is fast now",
        "if air temp is hot then fan is fast",
    ] {
        assert!(
            matches!(parse_rule(rule), Err(Error::MalformedRule { .. })),
            "{rule} should be malformed"
        );
    }
}

#[test]
fn test_parse_rule_bases_groups_by_consequent() {
    let lines = [
        "Climate",
        "rule1: if temp is hot then fan is fast",
        "rule2: if temp is cold then heater is high",
        "rule3: if temp is cold then fan is not fast",
        "rule4: if temp is warm then fan is slow",
        "rule5: if temp then fan",
        "Lighting",
        "rule1: if sun is bright then blinds is closed",
    ];
    let (rule_bases, errors) = parse_rule_bases(&lines);
    let summary: Vec<_> = rule_bases
        .iter()
        .map(|rb| (rb.name.as_str(), rb.consequent.as_str(), rb.rules.len()))
        .collect();

    assert_eq!(
        summary,
        vec![("climate", "fan", 2), ("climate", "heater", 1), ("lighting", "blinds", 1)]
    );
    assert_eq!(rule_bases[0].rules[1].label.as_deref(), Some("rule4"));
    assert_eq!(rule_bases[0].rules[1].to_string(), "rule4: if temp is warm then fan is slow");
    assert_eq!(errors.len(), 2);
    assert!(matches!(
        &errors[0],
        Error::NegatedConsequent { rule, .. } if rule == "rule3: if temp is cold then fan is not fast"
    ));
    assert!(matches!(&errors[1], Error::MalformedRule { rule, .. } if rule.starts_with("rule5: ")));
}

#[test]
fn test_rejected_rules_keep_their_rule_base() {
    let (rule_bases, errors) = parse_rule_bases(&["cooling", "rule1: if temp is hot then fan is not fast"]);

    assert_eq!(rule_bases.len(), 1);
    assert!(rule_bases[0].rules.is_empty());
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_mixed_connectives_reported() {
    let (rule_bases, errors) = parse_rule_bases(&["r", "rule1: if a is x and b is y or c is z then d is w"]);

    assert_eq!(rule_bases[0].rules.len(), 1);
    assert_eq!(
        errors,
        vec![Error::MixedConnectives {
            rule: "rule1: if a is x and b is y or c is z then d is w".into(),
            used: Connective::And
        }]
    );
}
