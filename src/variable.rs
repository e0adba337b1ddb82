use std::collections::HashMap;
use std::ops::Index;

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, warn};

use crate::error::Error;
use crate::linspace::Linspace;
use crate::math::interp;
use crate::membership::{Shape, ShapeError, Status, TupleNotation};

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

/// Index of a status within its variable.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StatusKey(usize);

/// A linguistic variable as declared in the fuzzy sets section, before any
/// universe is derived for it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableDef {
    pub name: String,
    pub statuses: Vec<Status>,
}

impl VariableDef {
    pub fn new(name: impl Into<String>) -> Self {
        VariableDef {
            name: name.into().to_lowercase(),
            statuses: Vec::new(),
        }
    }

    pub fn with_status(mut self, name: &str, shape: Shape) -> Self {
        self.statuses.push(Status::new(name, shape));
        self
    }
}

/// Reads the fuzzy sets section: bare variable names, each followed by its
/// `status(n1, n2, n3[, n4])` lines.
///
/// Statuses that fail to parse are reported and skipped.
pub fn parse_fuzzy_sets<S: AsRef<str>>(lines: &[S], notation: TupleNotation) -> (Vec<VariableDef>, Vec<Error>) {
    let mut defs: Vec<VariableDef> = Vec::new();
    let mut current = None;
    let mut errors = Vec::new();

    for line in lines {
        let line = line.as_ref().trim();

        if line.is_empty() {
            continue;
        }

        if !line.contains('(') {
            let name = line.to_lowercase();

            current = match defs.iter().position(|def| def.name == name) {
                Some(i) => Some(i),
                None => {
                    defs.push(VariableDef::new(name));
                    Some(defs.len() - 1)
                },
            };

            continue;
        }

        let status = current
            .ok_or(ShapeError::NoVariable)
            .and_then(|i| Ok((i, Status::parse(line, notation)?)))
            .and_then(|(i, status)| {
                if defs[i].statuses.iter().any(|s| s.name() == status.name()) {
                    Err(ShapeError::Duplicate(status.name().to_owned()))
                } else {
                    Ok((i, status))
                }
            });

        match status {
            Ok((i, status)) => defs[i].statuses.push(status),
            Err(source) => {
                let err = Error::MalformedFuzzySet {
                    line: line.to_owned(),
                    source,
                };

                warn!("{err}");
                errors.push(err);
            },
        }
    }

    (defs, errors)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Antecedent,
    Consequent,
}

/// Most samples a consequent universe may take.
pub const MAX_UNIVERSE_SAMPLES: usize = 1 << 20;

/// The range of discourse of a variable.
///
/// Only a consequent's universe is sampled. Antecedents are fuzzified
/// analytically and keep just their bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Universe {
    lower: f64,
    upper: f64,
    samples: Vec<f64>,
}

impl Universe {
    fn bounds(lower: f64, upper: f64) -> Self {
        Universe {
            lower,
            upper,
            samples: Vec::new(),
        }
    }

    fn sampled(variable: &str, lower: f64, upper: f64, step: f64) -> Result<Self, Error> {
        let samples = Linspace::stepped(lower, upper, step)
            .filter(|linspace| linspace.len() <= MAX_UNIVERSE_SAMPLES)
            .ok_or_else(|| Error::UniverseTooLarge {
                variable: variable.to_owned(),
                lower,
                upper,
                step,
                limit: MAX_UNIVERSE_SAMPLES,
            })?;

        Ok(Universe {
            lower,
            upper,
            samples: samples.collect(),
        })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Empty for antecedents
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

#[derive(Clone, Debug)]
pub struct LinguisticVariable {
    name: String,
    role: Role,
    universe: Universe,
    statuses: Vec<Status>,
    // Each status' membership sampled over the universe, empty for antecedents
    terms: Vec<Vec<f64>>,
}

impl LinguisticVariable {
    /// `def` must declare at least one status.
    fn new(def: &VariableDef, role: Role, step: f64) -> Result<Self, Error> {
        let lower = def.statuses.iter().map(|s| s.shape().lower()).fold(f64::INFINITY, f64::min);
        let upper = def.statuses.iter().map(|s| s.shape().upper()).fold(f64::NEG_INFINITY, f64::max);
        let universe = match role {
            Role::Consequent => Universe::sampled(&def.name, lower, upper, step)?,
            Role::Antecedent => Universe::bounds(lower, upper),
        };
        let terms = def
            .statuses
            .iter()
            .map(|status| {
                let [a, b, c, d] = status.shape().breakpoints();
                interp(universe.samples(), &[(a, 0.), (b, 1.), (c, 1.), (d, 0.)])
            })
            .collect();

        debug!(
            variable = %def.name,
            ?role,
            lower,
            upper,
            samples = universe.samples().len(),
            "built universe"
        );

        Ok(LinguisticVariable {
            name: def.name.clone(),
            role,
            universe,
            statuses: def.statuses.clone(),
            terms,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_consequent(&self) -> bool {
        self.role == Role::Consequent
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn statuses(&self) -> impl Iterator<Item = (StatusKey, &Status)> {
        self.statuses.iter().enumerate().map(|(i, s)| (StatusKey(i), s))
    }

    pub fn status_key(&self, name: &str) -> Option<StatusKey> {
        self.statuses
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(name))
            .map(StatusKey)
    }

    /// `None` for a key resolved against another variable.
    pub fn status(&self, key: StatusKey) -> Option<&Status> {
        self.statuses.get(key.0)
    }

    /// Membership of a status sampled over the universe. Only keys resolved
    /// against this variable are valid.
    pub(crate) fn sampled(&self, key: StatusKey) -> &[f64] {
        &self.terms[key.0]
    }

    /// `(x, μ(x))` points of a status over the universe, `None` if the key
    /// doesn't belong to this variable or it isn't sampled.
    pub fn curve(&self, key: StatusKey) -> Option<Vec<(f64, f64)>> {
        let term = self.terms.get(key.0).filter(|term| !term.is_empty())?;

        Some(self.universe.samples.iter().copied().zip(term.iter().copied()).collect())
    }
}

/// The variables of one rule base, exactly one of which is its consequent.
#[derive(Clone, Debug)]
pub struct Variables {
    vars: SlotMap<VariableKey, LinguisticVariable>,
    by_name: HashMap<String, VariableKey>,
    consequent: VariableKey,
}

impl Variables {
    /// Derives every declared variable's universe from its statuses' breakpoints
    /// and flags `consequent` as the variable being inferred.
    ///
    /// Variables without statuses are left out. Fails when the consequent's
    /// universe would take more than [`MAX_UNIVERSE_SAMPLES`] samples.
    pub fn build(defs: &[VariableDef], consequent: &str, step: f64) -> Result<Self, Error> {
        if !step.is_finite() || step <= 0. {
            return Err(Error::InvalidStep(step));
        }

        let mut vars = SlotMap::with_capacity_and_key(defs.len());
        let mut by_name = HashMap::with_capacity(defs.len());
        let mut consequent_key = None;

        for def in defs {
            if def.statuses.is_empty() {
                debug!(variable = %def.name, "no statuses declared, skipping variable");
                continue;
            }

            let role = if def.name.eq_ignore_ascii_case(consequent) {
                Role::Consequent
            } else {
                Role::Antecedent
            };

            let key = vars.insert(LinguisticVariable::new(def, role, step)?);

            by_name.insert(def.name.to_lowercase(), key);

            if role == Role::Consequent {
                consequent_key = Some(key);
            }
        }

        let consequent = consequent_key.ok_or_else(|| Error::UnknownVariable {
            name: consequent.to_owned(),
        })?;

        Ok(Variables {
            vars,
            by_name,
            consequent,
        })
    }

    pub fn key(&self, name: &str) -> Option<VariableKey> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    pub fn resolve(&self, variable: &str, status: &str) -> Option<(VariableKey, StatusKey)> {
        let key = self.key(variable)?;

        Some((key, self.vars[key].status_key(status)?))
    }

    pub fn consequent(&self) -> VariableKey {
        self.consequent
    }

    pub fn get(&self, key: VariableKey) -> Option<&LinguisticVariable> {
        self.vars.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableKey, &LinguisticVariable)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Every status curve of a variable, for plotting. Empty unless `key` is
    /// the consequent.
    pub fn curves(&self, key: VariableKey) -> Vec<(&str, Vec<(f64, f64)>)> {
        let Some(var) = self.vars.get(key) else {
            return Vec::new();
        };

        var.statuses()
            .filter_map(|(status_key, status)| Some((status.name(), var.curve(status_key)?)))
            .collect()
    }
}

impl Index<VariableKey> for Variables {
    type Output = LinguisticVariable;

    fn index(&self, key: VariableKey) -> &LinguisticVariable {
        &self.vars[key]
    }
}

#[cfg(test)]
fn fan_and_temp() -> Vec<VariableDef> {
    vec![
        VariableDef::new("Temp")
            .with_status("cold", Shape::Trapezoid([-5., 0., 10., 15.]))
            .with_status("hot", Shape::Trapezoid([15., 20., 35., 40.])),
        VariableDef::new("Fan")
            .with_status("slow", Shape::Trapezoid([-5., 0., 20., 25.]))
            .with_status("fast", Shape::Trapezoid([35., 40., 60., 65.])),
    ]
}

#[test]
fn test_universe_bounds_are_breakpoint_extremes() {
    let vars = Variables::build(&fan_and_temp(), "fan", 1.).unwrap();
    let temp = &vars[vars.key("temp").unwrap()];
    let fan = &vars[vars.consequent()];

    assert_eq!(temp.universe().lower(), -5.);
    assert_eq!(temp.universe().upper(), 40.);
    assert!(temp.universe().samples().is_empty());
    assert_eq!(fan.universe().samples().len(), 71);
    assert_eq!(fan.name(), "fan");
    assert_eq!(fan.universe().upper(), 65.);
    assert_eq!(fan.universe().samples().last(), Some(&65.));
}

#[test]
fn test_exactly_one_consequent() {
    let vars = Variables::build(&fan_and_temp(), "FAN", 1.).unwrap();
    let consequents: Vec<_> = vars.iter().filter(|(_, v)| v.is_consequent()).collect();

    assert_eq!(consequents.len(), 1);
    assert_eq!(consequents[0].0, vars.consequent());
    assert_eq!(vars[vars.key("temp").unwrap()].role(), Role::Antecedent);
}

#[test]
fn test_unknown_consequent_and_bad_step() {
    assert_eq!(
        Variables::build(&fan_and_temp(), "pressure", 1.).unwrap_err(),
        Error::UnknownVariable {
            name: "pressure".into()
        }
    );
    assert_eq!(Variables::build(&fan_and_temp(), "fan", 0.).unwrap_err(), Error::InvalidStep(0.));
    assert!(Variables::build(&fan_and_temp(), "fan", f64::NAN).is_err());
}

#[test]
fn test_resolve_is_case_insensitive() {
    let vars = Variables::build(&fan_and_temp(), "fan", 1.).unwrap();
    let (key, status) = vars.resolve("TEMP", "Hot").unwrap();

    assert_eq!(vars[key].status(status).map(Status::name), Some("hot"));
    assert!(vars.resolve("temp", "warm").is_none());
    assert!(vars.resolve("humidity", "hot").is_none());
}

#[test]
fn test_sampled_curves_match_membership() {
    let vars = Variables::build(&fan_and_temp(), "fan", 1.).unwrap();
    let fan = &vars[vars.consequent()];
    let fast = fan.status_key("fast").unwrap();

    for (x, mu) in fan.curve(fast).unwrap() {
        assert_eq!(mu, fan.status(fast).unwrap().membership(x));
    }

    assert!(vars.curves(vars.key("temp").unwrap()).is_empty());

    let curves = vars.curves(vars.consequent());

    assert_eq!(curves.len(), 2);
    assert_eq!(curves[0].0, "slow");
    assert_eq!(curves[1].1.len(), fan.universe().samples().len());
}

#[test]
fn test_parse_fuzzy_sets() {
    let lines = [
        "temp",
        "cold(0,10,5,5)",
        "hot(20,35,5,5)",
        "hot(1,2,3)",
        "fan",
        "slow(0, 20, 5, 5)",
        "fast(40,50,60)",
        "stop(1,2,x)",
    ];
    let (defs, errors) = parse_fuzzy_sets(&lines, TupleNotation::Spread);

    assert_eq!(defs.len(), 2);
    assert_eq!(defs[0].name, "temp");
    assert_eq!(defs[0].statuses.len(), 2);
    assert_eq!(defs[1].statuses.len(), 2);
    assert_eq!(defs[1].statuses[1].shape(), &Shape::Triangle([40., 50., 60.]));
    assert_eq!(errors.len(), 2);
    assert!(matches!(
        &errors[0],
        Error::MalformedFuzzySet { source: ShapeError::Duplicate(name), .. } if name == "hot"
    ));
    assert!(matches!(
        &errors[1],
        Error::MalformedFuzzySet { source: ShapeError::NotANumber(_), .. }
    ));
}

#[test]
fn test_status_before_variable() {
    let (defs, errors) = parse_fuzzy_sets(&["cold(0,10,5,5)", "temp"], TupleNotation::Spread);

    assert_eq!(defs.len(), 1);
    assert!(defs[0].statuses.is_empty());
    assert!(matches!(
        &errors[0],
        Error::MalformedFuzzySet {
            source: ShapeError::NoVariable,
            ..
        }
    ));
}

#[test]
fn test_status_keys_of_another_variable() {
    let defs = [
        VariableDef::new("wind").with_status("calm", Shape::Triangle([0., 0., 10.])),
        VariableDef::new("fan")
            .with_status("slow", Shape::Trapezoid([-5., 0., 20., 25.]))
            .with_status("fast", Shape::Trapezoid([35., 40., 60., 65.])),
    ];
    let vars = Variables::build(&defs, "fan", 1.).unwrap();
    let fan = &vars[vars.consequent()];
    let wind = &vars[vars.key("wind").unwrap()];
    let fast = fan.status_key("fast").unwrap();

    assert!(wind.status(fast).is_none());
    assert!(wind.curve(fast).is_none());
    assert!(fan.curve(fast).is_some());
}

#[test]
fn test_huge_consequent_universe_is_rejected() {
    let defs = [
        VariableDef::new("temp").with_status("any", Shape::Trapezoid([0., 0., 1e300, 1e300])),
        VariableDef::new("fan").with_status("fast", Shape::Trapezoid([0., 0., 1e300, 1e300])),
    ];

    assert!(matches!(
        Variables::build(&defs, "fan", 1.),
        Err(Error::UniverseTooLarge { ref variable, limit: MAX_UNIVERSE_SAMPLES, .. }) if variable == "fan"
    ));
    assert!(matches!(
        Variables::build(&defs, "fan", 1e-6),
        Err(Error::UniverseTooLarge { .. })
    ));

    // A wide antecedent is never sampled
    let vars = Variables::build(&defs, "temp", 1e300).unwrap();
    let fan = &vars[vars.key("fan").unwrap()];

    assert_eq!(fan.universe().upper(), 1e300);
    assert!(fan.universe().samples().is_empty());
}
