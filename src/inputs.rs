use std::collections::HashMap;

use tracing::warn;

use crate::error::Error;
use crate::variable::{VariableKey, Variables};

/// Crisp measurements by variable name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Measurements(HashMap<String, f64>);

impl Measurements {
    pub fn new() -> Self {
        Measurements(HashMap::new())
    }

    /// Records a measurement, returning the value it replaced.
    pub fn insert(&mut self, variable: &str, value: f64) -> Option<f64> {
        self.0.insert(variable.to_lowercase(), value)
    }

    pub fn get(&self, variable: &str) -> Option<f64> {
        self.0.get(&variable.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the measurements section, one `<variable> = <value>` per line.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> (Self, Vec<Error>) {
        let mut measurements = Measurements::new();
        let mut errors = Vec::new();

        for line in lines {
            let line = line.as_ref().trim();

            if line.is_empty() {
                continue;
            }

            let malformed = |reason: &str| Error::MalformedMeasurement {
                line: line.to_owned(),
                reason: reason.to_owned(),
            };
            let parsed = match line.split_once('=') {
                None => Err(malformed("expected '<variable> = <value>'")),
                Some((name, _)) if name.trim().is_empty() => Err(malformed("missing variable name")),
                Some((name, value)) => match value.trim().parse::<f64>() {
                    Ok(value) if value.is_finite() => Ok((name.trim(), value)),
                    _ => Err(malformed("the value is not a finite number")),
                },
            };

            match parsed {
                Ok((name, value)) => {
                    if let Some(previous) = measurements.insert(name, value) {
                        warn!(variable = name, previous, value, "measurement given twice, keeping the last value");
                    }
                },
                Err(err) => {
                    warn!("{err}");
                    errors.push(err);
                },
            }
        }

        (measurements, errors)
    }
}

impl<'a> FromIterator<(&'a str, f64)> for Measurements {
    fn from_iter<T: IntoIterator<Item = (&'a str, f64)>>(iter: T) -> Self {
        let mut measurements = Measurements::new();

        for (variable, value) in iter {
            measurements.insert(variable, value);
        }

        measurements
    }
}

/// Measurements keyed by the variables of one rule base.
#[derive(Clone, Debug, Default)]
pub struct Inputs(pub(crate) HashMap<VariableKey, f64>);

impl Inputs {
    /// Picks the measurement of every antecedent variable. The consequent never
    /// takes one, it is what gets inferred.
    pub fn resolve(measurements: &Measurements, vars: &Variables) -> Self {
        let inputs = vars
            .iter()
            .filter(|(_, var)| !var.is_consequent())
            .filter_map(|(key, var)| Some((key, measurements.get(var.name())?)))
            .collect();

        Inputs(inputs)
    }

    pub fn get(&self, var: VariableKey) -> Option<f64> {
        self.0.get(&var).copied()
    }
}

#[test]
fn test_parse_measurements() {
    let (measurements, errors) = Measurements::parse(&["Temp = 30", "humidity=62.5", "wind 4", "= 3", "speed = fast"]);

    assert_eq!(measurements.len(), 2);
    assert_eq!(measurements.get("temp"), Some(30.));
    assert_eq!(measurements.get("HUMIDITY"), Some(62.5));
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| matches!(e, Error::MalformedMeasurement { .. })));
}

#[test]
fn test_repeated_measurement_keeps_last() {
    let (measurements, errors) = Measurements::parse(&["temp = 30", "temp = 12"]);

    assert!(errors.is_empty());
    assert_eq!(measurements.get("temp"), Some(12.));
}

#[test]
fn test_consequent_takes_no_input() {
    use crate::membership::Shape;
    use crate::variable::VariableDef;

    let defs = [
        VariableDef::new("temp").with_status("hot", Shape::Triangle([20., 30., 40.])),
        VariableDef::new("fan").with_status("fast", Shape::Triangle([40., 50., 60.])),
    ];
    let vars = Variables::build(&defs, "fan", 1.).unwrap();
    let inputs = Inputs::resolve(&Measurements::from_iter([("temp", 25.), ("fan", 10.)]), &vars);

    assert_eq!(inputs.get(vars.key("temp").unwrap()), Some(25.));
    assert_eq!(inputs.get(vars.consequent()), None);
}
