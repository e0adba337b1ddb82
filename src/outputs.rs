/// The result of inferring one consequent variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Outputs {
    consequent: String,
    value: f64,
    strengths: Vec<f64>,
    aggregated: Vec<(f64, f64)>,
}

impl Outputs {
    pub(crate) fn new(consequent: String, value: f64, strengths: Vec<f64>, aggregated: Vec<(f64, f64)>) -> Self {
        Self {
            consequent,
            value,
            strengths,
            aggregated,
        }
    }

    pub fn consequent(&self) -> &str {
        &self.consequent
    }

    /// The defuzzified crisp value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Firing strength of every evaluated rule, in rule order.
    pub fn strengths(&self) -> &[f64] {
        &self.strengths
    }

    /// Number of rules that fired with a non-zero strength.
    pub fn fired(&self) -> usize {
        self.strengths.iter().filter(|s| **s > 0.).count()
    }

    pub fn peak_strength(&self) -> f64 {
        self.strengths.iter().copied().fold(0., f64::max)
    }

    /// The aggregated consequent membership as `(x, μ(x))` points.
    pub fn aggregated(&self) -> &[(f64, f64)] {
        &self.aggregated
    }
}
