//! Piecewise-linear membership functions.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::math::interp_at;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("expected '<status>(<n1>,<n2>,<n3>[,<n4>])'")]
    Syntax,
    #[error("status declared before any variable")]
    NoVariable,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("expected 3 or 4 values, got {0}")]
    Arity(usize),
    #[error("breakpoints must be finite")]
    NonFinite,
    #[error("breakpoints {0:?} are not in non-decreasing order")]
    Unordered(Vec<f64>),
    #[error("status '{0}' is declared twice for the same variable")]
    Duplicate(String),
}

/// How a 4-value tuple in a fuzzy set declaration is read.
///
/// 3-value tuples are always triangle breakpoints `(a, b, c)`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TupleNotation {
    /// `(a, b, α, β)`: plateau from `a` to `b`, ramps of width `α` and `β`.
    #[default]
    Spread,
    /// `(a, b, c, d)` taken literally.
    Breakpoints,
}

impl fmt::Display for TupleNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spread => f.write_str("spread"),
            Self::Breakpoints => f.write_str("breakpoints"),
        }
    }
}

impl FromStr for TupleNotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spread" => Ok(Self::Spread),
            "breakpoints" => Ok(Self::Breakpoints),
            other => Err(format!("unknown tuple notation '{other}', expected 'spread' or 'breakpoints'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Triangle([f64; 3]),
    Trapezoid([f64; 4]),
}

impl Shape {
    pub fn triangle(a: f64, b: f64, c: f64) -> Result<Self, ShapeError> {
        check_breakpoints(&[a, b, c])?;

        Ok(Self::Triangle([a, b, c]))
    }

    pub fn trapezoid(a: f64, b: f64, c: f64, d: f64) -> Result<Self, ShapeError> {
        check_breakpoints(&[a, b, c, d])?;

        Ok(Self::Trapezoid([a, b, c, d]))
    }

    pub fn from_values(values: &[f64], notation: TupleNotation) -> Result<Self, ShapeError> {
        match (values, notation) {
            (&[a, b, c], _) => Self::triangle(a, b, c),
            (&[a, b, c, d], TupleNotation::Breakpoints) => Self::trapezoid(a, b, c, d),
            (&[a, b, alpha, beta], TupleNotation::Spread) => {
                if alpha < 0. || beta < 0. {
                    return Err(ShapeError::Unordered(values.to_vec()));
                }

                Self::trapezoid(a - alpha, a, b, b + beta)
            },
            _ => Err(ShapeError::Arity(values.len())),
        }
    }

    /// Trapezoid breakpoints; a triangle has a zero-width plateau.
    pub fn breakpoints(&self) -> [f64; 4] {
        match *self {
            Self::Triangle([a, b, c]) => [a, b, b, c],
            Self::Trapezoid(points) => points,
        }
    }

    /// Smallest breakpoint
    pub fn lower(&self) -> f64 {
        self.breakpoints()[0]
    }

    /// Largest breakpoint
    pub fn upper(&self) -> f64 {
        self.breakpoints()[3]
    }

    pub fn membership(&self, x: f64) -> f64 {
        let [a, b, c, d] = self.breakpoints();

        if x < a || x > d {
            return 0.;
        }

        interp_at(x, &[(a, 0.), (b, 1.), (c, 1.), (d, 0.)])
    }
}

fn check_breakpoints(points: &[f64]) -> Result<(), ShapeError> {
    if points.iter().any(|p| !p.is_finite()) {
        return Err(ShapeError::NonFinite);
    }

    if points.windows(2).any(|w| w[0] > w[1]) {
        return Err(ShapeError::Unordered(points.to_vec()));
    }

    Ok(())
}

/// A named fuzzy set of a linguistic variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    name: String,
    shape: Shape,
}

impl Status {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Status {
            name: name.into().to_lowercase(),
            shape,
        }
    }

    /// Parses `<name>(<n1>,<n2>,<n3>[,<n4>])`.
    pub fn parse(line: &str, notation: TupleNotation) -> Result<Self, ShapeError> {
        let (name, rest) = line.split_once('(').ok_or(ShapeError::Syntax)?;
        let name = name.trim();
        let values = rest.trim().strip_suffix(')').ok_or(ShapeError::Syntax)?;

        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(ShapeError::Syntax);
        }

        let values = values
            .split(',')
            .map(|value| {
                let value = value.trim();
                value
                    .parse::<f64>()
                    .map_err(|_| ShapeError::NotANumber(value.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Status::new(name, Shape::from_values(&values, notation)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn membership(&self, x: f64) -> f64 {
        self.shape.membership(x)
    }
}

#[test]
fn test_plateau_is_one() {
    let trap = Shape::trapezoid(0., 10., 20., 30.).unwrap();

    for x in [10., 12.5, 15., 20.] {
        assert_eq!(trap.membership(x), 1.);
    }

    let tri = Shape::triangle(0., 5., 10.).unwrap();

    assert_eq!(tri.membership(5.), 1.);
}

#[test]
fn test_outside_support_is_zero() {
    let trap = Shape::trapezoid(0., 10., 20., 30.).unwrap();

    for x in [-100., -0.001, 0., 30., 30.001, 1e9] {
        assert_eq!(trap.membership(x), 0.);
    }

    let tri = Shape::triangle(0., 5., 10.).unwrap();

    assert_eq!(tri.membership(-1.), 0.);
    assert_eq!(tri.membership(11.), 0.);
}

#[test]
fn test_ramps_are_monotonic() {
    use approx::assert_relative_eq;

    let trap = Shape::trapezoid(0., 10., 20., 30.).unwrap();

    assert_relative_eq!(trap.membership(2.5), 0.25);
    assert_relative_eq!(trap.membership(25.), 0.5);

    let rising: Vec<_> = (0..=10).map(|x| trap.membership(x as f64)).collect();
    let falling: Vec<_> = (20..=30).map(|x| trap.membership(x as f64)).collect();

    assert!(rising.windows(2).all(|w| w[0] <= w[1]));
    assert!(falling.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_unordered_breakpoints_rejected() {
    assert_eq!(
        Shape::trapezoid(0., 10., 5., 5.),
        Err(ShapeError::Unordered(vec![0., 10., 5., 5.]))
    );
    assert!(Shape::triangle(3., 2., 1.).is_err());
    assert_eq!(Shape::triangle(f64::NAN, 1., 2.), Err(ShapeError::NonFinite));
}

#[test]
fn test_spread_notation() {
    let shape = Shape::from_values(&[0., 10., 5., 5.], TupleNotation::Spread).unwrap();

    assert_eq!(shape, Shape::Trapezoid([-5., 0., 10., 15.]));
    assert_eq!(shape.lower(), -5.);
    assert_eq!(shape.upper(), 15.);
    assert!(Shape::from_values(&[0., 10., 5., 5.], TupleNotation::Breakpoints).is_err());
    assert!(Shape::from_values(&[0., 10., -1., 5.], TupleNotation::Spread).is_err());
}

#[test]
fn test_triangle_is_degenerate_trapezoid() {
    let shape = Shape::from_values(&[1., 2., 4.], TupleNotation::Spread).unwrap();

    assert_eq!(shape.breakpoints(), [1., 2., 2., 4.]);
    assert_eq!(Shape::from_values(&[1., 2.], TupleNotation::Spread), Err(ShapeError::Arity(2)));
    assert_eq!(
        Shape::from_values(&[1., 2., 3., 4., 5.], TupleNotation::Breakpoints),
        Err(ShapeError::Arity(5))
    );
}

#[test]
fn test_parse_status() {
    let status = Status::parse("Cold(0, 10, 5, 5)", TupleNotation::Spread).unwrap();

    assert_eq!(status.name(), "cold");
    assert_eq!(status.shape(), &Shape::Trapezoid([-5., 0., 10., 15.]));

    let status = Status::parse("warm (10,15,20)", TupleNotation::Spread).unwrap();

    assert_eq!(status.shape(), &Shape::Triangle([10., 15., 20.]));
    assert_eq!(
        Status::parse("hot(1,x,3)", TupleNotation::Spread),
        Err(ShapeError::NotANumber("x".into()))
    );
    assert_eq!(Status::parse("hot(1,2,3", TupleNotation::Spread), Err(ShapeError::Syntax));
    assert_eq!(Status::parse("(1,2,3)", TupleNotation::Spread), Err(ShapeError::Syntax));
}
