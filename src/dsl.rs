use std::fmt;

use crate::ops;

/// A boolean connective between two premise expressions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn join<L>(self, lhs: Expr<L>, rhs: Expr<L>) -> Expr<L> {
        match self {
            Self::And => lhs.and(rhs),
            Self::Or => lhs.or(rhs),
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
        }
    }
}

/// `<variable> is [not] <status>`, still referring to names.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Proposition {
    pub variable: String,
    pub status: String,
    pub negated: bool,
}

impl Proposition {
    pub fn new(variable: impl Into<String>, status: impl Into<String>, negated: bool) -> Self {
        Proposition {
            variable: variable.into().to_lowercase(),
            status: status.into().to_lowercase(),
            negated,
        }
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "{} is not {}", self.variable, self.status)
        } else {
            write!(f, "{} is {}", self.variable, self.status)
        }
    }
}

/// A rule premise. Leaves are [`Proposition`]s right after parsing and
/// resolved terms once compiled against a rule base's variables.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr<L> {
    Is(L),
    And(Box<Expr<L>>, Box<Expr<L>>),
    Or(Box<Expr<L>>, Box<Expr<L>>),
}

impl<L> Expr<L> {
    pub fn or(self, rhs: Expr<L>) -> Self {
        Expr::Or(Box::new(self), Box::new(rhs))
    }

    pub fn and(self, rhs: Expr<L>) -> Self {
        Expr::And(Box::new(self), Box::new(rhs))
    }

    /// Leaves in textual order.
    pub fn propositions(&self) -> Vec<&L> {
        let mut props = Vec::new();

        fn collect<'p, L>(expr: &'p Expr<L>, out: &mut Vec<&'p L>) {
            match expr {
                Expr::Is(leaf) => out.push(leaf),
                Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                    collect(lhs, out);
                    collect(rhs, out);
                },
            }
        }

        collect(self, &mut props);

        props
    }

    /// Rebuilds the same tree over different leaves, stopping at the first
    /// leaf that fails to map.
    pub fn try_map<M, E>(&self, f: &mut impl FnMut(&L) -> Result<M, E>) -> Result<Expr<M>, E> {
        Ok(match self {
            Expr::Is(leaf) => Expr::Is(f(leaf)?),
            Expr::And(lhs, rhs) => lhs.try_map(f)?.and(rhs.try_map(f)?),
            Expr::Or(lhs, rhs) => lhs.try_map(f)?.or(rhs.try_map(f)?),
        })
    }

    /// Bottom-up evaluation: leaves through `leaf`, `and` as minimum, `or`
    /// as maximum.
    pub fn eval(&self, leaf: &mut impl FnMut(&L) -> f64) -> f64 {
        match self {
            Expr::Is(l) => leaf(l),
            Expr::And(lhs, rhs) => ops::and(lhs.eval(leaf), rhs.eval(leaf)),
            Expr::Or(lhs, rhs) => ops::or(lhs.eval(leaf), rhs.eval(leaf)),
        }
    }
}

impl<L: fmt::Display> fmt::Display for Expr<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Is(leaf) => write!(f, "{leaf}"),
            Expr::And(lhs, rhs) => write!(f, "{lhs} and {rhs}"),
            Expr::Or(lhs, rhs) => write!(f, "{lhs} or {rhs}"),
        }
    }
}

#[test]
fn test_and_is_min_or_is_max() {
    let strengths = [0.3, 0.7, 0.2];
    let fold = |connective: Connective| {
        (1..strengths.len()).fold(Expr::Is(0), |acc, i| connective.join(acc, Expr::Is(i)))
    };

    assert_eq!(fold(Connective::And).eval(&mut |&i: &usize| strengths[i]), 0.2);
    assert_eq!(fold(Connective::Or).eval(&mut |&i: &usize| strengths[i]), 0.7);
}

#[test]
fn test_crisp_truth_table() {
    for (a, b) in [(0., 0.), (0., 1.), (1., 0.), (1., 1.)] {
        let values = [a, b];

        assert_eq!(Expr::Is(0).and(Expr::Is(1)).eval(&mut |&i: &usize| values[i]), f64::min(a, b));
        assert_eq!(Expr::Is(0).or(Expr::Is(1)).eval(&mut |&i: &usize| values[i]), f64::max(a, b));
    }
}

#[test]
fn test_try_map_keeps_shape() {
    let expr = Expr::Is("a").and(Expr::Is("b")).or(Expr::Is("c"));
    let mapped: Result<_, ()> = expr.try_map(&mut |leaf: &&str| Ok(leaf.len()));

    assert_eq!(mapped, Ok(Expr::Is(1).and(Expr::Is(1)).or(Expr::Is(1))));
    assert_eq!(expr.propositions(), vec![&"a", &"b", &"c"]);
    assert_eq!(expr.to_string(), "a and b or c");

    let failed: Result<Expr<usize>, &str> =
        expr.try_map(&mut |leaf: &&str| if *leaf == "b" { Err("b") } else { Ok(0) });

    assert_eq!(failed, Err("b"));
}
