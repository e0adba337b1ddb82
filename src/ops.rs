//! The Mamdani operators: minimum as `and`, maximum as `or`, complement as
//! `not`, clipping implication, maximum aggregation and centroid
//! defuzzification.

use num::Float;

pub fn and<F: Float>(u: F, v: F) -> F {
    F::min(u, v)
}

pub fn or<F: Float>(u: F, v: F) -> F {
    F::max(u, v)
}

pub fn not<F: Float>(u: F) -> F {
    F::one() - u
}

/// Implication: the consequent's membership cut off at the rule's strength.
pub fn clip<F: Float>(membership: &[F], strength: F) -> impl Iterator<Item = F> + '_ {
    membership.iter().map(move |&m| and(m, strength))
}

/// Aggregation: folds a clipped membership into the running pointwise maximum.
pub fn aggregate_into<F: Float>(aggregated: &mut [F], clipped: impl IntoIterator<Item = F>) {
    for (agg, m) in aggregated.iter_mut().zip(clipped) {
        *agg = or(*agg, m);
    }
}

/// Center of gravity of a sampled membership, `Σ xᵢ·μ(xᵢ) / Σ μ(xᵢ)`.
///
/// `None` when the membership is zero everywhere.
pub fn centroid<F: Float>(universe: &[F], membership: &[F]) -> Option<F> {
    debug_assert_eq!(universe.len(), membership.len());

    let den = membership.iter().fold(F::zero(), |acc, &m| acc + m);

    if den <= F::zero() {
        return None;
    }

    let num = universe
        .iter()
        .zip(membership)
        .fold(F::zero(), |acc, (&x, &m)| acc + x * m);

    Some(num / den)
}

#[test]
fn test_connectives() {
    assert_eq!(and(0.3, 0.7), 0.3);
    assert_eq!(or(0.3, 0.7), 0.7);
    assert_eq!(not(0.25f32), 0.75);
    assert_eq!(not(not(0.5)), 0.5);
}

#[test]
fn test_clip() {
    let clipped: Vec<_> = clip(&[0., 0.5, 1., 0.5, 0.], 0.6).collect();

    assert_eq!(clipped, vec![0., 0.5, 0.6, 0.5, 0.]);
}

#[test]
fn test_zero_strength_leaves_aggregate_unchanged() {
    let mut aggregated = vec![0., 0.2, 0.4, 0.2, 0.];
    let before = aggregated.clone();

    aggregate_into(&mut aggregated, clip(&[1., 1., 1., 1., 1.], 0.));

    assert_eq!(aggregated, before);

    aggregate_into(&mut aggregated, clip(&[1., 1., 0., 0., 0.], 0.3));

    assert_eq!(aggregated, vec![0.3, 0.3, 0.4, 0.2, 0.]);
}

#[test]
fn test_centroid() {
    use approx::assert_relative_eq;

    let universe: Vec<f64> = (0..=20).map(f64::from).collect();
    let triangle: Vec<f64> = universe.iter().map(|&x| 1. - (x - 10.).abs() / 10.).collect();

    assert_relative_eq!(centroid(&universe, &triangle).unwrap(), 10., epsilon = 1e-12);

    let skewed = [0., 0., 1., 1.];

    assert_relative_eq!(centroid(&[0., 1., 2., 3.], &skewed).unwrap(), 2.5);
    assert_eq!(centroid(&[0., 1., 2.], &[0., 0., 0.]), None);
}
