use num::Float;

/// Piecewise-linear interpolation of a single point, similar to numpy.interp.
///
/// `coords` must be sorted by x and non-empty. Values left of the first point
/// take the first y, values right of the last point take the last y. A
/// vertical segment (two points sharing an x) evaluates to the higher of its
/// two ys.
pub(crate) fn interp_at<F: Float>(x: F, coords: &[(F, F)]) -> F {
    let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) = (coords.first(), coords.last()) else {
        return F::zero();
    };

    // Base cases
    if x < first_x {
        return first_y;
    }
    if x > last_x {
        return last_y;
    }

    for window in coords.windows(2) {
        let (x1, y1) = window[0];
        let (x2, y2) = window[1];

        if x1 <= x && x <= x2 {
            if x2 == x1 {
                return F::max(y1, y2);
            }

            // Actual interpolation
            return y1 + (x - x1) * (y2 - y1) / (x2 - x1);
        }
    }

    // Only reachable with a single coordinate, where x == first_x
    first_y
}

/// Similar to numpy.interp
pub(crate) fn interp<F: Float>(x_input: &[F], coords: &[(F, F)]) -> Vec<F> {
    x_input.iter().map(|&x| interp_at(x, coords)).collect()
}

#[test]
fn test_interp() {
    let x = [0., 1., 1.5, 2.72, 3.24];
    let coords = [(1., 3.), (2., 2.), (3., 0.)];

    assert_eq!(interp(&x, &coords), vec![3., 3., 2.5, 0.5599999999999996, 0.]);

    let x = [2.5, -1., 7.5];
    let coords = [(0., 0.), (1., 2.), (2., 5.), (3., 3.), (4.5, 2.)];

    assert_eq!(interp(&x, &coords), vec![4., 0., 2.]);
}

#[test]
fn test_interp_vertical_segments() {
    // Left shoulder: a == b
    let coords = [(0., 0.), (0., 1.), (5., 1.), (10., 0.)];

    assert_eq!(interp_at(0., &coords), 1.);
    assert_eq!(interp_at(-0.5, &coords), 0.);

    // Spike: a == b == c
    let coords = [(3., 0.), (3., 1.), (3., 1.), (3., 0.)];

    assert_eq!(interp_at(3., &coords), 1.);
    assert_eq!(interp_at(3.5, &coords), 0.);
}

#[test]
fn test_interp_single_point() {
    assert_eq!(interp_at(1., &[(1., 0.25)]), 0.25);
    assert_eq!(interp_at(2., &[(1., 0.25)]), 0.25);
    assert_eq!(interp_at(2., &[] as &[(f64, f64)]), 0.);
}
