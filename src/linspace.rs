pub struct Linspace {
    start: f64,
    step: f64,
    index: usize,
    len: usize,
}

impl Linspace {
    /// Samples `min..=max` every `step`, keeping `max` when the range is an
    /// exact multiple of the step. A trailing partial step is dropped.
    ///
    /// `step` must be finite and positive. `None` when the number of samples
    /// can't be counted in a `usize`.
    pub fn stepped(min: f64, max: f64, step: f64) -> Option<Self> {
        debug_assert!(step.is_finite() && step > 0.);

        // Absorbs rounding like (0.3 - 0.) / 0.1 == 2.9999999999999996
        let steps = ((max - min) / step + 1e-9).floor().max(0.);

        // `as` saturates, so the range has to be checked first. Also rejects NaN
        if !(steps < usize::MAX as f64) {
            return None;
        }

        let len = (steps as usize).checked_add(1)?;

        Some(Linspace {
            start: min,
            step,
            index: 0,
            len,
        })
    }
}

impl Iterator for Linspace {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        if self.index >= self.len {
            None
        } else {
            // Calculate the value just like numpy.linspace does
            let i = self.index;
            self.index += 1;
            Some(self.start + self.step * i as f64)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Linspace {}

#[test]
fn test_linspace() {
    let points: Vec<_> = Linspace::stepped(0., 1., 0.25).unwrap().collect();

    assert_eq!(points, vec![0., 0.25, 0.5, 0.75, 1.]);
}

#[test]
fn test_stepped_is_inclusive() {
    let points: Vec<_> = Linspace::stepped(-5., 5., 1.).unwrap().collect();

    assert_eq!(points.len(), 11);
    assert_eq!(points.first(), Some(&-5.));
    assert_eq!(points.last(), Some(&5.));
    assert_eq!(Linspace::stepped(0., 0.3, 0.1).unwrap().len(), 4);
    assert_eq!(Linspace::stepped(0., 2.5, 1.).unwrap().collect::<Vec<_>>(), vec![0., 1., 2.]);
    assert_eq!(Linspace::stepped(4., 4., 1.).unwrap().collect::<Vec<_>>(), vec![4.]);
}

#[test]
fn test_uncountable_range() {
    assert!(Linspace::stepped(0., 1e300, 1.).is_none());
    assert!(Linspace::stepped(-f64::MAX, f64::MAX, 1.).is_none());
    assert_eq!(Linspace::stepped(0., 1e6, 1.).map(|l| l.len()), Some(1_000_001));
}
