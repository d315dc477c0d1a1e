pub struct StatsHelper;

impl StatsHelper {
    /// Largest finite value, or 0 for an empty/non-finite sequence.
    pub fn max_finite(values: impl IntoIterator<Item = f64>) -> f64 {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_finite_ignores_nan_and_defaults_to_zero() {
        assert_eq!(StatsHelper::max_finite([]), 0.0);
        assert_eq!(StatsHelper::max_finite([1.0, f64::NAN, 3.5]), 3.5);
        assert_eq!(StatsHelper::max_finite([-2.0]), 0.0);
    }
}
