use crate::traits::Scalar;

/// Reduces a stepper's error estimate to one dimensionless score,
/// normalized by the requested tolerance `eps`.
///
/// The position error (components 0..3) is measured relative to the
/// step length, the momentum error (components 3..6) relative to the
/// momentum magnitude, and the worse of the two is reported. A score
/// of at most 1 means the step is acceptable.
///
/// A momentum of exactly zero is abnormal for a moving particle but not
/// fatal: the momentum term is skipped with a warning and integration
/// continues. This function never fails.
pub fn relative_error<T: Scalar>(y: &[T], yerr: &[T], h: T, eps: T) -> T {
    // Accuracy for position, per unit of step length.
    let mut err2 = sum_of_squares(&yerr[0..3]) / (h * h);

    // Accuracy for momentum.
    let momentum2 = sum_of_squares(&y[3..6]);
    if momentum2 > T::zero() {
        err2 = err2.max(sum_of_squares(&yerr[3..6]) / momentum2);
    } else {
        eprintln!("relative_error: found case of zero momentum; momentum term skipped");
    }

    err2.sqrt() / eps
}

fn sum_of_squares<T: Scalar>(v: &[T]) -> T {
    v.iter().fold(T::zero(), |acc, &x| acc + x * x)
}

#[cfg(test)]
mod tests {
    use super::relative_error;

    #[test]
    fn score_combines_worst_of_position_and_momentum() {
        let y: [f64; 6] = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let mut yerr = [0.3, 0.0, 0.0, 0.2, 0.0, 0.0];

        // Position error dominates: sqrt(0.09) = 0.3 vs sqrt(0.04 / 4) = 0.1.
        let score = relative_error(&y, &yerr, 1.0, 1.0);
        assert!((score - 0.3).abs() < 1e-15);

        // Momentum error dominates once the position error vanishes.
        yerr[0] = 0.0;
        let score = relative_error(&y, &yerr, 1.0, 1.0);
        assert!((score - 0.1).abs() < 1e-15);
    }

    #[test]
    fn score_scales_inversely_with_tolerance() {
        let y: [f64; 6] = [0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let yerr = [1e-4, -2e-4, 5e-5, 1e-5, 0.0, -1e-5];

        let eps = 1e-3;
        let base = relative_error(&y, &yerr, 0.7, eps);
        let halved = relative_error(&y, &yerr, 0.7, 2.0 * eps);
        assert!((halved - 0.5 * base).abs() < 1e-12 * base);
    }

    #[test]
    fn zero_momentum_skips_the_momentum_term() {
        let y = [0.0f64; 6];
        let yerr = [3e-3, 4e-3, 0.0, 1.0, 1.0, 1.0];

        // Only the position part contributes: sqrt(25e-6) / 0.5 = 5e-3 / 0.5.
        let score = relative_error(&y, &yerr, 1.0, 0.5);
        assert!(score.is_finite());
        assert!((score - 1e-2).abs() < 1e-15);
    }

    #[test]
    fn position_error_is_relative_to_step_length() {
        let y: [f64; 6] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let yerr = [1e-3, 0.0, 0.0, 0.0, 0.0, 0.0];

        let short = relative_error(&y, &yerr, 0.1, 1.0);
        let long = relative_error(&y, &yerr, 10.0, 1.0);
        assert!((short / long - 100.0).abs() < 1e-9);
    }
}
