//! Damped power iteration over a preference matrix.
//!
//! The matrix is row-normalized into a stochastic matrix, blended with a
//! uniform teleportation term, and a uniform starting vector is multiplied
//! through it until successive iterates differ by less than `epsilon` in
//! Euclidean norm. The resulting stationary distribution is the ranking.

use std::fmt::{Debug, Display};

use nalgebra::{DMatrix, RowDVector};
use tracing::{debug, warn};

use crate::RankerError;

/// Negative cells smaller than this in magnitude are floating-point residue
/// and are treated as zero.
const ROUNDING_TOLERANCE: f64 = 1e-9;

/// Tuning knobs for a single ranking run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunOptions {
    /// Damping factor in `(0, 1]`; `1.0` disables teleportation.
    pub damping: f64,
    /// Stop once the step between iterates is shorter than this.
    pub epsilon: f64,
    /// Upper bound on the number of matrix-vector products.
    pub max_iterations: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            damping: 1.0,
            epsilon: 0.001,
            max_iterations: 1000,
        }
    }
}

impl RunOptions {
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate<T: Display + Debug>(&self) -> Result<(), RankerError<T>> {
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(RankerError::InvalidArgument(format!(
                "damping must be in (0, 1], got {}",
                self.damping
            )));
        }
        if !(self.epsilon > 0.0) {
            return Err(RankerError::InvalidArgument(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(RankerError::InvalidArgument(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of power iteration, in matrix index order.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerIterationOutcome {
    pub weights: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Runs damped power iteration on a copy of `matrix`.
pub fn power_method<T: Display + Debug>(
    matrix: &DMatrix<f64>,
    options: &RunOptions,
) -> Result<PowerIterationOutcome, RankerError<T>> {
    options.validate::<T>()?;

    if !matrix.is_square() {
        return Err(RankerError::DimensionMismatch {
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }

    let n = matrix.nrows();
    let uniform = RowDVector::from_element(n, 1.0 / n as f64);

    // Total ignorance: every item is equally likely.
    if matrix.iter().all(|&x| x == 0.0) {
        debug!(items = n, "empty preference matrix, returning uniform weights");
        return Ok(PowerIterationOutcome {
            weights: uniform.iter().copied().collect(),
            iterations: 0,
            converged: true,
        });
    }

    let mut transition = normalize_rows::<T>(matrix)?;

    transition *= options.damping;
    transition.add_scalar_mut((1.0 - options.damping) / n as f64);

    let mut prev = uniform;
    let mut next = prev.clone();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        next = &prev * &transition;
        iterations += 1;

        if (&next - &prev).norm() < options.epsilon {
            converged = true;
            break;
        }
        prev = next.clone();
    }

    if converged {
        debug!(iterations, "eigenvector converged");
    } else {
        warn!(
            iterations,
            epsilon = options.epsilon,
            "eigenvector did not converge, returning last iterate"
        );
    }

    Ok(PowerIterationOutcome {
        weights: next.iter().copied().collect(),
        iterations,
        converged,
    })
}

/// Divides every row by its sum, producing a row-stochastic matrix.
///
/// A row is unusable when it sums to zero or holds negative mass; the latter
/// happens once a pair has received more votes than the prior was sized for.
fn normalize_rows<T: Display + Debug>(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>, RankerError<T>> {
    let mut normalized = matrix.clone();

    for (idx, mut row) in normalized.row_iter_mut().enumerate() {
        for x in row.iter_mut() {
            if *x < 0.0 {
                if *x < -ROUNDING_TOLERANCE {
                    warn!(row = idx, cell = *x, "negative preference mass, prior retracted past its participant count");
                    return Err(RankerError::DegenerateMatrix(idx));
                }
                // Residue of retracting the prior in full
                *x = 0.0;
            }
        }

        let row_sum = row.sum();
        if row_sum == 0.0 || !row_sum.is_finite() {
            return Err(RankerError::DegenerateMatrix(idx));
        }
        row /= row_sum;
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    type Error = RankerError<String>;

    #[test]
    fn test_default_options() {
        let options = RunOptions::default();

        assert_eq!(options.damping, 1.0);
        assert_eq!(options.epsilon, 0.001);
        assert_eq!(options.max_iterations, 1000);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let matrix = DMatrix::from_element(2, 2, 1.0);

        for options in [
            RunOptions::default().with_damping(0.0),
            RunOptions::default().with_damping(1.5),
            RunOptions::default().with_damping(f64::NAN),
            RunOptions::default().with_epsilon(0.0),
            RunOptions::default().with_max_iterations(0),
        ] {
            let result: Result<_, Error> = power_method(&matrix, &options);
            assert!(matches!(result, Err(RankerError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_zero_matrix_is_uniform() {
        let matrix = DMatrix::zeros(4, 4);
        let outcome: PowerIterationOutcome = power_method::<String>(&matrix, &RunOptions::default()).unwrap();

        for w in &outcome.weights {
            assert_abs_diff_eq!(*w, 0.25, epsilon = 1e-9);
        }
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_isolated_row_is_degenerate() {
        let mut matrix = DMatrix::zeros(3, 3);
        matrix[(0, 1)] = 1.0;
        matrix[(1, 1)] = 1.0;

        let result = power_method::<String>(&matrix, &RunOptions::default());
        assert!(matches!(result, Err(RankerError::DegenerateMatrix(2))));
    }

    #[test]
    fn test_negative_cell_is_degenerate() {
        let matrix = DMatrix::from_row_slice(2, 2, &[1.5, -0.5, 1.5, -0.5]);

        let result = power_method::<String>(&matrix, &RunOptions::default());
        assert!(matches!(result, Err(RankerError::DegenerateMatrix(0))));
    }

    #[test]
    fn test_rounding_residue_treated_as_zero() {
        let matrix = DMatrix::from_row_slice(2, 2, &[-1e-16, 1.0, -1e-16, 1.0]);

        let outcome = power_method::<String>(&matrix, &RunOptions::default()).unwrap();
        assert_eq!(outcome.weights, vec![0.0, 1.0]);
    }

    #[test]
    fn test_input_matrix_untouched() {
        let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 2.0, 2.0]);
        let before = matrix.clone();

        power_method::<String>(&matrix, &RunOptions::default().with_damping(0.8)).unwrap();

        assert_eq!(matrix, before);
    }

    #[test]
    fn test_weights_form_distribution() {
        let matrix = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, 0.5, 0.0, 1.0, 3.0, 1.0, 1.0, 3.5]);

        for damping in [0.1, 0.5, 0.85, 1.0] {
            let options = RunOptions::default().with_damping(damping);
            let outcome = power_method::<String>(&matrix, &options).unwrap();

            assert!(outcome.weights.iter().all(|&w| w >= 0.0));
            assert_abs_diff_eq!(outcome.weights.iter().sum::<f64>(), 1.0, epsilon = options.epsilon);
        }
    }

    #[test]
    fn test_iteration_cap_returns_last_iterate() {
        let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 9.0, 1.0, 1.0]);
        let options = RunOptions::default().with_epsilon(1e-15).with_max_iterations(2);

        let outcome = power_method::<String>(&matrix, &options).unwrap();

        assert_eq!(outcome.iterations, 2);
        assert!(!outcome.converged);
        assert_abs_diff_eq!(outcome.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}
