//! Regularized normal-equation solver.
//!
//! We solve problems of the form:
//!
//! ```text
//! minimize ||A x - b||^2 + λ ||x||^2
//! ```
//!
//! through the normal equations `(AᵗA + λI) x = Aᵗb`.
//!
//! Implementation choices:
//! - The system matrix is symmetric positive semi-definite, and positive definite
//!   whenever `λ > 0` or `A` has full column rank, so Cholesky is the natural solver.
//! - Before solving we estimate the reciprocal condition number from the singular
//!   values of the system matrix. With `λ = 0` and a rank-deficient `A`, Cholesky
//!   can still "succeed" on round-off noise and return garbage, so the check is
//!   what decides solvability.
//! - The threshold is absolute, not scaled by `λ`. For a rank-deficient `A` the
//!   smallest eigenvalue of the system is `λ` itself, so `rcond ≈ λ / (λ + ||A||²)`.
//!   A positive but tiny `λ` (below about `1e-12 · ||A||²`) is therefore still
//!   reported as ill-conditioned; such a `λ` would only add round-off noise to
//!   the solution. Regularization parameters used in practice (0.1 and up) are
//!   far above this.
//! - Matrices here are `T × T` with `T` the number of teams (tens to a few
//!   hundred), so a dense SVD is cheap.

use nalgebra::{DMatrix, DVector};

/// Systems with a reciprocal condition number below this are treated as singular.
pub const SINGULAR_RCOND: f64 = 1e-12;

/// The regularized system could not be solved reliably.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IllConditioned {
    /// Estimated reciprocal condition number of `AᵗA + λI` (0 when undefined).
    pub rcond: f64,
}

/// Solve `(AᵗA + λI) x = Aᵗb`.
pub fn solve_regularized(a: &DMatrix<f64>, b: &DVector<f64>, lambda: f64) -> Result<DVector<f64>, IllConditioned> {
    let at = a.transpose();
    let mut system = &at * a;
    for i in 0..system.nrows() {
        system[(i, i)] += lambda;
    }
    let rhs = &at * b;

    let rcond = reciprocal_condition(&system);
    // Written this way so a NaN estimate is rejected too.
    if !(rcond >= SINGULAR_RCOND) {
        return Err(IllConditioned { rcond: if rcond.is_finite() { rcond } else { 0.0 } });
    }

    let x = match system.clone().cholesky() {
        Some(chol) => chol.solve(&rhs),
        None => system.lu().solve(&rhs).ok_or(IllConditioned { rcond })?,
    };

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(IllConditioned { rcond })
    }
}

/// Ratio of the smallest to the largest singular value (2-norm reciprocal condition).
pub fn reciprocal_condition(m: &DMatrix<f64>) -> f64 {
    if m.is_empty() {
        return 0.0;
    }
    let sv = m.singular_values();
    let max = sv.iter().copied().fold(0.0_f64, f64::max);
    let min = sv.iter().copied().fold(f64::INFINITY, f64::min);
    if max > 0.0 { min / max } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_lambda_matches_least_squares() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let x = solve_regularized(&a, &b, 0.0).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-10);
        assert!((x[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn ridge_shrinks_towards_zero() {
        // Identity design: the ridge solution is b / (1 + λ).
        let a = DMatrix::<f64>::identity(3, 3);
        let b = DVector::from_row_slice(&[3.0, -6.0, 9.0]);

        let x = solve_regularized(&a, &b, 2.0).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] + 2.0).abs() < 1e-12);
        assert!((x[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn duplicate_columns_are_singular_without_lambda() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);

        let err = solve_regularized(&a, &b, 0.0).unwrap_err();
        assert!(err.rcond < SINGULAR_RCOND);

        // A practical positive λ makes the same system solvable.
        let x = solve_regularized(&a, &b, 0.5).unwrap();
        assert!((x[0] - x[1]).abs() < 1e-12);
    }

    #[test]
    fn vanishing_lambda_on_rank_deficient_design_is_ill_conditioned() {
        // AᵗA has eigenvalues 4 and 0, so rcond = λ / (4 + λ).
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0, 3.0]);

        let err = solve_regularized(&a, &b, 1e-13).unwrap_err();
        assert!(err.rcond > 0.0 && err.rcond < SINGULAR_RCOND);

        let x = solve_regularized(&a, &b, 1e-6).unwrap();
        assert!((x[0] - x[1]).abs() < 1e-6);
        assert!((x[0] + x[1] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn empty_matrix_has_zero_rcond() {
        let m = DMatrix::<f64>::zeros(0, 0);
        assert_eq!(reciprocal_condition(&m), 0.0);
    }
}
