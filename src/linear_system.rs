//! Dense solver for small square linear systems.
//!
//! Determinant is computed by cofactor expansion along the first row and the system is
//! solved with Cramer's rule. Both are `O(n!)`, which is acceptable only for the handful of
//! unknowns a waypoint path produces.

use std::{error::Error, fmt::Display};

use log::{trace, warn};
use nalgebra::{DMatrix, DVector};

/// Determinant of square `matrix` by recursive cofactor expansion along the first row.
///
/// Non-square matrix has no determinant and `0.0` is returned for it, so such matrix is
/// indistinguishable from a singular one. Use [solve] to get explicit dimension errors.
/// Empty matrix has determinant `1.0` (empty product).
/// # Example
/// ```
/// use nalgebra::DMatrix;
/// use path_spline::linear_system::determinant;
///
/// let matrix = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(determinant(&matrix), -2.0);
/// ```
pub fn determinant(matrix: &DMatrix<f64>) -> f64 {
    if !matrix.is_square() {
        return 0.0;
    }

    let size = matrix.nrows();
    match size {
        0 => 1.0,
        1 => matrix[(0, 0)],
        _ => {
            let without_first_row = matrix.clone().remove_row(0);
            let mut det = 0.0;

            for column in 0..size {
                let minor = without_first_row.clone().remove_column(column);
                let sign = if column % 2 == 0 { 1.0 } else { -1.0 };
                det += sign * matrix[(0, column)] * determinant(&minor);
            }
            det
        }
    }
}

/// Solves `matrix * solution = rhs` with Cramer's rule.
///
/// `matrix` is only borrowed: column substitution happens on a local copy.
/// # Example
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use path_spline::linear_system::solve;
///
/// let matrix = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
/// let rhs = DVector::from_vec(vec![1.0, 2.0]);
///
/// let solution = solve(&matrix, &rhs).unwrap();
/// assert_eq!(solution.as_slice(), &[0.5, 0.5]);
/// ```
/// # Errors
/// - [LinearSystemError::Empty] for 0x0 system,
/// - [LinearSystemError::NotSquare] when `matrix` is not square,
/// - [LinearSystemError::DimensionMismatch] when `rhs` length differs from `matrix` size,
/// - [LinearSystemError::Singular] when determinant of `matrix` is exactly zero.
pub fn solve(matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, LinearSystemError> {
    check_dimensions(matrix, rhs)?;

    let det = determinant(matrix);
    if det == 0.0 {
        warn!("{}x{} system is singular", matrix.nrows(), matrix.ncols());
        return Err(LinearSystemError::Singular);
    }

    let size = matrix.nrows();
    let mut substituted = matrix.clone();
    let mut solution = DVector::<f64>::zeros(size);

    for column in 0..size {
        substituted.set_column(column, rhs);
        solution[column] = determinant(&substituted) / det;
        substituted.set_column(column, &matrix.column(column));
    }

    trace!("solved {}x{} system: det = {}, solution = {:?}", size, size, det, solution.as_slice());
    Ok(solution)
}

fn check_dimensions(matrix: &DMatrix<f64>, rhs: &DVector<f64>) -> Result<(), LinearSystemError> {
    if matrix.is_empty() {
        return Err(LinearSystemError::Empty);
    }
    if !matrix.is_square() {
        return Err(LinearSystemError::NotSquare {
            rows: matrix.nrows(),
            columns: matrix.ncols(),
        });
    }
    if matrix.nrows() != rhs.len() {
        return Err(LinearSystemError::DimensionMismatch {
            matrix_size: matrix.nrows(),
            rhs_len: rhs.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinearSystemError {
    Empty,
    NotSquare { rows: usize, columns: usize },
    DimensionMismatch { matrix_size: usize, rhs_len: usize },
    Singular,
}

impl Display for LinearSystemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinearSystemError::Empty => write!(f, "Error in LinearSystem: matrix is empty"),
            LinearSystemError::NotSquare { rows, columns } => {
                write!(f, "Error in LinearSystem: matrix is not square ({}x{})", rows, columns)
            }
            LinearSystemError::DimensionMismatch { matrix_size, rhs_len } => write!(
                f,
                "Error in LinearSystem: matrix size {} does not match rhs length {}",
                matrix_size, rhs_len
            ),
            LinearSystemError::Singular => {
                write!(f, "Error in LinearSystem: system is degenerate (determinant is zero)")
            }
        }
    }
}

impl Error for LinearSystemError {}
