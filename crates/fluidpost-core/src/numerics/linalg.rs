//! Dense real LU for the small damped normal-equation systems of the
//! least-squares fitter.

use faer::Mat;

pub type DenseMatrix = Mat<f64>;

const PIVOT_FLOOR: f64 = 1.0e-15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuError {
    #[error("cannot factorise an empty matrix")]
    EmptyMatrix,
    #[error("cannot factorise a {rows}x{cols} matrix; it must be square")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("zero pivot in column {pivot_index}")]
    SingularMatrix { pivot_index: usize },
    #[error("right-hand side has {actual} entries for a system of {expected}")]
    RhsLengthMismatch { expected: usize, actual: usize },
}

/// `P A = L U` stored in one matrix; `L` has an implicit unit diagonal and
/// `row_order[i]` is the row of `A` that ended up in row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct LuDecomposition {
    packed: DenseMatrix,
    row_order: Vec<usize>,
}

impl LuDecomposition {
    pub fn dimension(&self) -> usize {
        self.row_order.len()
    }

    pub fn lu_matrix(&self) -> &DenseMatrix {
        &self.packed
    }

    pub fn pivots(&self) -> &[usize] {
        &self.row_order
    }

    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
        let n = self.dimension();
        if rhs.len() != n {
            return Err(LuError::RhsLengthMismatch {
                expected: n,
                actual: rhs.len(),
            });
        }

        // L y = P b
        let mut x: Vec<f64> = self.row_order.iter().map(|&source| rhs[source]).collect();
        for i in 1..n {
            let dot: f64 = (0..i).map(|k| self.packed[(i, k)] * x[k]).sum();
            x[i] -= dot;
        }
        // U x = y
        for i in (0..n).rev() {
            let dot: f64 = ((i + 1)..n).map(|k| self.packed[(i, k)] * x[k]).sum();
            x[i] = (x[i] - dot) / self.packed[(i, i)];
        }
        Ok(x)
    }
}

pub fn lu_factorize(matrix: &DenseMatrix) -> Result<LuDecomposition, LuError> {
    let (rows, cols) = (matrix.nrows(), matrix.ncols());
    if rows == 0 || cols == 0 {
        return Err(LuError::EmptyMatrix);
    }
    if rows != cols {
        return Err(LuError::NonSquareMatrix { rows, cols });
    }

    let n = rows;
    let mut packed = matrix.clone();
    let mut row_order: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let pivot_row = (k..n)
            .max_by(|&a, &b| packed[(a, k)].abs().total_cmp(&packed[(b, k)].abs()))
            .unwrap_or(k);
        if packed[(pivot_row, k)].abs() <= PIVOT_FLOOR {
            return Err(LuError::SingularMatrix { pivot_index: k });
        }
        if pivot_row != k {
            for j in 0..n {
                let held = packed[(k, j)];
                packed[(k, j)] = packed[(pivot_row, j)];
                packed[(pivot_row, j)] = held;
            }
            row_order.swap(k, pivot_row);
        }

        let pivot = packed[(k, k)];
        for i in (k + 1)..n {
            let factor = packed[(i, k)] / pivot;
            packed[(i, k)] = factor;
            for j in (k + 1)..n {
                packed[(i, j)] -= factor * packed[(k, j)];
            }
        }
    }

    Ok(LuDecomposition { packed, row_order })
}

pub fn lu_solve(matrix: &DenseMatrix, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
    lu_factorize(matrix)?.solve(rhs)
}
