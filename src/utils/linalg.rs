//! Dense linear algebra used by the regression models.
//!
//! Everything here is small-matrix code: predictor pools hold tens of
//! columns at most, so a row-major `Vec<f64>` with a Cholesky solver covers
//! the regressions. Eigen-decomposition is delegated to nalgebra.

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build a matrix from row vectors. Returns `None` for ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data: rows.iter().flatten().copied().collect(),
        })
    }

    /// Build a matrix from column slices. Returns `None` for ragged input.
    pub fn from_columns(columns: &[&[f64]]) -> Option<Self> {
        let rows = columns.first().map_or(0, |c| c.len());
        if columns.iter().any(|c| c.len() != rows) {
            return None;
        }
        let cols = columns.len();
        let mut m = Self::zeros(rows, cols);
        for (j, column) in columns.iter().enumerate() {
            for (i, &v) in column.iter().enumerate() {
                m.set(i, j, v);
            }
        }
        Some(m)
    }

    /// Single-column matrix.
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy one column.
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, col)).collect()
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size
        let width = self.cols.max(1);
        self.data.chunks_exact(width).take(self.rows)
    }

    /// New matrix holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// New matrix holding the first `k` columns.
    pub fn first_columns(&self, k: usize) -> Self {
        let k = k.min(self.cols);
        let mut m = Self::zeros(self.rows, k);
        for i in 0..self.rows {
            for j in 0..k {
                m.set(i, j, self.get(i, j));
            }
        }
        m
    }

    /// Matrix product `self * other`. Returns `None` on shape mismatch.
    pub fn matmul(&self, other: &Matrix) -> Option<Matrix> {
        if self.cols != other.rows {
            return None;
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    let idx = i * other.cols + j;
                    out.data[idx] += a * other.get(k, j);
                }
            }
        }
        Some(out)
    }

    /// Scale every element.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// True when every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

/// Relative pivot tolerance below which a Cholesky pivot counts as zero.
///
/// The ratio `pivot / original diagonal` equals `1 - R²` of that column
/// regressed on the earlier ones.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
#[derive(Debug, Clone)]
pub struct Cholesky {
    l: Matrix,
}

impl Cholesky {
    /// Factor `a = L Lᵀ`. Returns `None` if `a` is not square, not finite,
    /// or numerically rank deficient.
    pub fn decompose(a: &Matrix) -> Option<Self> {
        let n = a.rows();
        if n == 0 || a.cols() != n || !a.is_finite() {
            return None;
        }

        let mut l = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..=i {
                let mut sum = a.get(i, j);
                for k in 0..j {
                    sum -= l.get(i, k) * l.get(j, k);
                }

                if i == j {
                    let diag = a.get(i, i);
                    if sum <= 0.0 || diag <= 0.0 || sum <= PIVOT_TOLERANCE * diag {
                        return None;
                    }
                    l.set(i, j, sum.sqrt());
                } else {
                    l.set(i, j, sum / l.get(j, j));
                }
            }
        }
        Some(Self { l })
    }

    pub fn dim(&self) -> usize {
        self.l.rows()
    }

    /// Solve `a x = b`.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.dim();

        // Forward substitution: L y = b
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = b[i];
            for j in 0..i {
                sum -= self.l.get(i, j) * y[j];
            }
            y[i] = sum / self.l.get(i, i);
        }

        // Backward substitution: Lᵀ x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= self.l.get(j, i) * x[j];
            }
            x[i] = sum / self.l.get(i, i);
        }
        x
    }

    /// Full inverse of the factored matrix.
    pub fn inverse(&self) -> Matrix {
        let n = self.dim();
        let mut inv = Matrix::zeros(n, n);
        let mut unit = vec![0.0; n];
        for j in 0..n {
            unit.iter_mut().for_each(|u| *u = 0.0);
            unit[j] = 1.0;
            for (i, v) in self.solve(&unit).into_iter().enumerate() {
                inv.set(i, j, v);
            }
        }
        inv
    }
}

/// Solve a symmetric positive definite system `a x = b`.
pub fn solve_symmetric(a: &Matrix, b: &[f64]) -> Option<Vec<f64>> {
    if b.len() != a.rows() {
        return None;
    }
    Cholesky::decompose(a).map(|c| c.solve(b))
}

/// Eigen-decomposition of a symmetric matrix.
///
/// Returns eigenvalues sorted in descending order and the matching
/// eigenvectors as the columns of the returned matrix.
pub fn symmetric_eigen(a: &Matrix) -> Option<(Vec<f64>, Matrix)> {
    use nalgebra::{DMatrix, SymmetricEigen};

    let n = a.rows();
    if n == 0 || a.cols() != n || !a.is_finite() {
        return None;
    }

    let eigen = SymmetricEigen::new(DMatrix::from_row_slice(n, n, &a.data));
    if eigen.eigenvalues.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

    let values = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let mut vectors = Matrix::zeros(n, n);
    for (col, &idx) in order.iter().enumerate() {
        for k in 0..n {
            vectors.set(k, col, eigen.eigenvectors[(k, idx)]);
        }
    }
    Some((values, vectors))
}
