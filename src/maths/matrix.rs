use crate::Complex;
use core::ops;

/// Dense row-major matrix of complex amplitudes, used for gate matrices and
/// (for inspection only) density matrices.
#[macro_export]
macro_rules! matrix {
    ( $( [ $( $elem:expr ),+ $(,)? ] );+ $(;)? ) => {{
        let rows: Vec<Vec<$crate::Complex>> = vec![ $( vec![ $( $elem ),+ ] ),+ ];
        let num_rows = rows.len();
        let num_cols = rows[0].len();
        let mut data = Vec::with_capacity(num_rows * num_cols);
        for row in rows {
            debug_assert_eq!(row.len(), num_cols, "matrix! rows must all have the same length");
            data.extend(row);
        }
        $crate::Matrix::new(num_rows, num_cols, data)
    }};
}

#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T = Complex> {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<T>,
}

impl<T: Clone> Matrix<T> {
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "matrix data length does not match rows*cols"
        );
        Matrix { rows, cols, data }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }
}

impl Matrix<Complex> {
    pub fn identity(n: usize) -> Self {
        let mut data = vec![Complex::ZERO; n * n];
        for i in 0..n {
            data[i * n + i] = Complex::ONE;
        }
        Matrix::new(n, n, data)
    }

    pub fn zero(rows: usize, cols: usize) -> Self {
        Matrix::new(rows, cols, vec![Complex::ZERO; rows * cols])
    }

    /// Matrix product; panics on dimension mismatch (an internal-invariant
    /// violation, never caller input).
    pub fn dot(&self, other: &Matrix<Complex>) -> Matrix<Complex> {
        assert_eq!(self.cols, other.rows, "matrix dot: incompatible shapes");
        let mut result = Matrix::zero(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = *self.get(i, k);
                if a.is_negligible(1e-15) {
                    continue;
                }
                for j in 0..other.cols {
                    let existing = *result.get(i, j);
                    result.set(i, j, existing + a * *other.get(k, j));
                }
            }
        }
        result
    }

    pub fn kronecker(&self, other: &Matrix<Complex>) -> Matrix<Complex> {
        let rows = self.rows * other.rows;
        let cols = self.cols * other.cols;
        let mut result = Matrix::zero(rows, cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                let a = *self.get(i, j);
                for k in 0..other.rows {
                    for l in 0..other.cols {
                        let b = *other.get(k, l);
                        result.set(i * other.rows + k, j * other.cols + l, a * b);
                    }
                }
            }
        }
        result
    }

    pub fn conjugate_transpose(&self) -> Matrix<Complex> {
        let mut result = Matrix::zero(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                result.set(j, i, self.get(i, j).get_conjugate());
            }
        }
        result
    }
}

impl ops::Mul<Complex> for Matrix<Complex> {
    type Output = Matrix<Complex>;

    fn mul(self, scalar: Complex) -> Matrix<Complex> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.into_iter().map(|v| v * scalar).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex;

    #[test]
    fn identity_is_multiplicative_unit() {
        let m = matrix!([complex!(1.0, 0.0), complex!(2.0, 0.0)]; [complex!(3.0, 0.0), complex!(4.0, 0.0)]);
        let id = Matrix::identity(2);
        let product = m.dot(&id);
        assert_eq!(product, m);
    }

    #[test]
    fn kronecker_product_has_expected_shape() {
        let a = Matrix::identity(2);
        let b = Matrix::identity(2);
        let k = a.kronecker(&b);
        assert_eq!(k.rows, 4);
        assert_eq!(k.cols, 4);
    }

    #[test]
    fn scalar_multiply_scales_every_entry() {
        let m = Matrix::identity(2) * complex!(2.0, 0.0);
        assert_eq!(m.get(0, 0).real, 2.0);
        assert_eq!(m.get(1, 1).real, 2.0);
    }
}
