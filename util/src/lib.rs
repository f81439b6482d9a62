use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Dense copy of a CSR matrix, for comparing small assembled systems entry by entry.
pub fn dense(matrix: &CsrMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from(matrix)
}

/// Returns true if row `i` of the matrix is the `i`-th unit row scaled by `diagonal`.
pub fn is_scaled_unit_row(matrix: &CsrMatrix<f64>, i: usize, diagonal: f64) -> bool {
    let row = matrix.row(i);
    row.col_indices()
        .iter()
        .zip(row.values())
        .all(|(&j, &v)| if j == i { v == diagonal } else { v == 0.0 })
        && row.col_indices().contains(&i)
}

/// Vector of the given length whose entries are `f(i)`.
pub fn vector_from_fn(len: usize, f: impl Fn(usize) -> f64) -> DVector<f64> {
    DVector::from_fn(len, |i, _| f(i))
}
