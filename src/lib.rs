//! Dense, shape-checked `f64` matrices for sets of 3-D coordinates.
//!
//! A [`Matrix`] owns its elements. [`MatrixView`] and [`MatrixViewMut`]
//! borrow a rectangular window of another matrix; writing through a
//! `MatrixViewMut` changes the parent in place. Operations write into a
//! receiver whose dimensions must already satisfy the operation's contract.
//!
//! Shape violations are fatal: they unwind with a [`MatrixError`] payload.
//! Wrap a call in [`maybe`], or use one of the `*_safe` methods, to get the
//! error back as a value instead.
//!
//! ```
//! use coordmat::{matrix, Matrix};
//!
//! let a = matrix![[1, 2, 3], [4, 5, 6]];
//! let b = matrix![[1, 2], [3, 4], [5, 6]];
//! let mut f = Matrix::zeros(2, 2);
//! f.multiply(&a, &b);
//! assert_eq!(f, matrix![[22, 28], [49, 64]]);
//! ```

mod error;
mod kernels;
mod matrix;
mod op;
mod rows;
mod shape;
mod storage;

pub use crate::error::{maybe, MResult, MatrixError};
pub use crate::kernels::{MulConfig, DEFAULT_WORKERS, MAX_WORKERS};
pub use crate::matrix::{Matrix, MatrixBase, MatrixView, MatrixViewMut};
pub use crate::shape::Dims;
pub use crate::storage::{BaseData, BaseDataMut, OwnerSlice, ViewSlice, ViewSliceMut};

/// Builds a [`Matrix`] from row literals.
///
/// ```
/// let m = coordmat::matrix![[1, 2], [3, 4]];
/// assert_eq!(m.dims(), (2, 2));
/// assert_eq!(m.at(1, 0), 3.0);
/// ```
#[macro_export]
macro_rules! matrix {
    ($([$($x:expr),* $(,)*]),+ $(,)*) => {{
        $crate::Matrix::from_rows(&[$([$($x as f64,)*],)*])
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matrix_strategy(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
        proptest::collection::vec(-100.0f64..100.0, rows * cols)
            .prop_map(move |data| Matrix::new(data, rows, cols))
    }

    fn any_matrix() -> impl Strategy<Value = Matrix> {
        (0usize..6, 0usize..6).prop_flat_map(|(r, c)| matrix_strategy(r, c))
    }

    fn close(a: &Matrix, b: &Matrix) -> bool {
        a.dims() == b.dims() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_zeros_sum(rows in 0usize..20, cols in 0usize..20) {
            prop_assert_eq!(Matrix::zeros(rows, cols).sum(), 0.0);
        }

        #[test]
        fn test_identity_symmetric(n in 0usize..12) {
            let id = Matrix::identity(n, n);
            prop_assert_eq!(id.t(), id.clone());
            prop_assert_eq!(id.sum(), n as f64);
        }

        #[test]
        fn test_transpose_twice(a in any_matrix()) {
            let mut t = Matrix::zeros(a.cols(), a.rows());
            t.transpose(&a);
            let mut back = Matrix::zeros(a.rows(), a.cols());
            back.transpose(&t);
            prop_assert_eq!(back, a);
        }

        #[test]
        fn test_unit_scale_invariant(
            a in matrix_strategy(3, 3),
            mantissa in 1.0f64..10.0,
            exp in -200i32..=200,
            neg in any::<bool>(),
        ) {
            prop_assume!(a.norm(2) > 1e-6);
            let c = mantissa * 10f64.powi(exp);
            let c = if neg { -c } else { c };
            let mut scaled = Matrix::zeros(3, 3);
            scaled.scale(c, &a);
            let mut u = Matrix::zeros(3, 3);
            u.unit(&scaled);
            let mut expected = Matrix::zeros(3, 3);
            expected.unit(&a);
            if neg {
                expected.scale_in_place(-1.0);
            }
            prop_assert!(close(&u, &expected));
        }

        #[test]
        fn test_delete_row_restack(a in (1usize..6, 1usize..4).prop_flat_map(|(r, c)| matrix_strategy(r, c))) {
            let (ar, ac) = a.dims();
            for i in 0..ar {
                let mut rest = Matrix::zeros(ar - 1, ac);
                rest.delete_row(&a, i);
                let mut head = Matrix::zeros(i + 1, ac);
                head.stack(&rest.view(0, 0, i, ac), &a.row_view(i));
                let mut back = Matrix::zeros(ar, ac);
                back.stack(&head, &rest.view(i, 0, ar - 1 - i, ac));
                prop_assert_eq!(&back, &a);
            }
        }

        #[test]
        fn test_multiply_by_identity(a in any_matrix()) {
            let mut f = Matrix::zeros(a.rows(), a.cols());
            f.multiply(&a, &Matrix::identity(a.cols(), a.cols()));
            prop_assert_eq!(f, a);
        }

        #[test]
        fn test_select_rows_safe_never_unwinds(
            a in matrix_strategy(4, 2),
            idx in proptest::collection::vec(0usize..8, 0..6),
        ) {
            let mut f = Matrix::zeros(idx.len(), 2);
            let r = f.select_rows_safe(&a, &idx);
            let valid = idx.len() <= 4 && idx.iter().all(|&k| k < 4);
            prop_assert_eq!(r.is_ok(), valid);
        }
    }

    #[test]
    fn test_row_view_alias_and_clone_copy() {
        let mut a = matrix![[1, 2, 3], [4, 5, 6]];
        {
            let mut v = a.row_view_mut(1);
            v.set(0, 0, 40.0);
        }
        assert_eq!(a.row(1), vec![40.0, 5.0, 6.0]);

        let mut c = Matrix::zeros(1, 3);
        c.copy_from(&a.row_view(1));
        c.set(0, 0, -1.0);
        assert_eq!(a.row(1), vec![40.0, 5.0, 6.0]);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            maybe(|| Matrix::new(vec![1.0; 5], 2, 3)),
            Err(MatrixError::InsufficientData { need: 6, got: 5 })
        );
        let m = Matrix::zeros(2, 2);
        assert!(matches!(
            maybe(|| m.at(0, 2)),
            Err(MatrixError::IndexOutOfRange { .. })
        ));
        assert_eq!(
            maybe(|| m.norm(1)),
            Err(MatrixError::UnsupportedNormOrder { order: 1 })
        );
        let mut u = Matrix::zeros(2, 2);
        assert_eq!(maybe(|| u.unit(&m)), Err(MatrixError::DegenerateNorm));
    }
}
