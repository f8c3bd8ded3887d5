use std::fmt;
use std::ops::{Index, IndexMut, Range};

use crate::error::{fatal, raise, MResult, MatrixError};
use crate::shape::{elem_count, ensure_index, ensure_window, Dims};
use crate::storage::{span, BaseData, BaseDataMut, OwnerSlice, ViewSlice, ViewSliceMut};

/// Dense row-major matrix of `f64`, generic over where its elements live.
///
/// `stride` is the distance between the first elements of two consecutive
/// rows. It equals `cols` for owned storage and is inherited from the parent
/// for views.
#[derive(Clone)]
pub struct MatrixBase<S> {
    pub(crate) data: S,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) stride: usize,
}

pub type Matrix = MatrixBase<OwnerSlice>;

/// Read-only window into another matrix.
pub type MatrixView<'a> = MatrixBase<ViewSlice<'a>>;

/// Writable window into another matrix. Writes mutate the parent in place.
pub type MatrixViewMut<'a> = MatrixBase<ViewSliceMut<'a>>;

impl Matrix {
    /// Wraps the first `rows * cols` elements of `data` as row-major storage.
    ///
    /// Raises [`MatrixError::InsufficientData`] when `data` is too short.
    #[track_caller]
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        fatal(Self::try_new(data, rows, cols))
    }

    pub fn try_new(mut data: Vec<f64>, rows: usize, cols: usize) -> MResult<Self> {
        let need = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if data.len() < need {
            return Err(MatrixError::InsufficientData {
                need,
                got: data.len(),
            });
        }
        data.truncate(need);
        Ok(Self::from_vec(data, rows, cols))
    }

    pub(crate) fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self {
            data: OwnerSlice::from(data),
            rows,
            cols,
            stride: cols,
        }
    }

    pub fn empty() -> Self {
        Self::from_vec(Vec::new(), 0, 0)
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_elem(0.0, rows, cols)
    }

    pub fn from_elem(v: f64, rows: usize, cols: usize) -> Self {
        Self::from_vec(vec![v; elem_count((rows, cols))], rows, cols)
    }

    /// Ones on the main diagonal, also for non-square shapes.
    pub fn identity(rows: usize, cols: usize) -> Self {
        let mut m = Self::zeros(rows, cols);
        for i in 0..rows.min(cols) {
            m.data.as_slice_mut()[i * cols + i] = 1.0;
        }
        m
    }

    pub fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Self {
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_vec(data, rows.len(), N)
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data.into_vec()
    }
}

impl<S> MatrixBase<S>
where
    S: BaseData,
{
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> Dims {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        elem_count(self.dims())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        i * self.stride + j
    }

    fn check_elem(&self, op: &'static str, i: usize, j: usize) -> MResult<usize> {
        ensure_index(op, i, self.rows)?;
        ensure_index(op, j, self.cols)?;
        Ok(self.offset(i, j))
    }

    pub fn try_at(&self, i: usize, j: usize) -> MResult<f64> {
        let k = self.check_elem("at", i, j)?;
        Ok(self.data.as_slice()[k])
    }

    #[track_caller]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        fatal(self.try_at(i, j))
    }

    // Row `i` without a bounds check on `i`; callers validate first.
    #[inline]
    pub(crate) fn row_slice(&self, i: usize) -> &[f64] {
        let start = i * self.stride;
        &self.data.as_slice()[start..start + self.cols]
    }

    pub(crate) fn row_iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| self.row_slice(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.row_iter().flat_map(|r| r.iter().copied())
    }

    #[track_caller]
    pub fn row(&self, i: usize) -> Vec<f64> {
        fatal(ensure_index("row", i, self.rows));
        self.row_slice(i).to_vec()
    }

    #[track_caller]
    pub fn col(&self, j: usize) -> Vec<f64> {
        fatal(ensure_index("col", j, self.cols));
        self.row_iter().map(|r| r[j]).collect()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    pub fn to_owned(&self) -> Matrix {
        Matrix::from_vec(self.to_vec(), self.rows, self.cols)
    }

    fn window(&self, offset: Dims, window: Dims) -> (Range<usize>, usize) {
        let len = span(window.0, window.1, self.stride);
        if len == 0 {
            return (0..0, 0);
        }
        let start = self.offset(offset.0, offset.1);
        (start..start + len, self.stride)
    }

    pub fn try_view(&self, i: usize, j: usize, rows: usize, cols: usize) -> MResult<MatrixView<'_>> {
        ensure_window("view", self.dims(), (i, j), (rows, cols))?;
        let (range, stride) = self.window((i, j), (rows, cols));
        Ok(MatrixBase {
            data: ViewSlice::new(&self.data.as_slice()[range]),
            rows,
            cols,
            stride,
        })
    }

    /// Window of `rows x cols` starting at `(i, j)`, sharing this matrix's
    /// storage.
    #[track_caller]
    pub fn view(&self, i: usize, j: usize, rows: usize, cols: usize) -> MatrixView<'_> {
        fatal(self.try_view(i, j, rows, cols))
    }

    pub fn as_view(&self) -> MatrixView<'_> {
        self.view(0, 0, self.rows, self.cols)
    }

    #[track_caller]
    pub fn row_view(&self, i: usize) -> MatrixView<'_> {
        self.view(i, 0, 1, self.cols)
    }

    #[track_caller]
    pub fn col_view(&self, j: usize) -> MatrixView<'_> {
        self.view(0, j, self.rows, 1)
    }
}

impl<S> MatrixBase<S>
where
    S: BaseDataMut,
{
    pub fn try_set(&mut self, i: usize, j: usize, v: f64) -> MResult<()> {
        let k = self.check_elem("set", i, j)?;
        self.data.as_slice_mut()[k] = v;
        Ok(())
    }

    #[track_caller]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        fatal(self.try_set(i, j, v))
    }

    #[inline]
    pub(crate) fn row_slice_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.stride;
        let cols = self.cols;
        &mut self.data.as_slice_mut()[start..start + cols]
    }

    /// Disjoint mutable rows. Yields nothing when the matrix has no elements.
    pub(crate) fn row_iter_mut(&mut self) -> impl Iterator<Item = &mut [f64]> + '_ {
        let (rows, cols, stride) = (self.rows, self.cols, self.stride.max(1));
        self.data
            .as_slice_mut()
            .chunks_mut(stride)
            .take(rows)
            .map(move |c| &mut c[..cols])
    }

    pub fn fill(&mut self, v: f64) {
        self.row_iter_mut().for_each(|r| r.fill(v));
    }

    pub fn try_view_mut(
        &mut self,
        i: usize,
        j: usize,
        rows: usize,
        cols: usize,
    ) -> MResult<MatrixViewMut<'_>> {
        ensure_window("view_mut", self.dims(), (i, j), (rows, cols))?;
        let (range, stride) = self.window((i, j), (rows, cols));
        Ok(MatrixBase {
            data: ViewSliceMut::new(&mut self.data.as_slice_mut()[range]),
            rows,
            cols,
            stride,
        })
    }

    #[track_caller]
    pub fn view_mut(&mut self, i: usize, j: usize, rows: usize, cols: usize) -> MatrixViewMut<'_> {
        fatal(self.try_view_mut(i, j, rows, cols))
    }

    pub fn as_view_mut(&mut self) -> MatrixViewMut<'_> {
        let (rows, cols) = self.dims();
        self.view_mut(0, 0, rows, cols)
    }

    #[track_caller]
    pub fn row_view_mut(&mut self, i: usize) -> MatrixViewMut<'_> {
        let cols = self.cols;
        self.view_mut(i, 0, 1, cols)
    }

    #[track_caller]
    pub fn col_view_mut(&mut self, j: usize) -> MatrixViewMut<'_> {
        let rows = self.rows;
        self.view_mut(0, j, rows, 1)
    }
}

impl<S> Index<(usize, usize)> for MatrixBase<S>
where
    S: BaseData,
{
    type Output = f64;

    #[track_caller]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        match self.check_elem("index", i, j) {
            Ok(k) => &self.data.as_slice()[k],
            Err(e) => raise(e),
        }
    }
}

impl<S> IndexMut<(usize, usize)> for MatrixBase<S>
where
    S: BaseDataMut,
{
    #[track_caller]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        match self.check_elem("index", i, j) {
            Ok(k) => &mut self.data.as_slice_mut()[k],
            Err(e) => raise(e),
        }
    }
}

impl<S, S2> PartialEq<MatrixBase<S2>> for MatrixBase<S>
where
    S: BaseData,
    S2: BaseData,
{
    fn eq(&self, other: &MatrixBase<S2>) -> bool {
        self.dims() == other.dims() && self.row_iter().zip(other.row_iter()).all(|(a, b)| a == b)
    }
}

impl<S> fmt::Display for MatrixBase<S>
where
    S: BaseData,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.row_iter().enumerate() {
            if i > 0 {
                f.write_str(",\n ")?;
            }
            f.write_str("[")?;
            for (j, v) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{:?}", v)?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}

impl<S> fmt::Debug for MatrixBase<S>
where
    S: BaseData,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix({}x{}) {}", self.rows, self.cols, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::maybe;
    use crate::matrix;

    #[test]
    fn test_new() {
        let m = Matrix::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], 2, 3);
        assert_eq!(m.dims(), (2, 3));
        assert_eq!(m.at(1, 2), 6.0);
        assert_eq!(m.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_new_insufficient_data() {
        let r = maybe(|| Matrix::new(vec![1.0, 2.0], 2, 2));
        assert_eq!(r, Err(MatrixError::InsufficientData { need: 4, got: 2 }));
        assert!(Matrix::try_new(vec![0.0; 3], 2, 2).is_err());
    }

    #[test]
    #[should_panic]
    fn test_new_insufficient_data_is_fatal() {
        Matrix::new(vec![1.0], 1, 2);
    }

    #[test]
    fn test_empty() {
        let m = Matrix::empty();
        assert_eq!(m.dims(), (0, 0));
        assert!(m.is_empty());
        assert_eq!(m.to_vec(), Vec::<f64>::new());
        assert!(Matrix::zeros(3, 0).is_empty());
    }

    #[test]
    fn test_identity_rectangular() {
        let m = Matrix::identity(2, 3);
        assert_eq!(m, matrix![[1, 0, 0], [0, 1, 0]]);
        let m = Matrix::identity(3, 2);
        assert_eq!(m, matrix![[1, 0], [0, 1], [0, 0]]);
    }

    #[test]
    fn test_at_out_of_range() {
        let m = Matrix::zeros(2, 2);
        assert_eq!(
            maybe(|| m.at(2, 0)),
            Err(MatrixError::index("at", 2, 2))
        );
        assert_eq!(
            maybe(|| m.at(0, 5)),
            Err(MatrixError::index("at", 5, 2))
        );
        assert!(m.try_at(1, 1).is_ok());
    }

    #[test]
    fn test_set_and_index() {
        let mut m = Matrix::zeros(2, 2);
        m.set(0, 1, 3.0);
        m[(1, 0)] = 4.0;
        assert_eq!(m[(0, 1)], 3.0);
        assert_eq!(m.at(1, 0), 4.0);
        assert!(m.try_set(2, 0, 1.0).is_err());
    }

    #[test]
    fn test_row_col() {
        let m = matrix![[1, 2, 3], [4, 5, 6]];
        assert_eq!(m.row(1), vec![4.0, 5.0, 6.0]);
        assert_eq!(m.col(2), vec![3.0, 6.0]);
        assert!(maybe(|| m.row(2)).is_err());
        assert!(maybe(|| m.col(3)).is_err());
    }

    #[test]
    fn test_view_shares_storage() {
        let mut m = matrix![[1, 2, 3], [4, 5, 6], [7, 8, 9]];
        {
            let v = m.view(1, 1, 2, 2);
            assert_eq!(v, matrix![[5, 6], [8, 9]]);
            assert_eq!(v.row_view(1).to_vec(), vec![8.0, 9.0]);
        }
        {
            let mut v = m.view_mut(1, 1, 2, 2);
            v.set(0, 0, 50.0);
            v.col_view_mut(1).fill(0.0);
        }
        assert_eq!(m, matrix![[1, 2, 3], [4, 50, 0], [7, 8, 0]]);
    }

    #[test]
    fn test_row_view_mut_aliases_parent() {
        let mut m = matrix![[1, 2], [3, 4]];
        m.row_view_mut(1).set(0, 1, 40.0);
        assert_eq!(m.at(1, 1), 40.0);

        let mut copy = m.row_view(0).to_owned();
        copy.set(0, 0, 100.0);
        assert_eq!(m.at(0, 0), 1.0);
    }

    #[test]
    fn test_view_out_of_extent() {
        let m = Matrix::zeros(3, 3);
        assert!(matches!(
            m.try_view(2, 0, 2, 3),
            Err(MatrixError::ShapeMismatch { .. })
        ));
        assert!(maybe(|| m.col_view(3).dims()).is_err());
        // empty windows at the edge are fine
        assert_eq!(m.view(3, 0, 0, 3).dims(), (0, 3));
        assert_eq!(m.view(0, 3, 3, 0).row_iter().count(), 3);
    }

    #[test]
    fn test_view_of_view() {
        let m = Matrix::new((0..16).map(f64::from).collect(), 4, 4);
        let v = m.view(1, 1, 3, 3);
        let w = v.view(1, 1, 2, 2);
        assert_eq!(w, matrix![[10, 11], [14, 15]]);
        assert_eq!(w.col(0), vec![10.0, 14.0]);
    }

    #[test]
    fn test_fmt() {
        let m = matrix![[1, 2], [3, 4]];
        assert_eq!(format!("{}", m), "[[1.0, 2.0],\n [3.0, 4.0]]");
        assert!(format!("{:?}", m).starts_with("Matrix(2x2)"));
    }
}
