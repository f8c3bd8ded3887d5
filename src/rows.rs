//! Structural operations. All of them copy values; none of the results alias
//! their sources.

use crate::error::{fatal, MResult, MatrixError};
use crate::matrix::{Matrix, MatrixBase};
use crate::shape::{ensure_dims, ensure_index, ensure_window};
use crate::storage::{BaseData, BaseDataMut};

impl<S> MatrixBase<S>
where
    S: BaseData,
{
    /// Owned copy of the `rows x cols` block starting at `(i, j)`.
    #[track_caller]
    pub fn sub_matrix(&self, i: usize, j: usize, rows: usize, cols: usize) -> Matrix {
        fatal(ensure_window("sub_matrix", self.dims(), (i, j), (rows, cols)));
        self.view(i, j, rows, cols).to_owned()
    }
}

impl<S> MatrixBase<S>
where
    S: BaseDataMut,
{
    pub(crate) fn try_copy_from<S2: BaseData>(&mut self, src: &MatrixBase<S2>) -> MResult<()> {
        ensure_dims("copy_from", self.dims(), src.dims())?;
        self.row_iter_mut()
            .zip(src.row_iter())
            .for_each(|(d, s)| d.copy_from_slice(s));
        Ok(())
    }

    /// Copies every element of `src` into this matrix. Dimensions must match.
    #[track_caller]
    pub fn copy_from<S2: BaseData>(&mut self, src: &MatrixBase<S2>) {
        fatal(self.try_copy_from(src))
    }

    fn try_delete_row<S2: BaseData>(&mut self, src: &MatrixBase<S2>, i: usize) -> MResult<()> {
        let (ar, ac) = src.dims();
        ensure_index("delete_row", i, ar)?;
        ensure_dims("delete_row", (ar - 1, ac), self.dims())?;
        // rows before i, then rows after i shifted up by one
        self.try_view_mut(0, 0, i, ac)?
            .try_copy_from(&src.try_view(0, 0, i, ac)?)?;
        self.try_view_mut(i, 0, ar - i - 1, ac)?
            .try_copy_from(&src.try_view(i + 1, 0, ar - i - 1, ac)?)
    }

    /// Puts every row of `src` except row `i` into this matrix, which must
    /// have one row less than `src`.
    #[track_caller]
    pub fn delete_row<S2: BaseData>(&mut self, src: &MatrixBase<S2>, i: usize) {
        fatal(self.try_delete_row(src, i))
    }

    pub fn delete_row_safe<S2: BaseData>(&mut self, src: &MatrixBase<S2>, i: usize) -> MResult<()> {
        self.try_delete_row(src, i)
    }

    fn try_select_rows<S2: BaseData>(&mut self, src: &MatrixBase<S2>, idx: &[usize]) -> MResult<()> {
        let (ar, ac) = src.dims();
        ensure_dims("select_rows", (idx.len(), ac), self.dims())?;
        if idx.len() > ar {
            return Err(MatrixError::shape("select_rows", (ar, ac), (idx.len(), ac)));
        }
        for &k in idx {
            ensure_index("select_rows", k, ar)?;
        }
        self.row_iter_mut()
            .zip(idx)
            .for_each(|(d, &k)| d.copy_from_slice(src.row_slice(k)));
        Ok(())
    }

    /// Row `k` of this matrix becomes row `idx[k]` of `src`. Indices may
    /// repeat and come in any order.
    #[track_caller]
    pub fn select_rows<S2: BaseData>(&mut self, src: &MatrixBase<S2>, idx: &[usize]) {
        fatal(self.try_select_rows(src, idx))
    }

    /// Same as [`select_rows`](Self::select_rows) but returns the error
    /// instead of raising it. Nothing is written on failure and nothing
    /// unwinds.
    pub fn select_rows_safe<S2: BaseData>(
        &mut self,
        src: &MatrixBase<S2>,
        idx: &[usize],
    ) -> MResult<()> {
        self.try_select_rows(src, idx)
    }

    fn try_scatter_rows<S2: BaseData>(&mut self, src: &MatrixBase<S2>, idx: &[usize]) -> MResult<()> {
        let (ar, ac) = src.dims();
        let (fr, fc) = self.dims();
        if fc != ac || idx.len() > ar {
            return Err(MatrixError::shape("scatter_rows", (ar, ac), (idx.len(), fc)));
        }
        for &k in idx {
            ensure_index("scatter_rows", k, fr)?;
        }
        for (k, &dst) in idx.iter().enumerate() {
            self.row_slice_mut(dst).copy_from_slice(src.row_slice(k));
        }
        Ok(())
    }

    /// Inverse of [`select_rows`](Self::select_rows): row `k` of `src` is
    /// written to row `idx[k]` of this matrix.
    #[track_caller]
    pub fn scatter_rows<S2: BaseData>(&mut self, src: &MatrixBase<S2>, idx: &[usize]) {
        fatal(self.try_scatter_rows(src, idx))
    }

    pub fn scatter_rows_safe<S2: BaseData>(
        &mut self,
        src: &MatrixBase<S2>,
        idx: &[usize],
    ) -> MResult<()> {
        self.try_scatter_rows(src, idx)
    }

    fn try_stack<S2: BaseData, S3: BaseData>(
        &mut self,
        top: &MatrixBase<S2>,
        bottom: &MatrixBase<S3>,
    ) -> MResult<()> {
        let (tr, tc) = top.dims();
        let (br, bc) = bottom.dims();
        ensure_dims("stack", (br, tc), (br, bc))?;
        ensure_dims("stack", (tr + br, tc), self.dims())?;
        self.try_view_mut(0, 0, tr, tc)?.try_copy_from(top)?;
        self.try_view_mut(tr, 0, br, tc)?.try_copy_from(bottom)
    }

    /// Puts `top` above `bottom`.
    #[track_caller]
    pub fn stack<S2: BaseData, S3: BaseData>(&mut self, top: &MatrixBase<S2>, bottom: &MatrixBase<S3>) {
        fatal(self.try_stack(top, bottom))
    }

    pub fn stack_safe<S2: BaseData, S3: BaseData>(
        &mut self,
        top: &MatrixBase<S2>,
        bottom: &MatrixBase<S3>,
    ) -> MResult<()> {
        self.try_stack(top, bottom)
    }
}
