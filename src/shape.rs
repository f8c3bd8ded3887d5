use super::error::{MResult, MatrixError};

/// `(rows, cols)`.
pub type Dims = (usize, usize);

#[inline]
pub(crate) fn elem_count(d: Dims) -> usize {
    d.0 * d.1
}

#[inline]
pub(crate) fn transposed(d: Dims) -> Dims {
    (d.1, d.0)
}

#[inline]
pub(crate) fn ensure_dims(op: &'static str, expected: Dims, got: Dims) -> MResult<()> {
    if expected != got {
        return Err(MatrixError::shape(op, expected, got));
    }
    Ok(())
}

#[inline]
pub(crate) fn ensure_index(op: &'static str, index: usize, bound: usize) -> MResult<()> {
    if index >= bound {
        return Err(MatrixError::index(op, index, bound));
    }
    Ok(())
}

// A window must fit inside its parent's extent.
pub(crate) fn ensure_window(
    op: &'static str,
    parent: Dims,
    offset: Dims,
    window: Dims,
) -> MResult<()> {
    let fits = |o: usize, n: usize, bound: usize| o.checked_add(n).map_or(false, |e| e <= bound);
    if !fits(offset.0, window.0, parent.0) || !fits(offset.1, window.1, parent.1) {
        return Err(MatrixError::shape(
            op,
            parent,
            (offset.0.saturating_add(window.0), offset.1.saturating_add(window.1)),
        ));
    }
    Ok(())
}

/// A single-row matrix spanning `cols` columns.
#[inline]
pub(crate) fn ensure_row_vector(op: &'static str, cols: usize, got: Dims) -> MResult<()> {
    ensure_dims(op, (1, cols), got)
}

/// A single-column matrix spanning `rows` rows.
#[inline]
pub(crate) fn ensure_col_vector(op: &'static str, rows: usize, got: Dims) -> MResult<()> {
    ensure_dims(op, (rows, 1), got)
}
