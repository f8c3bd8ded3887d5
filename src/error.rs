use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

pub type MResult<T> = Result<T, MatrixError>;

/// Every condition a matrix operation can fail with.
///
/// The set is closed: [`maybe`] only converts these back into values, anything
/// else that unwinds through it keeps unwinding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("{op}: dimension mismatch, expected {expected:?} got {got:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("{op}: index {index} out of range for bound {bound}")]
    IndexOutOfRange {
        op: &'static str,
        index: usize,
        bound: usize,
    },
    #[error("not enough elements: need {need} got {got}")]
    InsufficientData { need: usize, got: usize },
    #[error("invalid norm order {order}, only the 2-norm is implemented")]
    UnsupportedNormOrder { order: i32 },
    #[error("cannot normalize a matrix with zero or non-finite norm")]
    DegenerateNorm,
}

impl MatrixError {
    pub(crate) fn shape(op: &'static str, expected: (usize, usize), got: (usize, usize)) -> Self {
        MatrixError::ShapeMismatch { op, expected, got }
    }

    pub(crate) fn index(op: &'static str, index: usize, bound: usize) -> Self {
        MatrixError::IndexOutOfRange { op, index, bound }
    }
}

impl From<MatrixError> for String {
    fn from(e: MatrixError) -> Self {
        format!("{}", e)
    }
}

/// Aborts the current operation with `err` as the unwind payload.
#[cold]
#[track_caller]
pub(crate) fn raise(err: MatrixError) -> ! {
    tracing::debug!(error = %err, "matrix operation failed");
    panic::panic_any(err)
}

/// Unwraps a checked result, raising the error on failure.
#[inline]
#[track_caller]
pub(crate) fn fatal<T>(r: MResult<T>) -> T {
    match r {
        Ok(v) => v,
        Err(e) => raise(e),
    }
}

/// Runs `f` and turns a raised [`MatrixError`] into `Err`.
///
/// Panics whose payload is not a `MatrixError` are resumed untouched.
pub fn maybe<T, F>(f: F) -> MResult<T>
where
    F: FnOnce() -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => Ok(v),
        Err(payload) => match payload.downcast::<MatrixError>() {
            Ok(err) => Err(*err),
            Err(other) => panic::resume_unwind(other),
        },
    }
}
