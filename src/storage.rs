/// Backing buffer of a matrix, addressed row-major.
pub trait BaseData {
    fn as_slice(&self) -> &[f64];

    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// Storage that can be written through.
pub trait BaseDataMut: BaseData {
    fn as_slice_mut(&mut self) -> &mut [f64];
}

/// Exclusively owned storage.
#[derive(Clone, Debug, Default)]
pub struct OwnerSlice {
    data: Vec<f64>,
}

impl OwnerSlice {
    pub(crate) fn from(v: Vec<f64>) -> Self {
        Self { data: v }
    }

    pub(crate) fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

impl BaseData for OwnerSlice {
    fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl BaseDataMut for OwnerSlice {
    fn as_slice_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Read-only window into another matrix's buffer.
#[derive(Clone, Copy, Debug)]
pub struct ViewSlice<'a> {
    data: &'a [f64],
}

impl<'a> ViewSlice<'a> {
    pub(crate) fn new(data: &'a [f64]) -> Self {
        Self { data }
    }
}

impl BaseData for ViewSlice<'_> {
    fn as_slice(&self) -> &[f64] {
        self.data
    }
}

/// Writable window into another matrix's buffer. Writes land in the parent.
#[derive(Debug)]
pub struct ViewSliceMut<'a> {
    data: &'a mut [f64],
}

impl<'a> ViewSliceMut<'a> {
    pub(crate) fn new(data: &'a mut [f64]) -> Self {
        Self { data }
    }
}

impl BaseData for ViewSliceMut<'_> {
    fn as_slice(&self) -> &[f64] {
        &*self.data
    }
}

impl BaseDataMut for ViewSliceMut<'_> {
    fn as_slice_mut(&mut self) -> &mut [f64] {
        &mut *self.data
    }
}

/// Length of the buffer a `rows x cols` window with row `stride` spans.
#[inline]
pub(crate) fn span(rows: usize, cols: usize, stride: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1) * stride + cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span() {
        assert_eq!(span(0, 3, 3), 0);
        assert_eq!(span(3, 0, 3), 0);
        assert_eq!(span(2, 2, 3), 5);
        assert_eq!(span(1, 3, 10), 3);
    }

    #[test]
    fn test_view_writes_parent() {
        let mut owner = OwnerSlice::from(vec![1.0, 2.0, 3.0]);
        {
            let mut v = ViewSliceMut::new(&mut owner.as_slice_mut()[1..]);
            v.as_slice_mut()[0] = 20.0;
            assert_eq!(v.len(), 2);
        }
        assert_eq!(owner.into_vec(), vec![1.0, 20.0, 3.0]);
    }
}
