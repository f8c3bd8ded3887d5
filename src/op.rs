use crate::error::{fatal, MResult, MatrixError};
use crate::matrix::{Matrix, MatrixBase};
use crate::shape::{ensure_col_vector, ensure_dims, ensure_row_vector, transposed};
use crate::storage::{BaseData, BaseDataMut};

trait Map {
    fn f(&self, v: f64) -> f64;
}

trait Map2 {
    fn f(&self, a: f64, b: f64) -> f64;
}

struct Add;

impl Map2 for Add {
    #[inline]
    fn f(&self, a: f64, b: f64) -> f64 {
        a + b
    }
}

struct Sub;

impl Map2 for Sub {
    #[inline]
    fn f(&self, a: f64, b: f64) -> f64 {
        a - b
    }
}

struct Mul;

impl Map2 for Mul {
    #[inline]
    fn f(&self, a: f64, b: f64) -> f64 {
        a * b
    }
}

struct Shift(f64);

impl Map for Shift {
    #[inline]
    fn f(&self, v: f64) -> f64 {
        v + self.0
    }
}

struct Scale(f64);

impl Map for Scale {
    #[inline]
    fn f(&self, v: f64) -> f64 {
        v * self.0
    }
}

struct Pow(f64);

impl Map for Pow {
    #[inline]
    fn f(&self, v: f64) -> f64 {
        v.powf(self.0)
    }
}

// Divides by `norm = scale * rest` in two steps so neither factor overflows.
struct Normalize {
    scale: f64,
    rest: f64,
}

impl Map for Normalize {
    #[inline]
    fn f(&self, v: f64) -> f64 {
        v / self.scale / self.rest
    }
}

impl<S> MatrixBase<S>
where
    S: BaseData,
{
    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }

    pub fn try_dot<S2: BaseData>(&self, b: &MatrixBase<S2>) -> MResult<f64> {
        ensure_dims("dot", self.dims(), b.dims())?;
        Ok(self
            .row_iter()
            .zip(b.row_iter())
            .map(|(x, y)| x.iter().zip(y).map(|(p, q)| p * q).sum::<f64>())
            .sum())
    }

    /// Sum of the elementwise product with `b`. For row vectors this is the
    /// usual dot product.
    #[track_caller]
    pub fn dot<S2: BaseData>(&self, b: &MatrixBase<S2>) -> f64 {
        fatal(self.try_dot(b))
    }

    // The 2-norm as `scale * rest`, with `scale` the largest magnitude and
    // `rest` in `[1, sqrt(len)]`. Squaring `v / scale` keeps huge and tiny
    // elements representable.
    fn scaled_norm(&self) -> (f64, f64) {
        let scale = self
            .iter()
            .fold(0.0f64, |m, v| if m.is_nan() || v.is_nan() { f64::NAN } else { m.max(v.abs()) });
        if scale == 0.0 || !scale.is_finite() {
            return (scale, 1.0);
        }
        let rest = self
            .iter()
            .map(|v| {
                let x = v / scale;
                x * x
            })
            .sum::<f64>()
            .sqrt();
        (scale, rest)
    }

    pub fn try_norm(&self, order: i32) -> MResult<f64> {
        if order != 2 {
            return Err(MatrixError::UnsupportedNormOrder { order });
        }
        let (scale, rest) = self.scaled_norm();
        Ok(scale * rest)
    }

    /// Euclidean (Frobenius) norm. Any `order` other than 2 is rejected.
    #[track_caller]
    pub fn norm(&self, order: i32) -> f64 {
        fatal(self.try_norm(order))
    }

    pub fn t(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols(), self.rows());
        out.transpose(self);
        out
    }
}

impl<S> MatrixBase<S>
where
    S: BaseDataMut,
{
    fn try_map<S2: BaseData, M: Map>(
        &mut self,
        op: &'static str,
        m: &M,
        a: &MatrixBase<S2>,
    ) -> MResult<()> {
        ensure_dims(op, a.dims(), self.dims())?;
        for (d, s) in self.row_iter_mut().zip(a.row_iter()) {
            d.iter_mut().zip(s).for_each(|(x, y)| *x = m.f(*y));
        }
        Ok(())
    }

    fn map_in_place<M: Map>(&mut self, m: &M) {
        for r in self.row_iter_mut() {
            r.iter_mut().for_each(|x| *x = m.f(*x));
        }
    }

    fn try_map2<S2: BaseData, S3: BaseData, M: Map2>(
        &mut self,
        op: &'static str,
        m: &M,
        a: &MatrixBase<S2>,
        b: &MatrixBase<S3>,
    ) -> MResult<()> {
        ensure_dims(op, a.dims(), b.dims())?;
        ensure_dims(op, a.dims(), self.dims())?;
        for ((d, x), y) in self.row_iter_mut().zip(a.row_iter()).zip(b.row_iter()) {
            for ((o, p), q) in d.iter_mut().zip(x).zip(y) {
                *o = m.f(*p, *q);
            }
        }
        Ok(())
    }

    fn try_map2_in_place<S2: BaseData, M: Map2>(
        &mut self,
        op: &'static str,
        m: &M,
        b: &MatrixBase<S2>,
    ) -> MResult<()> {
        ensure_dims(op, self.dims(), b.dims())?;
        for (d, y) in self.row_iter_mut().zip(b.row_iter()) {
            d.iter_mut().zip(y).for_each(|(o, q)| *o = m.f(*o, *q));
        }
        Ok(())
    }

    // `row` (1 x cols) applied against every row of `a`.
    fn try_broadcast_row<S2: BaseData, S3: BaseData, M: Map2>(
        &mut self,
        op: &'static str,
        m: &M,
        a: &MatrixBase<S2>,
        row: &MatrixBase<S3>,
    ) -> MResult<()> {
        ensure_row_vector(op, a.cols(), row.dims())?;
        ensure_dims(op, a.dims(), self.dims())?;
        if row.is_empty() {
            return Ok(());
        }
        let r = row.row_slice(0);
        for (d, s) in self.row_iter_mut().zip(a.row_iter()) {
            for ((o, p), q) in d.iter_mut().zip(s).zip(r) {
                *o = m.f(*p, *q);
            }
        }
        Ok(())
    }

    // `col` (rows x 1) applied against every column of `a`.
    fn try_broadcast_col<S2: BaseData, S3: BaseData, M: Map2>(
        &mut self,
        op: &'static str,
        m: &M,
        a: &MatrixBase<S2>,
        col: &MatrixBase<S3>,
    ) -> MResult<()> {
        ensure_col_vector(op, a.rows(), col.dims())?;
        ensure_dims(op, a.dims(), self.dims())?;
        for ((d, s), c) in self.row_iter_mut().zip(a.row_iter()).zip(col.row_iter()) {
            d.iter_mut().zip(s).for_each(|(o, p)| *o = m.f(*p, c[0]));
        }
        Ok(())
    }

    fn try_broadcast_row_in_place<S2: BaseData, M: Map2>(
        &mut self,
        op: &'static str,
        m: &M,
        row: &MatrixBase<S2>,
    ) -> MResult<()> {
        ensure_row_vector(op, self.cols(), row.dims())?;
        if row.is_empty() {
            return Ok(());
        }
        let r = row.row_slice(0);
        for d in self.row_iter_mut() {
            d.iter_mut().zip(r).for_each(|(o, q)| *o = m.f(*o, *q));
        }
        Ok(())
    }

    fn try_broadcast_col_in_place<S2: BaseData, M: Map2>(
        &mut self,
        op: &'static str,
        m: &M,
        col: &MatrixBase<S2>,
    ) -> MResult<()> {
        ensure_col_vector(op, self.rows(), col.dims())?;
        for (d, c) in self.row_iter_mut().zip(col.row_iter()) {
            d.iter_mut().for_each(|o| *o = m.f(*o, c[0]));
        }
        Ok(())
    }

    #[track_caller]
    pub fn add<S2: BaseData, S3: BaseData>(&mut self, a: &MatrixBase<S2>, b: &MatrixBase<S3>) {
        fatal(self.try_map2("add", &Add, a, b))
    }

    #[track_caller]
    pub fn add_in_place<S2: BaseData>(&mut self, b: &MatrixBase<S2>) {
        fatal(self.try_map2_in_place("add", &Add, b))
    }

    #[track_caller]
    pub fn sub<S2: BaseData, S3: BaseData>(&mut self, a: &MatrixBase<S2>, b: &MatrixBase<S3>) {
        fatal(self.try_map2("sub", &Sub, a, b))
    }

    #[track_caller]
    pub fn sub_in_place<S2: BaseData>(&mut self, b: &MatrixBase<S2>) {
        fatal(self.try_map2_in_place("sub", &Sub, b))
    }

    #[track_caller]
    pub fn add_scalar<S2: BaseData>(&mut self, a: &MatrixBase<S2>, c: f64) {
        fatal(self.try_map("add_scalar", &Shift(c), a))
    }

    pub fn add_scalar_in_place(&mut self, c: f64) {
        self.map_in_place(&Shift(c))
    }

    /// Adds the row vector `row` to every row of `a`.
    #[track_caller]
    pub fn add_row<S2: BaseData, S3: BaseData>(&mut self, a: &MatrixBase<S2>, row: &MatrixBase<S3>) {
        fatal(self.try_broadcast_row("add_row", &Add, a, row))
    }

    #[track_caller]
    pub fn add_row_in_place<S2: BaseData>(&mut self, row: &MatrixBase<S2>) {
        fatal(self.try_broadcast_row_in_place("add_row", &Add, row))
    }

    /// Subtracts the row vector `row` from every row of `a`. `row` is only
    /// read.
    #[track_caller]
    pub fn sub_row<S2: BaseData, S3: BaseData>(&mut self, a: &MatrixBase<S2>, row: &MatrixBase<S3>) {
        fatal(self.try_broadcast_row("sub_row", &Sub, a, row))
    }

    #[track_caller]
    pub fn sub_row_in_place<S2: BaseData>(&mut self, row: &MatrixBase<S2>) {
        fatal(self.try_broadcast_row_in_place("sub_row", &Sub, row))
    }

    #[track_caller]
    pub fn mul_elem<S2: BaseData, S3: BaseData>(&mut self, a: &MatrixBase<S2>, b: &MatrixBase<S3>) {
        fatal(self.try_map2("mul_elem", &Mul, a, b))
    }

    #[track_caller]
    pub fn mul_elem_in_place<S2: BaseData>(&mut self, b: &MatrixBase<S2>) {
        fatal(self.try_map2_in_place("mul_elem", &Mul, b))
    }

    #[track_caller]
    pub fn scale<S2: BaseData>(&mut self, c: f64, a: &MatrixBase<S2>) {
        fatal(self.try_map("scale", &Scale(c), a))
    }

    pub fn scale_in_place(&mut self, c: f64) {
        self.map_in_place(&Scale(c))
    }

    /// Multiplies column `j` of `a` elementwise by the column vector `col`,
    /// for every `j`.
    #[track_caller]
    pub fn scale_by_col<S2: BaseData, S3: BaseData>(
        &mut self,
        a: &MatrixBase<S2>,
        col: &MatrixBase<S3>,
    ) {
        fatal(self.try_broadcast_col("scale_by_col", &Mul, a, col))
    }

    #[track_caller]
    pub fn scale_by_col_in_place<S2: BaseData>(&mut self, col: &MatrixBase<S2>) {
        fatal(self.try_broadcast_col_in_place("scale_by_col", &Mul, col))
    }

    /// Multiplies row `i` of `a` elementwise by the row vector `row`, for
    /// every `i`.
    #[track_caller]
    pub fn scale_by_row<S2: BaseData, S3: BaseData>(
        &mut self,
        a: &MatrixBase<S2>,
        row: &MatrixBase<S3>,
    ) {
        fatal(self.try_broadcast_row("scale_by_row", &Mul, a, row))
    }

    #[track_caller]
    pub fn scale_by_row_in_place<S2: BaseData>(&mut self, row: &MatrixBase<S2>) {
        fatal(self.try_broadcast_row_in_place("scale_by_row", &Mul, row))
    }

    #[track_caller]
    pub fn pow<S2: BaseData>(&mut self, a: &MatrixBase<S2>, exp: f64) {
        fatal(self.try_map("pow", &Pow(exp), a))
    }

    pub fn pow_in_place(&mut self, exp: f64) {
        self.map_in_place(&Pow(exp))
    }

    fn try_transpose<S2: BaseData>(&mut self, a: &MatrixBase<S2>) -> MResult<()> {
        ensure_dims("transpose", transposed(a.dims()), self.dims())?;
        for (i, row) in a.row_iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                self.row_slice_mut(j)[i] = *v;
            }
        }
        Ok(())
    }

    /// `self = aᵀ`. `self` must already have `a`'s dimensions reversed.
    #[track_caller]
    pub fn transpose<S2: BaseData>(&mut self, a: &MatrixBase<S2>) {
        fatal(self.try_transpose(a))
    }

    fn unit_factor<S2: BaseData>(a: &MatrixBase<S2>) -> MResult<Normalize> {
        let (scale, rest) = a.scaled_norm();
        if scale == 0.0 || !scale.is_finite() || !rest.is_finite() {
            return Err(MatrixError::DegenerateNorm);
        }
        Ok(Normalize { scale, rest })
    }

    pub fn try_unit<S2: BaseData>(&mut self, a: &MatrixBase<S2>) -> MResult<()> {
        ensure_dims("unit", a.dims(), self.dims())?;
        let k = Self::unit_factor(a)?;
        self.try_map("unit", &k, a)
    }

    /// `self = a / ‖a‖₂`. A zero norm raises [`MatrixError::DegenerateNorm`].
    #[track_caller]
    pub fn unit<S2: BaseData>(&mut self, a: &MatrixBase<S2>) {
        fatal(self.try_unit(a))
    }

    #[track_caller]
    pub fn unit_in_place(&mut self) {
        let k = fatal(Self::unit_factor(self));
        self.map_in_place(&k)
    }
}

macro_rules! impl_binary_op {
    ($trt:ident, $mth:ident) => {
        impl<S, S2> std::ops::$trt<&MatrixBase<S2>> for &MatrixBase<S>
        where
            S: BaseData,
            S2: BaseData,
        {
            type Output = Matrix;

            #[track_caller]
            fn $mth(self, rhs: &MatrixBase<S2>) -> Matrix {
                let mut out = Matrix::zeros(self.rows(), self.cols());
                Matrix::$mth(&mut out, self, rhs);
                out
            }
        }
    };
}

impl_binary_op!(Add, add); // +
impl_binary_op!(Sub, sub); // -

impl<S> std::ops::Mul<f64> for &MatrixBase<S>
where
    S: BaseData,
{
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Matrix {
        let mut out = self.to_owned();
        out.scale_in_place(rhs);
        out
    }
}

impl<S> std::ops::Neg for &MatrixBase<S>
where
    S: BaseData,
{
    type Output = Matrix;

    fn neg(self) -> Matrix {
        self * -1.0
    }
}
