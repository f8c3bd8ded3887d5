use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tracing::{debug, instrument, trace, warn};

use crate::error::{fatal, MResult, MatrixError};
use crate::matrix::{Matrix, MatrixBase};
use crate::shape::ensure_dims;
use crate::storage::{BaseData, BaseDataMut};

pub const DEFAULT_WORKERS: usize = 2;

pub const MAX_WORKERS: usize = 16;

/// Settings of the row-parallel multiply kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulConfig {
    workers: usize,
}

impl Default for MulConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl MulConfig {
    /// `workers` is clamped to `1..=MAX_WORKERS`.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    /// One worker per logical CPU, up to `MAX_WORKERS`.
    pub fn available() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

/// Worker pools, one per worker count, built on first use.
static POOLS: OnceLock<RwLock<HashMap<usize, Arc<ThreadPool>>>> = OnceLock::new();

fn pools() -> &'static RwLock<HashMap<usize, Arc<ThreadPool>>> {
    POOLS.get_or_init(|| RwLock::new(HashMap::new()))
}

fn pool(workers: usize) -> Result<Arc<ThreadPool>, ThreadPoolBuildError> {
    if let Some(p) = pools()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&workers)
    {
        return Ok(Arc::clone(p));
    }
    let mut map = pools().write().unwrap_or_else(PoisonError::into_inner);
    if let Some(p) = map.get(&workers) {
        return Ok(Arc::clone(p));
    }
    let p = Arc::new(
        ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("coordmat-mul-{}/{}", i, workers))
            .build()?,
    );
    debug!(workers, "multiply pool started");
    map.insert(workers, Arc::clone(&p));
    Ok(p)
}

type RowJob<'a> = (usize, &'a mut [f64]);

// Row `i` of `a * b`, accumulated into `sums`.
#[inline]
fn dot_row<S2, S3>(a: &MatrixBase<S2>, b: &MatrixBase<S3>, i: usize, sums: &mut [f64])
where
    S2: BaseData,
    S3: BaseData,
{
    sums.fill(0.0);
    for (k, &aik) in a.row_slice(i).iter().enumerate() {
        for (s, &bkj) in sums.iter_mut().zip(b.row_slice(k)) {
            *s += aik * bkj;
        }
    }
}

fn worker<S2, S3>(a: &MatrixBase<S2>, b: &MatrixBase<S3>, queue: &Mutex<Receiver<RowJob<'_>>>)
where
    S2: BaseData,
    S3: BaseData,
{
    let mut sums = vec![0.0; b.cols()];
    loop {
        // the lock is released before the row is computed
        let job = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        match job {
            Ok((i, row)) => {
                dot_row(a, b, i, &mut sums);
                row.copy_from_slice(&sums);
            }
            Err(_) => return,
        }
    }
}

impl<S> MatrixBase<S>
where
    S: BaseDataMut,
{
    #[instrument(level = "trace", skip_all, fields(a = ?a.dims(), b = ?b.dims(), workers = cfg.workers))]
    fn try_multiply<S2, S3>(
        &mut self,
        a: &MatrixBase<S2>,
        b: &MatrixBase<S3>,
        cfg: MulConfig,
    ) -> MResult<()>
    where
        S2: BaseData + Sync,
        S3: BaseData + Sync,
    {
        let (ar, ac) = a.dims();
        let (br, bc) = b.dims();
        if ac != br {
            return Err(MatrixError::shape("multiply", (ac, bc), (br, bc)));
        }
        ensure_dims("multiply", (ar, bc), self.dims())?;
        if self.is_empty() {
            return Ok(());
        }

        let rows: Vec<&mut [f64]> = self.row_iter_mut().collect();
        let workers = cfg.workers();
        let pool = match pool(workers) {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "worker pool unavailable, multiplying on the calling thread");
                let mut sums = vec![0.0; bc];
                for (i, row) in rows.into_iter().enumerate() {
                    dot_row(a, b, i, &mut sums);
                    row.copy_from_slice(&sums);
                }
                return Ok(());
            }
        };

        let (tx, rx) = sync_channel::<RowJob<'_>>(0);
        let queue = Mutex::new(rx);
        // returns once every spawned worker has drained the queue and exited
        pool.in_place_scope(|s| {
            for _ in 0..workers {
                let queue = &queue;
                s.spawn(move |_| worker(a, b, queue));
            }
            for job in rows.into_iter().enumerate() {
                if tx.send(job).is_err() {
                    break;
                }
            }
            drop(tx);
        });
        trace!(rows = ar, "multiply done");
        Ok(())
    }

    /// `self = a * b`, with rows computed in parallel by
    /// [`DEFAULT_WORKERS`] workers.
    ///
    /// `a.cols()` must equal `b.rows()` and `self` must be
    /// `a.rows() x b.cols()`. The call returns after every row is written.
    #[track_caller]
    pub fn multiply<S2, S3>(&mut self, a: &MatrixBase<S2>, b: &MatrixBase<S3>)
    where
        S2: BaseData + Sync,
        S3: BaseData + Sync,
    {
        fatal(self.try_multiply(a, b, MulConfig::default()))
    }

    #[track_caller]
    pub fn multiply_with<S2, S3>(&mut self, a: &MatrixBase<S2>, b: &MatrixBase<S3>, cfg: MulConfig)
    where
        S2: BaseData + Sync,
        S3: BaseData + Sync,
    {
        fatal(self.try_multiply(a, b, cfg))
    }
}

impl Matrix {
    /// Allocates `a * b`.
    #[track_caller]
    pub fn product<S2, S3>(a: &MatrixBase<S2>, b: &MatrixBase<S3>) -> Matrix
    where
        S2: BaseData + Sync,
        S3: BaseData + Sync,
    {
        let mut out = Matrix::zeros(a.rows(), b.cols());
        out.multiply(a, b);
        out
    }
}
