//! Reusable chunk buffers with memory accounting.
//!
//! The scheduler takes one buffer per chunk in flight. Buffers return to the
//! pool when the [`PooledBuffer`] guard drops, on success and on every error
//! path, so outstanding bytes always reflect live chunks.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::error::{MergeError, Result};

/// Pool statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Bytes currently handed out.
    pub outstanding_bytes: usize,
    /// Highest value `outstanding_bytes` ever reached.
    pub peak_bytes: usize,
    /// Buffers that needed a fresh allocation.
    pub allocations: u64,
    /// Buffers served from the free list.
    pub reuses: u64,
}

/// A pool of `f32` buffers.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<f32>>>,
    max_free: usize,
    outstanding: AtomicUsize,
    peak: AtomicUsize,
    allocations: AtomicU64,
    reuses: AtomicU64,
}

impl BufferPool {
    /// Create a pool that keeps at most `max_free` idle buffers.
    pub fn new(max_free: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_free,
            outstanding: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            allocations: AtomicU64::new(0),
            reuses: AtomicU64::new(0),
        }
    }

    /// Take a buffer of exactly `len` values, all NaN.
    ///
    /// Allocation failure maps to [`MergeError::ResourceExceeded`].
    pub fn acquire(&self, len: usize) -> Result<PooledBuffer<'_>> {
        let recycled = self.free.lock().ok().and_then(|mut free| free.pop());
        let mut data = match recycled {
            Some(buf) => {
                self.reuses.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            }
        };

        data.clear();
        data.try_reserve(len).map_err(|e| {
            MergeError::resource(format!(
                "could not allocate a chunk buffer of {} bytes: {}",
                len.saturating_mul(std::mem::size_of::<f32>()),
                e
            ))
        })?;
        data.resize(len, f32::NAN);

        let bytes = len * std::mem::size_of::<f32>();
        let now = self.outstanding.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(PooledBuffer {
            data,
            bytes,
            pool: self,
        })
    }

    fn recycle(&self, data: Vec<f32>, bytes: usize) {
        self.outstanding.fetch_sub(bytes, Ordering::SeqCst);
        if let Ok(mut free) = self.free.lock() {
            if free.len() < self.max_free {
                free.push(data);
            }
        }
    }

    /// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            outstanding_bytes: self.outstanding.load(Ordering::SeqCst),
            peak_bytes: self.peak.load(Ordering::SeqCst),
            allocations: self.allocations.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
        }
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    data: Vec<f32>,
    bytes: usize,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.data
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.pool.recycle(data, self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_fills_nan() {
        let pool = BufferPool::new(4);
        let buf = pool.acquire(8).unwrap();
        assert_eq!(buf.len(), 8);
        assert!(buf.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_peak_and_outstanding() {
        let pool = BufferPool::new(4);
        {
            let _a = pool.acquire(100).unwrap();
            let _b = pool.acquire(50).unwrap();
            assert_eq!(pool.stats().outstanding_bytes, 600);
        }
        let stats = pool.stats();
        assert_eq!(stats.outstanding_bytes, 0);
        assert_eq!(stats.peak_bytes, 600);
    }

    #[test]
    fn test_buffers_are_reused() {
        let pool = BufferPool::new(1);
        {
            let mut a = pool.acquire(10).unwrap();
            a[0] = 1.0;
        }
        let b = pool.acquire(10).unwrap();
        assert!(b[0].is_nan());
        let stats = pool.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.reuses, 1);
    }

    #[test]
    fn test_free_list_is_bounded() {
        let pool = BufferPool::new(1);
        {
            let _a = pool.acquire(10).unwrap();
            let _b = pool.acquire(10).unwrap();
        }
        let _c = pool.acquire(10).unwrap();
        let _d = pool.acquire(10).unwrap();
        assert_eq!(pool.stats().allocations, 3);
    }

    #[test]
    fn test_absurd_allocation_is_resource_error() {
        let pool = BufferPool::new(1);
        let err = pool.acquire(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, MergeError::ResourceExceeded { .. }));
    }
}
