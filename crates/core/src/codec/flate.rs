//! Pooled zlib compression for content streams.
//!
//! Page contents, templates, palettes and image masks are compressed at the
//! fastest zlib level. Output buffers come from a [`BufferPool`] so that long
//! documents do not allocate a fresh vector per stream; a [`PooledBuffer`]
//! clears itself and goes back to its pool when dropped.

use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};
use std::sync::{LazyLock, Mutex};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{PdfError, Result};

/// Upper bound on idle buffers kept by a pool.
const MAX_IDLE: usize = 64;

static GLOBAL_POOL: LazyLock<BufferPool> = LazyLock::new(BufferPool::new);

/// Process-wide pool used by the document writer.
pub fn pool() -> &'static BufferPool {
    &GLOBAL_POOL
}

/// Compress `data` with the process-wide pool.
pub fn compress(data: &[u8]) -> Result<PooledBuffer<'static>> {
    GLOBAL_POOL.compress(data)
}

/// Uncompress `data` with the process-wide pool.
pub fn uncompress(data: &[u8]) -> Result<PooledBuffer<'static>> {
    GLOBAL_POOL.uncompress(data)
}

/// Thread-safe pool of reusable byte buffers.
#[derive(Debug, Default)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a cleared buffer from the pool, allocating when none is idle.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop())
            .unwrap_or_default();
        PooledBuffer { buf, pool: self }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    /// Deflate `data` into a pooled buffer.
    pub fn compress(&self, data: &[u8]) -> Result<PooledBuffer<'_>> {
        let mut out = self.acquire();
        out.reserve(data.len() / 2 + 16);
        let mut encoder = ZlibEncoder::new(&mut *out, Compression::fast());
        encoder
            .write_all(data)
            .map_err(|e| PdfError::Compression(format!("could not zlib-compress slice: {e}")))?;
        encoder
            .finish()
            .map_err(|e| PdfError::Compression(format!("could not close zlib writer: {e}")))?;
        Ok(out)
    }

    /// Inflate zlib `data` into a pooled buffer.
    pub fn uncompress(&self, data: &[u8]) -> Result<PooledBuffer<'_>> {
        let mut out = self.acquire();
        ZlibDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| PdfError::Compression(format!("could not zlib-uncompress slice: {e}")))?;
        Ok(out)
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        if let Ok(mut idle) = self.idle.lock()
            && idle.len() < MAX_IDLE
        {
            idle.push(buf);
        }
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl PooledBuffer<'_> {
    /// Copy the contents out; the buffer itself still returns to the pool.
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.clone()
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl AsRef<[u8]> for PooledBuffer<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffers_come_back_empty() {
        let pool = BufferPool::new();
        {
            let packed = pool.compress(b"stale bytes").unwrap();
            assert!(!packed.is_empty());
        }
        assert_eq!(pool.idle_count(), 1);
        let fresh = pool.acquire();
        assert!(fresh.is_empty());
        assert!(fresh.capacity() > 0);
    }

    #[test]
    fn uncompress_rejects_garbage() {
        let pool = BufferPool::new();
        assert!(pool.uncompress(b"not zlib at all").is_err());
        assert_eq!(pool.idle_count(), 1);
    }
}
