//! Pooled zlib compression.

use vellum_core::flate::{self, BufferPool};

#[test]
fn test_compress_round_trip() {
    let data = b"BT /F1 12.00 Tf ET\n".repeat(200);
    let packed = flate::compress(&data).unwrap().to_vec();
    assert!(packed.len() < data.len());
    assert_eq!(flate::uncompress(&packed).unwrap().to_vec(), data);
}

#[test]
fn test_buffers_return_to_pool() {
    let pool = BufferPool::new();
    assert_eq!(pool.idle_count(), 0);
    {
        let _a = pool.compress(b"one").unwrap();
        let _b = pool.compress(b"two").unwrap();
    }
    assert_eq!(pool.idle_count(), 2);
    let _c = pool.acquire();
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn test_uncompress_rejects_garbage() {
    assert!(flate::uncompress(b"not zlib at all").is_err());
}
