//! Aggregate bandwidth throttling for remux output streams.
//!
//! This module provides the [`Throttle`] struct which caps the combined byte
//! rate of every stream piped through it. One instance is shared by all
//! concurrent lesson downloads, so the configured rate is an aggregate cap,
//! not a per-download one.
//!
//! # Overview
//!
//! The throttle keeps a single shared timeline. Each [`acquire`](Throttle::acquire)
//! reserves the next free slot of `bytes / rate` seconds on it and sleeps until
//! that slot starts. Slots never overlap, and idle time is not banked, so in
//! any one-second window at most `rate` bytes plus one chunk are released.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroU64;
//! use std::sync::Arc;
//! use course_downloader::download::Throttle;
//!
//! # async fn example() {
//! let throttle = Arc::new(Throttle::new(NonZeroU64::new(1_000_000).unwrap()));
//!
//! // Each concurrent download gets a clone of the same Arc.
//! let shared = Arc::clone(&throttle);
//! tokio::spawn(async move {
//!     shared.acquire(16 * 1024).await;
//!     // ... write the chunk
//! });
//! # }
//! ```

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Largest chunk a throttled copy reads at once.
pub const MAX_CHUNK_BYTES: usize = 16 * 1024;

/// Shared byte-rate limiter.
///
/// This struct is designed to be wrapped in `Arc` and shared across multiple
/// Tokio tasks. The timeline is guarded by a `tokio::sync::Mutex` that is held
/// only while a slot is reserved, never across the sleep.
#[derive(Debug)]
pub struct Throttle {
    /// Aggregate cap; `None` disables throttling.
    bytes_per_sec: Option<NonZeroU64>,

    /// End of the last reserved slot.
    /// `None` until the first reservation.
    next_free: Mutex<Option<Instant>>,

    /// Total bytes that have passed through the throttle.
    released: AtomicU64,
}

impl Throttle {
    /// Creates a throttle capping the aggregate rate at `bytes_per_sec`.
    #[must_use]
    #[instrument(skip_all, fields(bytes_per_sec = bytes_per_sec.get()))]
    pub fn new(bytes_per_sec: NonZeroU64) -> Self {
        debug!("creating bandwidth throttle");
        Self {
            bytes_per_sec: Some(bytes_per_sec),
            next_free: Mutex::new(None),
            released: AtomicU64::new(0),
        }
    }

    /// Creates a throttle that never delays.
    #[must_use]
    #[instrument]
    pub fn unlimited() -> Self {
        debug!("creating unlimited bandwidth throttle");
        Self {
            bytes_per_sec: None,
            next_free: Mutex::new(None),
            released: AtomicU64::new(0),
        }
    }

    /// Creates a throttle from an optional limit (`None` means unlimited).
    #[must_use]
    pub fn from_limit(limit: Option<NonZeroU64>) -> Self {
        limit.map_or_else(Self::unlimited, Self::new)
    }

    /// Returns whether throttling is disabled.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.bytes_per_sec.is_none()
    }

    /// Returns the configured aggregate rate.
    #[must_use]
    pub fn bytes_per_sec(&self) -> Option<u64> {
        self.bytes_per_sec.map(NonZeroU64::get)
    }

    /// Chunk size used by [`copy_throttled`]: never larger than one second
    /// of budget.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        match self.bytes_per_sec {
            Some(rate) => usize::try_from(rate.get())
                .unwrap_or(MAX_CHUNK_BYTES)
                .min(MAX_CHUNK_BYTES),
            None => MAX_CHUNK_BYTES,
        }
    }

    /// Total bytes released so far across all callers.
    #[must_use]
    pub fn bytes_released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Waits until `bytes` may be released under the aggregate cap.
    ///
    /// The first call after an idle period proceeds immediately.
    #[allow(clippy::cast_precision_loss)]
    pub async fn acquire(&self, bytes: usize) {
        self.released.fetch_add(bytes as u64, Ordering::SeqCst);
        let Some(rate) = self.bytes_per_sec else {
            return;
        };
        if bytes == 0 {
            return;
        }

        let slot = Duration::from_secs_f64(bytes as f64 / rate.get() as f64);
        let start = {
            let mut next_free = self.next_free.lock().await;
            let now = Instant::now();
            let start = match *next_free {
                Some(free_at) if free_at > now => free_at,
                _ => now,
            };
            *next_free = Some(start + slot);
            start
        };

        if start > Instant::now() {
            tokio::time::sleep_until(start).await;
        }
    }
}

/// Copies `reader` into `writer`, releasing each chunk through `throttle`.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns any I/O error from reading, writing or flushing.
pub async fn copy_throttled<R, W>(
    reader: &mut R,
    writer: &mut W,
    throttle: &Throttle,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; throttle.chunk_size()];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        throttle.acquire(n).await;
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    writer.flush().await?;
    Ok(total)
}
