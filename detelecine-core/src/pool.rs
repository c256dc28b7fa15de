//! Frame buffer allocation and reuse.
//!
//! The detelecine engine allocates its long-lived working buffers once per
//! stream and draws one buffer per emitted frame. Both go through the
//! [`FrameAllocator`] trait so callers can bound memory use or recycle
//! buffers that downstream consumers hand back.

use crate::error::{Error, Result};
use crate::frame::{FrameBuffer, PixelFormat};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Source of frame-sized buffers for one negotiated picture layout.
pub trait FrameAllocator {
    /// Width in pixels of the buffers this allocator produces.
    fn width(&self) -> u32;

    /// Height in pixels of the buffers this allocator produces.
    fn height(&self) -> u32;

    /// Pixel format of the buffers this allocator produces.
    fn format(&self) -> PixelFormat;

    /// Produce a buffer. Contents are unspecified.
    fn allocate(&mut self) -> Result<FrameBuffer>;
}

/// A pool of reusable frame buffers.
pub struct FramePool {
    available: VecDeque<FrameBuffer>,
    width: u32,
    height: u32,
    format: PixelFormat,
    /// Maximum number of idle buffers kept for reuse.
    max_idle: usize,
    /// Upper bound on fresh allocations, if any.
    allocation_limit: Option<usize>,
    total_allocated: usize,
}

impl FramePool {
    /// Create a new frame pool keeping at most `max_idle` released buffers.
    pub fn new(width: u32, height: u32, format: PixelFormat, max_idle: usize) -> Self {
        Self {
            available: VecDeque::with_capacity(max_idle),
            width,
            height,
            format,
            max_idle,
            allocation_limit: None,
            total_allocated: 0,
        }
    }

    /// Cap the number of buffers this pool will ever allocate.
    ///
    /// Once reached, [`FramePool::acquire`] fails with
    /// [`Error::ResourceExhausted`] until a buffer is released.
    pub fn with_allocation_limit(mut self, limit: usize) -> Self {
        self.allocation_limit = Some(limit);
        self
    }

    /// Acquire a buffer, reusing a released one when possible.
    pub fn acquire(&mut self) -> Result<FrameBuffer> {
        if let Some(buffer) = self.available.pop_front() {
            return Ok(buffer);
        }

        if let Some(limit) = self.allocation_limit {
            if self.total_allocated >= limit {
                return Err(Error::resource_exhausted(format!(
                    "frame pool limit of {} buffers reached",
                    limit
                )));
            }
        }

        let buffer = FrameBuffer::try_new(self.width, self.height, self.format)?;
        self.total_allocated += 1;
        Ok(buffer)
    }

    /// Return a buffer to the pool.
    ///
    /// Buffers of a different layout, or beyond the idle limit, are dropped.
    pub fn release(&mut self, buffer: FrameBuffer) {
        if self.available.len() < self.max_idle
            && buffer.width == self.width
            && buffer.height == self.height
            && buffer.format == self.format
        {
            self.available.push_back(buffer);
        }
    }

    /// Get the number of idle buffers.
    pub fn available(&self) -> usize {
        self.available.len()
    }

    /// Get the total number of buffers allocated so far.
    pub fn total_allocated(&self) -> usize {
        self.total_allocated
    }
}

impl FrameAllocator for FramePool {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn allocate(&mut self) -> Result<FrameBuffer> {
        self.acquire()
    }
}

/// A thread-safe frame pool.
///
/// Clones share the same buffers, so a consumer on another thread can
/// release emitted frames back to the allocator the engine draws from.
pub struct SharedFramePool {
    inner: Arc<Mutex<FramePool>>,
}

impl SharedFramePool {
    /// Create a new shared frame pool.
    pub fn new(width: u32, height: u32, format: PixelFormat, max_idle: usize) -> Self {
        Self::from_pool(FramePool::new(width, height, format, max_idle))
    }

    /// Share an already configured pool.
    pub fn from_pool(pool: FramePool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    /// Acquire a buffer from the pool.
    pub fn acquire(&self) -> Result<FrameBuffer> {
        self.inner.lock().acquire()
    }

    /// Release a buffer back to the pool.
    pub fn release(&self, buffer: FrameBuffer) {
        self.inner.lock().release(buffer);
    }

    /// Get the number of idle buffers.
    pub fn available(&self) -> usize {
        self.inner.lock().available()
    }

    /// Get the total number of buffers allocated so far.
    pub fn total_allocated(&self) -> usize {
        self.inner.lock().total_allocated()
    }
}

impl Clone for SharedFramePool {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl FrameAllocator for SharedFramePool {
    fn width(&self) -> u32 {
        self.inner.lock().width
    }

    fn height(&self) -> u32 {
        self.inner.lock().height
    }

    fn format(&self) -> PixelFormat {
        self.inner.lock().format
    }

    fn allocate(&mut self) -> Result<FrameBuffer> {
        self.acquire()
    }
}
