//! Held field storage.
//!
//! A field that cannot be paired yet is kept by holding on to a copy of the
//! whole input frame. Only alternating rows of it are read back later.

use crate::error::Result;
use detelecine_core::FrameBuffer;

/// A single-slot donor frame store.
#[derive(Debug)]
pub struct FieldBuffer {
    buffer: FrameBuffer,
    occupied: bool,
}

impl FieldBuffer {
    /// Wrap a preallocated buffer. The store starts empty.
    pub fn new(buffer: FrameBuffer) -> Self {
        Self {
            buffer,
            occupied: false,
        }
    }

    /// Copy `source` in and mark the store occupied.
    ///
    /// Any previously held frame is overwritten.
    pub fn hold(&mut self, source: &FrameBuffer) -> Result<()> {
        self.buffer.copy_from(source)?;
        self.occupied = true;
        Ok(())
    }

    /// Mark the store empty. The pixel data is left in place.
    pub fn release(&mut self) {
        self.occupied = false;
    }

    /// Whether a donor frame is currently held.
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// The underlying buffer, whether or not it is occupied.
    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }
}
