//! # Detelecine Core
//!
//! Support types for the detelecine filter.
//!
//! This crate provides the services the field-reassembly engine calls into:
//! - Error handling types
//! - Frame buffers with per-plane geometry and row copying
//! - Rational arithmetic and timestamp/time base handling
//! - Frame buffer allocation and pooling

pub mod error;
pub mod frame;
pub mod pool;
pub mod rational;
pub mod timestamp;

pub use error::{Error, Result};
pub use frame::{
    copy_plane, ColorRange, ColorSpace, Frame, FrameBuffer, FrameFlags, PixelFormat,
    PlaneGeometry,
};
pub use pool::{FrameAllocator, FramePool, SharedFramePool};
pub use rational::Rational;
pub use timestamp::{Duration, TimeBase, Timestamp};
