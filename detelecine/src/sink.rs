//! Downstream frame consumers.

use crate::error::Result;
use detelecine_core::Frame;

/// Consumer of reconstructed frames.
pub trait FrameSink {
    /// Accept one output frame. An error stops emission for the current
    /// input frame and is returned to the caller.
    fn push_frame(&mut self, frame: Frame) -> Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn push_frame(&mut self, frame: Frame) -> Result<()> {
        self.push(frame);
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn push_frame(&mut self, frame: Frame) -> Result<()> {
        (**self).push_frame(frame)
    }
}

/// Adapter turning a closure into a [`FrameSink`].
pub struct FnSink<F>(pub F);

impl<F> FrameSink for FnSink<F>
where
    F: FnMut(Frame) -> Result<()>,
{
    fn push_frame(&mut self, frame: Frame) -> Result<()> {
        (self.0)(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetelecineError;
    use detelecine_core::{PixelFormat, TimeBase};

    fn frame() -> Frame {
        Frame::new(4, 2, PixelFormat::Gray8, TimeBase::MPEG)
    }

    #[test]
    fn test_vec_sink() {
        let mut frames: Vec<Frame> = Vec::new();
        frames.push_frame(frame()).unwrap();
        frames.push_frame(frame()).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_fn_sink() {
        let mut count = 0;
        {
            let mut sink = FnSink(|_frame: Frame| {
                count += 1;
                if count > 1 {
                    Err(DetelecineError::sink("full"))
                } else {
                    Ok(())
                }
            });
            assert!(sink.push_frame(frame()).is_ok());
            assert!(sink.push_frame(frame()).is_err());
        }
        assert_eq!(count, 2);
    }
}
