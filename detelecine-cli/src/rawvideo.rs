//! Raw planar video file I/O.
//!
//! Frames are stored back to back, plane after plane, rows without padding.
//! This matches `ffmpeg -f rawvideo` output for the same pixel format.

use anyhow::{bail, Context, Result};
use detelecine_core::{Frame, PixelFormat, TimeBase, Timestamp};
use std::io::{ErrorKind, Read, Write};

/// Bytes of one unpadded frame.
pub fn frame_size(width: u32, height: u32, format: PixelFormat) -> usize {
    (0..format.num_planes())
        .filter_map(|plane| format.plane_geometry(plane, width, height))
        .map(|g| g.row_bytes * g.rows)
        .sum()
}

/// Reads fixed-size raw frames and stamps them with their index.
pub struct RawVideoReader<R> {
    reader: R,
    width: u32,
    height: u32,
    format: PixelFormat,
    time_base: TimeBase,
    scratch: Vec<u8>,
    frames_read: u64,
}

impl<R: Read> RawVideoReader<R> {
    /// Create a reader. Timestamps count frames in `time_base`.
    pub fn new(reader: R, width: u32, height: u32, format: PixelFormat, time_base: TimeBase) -> Self {
        Self {
            reader,
            width,
            height,
            format,
            time_base,
            scratch: vec![0u8; frame_size(width, height, format)],
            frames_read: 0,
        }
    }

    /// Read the next frame, or `None` at a clean end of file.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let filled = read_full(&mut self.reader, &mut self.scratch)
            .with_context(|| format!("reading frame {}", self.frames_read))?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < self.scratch.len() {
            bail!(
                "truncated frame {}: got {} of {} bytes",
                self.frames_read,
                filled,
                self.scratch.len()
            );
        }

        let mut frame = Frame::new(self.width, self.height, self.format, self.time_base);
        let mut offset = 0;
        for plane in 0..self.format.num_planes() {
            let Some(geometry) = frame.buffer().plane_geometry(plane) else {
                continue;
            };
            for row in 0..geometry.rows {
                let src = &self.scratch[offset..offset + geometry.row_bytes];
                if let Some(dst) = frame.buffer_mut().row_mut(plane, row) {
                    dst.copy_from_slice(src);
                }
                offset += geometry.row_bytes;
            }
        }

        frame.pts = Timestamp::new(self.frames_read as i64, self.time_base);
        self.frames_read += 1;
        Ok(Some(frame))
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

/// Writes frames as unpadded raw planes.
pub struct RawVideoWriter<W> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> RawVideoWriter<W> {
    /// Create a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    /// Write one frame.
    pub fn write_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        let buffer = frame.buffer();
        for plane in 0..buffer.num_planes() {
            let rows = buffer.plane_geometry(plane).map_or(0, |g| g.rows);
            for row in 0..rows {
                if let Some(data) = buffer.row(plane, row) {
                    self.writer.write_all(data)?;
                }
            }
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Fill `buf` from `reader`, stopping early only at end of file.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
