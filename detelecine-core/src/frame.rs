//! Video frame buffer abstractions.
//!
//! Frames are stored plane by plane with a padded row stride. Every plane
//! knows its own geometry (visible bytes per row and row count), which is
//! what row-level field routing needs: chroma planes of subsampled formats
//! have fewer rows than the luma plane.

use crate::error::{Error, Result};
use crate::timestamp::{Duration, TimeBase, Timestamp};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row stride alignment in bytes.
const STRIDE_ALIGN: usize = 32;

/// Pixel format for video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (1 Cr & Cb sample per 2x2 Y samples).
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp (1 Cr & Cb sample per 2x1 Y samples).
    Yuv422p,
    /// Planar YUV 4:4:0, 16bpp (1 Cr & Cb sample per 1x2 Y samples).
    Yuv440p,
    /// Planar YUV 4:4:4, 24bpp (no subsampling).
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit little endian.
    Yuv420p10le,
    /// Planar YUV 4:2:2, 10-bit little endian.
    Yuv422p10le,
    /// Planar YUV 4:4:4, 10-bit little endian.
    Yuv444p10le,
    /// Y plane followed by interleaved UV plane.
    Nv12,
    /// Y plane followed by interleaved VU plane.
    Nv21,
    /// Packed RGB24, 24bpp.
    Rgb24,
    /// Packed BGR24, 24bpp.
    Bgr24,
    /// Packed RGBA, 32bpp.
    Rgba,
    /// Packed BGRA, 32bpp.
    Bgra,
    /// Grayscale, 8bpp.
    Gray8,
    /// Grayscale, 16bpp.
    Gray16,
}

impl PixelFormat {
    /// All supported formats.
    pub const ALL: [PixelFormat; 15] = [
        Self::Yuv420p,
        Self::Yuv422p,
        Self::Yuv440p,
        Self::Yuv444p,
        Self::Yuv420p10le,
        Self::Yuv422p10le,
        Self::Yuv444p10le,
        Self::Nv12,
        Self::Nv21,
        Self::Rgb24,
        Self::Bgr24,
        Self::Rgba,
        Self::Bgra,
        Self::Gray8,
        Self::Gray16,
    ];

    /// Get the number of planes for this pixel format.
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Yuv420p
            | Self::Yuv422p
            | Self::Yuv440p
            | Self::Yuv444p
            | Self::Yuv420p10le
            | Self::Yuv422p10le
            | Self::Yuv444p10le => 3,
            Self::Nv12 | Self::Nv21 => 2,
            Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra | Self::Gray8 | Self::Gray16 => 1,
        }
    }

    /// Check if this is a 10-bit format.
    pub fn is_10bit(&self) -> bool {
        matches!(
            self,
            Self::Yuv420p10le | Self::Yuv422p10le | Self::Yuv444p10le
        )
    }

    /// Log2 of the chroma subsampling factors (horizontal, vertical).
    pub fn chroma_shift(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Yuv420p10le | Self::Nv12 | Self::Nv21 => (1, 1),
            Self::Yuv422p | Self::Yuv422p10le => (1, 0),
            Self::Yuv440p => (0, 1),
            _ => (0, 0),
        }
    }

    /// Visible geometry of one plane for a frame of the given size.
    ///
    /// Subsampled dimensions round up, so odd-sized frames keep their last
    /// chroma row and column.
    pub fn plane_geometry(&self, plane: usize, width: u32, height: u32) -> Option<PlaneGeometry> {
        if plane >= self.num_planes() {
            return None;
        }
        let (w, h) = (width as usize, height as usize);
        let (hshift, vshift) = self.chroma_shift();
        let chroma_w = ceil_shift(w, hshift);
        let chroma_h = ceil_shift(h, vshift);

        let (row_bytes, rows) = match self {
            Self::Nv12 | Self::Nv21 => {
                if plane == 0 {
                    (w, h)
                } else {
                    (chroma_w * 2, chroma_h)
                }
            }
            Self::Rgb24 | Self::Bgr24 => (w * 3, h),
            Self::Rgba | Self::Bgra => (w * 4, h),
            Self::Gray8 => (w, h),
            Self::Gray16 => (w * 2, h),
            _ => {
                let bytes_per_sample = if self.is_10bit() { 2 } else { 1 };
                if plane == 0 {
                    (w * bytes_per_sample, h)
                } else {
                    (chroma_w * bytes_per_sample, chroma_h)
                }
            }
        };

        Some(PlaneGeometry { row_bytes, rows })
    }
}

fn ceil_shift(value: usize, shift: u32) -> usize {
    (value + (1 << shift) - 1) >> shift
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv440p => "yuv440p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p10le => "yuv420p10le",
            Self::Yuv422p10le => "yuv422p10le",
            Self::Yuv444p10le => "yuv444p10le",
            Self::Nv12 => "nv12",
            Self::Nv21 => "nv21",
            Self::Rgb24 => "rgb24",
            Self::Bgr24 => "bgr24",
            Self::Rgba => "rgba",
            Self::Bgra => "bgra",
            Self::Gray8 => "gray8",
            Self::Gray16 => "gray16",
        };
        f.write_str(name)
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let lookup = match lower.as_str() {
            "gray" => "gray8",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|fmt| fmt.to_string() == lookup)
            .ok_or_else(|| Error::Unsupported(format!("pixel format '{}'", s)))
    }
}

/// Visible extent of a single plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneGeometry {
    /// Bytes of picture data in one row (excluding stride padding).
    pub row_bytes: usize,
    /// Number of rows in the plane.
    pub rows: usize,
}

/// Color space for video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorSpace {
    /// BT.601 (SD video).
    #[default]
    Bt601,
    /// BT.709 (HD video).
    Bt709,
    /// BT.2020 (UHD/HDR video).
    Bt2020,
    /// sRGB.
    Srgb,
}

/// Color range (limited/full).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorRange {
    /// Limited/TV range (16-235 for Y, 16-240 for UV).
    #[default]
    Limited,
    /// Full/PC range (0-255).
    Full,
}

bitflags! {
    /// Frame flags indicating frame properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameFlags: u32 {
        /// This is a keyframe (I-frame).
        const KEYFRAME = 0x0001;
        /// Frame is corrupted or incomplete.
        const CORRUPT = 0x0002;
        /// Interlaced frame.
        const INTERLACED = 0x0008;
        /// Top field first (for interlaced content).
        const TOP_FIELD_FIRST = 0x0010;
    }
}

impl Default for FrameFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Copy `rows` rows of `row_bytes` bytes between two strided planes.
///
/// Strides may be larger than the plane stride to address every other row.
///
/// # Panics
///
/// Panics if either slice is too short for the requested rows.
pub fn copy_plane(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    row_bytes: usize,
    rows: usize,
) {
    if row_bytes == dst_stride && row_bytes == src_stride {
        let len = row_bytes * rows;
        dst[..len].copy_from_slice(&src[..len]);
        return;
    }
    for row in 0..rows {
        let d = row * dst_stride;
        let s = row * src_stride;
        dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
}

/// A decoded video frame.
#[derive(Clone)]
pub struct Frame {
    /// Frame data buffer.
    buffer: FrameBuffer,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Decode timestamp.
    pub dts: Timestamp,
    /// Frame duration.
    pub duration: Duration,
    /// Frame flags.
    pub flags: FrameFlags,
    /// Picture order count.
    pub poc: i32,
}

impl Frame {
    /// Create a new zeroed frame.
    pub fn new(width: u32, height: u32, format: PixelFormat, time_base: TimeBase) -> Self {
        Self {
            buffer: FrameBuffer::new(width, height, format),
            pts: Timestamp::new(Timestamp::NONE, time_base),
            dts: Timestamp::new(Timestamp::NONE, time_base),
            duration: Duration::new(0, time_base),
            flags: FrameFlags::empty(),
            poc: 0,
        }
    }

    /// Create a frame from an existing buffer.
    pub fn from_buffer(buffer: FrameBuffer) -> Self {
        Self {
            buffer,
            pts: Timestamp::none(),
            dts: Timestamp::none(),
            duration: Duration::zero(),
            flags: FrameFlags::empty(),
            poc: 0,
        }
    }

    /// Copy every property except picture data from another frame.
    pub fn copy_props_from(&mut self, other: &Frame) {
        self.pts = other.pts;
        self.dts = other.dts;
        self.duration = other.duration;
        self.flags = other.flags;
        self.poc = other.poc;
        self.buffer.color_space = other.buffer.color_space;
        self.buffer.color_range = other.buffer.color_range;
    }

    /// Get the frame width.
    pub fn width(&self) -> u32 {
        self.buffer.width
    }

    /// Get the frame height.
    pub fn height(&self) -> u32 {
        self.buffer.height
    }

    /// Get the pixel format.
    pub fn format(&self) -> PixelFormat {
        self.buffer.format
    }

    /// Get the frame buffer.
    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Get a mutable reference to the frame buffer.
    pub fn buffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.buffer
    }

    /// Consume the frame, returning its buffer.
    pub fn into_buffer(self) -> FrameBuffer {
        self.buffer
    }

    /// Get a plane's data.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.buffer.plane(index)
    }

    /// Get a mutable reference to a plane's data.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.buffer.plane_mut(index)
    }

    /// Get the stride (bytes per row) for a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.buffer.stride(plane)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("format", &self.format())
            .field("pts", &self.pts)
            .field("flags", &self.flags)
            .finish()
    }
}

/// A buffer for storing frame pixel data.
#[derive(Clone)]
pub struct FrameBuffer {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
    /// Color space.
    pub color_space: ColorSpace,
    /// Color range.
    pub color_range: ColorRange,
    planes: Vec<PlaneData>,
}

#[derive(Clone)]
struct PlaneData {
    data: Vec<u8>,
    stride: usize,
    geometry: PlaneGeometry,
}

impl FrameBuffer {
    /// Create a new zeroed frame buffer.
    ///
    /// # Panics
    ///
    /// Aborts on allocation failure like any `Vec`; use [`FrameBuffer::try_new`]
    /// where exhaustion must be reported.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let planes = (0..format.num_planes())
            .filter_map(|plane| format.plane_geometry(plane, width, height))
            .map(|geometry| {
                let stride = aligned_stride(geometry.row_bytes);
                PlaneData {
                    data: vec![0u8; stride * geometry.rows],
                    stride,
                    geometry,
                }
            })
            .collect();

        Self::with_planes(width, height, format, planes)
    }

    /// Create a new zeroed frame buffer, reporting allocation failure.
    pub fn try_new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let mut planes = Vec::new();
        planes
            .try_reserve_exact(format.num_planes())
            .map_err(|e| Error::resource_exhausted(e.to_string()))?;

        for plane in 0..format.num_planes() {
            let geometry = format
                .plane_geometry(plane, width, height)
                .ok_or_else(|| Error::Unsupported(format!("plane {} of {}", plane, format)))?;
            let stride = aligned_stride(geometry.row_bytes);
            let size = stride
                .checked_mul(geometry.rows)
                .ok_or_else(|| Error::resource_exhausted("plane size overflows usize"))?;

            let mut data = Vec::new();
            data.try_reserve_exact(size).map_err(|e| {
                Error::resource_exhausted(format!("{} bytes for plane {}: {}", size, plane, e))
            })?;
            data.resize(size, 0);

            planes.push(PlaneData {
                data,
                stride,
                geometry,
            });
        }

        Ok(Self::with_planes(width, height, format, planes))
    }

    fn with_planes(width: u32, height: u32, format: PixelFormat, planes: Vec<PlaneData>) -> Self {
        Self {
            width,
            height,
            format,
            color_space: ColorSpace::default(),
            color_range: ColorRange::default(),
            planes,
        }
    }

    /// Get the number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Get a plane's data.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(|p| p.data.as_slice())
    }

    /// Get a mutable reference to a plane's data.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.planes.get_mut(index).map(|p| p.data.as_mut_slice())
    }

    /// Get the stride for a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.planes.get(plane).map(|p| p.stride).unwrap_or(0)
    }

    /// Get the visible geometry of a plane.
    pub fn plane_geometry(&self, plane: usize) -> Option<PlaneGeometry> {
        self.planes.get(plane).map(|p| p.geometry)
    }

    /// Get a single row of a plane, without stride padding.
    pub fn row(&self, plane: usize, row: usize) -> Option<&[u8]> {
        let p = self.planes.get(plane)?;
        if row >= p.geometry.rows {
            return None;
        }
        let start = row * p.stride;
        p.data.get(start..start + p.geometry.row_bytes)
    }

    /// Get a single mutable row of a plane, without stride padding.
    pub fn row_mut(&mut self, plane: usize, row: usize) -> Option<&mut [u8]> {
        let p = self.planes.get_mut(plane)?;
        if row >= p.geometry.rows {
            return None;
        }
        let start = row * p.stride;
        p.data.get_mut(start..start + p.geometry.row_bytes)
    }

    /// Check whether two buffers describe the same picture layout.
    pub fn same_layout(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height && self.format == other.format
    }

    /// Fill all planes with a value.
    pub fn fill(&mut self, value: u8) {
        for plane in &mut self.planes {
            plane.data.fill(value);
        }
    }

    /// Copy the visible picture of another buffer into this one.
    pub fn copy_from(&mut self, other: &FrameBuffer) -> Result<()> {
        if !self.same_layout(other) {
            return Err(Error::invalid_parameter(format!(
                "cannot copy {}x{} {} into {}x{} {}",
                other.width, other.height, other.format, self.width, self.height, self.format
            )));
        }

        for (dst, src) in self.planes.iter_mut().zip(other.planes.iter()) {
            copy_plane(
                &mut dst.data,
                dst.stride,
                &src.data,
                src.stride,
                dst.geometry.row_bytes,
                dst.geometry.rows,
            );
        }
        Ok(())
    }
}

fn aligned_stride(row_bytes: usize) -> usize {
    (row_bytes + STRIDE_ALIGN - 1) & !(STRIDE_ALIGN - 1)
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("planes", &self.planes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_planes() {
        assert_eq!(PixelFormat::Yuv420p.num_planes(), 3);
        assert_eq!(PixelFormat::Nv12.num_planes(), 2);
        assert_eq!(PixelFormat::Rgb24.num_planes(), 1);
    }

    #[test]
    fn test_plane_geometry_rounds_up() {
        let fmt = PixelFormat::Yuv420p;
        assert_eq!(
            fmt.plane_geometry(0, 33, 17),
            Some(PlaneGeometry { row_bytes: 33, rows: 17 })
        );
        assert_eq!(
            fmt.plane_geometry(1, 33, 17),
            Some(PlaneGeometry { row_bytes: 17, rows: 9 })
        );
        assert_eq!(fmt.plane_geometry(3, 33, 17), None);

        let geometry = PixelFormat::Yuv440p.plane_geometry(2, 16, 9).unwrap();
        assert_eq!(geometry, PlaneGeometry { row_bytes: 16, rows: 5 });

        let geometry = PixelFormat::Nv12.plane_geometry(1, 15, 15).unwrap();
        assert_eq!(geometry, PlaneGeometry { row_bytes: 16, rows: 8 });

        let geometry = PixelFormat::Yuv422p10le.plane_geometry(1, 64, 8).unwrap();
        assert_eq!(geometry, PlaneGeometry { row_bytes: 64, rows: 8 });
    }

    #[test]
    fn test_pixel_format_parse() {
        assert_eq!("yuv420p".parse::<PixelFormat>().unwrap(), PixelFormat::Yuv420p);
        assert_eq!("NV12".parse::<PixelFormat>().unwrap(), PixelFormat::Nv12);
        assert_eq!("gray".parse::<PixelFormat>().unwrap(), PixelFormat::Gray8);
        assert!("pal8".parse::<PixelFormat>().is_err());
        for fmt in PixelFormat::ALL {
            assert_eq!(fmt.to_string().parse::<PixelFormat>().unwrap(), fmt);
        }
    }

    #[test]
    fn test_frame_buffer_creation() {
        let buffer = FrameBuffer::new(1920, 1080, PixelFormat::Yuv420p);
        assert_eq!(buffer.num_planes(), 3);
        assert!(buffer.plane(2).is_some());
        assert!(buffer.plane(3).is_none());
        assert_eq!(buffer.stride(0) % STRIDE_ALIGN, 0);
        assert_eq!(buffer.plane_geometry(1).unwrap().rows, 540);
    }

    #[test]
    fn test_try_new_matches_new() {
        let a = FrameBuffer::new(33, 17, PixelFormat::Yuv420p);
        let b = FrameBuffer::try_new(33, 17, PixelFormat::Yuv420p).unwrap();
        for plane in 0..3 {
            assert_eq!(a.stride(plane), b.stride(plane));
            assert_eq!(a.plane(plane).unwrap().len(), b.plane(plane).unwrap().len());
        }
    }

    #[test]
    fn test_rows() {
        let mut buffer = FrameBuffer::new(8, 4, PixelFormat::Gray8);
        buffer.row_mut(0, 2).unwrap().fill(7);
        assert_eq!(buffer.row(0, 2).unwrap(), &[7u8; 8]);
        assert_eq!(buffer.row(0, 1).unwrap(), &[0u8; 8]);
        assert!(buffer.row(0, 4).is_none());
        assert!(buffer.row(1, 0).is_none());
    }

    #[test]
    fn test_copy_plane_strided() {
        let src = [1u8, 2, 9, 9, 3, 4, 9, 9];
        let mut dst = [0u8; 6];
        copy_plane(&mut dst, 3, &src, 4, 2, 2);
        assert_eq!(dst, [1, 2, 0, 3, 4, 0]);
    }

    #[test]
    fn test_copy_from() {
        let mut src = FrameBuffer::new(16, 8, PixelFormat::Yuv420p);
        src.fill(42);
        let mut dst = FrameBuffer::new(16, 8, PixelFormat::Yuv420p);
        dst.copy_from(&src).unwrap();
        assert_eq!(dst.row(0, 7).unwrap(), &[42u8; 16]);
        assert_eq!(dst.row(2, 3).unwrap(), &[42u8; 8]);

        let mut other = FrameBuffer::new(16, 10, PixelFormat::Yuv420p);
        assert!(other.copy_from(&src).is_err());
    }

    #[test]
    fn test_copy_props() {
        let mut src = Frame::new(8, 8, PixelFormat::Gray8, TimeBase::MPEG);
        src.pts = Timestamp::new(3003, TimeBase::MPEG);
        src.flags = FrameFlags::KEYFRAME | FrameFlags::INTERLACED;
        src.poc = 4;
        src.buffer_mut().color_range = ColorRange::Full;

        let mut dst = Frame::from_buffer(FrameBuffer::new(8, 8, PixelFormat::Gray8));
        dst.copy_props_from(&src);
        assert_eq!(dst.pts, src.pts);
        assert_eq!(dst.flags, src.flags);
        assert_eq!(dst.poc, 4);
        assert_eq!(dst.buffer().color_range, ColorRange::Full);
    }
}
