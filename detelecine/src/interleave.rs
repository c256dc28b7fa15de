//! Row routing between frame buffers.
//!
//! Weaving takes the rows of one field parity from one source and the
//! complementary rows from another. Each plane is handled with its own row
//! count, so chroma planes of vertically subsampled formats weave their
//! own (fewer) rows.

use crate::config::FirstField;
use crate::error::{DetelecineError, Result};
use detelecine_core::{copy_plane, FrameBuffer};

/// Rows belonging to a field: `(first row, row count)` for a plane of
/// `plane_rows` rows.
pub fn field_rows(plane_rows: usize, parity: usize) -> (usize, usize) {
    if parity >= plane_rows {
        return (parity, 0);
    }
    (parity, (plane_rows - parity + 1) / 2)
}

/// Weave `dst` from two frames.
///
/// Rows of the `first_field` parity come from `new`, the other rows come
/// from `held`.
pub fn weave_fields(
    dst: &mut FrameBuffer,
    new: &FrameBuffer,
    held: &FrameBuffer,
    first_field: FirstField,
) -> Result<()> {
    check_layout(dst, new)?;
    check_layout(dst, held)?;

    let parity = first_field.row_offset();
    for plane in 0..dst.num_planes() {
        copy_field(dst, new, plane, parity);
        copy_field(dst, held, plane, 1 - parity);
    }
    Ok(())
}

/// Copy every row of `src` into `dst`.
pub fn copy_frame(dst: &mut FrameBuffer, src: &FrameBuffer) -> Result<()> {
    check_layout(dst, src)?;
    dst.copy_from(src)?;
    Ok(())
}

fn copy_field(dst: &mut FrameBuffer, src: &FrameBuffer, plane: usize, parity: usize) {
    let Some(geometry) = dst.plane_geometry(plane) else {
        return;
    };
    let (first, rows) = field_rows(geometry.rows, parity);
    if rows == 0 {
        return;
    }

    let dst_stride = dst.stride(plane);
    let src_stride = src.stride(plane);
    let (Some(src_data), Some(dst_data)) = (src.plane(plane), dst.plane_mut(plane)) else {
        return;
    };

    copy_plane(
        &mut dst_data[first * dst_stride..],
        dst_stride * 2,
        &src_data[first * src_stride..],
        src_stride * 2,
        geometry.row_bytes,
        rows,
    );
}

fn check_layout(dst: &FrameBuffer, src: &FrameBuffer) -> Result<()> {
    if dst.format != src.format {
        return Err(DetelecineError::FormatMismatch {
            expected: dst.format,
            actual: src.format,
        });
    }
    if dst.width != src.width || dst.height != src.height {
        return Err(DetelecineError::DimensionMismatch {
            expected_width: dst.width,
            expected_height: dst.height,
            actual_width: src.width,
            actual_height: src.height,
        });
    }
    Ok(())
}
