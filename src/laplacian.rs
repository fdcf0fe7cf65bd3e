//! Laplacian-averaging operators for the Horn & Schunck iteration.
//!
//! Both operators compute a local neighbourhood mean consistent with a
//! discrete Laplacian. The averaging stencils are applied directly; running
//! the Laplacian kernel and subtracting afterwards gives different values at
//! the boundary and is wrong.
//!
//! The classical operator derives from the 8-neighbour Laplacian
//! `[[-1,-2,-1],[-2,12,-2],[-1,-2,-1]]`: removing the centre and scaling by
//! -1/12 yields the averaging stencil
//! `[[1/12, 1/6, 1/12], [1/6, 0, 1/6], [1/12, 1/6, 1/12]]`.
//!
//! The OpenCV-style operator derives from `[[0,-1,0],[-1,4,-1],[0,-1,0]]`
//! the same way (scale -1/4), yielding
//! `[[0, 1/4, 0], [1/4, 0, 1/4], [0, 1/4, 0]]`.
//!
//! Out-of-bounds neighbours replicate the nearest edge pixel, so a constant
//! field is a fixed point of both operators everywhere, corners included.

use crate::field::{Field, FieldView, FieldViewMut};

const CORNER: f64 = 1.0 / 12.0;
const EDGE: f64 = 1.0 / 6.0;
const CROSS: f64 = 1.0 / 4.0;

/// Classical Horn & Schunck neighbourhood average.
///
/// The output must not alias the input and must share its extents.
pub fn laplacian_avg_hs(src: FieldView<'_>, dst: &mut FieldViewMut<'_>) {
    debug_assert_eq!(src.shape(), dst.shape());
    let height = src.height();
    let width = src.width();
    for y in 0..height {
        let above = src.row(y.saturating_sub(1));
        let row = src.row(y);
        let below = src.row((y + 1).min(height - 1));
        let out = dst.row_mut(y);
        for x in 0..width {
            let xl = x.saturating_sub(1);
            let xr = (x + 1).min(width - 1);
            out[x] = CORNER * (above[xl] + above[xr] + below[xl] + below[xr])
                + EDGE * (above[x] + row[xl] + row[xr] + below[x]);
        }
    }
}

/// OpenCV-style 4-neighbour average.
///
/// The output must not alias the input and must share its extents.
pub fn laplacian_avg_opencv(src: FieldView<'_>, dst: &mut FieldViewMut<'_>) {
    debug_assert_eq!(src.shape(), dst.shape());
    let height = src.height();
    let width = src.width();
    for y in 0..height {
        let above = src.row(y.saturating_sub(1));
        let row = src.row(y);
        let below = src.row((y + 1).min(height - 1));
        let out = dst.row_mut(y);
        for x in 0..width {
            let xl = x.saturating_sub(1);
            let xr = (x + 1).min(width - 1);
            out[x] = CROSS * (above[x] + row[xl] + row[xr] + below[x]);
        }
    }
}

/// Allocating form of [`laplacian_avg_hs`].
pub fn laplacian_avg_hs_field(src: FieldView<'_>) -> Field {
    let mut out = Field::zeros(src.shape());
    laplacian_avg_hs(src, &mut out.view_mut());
    out
}

/// Allocating form of [`laplacian_avg_opencv`].
pub fn laplacian_avg_opencv_field(src: FieldView<'_>) -> Field {
    let mut out = Field::zeros(src.shape());
    laplacian_avg_opencv(src, &mut out.view_mut());
    out
}
