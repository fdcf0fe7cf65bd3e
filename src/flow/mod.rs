//! Horn & Schunck flow solvers and flow-field diagnostics.
//!
//! Two solver variants share the same fixed-point machinery and differ in
//! their gradient source and averaging stencil:
//!
//! - [`VanillaFlow`] follows the 1981 paper: two frames, 2x2x2
//!   forward-difference gradients and the classical 8-neighbour averaging
//!   stencil.
//! - [`SmoothedFlow`] estimates gradients with a 3-D Sobel operator over an
//!   image triplet and averages with the 4-neighbour (OpenCV-style)
//!   stencil.
//!
//! Each iteration is a Jacobi step: the neighbourhood means are taken from
//! the previous iterate for every pixel before any pixel is committed.
//! Iteration counts are fixed by the caller; there is no adaptive stopping.

use crate::field::{Field, FieldView, FieldViewMut};
use crate::util::{FlowError, FlowResult};

mod smoothed;
mod step;
mod vanilla;

pub use smoothed::SmoothedFlow;
pub use vanilla::VanillaFlow;

/// Scratch owned by a solver instance: gradient planes, neighbourhood
/// means, and the contiguous working copies of the flow components the
/// Jacobi loop iterates on. Reallocated on shape change, never aliased with
/// caller buffers.
pub(crate) struct SolverBuffers {
    pub ex: Vec<f64>,
    pub ey: Vec<f64>,
    pub et: Vec<f64>,
    pub ubar: Vec<f64>,
    pub vbar: Vec<f64>,
    pub uw: Vec<f64>,
    pub vw: Vec<f64>,
}

impl SolverBuffers {
    pub fn new(len: usize) -> Self {
        Self {
            ex: vec![0.0; len],
            ey: vec![0.0; len],
            et: vec![0.0; len],
            ubar: vec![0.0; len],
            vbar: vec![0.0; len],
            uw: vec![0.0; len],
            vw: vec![0.0; len],
        }
    }

    pub fn reallocate(&mut self, len: usize) {
        *self = Self::new(len);
    }
}

pub(crate) fn check_alpha(alpha: f64) -> FlowResult<()> {
    if !alpha.is_finite() {
        return Err(FlowError::NonFiniteAlpha { value: alpha });
    }
    Ok(())
}

/// Copies a possibly-strided view into a contiguous buffer.
pub(crate) fn pack(view: FieldView<'_>, dst: &mut [f64]) {
    let width = view.width();
    for (y, chunk) in dst.chunks_exact_mut(width).enumerate() {
        chunk.copy_from_slice(view.row(y));
    }
}

/// Copies a contiguous buffer back into a possibly-strided output view.
pub(crate) fn unpack(src: &[f64], dst: &mut FieldViewMut<'_>, width: usize) {
    for (y, chunk) in src.chunks_exact(width).enumerate() {
        dst.row_mut(y).copy_from_slice(chunk);
    }
}

/// Generalised flow error: `e[y,x] = i2(x - u, y - v) - i1(x, y)`.
///
/// The displaced sample is taken from `i2` with bilinear interpolation;
/// coordinates outside `i2` clamp to its boundary. All four inputs must
/// share one shape. Pure, allocates the result.
pub fn flow_error(
    i1: FieldView<'_>,
    i2: FieldView<'_>,
    u: FieldView<'_>,
    v: FieldView<'_>,
) -> FlowResult<Field> {
    let shape = i1.shape();
    i2.expect_shape(shape, "image2")?;
    u.expect_shape(shape, "u")?;
    v.expect_shape(shape, "v")?;

    let height = shape.height;
    let width = shape.width;
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;

    let mut out = Field::zeros(shape);
    {
        let mut out_view = out.view_mut();
        for y in 0..height {
            let i1_row = i1.row(y);
            let u_row = u.row(y);
            let v_row = v.row(y);
            let out_row = out_view.row_mut(y);
            for x in 0..width {
                let xs = (x as f64 - u_row[x]).clamp(0.0, max_x);
                let ys = (y as f64 - v_row[x]).clamp(0.0, max_y);
                let x0 = xs.floor() as usize;
                let y0 = ys.floor() as usize;
                let x1 = (x0 + 1).min(width - 1);
                let y1 = (y0 + 1).min(height - 1);
                let fx = xs - x0 as f64;
                let fy = ys - y0 as f64;

                let row0 = i2.row(y0);
                let row1 = i2.row(y1);
                let w00 = (1.0 - fx) * (1.0 - fy);
                let w10 = fx * (1.0 - fy);
                let w01 = (1.0 - fx) * fy;
                let w11 = fx * fy;
                let sample =
                    row0[x0] * w00 + row0[x1] * w10 + row1[x0] * w01 + row1[x1] * w11;
                out_row[x] = sample - i1_row[x];
            }
        }
    }
    Ok(out)
}
