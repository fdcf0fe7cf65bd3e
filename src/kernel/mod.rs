//! 3-tap correlation primitives.
//!
//! Kernels are applied in the correlation sense: for a kernel `k`,
//! `out[i] = k[0]*src[i-1] + k[1]*src[i] + k[2]*src[i+1]` (no mirroring).
//! Spatial passes clamp out-of-bounds indices to the nearest edge
//! (replicate boundary). The per-pixel summation order is fixed to the tap
//! order above so repeated runs are bit-identical.

use crate::field::{FieldView, FieldViewMut};
use crate::util::{FlowError, FlowResult};

/// A validated 3-tap float64 kernel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Kernel3 {
    taps: [f64; 3],
}

impl Kernel3 {
    /// Creates a kernel from three taps, rejecting non-finite entries.
    pub fn new(taps: [f64; 3]) -> FlowResult<Self> {
        for (index, &value) in taps.iter().enumerate() {
            if !value.is_finite() {
                return Err(FlowError::KernelNotFinite { index, value });
            }
        }
        Ok(Self { taps })
    }

    /// Creates a kernel from a slice, which must hold exactly 3 taps.
    pub fn from_slice(taps: &[f64]) -> FlowResult<Self> {
        if taps.len() != 3 {
            return Err(FlowError::KernelLength { got: taps.len() });
        }
        Self::new([taps[0], taps[1], taps[2]])
    }

    /// Returns the taps in application order.
    pub fn taps(&self) -> [f64; 3] {
        self.taps
    }
}

impl std::fmt::Display for Kernel3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}]",
            self.taps[0], self.taps[1], self.taps[2]
        )
    }
}

/// Correlates along x (within rows) with replicate boundary.
///
/// The output must not alias the input and must have the same extents.
pub fn correlate_x(src: FieldView<'_>, kernel: &Kernel3, dst: &mut FieldViewMut<'_>) {
    debug_assert_eq!(src.shape(), dst.shape());
    let [k0, k1, k2] = kernel.taps();
    let width = src.width();
    for y in 0..src.height() {
        let row = src.row(y);
        let out = dst.row_mut(y);
        for x in 0..width {
            let left = row[x.saturating_sub(1)];
            let right = row[(x + 1).min(width - 1)];
            out[x] = k0 * left + k1 * row[x] + k2 * right;
        }
    }
}

/// Correlates along y (across rows) with replicate boundary.
///
/// The output must not alias the input and must have the same extents.
pub fn correlate_y(src: FieldView<'_>, kernel: &Kernel3, dst: &mut FieldViewMut<'_>) {
    debug_assert_eq!(src.shape(), dst.shape());
    let [k0, k1, k2] = kernel.taps();
    let height = src.height();
    for y in 0..height {
        let above = src.row(y.saturating_sub(1));
        let row = src.row(y);
        let below = src.row((y + 1).min(height - 1));
        let out = dst.row_mut(y);
        for x in 0..src.width() {
            out[x] = k0 * above[x] + k1 * row[x] + k2 * below[x];
        }
    }
}

/// Correlates along t over an image triplet, producing the centre-frame
/// combination `k[0]*f0 + k[1]*f1 + k[2]*f2` elementwise.
///
/// The temporal extent is exactly 3, so no boundary handling applies. The
/// three planes and the output must have identical lengths.
pub fn correlate_t(f0: &[f64], f1: &[f64], f2: &[f64], kernel: &Kernel3, dst: &mut [f64]) {
    debug_assert_eq!(f0.len(), dst.len());
    debug_assert_eq!(f1.len(), dst.len());
    debug_assert_eq!(f2.len(), dst.len());
    let [k0, k1, k2] = kernel.taps();
    for (((out, &a), &b), &c) in dst.iter_mut().zip(f0).zip(f1).zip(f2) {
        *out = k0 * a + k1 * b + k2 * c;
    }
}
