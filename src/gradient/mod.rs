//! Separable spatio-temporal gradient estimators.
//!
//! An estimator is characterised by two 3-tap kernels, a difference kernel
//! `d` and an averaging kernel `a`, composed along the three axes of an
//! image triplet:
//!
//! - `Ex = d(x) a(y) a(t)`
//! - `Ey = a(x) d(y) a(t)`
//! - `Et = a(x) a(y) d(t)`
//!
//! Each component is evaluated as three sequential 1-D passes (x per frame,
//! then y per frame, then the temporal combination) so that the per-pixel
//! partial-sum tree never depends on buffer layout. Kernels are not
//! normalised here; scale factors propagate into the Horn & Schunck energy
//! through alpha and are the caller's responsibility.
//!
//! The classical fixed operators are provided as named constructors rather
//! than separate types; they differ only in the averaging kernel.

use crate::field::{Field, FieldView, FieldViewMut, Shape};
use crate::kernel::{correlate_t, correlate_x, correlate_y, Kernel3};
use crate::trace::trace_span;
use crate::util::FlowResult;

const DIFF: [f64; 3] = [1.0, 0.0, -1.0];

/// Spatio-temporal gradient estimator over an image triplet.
///
/// Owns the intermediate planes for the separable passes; the scratch is
/// sized at construction and reallocated by [`set_shape`](Self::set_shape).
pub struct GradientEstimator {
    shape: Shape,
    difference: Kernel3,
    average: Kernel3,
    // One x-pass temporary plus one filtered plane per frame.
    tmp: Vec<f64>,
    planes: [Vec<f64>; 3],
}

impl GradientEstimator {
    /// Creates a parametric estimator from caller-supplied kernels.
    pub fn new(difference: Kernel3, average: Kernel3, shape: Shape) -> Self {
        let len = shape.len();
        Self {
            shape,
            difference,
            average,
            tmp: vec![0.0; len],
            planes: [vec![0.0; len], vec![0.0; len], vec![0.0; len]],
        }
    }

    /// Sobel operator: difference `[1, 0, -1]`, average `[1, 2, 1]`.
    pub fn sobel(shape: Shape) -> Self {
        Self::fixed([1.0, 2.0, 1.0], shape)
    }

    /// Prewitt operator: difference `[1, 0, -1]`, average `[1, 1, 1]`.
    pub fn prewitt(shape: Shape) -> Self {
        Self::fixed([1.0, 1.0, 1.0], shape)
    }

    /// Isotropic operator: difference `[1, 0, -1]`, average `[1, sqrt(2), 1]`.
    pub fn isotropic(shape: Shape) -> Self {
        Self::fixed([1.0, std::f64::consts::SQRT_2, 1.0], shape)
    }

    fn fixed(average: [f64; 3], shape: Shape) -> Self {
        let difference = Kernel3::new(DIFF).expect("constant kernel is finite");
        let average = Kernel3::new(average).expect("constant kernel is finite");
        Self::new(difference, average, shape)
    }

    /// Returns the configured shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Reconfigures the shape, reallocating the internal scratch planes.
    pub fn set_shape(&mut self, shape: Shape) {
        if shape == self.shape {
            return;
        }
        self.shape = shape;
        let len = shape.len();
        self.tmp = vec![0.0; len];
        for plane in &mut self.planes {
            *plane = vec![0.0; len];
        }
    }

    /// Returns the difference kernel.
    pub fn difference(&self) -> Kernel3 {
        self.difference
    }

    /// Replaces the difference kernel.
    pub fn set_difference(&mut self, kernel: Kernel3) {
        self.difference = kernel;
    }

    /// Returns the averaging kernel.
    pub fn average(&self) -> Kernel3 {
        self.average
    }

    /// Replaces the averaging kernel.
    pub fn set_average(&mut self, kernel: Kernel3) {
        self.average = kernel;
    }

    /// Evaluates (Ex, Ey, Et) for the triplet, allocating the outputs.
    ///
    /// The gradient is taken with respect to the centre frame `i2`.
    pub fn evaluate(
        &mut self,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        i3: FieldView<'_>,
    ) -> FlowResult<(Field, Field, Field)> {
        let mut ex = Field::zeros(self.shape);
        let mut ey = Field::zeros(self.shape);
        let mut et = Field::zeros(self.shape);
        self.evaluate_into(
            i1,
            i2,
            i3,
            &mut ex.view_mut(),
            &mut ey.view_mut(),
            &mut et.view_mut(),
        )?;
        Ok((ex, ey, et))
    }

    /// Evaluates (Ex, Ey, Et) into caller-provided outputs.
    ///
    /// All six matrices must match the configured shape. Outputs must not
    /// alias the inputs.
    pub fn evaluate_into(
        &mut self,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        i3: FieldView<'_>,
        ex: &mut FieldViewMut<'_>,
        ey: &mut FieldViewMut<'_>,
        et: &mut FieldViewMut<'_>,
    ) -> FlowResult<()> {
        i1.expect_shape(self.shape, "image1")?;
        i2.expect_shape(self.shape, "image2")?;
        i3.expect_shape(self.shape, "image3")?;
        ex.expect_shape(self.shape, "ex")?;
        ey.expect_shape(self.shape, "ey")?;
        et.expect_shape(self.shape, "et")?;

        let _span = trace_span!(
            "gradient_evaluate",
            height = self.shape.height,
            width = self.shape.width
        )
        .entered();

        let d = self.difference;
        let a = self.average;
        self.component(&[i1, i2, i3], &d, &a, &a, ex);
        self.component(&[i1, i2, i3], &a, &d, &a, ey);
        self.component(&[i1, i2, i3], &a, &a, &d, et);
        Ok(())
    }

    /// Runs one separable component: `kx` along x and `ky` along y on every
    /// frame, then `kt` across the filtered planes.
    fn component(
        &mut self,
        frames: &[FieldView<'_>; 3],
        kx: &Kernel3,
        ky: &Kernel3,
        kt: &Kernel3,
        out: &mut FieldViewMut<'_>,
    ) {
        let Shape { height, width } = self.shape;
        for (frame, plane) in frames.iter().zip(self.planes.iter_mut()) {
            let mut tmp = FieldViewMut::from_slice(&mut self.tmp, height, width)
                .expect("scratch sized at construction");
            correlate_x(*frame, kx, &mut tmp);
            let mut dst = FieldViewMut::from_slice(plane, height, width)
                .expect("scratch sized at construction");
            correlate_y(tmp.as_view(), ky, &mut dst);
        }

        for y in 0..height {
            let start = y * width;
            correlate_t(
                &self.planes[0][start..start + width],
                &self.planes[1][start..start + width],
                &self.planes[2][start..start + width],
                kt,
                out.row_mut(y),
            );
        }
    }
}

impl std::fmt::Display for GradientEstimator {
    /// Human-readable dump: type name, configured shape, both kernels.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GradientEstimator(({}, {}))\n difference: {}\n average: {}",
            self.shape.height, self.shape.width, self.difference, self.average
        )
    }
}
