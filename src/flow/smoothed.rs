//! Three-frame Horn & Schunck solver with Sobel gradients.

use crate::field::{Field, FieldView, FieldViewMut, Shape};
use crate::flow::step::jacobi_update;
use crate::flow::{check_alpha, pack, unpack, SolverBuffers};
use crate::gradient::GradientEstimator;
use crate::laplacian::laplacian_avg_opencv;
use crate::trace::{trace_event, trace_span};
use crate::util::FlowResult;

/// Three-frame Horn & Schunck flow estimator.
///
/// A variation on the vanilla method: the spatio-temporal gradients come
/// from a 3-D Sobel operator over the image triplet, and the neighbourhood
/// means use the 4-neighbour averaging stencil common in OpenCV. The flow
/// is estimated at the centre frame. One instance serves one configured
/// shape and owns all iteration scratch; it is not safe for concurrent use.
pub struct SmoothedFlow {
    shape: Shape,
    gradient: GradientEstimator,
    bufs: SolverBuffers,
}

impl SmoothedFlow {
    /// Creates a solver for images of the given shape.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            gradient: GradientEstimator::sobel(shape),
            bufs: SolverBuffers::new(shape.len()),
        }
    }

    /// Returns the configured shape.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Reconfigures the shape, reallocating all scratch buffers.
    pub fn set_shape(&mut self, shape: Shape) {
        if shape == self.shape {
            return;
        }
        self.shape = shape;
        self.gradient.set_shape(shape);
        self.bufs.reallocate(shape.len());
    }

    /// Estimates the flow at `i2` from the triplet, starting from a zero
    /// field. Returns freshly allocated (u, v).
    pub fn run(
        &mut self,
        alpha: f64,
        iterations: usize,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        i3: FieldView<'_>,
    ) -> FlowResult<(Field, Field)> {
        let mut u = Field::zeros(self.shape);
        let mut v = Field::zeros(self.shape);
        self.run_inplace(
            alpha,
            iterations,
            i1,
            i2,
            i3,
            &mut u.view_mut(),
            &mut v.view_mut(),
        )?;
        Ok((u, v))
    }

    /// Estimates the flow at `i2`, using the caller's (u, v) as warm start
    /// and output.
    ///
    /// `iterations == 0` leaves (u, v) untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn run_inplace(
        &mut self,
        alpha: f64,
        iterations: usize,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        i3: FieldView<'_>,
        u: &mut FieldViewMut<'_>,
        v: &mut FieldViewMut<'_>,
    ) -> FlowResult<()> {
        check_alpha(alpha)?;
        u.expect_shape(self.shape, "u")?;
        v.expect_shape(self.shape, "v")?;
        if iterations == 0 {
            // Still reject malformed frames before declaring the no-op.
            i1.expect_shape(self.shape, "image1")?;
            i2.expect_shape(self.shape, "image2")?;
            i3.expect_shape(self.shape, "image3")?;
            return Ok(());
        }

        let _span = trace_span!(
            "smoothed_flow",
            iterations = iterations,
            height = self.shape.height,
            width = self.shape.width
        )
        .entered();

        self.evaluate_gradient(i1, i2, i3)?;
        pack(u.as_view(), &mut self.bufs.uw);
        pack(v.as_view(), &mut self.bufs.vw);

        let width = self.shape.width;
        let alpha2 = alpha * alpha;
        for _ in 0..iterations {
            self.average_means();
            jacobi_update(
                alpha2,
                width,
                &self.bufs.ex,
                &self.bufs.ey,
                &self.bufs.et,
                &self.bufs.ubar,
                &self.bufs.vbar,
                &mut self.bufs.uw,
                &mut self.bufs.vw,
            );
        }
        trace_event!("smoothed_flow_done", iterations = iterations, alpha = alpha);

        unpack(&self.bufs.uw, u, width);
        unpack(&self.bufs.vw, v, width);
        Ok(())
    }

    /// Pointwise smoothness error `(u_bar - u)^2 + (v_bar - v)^2` under the
    /// 4-neighbour averaging stencil.
    pub fn eval_ec2(&mut self, u: FieldView<'_>, v: FieldView<'_>) -> FlowResult<Field> {
        u.expect_shape(self.shape, "u")?;
        v.expect_shape(self.shape, "v")?;

        pack(u, &mut self.bufs.uw);
        pack(v, &mut self.bufs.vw);
        self.average_means();

        let mut out = Field::zeros(self.shape);
        let slice = out.as_mut_slice();
        for i in 0..slice.len() {
            let du = self.bufs.ubar[i] - self.bufs.uw[i];
            let dv = self.bufs.vbar[i] - self.bufs.vw[i];
            slice[i] = du * du + dv * dv;
        }
        Ok(out)
    }

    /// Pointwise brightness error `Ex*u + Ey*v + Et` for the triplet under
    /// the solver's Sobel gradients.
    #[allow(clippy::too_many_arguments)]
    pub fn eval_eb(
        &mut self,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        i3: FieldView<'_>,
        u: FieldView<'_>,
        v: FieldView<'_>,
    ) -> FlowResult<Field> {
        u.expect_shape(self.shape, "u")?;
        v.expect_shape(self.shape, "v")?;

        self.evaluate_gradient(i1, i2, i3)?;
        pack(u, &mut self.bufs.uw);
        pack(v, &mut self.bufs.vw);

        let mut out = Field::zeros(self.shape);
        let slice = out.as_mut_slice();
        for i in 0..slice.len() {
            slice[i] =
                self.bufs.ex[i] * self.bufs.uw[i] + self.bufs.ey[i] * self.bufs.vw[i]
                    + self.bufs.et[i];
        }
        Ok(out)
    }

    fn evaluate_gradient(
        &mut self,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        i3: FieldView<'_>,
    ) -> FlowResult<()> {
        let Shape { height, width } = self.shape;
        let mut ex = FieldViewMut::from_slice(&mut self.bufs.ex, height, width)
            .expect("scratch sized at construction");
        let mut ey = FieldViewMut::from_slice(&mut self.bufs.ey, height, width)
            .expect("scratch sized at construction");
        let mut et = FieldViewMut::from_slice(&mut self.bufs.et, height, width)
            .expect("scratch sized at construction");
        self.gradient
            .evaluate_into(i1, i2, i3, &mut ex, &mut ey, &mut et)
    }

    fn average_means(&mut self) {
        let Shape { height, width } = self.shape;
        let uw = FieldView::from_slice(&self.bufs.uw, height, width)
            .expect("scratch sized at construction");
        let mut ubar = FieldViewMut::from_slice(&mut self.bufs.ubar, height, width)
            .expect("scratch sized at construction");
        laplacian_avg_opencv(uw, &mut ubar);
        let vw = FieldView::from_slice(&self.bufs.vw, height, width)
            .expect("scratch sized at construction");
        let mut vbar = FieldViewMut::from_slice(&mut self.bufs.vbar, height, width)
            .expect("scratch sized at construction");
        laplacian_avg_opencv(vw, &mut vbar);
    }
}
