//! The original two-frame Horn & Schunck solver.

use crate::field::{Field, FieldView, FieldViewMut, Shape};
use crate::flow::step::jacobi_update;
use crate::flow::{check_alpha, pack, unpack, SolverBuffers};
use crate::laplacian::laplacian_avg_hs;
use crate::trace::{trace_event, trace_span};
use crate::util::FlowResult;

/// Two-frame Horn & Schunck flow estimator.
///
/// Gradients are the paper's forward differences averaged over the 2x2x2
/// neighbourhood spanned by the frame pair; neighbourhood means use the
/// classical 8-neighbour stencil. One instance serves one configured shape
/// and owns all iteration scratch; it is not safe for concurrent use.
pub struct VanillaFlow {
    shape: Shape,
    bufs: SolverBuffers,
}

impl VanillaFlow {
    /// Creates a solver for images of the given shape.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
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
        self.bufs.reallocate(shape.len());
    }

    /// Estimates the flow between `i1` and `i2`, starting from a zero
    /// field. Returns freshly allocated (u, v).
    pub fn run(
        &mut self,
        alpha: f64,
        iterations: usize,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
    ) -> FlowResult<(Field, Field)> {
        let mut u = Field::zeros(self.shape);
        let mut v = Field::zeros(self.shape);
        self.run_inplace(
            alpha,
            iterations,
            i1,
            i2,
            &mut u.view_mut(),
            &mut v.view_mut(),
        )?;
        Ok((u, v))
    }

    /// Estimates the flow between `i1` and `i2`, using the caller's (u, v)
    /// as warm start and output.
    ///
    /// `iterations == 0` leaves (u, v) untouched.
    pub fn run_inplace(
        &mut self,
        alpha: f64,
        iterations: usize,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        u: &mut FieldViewMut<'_>,
        v: &mut FieldViewMut<'_>,
    ) -> FlowResult<()> {
        check_alpha(alpha)?;
        i1.expect_shape(self.shape, "image1")?;
        i2.expect_shape(self.shape, "image2")?;
        u.expect_shape(self.shape, "u")?;
        v.expect_shape(self.shape, "v")?;
        if iterations == 0 {
            return Ok(());
        }

        let _span = trace_span!(
            "vanilla_flow",
            iterations = iterations,
            height = self.shape.height,
            width = self.shape.width
        )
        .entered();

        self.forward_gradient(i1, i2);
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
        trace_event!("vanilla_flow_done", iterations = iterations, alpha = alpha);

        unpack(&self.bufs.uw, u, width);
        unpack(&self.bufs.vw, v, width);
        Ok(())
    }

    /// Pointwise smoothness error `(u_bar - u)^2 + (v_bar - v)^2` under the
    /// classical averaging stencil.
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

    /// Pointwise brightness error `Ex*u + Ey*v + Et` for the frame pair
    /// under the solver's forward-difference gradients.
    pub fn eval_eb(
        &mut self,
        i1: FieldView<'_>,
        i2: FieldView<'_>,
        u: FieldView<'_>,
        v: FieldView<'_>,
    ) -> FlowResult<Field> {
        i1.expect_shape(self.shape, "image1")?;
        i2.expect_shape(self.shape, "image2")?;
        u.expect_shape(self.shape, "u")?;
        v.expect_shape(self.shape, "v")?;

        self.forward_gradient(i1, i2);
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

    fn average_means(&mut self) {
        let Shape { height, width } = self.shape;
        let uw = FieldView::from_slice(&self.bufs.uw, height, width)
            .expect("scratch sized at construction");
        let mut ubar = FieldViewMut::from_slice(&mut self.bufs.ubar, height, width)
            .expect("scratch sized at construction");
        laplacian_avg_hs(uw, &mut ubar);
        let vw = FieldView::from_slice(&self.bufs.vw, height, width)
            .expect("scratch sized at construction");
        let mut vbar = FieldViewMut::from_slice(&mut self.bufs.vbar, height, width)
            .expect("scratch sized at construction");
        laplacian_avg_hs(vw, &mut vbar);
    }

    /// Forward-difference gradients averaged over the 2x2x2 cube at each
    /// pixel, replicating the last column and row.
    fn forward_gradient(&mut self, i1: FieldView<'_>, i2: FieldView<'_>) {
        let Shape { height, width } = self.shape;
        for y in 0..height {
            let y1 = (y + 1).min(height - 1);
            let a0 = i1.row(y);
            let a1 = i1.row(y1);
            let b0 = i2.row(y);
            let b1 = i2.row(y1);
            let base = y * width;
            for x in 0..width {
                let x1 = (x + 1).min(width - 1);
                let i = base + x;
                self.bufs.ex[i] = 0.25
                    * ((a0[x1] - a0[x]) + (a1[x1] - a1[x]) + (b0[x1] - b0[x])
                        + (b1[x1] - b1[x]));
                self.bufs.ey[i] = 0.25
                    * ((a1[x] - a0[x]) + (a1[x1] - a0[x1]) + (b1[x] - b0[x])
                        + (b1[x1] - b0[x1]));
                self.bufs.et[i] = 0.25
                    * ((b0[x] - a0[x]) + (b0[x1] - a0[x1]) + (b1[x] - a1[x])
                        + (b1[x1] - a1[x1]));
            }
        }
    }
}
