//! Python bindings for the hornflow optical-flow library.
//!
//! Exposes the Horn & Schunck solvers, the spatio-temporal gradient
//! estimators, the laplacian-averaging operators and the flow-error utility
//! over 2-D float64 numpy arrays.

use numpy::ndarray::Array2;
use numpy::{
    IntoPyArray, PyArray1, PyArray2, PyArrayMethods, PyReadonlyArray2, PyUntypedArrayMethods,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use hornflow::{
    Field, FieldView, FieldViewMut, FlowError, GradientEstimator as RustGradientEstimator,
    Kernel3, Shape, SmoothedFlow as RustSmoothedFlow, VanillaFlow as RustVanillaFlow,
};

/// Converts a FlowError to a Python exception.
fn to_py_err(err: FlowError) -> PyErr {
    match err {
        FlowError::KernelLength { .. }
        | FlowError::KernelNotFinite { .. }
        | FlowError::NonFiniteAlpha { .. } => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn parse_shape(shape: (usize, usize)) -> PyResult<Shape> {
    Shape::new(shape.0, shape.1).map_err(to_py_err)
}

fn view_from_array<'py, 'a>(array: &'a PyReadonlyArray2<'py, f64>) -> PyResult<FieldView<'a>> {
    let dims = array.shape();
    let data = array.as_slice()?;
    FieldView::from_slice(data, dims[0], dims[1]).map_err(to_py_err)
}

fn field_to_array(py: Python<'_>, field: Field) -> Bound<'_, PyArray2<f64>> {
    let shape = field.shape();
    Array2::from_shape_vec((shape.height, shape.width), field.into_vec())
        .expect("field buffer matches its shape")
        .into_pyarray(py)
}

/// Parametric spatio-temporal gradient estimator.
#[pyclass]
pub struct GradientEstimator {
    inner: RustGradientEstimator,
}

#[pymethods]
impl GradientEstimator {
    /// Create an estimator from difference and average kernels.
    ///
    /// Args:
    ///     difference: 1-D float64 array with exactly 3 taps
    ///     average: 1-D float64 array with exactly 3 taps
    ///     shape: (height, width) of the images to be treated
    #[new]
    fn new(
        difference: numpy::PyReadonlyArray1<'_, f64>,
        average: numpy::PyReadonlyArray1<'_, f64>,
        shape: (usize, usize),
    ) -> PyResult<Self> {
        let difference = Kernel3::from_slice(difference.as_slice()?).map_err(to_py_err)?;
        let average = Kernel3::from_slice(average.as_slice()?).map_err(to_py_err)?;
        let shape = parse_shape(shape)?;
        Ok(Self {
            inner: RustGradientEstimator::new(difference, average, shape),
        })
    }

    /// Sobel estimator: difference [1, 0, -1], average [1, 2, 1].
    #[staticmethod]
    fn sobel(shape: (usize, usize)) -> PyResult<Self> {
        Ok(Self {
            inner: RustGradientEstimator::sobel(parse_shape(shape)?),
        })
    }

    /// Prewitt estimator: difference [1, 0, -1], average [1, 1, 1].
    #[staticmethod]
    fn prewitt(shape: (usize, usize)) -> PyResult<Self> {
        Ok(Self {
            inner: RustGradientEstimator::prewitt(parse_shape(shape)?),
        })
    }

    /// Isotropic estimator: difference [1, 0, -1], average [1, sqrt(2), 1].
    #[staticmethod]
    fn isotropic(shape: (usize, usize)) -> PyResult<Self> {
        Ok(Self {
            inner: RustGradientEstimator::isotropic(parse_shape(shape)?),
        })
    }

    /// Evaluate (ex, ey, et) for an image triplet.
    fn evaluate<'py>(
        &mut self,
        py: Python<'py>,
        image1: PyReadonlyArray2<'_, f64>,
        image2: PyReadonlyArray2<'_, f64>,
        image3: PyReadonlyArray2<'_, f64>,
    ) -> PyResult<(
        Bound<'py, PyArray2<f64>>,
        Bound<'py, PyArray2<f64>>,
        Bound<'py, PyArray2<f64>>,
    )> {
        let i1 = view_from_array(&image1)?;
        let i2 = view_from_array(&image2)?;
        let i3 = view_from_array(&image3)?;
        let (ex, ey, et) = self.inner.evaluate(i1, i2, i3).map_err(to_py_err)?;
        Ok((
            field_to_array(py, ex),
            field_to_array(py, ey),
            field_to_array(py, et),
        ))
    }

    /// The configured (height, width).
    #[getter]
    fn get_shape(&self) -> (usize, usize) {
        let shape = self.inner.shape();
        (shape.height, shape.width)
    }

    #[setter]
    fn set_shape(&mut self, shape: (usize, usize)) -> PyResult<()> {
        self.inner.set_shape(parse_shape(shape)?);
        Ok(())
    }

    /// The difference kernel.
    #[getter]
    fn get_difference<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.difference().taps().to_vec())
    }

    #[setter]
    fn set_difference(&mut self, kernel: numpy::PyReadonlyArray1<'_, f64>) -> PyResult<()> {
        self.inner
            .set_difference(Kernel3::from_slice(kernel.as_slice()?).map_err(to_py_err)?);
        Ok(())
    }

    /// The averaging kernel.
    #[getter]
    fn get_average<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        PyArray1::from_vec(py, self.inner.average().taps().to_vec())
    }

    #[setter]
    fn set_average(&mut self, kernel: numpy::PyReadonlyArray1<'_, f64>) -> PyResult<()> {
        self.inner
            .set_average(Kernel3::from_slice(kernel.as_slice()?).map_err(to_py_err)?);
        Ok(())
    }

    fn __repr__(&self) -> String {
        let shape = self.inner.shape();
        format!("<GradientEstimator(({}, {}))>", shape.height, shape.width)
    }

    fn __str__(&self) -> String {
        format!("{}", self.inner)
    }
}

/// Two-frame Horn & Schunck flow estimator.
#[pyclass]
pub struct VanillaFlow {
    inner: RustVanillaFlow,
}

#[pymethods]
impl VanillaFlow {
    /// Create a solver for images of the given (height, width).
    #[new]
    fn new(shape: (usize, usize)) -> PyResult<Self> {
        Ok(Self {
            inner: RustVanillaFlow::new(parse_shape(shape)?),
        })
    }

    /// Estimate the flow between image1 and image2.
    ///
    /// Provide both u and v for a warm start (they are updated in place and
    /// returned), or neither to start from a zero field.
    #[pyo3(signature = (alpha, iterations, image1, image2, u = None, v = None))]
    #[allow(clippy::too_many_arguments)]
    fn estimate<'py>(
        &mut self,
        py: Python<'py>,
        alpha: f64,
        iterations: usize,
        image1: PyReadonlyArray2<'_, f64>,
        image2: PyReadonlyArray2<'_, f64>,
        u: Option<Bound<'py, PyArray2<f64>>>,
        v: Option<Bound<'py, PyArray2<f64>>>,
    ) -> PyResult<(Bound<'py, PyArray2<f64>>, Bound<'py, PyArray2<f64>>)> {
        let i1 = view_from_array(&image1)?;
        let i2 = view_from_array(&image2)?;
        match (u, v) {
            (Some(u), Some(v)) => {
                {
                    let mut u_rw = u.readwrite();
                    let mut v_rw = v.readwrite();
                    let (uh, uw) = (u_rw.shape()[0], u_rw.shape()[1]);
                    let (vh, vw) = (v_rw.shape()[0], v_rw.shape()[1]);
                    let mut u_view = FieldViewMut::from_slice(u_rw.as_slice_mut()?, uh, uw)
                        .map_err(to_py_err)?;
                    let mut v_view = FieldViewMut::from_slice(v_rw.as_slice_mut()?, vh, vw)
                        .map_err(to_py_err)?;
                    self.inner
                        .run_inplace(alpha, iterations, i1, i2, &mut u_view, &mut v_view)
                        .map_err(to_py_err)?;
                }
                Ok((u, v))
            }
            (None, None) => {
                let (u, v) = self
                    .inner
                    .run(alpha, iterations, i1, i2)
                    .map_err(to_py_err)?;
                Ok((field_to_array(py, u), field_to_array(py, v)))
            }
            _ => Err(PyValueError::new_err("provide both u and v, or neither")),
        }
    }

    /// Pointwise smoothness error (u_bar - u)^2 + (v_bar - v)^2.
    fn eval_ec2<'py>(
        &mut self,
        py: Python<'py>,
        u: PyReadonlyArray2<'_, f64>,
        v: PyReadonlyArray2<'_, f64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let u = view_from_array(&u)?;
        let v = view_from_array(&v)?;
        let out = self.inner.eval_ec2(u, v).map_err(to_py_err)?;
        Ok(field_to_array(py, out))
    }

    /// Pointwise brightness error Ex*u + Ey*v + Et.
    fn eval_eb<'py>(
        &mut self,
        py: Python<'py>,
        image1: PyReadonlyArray2<'_, f64>,
        image2: PyReadonlyArray2<'_, f64>,
        u: PyReadonlyArray2<'_, f64>,
        v: PyReadonlyArray2<'_, f64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let i1 = view_from_array(&image1)?;
        let i2 = view_from_array(&image2)?;
        let u = view_from_array(&u)?;
        let v = view_from_array(&v)?;
        let out = self.inner.eval_eb(i1, i2, u, v).map_err(to_py_err)?;
        Ok(field_to_array(py, out))
    }

    /// The configured (height, width).
    #[getter]
    fn get_shape(&self) -> (usize, usize) {
        let shape = self.inner.shape();
        (shape.height, shape.width)
    }

    #[setter]
    fn set_shape(&mut self, shape: (usize, usize)) -> PyResult<()> {
        self.inner.set_shape(parse_shape(shape)?);
        Ok(())
    }

    fn __repr__(&self) -> String {
        let shape = self.inner.shape();
        format!("<VanillaFlow(({}, {}))>", shape.height, shape.width)
    }
}

/// Three-frame Horn & Schunck flow estimator with Sobel gradients.
#[pyclass]
pub struct SmoothedFlow {
    inner: RustSmoothedFlow,
}

#[pymethods]
impl SmoothedFlow {
    /// Create a solver for images of the given (height, width).
    #[new]
    fn new(shape: (usize, usize)) -> PyResult<Self> {
        Ok(Self {
            inner: RustSmoothedFlow::new(parse_shape(shape)?),
        })
    }

    /// Estimate the flow at image2 from the triplet.
    ///
    /// Provide both u and v for a warm start (they are updated in place and
    /// returned), or neither to start from a zero field.
    #[pyo3(signature = (alpha, iterations, image1, image2, image3, u = None, v = None))]
    #[allow(clippy::too_many_arguments)]
    fn estimate<'py>(
        &mut self,
        py: Python<'py>,
        alpha: f64,
        iterations: usize,
        image1: PyReadonlyArray2<'_, f64>,
        image2: PyReadonlyArray2<'_, f64>,
        image3: PyReadonlyArray2<'_, f64>,
        u: Option<Bound<'py, PyArray2<f64>>>,
        v: Option<Bound<'py, PyArray2<f64>>>,
    ) -> PyResult<(Bound<'py, PyArray2<f64>>, Bound<'py, PyArray2<f64>>)> {
        let i1 = view_from_array(&image1)?;
        let i2 = view_from_array(&image2)?;
        let i3 = view_from_array(&image3)?;
        match (u, v) {
            (Some(u), Some(v)) => {
                {
                    let mut u_rw = u.readwrite();
                    let mut v_rw = v.readwrite();
                    let (uh, uw) = (u_rw.shape()[0], u_rw.shape()[1]);
                    let (vh, vw) = (v_rw.shape()[0], v_rw.shape()[1]);
                    let mut u_view = FieldViewMut::from_slice(u_rw.as_slice_mut()?, uh, uw)
                        .map_err(to_py_err)?;
                    let mut v_view = FieldViewMut::from_slice(v_rw.as_slice_mut()?, vh, vw)
                        .map_err(to_py_err)?;
                    self.inner
                        .run_inplace(alpha, iterations, i1, i2, i3, &mut u_view, &mut v_view)
                        .map_err(to_py_err)?;
                }
                Ok((u, v))
            }
            (None, None) => {
                let (u, v) = self
                    .inner
                    .run(alpha, iterations, i1, i2, i3)
                    .map_err(to_py_err)?;
                Ok((field_to_array(py, u), field_to_array(py, v)))
            }
            _ => Err(PyValueError::new_err("provide both u and v, or neither")),
        }
    }

    /// Pointwise smoothness error (u_bar - u)^2 + (v_bar - v)^2.
    fn eval_ec2<'py>(
        &mut self,
        py: Python<'py>,
        u: PyReadonlyArray2<'_, f64>,
        v: PyReadonlyArray2<'_, f64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let u = view_from_array(&u)?;
        let v = view_from_array(&v)?;
        let out = self.inner.eval_ec2(u, v).map_err(to_py_err)?;
        Ok(field_to_array(py, out))
    }

    /// Pointwise brightness error Ex*u + Ey*v + Et.
    #[allow(clippy::too_many_arguments)]
    fn eval_eb<'py>(
        &mut self,
        py: Python<'py>,
        image1: PyReadonlyArray2<'_, f64>,
        image2: PyReadonlyArray2<'_, f64>,
        image3: PyReadonlyArray2<'_, f64>,
        u: PyReadonlyArray2<'_, f64>,
        v: PyReadonlyArray2<'_, f64>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let i1 = view_from_array(&image1)?;
        let i2 = view_from_array(&image2)?;
        let i3 = view_from_array(&image3)?;
        let u = view_from_array(&u)?;
        let v = view_from_array(&v)?;
        let out = self.inner.eval_eb(i1, i2, i3, u, v).map_err(to_py_err)?;
        Ok(field_to_array(py, out))
    }

    /// The configured (height, width).
    #[getter]
    fn get_shape(&self) -> (usize, usize) {
        let shape = self.inner.shape();
        (shape.height, shape.width)
    }

    #[setter]
    fn set_shape(&mut self, shape: (usize, usize)) -> PyResult<()> {
        self.inner.set_shape(parse_shape(shape)?);
        Ok(())
    }

    fn __repr__(&self) -> String {
        let shape = self.inner.shape();
        format!("<SmoothedFlow(({}, {}))>", shape.height, shape.width)
    }
}

/// Classical Horn & Schunck neighbourhood average of a 2-D field.
#[pyfunction]
fn laplacian_avg_hs<'py>(
    py: Python<'py>,
    input: PyReadonlyArray2<'_, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let view = view_from_array(&input)?;
    Ok(field_to_array(py, hornflow::laplacian_avg_hs_field(view)))
}

/// OpenCV-style 4-neighbour average of a 2-D field.
#[pyfunction]
fn laplacian_avg_opencv<'py>(
    py: Python<'py>,
    input: PyReadonlyArray2<'_, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let view = view_from_array(&input)?;
    Ok(field_to_array(py, hornflow::laplacian_avg_opencv_field(view)))
}

/// Generalised flow error i2(x - u, y - v) - i1(x, y) with bilinear
/// resampling.
#[pyfunction]
fn flow_error<'py>(
    py: Python<'py>,
    image1: PyReadonlyArray2<'_, f64>,
    image2: PyReadonlyArray2<'_, f64>,
    u: PyReadonlyArray2<'_, f64>,
    v: PyReadonlyArray2<'_, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let i1 = view_from_array(&image1)?;
    let i2 = view_from_array(&image2)?;
    let u = view_from_array(&u)?;
    let v = view_from_array(&v)?;
    let out = hornflow::flow_error(i1, i2, u, v).map_err(to_py_err)?;
    Ok(field_to_array(py, out))
}

/// Python module for hornflow optical-flow estimation.
#[pymodule]
fn _hornflow(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<GradientEstimator>()?;
    m.add_class::<VanillaFlow>()?;
    m.add_class::<SmoothedFlow>()?;
    m.add_function(wrap_pyfunction!(laplacian_avg_hs, m)?)?;
    m.add_function(wrap_pyfunction!(laplacian_avg_opencv, m)?)?;
    m.add_function(wrap_pyfunction!(flow_error, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
