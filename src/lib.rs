//! Dense optical-flow estimation with the Horn & Schunck variational
//! method, together with the spatio-temporal gradient operators it
//! consumes.
//!
//! The crate works on plain (height, width) float64 matrices handed over as
//! [`FieldView`]s; there is no image I/O here. A typical session builds a
//! solver once for a frame shape and reuses it:
//!
//! ```
//! use hornflow::{Field, Shape, VanillaFlow};
//!
//! let shape = Shape::new(3, 3).unwrap();
//! let i1 = Field::from_vec((1..=9).map(f64::from).collect(), 3, 3).unwrap();
//! let i2 = i1.clone();
//! let mut solver = VanillaFlow::new(shape);
//! let (u, v) = solver.run(1.0, 10, i1.view(), i2.view()).unwrap();
//! assert!(u.as_slice().iter().all(|&x| x == 0.0));
//! assert!(v.as_slice().iter().all(|&x| x == 0.0));
//! ```

pub mod field;
pub mod flow;
pub mod gradient;
pub mod kernel;
pub mod laplacian;
pub mod util;

mod trace;

pub use field::{Field, FieldView, FieldViewMut, Shape};
pub use flow::{flow_error, SmoothedFlow, VanillaFlow};
pub use gradient::GradientEstimator;
pub use kernel::Kernel3;
pub use laplacian::{
    laplacian_avg_hs, laplacian_avg_hs_field, laplacian_avg_opencv, laplacian_avg_opencv_field,
};
pub use util::{FlowError, FlowResult};
