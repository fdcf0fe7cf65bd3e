//! Hand-computed checks for the separable gradient estimators.
//!
//! The single-bright-pixel cases below exercise the replicate boundary on
//! every edge of a 3x3 frame, so each expected matrix doubles as a boundary
//! check.

use hornflow::{Field, GradientEstimator, Shape};

fn delta_center() -> Field {
    let mut data = vec![0.0; 9];
    data[4] = 1.0;
    Field::from_vec(data, 3, 3).unwrap()
}

fn zeros() -> Field {
    Field::zeros(Shape::new(3, 3).unwrap())
}

fn assert_matrix(actual: &Field, expected: &[f64; 9]) {
    for (i, (&a, &e)) in actual.as_slice().iter().zip(expected).enumerate() {
        assert_eq!(a, e, "mismatch at flat index {i}");
    }
}

#[test]
fn sobel_bright_pixel_in_centre_frame() {
    let shape = Shape::new(3, 3).unwrap();
    let mut grad = GradientEstimator::sobel(shape);
    let (ex, ey, et) = grad
        .evaluate(zeros().view(), delta_center().view(), zeros().view())
        .unwrap();

    // d(x) on the bright row gives [-1, 0, 1]; a(y) stacks it 1:2:1 and the
    // temporal average doubles the centre frame.
    assert_matrix(&ex, &[-2.0, 0.0, 2.0, -4.0, 0.0, 4.0, -2.0, 0.0, 2.0]);
    assert_matrix(&ey, &[-2.0, -4.0, -2.0, 0.0, 0.0, 0.0, 2.0, 4.0, 2.0]);
    // The temporal difference kernel has a zero centre tap, so a brightness
    // change confined to the centre frame leaves Et untouched.
    assert_matrix(&et, &[0.0; 9]);
}

#[test]
fn sobel_bright_pixel_in_trailing_frame() {
    let shape = Shape::new(3, 3).unwrap();
    let mut grad = GradientEstimator::sobel(shape);
    let (_, _, et) = grad
        .evaluate(zeros().view(), zeros().view(), delta_center().view())
        .unwrap();

    // Spatial smoothing of the delta, negated by the trailing tap of
    // [1, 0, -1].
    assert_matrix(&et, &[-1.0, -2.0, -1.0, -2.0, -4.0, -2.0, -1.0, -2.0, -1.0]);
}

#[test]
fn sobel_bright_pixel_in_leading_frame() {
    let shape = Shape::new(3, 3).unwrap();
    let mut grad = GradientEstimator::sobel(shape);
    let (_, _, et) = grad
        .evaluate(delta_center().view(), zeros().view(), zeros().view())
        .unwrap();

    assert_matrix(&et, &[1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]);
}

#[test]
fn prewitt_weighs_the_averaging_axis_uniformly() {
    let shape = Shape::new(3, 3).unwrap();
    let mut grad = GradientEstimator::prewitt(shape);
    let (ex, ey, _) = grad
        .evaluate(zeros().view(), delta_center().view(), zeros().view())
        .unwrap();

    assert_matrix(&ex, &[-1.0, 0.0, 1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0]);
    assert_matrix(&ey, &[-1.0, -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
}

#[test]
fn sobel_and_prewitt_differ_by_the_averaging_weights() {
    let shape = Shape::new(3, 3).unwrap();
    let stimulus = delta_center();

    let mut sobel = GradientEstimator::sobel(shape);
    let (sx, _, _) = sobel
        .evaluate(zeros().view(), stimulus.view(), zeros().view())
        .unwrap();
    let mut prewitt = GradientEstimator::prewitt(shape);
    let (px, _, _) = prewitt
        .evaluate(zeros().view(), stimulus.view(), zeros().view())
        .unwrap();

    // Off the bright row both operators average the same [-1, 0, 1]
    // response; Sobel's temporal centre tap doubles it.
    assert_eq!(sx.at(0, 0), 2.0 * px.at(0, 0));
    assert_eq!(sx.at(2, 2), 2.0 * px.at(2, 2));
    // On the bright row Sobel additionally weighs the y-average 2:1.
    assert_eq!(sx.at(1, 0), 4.0 * px.at(1, 0));
}

#[test]
fn isotropic_uses_sqrt2_centre_weight() {
    let shape = Shape::new(3, 3).unwrap();
    let mut grad = GradientEstimator::isotropic(shape);
    let (ex, _, _) = grad
        .evaluate(zeros().view(), delta_center().view(), zeros().view())
        .unwrap();

    let s = std::f64::consts::SQRT_2;
    // Same composition as the Sobel case with the 2s replaced by sqrt(2).
    assert_eq!(ex.at(0, 0), -s);
    assert_eq!(ex.at(1, 0), -s * s);
    assert_eq!(ex.at(1, 2), s * s);
}

#[test]
fn zero_difference_kernel_kills_every_component() {
    use hornflow::Kernel3;

    let shape = Shape::new(4, 4).unwrap();
    let zero = Kernel3::new([0.0, 0.0, 0.0]).unwrap();
    let avg = Kernel3::new([1.0, 2.0, 1.0]).unwrap();
    let mut grad = GradientEstimator::new(zero, avg, shape);

    let ramp = Field::from_vec((0..16).map(f64::from).collect(), 4, 4).unwrap();
    let (ex, ey, et) = grad
        .evaluate(ramp.view(), ramp.view(), ramp.view())
        .unwrap();
    assert!(ex.as_slice().iter().all(|&v| v == 0.0));
    assert!(ey.as_slice().iter().all(|&v| v == 0.0));
    assert!(et.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn uniform_triplet_has_zero_temporal_gradient() {
    let shape = Shape::new(5, 5).unwrap();
    let mut grad = GradientEstimator::sobel(shape);
    let flat = Field::from_vec(vec![3.5; 25], 5, 5).unwrap();
    let (ex, ey, et) = grad
        .evaluate(flat.view(), flat.view(), flat.view())
        .unwrap();
    assert!(et.as_slice().iter().all(|&v| v == 0.0));
    assert!(ex.as_slice().iter().all(|&v| v == 0.0));
    assert!(ey.as_slice().iter().all(|&v| v == 0.0));
}
