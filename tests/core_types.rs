use hornflow::{
    Field, FieldView, FieldViewMut, FlowError, GradientEstimator, Kernel3, Shape, VanillaFlow,
};

#[test]
fn field_view_rejects_invalid_dimensions() {
    let data = [0.0f64; 4];

    let err = FieldView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        FlowError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );

    let err = FieldView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        FlowError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );
}

#[test]
fn field_view_rejects_invalid_stride() {
    let data = [0.0f64; 8];
    let err = FieldView::new(&data, 1, 4, 3).err().unwrap();
    assert_eq!(
        err,
        FlowError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn field_view_rejects_small_buffer() {
    let data = [0.0f64; 3];
    let err = FieldView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, FlowError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn strided_views_read_padded_rows() {
    // Two 2x2 matrices packed with one padding element per row.
    let data = [1.0, 2.0, -1.0, 3.0, 4.0, -1.0];
    let view = FieldView::new(&data, 2, 2, 3).unwrap();
    assert_eq!(view.row(0), &[1.0, 2.0]);
    assert_eq!(view.row(1), &[3.0, 4.0]);
    assert_eq!(view.shape(), Shape::new(2, 2).unwrap());
}

#[test]
fn kernel_from_slice_enforces_length() {
    assert_eq!(
        Kernel3::from_slice(&[1.0, 0.0, -1.0, 0.0]).err().unwrap(),
        FlowError::KernelLength { got: 4 }
    );
    assert!(Kernel3::from_slice(&[1.0, 0.0, -1.0]).is_ok());
}

#[test]
fn solver_rejects_mismatched_inputs() {
    let shape = Shape::new(4, 4).unwrap();
    let mut solver = VanillaFlow::new(shape);
    let small = Field::zeros(Shape::new(3, 4).unwrap());
    let ok = Field::zeros(shape);

    let err = solver
        .run(1.0, 5, small.view(), ok.view())
        .err()
        .unwrap();
    assert_eq!(
        err,
        FlowError::ShapeMismatch {
            height: 4,
            width: 4,
            got_height: 3,
            got_width: 4,
            context: "image1",
        }
    );
}

#[test]
fn solver_rejects_non_finite_alpha() {
    let shape = Shape::new(2, 2).unwrap();
    let mut solver = VanillaFlow::new(shape);
    let i = Field::zeros(shape);

    for alpha in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = solver.run(alpha, 1, i.view(), i.view()).err().unwrap();
        assert!(matches!(err, FlowError::NonFiniteAlpha { .. }));
    }
}

#[test]
fn zero_iterations_leave_warm_start_untouched() {
    let shape = Shape::new(3, 3).unwrap();
    let mut solver = VanillaFlow::new(shape);
    let i1 = Field::from_vec((0..9).map(f64::from).collect(), 3, 3).unwrap();
    let i2 = Field::from_vec((9..18).map(f64::from).collect(), 3, 3).unwrap();

    let mut u_data = vec![0.5; 9];
    let mut v_data = vec![-0.5; 9];
    {
        let mut u = FieldViewMut::from_slice(&mut u_data, 3, 3).unwrap();
        let mut v = FieldViewMut::from_slice(&mut v_data, 3, 3).unwrap();
        solver
            .run_inplace(1.0, 0, i1.view(), i2.view(), &mut u, &mut v)
            .unwrap();
    }
    assert!(u_data.iter().all(|&x| x == 0.5));
    assert!(v_data.iter().all(|&x| x == -0.5));
}

#[test]
fn set_shape_round_trip_is_a_no_op() {
    let shape = Shape::new(3, 3).unwrap();
    let mut grad = GradientEstimator::sobel(shape);
    let frame = Field::from_vec((0..9).map(f64::from).collect(), 3, 3).unwrap();

    let (ex0, ey0, et0) = grad
        .evaluate(frame.view(), frame.view(), frame.view())
        .unwrap();
    grad.set_shape(grad.shape());
    let (ex1, ey1, et1) = grad
        .evaluate(frame.view(), frame.view(), frame.view())
        .unwrap();

    assert_eq!(ex0, ex1);
    assert_eq!(ey0, ey1);
    assert_eq!(et0, et1);
}

#[test]
fn kernel_round_trip_is_a_no_op() {
    let shape = Shape::new(4, 3).unwrap();
    let diff = Kernel3::new([1.0, 0.0, -1.0]).unwrap();
    let avg = Kernel3::new([0.25, 0.5, 0.25]).unwrap();
    let mut grad = GradientEstimator::new(diff, avg, shape);
    let frame = Field::from_vec((0..12).map(|v| (v * v) as f64).collect(), 4, 3).unwrap();

    let (ex0, _, _) = grad
        .evaluate(frame.view(), frame.view(), frame.view())
        .unwrap();
    grad.set_difference(grad.difference());
    grad.set_average(grad.average());
    let (ex1, _, _) = grad
        .evaluate(frame.view(), frame.view(), frame.view())
        .unwrap();

    assert_eq!(ex0, ex1);
}

#[test]
fn set_shape_reconfigures_the_estimator() {
    let mut grad = GradientEstimator::prewitt(Shape::new(2, 2).unwrap());
    let bigger = Shape::new(5, 6).unwrap();
    grad.set_shape(bigger);
    assert_eq!(grad.shape(), bigger);

    let frame = Field::zeros(bigger);
    let (ex, _, _) = grad
        .evaluate(frame.view(), frame.view(), frame.view())
        .unwrap();
    assert_eq!(ex.shape(), bigger);
}
