//! Dense float64 matrices and borrowed views.
//!
//! `FieldView` is a borrowed 2-D view into a 1-D `f64` buffer with an
//! explicit stride; a stride larger than the width represents padded rows.
//! `FieldViewMut` is the mutable counterpart used for caller-owned outputs.
//! `Field` owns a contiguous buffer and hands out either view. Images and
//! flow components share these types: both are plain (height, width)
//! matrices to every operator in this crate.

use crate::util::{FlowError, FlowResult};

/// Matrix extents as (height, width), fixed per operator instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    /// Number of rows.
    pub height: usize,
    /// Number of columns.
    pub width: usize,
}

impl Shape {
    /// Creates a shape, rejecting zero extents.
    pub fn new(height: usize, width: usize) -> FlowResult<Self> {
        if height == 0 || width == 0 {
            return Err(FlowError::InvalidDimensions { width, height });
        }
        Ok(Self { height, width })
    }

    /// Number of elements in a contiguous matrix of this shape.
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    /// Returns true for the degenerate zero-element shape.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Borrowed 2-D float64 view with an explicit stride.
#[derive(Copy, Clone)]
pub struct FieldView<'a> {
    data: &'a [f64],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> FieldView<'a> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [f64], height: usize, width: usize) -> FlowResult<Self> {
        Self::new(data, height, width, width)
    }

    /// Creates a view with an explicit row stride.
    pub fn new(data: &'a [f64], height: usize, width: usize, stride: usize) -> FlowResult<Self> {
        let needed = required_len(height, width, stride)?;
        if data.len() < needed {
            return Err(FlowError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the view width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the view height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the view extents as a `Shape`.
    pub fn shape(&self) -> Shape {
        Shape {
            height: self.height,
            width: self.width,
        }
    }

    /// Returns the element at `(y, x)` if it is within bounds.
    pub fn get(&self, y: usize, x: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.stride + x).copied()
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> &'a [f64] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Fails unless the view extents equal `shape`; `context` names the
    /// argument in the resulting error.
    pub fn expect_shape(&self, shape: Shape, context: &'static str) -> FlowResult<()> {
        if self.height != shape.height || self.width != shape.width {
            return Err(FlowError::ShapeMismatch {
                height: shape.height,
                width: shape.width,
                got_height: self.height,
                got_width: self.width,
                context,
            });
        }
        Ok(())
    }
}

/// Mutable 2-D float64 view with an explicit stride.
pub struct FieldViewMut<'a> {
    data: &'a mut [f64],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> FieldViewMut<'a> {
    /// Creates a contiguous mutable view with `stride == width`.
    pub fn from_slice(data: &'a mut [f64], height: usize, width: usize) -> FlowResult<Self> {
        Self::new(data, height, width, width)
    }

    /// Creates a mutable view with an explicit row stride.
    pub fn new(
        data: &'a mut [f64],
        height: usize,
        width: usize,
        stride: usize,
    ) -> FlowResult<Self> {
        let needed = required_len(height, width, stride)?;
        if data.len() < needed {
            return Err(FlowError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the view width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the view height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the view extents as a `Shape`.
    pub fn shape(&self) -> Shape {
        Shape {
            height: self.height,
            width: self.width,
        }
    }

    /// Reborrows as an immutable view.
    pub fn as_view(&self) -> FieldView<'_> {
        FieldView {
            data: &*self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// Returns a contiguous mutable slice for row `y` with length `width`.
    pub fn row_mut(&mut self, y: usize) -> &mut [f64] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Writes `value` into every element of the view.
    pub fn fill(&mut self, value: f64) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    /// Fails unless the view extents equal `shape`; `context` names the
    /// argument in the resulting error.
    pub fn expect_shape(&self, shape: Shape, context: &'static str) -> FlowResult<()> {
        if self.height != shape.height || self.width != shape.width {
            return Err(FlowError::ShapeMismatch {
                height: shape.height,
                width: shape.width,
                got_height: self.height,
                got_width: self.width,
                context,
            });
        }
        Ok(())
    }
}

/// Owned contiguous float64 matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    data: Vec<f64>,
    shape: Shape,
}

impl Field {
    /// Creates a zero-filled matrix of the given shape.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            data: vec![0.0; shape.len()],
            shape,
        }
    }

    /// Wraps an existing buffer; the length must equal `height * width`.
    pub fn from_vec(data: Vec<f64>, height: usize, width: usize) -> FlowResult<Self> {
        let shape = Shape::new(height, width)?;
        if data.len() != shape.len() {
            return Err(FlowError::BufferTooSmall {
                needed: shape.len(),
                got: data.len(),
            });
        }
        Ok(Self { data, shape })
    }

    /// Copies the contents of a borrowed view into an owned matrix.
    pub fn from_view(view: FieldView<'_>) -> Self {
        let shape = view.shape();
        let mut data = Vec::with_capacity(shape.len());
        for y in 0..shape.height {
            data.extend_from_slice(view.row(y));
        }
        Self { data, shape }
    }

    /// Returns the matrix extents.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the backing buffer in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the backing buffer mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Returns a borrowed view of the matrix.
    pub fn view(&self) -> FieldView<'_> {
        FieldView {
            data: &self.data,
            width: self.shape.width,
            height: self.shape.height,
            stride: self.shape.width,
        }
    }

    /// Returns a mutable view of the matrix.
    pub fn view_mut(&mut self) -> FieldViewMut<'_> {
        FieldViewMut {
            data: &mut self.data,
            width: self.shape.width,
            height: self.shape.height,
            stride: self.shape.width,
        }
    }

    /// Returns the element at `(y, x)`; panics out of bounds.
    pub fn at(&self, y: usize, x: usize) -> f64 {
        self.data[y * self.shape.width + x]
    }

    /// Consumes the matrix, returning the row-major buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

fn required_len(height: usize, width: usize, stride: usize) -> FlowResult<usize> {
    if width == 0 || height == 0 {
        return Err(FlowError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(FlowError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(FlowError::InvalidDimensions { width, height })
}
