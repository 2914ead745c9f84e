use ndarray::{Array, Axis, IxDyn};
use crate::error::DetectError;

/// Model input/output tensor, wrapper over [`Array<f32, IxDyn>`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct X(pub Array<f32, IxDyn>);

impl From<Array<f32, IxDyn>> for X {
    fn from(x: Array<f32, IxDyn>) -> Self {
        Self(x)
    }
}

impl std::ops::Deref for X {
    type Target = Array<f32, IxDyn>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl X {
    pub fn from_shape_vec(shape: &[usize], xs: Vec<f32>) -> Result<Self, DetectError> {
        Array::from_shape_vec(shape, xs)
            .map(Self::from)
            .map_err(|e| DetectError::InvalidImage(e.to_string()))
    }

    /// Stacks tensors of identical `(1, C, H, W)` shape along the batch axis.
    pub fn concatenate(xs: &[X]) -> Result<Self, DetectError> {
        let views: Vec<_> = xs.iter().map(|x| x.0.view()).collect();
        ndarray::concatenate(Axis(0), &views)
            .map(Self::from)
            .map_err(|e| DetectError::InvalidImage(e.to_string()))
    }

    pub fn ndim(&self) -> usize {
        self.0.ndim()
    }

    pub fn into_inner(self) -> Array<f32, IxDyn> {
        self.0
    }
}
