use std::cell::Ref;

use ndarray::Array2;
use rand::Rng;

use super::init;
use crate::{
    variable::utils::{new_shared, Shared},
    Tensor, Var, VarDiff,
};

/// A trainable matrix that persists across training iterations.
///
/// Forward passes only ever read it, through [`.view()`](Parameter::view()) or
/// [`.constant()`](Parameter::constant()), which bind a graph leaf to the parameter's values
/// without copying them. Only an optimizer step replaces its values.
pub struct Parameter {
    data: Shared<Array2<f64>>,
}

impl Parameter {
    /// Creates a parameter holding `array`.
    pub fn new(array: Array2<f64>) -> Self {
        Self {
            data: new_shared(array),
        }
    }

    /// Creates a parameter initialized with [`init::xavier_uniform`].
    pub fn xavier_uniform<R: Rng + ?Sized>(shape: (usize, usize), rng: &mut R) -> Self {
        Self::new(init::xavier_uniform(shape, rng))
    }

    /// Returns the current values.
    pub fn data(&self) -> Ref<Array2<f64>> {
        self.data.borrow()
    }

    /// Returns the number of rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        self.data.borrow().dim()
    }

    /// Copies the current values out into a tensor.
    pub fn to_tensor(&self) -> Tensor {
        Tensor::from(self.data.borrow().clone())
    }

    /// Returns a differentiable leaf bound to the parameter's values. Every call returns a leaf
    /// with a distinct, zeroed, gradient.
    pub fn view(&self) -> VarDiff {
        VarDiff::view(self.data.clone())
    }

    /// Returns a non-differentiable leaf bound to the parameter's values.
    pub fn constant(&self) -> Var {
        Var::shared(self.data.clone())
    }

    pub(crate) fn shared(&self) -> Shared<Array2<f64>> {
        self.data.clone()
    }

    pub(crate) fn replace(&self, array: Array2<f64>) {
        *self.data.borrow_mut() = array;
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("data", &*self.data.borrow())
            .finish()
    }
}
