use std::cell::{Ref, RefCell, RefMut};

use ndarray::{Array2, ArrayBase, Data, Ix2};

/// The seed gradient buffer of a node.
///
/// It has the same shape as the node's data, starts at zero and is summed into on every backward
/// visit.
pub(crate) struct Gradient {
    array: RefCell<Array2<f64>>,
}

impl Gradient {
    pub(crate) fn zeros(shape: Ix2) -> Self {
        Self::from_ndarray(Array2::zeros(shape))
    }

    pub(crate) fn from_ndarray(array: Array2<f64>) -> Self {
        Self {
            array: RefCell::new(array),
        }
    }

    pub(crate) fn borrow(&self) -> Ref<Array2<f64>> {
        self.array.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<Array2<f64>> {
        self.array.borrow_mut()
    }

    pub(crate) fn shape(&self) -> Ix2 {
        self.array.borrow().raw_dim()
    }

    /// Sums `upstream` into the buffer.
    pub(crate) fn accumulate<S>(&self, upstream: &ArrayBase<S, Ix2>)
    where
        S: Data<Elem = f64>,
    {
        *self.array.borrow_mut() += upstream;
    }

    /// Zeroes the buffer.
    pub(crate) fn reset(&self) {
        self.array.borrow_mut().fill(0.);
    }
}
