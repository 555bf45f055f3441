use std::rc::Rc;

use ndarray::{Array2, Axis};

use crate::variable::{
    autograd::{Backward, Forward},
    gradient::Gradient,
    utils::Shared,
};

/// Reduces a *(rows, cols)* matrix to the *(1, cols)* row of its column sums.
pub(crate) struct SumRows {
    operand_data: Shared<Array2<f64>>,
    data: Shared<Array2<f64>>,
}

impl SumRows {
    pub(crate) fn new(operand_data: Shared<Array2<f64>>, data: Shared<Array2<f64>>) -> Self {
        Self { operand_data, data }
    }
}

impl Forward for SumRows {
    fn forward(&self) {
        let sums = self.operand_data.borrow().sum_axis(Axis(0));

        self.data.borrow_mut().row_mut(0).assign(&sums);
    }
}

pub(crate) struct SumRowsBackward {
    operand_gradient: Rc<Gradient>,
    gradient: Rc<Gradient>,
}

impl SumRowsBackward {
    pub(crate) fn new(operand_gradient: Rc<Gradient>, gradient: Rc<Gradient>) -> Self {
        Self {
            operand_gradient,
            gradient,
        }
    }
}

impl Backward for SumRowsBackward {
    fn backward(&self) {
        // Broadcasts the (1, cols) gradient over every row of the operand.
        self.operand_gradient.accumulate(&*self.gradient.borrow());
    }
}
