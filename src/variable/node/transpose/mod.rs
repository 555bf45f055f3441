use std::rc::Rc;

use ndarray::Array2;

use crate::variable::{
    autograd::{Backward, Forward},
    gradient::Gradient,
    utils::Shared,
};

pub(crate) struct Transpose {
    operand_data: Shared<Array2<f64>>,
    data: Shared<Array2<f64>>,
}

impl Transpose {
    pub(crate) fn new(operand_data: Shared<Array2<f64>>, data: Shared<Array2<f64>>) -> Self {
        Self { operand_data, data }
    }
}

impl Forward for Transpose {
    fn forward(&self) {
        self.data
            .borrow_mut()
            .assign(&self.operand_data.borrow().t());
    }
}

pub(crate) struct TransposeBackward {
    operand_gradient: Rc<Gradient>,
    gradient: Rc<Gradient>,
}

impl TransposeBackward {
    pub(crate) fn new(operand_gradient: Rc<Gradient>, gradient: Rc<Gradient>) -> Self {
        Self {
            operand_gradient,
            gradient,
        }
    }
}

impl Backward for TransposeBackward {
    fn backward(&self) {
        self.operand_gradient.accumulate(&self.gradient.borrow().t());
    }
}
