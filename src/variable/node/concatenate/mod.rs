use std::rc::Rc;

use ndarray::{s, Array2, Axis};

use crate::variable::{
    autograd::{Backward, Forward},
    gradient::Gradient,
    utils::Shared,
};

/// Stacks the rows of `left` on top of the rows of `right`.
pub(crate) struct Concatenate {
    left: Shared<Array2<f64>>,
    right: Shared<Array2<f64>>,
    data: Shared<Array2<f64>>,
}

impl Concatenate {
    pub(crate) fn new(
        left: Shared<Array2<f64>>,
        right: Shared<Array2<f64>>,
        data: Shared<Array2<f64>>,
    ) -> Self {
        Self { left, right, data }
    }
}

impl Forward for Concatenate {
    fn forward(&self) {
        let left = self.left.borrow();
        let mut data = self.data.borrow_mut();
        let (mut left_portion, mut right_portion) =
            data.view_mut().split_at(Axis(0), left.nrows());

        left_portion.assign(&*left);
        right_portion.assign(&*self.right.borrow());
    }
}

pub(crate) struct ConcatenateBackwardLeft {
    operand_gradient: Rc<Gradient>,
    gradient: Rc<Gradient>,
}

impl ConcatenateBackwardLeft {
    pub(crate) fn new(operand_gradient: Rc<Gradient>, gradient: Rc<Gradient>) -> Self {
        Self {
            operand_gradient,
            gradient,
        }
    }
}

impl Backward for ConcatenateBackwardLeft {
    fn backward(&self) {
        let rows = self.operand_gradient.shape()[0];

        self.operand_gradient
            .accumulate(&self.gradient.borrow().slice(s![..rows, ..]));
    }
}

pub(crate) struct ConcatenateBackwardRight {
    operand_gradient: Rc<Gradient>,
    gradient: Rc<Gradient>,
    offset: usize,
}

impl ConcatenateBackwardRight {
    pub(crate) fn new(
        operand_gradient: Rc<Gradient>,
        gradient: Rc<Gradient>,
        offset: usize,
    ) -> Self {
        Self {
            operand_gradient,
            gradient,
            offset,
        }
    }
}

impl Backward for ConcatenateBackwardRight {
    fn backward(&self) {
        self.operand_gradient
            .accumulate(&self.gradient.borrow().slice(s![self.offset.., ..]));
    }
}

pub(crate) struct ConcatenateBackward {
    left: ConcatenateBackwardLeft,
    right: ConcatenateBackwardRight,
}

impl ConcatenateBackward {
    pub(crate) fn new(left: ConcatenateBackwardLeft, right: ConcatenateBackwardRight) -> Self {
        Self { left, right }
    }
}

impl Backward for ConcatenateBackward {
    fn backward(&self) {
        self.left.backward();
        self.right.backward();
    }
}

#[cfg(test)]
mod test;
