use std::{
    cell::{Ref, RefMut},
    rc::Rc,
};

use ndarray::{Array2, Dimension};

use super::{
    autograd::Backward,
    gradient::Gradient,
    history::History,
    node::{
        ConcatenateBackward, ConcatenateBackwardLeft, ConcatenateBackwardRight,
        MatrixMatrixMulBackward, MatrixMatrixMulBackwardLeft, MatrixMatrixMulBackwardRight,
        SequenceCriterion, SequenceLossBackward, SumRowsBackward, TransposeBackward,
    },
    utils::Shared,
    var::Var,
    Cat, MatMatMul,
};
use crate::{Error, Result};

type BackwardHistory = History<(Rc<dyn Backward>, Rc<Gradient>)>;

/// A differentiable variable.
///
/// Differentiable variables can be created in the **two** following ways:
///
/// 1. By calling [`.requires_grad()`](Var::requires_grad()) on a non-differentiable leaf.
///
/// 2. By performing any binary operation between a [`Var`] and a `VarDiff`. Differentiability
/// is thus a *contagious* property: the result of a computation involving a `VarDiff` is itself
/// differentiable.
///
/// Every differentiable variable owns a gradient of the same shape as its data. The gradient of a
/// leaf accumulates across calls to [`.backward()`](VarDiff::backward()) until
/// [`.zero_grad()`](VarDiff::zero_grad()) is called, while the gradients of the intermediate
/// results are recomputed from scratch at every backward pass.
#[derive(Clone)]
pub struct VarDiff {
    pub(crate) var: Var,
    pub(crate) grad: Rc<Gradient>,
    pub(crate) history: BackwardHistory,
}

impl VarDiff {
    pub(crate) fn leaf(var: Var, grad: Gradient) -> Self {
        Self {
            var,
            grad: Rc::new(grad),
            history: History::default(),
        }
    }

    /// Creates a differentiable leaf reading `data` without copying it, with a gradient of its
    /// own.
    pub(crate) fn view(data: Shared<Array2<f64>>) -> Self {
        let grad = Gradient::zeros(data.borrow().raw_dim());
        Self::leaf(Var::shared(data), grad)
    }

    pub(crate) fn node(
        var: Var,
        grad: Rc<Gradient>,
        op: (Rc<dyn Backward>, Rc<Gradient>),
        mut history: BackwardHistory,
    ) -> VarDiff {
        history.insert(op);

        Self { var, grad, history }
    }

    /// Returns an immutable reference to the data inside `self`.
    pub fn data(&self) -> Ref<Array2<f64>> {
        self.var.data()
    }

    /// Returns a mutable reference to the data inside `self`.
    pub fn data_mut(&self) -> RefMut<Array2<f64>> {
        self.var.data_mut()
    }

    /// Returns the number of rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        self.var.shape()
    }

    /// Returns an immutable reference to the gradient inside `self`.
    pub fn grad(&self) -> Ref<Array2<f64>> {
        self.grad.borrow()
    }

    /// Sets the variable's gradient to zero.
    pub fn zero_grad(&self) {
        self.grad.reset();
    }

    /// Propagates the computations forwards and populates all the variables and differentiable
    /// variables from the leaves of the graph to `self`.
    pub fn forward(&self) {
        self.var.forward();

        let mut buffer = self.history.buffer_mut();
        if buffer.is_empty() {
            *buffer = self.history.to_vec()
        }
    }

    /// Back-propagates through the computational graph and populates the gradients of the
    /// differentiable leaves that are ancestors of `self`. Before back-propagating, every element
    /// of the gradient of `self` is set to `seed`.
    ///
    /// # Panics
    ///
    /// If [`.forward()`](VarDiff::forward()) was not called first.
    pub fn backward(&self, seed: f64) {
        self.prepare_backward();
        self.grad.borrow_mut().fill(seed);
        self.propagate();
    }

    /// Back-propagates `upstream`, the gradient of some later computation with respect to
    /// `self`, down to the differentiable leaves that are ancestors of `self`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if `upstream` and `self` have different shapes.
    ///
    /// # Panics
    ///
    /// If [`.forward()`](VarDiff::forward()) was not called first.
    pub fn backward_with(&self, upstream: &Array2<f64>) -> Result<()> {
        let shape = self.grad.shape();
        if upstream.raw_dim() != shape {
            return Err(Error::shape(shape.slice(), upstream.shape()));
        }

        self.prepare_backward();
        self.grad.accumulate(upstream);
        self.propagate();

        Ok(())
    }

    fn prepare_backward(&self) {
        assert_eq!(
            self.var.history.len(),
            self.var.history.buffer_len(),
            "Perhaps you forgot to call .forward()?"
        );

        let mut buffer = self.history.buffer_mut();
        if buffer.is_empty() {
            *buffer = self.history.to_vec();
        }

        buffer.iter().for_each(|(_, grad)| grad.reset());
    }

    fn propagate(&self) {
        self.history
            .buffer()
            .iter()
            .rev()
            .for_each(|(op, _)| op.backward());
    }

    /// Returns the transpose of `self`.
    pub fn t(self) -> VarDiff {
        let var = self.var.t();
        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let op = TransposeBackward::new(self.grad, grad.clone());

        VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history)
    }

    /// Sums the rows of `self`. If `self` is *(n, m)* the result is *(1, m)*.
    pub fn sum_rows(self) -> VarDiff {
        let var = self.var.sum_rows();
        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let op = SumRowsBackward::new(self.grad, grad.clone());

        VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history)
    }

    /// Evaluates `criterion` on the rows of `self`, producing a *(1, 1)* differentiable variable.
    ///
    /// Fails with [`Error::ShapeMismatch`] if `self` has less than three rows.
    pub fn sequence_loss(self, criterion: SequenceCriterion) -> Result<VarDiff> {
        let operand_data = self.var.data.clone();
        let var = self.var.sequence_loss(criterion)?;
        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let op = SequenceLossBackward::new(operand_data, self.grad, grad.clone(), criterion);

        Ok(VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history))
    }

    /// Performs a matrix multiplication between `self` and `rhs`. If `self` is *(n, m)* and `rhs`
    /// is *(m, o)* the output will be *(n, o)*.
    pub fn mm<Rhs>(self, rhs: Rhs) -> Result<<Self as MatMatMul<Rhs>>::Output>
    where
        Self: MatMatMul<Rhs>,
    {
        MatMatMul::mm(self, rhs)
    }

    /// Stacks the rows of `rhs` below the rows of `self`.
    pub fn cat<Rhs>(self, rhs: Rhs) -> Result<<Self as Cat<Rhs>>::Output>
    where
        Self: Cat<Rhs>,
    {
        Cat::cat(self, rhs)
    }

    /// Computes `lhs · self` where `lhs` is not differentiable.
    pub(crate) fn mm_left_constant(self, lhs: Var) -> Result<VarDiff> {
        let left_data = lhs.data.clone();
        let var = lhs.mm(self.var)?;
        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let op = MatrixMatrixMulBackwardRight::new(left_data, self.grad, grad.clone());

        Ok(VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history))
    }

    /// Stacks the rows of `self` below those of the non-differentiable `top`.
    pub(crate) fn cat_below_constant(self, top: Var) -> Result<VarDiff> {
        let offset = top.shape().0;
        let var = top.cat(self.var)?;
        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let op = ConcatenateBackwardRight::new(self.grad, grad.clone(), offset);

        Ok(VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history))
    }
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~ Matrix Multiplication ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

impl MatMatMul<Var> for VarDiff {
    type Output = VarDiff;

    fn mm(self, rhs: Var) -> Result<Self::Output> {
        let right_data = rhs.data.clone();
        let var = self.var.mm(rhs)?;
        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let op = MatrixMatrixMulBackwardLeft::new(right_data, self.grad, grad.clone());

        Ok(VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history))
    }
}

impl MatMatMul<VarDiff> for VarDiff {
    type Output = VarDiff;

    fn mm(mut self, rhs: VarDiff) -> Result<Self::Output> {
        let left_data = self.var.data.clone();
        let right_data = rhs.var.data.clone();
        let var = self.var.mm(rhs.var)?;
        self.history.merge(rhs.history);

        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let left = MatrixMatrixMulBackwardLeft::new(right_data, self.grad, grad.clone());
        let right = MatrixMatrixMulBackwardRight::new(left_data, rhs.grad, grad.clone());
        let op = MatrixMatrixMulBackward::new(left, right);

        Ok(VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history))
    }
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~ Concatenate ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

impl Cat<Var> for VarDiff {
    type Output = VarDiff;

    fn cat(self, rhs: Var) -> Result<Self::Output> {
        let var = self.var.cat(rhs)?;
        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let op = ConcatenateBackwardLeft::new(self.grad, grad.clone());

        Ok(VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history))
    }
}

impl Cat<VarDiff> for VarDiff {
    type Output = VarDiff;

    fn cat(mut self, rhs: VarDiff) -> Result<Self::Output> {
        let offset = self.shape().0;
        let var = self.var.cat(rhs.var)?;
        self.history.merge(rhs.history);

        let grad = Rc::new(Gradient::zeros(var.data().raw_dim()));
        let left = ConcatenateBackwardLeft::new(self.grad, grad.clone());
        let right = ConcatenateBackwardRight::new(rhs.grad, grad.clone(), offset);
        let op = ConcatenateBackward::new(left, right);

        Ok(VarDiff::node(var, grad.clone(), (Rc::new(op), grad), self.history))
    }
}

#[cfg(test)]
mod test;
