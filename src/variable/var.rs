use std::{
    cell::{Ref, RefMut},
    rc::Rc,
};

use ndarray::{Array2, Ix2};

use super::{
    autograd::Forward,
    cat_shape,
    gradient::Gradient,
    history::History,
    mm_shape,
    node::{
        check_rows, Concatenate, MatrixMatrixMul, SequenceCriterion, SequenceLoss, SumRows,
        Transpose,
    },
    utils::{new_shared, Shared},
    Cat, MatMatMul, VarDiff,
};
use crate::Result;

/// A non-differentiable variable.
///
/// This, together with its differentiable counterpart [`VarDiff`], is the main building block of
/// every computation. Conceptually it is a matrix for which the computations are automatically
/// kept track of. Results are computed lazily: build the expression first, then call
/// [`.forward()`](Var::forward()).
#[derive(Clone)]
pub struct Var {
    pub(crate) data: Shared<Array2<f64>>,
    pub(crate) history: History<Rc<dyn Forward>>,
}

impl Var {
    pub(crate) fn leaf(array: Array2<f64>) -> Self {
        Self::shared(new_shared(array))
    }

    /// Creates a leaf that reads `data` without copying it.
    pub(crate) fn shared(data: Shared<Array2<f64>>) -> Self {
        Self {
            data,
            history: History::default(),
        }
    }

    pub(crate) fn node(
        data: Shared<Array2<f64>>,
        op: Rc<dyn Forward>,
        mut history: History<Rc<dyn Forward>>,
    ) -> Self {
        history.insert(op);

        Self { data, history }
    }

    /// Promotes `self` to a differentiable variable. A subsequent call to
    /// [`.backward()`](VarDiff::backward()) will compute its gradient.
    ///
    /// ```
    /// let x = image_orderer::zeros((2, 3)).requires_grad();
    ///
    /// assert_eq!(x.grad().shape(), &[2, 3]);
    /// ```
    pub fn requires_grad(self) -> VarDiff {
        let grad = Gradient::zeros(self.data.borrow().raw_dim());
        VarDiff::leaf(self, grad)
    }

    /// Propagates the computations forwards and populates all the variables from the leaves of
    /// the graph to `self`.
    pub fn forward(&self) {
        let mut buffer = self.history.buffer_mut();

        if buffer.is_empty() {
            *buffer = self.history.to_vec()
        }

        buffer.iter().for_each(|op| op.forward());
    }

    /// Returns an immutable reference to the data inside `self`.
    ///
    /// The data of a non-leaf variable is filled with zeros until [`.forward()`](Var::forward())
    /// is called.
    pub fn data(&self) -> Ref<Array2<f64>> {
        self.data.borrow()
    }

    /// Returns a mutable reference to the data inside `self`.
    pub fn data_mut(&self) -> RefMut<Array2<f64>> {
        self.data.borrow_mut()
    }

    /// Returns the number of rows and columns.
    pub fn shape(&self) -> (usize, usize) {
        self.data.borrow().dim()
    }

    /// Returns the transpose of `self`.
    pub fn t(self) -> Var {
        let (rows, cols) = self.shape();
        let data = new_shared(Array2::zeros((cols, rows)));
        let op = Transpose::new(self.data, data.clone());

        Var::node(data, Rc::new(op), self.history)
    }

    /// Sums the rows of `self`. If `self` is *(n, m)* the result is *(1, m)*.
    pub fn sum_rows(self) -> Var {
        let (_, cols) = self.shape();
        let data = new_shared(Array2::zeros((1, cols)));
        let op = SumRows::new(self.data, data.clone());

        Var::node(data, Rc::new(op), self.history)
    }

    /// Evaluates `criterion` on the rows of `self`, producing a *(1, 1)* variable.
    ///
    /// Fails with [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) if `self` has less than
    /// three rows.
    pub fn sequence_loss(self, criterion: SequenceCriterion) -> Result<Var> {
        check_rows(&self.data().view())?;

        let data = new_shared(Array2::zeros((1, 1)));
        let op = SequenceLoss::new(self.data, data.clone(), criterion);

        Ok(Var::node(data, Rc::new(op), self.history))
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

    fn raw_dim(&self) -> Ix2 {
        self.data.borrow().raw_dim()
    }
}

impl MatMatMul<Var> for Var {
    type Output = Var;

    fn mm(mut self, rhs: Var) -> Result<Self::Output> {
        let shape = mm_shape(self.raw_dim(), rhs.raw_dim())?;
        let data = new_shared(Array2::zeros(shape));
        let op = MatrixMatrixMul::new(self.data, rhs.data, data.clone());
        self.history.merge(rhs.history);

        Ok(Var::node(data, Rc::new(op), self.history))
    }
}

impl MatMatMul<VarDiff> for Var {
    type Output = VarDiff;

    fn mm(self, rhs: VarDiff) -> Result<Self::Output> {
        rhs.mm_left_constant(self)
    }
}

impl Cat<Var> for Var {
    type Output = Var;

    fn cat(mut self, rhs: Var) -> Result<Self::Output> {
        let shape = cat_shape(self.raw_dim(), rhs.raw_dim())?;
        let data = new_shared(Array2::zeros(shape));
        let op = Concatenate::new(self.data, rhs.data, data.clone());
        self.history.merge(rhs.history);

        Ok(Var::node(data, Rc::new(op), self.history))
    }
}

impl Cat<VarDiff> for Var {
    type Output = VarDiff;

    fn cat(self, rhs: VarDiff) -> Result<Self::Output> {
        rhs.cat_below_constant(self)
    }
}

impl From<Array2<f64>> for Var {
    fn from(array: Array2<f64>) -> Self {
        Var::leaf(array)
    }
}
