use ndarray::Array2;
use rand::Rng;

use super::Parameter;
use crate::{variable::MatMatMul, Error, Result, Var, VarDiff};

/// Two-stage linear map applied to every row of its input.
///
/// Given a *(h, v)* matrix **M** and a *(h, h)* weights matrix **W**, with *h = v / 2*, the
/// transform of a *(r, v)* input **X** is:
///
/// ```text
/// T(X) = X · Mᵀ · Wᵀ · M
/// ```
///
/// Every row of **X** is projected onto *h* components, mixed by **W** and lifted back to *v*
/// components, so the output has the same shape as the input.
#[derive(Debug)]
pub struct LinearTransform {
    matrix: Parameter,
    weights: Parameter,
}

/// The result of a differentiable application of a [`LinearTransform`], together with the
/// leaves bound to its parameters.
pub struct TransformPass {
    /// Transformed input.
    pub output: VarDiff,
    /// Leaf bound to the matrix, holding its gradient after a backward pass.
    pub matrix: VarDiff,
    /// Leaf bound to the weights, holding their gradient after a backward pass.
    pub weights: VarDiff,
}

impl LinearTransform {
    /// Creates a transform for vectors of length `vector_size` with both parameters
    /// initialized by [`init::xavier_uniform`](super::init::xavier_uniform).
    ///
    /// Fails with [`Error::InvalidConfig`] if `vector_size` is zero or odd.
    pub fn new<R: Rng + ?Sized>(vector_size: usize, rng: &mut R) -> Result<Self> {
        let half = half_size(vector_size)?;

        Ok(Self {
            matrix: Parameter::xavier_uniform((half, vector_size), rng),
            weights: Parameter::xavier_uniform((half, half), rng),
        })
    }

    /// Creates a transform from given parameter values.
    ///
    /// Fails with [`Error::ShapeMismatch`] unless `matrix` is *(v / 2, v)* and `weights` is
    /// *(v / 2, v / 2)*.
    pub fn from_arrays(matrix: Array2<f64>, weights: Array2<f64>) -> Result<Self> {
        let (rows, vector_size) = matrix.dim();
        let half = half_size(vector_size)?;

        if rows != half {
            return Err(Error::shape(&[half, vector_size], matrix.shape()));
        }
        if weights.dim() != (half, half) {
            return Err(Error::shape(&[half, half], weights.shape()));
        }

        Ok(Self {
            matrix: Parameter::new(matrix),
            weights: Parameter::new(weights),
        })
    }

    /// The *(h, v)* projection matrix.
    pub fn matrix(&self) -> &Parameter {
        &self.matrix
    }

    /// The *(h, h)* weights.
    pub fn weights(&self) -> &Parameter {
        &self.weights
    }

    /// Length of the transformed vectors.
    pub fn vector_size(&self) -> usize {
        self.matrix.shape().1
    }

    /// Number of components of the projection.
    pub fn half_size(&self) -> usize {
        self.matrix.shape().0
    }

    /// Builds the differentiable transform of `input` reading the parameters through `matrix`
    /// and `weights`.
    pub fn apply_with<X>(input: X, matrix: VarDiff, weights: VarDiff) -> Result<VarDiff>
    where
        X: MatMatMul<VarDiff, Output = VarDiff>,
    {
        MatMatMul::mm(input, matrix.clone().t())?
            .mm(weights.t())?
            .mm(matrix)
    }

    /// Builds the differentiable transform of `input` through fresh views of the parameters.
    pub fn apply<X>(&self, input: X) -> Result<TransformPass>
    where
        X: MatMatMul<VarDiff, Output = VarDiff>,
    {
        let matrix = self.matrix.view();
        let weights = self.weights.view();
        let output = Self::apply_with(input, matrix.clone(), weights.clone())?;

        Ok(TransformPass {
            output,
            matrix,
            weights,
        })
    }

    /// Builds the non-differentiable transform of `input`.
    pub fn constant(&self, input: Var) -> Result<Var> {
        input
            .mm(self.matrix.constant().t())?
            .mm(self.weights.constant().t())?
            .mm(self.matrix.constant())
    }

    pub(crate) fn check_rows(&self, shape: (usize, usize)) -> Result<()> {
        let vector_size = self.vector_size();
        if shape.0 == 0 || shape.1 != vector_size {
            return Err(Error::shape(
                &[shape.0.max(1), vector_size],
                &[shape.0, shape.1],
            ));
        }

        Ok(())
    }
}

/// The transform applied to the whole batch of encodings at once.
#[derive(Debug)]
pub struct OrderingTransform {
    transform: LinearTransform,
}

impl OrderingTransform {
    /// Wraps `transform`.
    pub fn new(transform: LinearTransform) -> Self {
        Self { transform }
    }

    /// The underlying transform.
    pub fn transform(&self) -> &LinearTransform {
        &self.transform
    }

    /// Transforms the *(n, v)* stacked `encodings`, evaluating the result.
    ///
    /// Fails with [`Error::ShapeMismatch`] if `encodings` is empty or its rows are not of
    /// length *v*.
    pub fn forward(&self, encodings: VarDiff) -> Result<TransformPass> {
        self.transform.check_rows(encodings.shape())?;

        let pass = self.transform.apply(encodings)?;
        pass.output.forward();

        Ok(pass)
    }

    /// Transforms `encodings` without tracking gradients.
    pub fn evaluate(&self, encodings: &Array2<f64>) -> Result<Array2<f64>> {
        self.transform.check_rows(encodings.dim())?;

        let output = self.transform.constant(Var::from(encodings.clone()))?;
        output.forward();

        let data = output.data().clone();
        Ok(data)
    }
}

fn half_size(vector_size: usize) -> Result<usize> {
    if vector_size == 0 || vector_size % 2 != 0 {
        return Err(Error::InvalidConfig(format!(
            "vector size must be even and positive, got {}",
            vector_size
        )));
    }

    Ok(vector_size / 2)
}
