use ndarray::Array2;

use super::{LinearTransform, SharedWeightCoordinator, WeightId};
use crate::{variable::MatMatMul, Result, Var, VarDiff};

/// Reduces a *(r, v)* image tensor to a single *(1, v)* encoding.
///
/// The encoding is the row-wise sum of the image's [`LinearTransform`]. The transform's
/// parameters are shared by every image of a batch: each instance reads them through its own
/// views, handed out by an internal [`SharedWeightCoordinator`], so that the gradients of all the
/// instances are summed once the batch has been differentiated.
pub struct Encoder {
    transform: LinearTransform,
    coordinator: SharedWeightCoordinator,
    matrix: WeightId,
    weights: WeightId,
}

impl Encoder {
    /// Creates an encoder sharing the parameters of `transform` among its instances.
    pub fn new(transform: LinearTransform) -> Self {
        let mut coordinator = SharedWeightCoordinator::new();
        let matrix = coordinator.register_shared_weight(transform.matrix());
        let weights = coordinator.register_shared_weight(transform.weights());

        Self {
            transform,
            coordinator,
            matrix,
            weights,
        }
    }

    /// The underlying transform.
    pub fn transform(&self) -> &LinearTransform {
        &self.transform
    }

    /// Builds and evaluates the encoding of the `index`-th image of the current batch.
    ///
    /// `input` is usually a constant [`Var`], but a differentiable one can be given to obtain the
    /// gradient with respect to the image itself.
    pub fn encode_instance<X>(&mut self, index: usize, input: X) -> Result<VarDiff>
    where
        X: MatMatMul<VarDiff, Output = VarDiff>,
    {
        let matrix = self.coordinator.use_at_index(self.matrix, index)?;
        let weights = self.coordinator.use_at_index(self.weights, index)?;

        let encoding = LinearTransform::apply_with(input, matrix, weights)?.sum_rows();
        encoding.forward();
        self.coordinator.register_result(encoding.clone());

        Ok(encoding)
    }

    /// Back-propagates `upstream[i]` through the `i`-th encoded instance and sums the parameter
    /// gradients. See [`SharedWeightCoordinator::backpropagate_all`].
    pub fn backpropagate(&mut self, upstream: &[Array2<f64>]) -> Result<()> {
        self.coordinator.backpropagate_all(upstream)
    }

    /// Returns the summed gradients of the matrix and of the weights.
    pub fn gradients(&self) -> Result<(&Array2<f64>, &Array2<f64>)> {
        Ok((
            self.coordinator.gradient(self.matrix)?,
            self.coordinator.gradient(self.weights)?,
        ))
    }

    /// Discards the instances of the current batch and zeroes the gradients.
    pub fn reset(&mut self) {
        self.coordinator.reset();
    }

    /// Computes the encoding of `image` without tracking gradients.
    ///
    /// Fails with [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) if `image` has no rows
    /// or its rows are not of the transform's vector size.
    pub fn encode(&self, image: &Array2<f64>) -> Result<Array2<f64>> {
        self.transform.check_rows(image.dim())?;

        let encoding = self
            .transform
            .constant(Var::from(image.clone()))?
            .sum_rows();
        encoding.forward();

        let data = encoding.data().clone();
        Ok(data)
    }
}
