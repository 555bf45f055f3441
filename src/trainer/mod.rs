//! Training of the encoder and of the ordering transform.
//!
//! A [`VectorImageOrderer`] learns to encode images so that, once arranged in a target order
//! and transformed, their encodings lie on an evenly spaced path between two fixed anchors.
//!
//! Every iteration builds three graphs. The first one encodes each image through the shared
//! encoder parameters, the second one applies the ordering transform to the stacked encodings and
//! the last one evaluates the loss on the anchored sequence. Gradients flow back through them in
//! reverse order, passing through the target order's inverse on their way to the encoder, and
//! the parameters are updated only once every gradient is known.
//!
//! ```
//! use image_orderer::{trainer::{TrainerConfig, VectorImageOrderer}, Permutation, Tensor};
//!
//! # fn main() -> image_orderer::Result<()> {
//! let config = TrainerConfig::default().with_vector_size(4).with_learning_rate(1e-4);
//! let mut orderer = VectorImageOrderer::new(config)?;
//!
//! let batch: Vec<_> = (0..3)
//!     .map(|i| Tensor::from_shape_vec(&[2, 4], vec![0.1 * i as f64; 8]))
//!     .collect::<Result<_, _>>()?;
//! let order = Permutation::new(vec![2, 0, 1])?;
//!
//! let (loss, encodings) = orderer.train_ordering(&batch, &order, 10, |_, _| {})?;
//! assert!(loss.is_finite());
//! assert_eq!(encodings[0].shape(), &[1, 4]);
//! # Ok(())
//! # }
//! ```
mod config;

use std::path::Path;

use ndarray::{s, Array2, Axis};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    nn::{Encoder, LinearTransform, OrderingTransform, Parameter},
    optim::GradientDescent,
    Error, Permutation, Result, Tensor, Var,
};

pub use config::{Strategy, TrainerConfig};

/// The image conversion collaborator: turns the image stored at `path` into a
/// *(rows, vector_size)* tensor whose left half holds the brightness channel and whose right
/// half holds the hue channel.
///
/// Closures with a matching signature implement it.
pub trait ImageSource {
    /// Converts the image at `path`.
    fn image_to_tensor(&self, path: &Path) -> Result<Tensor>;
}

impl<F> ImageSource for F
where
    F: Fn(&Path) -> Result<Tensor>,
{
    fn image_to_tensor(&self, path: &Path) -> Result<Tensor> {
        self(path)
    }
}

/// Returns the anchor preceding the sequence: every component is `0.5`.
pub fn start_anchor(vector_size: usize) -> Array2<f64> {
    Array2::from_elem((1, vector_size), 0.5)
}

/// Returns the anchor following the sequence: the first half of the components is `0.5`, the
/// second half `-0.5`.
pub fn end_anchor(vector_size: usize) -> Array2<f64> {
    let mut anchor = Array2::from_elem((1, vector_size), 0.5);
    anchor.slice_mut(s![.., vector_size / 2..]).fill(-0.5);
    anchor
}

/// Everything computed by a training iteration, before the parameters are updated.
#[derive(Clone, Debug)]
pub struct IterationReport {
    /// Loss of the anchored sequence.
    pub loss: f64,
    /// *(1, v)* encoding of every image, in batch order.
    pub encodings: Vec<Array2<f64>>,
    /// Gradient of the loss with respect to every encoding, in batch order.
    pub encoding_gradients: Vec<Array2<f64>>,
    /// Gradients of the encoder's matrix and weights, summed over the batch.
    pub encoder_gradients: (Array2<f64>, Array2<f64>),
    /// Gradients of the ordering transform's matrix and weights.
    pub ordering_gradients: (Array2<f64>, Array2<f64>),
}

/// Snapshot of the four trained parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Encoder's *(v / 2, v)* matrix.
    pub encoding_matrix: Tensor,
    /// Encoder's *(v / 2, v / 2)* weights.
    pub encoding_weights: Tensor,
    /// Ordering transform's *(v / 2, v)* matrix.
    pub ordering_matrix: Tensor,
    /// Ordering transform's *(v / 2, v / 2)* weights.
    pub ordering_weights: Tensor,
}

/// Learns image encodings whose arrangement in a target order forms an evenly spaced sequence.
pub struct VectorImageOrderer {
    config: TrainerConfig,
    encoder: Encoder,
    ordering: OrderingTransform,
    optim: GradientDescent,
}

impl VectorImageOrderer {
    /// Creates an orderer whose parameters are initialized from `config.seed`.
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let encoder = LinearTransform::new(config.vector_size, &mut rng)?;
        let ordering = LinearTransform::new(config.vector_size, &mut rng)?;

        Self::build(config, encoder, ordering)
    }

    /// Creates an orderer resuming from `checkpoint`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the parameters don't match `config.vector_size`.
    pub fn from_checkpoint(config: TrainerConfig, checkpoint: &Checkpoint) -> Result<Self> {
        config.validate()?;

        let encoder = LinearTransform::from_arrays(
            checkpoint.encoding_matrix.to_matrix()?,
            checkpoint.encoding_weights.to_matrix()?,
        )?;
        let ordering = LinearTransform::from_arrays(
            checkpoint.ordering_matrix.to_matrix()?,
            checkpoint.ordering_weights.to_matrix()?,
        )?;

        for transform in [&encoder, &ordering] {
            if transform.vector_size() != config.vector_size {
                let half = config.vector_size / 2;
                return Err(Error::shape(
                    &[half, config.vector_size],
                    &[transform.half_size(), transform.vector_size()],
                ));
            }
        }

        Self::build(config, encoder, ordering)
    }

    fn build(
        config: TrainerConfig,
        encoder: LinearTransform,
        ordering: LinearTransform,
    ) -> Result<Self> {
        let optim = GradientDescent::new(config.learning_rate)?;

        Ok(Self {
            config,
            encoder: Encoder::new(encoder),
            ordering: OrderingTransform::new(ordering),
            optim,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Returns the encoder's matrix and weights.
    pub fn encoding_parameters(&self) -> (&Parameter, &Parameter) {
        let transform = self.encoder.transform();
        (transform.matrix(), transform.weights())
    }

    /// Returns the ordering transform's matrix and weights.
    pub fn ordering_parameters(&self) -> (&Parameter, &Parameter) {
        let transform = self.ordering.transform();
        (transform.matrix(), transform.weights())
    }

    /// Copies the current parameters out.
    pub fn checkpoint(&self) -> Checkpoint {
        let (encoding_matrix, encoding_weights) = self.encoding_parameters();
        let (ordering_matrix, ordering_weights) = self.ordering_parameters();

        Checkpoint {
            encoding_matrix: encoding_matrix.to_tensor(),
            encoding_weights: encoding_weights.to_tensor(),
            ordering_matrix: ordering_matrix.to_tensor(),
            ordering_weights: ordering_weights.to_tensor(),
        }
    }

    /// Encodes `image` with the current parameters, producing a *(1, v)* tensor.
    pub fn encode(&self, image: &Tensor) -> Result<Tensor> {
        Ok(Tensor::from(self.encoder.encode(&image.to_matrix()?)?))
    }

    /// Converts the image at `path` with `source` and encodes it.
    pub fn encode_image<S, P>(&self, source: &S, path: P) -> Result<Tensor>
    where
        S: ImageSource + ?Sized,
        P: AsRef<Path>,
    {
        let image = source.image_to_tensor(path.as_ref())?;
        self.encode(&image)
    }

    /// Computes the loss of `batch` arranged by `target_order` without changing any parameter.
    pub fn evaluate(&self, batch: &[Tensor], target_order: &Permutation) -> Result<f64> {
        let images = self.prepare(batch, target_order)?;

        let mut stacked = Array2::zeros((images.len(), self.config.vector_size));
        for (mut row, image) in stacked.rows_mut().into_iter().zip(&images) {
            row.assign(&self.encoder.encode(image)?.row(0));
        }

        let body = match self.config.strategy {
            Strategy::TransformThenPermute => {
                target_order.arrange(&self.ordering.evaluate(&stacked)?)?
            }
            Strategy::PermuteThenTransform => {
                self.ordering.evaluate(&target_order.arrange(&stacked)?)?
            }
        };

        let (start, end) = self.anchors();
        let loss = start
            .cat(Var::from(body))?
            .cat(end)?
            .sequence_loss(self.config.criterion)?;
        loss.forward();

        let value = loss.data()[[0, 0]];
        Ok(value)
    }

    /// Runs one training iteration on `batch`, whose item `i` must take position
    /// `target_order[i]` in the sequence, and updates the parameters.
    ///
    /// The whole input is validated before anything else happens: on error no parameter has
    /// changed.
    pub fn step(
        &mut self,
        batch: &[Tensor],
        target_order: &Permutation,
    ) -> Result<IterationReport> {
        let images = self.prepare(batch, target_order)?;
        let (items, vector_size) = (images.len(), self.config.vector_size);

        self.encoder.reset();
        let mut encodings = Vec::with_capacity(items);
        for (index, image) in images.into_iter().enumerate() {
            let encoding = self.encoder.encode_instance(index, Var::from(image))?;
            encodings.push(encoding.data().clone());
        }

        let mut stacked = Array2::zeros((items, vector_size));
        for (mut row, encoding) in stacked.rows_mut().into_iter().zip(&encodings) {
            row.assign(&encoding.row(0));
        }

        let strategy = self.config.strategy;
        let input = match strategy {
            Strategy::TransformThenPermute => stacked,
            Strategy::PermuteThenTransform => target_order.arrange(&stacked)?,
        };
        let input = Var::from(input).requires_grad();
        let pass = self.ordering.forward(input.clone())?;

        let body = match strategy {
            Strategy::TransformThenPermute => target_order.arrange(&pass.output.data())?,
            Strategy::PermuteThenTransform => pass.output.data().clone(),
        };
        let body = Var::from(body).requires_grad();
        let (start, end) = self.anchors();
        let loss = start
            .cat(body.clone())?
            .cat(end)?
            .sequence_loss(self.config.criterion)?;
        loss.forward();
        loss.backward(1.);

        let loss_value = loss.data()[[0, 0]];
        if !loss_value.is_finite() {
            warn!(loss = loss_value, "non-finite ordering loss");
        }

        // Gradients of the interior rows of the sequence, in target order.
        let body_gradient = body.grad().clone();
        let encoding_gradient = match strategy {
            Strategy::TransformThenPermute => {
                pass.output
                    .backward_with(&target_order.restore(&body_gradient)?)?;
                input.grad().clone()
            }
            Strategy::PermuteThenTransform => {
                pass.output.backward_with(&body_gradient)?;
                target_order.restore(&input.grad())?
            }
        };

        let encoding_gradients: Vec<_> = encoding_gradient
            .axis_iter(Axis(0))
            .map(|row| row.insert_axis(Axis(0)).to_owned())
            .collect();
        self.encoder.backpropagate(&encoding_gradients)?;

        let encoder_gradients = {
            let (matrix, weights) = self.encoder.gradients()?;
            (matrix.clone(), weights.clone())
        };
        let ordering_gradients = (pass.matrix.grad().clone(), pass.weights.grad().clone());

        let (encoding_matrix, encoding_weights) = self.encoding_parameters();
        let (ordering_matrix, ordering_weights) = self.ordering_parameters();
        self.optim.step(&[
            (encoding_matrix, &encoder_gradients.0),
            (encoding_weights, &encoder_gradients.1),
            (ordering_matrix, &ordering_gradients.0),
            (ordering_weights, &ordering_gradients.1),
        ])?;

        debug!(loss = loss_value, items, ?strategy, "ordering step");

        Ok(IterationReport {
            loss: loss_value,
            encodings,
            encoding_gradients,
            encoder_gradients,
            ordering_gradients,
        })
    }

    /// Runs `iterations` training iterations on the same batch and returns the loss of the last
    /// one, together with the encodings of the batch under the trained parameters.
    ///
    /// `progress` receives the iteration index and its loss every
    /// [`log_every`](TrainerConfig::log_every) iterations and at the last one. With zero
    /// iterations the returned loss is the one of the untouched parameters.
    pub fn train_ordering<F>(
        &mut self,
        batch: &[Tensor],
        target_order: &Permutation,
        iterations: usize,
        mut progress: F,
    ) -> Result<(f64, Vec<Tensor>)>
    where
        F: FnMut(usize, f64),
    {
        let mut loss = self.evaluate(batch, target_order)?;

        for iteration in 0..iterations {
            loss = self.step(batch, target_order)?.loss;
            debug!(iteration, loss, "ordering iteration");

            if iteration % self.config.log_every == 0 || iteration + 1 == iterations {
                progress(iteration, loss);
            }
        }

        let encodings = batch
            .iter()
            .map(|image| self.encode(image))
            .collect::<Result<Vec<_>>>()?;

        info!(iterations, loss, items = batch.len(), "ordering trained");

        Ok((loss, encodings))
    }

    fn prepare(&self, batch: &[Tensor], target_order: &Permutation) -> Result<Vec<Array2<f64>>> {
        if batch.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if target_order.len() != batch.len() {
            return Err(Error::InvalidPermutation(format!(
                "order over {} items given for a batch of {}",
                target_order.len(),
                batch.len()
            )));
        }

        let transform = self.encoder.transform();
        batch
            .iter()
            .map(|image| {
                let matrix = image.to_matrix()?;
                transform.check_rows(matrix.dim())?;
                Ok(matrix)
            })
            .collect()
    }

    fn anchors(&self) -> (Var, Var) {
        let vector_size = self.config.vector_size;
        (
            Var::from(start_anchor(vector_size)),
            Var::from(end_anchor(vector_size)),
        )
    }
}
