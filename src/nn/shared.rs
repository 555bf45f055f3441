//! Coordination of parameters used by several forward instances within one iteration.
//!
//! When the same weight enters many independent computations, for instance the encoder applied
//! to every image of a batch, each computation reads the weight through a *view*: a leaf bound to
//! the weight's values, with a gradient of its own. Once every instance has been differentiated
//! the coordinator sums the views' gradients into a single accumulator per weight, which is what
//! the optimizer consumes.
//!
//! ```
//! use image_orderer::{nn::{Parameter, SharedWeightCoordinator}, Var};
//! use ndarray::array;
//!
//! # fn main() -> image_orderer::Result<()> {
//! let param = Parameter::new(array![[1., 2.], [3., 4.]]);
//! let mut coordinator = SharedWeightCoordinator::new();
//! let weight = coordinator.register_shared_weight(&param);
//!
//! for (index, input) in [array![[1., 0.]], array![[0., 1.]]].into_iter().enumerate() {
//!     let result = Var::from(input).mm(coordinator.use_at_index(weight, index)?)?;
//!     result.forward();
//!     coordinator.register_result(result);
//! }
//!
//! coordinator.backpropagate_all(&[array![[1., 1.]], array![[1., 1.]]])?;
//! assert_eq!(coordinator.gradient(weight)?, &array![[1., 1.], [1., 1.]]);
//! # Ok(())
//! # }
//! ```
use std::collections::BTreeMap;

use ndarray::Array2;

use super::Parameter;
use crate::{variable::utils::Shared, Error, Result, VarDiff};

/// Handle of a weight admitted into a [`SharedWeightCoordinator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeightId(usize);

struct SharedWeight {
    data: Shared<Array2<f64>>,
    views: BTreeMap<usize, VarDiff>,
    gradient: Array2<f64>,
}

/// Gathers the gradients of weights shared by several forward instances.
#[derive(Default)]
pub struct SharedWeightCoordinator {
    weights: Vec<SharedWeight>,
    results: Vec<VarDiff>,
}

impl SharedWeightCoordinator {
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits `param` into the group and returns the handle used to spawn its views.
    ///
    /// The coordinator keeps reading the parameter's current values, it never copies them.
    pub fn register_shared_weight(&mut self, param: &Parameter) -> WeightId {
        let data = param.shared();
        let gradient = Array2::zeros(data.borrow().raw_dim());

        self.weights.push(SharedWeight {
            data,
            views: BTreeMap::new(),
            gradient,
        });

        WeightId(self.weights.len() - 1)
    }

    /// Returns the `index`-th view of `weight`, creating it on first use. Repeated calls with the
    /// same index return the same view.
    ///
    /// Fails with [`Error::Index`] if `weight` does not belong to this coordinator.
    pub fn use_at_index(&mut self, weight: WeightId, index: usize) -> Result<VarDiff> {
        let shared = self.weight_mut(weight)?;
        let data = &shared.data;

        Ok(shared
            .views
            .entry(index)
            .or_insert_with(|| VarDiff::view(data.clone()))
            .clone())
    }

    /// Records a forward result computed from the views. Results are matched, in registration
    /// order, with the gradients given to
    /// [`.backpropagate_all()`](SharedWeightCoordinator::backpropagate_all()).
    pub fn register_result(&mut self, node: VarDiff) {
        self.results.push(node);
    }

    /// Returns the number of registered results.
    pub fn results_len(&self) -> usize {
        self.results.len()
    }

    /// Returns the number of views spawned for `weight` since the last reset.
    pub fn views_len(&self, weight: WeightId) -> Result<usize> {
        Ok(self.weight(weight)?.views.len())
    }

    /// Back-propagates `upstream[i]` through the `i`-th registered result, then sums the
    /// gradients of every view into the accumulator of its weight.
    ///
    /// Each contribution reaches the accumulator exactly once: the views' gradients are cleared
    /// as they are summed.
    ///
    /// Fails with [`Error::CountMismatch`] if the number of gradients differs from the number of
    /// registered results and with [`Error::ShapeMismatch`] if a gradient's shape differs from
    /// that of its result. Nothing is propagated in either case.
    pub fn backpropagate_all(&mut self, upstream: &[Array2<f64>]) -> Result<()> {
        if upstream.len() != self.results.len() {
            return Err(Error::CountMismatch {
                expected: self.results.len(),
                actual: upstream.len(),
            });
        }

        for (result, gradient) in self.results.iter().zip(upstream) {
            let (rows, cols) = result.shape();
            if gradient.dim() != (rows, cols) {
                return Err(Error::shape(&[rows, cols], gradient.shape()));
            }
        }

        for (result, gradient) in self.results.iter().zip(upstream) {
            result.backward_with(gradient)?;
        }

        for SharedWeight {
            views, gradient, ..
        } in self.weights.iter_mut()
        {
            for view in views.values() {
                *gradient += &*view.grad();
                view.zero_grad();
            }
        }

        Ok(())
    }

    /// Returns the accumulated gradient of `weight`.
    pub fn gradient(&self, weight: WeightId) -> Result<&Array2<f64>> {
        Ok(&self.weight(weight)?.gradient)
    }

    /// Zeroes every accumulated gradient and discards views and results, preparing the
    /// coordinator for the next iteration. The weights' values are left untouched.
    pub fn reset(&mut self) {
        for weight in self.weights.iter_mut() {
            weight.gradient.fill(0.);
            weight.views.clear();
        }
        self.results.clear();
    }

    fn weight(&self, weight: WeightId) -> Result<&SharedWeight> {
        let len = self.weights.len();
        self.weights.get(weight.0).ok_or(Error::Index {
            index: weight.0,
            len,
        })
    }

    fn weight_mut(&mut self, weight: WeightId) -> Result<&mut SharedWeight> {
        let len = self.weights.len();
        self.weights.get_mut(weight.0).ok_or(Error::Index {
            index: weight.0,
            len,
        })
    }
}
