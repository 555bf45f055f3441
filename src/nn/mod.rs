//! Basic building blocks of the image orderer.
//!
//! This module collects the trainable pieces of the model: the persistent [`Parameter`]s, the
//! [`LinearTransform`] they parametrize, the per-image [`Encoder`] and the batch-wide
//! [`OrderingTransform`], together with the [`SharedWeightCoordinator`] which sums the gradients
//! of parameters used by several images in the same iteration.
//!
//! # Parameters and views
//!
//! A parameter lives across iterations while computational graphs are rebuilt at every one of
//! them. Graphs never own a parameter, they read it through *views*: leaves bound to the
//! parameter's values, each with a gradient of its own.
//!
//! ```
//! use image_orderer::nn::Parameter;
//! use ndarray::array;
//!
//! let param = Parameter::new(array![[1., 2.], [3., 4.]]);
//! let view = param.view();
//!
//! let y = view.clone().sum_rows();
//! y.forward();
//! y.backward(1.);
//!
//! assert_eq!(*y.data(), array![[4., 6.]]);
//! assert_eq!(*view.grad(), array![[1., 1.], [1., 1.]]);
//! ```
mod encoder;
pub mod init;
mod parameter;
mod shared;
mod transform;

pub use encoder::Encoder;
pub use parameter::Parameter;
pub use shared::{SharedWeightCoordinator, WeightId};
pub use transform::{LinearTransform, OrderingTransform, TransformPass};
