//! Optimization of the model's parameters.
//!
//! The orderer is trained with plain gradient descent: once the gradients of an iteration have
//! been summed, every parameter **p** is replaced by **p** − *lr* · **∇p**.
//!
//! ```
//! use image_orderer::{nn::Parameter, optim::GradientDescent};
//! use ndarray::array;
//!
//! # fn main() -> image_orderer::Result<()> {
//! let param = Parameter::new(array![[1., 2.]]);
//! let optim = GradientDescent::new(0.5)?;
//!
//! optim.step(&[(&param, &array![[2., -2.]])])?;
//! assert_eq!(*param.data(), array![[0., 3.]]);
//! # Ok(())
//! # }
//! ```
mod sgd;

pub use sgd::GradientDescent;
