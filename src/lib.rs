//! The `image_orderer` crate learns fixed-length encodings of images and orders them along an
//! anchored sequence.
//!
//! Every image, given as a *(rows, v)* tensor of brightness and hue features, is reduced to a
//! single vector of length *v* by a small trainable transform, the *encoder*. The encodings of a
//! batch are then arranged in a target order, transformed once more by the *ordering transform*
//! and placed between two fixed anchors. Training minimizes a loss which vanishes when the
//! resulting sequence is an evenly spaced path from the first anchor to the last one.
//!
//! # Highlights
//!
//! * Define by run computational graphs over `f64` matrices
//! * Reverse-mode automatic differentiation
//! * Parameters shared by many graph instances, with their gradients summed
//! * Gradients routed back through the target order
//!
//! # Variables
//!
//! The building blocks of every computation are *variables*, [`Var`], and *differentiable
//! variables*, [`VarDiff`]. Leaf variables are created by one of the functions of this module,
//! such as [`zeros()`] or [`from_ndarray()`], and are non-differentiable until
//! [`.requires_grad()`](Var::requires_grad()) promotes them.
//!
//! ## Differentiability Arithmetic
//!
//! An operation between two variables yields a differentiable variable as soon as one of the
//! operands is differentiable:
//!
//! * [`Var`] op [`Var`] = [`Var`]
//!
//! * [`Var`] op [`VarDiff`] = [`VarDiff`]
//!
//! * [`VarDiff`] op [`Var`] = [`VarDiff`]
//!
//! * [`VarDiff`] op [`VarDiff`] = [`VarDiff`]
//!
//! # Computational Graph
//!
//! Graphs are evaluated lazily. Building an expression only records its operations, the values
//! are computed by [`.forward()`](VarDiff::forward()) and the gradients by
//! [`.backward()`](VarDiff::backward()).
//!
//! ```
//! use image_orderer::SequenceCriterion;
//! use ndarray::array;
//!
//! # fn main() -> image_orderer::Result<()> {
//! let x = image_orderer::from_ndarray(array![[1., 0.], [0., 1.]]).requires_grad();
//! let w = image_orderer::full((2, 2), 0.5);
//!
//! let start = image_orderer::zeros((1, 2));
//! let end = image_orderer::ones((1, 2));
//! let loss = start
//!     .cat(x.clone().mm(w)?)?
//!     .cat(end)?
//!     .sequence_loss(SequenceCriterion::Stride)?;
//!
//! loss.forward();
//! loss.backward(1.);
//!
//! assert_eq!(x.grad().shape(), &[2, 2]);
//! # Ok(())
//! # }
//! ```
//!
//! Interior gradients are recomputed at every backward pass, while the gradients of the leaves
//! accumulate until [`.zero_grad()`](VarDiff::zero_grad()) is called.
//!
//! # Training
//!
//! The [`trainer`] module puts everything together: see
//! [`VectorImageOrderer`](trainer::VectorImageOrderer).
mod error;
pub mod nn;
pub mod optim;
mod permutation;
mod tensor;
pub mod trainer;
mod variable;

use ndarray::{Array, Array2, Ix2, ShapeBuilder};

pub use error::{Error, Result};
pub use permutation::Permutation;
pub use tensor::Tensor;
pub use variable::{Cat, MatMatMul, SequenceCriterion, Var, VarDiff};

/// Creates a variable from a **[ndarray]** matrix.
///
/// # Examples
///
/// ```
/// use ndarray::array;
///
/// let a = array![[1., 2.], [3., 4.]];
/// let t = image_orderer::from_ndarray(a.clone());
///
/// assert_eq!(*t.data(), a);
/// ```
pub fn from_ndarray(array: Array2<f64>) -> Var {
    Var::from(array)
}

/// Creates a variable with zeroed data.
///
/// # Examples
///
/// ```
/// let t = image_orderer::zeros((1, 5));
///
/// assert_eq!(t.data().shape(), &[1, 5]);
/// ```
pub fn zeros<Sh: ShapeBuilder<Dim = Ix2>>(shape: Sh) -> Var {
    full(shape, 0.)
}

/// Creates a variable with data filled with ones.
pub fn ones<Sh: ShapeBuilder<Dim = Ix2>>(shape: Sh) -> Var {
    full(shape, 1.)
}

/// Creates a variable with data filled with a constant value.
///
/// # Examples
///
/// ```
/// let t = image_orderer::full((2, 3), 5.);
///
/// assert!(t.data().iter().all(|el| *el == 5.));
/// ```
pub fn full<Sh: ShapeBuilder<Dim = Ix2>>(shape: Sh, elem: f64) -> Var {
    Var::from(Array::from_elem(shape, elem))
}
