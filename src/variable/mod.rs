mod autograd;
mod gradient;
mod history;
mod node;
pub(crate) mod utils;
mod var;
mod vardiff;

use ndarray::{Dimension, Ix2};

use crate::{Error, Result};

pub use node::SequenceCriterion;
pub use var::Var;
pub use vardiff::VarDiff;

/// Matrix-matrix multiplication.
pub trait MatMatMul<Rhs> {
    /// The type of the matrix-matrix multiplication's result. See the
    /// [*differentiability arithmetic*] for more details.
    ///
    /// [*differentiability arithmetic*]: index.html#differentiability-arithmetic
    type Output;

    /// Computes the matrix-matrix multiplication between `self` and `rhs`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the number of columns of `self` differs from the
    /// number of rows of `rhs`.
    fn mm(self, rhs: Rhs) -> Result<Self::Output>;
}

/// Concatenation along the rows.
pub trait Cat<Rhs> {
    /// The type of the concatenation's result. See the [*differentiability arithmetic*] for
    /// more details.
    ///
    /// [*differentiability arithmetic*]: index.html#differentiability-arithmetic
    type Output;

    /// Stacks the rows of `rhs` below the rows of `self`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the operands have a different number of columns.
    fn cat(self, rhs: Rhs) -> Result<Self::Output>;
}

fn mm_shape(left: Ix2, right: Ix2) -> Result<Ix2> {
    if left[1] != right[0] {
        return Err(Error::shape(&[left[1], right[1]], right.slice()));
    }

    Ok(Ix2(left[0], right[1]))
}

fn cat_shape(top: Ix2, bottom: Ix2) -> Result<Ix2> {
    if top[1] != bottom[1] {
        return Err(Error::shape(&[bottom[0], top[1]], bottom.slice()));
    }

    Ok(Ix2(top[0] + bottom[0], top[1]))
}
