mod concatenate;
mod matrix_matrix_mul;
mod sequence_loss;
mod sum_rows;
mod transpose;

pub(crate) use concatenate::*;
pub(crate) use matrix_matrix_mul::*;
pub(crate) use sum_rows::*;
pub(crate) use transpose::*;

pub(crate) use sequence_loss::{check_rows, SequenceLoss, SequenceLossBackward};
pub use sequence_loss::SequenceCriterion;
