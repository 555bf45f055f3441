use std::rc::Rc;

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{
    variable::{
        autograd::{Backward, Forward},
        gradient::Gradient,
        utils::Shared,
    },
    Error, Result,
};

/// Measures how far the rows of a sequence are from an evenly spaced path between its first and
/// its last row.
///
/// Every criterion is zero exactly when the rows interpolate linearly, at constant step, between
/// the two ends of the sequence, and grows as interior rows deviate from that path. Sequences
/// must have at least three rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceCriterion {
    /// Mean squared norm of the second differences:
    ///
    /// *L = 1/(m-2) Σ ‖x\[i-1\] - 2x\[i\] + x\[i+1\]‖²*
    #[default]
    Curvature,
    /// Mean squared norm of the deviation of each step from the average step:
    ///
    /// *L = 1/(m-1) Σ ‖x\[i+1\] - x\[i\] - (x\[m-1\] - x\[0\]) / (m-1)‖²*
    Stride,
}

impl SequenceCriterion {
    /// Evaluates the criterion on `sequence`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if `sequence` has less than three rows.
    pub fn loss(&self, sequence: &ArrayView2<f64>) -> Result<f64> {
        check_rows(sequence)?;

        Ok(self.value(sequence))
    }

    /// Computes the gradient of the criterion with respect to every element of `sequence`.
    ///
    /// Fails with [`Error::ShapeMismatch`] if `sequence` has less than three rows.
    pub fn gradient(&self, sequence: &ArrayView2<f64>) -> Result<Array2<f64>> {
        check_rows(sequence)?;

        Ok(self.local_gradient(sequence))
    }

    fn value(&self, sequence: &ArrayView2<f64>) -> f64 {
        self.residuals(sequence)
            .iter()
            .map(|el| el * el)
            .sum::<f64>()
            / self.terms(sequence) as f64
    }

    fn local_gradient(&self, sequence: &ArrayView2<f64>) -> Array2<f64> {
        let residuals = self.residuals(sequence);
        let scale = 2. / self.terms(sequence) as f64;
        let mut gradient = Array2::zeros(sequence.raw_dim());

        match self {
            Self::Curvature => {
                for (i, residual) in residuals.outer_iter().enumerate() {
                    gradient.row_mut(i).scaled_add(scale, &residual);
                    gradient.row_mut(i + 1).scaled_add(-2. * scale, &residual);
                    gradient.row_mut(i + 2).scaled_add(scale, &residual);
                }
            }
            Self::Stride => {
                // The average step depends on the two ends, but its contributions cancel out as
                // the residuals always sum to zero.
                for (i, residual) in residuals.outer_iter().enumerate() {
                    gradient.row_mut(i).scaled_add(-scale, &residual);
                    gradient.row_mut(i + 1).scaled_add(scale, &residual);
                }
            }
        }

        gradient
    }

    fn terms(&self, sequence: &ArrayView2<f64>) -> usize {
        match self {
            Self::Curvature => sequence.nrows() - 2,
            Self::Stride => sequence.nrows() - 1,
        }
    }

    fn residuals(&self, sequence: &ArrayView2<f64>) -> Array2<f64> {
        match self {
            Self::Curvature => {
                let mut residuals = sequence.slice(s![..-2, ..]).to_owned();
                residuals.scaled_add(-2., &sequence.slice(s![1..-1, ..]));
                residuals += &sequence.slice(s![2.., ..]);
                residuals
            }
            Self::Stride => {
                let steps = (sequence.nrows() - 1) as f64;
                let average_step =
                    (&sequence.row(sequence.nrows() - 1) - &sequence.row(0)) / steps;
                let mut residuals =
                    &sequence.slice(s![1.., ..]) - &sequence.slice(s![..-1, ..]);
                residuals -= &average_step;
                residuals
            }
        }
    }
}

/// Sequences need at least three rows: the two ends and one interior row.
pub(crate) fn check_rows(sequence: &ArrayView2<f64>) -> Result<()> {
    let (rows, cols) = sequence.dim();
    if rows < 3 {
        return Err(Error::shape(&[3, cols], &[rows, cols]));
    }

    Ok(())
}

/// Evaluates a [`SequenceCriterion`] producing a *(1, 1)* result.
pub(crate) struct SequenceLoss {
    operand_data: Shared<Array2<f64>>,
    data: Shared<Array2<f64>>,
    criterion: SequenceCriterion,
}

impl SequenceLoss {
    pub(crate) fn new(
        operand_data: Shared<Array2<f64>>,
        data: Shared<Array2<f64>>,
        criterion: SequenceCriterion,
    ) -> Self {
        Self {
            operand_data,
            data,
            criterion,
        }
    }
}

impl Forward for SequenceLoss {
    fn forward(&self) {
        let loss = self.criterion.value(&self.operand_data.borrow().view());

        self.data.borrow_mut()[[0, 0]] = loss;
    }
}

pub(crate) struct SequenceLossBackward {
    operand_data: Shared<Array2<f64>>,
    operand_gradient: Rc<Gradient>,
    gradient: Rc<Gradient>,
    criterion: SequenceCriterion,
}

impl SequenceLossBackward {
    pub(crate) fn new(
        operand_data: Shared<Array2<f64>>,
        operand_gradient: Rc<Gradient>,
        gradient: Rc<Gradient>,
        criterion: SequenceCriterion,
    ) -> Self {
        Self {
            operand_data,
            operand_gradient,
            gradient,
            criterion,
        }
    }
}

impl Backward for SequenceLossBackward {
    fn backward(&self) {
        let seed = self.gradient.borrow()[[0, 0]];
        let mut local = self.criterion.local_gradient(&self.operand_data.borrow().view());
        local *= seed;

        self.operand_gradient.accumulate(&local);
    }
}
