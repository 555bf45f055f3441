use std::error::Error;
use std::result::Result;

use ndarray::{array, Array2};

use super::*;
use crate::variable::utils::are_similar;

fn leaf(array: Array2<f64>) -> VarDiff {
    Var::leaf(array).requires_grad()
}

#[test]
fn fan_out_accumulates() -> Result<(), Box<dyn Error>> {
    let x = leaf(array![[1., 2.], [3., 4.]]);
    let y = x.clone().mm(x.clone().t())?.sum_rows();

    y.forward();
    are_similar(y.data(), &array![[16., 36.]])?;

    y.backward(1.);
    are_similar(x.grad(), &array![[8., 12.], [8., 12.]])
}

#[test]
fn leaves_accumulate_across_backward_passes() -> Result<(), Box<dyn Error>> {
    let x = leaf(array![[1., 2.], [3., 4.]]);
    let y = x.clone().mm(x.clone().t())?.sum_rows();

    y.forward();
    y.backward(1.);
    y.backward(1.);
    are_similar(x.grad(), &array![[16., 24.], [16., 24.]])?;

    x.zero_grad();
    y.backward(1.);
    are_similar(x.grad(), &array![[8., 12.], [8., 12.]])
}

#[test]
fn backward_with_upstream() -> Result<(), Box<dyn Error>> {
    let x = leaf(array![[1., 2.], [3., 4.], [5., 6.]]);
    let y = x.clone().sum_rows();

    y.forward();
    y.backward_with(&array![[2., -1.]])?;
    are_similar(x.grad(), &array![[2., -1.], [2., -1.], [2., -1.]])?;

    assert!(matches!(
        y.backward_with(&array![[1., 2., 3.]]),
        Err(crate::Error::ShapeMismatch { .. })
    ));

    Ok(())
}

#[test]
fn constant_operands() -> Result<(), Box<dyn Error>> {
    let w = leaf(array![[1., 0.], [0., 2.]]);
    let x = Var::leaf(array![[1., 1.], [2., 3.]]);
    let y = x.clone().mm(w.clone())?.sum_rows();

    y.forward();
    are_similar(y.data(), &array![[3., 8.]])?;

    y.backward(1.);
    are_similar(w.grad(), &array![[3., 3.], [4., 4.]])?;

    let z = w.clone().mm(x)?.sum_rows();
    z.forward();
    w.zero_grad();
    z.backward(1.);
    are_similar(w.grad(), &array![[2., 5.], [2., 5.]])
}

#[test]
fn concatenation_between_constants() -> Result<(), Box<dyn Error>> {
    let start = Var::leaf(array![[0., 0.]]);
    let end = Var::leaf(array![[2., 2.]]);
    let x = leaf(array![[1., 1.]]);
    let sequence = start.cat(x.clone())?.cat(end)?;
    let loss = sequence.clone().sequence_loss(SequenceCriterion::Curvature)?;

    loss.forward();
    are_similar(sequence.data(), &array![[0., 0.], [1., 1.], [2., 2.]])?;
    are_similar(loss.data(), &array![[0.]])?;

    x.data_mut()[[0, 0]] = 2.;
    loss.forward();
    loss.backward(1.);
    // d = 0 - 2 * 2 + 2 = -2 on the first column only.
    are_similar(loss.data(), &array![[4.]])?;
    are_similar(x.grad(), &array![[8., 0.]])?;
    are_similar(sequence.grad(), &array![[-4., 0.], [8., 0.], [-4., 0.]])
}

#[test]
fn concatenation_of_differentiables() -> Result<(), Box<dyn Error>> {
    let top = leaf(array![[1., 2.]]);
    let bottom = leaf(array![[3., 4.], [5., 6.]]);
    let y = top.clone().cat(bottom.clone())?;

    y.forward();
    y.backward_with(&array![[1., 2.], [3., 4.], [5., 6.]])?;
    are_similar(top.grad(), &array![[1., 2.]])?;
    are_similar(bottom.grad(), &array![[3., 4.], [5., 6.]])
}

#[test]
#[should_panic(expected = "forward")]
fn backward_before_forward() {
    let x = leaf(array![[1., 2.]]);
    let y = x.t();

    y.backward(1.);
}
